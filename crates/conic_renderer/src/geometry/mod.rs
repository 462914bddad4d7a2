pub mod mesh;
pub mod primitives;
pub mod vertex;

pub use mesh::{IndexedTriangleList, MeshVertex};
pub use vertex::{Semantic, VertexAttribute, VertexData, VertexFormat, VertexLayout};
