//! CPU-side indexed triangle lists.
//!
//! Primitives in [`super::primitives`] produce an [`IndexedTriangleList`];
//! shapes then reshape it (`transform`), recolour selected vertices
//! (`override_vertices`) and fill in normals
//! (`set_normals_independent_flat`) before the vertices are uploaded.

use glam::{Mat4, Vec3};

use crate::error::GraphicsError;

/// Vertex types the mesh builder can position and shade.
///
/// Primitives only know about positions; anything else (colour, texture
/// coordinates) starts at `Default` and is filled in by the shape.
pub trait MeshVertex: Copy + Default {
    fn position(&self) -> Vec3;
    fn set_position(&mut self, position: Vec3);
    fn set_normal(&mut self, normal: Vec3);

    /// Default vertex placed at `position`.
    fn at(position: Vec3) -> Self {
        let mut v = Self::default();
        v.set_position(position);
        v
    }
}

/// Vertices plus a triangle-list index buffer.
///
/// Invariant: the index count is a multiple of three and every index is
/// below the vertex count.
#[derive(Debug, Clone, PartialEq)]
pub struct IndexedTriangleList<V> {
    pub vertices: Vec<V>,
    pub indices: Vec<u16>,
}

impl<V: MeshVertex> IndexedTriangleList<V> {
    pub fn new(vertices: Vec<V>, indices: Vec<u16>) -> Result<Self, GraphicsError> {
        if vertices.len() > u16::MAX as usize + 1 {
            return Err(GraphicsError::invalid(format!(
                "{} vertices do not fit 16-bit indices",
                vertices.len()
            )));
        }
        if indices.is_empty() || indices.len() % 3 != 0 {
            return Err(GraphicsError::invalid(format!(
                "index count {} is not a positive multiple of 3",
                indices.len()
            )));
        }
        if let Some(&bad) = indices.iter().find(|&&i| i as usize >= vertices.len()) {
            return Err(GraphicsError::invalid(format!(
                "index {bad} out of range for {} vertices",
                vertices.len()
            )));
        }
        Ok(Self { vertices, indices })
    }

    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// Applies `matrix` to every position.
    pub fn transform(&mut self, matrix: Mat4) {
        for v in &mut self.vertices {
            let p = matrix.transform_point3(v.position());
            v.set_position(p);
        }
    }

    /// Gives every triangle's vertices that triangle's face normal.
    ///
    /// Meant for meshes whose faces do not share vertices; a vertex shared
    /// between faces keeps the normal of the last face that references it.
    pub fn set_normals_independent_flat(&mut self) {
        for tri in self.indices.chunks_exact(3) {
            let [i0, i1, i2] = [tri[0] as usize, tri[1] as usize, tri[2] as usize];
            let p0 = self.vertices[i0].position();
            let p1 = self.vertices[i1].position();
            let p2 = self.vertices[i2].position();
            let n = (p1 - p0).cross(p2 - p0).normalize_or_zero();
            for i in [i0, i1, i2] {
                self.vertices[i].set_normal(n);
            }
        }
    }

    /// Runs `f` on each vertex named in `indices`.
    ///
    /// All indices are checked first; nothing is modified if one is out of
    /// range.
    pub fn override_vertices<I, F>(&mut self, indices: I, mut f: F) -> Result<(), GraphicsError>
    where
        I: IntoIterator<Item = usize>,
        F: FnMut(&mut V),
    {
        let indices: Vec<usize> = indices.into_iter().collect();
        if let Some(&bad) = indices.iter().find(|&&i| i >= self.vertices.len()) {
            return Err(GraphicsError::invalid(format!(
                "vertex {bad} out of range for {} vertices",
                self.vertices.len()
            )));
        }
        for i in indices {
            f(&mut self.vertices[i]);
        }
        Ok(())
    }

    /// Runs `f` on every vertex.
    pub fn for_each_vertex(&mut self, f: impl FnMut(&mut V)) {
        self.vertices.iter_mut().for_each(f);
    }
}
