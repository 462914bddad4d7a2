//! Built-in drawable shapes.
//!
//! Both shapes use [`PhongVertex`] and the blended-Phong shader pair: one
//! colour per vertex, lit by the scene's point light in view space.

mod cube;
mod pyramid;

pub use cube::Cube;
pub use pyramid::Pyramid;

use bytemuck::{Pod, Zeroable};
use glam::Vec3;

use crate::geometry::{MeshVertex, Semantic, VertexAttribute, VertexFormat, VertexLayout};

/// Position, normal and an 8-bit RGBA colour, padded to 32 bytes.
#[repr(C)]
#[derive(Debug, Copy, Clone, Default, PartialEq, Pod, Zeroable)]
pub struct PhongVertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
    pub color: [u8; 4],
    pub padding: [u8; 4],
}

impl PhongVertex {
    /// `POSITION` float3 @ 0, `NORMAL` float3 @ 12, `COLOR` unorm8x4 @ 24.
    pub fn layout() -> VertexLayout {
        VertexLayout::new(
            std::mem::size_of::<Self>() as u32,
            [
                VertexAttribute::new(Semantic::Position, VertexFormat::Float32x3, 0, 0),
                VertexAttribute::new(Semantic::Normal, VertexFormat::Float32x3, 12, 1),
                VertexAttribute::new(Semantic::Color, VertexFormat::Unorm8x4, 24, 2),
            ],
        )
    }
}

#[cfg(test)]
impl PhongVertex {
    /// Decodes uploaded vertex bytes.
    pub(crate) fn read_all(data: &crate::geometry::VertexData) -> Vec<Self> {
        data.bytes
            .chunks_exact(std::mem::size_of::<Self>())
            .map(bytemuck::pod_read_unaligned)
            .collect()
    }
}

impl MeshVertex for PhongVertex {
    fn position(&self) -> Vec3 {
        Vec3::from(self.position)
    }

    fn set_position(&mut self, position: Vec3) {
        self.position = position.to_array();
    }

    fn set_normal(&mut self, normal: Vec3) {
        self.normal = normal.to_array();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn phong_vertex_matches_its_layout() {
        assert_eq!(std::mem::size_of::<PhongVertex>(), 32);
        let layout = PhongVertex::layout();
        layout.validate().unwrap();
        assert_eq!(layout.stride, 32);
    }
}
