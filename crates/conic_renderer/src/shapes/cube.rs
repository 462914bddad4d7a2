use conic_core::Color;

use crate::context::PrimitiveTopology;
use crate::drawable::{Material, Shape, ShapeDescriptor, ShapeParams};
use crate::error::GraphicsError;
use crate::geometry::primitives::cube;
use crate::geometry::VertexData;
use crate::shader::{BLENDED_PHONG_PS, BLENDED_PHONG_VS};
use crate::shapes::PhongVertex;

/// A unit cube with one flat colour per face.
pub struct Cube;

impl Cube {
    /// Near, far, left, right, bottom, top.
    pub const FACE_COLORS: [[u8; 3]; 6] = [
        [255, 64, 64],
        [64, 255, 64],
        [64, 64, 255],
        [255, 255, 64],
        [255, 64, 255],
        [64, 255, 255],
    ];
    pub const MATERIAL: Material = Material::new(0.6, 30.0);
}

impl Shape for Cube {
    const NAME: &'static str = "box";

    fn describe(_params: &ShapeParams) -> Result<ShapeDescriptor, GraphicsError> {
        let mut mesh = cube::independent::<PhongVertex>()?;
        for (face, [r, g, b]) in Self::FACE_COLORS.into_iter().enumerate() {
            let first = face * cube::FACE_VERTICES;
            let color = Color::from_rgb8(r, g, b).to_rgba8();
            mesh.override_vertices(first..first + cube::FACE_VERTICES, |v| v.color = color)?;
        }
        mesh.set_normals_independent_flat();

        Ok(ShapeDescriptor {
            vertices: VertexData::from_slice(&mesh.vertices),
            indices: mesh.indices,
            layout: PhongVertex::layout(),
            vertex_shader: BLENDED_PHONG_VS,
            pixel_shader: BLENDED_PHONG_PS,
            topology: PrimitiveTopology::TriangleList,
            material: Some(Self::MATERIAL),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_face_is_one_colour() {
        let desc = Cube::describe(&ShapeParams::default()).unwrap();
        let verts: Vec<PhongVertex> = PhongVertex::read_all(&desc.vertices);
        assert_eq!(verts.len(), 24);
        assert_eq!(desc.indices.len(), 36);
        for face in verts.chunks_exact(cube::FACE_VERTICES) {
            assert!(face.iter().all(|v| v.color == face[0].color));
        }
    }
}
