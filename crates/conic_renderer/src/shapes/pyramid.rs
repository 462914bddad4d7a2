use conic_core::Color;
use glam::{Mat4, Vec3};

use crate::context::PrimitiveTopology;
use crate::drawable::{Material, Shape, ShapeDescriptor, ShapeParams};
use crate::error::GraphicsError;
use crate::geometry::primitives::cone;
use crate::geometry::VertexData;
use crate::shader::{BLENDED_PHONG_PS, BLENDED_PHONG_VS};
use crate::shapes::PhongVertex;

/// A squashed cone with a blue body, a red edge vertex on every side face
/// and a red apex.
///
/// The side faces do not share vertices so each gets a flat normal.
pub struct Pyramid;

impl Pyramid {
    pub const BASE_COLOR: [u8; 3] = [10, 10, 255];
    pub const EDGE_COLOR: [u8; 3] = [255, 10, 10];
    pub const APEX_COLOR: [u8; 3] = [255, 20, 20];
    /// Scale applied after tessellation; flattens the cone along Z.
    pub const SCALE: Vec3 = Vec3::new(1.0, 1.0, 0.7);
    pub const MATERIAL: Material = Material::new(0.6, 30.0);
}

fn rgba([r, g, b]: [u8; 3]) -> [u8; 4] {
    Color::from_rgb8(r, g, b).to_rgba8()
}

impl Shape for Pyramid {
    const NAME: &'static str = "pyramid";

    fn validate(params: &ShapeParams) -> Result<(), GraphicsError> {
        if params.tessellation < cone::MIN_DIVISIONS {
            return Err(GraphicsError::invalid(format!(
                "pyramid tessellation {} is below the minimum of {}",
                params.tessellation,
                cone::MIN_DIVISIONS
            )));
        }
        Ok(())
    }

    fn describe(params: &ShapeParams) -> Result<ShapeDescriptor, GraphicsError> {
        let t = params.tessellation;
        let mut mesh = cone::tessellated_independent_faces::<PhongVertex>(t)?;

        mesh.for_each_vertex(|v| v.color = rgba(Self::BASE_COLOR));
        // the apex copy that opens every side face
        mesh.override_vertices((0..t as usize).map(|i| 3 * i), |v| {
            v.color = rgba(Self::EDGE_COLOR)
        })?;
        mesh.override_vertices([0], |v| v.color = rgba(Self::APEX_COLOR))?;

        mesh.transform(Mat4::from_scale(Self::SCALE));
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

    fn vertices(desc: &ShapeDescriptor) -> Vec<PhongVertex> {
        PhongVertex::read_all(&desc.vertices)
    }

    #[test]
    fn tessellation_below_three_is_rejected() {
        let params = ShapeParams { tessellation: 2 };
        assert!(matches!(
            Pyramid::validate(&params),
            Err(GraphicsError::InvalidParameter(_))
        ));
        assert!(Pyramid::describe(&params).is_err());
    }

    #[test]
    fn colours_follow_the_face_layout() {
        let t = 5;
        let desc = Pyramid::describe(&ShapeParams { tessellation: t }).unwrap();
        let verts = vertices(&desc);
        assert_eq!(verts.len(), 4 * t as usize + 1);
        assert_eq!(verts[0].color, rgba(Pyramid::APEX_COLOR));
        for i in 1..t as usize {
            assert_eq!(verts[3 * i].color, rgba(Pyramid::EDGE_COLOR));
            assert_eq!(verts[3 * i + 1].color, rgba(Pyramid::BASE_COLOR));
            assert_eq!(verts[3 * i + 2].color, rgba(Pyramid::BASE_COLOR));
        }
        assert!(verts[3 * t as usize..]
            .iter()
            .all(|v| v.color == rgba(Pyramid::BASE_COLOR)));
    }

    #[test]
    fn apex_is_scaled_to_point_seven() {
        let desc = Pyramid::describe(&ShapeParams { tessellation: 4 }).unwrap();
        let verts = vertices(&desc);
        assert!((verts[0].position[2] - 0.7).abs() < 1e-6);
        // base ring keeps its unit radius
        let ring = Vec3::from(verts[1].position);
        assert!((ring.truncate().length() - 1.0).abs() < 1e-5);
        assert!((ring.z + 0.7).abs() < 1e-6);
    }

    #[test]
    fn side_normals_lean_outward_and_base_points_down() {
        let t = 6;
        let desc = Pyramid::describe(&ShapeParams { tessellation: t }).unwrap();
        let verts = vertices(&desc);
        for i in 0..t as usize {
            let n = Vec3::from(verts[3 * i].normal);
            let centre = (Vec3::from(verts[3 * i + 1].position) + Vec3::from(verts[3 * i + 2].position)) * 0.5;
            assert!(n.truncate().dot(centre.truncate()) > 0.0, "face {i}: {n:?}");
            assert!(n.z > 0.0);
        }
        let base = Vec3::from(verts[3 * t as usize].normal);
        assert!((base - Vec3::NEG_Z).length() < 1e-5);
    }

    #[test]
    fn descriptor_carries_the_material() {
        let desc = Pyramid::describe(&ShapeParams::default()).unwrap();
        assert_eq!(desc.material, Some(Material::new(0.6, 30.0)));
        assert_eq!(desc.topology, PrimitiveTopology::TriangleList);
        assert_eq!(desc.vertices.stride, 32);
    }
}
