//! Unit cube primitives centred at the origin (side length 1).
//!
//! [`independent`] gives each face its own four vertices so flat normals and
//! per-face colours work; [`shared`] uses the eight corners only.
use glam::Vec3;

use crate::error::GraphicsError;
use crate::geometry::mesh::{IndexedTriangleList, MeshVertex};

const SIDE: f32 = 0.5;

/// Vertices per face in [`independent`].
pub const FACE_VERTICES: usize = 4;

/// 24 vertices (4 per face, faces ordered near, far, left, right, bottom,
/// top) and 36 indices.
pub fn independent<V: MeshVertex>() -> Result<IndexedTriangleList<V>, GraphicsError> {
    let s = SIDE;
    #[rustfmt::skip]
    let positions = [
        // near   (z-)
        [-s, -s, -s], [ s, -s, -s], [-s,  s, -s], [ s,  s, -s],
        // far    (z+)
        [-s, -s,  s], [ s, -s,  s], [-s,  s,  s], [ s,  s,  s],
        // left   (x-)
        [-s, -s, -s], [-s,  s, -s], [-s, -s,  s], [-s,  s,  s],
        // right  (x+)
        [ s, -s, -s], [ s,  s, -s], [ s, -s,  s], [ s,  s,  s],
        // bottom (y-)
        [-s, -s, -s], [ s, -s, -s], [-s, -s,  s], [ s, -s,  s],
        // top    (y+)
        [-s,  s, -s], [ s,  s, -s], [-s,  s,  s], [ s,  s,  s],
    ];

    #[rustfmt::skip]
    let indices = vec![
         0,  2,  1,   2,  3,  1,
         4,  5,  7,   4,  7,  6,
         8, 10,  9,  10, 11,  9,
        12, 13, 15,  12, 15, 14,
        16, 17, 18,  18, 17, 19,
        20, 23, 21,  20, 22, 23,
    ];

    let vertices = positions.iter().map(|&p| V::at(Vec3::from(p))).collect();
    IndexedTriangleList::new(vertices, indices)
}

/// 8 corner vertices and 36 indices.
pub fn shared<V: MeshVertex>() -> Result<IndexedTriangleList<V>, GraphicsError> {
    let s = SIDE;
    #[rustfmt::skip]
    let positions = [
        [-s, -s, -s], [ s, -s, -s], [-s,  s, -s], [ s,  s, -s],
        [-s, -s,  s], [ s, -s,  s], [-s,  s,  s], [ s,  s,  s],
    ];

    #[rustfmt::skip]
    let indices = vec![
        0, 2, 1,  2, 3, 1,
        1, 3, 5,  3, 7, 5,
        2, 6, 3,  3, 6, 7,
        4, 5, 7,  4, 7, 6,
        0, 4, 2,  2, 4, 6,
        0, 1, 4,  1, 5, 4,
    ];

    let vertices = positions.iter().map(|&p| V::at(Vec3::from(p))).collect();
    IndexedTriangleList::new(vertices, indices)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::mesh::tests::TestVertex;

    #[test]
    fn independent_cube_counts() {
        let mesh = independent::<TestVertex>().unwrap();
        assert_eq!(mesh.vertex_count(), 24);
        assert_eq!(mesh.triangle_count(), 12);
    }

    #[test]
    fn shared_cube_counts() {
        let mesh = shared::<TestVertex>().unwrap();
        assert_eq!(mesh.vertex_count(), 8);
        assert_eq!(mesh.triangle_count(), 12);
    }

    #[test]
    fn flat_normals_point_outward() {
        let mut mesh = independent::<TestVertex>().unwrap();
        mesh.set_normals_independent_flat();
        let expected = [Vec3::NEG_Z, Vec3::Z, Vec3::NEG_X, Vec3::X, Vec3::NEG_Y, Vec3::Y];
        for (face, want) in expected.into_iter().enumerate() {
            let n = mesh.vertices[face * FACE_VERTICES].n;
            assert!((n - want).length() < 1e-5, "face {face}: {n:?}");
        }
    }
}
