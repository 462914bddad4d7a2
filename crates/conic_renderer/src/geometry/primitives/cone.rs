//! Tessellated cone primitives.
//!
//! The cone points along +Z: apex at `z = +1`, base ring of radius 1 at
//! `z = -1`.  `long_div` is the number of segments around the ring and must
//! be at least 3.
use std::f32::consts::TAU;

use glam::{Quat, Vec3};

use crate::error::GraphicsError;
use crate::geometry::mesh::{IndexedTriangleList, MeshVertex};

const APEX: Vec3 = Vec3::new(0.0, 0.0, 1.0);
const BASE_CENTRE: Vec3 = Vec3::new(0.0, 0.0, -1.0);
const RING_START: Vec3 = Vec3::new(1.0, 0.0, -1.0);

/// Smallest segment count that still encloses a volume.
pub const MIN_DIVISIONS: u32 = 3;

fn check_divisions(long_div: u32) -> Result<(), GraphicsError> {
    if long_div < MIN_DIVISIONS {
        return Err(GraphicsError::invalid(format!(
            "cone tessellation {long_div} is below the minimum of {MIN_DIVISIONS}"
        )));
    }
    // 4·t + 1 vertices must stay addressable by u16 indices.
    if long_div > (u16::MAX as u32 - 1) / 4 {
        return Err(GraphicsError::invalid(format!(
            "cone tessellation {long_div} overflows 16-bit indices"
        )));
    }
    Ok(())
}

fn ring_point(segment: u32, long_div: u32) -> Vec3 {
    let angle = TAU / long_div as f32 * (segment % long_div) as f32;
    Quat::from_rotation_z(angle) * RING_START
}

/// Cone whose side faces do not share vertices.
///
/// Layout: for every segment `i`, vertices `3i` (apex), `3i+1`, `3i+2` (ring
/// edge); then the base centre at `3t` and the base ring at `3t+1 ..= 4t`.
/// `4t + 1` vertices and `2t` triangles in total.
pub fn tessellated_independent_faces<V: MeshVertex>(
    long_div: u32,
) -> Result<IndexedTriangleList<V>, GraphicsError> {
    check_divisions(long_div)?;

    let mut vertices = Vec::with_capacity(4 * long_div as usize + 1);
    for seg in 0..long_div {
        vertices.push(V::at(APEX));
        vertices.push(V::at(ring_point(seg, long_div)));
        vertices.push(V::at(ring_point(seg + 1, long_div)));
    }

    let base_centre = vertices.len() as u16;
    vertices.push(V::at(BASE_CENTRE));
    let base_edge = vertices.len() as u16;
    for seg in 0..long_div {
        vertices.push(V::at(ring_point(seg, long_div)));
    }

    let t = long_div as u16;
    let mut indices: Vec<u16> = (0..3 * t).collect();
    for seg in 0..t {
        indices.extend_from_slice(&[base_centre, (seg + 1) % t + base_edge, seg + base_edge]);
    }

    IndexedTriangleList::new(vertices, indices)
}

/// Cone with a shared ring: `t + 2` vertices (ring, base centre, apex) and
/// `2t` triangles.  Suited to smooth shading.
pub fn tessellated<V: MeshVertex>(long_div: u32) -> Result<IndexedTriangleList<V>, GraphicsError> {
    check_divisions(long_div)?;

    let mut vertices: Vec<V> = (0..long_div)
        .map(|seg| V::at(ring_point(seg, long_div)))
        .collect();
    let centre = vertices.len() as u16;
    vertices.push(V::at(BASE_CENTRE));
    let tip = vertices.len() as u16;
    vertices.push(V::at(APEX));

    let t = long_div as u16;
    let mut indices = Vec::with_capacity(6 * t as usize);
    for seg in 0..t {
        indices.extend_from_slice(&[centre, (seg + 1) % t, seg]);
    }
    for seg in 0..t {
        indices.extend_from_slice(&[seg, (seg + 1) % t, tip]);
    }

    IndexedTriangleList::new(vertices, indices)
}
