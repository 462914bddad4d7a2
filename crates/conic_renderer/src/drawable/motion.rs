//! Orbit-and-spin motion of a drawable.
//!
//! An object spins about its own centre (`roll`, `pitch`, `yaw`), sits `r`
//! units along +X, and that offset is itself rotated about the origin
//! (`theta`, `phi`, `chi`).  Every angle advances at its own constant rate.

use std::f32::consts::TAU;

use conic_core::transform::roll_pitch_yaw;
use conic_core::Transform;
use glam::Vec3;

/// Initial state and angular rates (radians, radians per second).
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct MotionParams {
    pub r: f32,
    pub roll: f32,
    pub pitch: f32,
    pub yaw: f32,
    pub theta: f32,
    pub phi: f32,
    pub chi: f32,
    pub droll: f32,
    pub dpitch: f32,
    pub dyaw: f32,
    pub dtheta: f32,
    pub dphi: f32,
    pub dchi: f32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Motion {
    params: MotionParams,
}

fn wrap(angle: f32) -> f32 {
    angle.rem_euclid(TAU)
}

impl Motion {
    pub fn new(params: MotionParams) -> Self {
        Self { params }
    }

    pub fn params(&self) -> &MotionParams {
        &self.params
    }

    /// Advances every angle by its rate times `dt`.  Angles are kept in
    /// `[0, 2π)`.
    pub fn update(&mut self, dt: f32) {
        let p = &mut self.params;
        p.roll = wrap(p.roll + p.droll * dt);
        p.pitch = wrap(p.pitch + p.dpitch * dt);
        p.yaw = wrap(p.yaw + p.dyaw * dt);
        p.theta = wrap(p.theta + p.dtheta * dt);
        p.phi = wrap(p.phi + p.dphi * dt);
        p.chi = wrap(p.chi + p.dchi * dt);
    }

    /// Orbit rotation · translation(r, 0, 0) · spin.
    pub fn world_transform(&self) -> Transform {
        let p = &self.params;
        let spin = roll_pitch_yaw(p.pitch, p.yaw, p.roll);
        let orbit = roll_pitch_yaw(p.theta, p.phi, p.chi);
        Transform::from_rotation_translation(orbit * spin, orbit * Vec3::new(p.r, 0.0, 0.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Mat4;

    fn params() -> MotionParams {
        MotionParams {
            r: 10.0,
            roll: 0.3,
            pitch: 1.1,
            yaw: 2.0,
            theta: 0.5,
            phi: 0.2,
            chi: 4.0,
            droll: 0.4,
            dpitch: 0.1,
            dyaw: 1.2,
            dtheta: 0.05,
            dphi: 0.2,
            dchi: 0.1,
        }
    }

    #[test]
    fn still_motion_stays_at_radius_on_x() {
        let m = Motion::new(MotionParams {
            r: 7.0,
            ..Default::default()
        });
        let t = m.world_transform();
        assert!((t.position - Vec3::new(7.0, 0.0, 0.0)).length() < 1e-6);
    }

    #[test]
    fn matrix_is_orbit_translate_spin() {
        let m = Motion::new(params());
        let p = m.params();
        let expected = Mat4::from_quat(roll_pitch_yaw(p.theta, p.phi, p.chi))
            * Mat4::from_translation(Vec3::new(p.r, 0.0, 0.0))
            * Mat4::from_quat(roll_pitch_yaw(p.pitch, p.yaw, p.roll));
        assert!(m.world_transform().matrix().abs_diff_eq(expected, 1e-5));
    }

    #[test]
    fn orbit_keeps_the_radius() {
        let mut m = Motion::new(params());
        for _ in 0..100 {
            m.update(0.37);
            assert!((m.world_transform().position.length() - 10.0).abs() < 1e-4);
        }
    }

    #[test]
    fn update_advances_by_rate_times_dt() {
        let mut m = Motion::new(params());
        m.update(0.5);
        assert!((m.params().yaw - 2.6).abs() < 1e-6);
        assert!((m.params().droll - 0.4).abs() < 1e-6);
    }

    #[test]
    fn zero_dt_changes_nothing() {
        let mut m = Motion::new(params());
        let before = m.world_transform();
        m.update(0.0);
        assert_eq!(m.world_transform(), before);
    }
}
