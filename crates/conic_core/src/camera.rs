use glam::{Mat4, Quat, Vec3};

use crate::transform::roll_pitch_yaw;

/// Orbit camera looking at the origin.
///
/// The eye sits `r` units from the origin, placed by `theta` (around the
/// vertical axis) and `phi` (elevation).  `pitch`, `yaw` and `roll` rotate
/// the view afterwards, turning the head without moving the eye.  The
/// renderer works in a left-handed space, so the view matrix is built with
/// [`Mat4::look_at_lh`].
#[derive(Debug, Clone, PartialEq)]
pub struct Camera {
    pub r: f32,
    pub theta: f32,
    pub phi: f32,
    pub pitch: f32,
    pub yaw: f32,
    pub roll: f32,
}

impl Default for Camera {
    fn default() -> Self {
        Self {
            r: 20.0,
            theta: 0.0,
            phi: 0.0,
            pitch: 0.0,
            yaw: 0.0,
            roll: 0.0,
        }
    }
}

impl Camera {
    /// Camera at distance `r` with the given orbit angles.
    pub fn orbit(r: f32, theta: f32, phi: f32) -> Self {
        Self {
            r,
            theta,
            phi,
            ..Self::default()
        }
    }

    /// World-space eye position.
    pub fn eye(&self) -> Vec3 {
        roll_pitch_yaw(self.phi, -self.theta, 0.0) * Vec3::new(0.0, 0.0, -self.r)
    }

    /// View matrix: look at the origin from [`Camera::eye`], then apply the
    /// head rotation.
    pub fn view(&self) -> Mat4 {
        let look = Mat4::look_at_lh(self.eye(), Vec3::ZERO, Vec3::Y);
        let head: Quat = roll_pitch_yaw(self.pitch, -self.yaw, self.roll);
        Mat4::from_quat(head) * look
    }

    /// Restore the default orbit.
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_eye_is_behind_origin() {
        let cam = Camera::default();
        assert!((cam.eye() - Vec3::new(0.0, 0.0, -20.0)).length() < 1e-5);
    }

    #[test]
    fn origin_lands_in_front_of_the_eye() {
        let cam = Camera::orbit(10.0, 0.7, 0.3);
        let p = cam.view().transform_point3(Vec3::ZERO);
        // left-handed view space: +Z points away from the viewer
        assert!((p - Vec3::new(0.0, 0.0, 10.0)).length() < 1e-4, "{p:?}");
    }
}
