//! Math utilities
//!
//! Re-exports glam with the camera helpers the renderer and game share.

pub use glam::*;

/// Orthonormal camera frame derived from an eye position and a target.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraBasis {
    /// Points from the target back towards the eye.
    pub direction: Vec3,
    pub right: Vec3,
    pub up: Vec3,
}

impl CameraBasis {
    pub fn look_at(position: Vec3, target: Vec3, world_up: Vec3) -> Self {
        let direction = (position - target).normalize();
        let right = world_up.cross(direction).normalize();
        let up = direction.cross(right);
        Self {
            direction,
            right,
            up,
        }
    }
}

/// Orthographic projection over a window-sized rectangle with the origin at
/// the bottom-left corner.
pub fn screen_orthographic(width: f32, height: f32, near: f32, far: f32) -> Mat4 {
    Mat4::orthographic_rh(0.0, width, 0.0, height, near, far)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_basis_for_camera_on_positive_z() {
        let basis = CameraBasis::look_at(Vec3::new(0.0, 0.0, 3.0), Vec3::ZERO, Vec3::Y);

        assert!(basis.direction.abs_diff_eq(Vec3::Z, 1e-6));
        assert!(basis.right.abs_diff_eq(Vec3::X, 1e-6));
        assert!(basis.up.abs_diff_eq(Vec3::Y, 1e-6));
    }

    #[test]
    fn test_screen_orthographic_maps_corners() {
        let proj = screen_orthographic(1280.0, 720.0, -0.1, 1000.0);

        let bottom_left = proj.project_point3(Vec3::new(0.0, 0.0, 0.0));
        let top_right = proj.project_point3(Vec3::new(1280.0, 720.0, 0.0));

        assert!(bottom_left.truncate().abs_diff_eq(Vec2::new(-1.0, -1.0), 1e-5));
        assert!(top_right.truncate().abs_diff_eq(Vec2::new(1.0, 1.0), 1e-5));
    }
}
