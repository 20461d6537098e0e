//! Fixed viewer camera.

use penumbra_core::math::{self, Mat4, Vec3, Vec4};

use super::uniforms::CameraUniform;

/// A perspective camera looking at a fixed point.
///
/// The field of view is horizontal, so widening the window shows more of the
/// scene instead of cropping it.
#[derive(Debug, Clone, PartialEq)]
pub struct Camera {
    position: Vec3,
    target: Vec3,
    horizontal_fov: f32,
    near: f32,
    far: f32,
    width: u32,
    height: u32,
}

impl Camera {
    /// The demo viewpoint: (0, 5, -10) looking at the origin, 90° wide.
    pub fn fixed(width: u32, height: u32) -> Self {
        Self {
            position: Vec3::new(0.0, 5.0, -10.0),
            target: Vec3::ZERO,
            horizontal_fov: 90f32.to_radians(),
            near: 1.0,
            far: 1000.0,
            width: width.max(1),
            height: height.max(1),
        }
    }

    pub fn position(&self) -> Vec3 {
        self.position
    }

    /// Update the viewport after a resize.
    pub fn set_viewport(&mut self, width: u32, height: u32) {
        self.width = width.max(1);
        self.height = height.max(1);
    }

    pub fn viewport(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn aspect(&self) -> f32 {
        self.width as f32 / self.height as f32
    }

    pub fn view(&self) -> Mat4 {
        math::look_to_rh(self.position, self.target - self.position)
    }

    pub fn projection(&self) -> Mat4 {
        math::perspective_horizontal_rh(self.horizontal_fov, self.aspect(), self.near, self.far)
    }

    pub fn uniform(&self) -> CameraUniform {
        CameraUniform {
            view_projection: self.projection() * self.view(),
            position: self.position.extend(0.0),
            viewport_size: Vec4::new(self.width as f32, self.height as f32, 0.0, 0.0),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_origin_projects_to_center() {
        let camera = Camera::fixed(1280, 720);
        let clip = camera.uniform().view_projection * Vec4::new(0.0, 0.0, 0.0, 1.0);
        let ndc = clip.truncate() / clip.w;
        assert!(ndc.x.abs() < 1e-5);
        assert!(ndc.y.abs() < 1e-5);
        assert!((0.0..=1.0).contains(&ndc.z));
    }

    #[test]
    fn test_zero_viewport_is_clamped() {
        let mut camera = Camera::fixed(0, 0);
        assert_eq!(camera.viewport(), (1, 1));
        camera.set_viewport(800, 0);
        assert_eq!(camera.aspect(), 800.0);
        assert!(camera.projection().is_finite());
    }
}
