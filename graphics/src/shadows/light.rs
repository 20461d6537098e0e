//! Directional light placed on a sphere around the origin.

use std::ops::RangeInclusive;

use penumbra_core::math::{self, Mat4, Vec3};

use super::uniforms::LightUniform;

/// Allowed light distance from the origin.
pub const RADIUS_RANGE: RangeInclusive<f32> = 50.1..=200.0;
/// Allowed elevation in degrees.
pub const INCLINATION_RANGE: RangeInclusive<f32> = 20.0..=160.0;
/// Allowed rotation around +Y in degrees.
pub const AZIMUTH_RANGE: RangeInclusive<f32> = -179.9..=179.9;
/// Allowed range of every intensity and ambient channel.
pub const COLOR_RANGE: RangeInclusive<f32> = 0.0..=100.0;

/// Depth of the ground plane, which sizes the light frustum.
const PLANE_DEPTH: f32 = 75.0;
/// Half extent of the orthographic light frustum.
const FRUSTUM_HALF_EXTENT: f32 = 15.0;

fn clamp(value: f32, range: &RangeInclusive<f32>) -> f32 {
    value.clamp(*range.start(), *range.end())
}

fn clamp_color(value: Vec3) -> Vec3 {
    value.clamp(
        Vec3::splat(*COLOR_RANGE.start()),
        Vec3::splat(*COLOR_RANGE.end()),
    )
}

/// Light placement and color.
///
/// Setters clamp to the ranges above. The Cartesian position and the
/// view-projection are derived on demand, so they always follow the current
/// spherical coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LightState {
    radius: f32,
    inclination: f32,
    azimuth: f32,
    intensity: Vec3,
    ambient: Vec3,
}

impl Default for LightState {
    fn default() -> Self {
        Self {
            radius: 100.0,
            inclination: 60.0,
            azimuth: 0.0,
            intensity: Vec3::splat(4.0),
            ambient: Vec3::splat(0.2),
        }
    }
}

impl LightState {
    pub fn radius(&self) -> f32 {
        self.radius
    }

    pub fn inclination(&self) -> f32 {
        self.inclination
    }

    pub fn azimuth(&self) -> f32 {
        self.azimuth
    }

    pub fn intensity(&self) -> Vec3 {
        self.intensity
    }

    pub fn ambient(&self) -> Vec3 {
        self.ambient
    }

    pub fn set_radius(&mut self, radius: f32) {
        self.radius = clamp(radius, &RADIUS_RANGE);
    }

    pub fn set_inclination(&mut self, degrees: f32) {
        self.inclination = clamp(degrees, &INCLINATION_RANGE);
    }

    pub fn set_azimuth(&mut self, degrees: f32) {
        self.azimuth = clamp(degrees, &AZIMUTH_RANGE);
    }

    pub fn set_intensity(&mut self, intensity: Vec3) {
        self.intensity = clamp_color(intensity);
    }

    pub fn set_ambient(&mut self, ambient: Vec3) {
        self.ambient = clamp_color(ambient);
    }

    /// Cartesian light position.
    pub fn position(&self) -> Vec3 {
        math::spherical_to_cartesian(self.radius, self.inclination, self.azimuth)
    }

    /// Direction the light travels, from the light toward the origin.
    pub fn direction(&self) -> Vec3 {
        (-self.position()).normalize_or(Vec3::NEG_Y)
    }

    /// Orthographic view-projection of the light.
    ///
    /// The view sits at the origin looking along [`Self::direction`]; the
    /// depth range reaches a quarter plane depth behind it and three quarters
    /// in front.
    pub fn view_projection(&self) -> Mat4 {
        let view = math::look_to_rh(Vec3::ZERO, self.direction());
        let projection = Mat4::orthographic_rh(
            -FRUSTUM_HALF_EXTENT,
            FRUSTUM_HALF_EXTENT,
            -FRUSTUM_HALF_EXTENT,
            FRUSTUM_HALF_EXTENT,
            -PLANE_DEPTH * 0.25,
            PLANE_DEPTH * 0.75,
        );
        projection * view
    }

    /// Diffuse color of the light locator: normalized intensity.
    pub fn locator_color(&self) -> Vec3 {
        self.intensity.normalize_or_zero()
    }

    pub fn uniform(&self) -> LightUniform {
        LightUniform {
            view_projection: self.view_projection(),
            position: self.position().extend(1.0),
            direction: self.direction().extend(0.0),
            ambient: self.ambient.extend(0.0),
            intensity: self.intensity.extend(0.0),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_position() {
        let light = LightState::default();
        let p = light.position();
        assert!((p - Vec3::new(50.0, 86.60254, 0.0)).length() < 1e-3);
    }

    #[test]
    fn test_setters_clamp() {
        let mut light = LightState::default();
        light.set_radius(10.0);
        assert_eq!(light.radius(), 50.1);
        light.set_inclination(170.0);
        assert_eq!(light.inclination(), 160.0);
        light.set_azimuth(-400.0);
        assert_eq!(light.azimuth(), -179.9);
        light.set_intensity(Vec3::new(-1.0, 50.0, 200.0));
        assert_eq!(light.intensity(), Vec3::new(0.0, 50.0, 100.0));
    }

    #[test]
    fn test_origin_inside_light_frustum() {
        let light = LightState::default();
        let clip = light.view_projection() * Vec3::ZERO.extend(1.0);
        assert!(clip.x.abs() < 1e-4 && clip.y.abs() < 1e-4);
        // Origin sits a quarter of the depth range in.
        assert!((clip.z - 0.25).abs() < 1e-4);
    }

    #[test]
    fn test_ground_plane_fits_depth_range() {
        let light = LightState::default();
        let corner = light.view_projection() * Vec3::new(15.0, -3.0, 15.0).extend(1.0);
        assert!((0.0..=1.0).contains(&corner.z));
    }

    #[test]
    fn test_locator_is_unit_color() {
        let light = LightState::default();
        assert!((light.locator_color().length() - 1.0).abs() < 1e-5);
    }
}
