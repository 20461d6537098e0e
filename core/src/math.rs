//! Math re-exports and helper functions.
//!
//! All rendering math is `f32` glam. Projections follow the wgpu depth
//! convention (`[0, 1]`, right-handed view space).

pub use glam;
pub use glam::{Mat4, Quat, UVec2, Vec2, Vec3, Vec4};

/// Convert spherical coordinates to a Cartesian position.
///
/// `inclination` is the elevation above the XZ plane and `azimuth` the
/// rotation around +Y, both in degrees:
///
/// ```text
/// a = r * cos(inclination)
/// x = a * cos(azimuth)
/// y = r * sin(inclination)
/// z = a * sin(azimuth)
/// ```
pub fn spherical_to_cartesian(radius: f32, inclination_deg: f32, azimuth_deg: f32) -> Vec3 {
    let inclination = inclination_deg.to_radians();
    let azimuth = azimuth_deg.to_radians();
    let a = radius * inclination.cos();
    Vec3::new(
        a * azimuth.cos(),
        radius * inclination.sin(),
        a * azimuth.sin(),
    )
}

/// Convert a horizontal field of view to the vertical one for `aspect` (width / height).
pub fn vertical_fov(horizontal_fov: f32, aspect: f32) -> f32 {
    2.0 * ((horizontal_fov * 0.5).tan() / aspect).atan()
}

/// Right-handed perspective projection parameterized by the horizontal field of view.
pub fn perspective_horizontal_rh(horizontal_fov: f32, aspect: f32, znear: f32, zfar: f32) -> Mat4 {
    Mat4::perspective_rh(vertical_fov(horizontal_fov, aspect), aspect, znear, zfar)
}

/// Right-handed view matrix looking from `eye` along `direction`.
///
/// Picks +Z as the up vector when `direction` is (anti)parallel to +Y, so a
/// light placed straight overhead still yields a valid basis.
pub fn look_to_rh(eye: Vec3, direction: Vec3) -> Mat4 {
    let dir = direction.normalize_or(Vec3::NEG_Z);
    let up = if dir.y.abs() > 0.999 { Vec3::Z } else { Vec3::Y };
    Mat4::look_to_rh(eye, dir, up)
}

/// Build a world transform from a per-axis scale and a translation.
pub fn scale_translation(scale: Vec3, translation: Vec3) -> Mat4 {
    Mat4::from_scale_rotation_translation(scale, Quat::IDENTITY, translation)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn approx(a: Vec3, b: Vec3) -> bool {
        (a - b).length() < 1e-4
    }

    #[rstest]
    #[case::horizon_zero_azimuth(100.0, 0.0, 0.0, Vec3::new(100.0, 0.0, 0.0))]
    #[case::straight_up(10.0, 90.0, 0.0, Vec3::new(0.0, 10.0, 0.0))]
    #[case::quarter_turn(10.0, 0.0, 90.0, Vec3::new(0.0, 0.0, 10.0))]
    #[case::default_light(100.0, 60.0, 0.0, Vec3::new(50.0, 86.60254, 0.0))]
    fn test_spherical_to_cartesian(
        #[case] radius: f32,
        #[case] inclination: f32,
        #[case] azimuth: f32,
        #[case] expected: Vec3,
    ) {
        assert!(approx(
            spherical_to_cartesian(radius, inclination, azimuth),
            expected
        ));
    }

    #[test]
    fn test_spherical_preserves_radius() {
        let p = spherical_to_cartesian(73.5, 37.0, -120.0);
        assert!((p.length() - 73.5).abs() < 1e-3);
    }

    #[test]
    fn test_vertical_fov_square_aspect() {
        let fov = 90f32.to_radians();
        assert!((vertical_fov(fov, 1.0) - fov).abs() < 1e-6);
        assert!(vertical_fov(fov, 16.0 / 9.0) < fov);
    }

    #[test]
    fn test_look_to_overhead_is_finite() {
        let view = look_to_rh(Vec3::ZERO, Vec3::NEG_Y);
        assert!(view.is_finite());
        let p = view.transform_point3(Vec3::new(0.0, -5.0, 0.0));
        // Points along the view direction land on -Z in view space.
        assert!(p.z < 0.0);
    }

    #[test]
    fn test_scale_translation() {
        let m = scale_translation(Vec3::new(75.0, 1.0, 75.0), Vec3::new(0.0, -3.0, 0.0));
        let p = m.transform_point3(Vec3::new(0.5, 0.5, 0.5));
        assert!(approx(p, Vec3::new(37.5, -2.5, 37.5)));
    }
}
