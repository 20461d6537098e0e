//! Keyboard controls for the live shadow parameters.
//!
//! | Key              | Action                        |
//! |------------------|-------------------------------|
//! | `1` / `2`        | VSM / MSM                     |
//! | `+` / `-`        | blur iterations               |
//! | Left / Right     | light azimuth                 |
//! | Up / Down        | light inclination             |
//! | PageUp / PageDown| light radius                  |
//! | `[` / `]`        | bounce speed                  |
//! | `I` / `K`        | light intensity               |
//! | `U` / `J`        | ambient                       |
//! | `V`              | vsync                         |
//! | Escape           | exit                          |

use glam::Vec3;
use penumbra_graphics::shadows::{ShadowSettings, Technique};
use winit::keyboard::KeyCode;

/// Degrees per key press for azimuth and inclination.
pub const ANGLE_STEP: f32 = 5.0;
pub const RADIUS_STEP: f32 = 5.0;
pub const BOUNCE_STEP: f32 = 0.5;
/// Added to every channel of intensity or ambient per key press.
pub const INTENSITY_STEP: f32 = 0.5;
pub const AMBIENT_STEP: f32 = 0.05;

/// What a key press asks for.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Control {
    Technique(Technique),
    BlurCount(i32),
    Azimuth(f32),
    Inclination(f32),
    Radius(f32),
    BounceSpeed(f32),
    Intensity(f32),
    Ambient(f32),
    ToggleVsync,
    Exit,
}

impl Control {
    /// The control bound to `key`, if any.
    pub fn from_key(key: KeyCode) -> Option<Self> {
        Some(match key {
            KeyCode::Digit1 | KeyCode::Numpad1 => Self::Technique(Technique::Vsm),
            KeyCode::Digit2 | KeyCode::Numpad2 => Self::Technique(Technique::Msm),
            KeyCode::Equal | KeyCode::NumpadAdd => Self::BlurCount(1),
            KeyCode::Minus | KeyCode::NumpadSubtract => Self::BlurCount(-1),
            KeyCode::ArrowLeft => Self::Azimuth(-ANGLE_STEP),
            KeyCode::ArrowRight => Self::Azimuth(ANGLE_STEP),
            KeyCode::ArrowUp => Self::Inclination(-ANGLE_STEP),
            KeyCode::ArrowDown => Self::Inclination(ANGLE_STEP),
            KeyCode::PageUp => Self::Radius(RADIUS_STEP),
            KeyCode::PageDown => Self::Radius(-RADIUS_STEP),
            KeyCode::BracketLeft => Self::BounceSpeed(-BOUNCE_STEP),
            KeyCode::BracketRight => Self::BounceSpeed(BOUNCE_STEP),
            KeyCode::KeyI => Self::Intensity(INTENSITY_STEP),
            KeyCode::KeyK => Self::Intensity(-INTENSITY_STEP),
            KeyCode::KeyU => Self::Ambient(AMBIENT_STEP),
            KeyCode::KeyJ => Self::Ambient(-AMBIENT_STEP),
            KeyCode::KeyV => Self::ToggleVsync,
            KeyCode::Escape => Self::Exit,
            _ => return None,
        })
    }

    /// Apply a parameter control to `settings`.
    ///
    /// Returns `false` for controls that need the pipeline or the window:
    /// technique, vsync and exit.
    pub fn apply(self, settings: &mut ShadowSettings) -> bool {
        let light = &mut settings.light;
        match self {
            Self::BlurCount(delta) => {
                let count = settings.blur_count().saturating_add_signed(delta);
                settings.set_blur_count(count);
            }
            Self::Azimuth(delta) => light.set_azimuth(light.azimuth() + delta),
            Self::Inclination(delta) => light.set_inclination(light.inclination() + delta),
            Self::Radius(delta) => light.set_radius(light.radius() + delta),
            Self::BounceSpeed(delta) => settings.set_bounce_speed(settings.bounce_speed() + delta),
            Self::Intensity(delta) => light.set_intensity(light.intensity() + Vec3::splat(delta)),
            Self::Ambient(delta) => light.set_ambient(light.ambient() + Vec3::splat(delta)),
            Self::Technique(_) | Self::ToggleVsync | Self::Exit => return false,
        }
        true
    }
}

/// One line per binding, logged at startup.
pub const HELP: &str = "\
Controls:
  1/2          technique (VSM/MSM)
  +/-          blur iterations
  arrows       light azimuth/inclination
  PgUp/PgDn    light radius
  [ ]          bounce speed
  I/K          light intensity
  U/J          ambient
  V            vsync
  Esc          exit";

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(KeyCode::Digit1, Control::Technique(Technique::Vsm))]
    #[case(KeyCode::Digit2, Control::Technique(Technique::Msm))]
    #[case(KeyCode::Equal, Control::BlurCount(1))]
    #[case(KeyCode::Minus, Control::BlurCount(-1))]
    #[case(KeyCode::PageUp, Control::Radius(RADIUS_STEP))]
    #[case(KeyCode::KeyV, Control::ToggleVsync)]
    #[case(KeyCode::Escape, Control::Exit)]
    fn test_key_bindings(#[case] key: KeyCode, #[case] control: Control) {
        assert_eq!(Control::from_key(key), Some(control));
    }

    #[test]
    fn test_unbound_key() {
        assert_eq!(Control::from_key(KeyCode::KeyQ), None);
    }

    #[test]
    fn test_blur_count_clamps() {
        let mut settings = ShadowSettings::default();
        settings.set_blur_count(0);
        assert!(Control::BlurCount(-1).apply(&mut settings));
        assert_eq!(settings.blur_count(), 0);

        settings.set_blur_count(8);
        Control::BlurCount(1).apply(&mut settings);
        assert_eq!(settings.blur_count(), 8);
    }

    #[test]
    fn test_light_controls_clamp() {
        let mut settings = ShadowSettings::default();
        for _ in 0..100 {
            Control::Inclination(-ANGLE_STEP).apply(&mut settings);
            Control::Radius(-RADIUS_STEP).apply(&mut settings);
            Control::Ambient(-AMBIENT_STEP).apply(&mut settings);
        }
        assert_eq!(settings.light.inclination(), 20.0);
        assert_eq!(settings.light.radius(), 50.1);
        assert_eq!(settings.light.ambient(), Vec3::ZERO);

        Control::Azimuth(ANGLE_STEP).apply(&mut settings);
        assert_eq!(settings.light.azimuth(), 5.0);
    }

    #[test]
    fn test_pipeline_controls_not_applied() {
        let mut settings = ShadowSettings::default();
        assert!(!Control::Technique(Technique::Msm).apply(&mut settings));
        assert!(!Control::ToggleVsync.apply(&mut settings));
        assert_eq!(settings, ShadowSettings::default());
    }
}
