//! Load-time configuration and live parameters.

use std::ops::RangeInclusive;

use crate::types::TextureFormat;

use super::light::LightState;
use super::technique::Technique;

/// Upper bound of the blur iteration count.
pub const MAX_BLUR_COUNT: u32 = 8;
/// Allowed bounce speed multiplier.
pub const BOUNCE_SPEED_RANGE: RangeInclusive<f32> = 0.0..=20.0;

/// Constants fixed when the pipeline is built.
#[derive(Debug, Clone, PartialEq)]
pub struct ShadowPipelineConfig {
    /// Edge of the square shadow map and blur textures.
    pub shadow_map_size: u32,
    /// Frame slots the CPU may record ahead of the GPU.
    pub frames_in_flight: u32,
    /// Blur iterations the descriptor tables are sized for.
    pub max_blurs: u32,
    /// Object rows per frame slot.
    pub object_capacity: u32,
    /// Seed of the scene's random stream.
    pub seed: u64,
    /// Color format of the main pass output.
    pub output_format: TextureFormat,
    pub output_width: u32,
    pub output_height: u32,
}

impl Default for ShadowPipelineConfig {
    fn default() -> Self {
        Self {
            shadow_map_size: 2048,
            frames_in_flight: 3,
            max_blurs: MAX_BLUR_COUNT,
            object_capacity: 512,
            seed: 1,
            output_format: TextureFormat::Bgra8UnormSrgb,
            output_width: 1280,
            output_height: 720,
        }
    }
}

impl ShadowPipelineConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_shadow_map_size(mut self, size: u32) -> Self {
        self.shadow_map_size = size;
        self
    }

    pub fn with_frames_in_flight(mut self, frames: u32) -> Self {
        self.frames_in_flight = frames;
        self
    }

    pub fn with_max_blurs(mut self, max_blurs: u32) -> Self {
        self.max_blurs = max_blurs;
        self
    }

    pub fn with_object_capacity(mut self, capacity: u32) -> Self {
        self.object_capacity = capacity;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn with_output(mut self, format: TextureFormat, width: u32, height: u32) -> Self {
        self.output_format = format;
        self.output_width = width;
        self.output_height = height;
        self
    }

    /// Check the values against each other and the device limit.
    pub fn validate(&self, max_texture_dimension: u32) -> Result<(), String> {
        if self.frames_in_flight == 0 {
            return Err("frames_in_flight must be at least 1".into());
        }
        if self.max_blurs > MAX_BLUR_COUNT {
            return Err(format!(
                "max_blurs {} exceeds {MAX_BLUR_COUNT}",
                self.max_blurs
            ));
        }
        if self.shadow_map_size == 0 || self.shadow_map_size > max_texture_dimension {
            return Err(format!(
                "shadow map size {} outside 1..={max_texture_dimension}",
                self.shadow_map_size
            ));
        }
        Ok(())
    }
}

/// Parameters read every frame. Setters clamp.
#[derive(Debug, Clone, PartialEq)]
pub struct ShadowSettings {
    pub technique: Technique,
    blur_count: u32,
    bounce_speed: f32,
    pub vsync: bool,
    pub light: LightState,
}

impl Default for ShadowSettings {
    fn default() -> Self {
        Self {
            technique: Technique::Vsm,
            blur_count: 1,
            bounce_speed: 1.0,
            vsync: true,
            light: LightState::default(),
        }
    }
}

impl ShadowSettings {
    pub fn blur_count(&self) -> u32 {
        self.blur_count
    }

    pub fn set_blur_count(&mut self, count: u32) {
        self.blur_count = count.min(MAX_BLUR_COUNT);
    }

    pub fn bounce_speed(&self) -> f32 {
        self.bounce_speed
    }

    pub fn set_bounce_speed(&mut self, speed: f32) {
        self.bounce_speed = speed.clamp(*BOUNCE_SPEED_RANGE.start(), *BOUNCE_SPEED_RANGE.end());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ShadowPipelineConfig::default();
        assert_eq!(config.shadow_map_size, 2048);
        assert_eq!(config.frames_in_flight, 3);
        assert_eq!(config.object_capacity, 512);

        let settings = ShadowSettings::default();
        assert_eq!(settings.technique, Technique::Vsm);
        assert_eq!(settings.blur_count(), 1);
        assert_eq!(settings.bounce_speed(), 1.0);
    }

    #[test]
    fn test_setters_clamp() {
        let mut settings = ShadowSettings::default();
        settings.set_blur_count(20);
        assert_eq!(settings.blur_count(), MAX_BLUR_COUNT);
        settings.set_bounce_speed(-3.0);
        assert_eq!(settings.bounce_speed(), 0.0);
        settings.set_bounce_speed(50.0);
        assert_eq!(settings.bounce_speed(), 20.0);
    }

    #[test]
    fn test_validate() {
        let config = ShadowPipelineConfig::default();
        assert!(config.validate(8192).is_ok());
        assert!(config.validate(1024).is_err());
        assert!(config.clone().with_frames_in_flight(0).validate(8192).is_err());
        assert!(config.with_max_blurs(9).validate(8192).is_err());
    }
}
