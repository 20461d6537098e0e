use clap::Parser;
use penumbra_app::{AppArgs, CommonArgs};
use penumbra_graphics::shadows::{LightState, ShadowSettings, Technique};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum CliTechnique {
    /// Variance shadow maps.
    #[default]
    Vsm,
    /// Moment shadow maps. Falls back to VSM if the device lacks
    /// Rgba16Unorm storage.
    Msm,
}

impl From<CliTechnique> for Technique {
    fn from(cli: CliTechnique) -> Self {
        match cli {
            CliTechnique::Vsm => Technique::Vsm,
            CliTechnique::Msm => Technique::Msm,
        }
    }
}

/// Soft-shadow demo: bouncing spheres over a plane, one orbiting light.
#[derive(Parser, Debug, Clone)]
#[command(name = "moment_shadows", version)]
pub struct DemoArgs {
    #[command(flatten)]
    pub common: CommonArgs,

    /// Initial shadow technique.
    #[arg(long, default_value = "vsm", value_enum)]
    pub technique: CliTechnique,

    /// Initial blur iterations (0-8).
    #[arg(long, default_value = "1")]
    pub blur_count: u32,

    /// Bounce speed multiplier (0-20).
    #[arg(long, default_value = "1.0")]
    pub bounce_speed: f32,

    /// Light distance from the origin (50.1-200).
    #[arg(long, default_value = "100.0")]
    pub light_radius: f32,

    /// Light inclination from +Y in degrees (20-160).
    #[arg(long, default_value = "60.0")]
    pub light_inclination: f32,

    /// Light azimuth in degrees (-179.9-179.9).
    #[arg(long, default_value = "0.0", allow_negative_numbers = true)]
    pub light_azimuth: f32,

    /// Seed of the sphere bounce parameters.
    #[arg(long, default_value = "1")]
    pub seed: u64,
}

impl DemoArgs {
    /// Live parameters at startup. Out-of-range values are clamped.
    pub fn settings(&self) -> ShadowSettings {
        let mut light = LightState::default();
        light.set_radius(self.light_radius);
        light.set_inclination(self.light_inclination);
        light.set_azimuth(self.light_azimuth);

        let mut settings = ShadowSettings::default();
        settings.technique = self.technique.into();
        settings.set_blur_count(self.blur_count);
        settings.set_bounce_speed(self.bounce_speed);
        settings.vsync = self.vsync();
        settings.light = light;
        settings
    }
}

impl AppArgs for DemoArgs {
    fn parse() -> Self {
        <Self as Parser>::parse()
    }

    fn common(&self) -> Option<&CommonArgs> {
        Some(&self.common)
    }

    fn window_title(&self) -> &str {
        "Penumbra - Moment Shadows"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_demo_flags() {
        let args = DemoArgs::try_parse_from([
            "moment_shadows",
            "--technique",
            "msm",
            "--blur-count",
            "12",
            "--light-azimuth",
            "-45",
            "--seed",
            "7",
            "--backend",
            "dummy",
        ])
        .unwrap();
        let settings = args.settings();
        assert_eq!(settings.technique, Technique::Msm);
        assert_eq!(settings.blur_count(), 8);
        assert_eq!(settings.light.azimuth(), -45.0);
        assert_eq!(args.seed, 7);
    }
}
