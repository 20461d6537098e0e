//! Shadow-mapping techniques.
//!
//! Both techniques store depth moments in a color target and reconstruct a
//! soft visibility term from the filtered moments:
//!
//! | Technique | Target | Moments |
//! |-----------|--------|---------|
//! | [`Technique::Vsm`] | `Rg32Float` | `(d, d²)` |
//! | [`Technique::Msm`] | `Rgba16Unorm` | `(d, d², d³, d⁴)`, quantized |
//!
//! The pipeline driver only ever looks at a [`TechniqueDesc`], so it is
//! written once for both.

use std::fmt;

use crate::types::TextureFormat;

use super::shaders;

/// One shader module with a vertex and a fragment entry point.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShaderPair {
    pub label: &'static str,
    pub source: &'static str,
    pub vertex_entry: &'static str,
    pub fragment_entry: &'static str,
}

/// Everything that differs between techniques.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TechniqueDesc {
    /// Format of the shadow target and both blur scratch textures.
    pub render_target_format: TextureFormat,
    /// Moment emission from the light's point of view.
    pub shadow_shader_pair: ShaderPair,
    /// Scene shading that reads the filtered moments.
    pub main_shader_pair: ShaderPair,
}

/// Shadow-mapping technique.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Technique {
    /// Variance shadow maps.
    #[default]
    Vsm,
    /// Moment shadow maps (Hamburger 4MSM).
    Msm,
}

impl Technique {
    /// All techniques, in index order.
    pub const ALL: [Technique; 2] = [Technique::Vsm, Technique::Msm];

    /// Stable index, used to address per-technique storage.
    pub fn index(self) -> usize {
        match self {
            Self::Vsm => 0,
            Self::Msm => 1,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Vsm => "vsm",
            Self::Msm => "msm",
        }
    }

    pub fn desc(self) -> TechniqueDesc {
        match self {
            Self::Vsm => TechniqueDesc {
                render_target_format: TextureFormat::Rg32Float,
                shadow_shader_pair: ShaderPair {
                    label: "shadow_map_vsm",
                    source: shaders::SHADOW_MAP,
                    vertex_entry: "vs_main",
                    fragment_entry: "fs_vsm",
                },
                main_shader_pair: ShaderPair {
                    label: "shading_vsm",
                    source: shaders::SHADING,
                    vertex_entry: "vs_main",
                    fragment_entry: "fs_vsm",
                },
            },
            Self::Msm => TechniqueDesc {
                render_target_format: TextureFormat::Rgba16Unorm,
                shadow_shader_pair: ShaderPair {
                    label: "shadow_map_msm",
                    source: shaders::SHADOW_MAP,
                    vertex_entry: "vs_main",
                    fragment_entry: "fs_msm",
                },
                main_shader_pair: ShaderPair {
                    label: "shading_msm",
                    source: shaders::SHADING,
                    vertex_entry: "vs_main",
                    fragment_entry: "fs_msm",
                },
            },
        }
    }
}

impl fmt::Display for Technique {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Vsm => "VSM",
            Self::Msm => "MSM",
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_target_formats() {
        assert_eq!(Technique::Vsm.desc().render_target_format.channel_count(), 2);
        assert_eq!(
            Technique::Msm.desc().render_target_format,
            TextureFormat::Rgba16Unorm
        );
    }

    #[test]
    fn test_indices_are_distinct() {
        let indices: Vec<_> = Technique::ALL.iter().map(|t| t.index()).collect();
        assert_eq!(indices, vec![0, 1]);
    }

    #[test]
    fn test_techniques_share_modules_not_entry_points() {
        let vsm = Technique::Vsm.desc();
        let msm = Technique::Msm.desc();
        assert_eq!(vsm.shadow_shader_pair.source, msm.shadow_shader_pair.source);
        assert_ne!(
            vsm.shadow_shader_pair.fragment_entry,
            msm.shadow_shader_pair.fragment_entry
        );
        assert_ne!(vsm.main_shader_pair.label, msm.main_shader_pair.label);
    }
}
