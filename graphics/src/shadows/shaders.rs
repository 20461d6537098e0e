//! WGSL sources of the shadow pipeline.

use crate::error::GraphicsError;
use crate::types::TextureFormat;

/// Moment emission from the light (`vs_main`, `fs_vsm`, `fs_msm`).
pub const SHADOW_MAP: &str = include_str!("../../shaders/shadow_map.wgsl");

/// Scene shading (`vs_main`, `fs_vsm`, `fs_msm`).
pub const SHADING: &str = include_str!("../../shaders/shading.wgsl");

/// Separable blur kernel template (`cs_main`).
pub const SHADOW_BLUR: &str = include_str!("../../shaders/shadow_blur.wgsl");

/// Entry point of the blur kernel.
pub const BLUR_ENTRY: &str = "cs_main";

const STORAGE_FORMAT_PLACEHOLDER: &str = "{{STORAGE_FORMAT}}";

/// Blur kernel writing `format`.
///
/// WGSL storage textures carry their texel format in the type, so each
/// technique gets its own instance of the template.
pub fn blur_source(format: TextureFormat) -> Result<String, GraphicsError> {
    let name = format.wgsl_storage_name().ok_or_else(|| {
        GraphicsError::InvalidParameter(format!("{format:?} cannot be a blur target"))
    })?;
    Ok(SHADOW_BLUR.replace(STORAGE_FORMAT_PLACEHOLDER, name))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shader::validate_wgsl;

    #[test]
    fn test_blur_source_substitutes_format() {
        let source = blur_source(TextureFormat::Rgba16Unorm).unwrap();
        assert!(source.contains("texture_storage_2d<rgba16unorm, write>"));
        assert!(!source.contains(STORAGE_FORMAT_PLACEHOLDER));
    }

    #[test]
    fn test_blur_source_rejects_depth() {
        assert!(blur_source(TextureFormat::Depth32Float).is_err());
    }

    #[test]
    fn test_sources_parse() {
        validate_wgsl(SHADOW_MAP, "shadow_map").unwrap();
        validate_wgsl(SHADING, "shading").unwrap();
        for format in [TextureFormat::Rg32Float, TextureFormat::Rgba16Unorm] {
            validate_wgsl(&blur_source(format).unwrap(), "shadow_blur").unwrap();
        }
    }
}
