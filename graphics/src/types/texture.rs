//! Texture types and descriptors.

use super::Extent2d;
use bitflags::bitflags;

/// Texture format enumeration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[non_exhaustive]
pub enum TextureFormat {
    // 32-bit formats
    /// 8-bit RGBA channels, unsigned normalized.
    #[default]
    Rgba8Unorm,
    /// 8-bit RGBA channels, sRGB.
    Rgba8UnormSrgb,
    /// 8-bit BGRA channels, unsigned normalized.
    Bgra8Unorm,
    /// 8-bit BGRA channels, sRGB.
    Bgra8UnormSrgb,

    // 64-bit formats
    /// 16-bit RGBA channels, unsigned normalized. MSM moments.
    Rgba16Unorm,
    /// 16-bit RGBA channels, float.
    Rgba16Float,
    /// 32-bit RG channels, float. VSM moments.
    Rg32Float,

    // Depth formats
    /// 32-bit depth, float.
    Depth32Float,
}

impl TextureFormat {
    /// Returns the size in bytes per pixel.
    pub fn block_size(&self) -> u32 {
        match self {
            Self::Rgba8Unorm
            | Self::Rgba8UnormSrgb
            | Self::Bgra8Unorm
            | Self::Bgra8UnormSrgb
            | Self::Depth32Float => 4,
            Self::Rgba16Unorm | Self::Rgba16Float | Self::Rg32Float => 8,
        }
    }

    /// Number of color channels.
    pub fn channel_count(&self) -> u32 {
        match self {
            Self::Rg32Float => 2,
            Self::Depth32Float => 1,
            _ => 4,
        }
    }

    /// WGSL storage texel format name, for formats usable as storage textures.
    pub fn wgsl_storage_name(&self) -> Option<&'static str> {
        match self {
            Self::Rgba8Unorm => Some("rgba8unorm"),
            Self::Rgba16Unorm => Some("rgba16unorm"),
            Self::Rgba16Float => Some("rgba16float"),
            Self::Rg32Float => Some("rg32float"),
            _ => None,
        }
    }
}

bitflags! {
    /// Usage flags for textures.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct TextureUsage: u32 {
        /// Texture can be copied from.
        const COPY_SRC = 1 << 0;
        /// Texture can be copied to.
        const COPY_DST = 1 << 1;
        /// Texture can be sampled in a shader.
        const TEXTURE_BINDING = 1 << 2;
        /// Texture can be used as a storage texture.
        const STORAGE_BINDING = 1 << 3;
        /// Texture can be used as a render attachment.
        const RENDER_ATTACHMENT = 1 << 4;
    }
}

impl Default for TextureUsage {
    fn default() -> Self {
        Self::empty()
    }
}

/// Descriptor for creating a texture.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TextureDescriptor {
    /// Debug label for the texture.
    pub label: Option<String>,
    /// Size of the texture.
    pub size: Extent2d,
    /// Texture format.
    pub format: TextureFormat,
    /// Usage flags.
    pub usage: TextureUsage,
}

impl TextureDescriptor {
    /// Create a new 2D texture descriptor.
    pub fn new_2d(width: u32, height: u32, format: TextureFormat, usage: TextureUsage) -> Self {
        Self {
            label: None,
            size: Extent2d::new(width, height),
            format,
            usage,
        }
    }

    /// Set the debug label.
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Size in bytes of the single mip level.
    pub fn byte_size(&self) -> u64 {
        self.size.texel_count() * self.format.block_size() as u64
    }
}

impl Default for TextureDescriptor {
    fn default() -> Self {
        Self {
            label: None,
            size: Extent2d::default(),
            format: TextureFormat::default(),
            usage: TextureUsage::empty(),
        }
    }
}
