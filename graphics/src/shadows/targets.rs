//! Shadow map render target and blur scratch textures.

use std::sync::Arc;

use crate::device::GraphicsDevice;
use crate::error::GraphicsError;
use crate::resources::Texture;
use crate::types::{TextureDescriptor, TextureFormat, TextureUsage};

use super::scope::ResourceScope;
use super::technique::Technique;

/// Depth format of the shadow pass and the main pass.
pub const DEPTH_FORMAT: TextureFormat = TextureFormat::Depth32Float;

/// Moment target rendered from the light, plus its depth attachment.
///
/// Sized independently of the swapchain.
#[derive(Debug, Clone)]
pub struct ShadowTarget {
    pub color: Arc<Texture>,
    pub depth: Arc<Texture>,
}

impl ShadowTarget {
    pub fn new(
        device: &Arc<GraphicsDevice>,
        scope: &mut ResourceScope,
        technique: Technique,
        size: u32,
    ) -> Result<Self, GraphicsError> {
        let format = technique.desc().render_target_format;
        let color = scope.adopt(device.create_texture(
            &TextureDescriptor::new_2d(
                size,
                size,
                format,
                TextureUsage::RENDER_ATTACHMENT | TextureUsage::TEXTURE_BINDING,
            )
            .with_label(format!("shadow_map_{}", technique.name())),
        )?);
        let depth = scope.adopt(device.create_texture(
            &TextureDescriptor::new_2d(size, size, DEPTH_FORMAT, TextureUsage::RENDER_ATTACHMENT)
                .with_label(format!("shadow_depth_{}", technique.name())),
        )?);
        Ok(Self { color, depth })
    }

    pub fn size(&self) -> u32 {
        self.color.width()
    }
}

/// The two ping-pong textures of the blur.
///
/// Both can be written by a compute dispatch and sampled afterwards.
#[derive(Debug, Clone)]
pub struct BlurScratch {
    pub horizontal: Arc<Texture>,
    pub vertical: Arc<Texture>,
}

impl BlurScratch {
    pub fn new(
        device: &Arc<GraphicsDevice>,
        scope: &mut ResourceScope,
        technique: Technique,
        size: u32,
    ) -> Result<Self, GraphicsError> {
        let format = technique.desc().render_target_format;
        let mut create = |phase: &str| -> Result<Arc<Texture>, GraphicsError> {
            Ok(scope.adopt(device.create_texture(
                &TextureDescriptor::new_2d(
                    size,
                    size,
                    format,
                    TextureUsage::STORAGE_BINDING | TextureUsage::TEXTURE_BINDING,
                )
                .with_label(format!("blur_{phase}_{}", technique.name())),
            )?))
        };
        let horizontal = create("horizontal")?;
        let vertical = create("vertical")?;
        Ok(Self {
            horizontal,
            vertical,
        })
    }
}

/// Depth attachment of the main pass, sized to the output.
pub fn create_main_depth(
    device: &Arc<GraphicsDevice>,
    width: u32,
    height: u32,
) -> Result<Arc<Texture>, GraphicsError> {
    device.create_texture(
        &TextureDescriptor::new_2d(width, height, DEPTH_FORMAT, TextureUsage::RENDER_ATTACHMENT)
            .with_label("main_depth"),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::instance::GraphicsInstance;

    #[test]
    fn test_shadow_target_formats() {
        let device = GraphicsInstance::dummy().create_device().unwrap();
        let mut scope = ResourceScope::new(&device);
        let target = ShadowTarget::new(&device, &mut scope, Technique::Vsm, 2048).unwrap();
        assert_eq!(target.size(), 2048);
        assert_eq!(target.color.format(), TextureFormat::Rg32Float);
        assert_eq!(target.depth.format(), DEPTH_FORMAT);

        let scratch = BlurScratch::new(&device, &mut scope, Technique::Msm, 1024).unwrap();
        assert_eq!(scratch.horizontal.format(), TextureFormat::Rgba16Unorm);
        assert!(scratch.vertical.usage().contains(TextureUsage::STORAGE_BINDING));
        assert_eq!(scope.len(), 4);
    }
}
