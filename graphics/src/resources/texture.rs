//! GPU texture resource.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::backend::GpuTexture;
use crate::device::GraphicsDevice;
use crate::types::{Extent2d, TextureDescriptor, TextureFormat, TextureUsage};

/// Process-unique texture identity, used to key resource-state tracking.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TextureId(u64);

impl TextureId {
    fn next() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(1);
        Self(NEXT.fetch_add(1, Ordering::Relaxed))
    }

    /// Raw id value.
    pub fn raw(&self) -> u64 {
        self.0
    }
}

/// A GPU texture resource.
///
/// Textures are created by [`GraphicsDevice::create_texture`] and are reference-counted.
/// They hold a strong reference to their parent device, keeping it alive.
///
/// # Example
///
/// ```ignore
/// let texture = device.create_texture(&TextureDescriptor::new_2d(
///     2048, 2048,
///     TextureFormat::Rg32Float,
///     TextureUsage::RENDER_ATTACHMENT | TextureUsage::TEXTURE_BINDING,
/// ))?;
/// println!("Texture size: {}x{}", texture.width(), texture.height());
/// ```
pub struct Texture {
    id: TextureId,
    device: Arc<GraphicsDevice>,
    descriptor: TextureDescriptor,
    gpu: GpuTexture,
}

impl Texture {
    /// Create a new texture (called by GraphicsDevice).
    pub(crate) fn new(
        device: Arc<GraphicsDevice>,
        descriptor: TextureDescriptor,
        gpu: GpuTexture,
    ) -> Self {
        Self {
            id: TextureId::next(),
            device,
            descriptor,
            gpu,
        }
    }

    /// Get the texture identity.
    pub fn id(&self) -> TextureId {
        self.id
    }

    /// Get the parent device.
    pub fn device(&self) -> &Arc<GraphicsDevice> {
        &self.device
    }

    /// Get the texture descriptor.
    pub fn descriptor(&self) -> &TextureDescriptor {
        &self.descriptor
    }

    /// Get the texture size.
    pub fn size(&self) -> Extent2d {
        self.descriptor.size
    }

    /// Get the texture width.
    pub fn width(&self) -> u32 {
        self.descriptor.size.width
    }

    /// Get the texture height.
    pub fn height(&self) -> u32 {
        self.descriptor.size.height
    }

    /// Get the texture format.
    pub fn format(&self) -> TextureFormat {
        self.descriptor.format
    }

    /// Get the usage flags.
    pub fn usage(&self) -> TextureUsage {
        self.descriptor.usage
    }

    /// Get the texture label, if set.
    pub fn label(&self) -> Option<&str> {
        self.descriptor.label.as_deref()
    }

    /// Label for logs, falling back to the id.
    pub fn debug_name(&self) -> String {
        match self.label() {
            Some(label) => label.to_string(),
            None => format!("texture#{}", self.id.0),
        }
    }

    pub(crate) fn gpu_handle(&self) -> &GpuTexture {
        &self.gpu
    }
}

impl std::fmt::Debug for Texture {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Texture")
            .field("id", &self.id.0)
            .field("size", &self.descriptor.size)
            .field("format", &self.descriptor.format)
            .field("usage", &self.descriptor.usage)
            .field("label", &self.descriptor.label)
            .finish()
    }
}

// Ensure Texture is Send + Sync
static_assertions::assert_impl_all!(Texture: Send, Sync);
