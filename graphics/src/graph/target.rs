//! Attachments of a graphics pass.

use std::sync::Arc;

use crate::resources::Texture;
use crate::swapchain::SurfaceTexture;
use crate::types::{ClearValue, Extent2d, TextureFormat};

#[cfg(feature = "wgpu-backend")]
use crate::backend::wgpu_impl::SurfaceTextureView;

/// What happens to an attachment's contents when the pass begins.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum LoadOp {
    Clear(ClearValue),
    #[default]
    Load,
    /// Contents are undefined.
    DontCare,
}

/// Whether an attachment's contents survive the pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StoreOp {
    #[default]
    Store,
    DontCare,
}

/// A color output: an owned texture or this frame's swapchain image.
#[derive(Clone)]
pub enum RenderTarget {
    /// Tracked for state transitions.
    Texture(Arc<Texture>),
    /// Owned by the presentation engine and never tracked.
    Surface {
        format: TextureFormat,
        extent: Extent2d,
        #[cfg(feature = "wgpu-backend")]
        view: Option<SurfaceTextureView>,
    },
}

impl RenderTarget {
    pub fn from_texture(texture: Arc<Texture>) -> Self {
        Self::Texture(texture)
    }

    pub fn from_surface(surface: &SurfaceTexture) -> Self {
        Self::Surface {
            format: surface.format(),
            extent: surface.extent(),
            #[cfg(feature = "wgpu-backend")]
            view: surface.wgpu_view().cloned(),
        }
    }

    pub fn texture(&self) -> Option<&Arc<Texture>> {
        match self {
            Self::Texture(texture) => Some(texture),
            Self::Surface { .. } => None,
        }
    }

    pub fn format(&self) -> TextureFormat {
        match self {
            Self::Texture(texture) => texture.format(),
            Self::Surface { format, .. } => *format,
        }
    }

    pub fn extent(&self) -> Extent2d {
        match self {
            Self::Texture(texture) => texture.size(),
            Self::Surface { extent, .. } => *extent,
        }
    }
}

impl std::fmt::Debug for RenderTarget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Texture(texture) => write!(f, "Texture({})", texture.debug_name()),
            Self::Surface { format, extent, .. } => {
                write!(f, "Surface({:?} {}x{})", format, extent.width, extent.height)
            }
        }
    }
}

#[derive(Debug, Clone)]
pub struct ColorAttachment {
    pub target: RenderTarget,
    pub load_op: LoadOp,
    pub store_op: StoreOp,
}

impl ColorAttachment {
    pub fn new(target: RenderTarget) -> Self {
        Self {
            target,
            load_op: LoadOp::default(),
            store_op: StoreOp::default(),
        }
    }

    pub fn from_texture(texture: Arc<Texture>) -> Self {
        Self::new(RenderTarget::from_texture(texture))
    }

    /// Clear before rendering. `value` must be a color.
    pub fn with_clear(mut self, value: ClearValue) -> Self {
        debug_assert!(value.as_color().is_some(), "color attachment cleared with {value:?}");
        self.load_op = LoadOp::Clear(value);
        self
    }

    pub fn with_store_op(mut self, store_op: StoreOp) -> Self {
        self.store_op = store_op;
        self
    }
}

/// A depth-only attachment. Stencil is never used.
#[derive(Debug, Clone)]
pub struct DepthAttachment {
    pub texture: Arc<Texture>,
    pub load_op: LoadOp,
    pub store_op: StoreOp,
}

impl DepthAttachment {
    pub fn new(texture: Arc<Texture>) -> Self {
        Self {
            texture,
            load_op: LoadOp::default(),
            store_op: StoreOp::default(),
        }
    }

    pub fn with_clear_depth(mut self, depth: f32) -> Self {
        self.load_op = LoadOp::Clear(ClearValue::Depth(depth));
        self
    }

    pub fn with_store_op(mut self, store_op: StoreOp) -> Self {
        self.store_op = store_op;
        self
    }
}

/// Attachments of one graphics pass.
#[derive(Debug, Clone, Default)]
pub struct RenderTargetConfig {
    pub color_attachments: Vec<ColorAttachment>,
    pub depth_attachment: Option<DepthAttachment>,
}

impl RenderTargetConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_color(mut self, attachment: ColorAttachment) -> Self {
        self.color_attachments.push(attachment);
        self
    }

    pub fn with_depth(mut self, attachment: DepthAttachment) -> Self {
        self.depth_attachment = Some(attachment);
        self
    }

    /// Render area: the first color attachment, else the depth attachment.
    pub fn extent(&self) -> Option<Extent2d> {
        self.color_attachments
            .first()
            .map(|color| color.target.extent())
            .or_else(|| self.depth_attachment.as_ref().map(|d| d.texture.size()))
    }

    pub fn has_attachments(&self) -> bool {
        !self.color_attachments.is_empty() || self.depth_attachment.is_some()
    }
}
