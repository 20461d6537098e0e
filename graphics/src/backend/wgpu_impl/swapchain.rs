//! wgpu side of [`Surface`](crate::swapchain::Surface).

use std::sync::Arc;

use super::conversion::{convert_present_mode, convert_surface_format, convert_texture_format};
use super::{SurfaceTextureView, WgpuBackend};
use crate::error::GraphicsError;
use crate::swapchain::{SurfaceConfiguration, WindowHandle};
use crate::types::TextureFormat;

/// A window surface bound to the instance of a [`WgpuBackend`].
pub struct WgpuSurface {
    surface: wgpu::Surface<'static>,
}

/// An acquired image: the handle to present plus the view to render into.
pub struct AcquiredImage {
    pub texture: wgpu::SurfaceTexture,
    pub view: SurfaceTextureView,
}

impl WgpuSurface {
    pub fn new(backend: &WgpuBackend, window: Arc<dyn WindowHandle>) -> Result<Self, GraphicsError> {
        let surface = backend.instance().create_surface(window).map_err(|e| {
            GraphicsError::ResourceCreationFailed(format!("wgpu surface: {e}"))
        })?;
        Ok(Self { surface })
    }

    /// An sRGB format if the surface offers one, else its first known format.
    pub fn preferred_format(&self, backend: &WgpuBackend) -> TextureFormat {
        let caps = self.surface.get_capabilities(backend.adapter());
        let known = || caps.formats.iter().filter_map(|f| convert_surface_format(*f));
        known()
            .find(|f| matches!(f, TextureFormat::Bgra8UnormSrgb | TextureFormat::Rgba8UnormSrgb))
            .or_else(|| known().next())
            .unwrap_or(TextureFormat::Bgra8Unorm)
    }

    pub fn configure(&self, backend: &WgpuBackend, config: &SurfaceConfiguration) {
        self.surface.configure(
            backend.device(),
            &wgpu::SurfaceConfiguration {
                usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
                format: convert_texture_format(config.format),
                width: config.width,
                height: config.height,
                present_mode: convert_present_mode(config.present_mode),
                alpha_mode: wgpu::CompositeAlphaMode::Auto,
                view_formats: vec![],
                desired_maximum_frame_latency: 2,
            },
        );
    }

    /// Acquire the next image. Timeouts count as an outdated surface.
    pub fn acquire(&self) -> Result<AcquiredImage, GraphicsError> {
        let texture = self.surface.get_current_texture().map_err(|e| match e {
            wgpu::SurfaceError::Outdated | wgpu::SurfaceError::Timeout => {
                GraphicsError::SurfaceOutdated
            }
            wgpu::SurfaceError::Lost => GraphicsError::SurfaceLost,
            wgpu::SurfaceError::OutOfMemory => GraphicsError::OutOfMemory,
            other => GraphicsError::Internal(format!("surface acquire: {other}")),
        })?;
        let view = texture
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());
        Ok(AcquiredImage {
            texture,
            view: SurfaceTextureView {
                view: Arc::new(view),
            },
        })
    }
}
