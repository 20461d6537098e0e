//! Window surfaces and presentation.
//!
//! A [`Surface`] is configured once per size or vsync change and then hands
//! out one [`SurfaceTexture`] per frame:
//!
//! ```ignore
//! let surface = instance.create_surface(window.clone())?;
//! let config = SurfaceConfiguration::new(1280, 720)
//!     .with_format(surface.preferred_format())
//!     .with_vsync(true);
//! surface.configure(&device, &config)?;
//!
//! let frame = surface.acquire_texture()?;
//! context.render_frame(RenderTarget::from_surface(&frame))?;
//! frame.present();
//! ```
//!
//! On the dummy backend nothing is displayed; configure and present calls
//! land in the device's event log.

use std::sync::Arc;

use parking_lot::RwLock;
use raw_window_handle::{HasDisplayHandle, HasWindowHandle};

use crate::device::GraphicsDevice;
use crate::error::GraphicsError;
use crate::instance::GraphicsInstance;
use crate::types::{Extent2d, TextureFormat};

#[cfg(feature = "wgpu-backend")]
use crate::backend::GpuBackend;
#[cfg(feature = "wgpu-backend")]
use crate::backend::wgpu_impl::SurfaceTextureView;
#[cfg(feature = "wgpu-backend")]
use crate::backend::wgpu_impl::swapchain::WgpuSurface;

/// A window a [`Surface`] can be created for.
///
/// Implemented for every thread-safe type exposing raw window and display
/// handles, such as `winit::window::Window`.
pub trait WindowHandle: HasWindowHandle + HasDisplayHandle + Send + Sync {}

impl<T> WindowHandle for T where T: HasWindowHandle + HasDisplayHandle + Send + Sync {}

/// When presentation happens relative to vertical blank.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum PresentMode {
    /// Present immediately. May tear.
    Immediate,
    /// Wait for vertical blank.
    #[default]
    Fifo,
}

impl PresentMode {
    pub fn from_vsync(vsync: bool) -> Self {
        if vsync { Self::Fifo } else { Self::Immediate }
    }

    pub fn is_vsync(self) -> bool {
        self == Self::Fifo
    }
}

/// Swapchain format, size and present mode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SurfaceConfiguration {
    pub format: TextureFormat,
    pub width: u32,
    pub height: u32,
    pub present_mode: PresentMode,
}

impl SurfaceConfiguration {
    /// Vsync on, `Bgra8Unorm` until a preferred format is known.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            format: TextureFormat::Bgra8Unorm,
            width,
            height,
            present_mode: PresentMode::default(),
        }
    }

    pub fn with_format(mut self, format: TextureFormat) -> Self {
        self.format = format;
        self
    }

    pub fn with_vsync(mut self, vsync: bool) -> Self {
        self.present_mode = PresentMode::from_vsync(vsync);
        self
    }

    pub fn extent(&self) -> Extent2d {
        Extent2d::new(self.width, self.height)
    }

    pub fn vsync(&self) -> bool {
        self.present_mode.is_vsync()
    }
}

/// Configuration plus the device it was applied with.
struct Configured {
    config: SurfaceConfiguration,
    device: Arc<GraphicsDevice>,
}

/// A window surface. Keeps its window alive.
///
/// Must be [configured](Surface::configure) before the first acquire.
pub struct Surface {
    instance: Arc<GraphicsInstance>,
    #[cfg_attr(not(feature = "wgpu-backend"), allow(dead_code))]
    window: Arc<dyn WindowHandle>,
    configured: RwLock<Option<Configured>>,
    #[cfg(feature = "wgpu-backend")]
    wgpu: Option<WgpuSurface>,
}

impl Surface {
    pub(crate) fn new(
        instance: Arc<GraphicsInstance>,
        window: Arc<dyn WindowHandle>,
    ) -> Result<Self, GraphicsError> {
        #[cfg(feature = "wgpu-backend")]
        let wgpu = match instance.backend().as_ref() {
            GpuBackend::Wgpu(backend) => Some(WgpuSurface::new(backend, Arc::clone(&window))?),
            _ => None,
        };
        log::info!("Created surface on {}", instance.backend().name());

        Ok(Self {
            instance,
            window,
            configured: RwLock::new(None),
            #[cfg(feature = "wgpu-backend")]
            wgpu,
        })
    }

    pub fn instance(&self) -> &Arc<GraphicsInstance> {
        &self.instance
    }

    /// The format to configure with: sRGB when the surface offers one.
    pub fn preferred_format(&self) -> TextureFormat {
        #[cfg(feature = "wgpu-backend")]
        if let Some(surface) = &self.wgpu
            && let GpuBackend::Wgpu(backend) = self.instance.backend().as_ref()
        {
            return surface.preferred_format(backend);
        }
        TextureFormat::Bgra8Unorm
    }

    /// Apply `config`. Called at startup and again after a resize or a
    /// vsync change, once the GPU is idle.
    ///
    /// # Errors
    ///
    /// Returns [`GraphicsError::InvalidParameter`] for a zero-sized config.
    pub fn configure(
        &self,
        device: &Arc<GraphicsDevice>,
        config: &SurfaceConfiguration,
    ) -> Result<(), GraphicsError> {
        if config.extent().is_empty() {
            return Err(GraphicsError::InvalidParameter(format!(
                "surface size {}x{}",
                config.width, config.height
            )));
        }
        log::info!(
            "Configuring surface {}x{} {:?} vsync={}",
            config.width,
            config.height,
            config.format,
            config.vsync()
        );

        if let Some(dummy) = device.dummy() {
            dummy.note_surface_configured(config.width, config.height, config.vsync());
        }
        #[cfg(feature = "wgpu-backend")]
        if let Some(surface) = &self.wgpu
            && let GpuBackend::Wgpu(backend) = self.instance.backend().as_ref()
        {
            surface.configure(backend, config);
        }

        *self.configured.write() = Some(Configured {
            config: config.clone(),
            device: Arc::clone(device),
        });
        Ok(())
    }

    /// The active configuration, if any.
    pub fn config(&self) -> Option<SurfaceConfiguration> {
        self.configured.read().as_ref().map(|c| c.config.clone())
    }

    /// Acquire this frame's image.
    ///
    /// # Errors
    ///
    /// [`GraphicsError::SurfaceOutdated`] or [`GraphicsError::SurfaceLost`]
    /// when the window changed under the swapchain, `InvalidParameter` if
    /// the surface was never configured.
    pub fn acquire_texture(&self) -> Result<SurfaceTexture, GraphicsError> {
        let (config, device) = match self.configured.read().as_ref() {
            Some(c) => (c.config.clone(), Arc::clone(&c.device)),
            None => {
                return Err(GraphicsError::InvalidParameter(
                    "surface not configured".to_string(),
                ));
            }
        };

        #[cfg(feature = "wgpu-backend")]
        let image = self.wgpu.as_ref().map(WgpuSurface::acquire).transpose()?;

        log::trace!("Acquired {}x{} surface image", config.width, config.height);
        Ok(SurfaceTexture {
            device,
            format: config.format,
            extent: config.extent(),
            #[cfg(feature = "wgpu-backend")]
            wgpu_view: image.as_ref().map(|i| i.view.clone()),
            #[cfg(feature = "wgpu-backend")]
            wgpu_texture: image.map(|i| i.texture),
        })
    }
}

impl std::fmt::Debug for Surface {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Surface")
            .field("config", &self.config())
            .finish()
    }
}

/// One swapchain image. Dropping it without [`present`](Self::present)
/// discards the frame.
pub struct SurfaceTexture {
    device: Arc<GraphicsDevice>,
    format: TextureFormat,
    extent: Extent2d,
    #[cfg(feature = "wgpu-backend")]
    wgpu_texture: Option<wgpu::SurfaceTexture>,
    #[cfg(feature = "wgpu-backend")]
    wgpu_view: Option<SurfaceTextureView>,
}

impl SurfaceTexture {
    pub fn format(&self) -> TextureFormat {
        self.format
    }

    pub fn extent(&self) -> Extent2d {
        self.extent
    }

    pub fn width(&self) -> u32 {
        self.extent.width
    }

    pub fn height(&self) -> u32 {
        self.extent.height
    }

    #[cfg(feature = "wgpu-backend")]
    pub fn wgpu_view(&self) -> Option<&SurfaceTextureView> {
        self.wgpu_view.as_ref()
    }

    /// Show the image. The frame's work must already be submitted.
    pub fn present(self) {
        log::trace!("Presenting surface image");
        if let Some(dummy) = self.device.dummy() {
            dummy.note_present();
        }
        #[cfg(feature = "wgpu-backend")]
        if let Some(texture) = self.wgpu_texture {
            texture.present();
        }
    }
}

impl std::fmt::Debug for SurfaceTexture {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SurfaceTexture")
            .field("format", &self.format)
            .field("extent", &self.extent)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_present_mode_follows_vsync() {
        assert_eq!(PresentMode::from_vsync(true), PresentMode::Fifo);
        assert_eq!(PresentMode::from_vsync(false), PresentMode::Immediate);
        assert!(!PresentMode::Immediate.is_vsync());
    }

    #[test]
    fn test_surface_config_builder() {
        let config = SurfaceConfiguration::new(1280, 720)
            .with_format(TextureFormat::Rgba8Unorm)
            .with_vsync(false);
        assert_eq!(config.extent(), Extent2d::new(1280, 720));
        assert_eq!(config.format, TextureFormat::Rgba8Unorm);
        assert!(!config.vsync());
        assert!(config.clone().with_vsync(true).vsync());
    }
}
