//! State handed to [`AppHandler`](crate::AppHandler) callbacks.

use std::sync::Arc;

use penumbra_graphics::{
    Extent2d, GraphicsDevice, GraphicsError, GraphicsInstance, RenderTarget, Surface,
    SurfaceConfiguration, SurfaceTexture, TextureFormat,
};

/// Device, swapchain and frame clock of a running app.
pub struct AppContext {
    pub(crate) instance: Arc<GraphicsInstance>,
    pub(crate) device: Arc<GraphicsDevice>,
    pub(crate) surface: Arc<Surface>,
    /// Updated on resize and vsync changes.
    pub(crate) surface_config: SurfaceConfiguration,
    pub(crate) scale_factor: f64,
    pub(crate) frame_number: u64,
    /// Seconds since the previous frame.
    pub(crate) delta_time: f32,
    /// Seconds since startup.
    pub(crate) elapsed_time: f32,
}

impl AppContext {
    pub fn instance(&self) -> &Arc<GraphicsInstance> {
        &self.instance
    }

    pub fn device(&self) -> &Arc<GraphicsDevice> {
        &self.device
    }

    pub fn surface(&self) -> &Arc<Surface> {
        &self.surface
    }

    /// Swapchain size in physical pixels.
    pub fn extent(&self) -> Extent2d {
        self.surface_config.extent()
    }

    pub fn width(&self) -> u32 {
        self.surface_config.width
    }

    pub fn height(&self) -> u32 {
        self.surface_config.height
    }

    pub fn scale_factor(&self) -> f64 {
        self.scale_factor
    }

    /// Frames completed so far.
    pub fn frame_number(&self) -> u64 {
        self.frame_number
    }

    pub fn delta_time(&self) -> f32 {
        self.delta_time
    }

    pub fn elapsed_time(&self) -> f32 {
        self.elapsed_time
    }

    pub fn surface_format(&self) -> TextureFormat {
        self.surface_config.format
    }

    pub fn vsync(&self) -> bool {
        self.surface_config.vsync()
    }

    /// Reconfigure the surface with vsync on or off.
    ///
    /// The GPU must be idle; `ShadowPipelineContext::set_vsync` drains it
    /// before calling this.
    pub fn set_surface_vsync(&mut self, vsync: bool) -> Result<(), GraphicsError> {
        if vsync == self.vsync() {
            return Ok(());
        }
        self.surface_config = self.surface_config.clone().with_vsync(vsync);
        self.surface.configure(&self.device, &self.surface_config)
    }

    pub(crate) fn resize_surface(&mut self, width: u32, height: u32) -> Result<(), GraphicsError> {
        self.surface_config.width = width;
        self.surface_config.height = height;
        self.surface.configure(&self.device, &self.surface_config)
    }
}

/// One frame's swapchain image plus the app context.
///
/// Consumed by [`present`](Self::present) after the frame is submitted.
pub struct DrawContext<'a> {
    pub(crate) app: &'a mut AppContext,
    pub(crate) swapchain_texture: SurfaceTexture,
}

impl DrawContext<'_> {
    pub fn app(&mut self) -> &mut AppContext {
        self.app
    }

    pub fn device(&self) -> &Arc<GraphicsDevice> {
        &self.app.device
    }

    pub fn frame_number(&self) -> u64 {
        self.app.frame_number
    }

    pub fn swapchain_texture(&self) -> &SurfaceTexture {
        &self.swapchain_texture
    }

    /// The swapchain image as a render target.
    pub fn output(&self) -> RenderTarget {
        RenderTarget::from_surface(&self.swapchain_texture)
    }

    pub fn present(self) {
        self.swapchain_texture.present();
    }
}
