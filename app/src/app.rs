//! Window, event loop and frame driving.

use std::sync::Arc;
use std::time::Instant;

use winit::application::ApplicationHandler;
use winit::error::EventLoopError;
use winit::event::WindowEvent;
use winit::event_loop::{ActiveEventLoop, EventLoop};
#[cfg(target_os = "windows")]
use winit::platform::windows::EventLoopBuilderExtWindows;
use winit::window::{Window, WindowId};

use penumbra_graphics::{
    Extent2d, GraphicsError, GraphicsInstance, InstanceParameters, SurfaceConfiguration,
};

use crate::args::AppArgs;
use crate::context::{AppContext, DrawContext};
use crate::handler::AppHandler;

/// Wall-clock timing between redraws.
struct FrameClock {
    start: Instant,
    last: Instant,
}

impl FrameClock {
    fn new() -> Self {
        let now = Instant::now();
        Self {
            start: now,
            last: now,
        }
    }

    /// Seconds since the previous tick and since startup.
    fn tick(&mut self) -> (f32, f32) {
        let now = Instant::now();
        let delta = now.duration_since(self.last).as_secs_f32();
        self.last = now;
        (delta, now.duration_since(self.start).as_secs_f32())
    }
}

/// Runs an [`AppHandler`] in a window configured from [`AppArgs`].
///
/// ```ignore
/// fn main() -> Result<(), winit::error::EventLoopError> {
///     let args = <DefaultAppArgs as AppArgs>::parse();
///     App::run(MyHandler::default(), args)
/// }
/// ```
pub struct App<H, A>
where
    H: AppHandler,
    A: AppArgs,
{
    handler: H,
    args: A,
    window: Option<Arc<Window>>,
    context: Option<AppContext>,
    clock: FrameClock,
    running: bool,
}

impl<H, A> App<H, A>
where
    H: AppHandler + 'static,
    A: AppArgs + 'static,
{
    pub fn new(handler: H, args: A) -> Self {
        Self {
            handler,
            args,
            window: None,
            context: None,
            clock: FrameClock::new(),
            running: true,
        }
    }

    /// Initialize logging and block in the event loop until the window closes.
    pub fn run(handler: H, args: A) -> Result<(), EventLoopError> {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

        penumbra_core::init();
        penumbra_graphics::init();
        crate::init();

        #[cfg(target_os = "windows")]
        let event_loop = EventLoop::builder().with_any_thread(true).build()?;
        #[cfg(not(target_os = "windows"))]
        let event_loop = EventLoop::new()?;

        event_loop.run_app(&mut Self::new(handler, args))
    }

    fn init_graphics(&self, window: Arc<Window>) -> Result<AppContext, GraphicsError> {
        let instance = GraphicsInstance::with_parameters(
            InstanceParameters::new()
                .with_backend(self.args.backend())
                .with_validation(self.args.validation()),
        )?;

        let scale_factor = window.scale_factor();
        let size = window.inner_size();
        let surface = instance.create_surface(window)?;
        let device = instance.create_device()?;

        let surface_config = SurfaceConfiguration::new(size.width.max(1), size.height.max(1))
            .with_format(surface.preferred_format())
            .with_vsync(self.args.vsync());
        surface.configure(&device, &surface_config)?;

        log::info!(
            "Graphics ready on {}: {}x{} {:?}, scale factor {}",
            device.name(),
            surface_config.width,
            surface_config.height,
            surface_config.format,
            scale_factor
        );

        Ok(AppContext {
            instance,
            device,
            surface,
            surface_config,
            scale_factor,
            frame_number: 0,
            delta_time: 0.0,
            elapsed_time: 0.0,
        })
    }

    /// Drain the GPU, reconfigure the swapchain, then let the handler react.
    fn apply_resize(&mut self, extent: Extent2d) {
        let Some(ctx) = &mut self.context else {
            return;
        };
        // Minimized windows report zero; keep the old swapchain.
        if extent.is_empty() || ctx.extent() == extent {
            return;
        }

        if let Err(e) = ctx.device.wait_idle() {
            log::error!("Failed to wait for GPU before resize: {}", e);
        }
        if let Err(e) = ctx.resize_surface(extent.width, extent.height) {
            log::error!("Failed to reconfigure surface: {}", e);
            return;
        }
        if let Err(e) = self.handler.on_resize(ctx) {
            log::error!("Resize failed: {}", e);
            self.running = false;
        }
    }

    fn render_frame(&mut self) {
        let (delta_time, elapsed_time) = self.clock.tick();
        let Some(ctx) = &mut self.context else {
            return;
        };
        ctx.delta_time = delta_time;
        ctx.elapsed_time = elapsed_time;

        if !self.handler.on_update(ctx) {
            self.running = false;
            return;
        }

        let swapchain_texture = match ctx.surface.acquire_texture() {
            Ok(texture) => texture,
            Err(e) if e.is_surface_error() => {
                log::warn!("Skipping frame {}: {}", ctx.frame_number, e);
                return;
            }
            Err(e) => {
                log::error!("Failed to acquire swapchain texture: {}", e);
                self.running = false;
                return;
            }
        };

        let draw = DrawContext {
            app: &mut *ctx,
            swapchain_texture,
        };
        if let Err(e) = self.handler.on_draw(draw) {
            log::error!("Frame {} failed: {}", ctx.frame_number, e);
            self.running = false;
            return;
        }

        ctx.frame_number += 1;
        if let Some(max_frames) = self.args.max_frames()
            && ctx.frame_number >= max_frames
        {
            log::info!("Reached {} frames, exiting", max_frames);
            self.running = false;
        }
    }

    /// Let the handler tear down, then drain the GPU. Runs once.
    fn shutdown(&mut self) {
        if let Some(mut ctx) = self.context.take() {
            self.handler.on_shutdown(&mut ctx);
            if let Err(e) = ctx.device.wait_idle() {
                log::error!("Failed to wait for GPU on shutdown: {}", e);
            }
        }
    }

    fn exit(&mut self, event_loop: &ActiveEventLoop) {
        self.running = false;
        self.shutdown();
        event_loop.exit();
    }
}

impl<H, A> ApplicationHandler for App<H, A>
where
    H: AppHandler + 'static,
    A: AppArgs + 'static,
{
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }

        let attributes = Window::default_attributes()
            .with_title(self.args.window_title())
            .with_inner_size(winit::dpi::PhysicalSize::new(
                self.args.window_width(),
                self.args.window_height(),
            ));
        let window = match event_loop.create_window(attributes) {
            Ok(window) => Arc::new(window),
            Err(e) => {
                log::error!("Failed to create window: {}", e);
                event_loop.exit();
                return;
            }
        };
        self.window = Some(Arc::clone(&window));

        let mut ctx = match self.init_graphics(window) {
            Ok(ctx) => ctx,
            Err(e) => {
                log::error!("Failed to initialize graphics: {}", e);
                event_loop.exit();
                return;
            }
        };
        if let Err(e) = self.handler.on_init(&mut ctx) {
            log::error!("Initialization failed: {}", e);
            event_loop.exit();
            return;
        }
        self.context = Some(ctx);
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        match event {
            WindowEvent::CloseRequested => {
                log::info!("Close requested");
                self.exit(event_loop);
            }
            WindowEvent::Resized(size) => {
                self.apply_resize(Extent2d::new(size.width, size.height));
            }
            WindowEvent::ScaleFactorChanged { scale_factor, .. } => {
                if let Some(ctx) = &mut self.context {
                    ctx.scale_factor = scale_factor;
                }
            }
            WindowEvent::RedrawRequested => {
                if self.running {
                    self.render_frame();
                }
                if !self.running {
                    self.exit(event_loop);
                } else if let Some(window) = &self.window {
                    window.request_redraw();
                }
            }
            WindowEvent::KeyboardInput { event, .. } => {
                if let Some(ctx) = &mut self.context {
                    self.handler.on_key(ctx, &event);
                }
            }
            _ => {}
        }
    }

    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(window) = &self.window {
            window.request_redraw();
        }
    }

    fn exiting(&mut self, _event_loop: &ActiveEventLoop) {
        self.shutdown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frame_clock_monotonic() {
        let mut clock = FrameClock::new();
        let (first_delta, first_elapsed) = clock.tick();
        let (second_delta, second_elapsed) = clock.tick();
        assert!(first_delta >= 0.0 && second_delta >= 0.0);
        assert!(second_elapsed >= first_elapsed);
    }
}
