//! Application handler trait.

use penumbra_graphics::GraphicsError;
use winit::event::KeyEvent;

use crate::context::{AppContext, DrawContext};

/// Trait for handling application events and draw requests.
///
/// # Lifecycle
///
/// 1. `on_init` - Called once when the application starts
/// 2. `on_resize` - Called after the surface was reconfigured to a new size
/// 3. `on_update` - Called every frame before drawing
/// 4. `on_draw` - Called every frame to render
/// 5. `on_shutdown` - Called when the application is closing
///
/// # Example
///
/// ```ignore
/// use penumbra_app::{AppContext, AppHandler, DrawContext};
///
/// struct MyApp;
///
/// impl AppHandler for MyApp {
///     fn on_draw(&mut self, ctx: DrawContext) -> Result<(), GraphicsError> {
///         // Record and submit into ctx.output()
///         ctx.present();
///         Ok(())
///     }
/// }
/// ```
pub trait AppHandler {
    /// Called once when the application initializes.
    ///
    /// Returning an error aborts startup.
    fn on_init(&mut self, _ctx: &mut AppContext) -> Result<(), GraphicsError> {
        Ok(())
    }

    /// Called when the window is resized.
    ///
    /// The GPU is idle and `ctx.extent()` already holds the new size.
    fn on_resize(&mut self, _ctx: &mut AppContext) -> Result<(), GraphicsError> {
        Ok(())
    }

    /// Called every frame before drawing.
    ///
    /// Returns `true` to continue running, `false` to exit.
    fn on_update(&mut self, _ctx: &mut AppContext) -> bool {
        true
    }

    /// Called every frame to render.
    ///
    /// The handler presents the frame with [`DrawContext::present`]. An error
    /// stops the application.
    fn on_draw(&mut self, ctx: DrawContext) -> Result<(), GraphicsError>;

    /// Called when a key is pressed or released.
    fn on_key(&mut self, _ctx: &mut AppContext, _event: &KeyEvent) {}

    /// Called when the application is closing, before the window is dropped.
    fn on_shutdown(&mut self, _ctx: &mut AppContext) {}
}
