//! # Penumbra App
//!
//! Application framework for windowed Penumbra applications.
//!
//! This crate provides a generic `App` struct that handles window creation,
//! the event loop, surface configuration and frame timing. Applications plug
//! in through [`AppHandler`].
//!
//! ## Overview
//!
//! - [`AppHandler`] - Trait for handling window events and draw requests
//! - [`AppArgs`] - Trait for parsing command line arguments
//! - [`CommonArgs`] - Framework flags, flattened into application parsers
//! - [`App`] - Main application struct that manages the window and graphics
//!
//! ## Example
//!
//! ```ignore
//! use penumbra_app::{App, AppArgs, AppHandler, DefaultAppArgs, DrawContext};
//! use penumbra_graphics::GraphicsError;
//!
//! struct MyApp;
//!
//! impl AppHandler for MyApp {
//!     fn on_draw(&mut self, ctx: DrawContext) -> Result<(), GraphicsError> {
//!         ctx.present();
//!         Ok(())
//!     }
//! }
//!
//! fn main() -> Result<(), winit::error::EventLoopError> {
//!     App::run(MyApp, DefaultAppArgs::parse())
//! }
//! ```

mod app;
mod args;
mod context;
mod handler;

pub use app::App;
pub use args::{AppArgs, CliBackend, CommonArgs, DefaultAppArgs};
pub use context::{AppContext, DrawContext};
pub use handler::AppHandler;

/// App library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Initialize the app subsystem.
pub fn init() {
    log::info!("Penumbra App v{} initialized", VERSION);
}
