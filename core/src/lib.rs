//! # Penumbra Core
//!
//! GPU-agnostic building blocks shared by the renderer and the demos:
//!
//! - [`math`] - glam re-exports plus the few projection helpers the shadow
//!   pipeline needs (spherical light placement, horizontal-FOV perspective)
//! - [`mesh`] - CPU-side vertex layouts, meshes and procedural generators

pub mod math;
pub mod mesh;

/// Core library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Log the core version. Called once by the app framework at startup.
pub fn init() {
    log::info!("Penumbra Core v{} initialized", VERSION);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }
}
