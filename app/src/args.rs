//! Command line arguments trait and default implementation.
//!
//! Uses clap for CLI parsing with:
//! - Help text (`--help`)
//! - Validation and clear error messages
//! - [`CommonArgs`] that applications flatten into their own parsers

use clap::Parser;
use penumbra_graphics::BackendType;

/// Trait for parsing command line arguments.
///
/// Implement this trait to customize how your application handles
/// command line arguments. The trait provides defaults for all methods,
/// making it easy to override only the options you need.
///
/// # Example
///
/// ```ignore
/// use clap::Parser;
/// use penumbra_app::{AppArgs, CommonArgs};
///
/// #[derive(Parser)]
/// struct MyArgs {
///     #[command(flatten)]
///     common: CommonArgs,
///     #[arg(long)]
///     scene: String,
/// }
///
/// impl AppArgs for MyArgs {
///     fn parse() -> Self {
///         <Self as Parser>::parse()
///     }
///
///     fn common(&self) -> Option<&CommonArgs> {
///         Some(&self.common)
///     }
/// }
/// ```
pub trait AppArgs: Sized {
    /// Parse command line arguments.
    fn parse() -> Self;

    /// Framework flags, if the application parses them.
    ///
    /// Every other getter falls back to these before its hard default.
    fn common(&self) -> Option<&CommonArgs> {
        None
    }

    /// Get the graphics backend to use.
    ///
    /// Default: `BackendType::Auto` (wgpu, falling back to dummy)
    fn backend(&self) -> BackendType {
        self.common()
            .map_or(BackendType::Auto, |c| c.backend.into())
    }

    /// Get the initial window width.
    ///
    /// Default: 1280
    fn window_width(&self) -> u32 {
        self.common().map_or(1280, |c| c.width)
    }

    /// Get the initial window height.
    ///
    /// Default: 720
    fn window_height(&self) -> u32 {
        self.common().map_or(720, |c| c.height)
    }

    /// Get the window title.
    fn window_title(&self) -> &str {
        "Penumbra"
    }

    /// Get whether VSync is enabled at startup.
    ///
    /// Default: true
    fn vsync(&self) -> bool {
        self.common().is_none_or(|c| !c.no_vsync)
    }

    /// Get the maximum number of frames to process before auto-exit.
    ///
    /// Default: `None` (run indefinitely)
    fn max_frames(&self) -> Option<u64> {
        self.common().and_then(|c| c.max_frames)
    }

    /// Get whether validation layers should be enabled.
    ///
    /// Default: `cfg!(debug_assertions)` (enabled in debug builds)
    fn validation(&self) -> bool {
        self.common()
            .map_or(cfg!(debug_assertions), CommonArgs::validation)
    }
}

// ============================================================================
// CLI Backend Selection
// ============================================================================

/// Graphics backend selection for CLI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum CliBackend {
    /// wgpu if an adapter is found, otherwise dummy.
    #[default]
    Auto,
    /// Cross-platform backend via wgpu.
    Wgpu,
    /// No-op backend for testing and CI environments.
    Dummy,
}

impl From<CliBackend> for BackendType {
    fn from(cli: CliBackend) -> Self {
        match cli {
            CliBackend::Auto => BackendType::Auto,
            CliBackend::Wgpu => BackendType::Wgpu,
            CliBackend::Dummy => BackendType::Dummy,
        }
    }
}

// ============================================================================
// Common flags
// ============================================================================

/// Flags every Penumbra application accepts.
///
/// ```bash
/// # Run headless for 10 frames
/// ./app --backend dummy --max-frames 10
///
/// # Small window without vsync
/// ./app --width 640 --height 480 --no-vsync
/// ```
#[derive(clap::Args, Debug, Clone, PartialEq, Eq)]
pub struct CommonArgs {
    /// Graphics backend to use.
    #[arg(long, default_value = "auto", value_enum)]
    pub backend: CliBackend,

    /// Initial window width in pixels.
    #[arg(long, default_value = "1280")]
    pub width: u32,

    /// Initial window height in pixels.
    #[arg(long, default_value = "720")]
    pub height: u32,

    /// Disable vertical sync (may cause tearing).
    #[arg(long)]
    pub no_vsync: bool,

    /// Exit after rendering N frames (useful for testing).
    #[arg(long)]
    pub max_frames: Option<u64>,

    /// Enable GPU validation layers (slower but helps catch bugs).
    #[arg(long, conflicts_with = "no_validation")]
    pub validation: bool,

    /// Disable GPU validation layers.
    #[arg(long, conflicts_with = "validation")]
    pub no_validation: bool,
}

impl CommonArgs {
    /// `--validation` forces on, `--no-validation` forces off, otherwise the
    /// debug-build default.
    pub fn validation(&self) -> bool {
        self.validation || (!self.no_validation && cfg!(debug_assertions))
    }
}

// ============================================================================
// Default App Args
// ============================================================================

/// Penumbra application arguments.
#[derive(Parser, Debug, Clone)]
#[command(
    name = "penumbra",
    about = "Penumbra application",
    long_about = "A soft-shadow renderer.\n\n\
        EXAMPLES:\n\
          # Use wgpu (recommended)\n\
          ./app --backend wgpu\n\
        \n\
          # Run headless test\n\
          ./app --backend dummy --max-frames 10",
    version
)]
pub struct DefaultAppArgs {
    #[command(flatten)]
    common: CommonArgs,
}

impl Default for DefaultAppArgs {
    fn default() -> Self {
        Self {
            common: CommonArgs {
                backend: CliBackend::Auto,
                width: 1280,
                height: 720,
                no_vsync: false,
                max_frames: None,
                validation: false,
                no_validation: false,
            },
        }
    }
}

impl DefaultAppArgs {
    /// Set the window size.
    pub fn with_size(mut self, width: u32, height: u32) -> Self {
        self.common.width = width;
        self.common.height = height;
        self
    }

    /// Set the graphics backend.
    pub fn with_backend(mut self, backend: CliBackend) -> Self {
        self.common.backend = backend;
        self
    }

    /// Set the maximum number of frames.
    pub fn with_max_frames(mut self, max_frames: u64) -> Self {
        self.common.max_frames = Some(max_frames);
        self
    }
}

impl AppArgs for DefaultAppArgs {
    fn parse() -> Self {
        <Self as Parser>::parse()
    }

    fn common(&self) -> Option<&CommonArgs> {
        Some(&self.common)
    }
}
