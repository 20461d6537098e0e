//! Error type of the graphics crate.
//!
//! Setup failures come back as `Err` and abort startup. Per-frame errors are
//! either surface trouble, which a host may skip a frame for, or fatal.

use std::fmt;

use crate::graph::GraphError;

/// Errors that can occur in the graphics system.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GraphicsError {
    /// Failed to initialize the graphics system.
    InitializationFailed(String),
    /// Failed to create a resource.
    ResourceCreationFailed(String),
    /// A shader failed to parse, validate or compile.
    ShaderCompilationFailed(String),
    /// A requested feature is not supported.
    FeatureNotSupported(String),
    /// Out of GPU memory.
    OutOfMemory,
    /// The GPU device was lost.
    DeviceLost,
    /// An invalid parameter was provided.
    InvalidParameter(String),
    /// A render graph failed to compile.
    InvalidGraph(GraphError),
    /// An internal error occurred.
    Internal(String),
    /// The surface is outdated and needs to be reconfigured.
    SurfaceOutdated,
    /// The surface was lost and needs to be recreated.
    SurfaceLost,
}

impl fmt::Display for GraphicsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InitializationFailed(msg) => write!(f, "initialization failed: {msg}"),
            Self::ResourceCreationFailed(msg) => write!(f, "resource creation failed: {msg}"),
            Self::ShaderCompilationFailed(msg) => write!(f, "shader compilation failed: {msg}"),
            Self::FeatureNotSupported(msg) => write!(f, "feature not supported: {msg}"),
            Self::OutOfMemory => write!(f, "out of GPU memory"),
            Self::DeviceLost => write!(f, "GPU device lost"),
            Self::InvalidParameter(msg) => write!(f, "invalid parameter: {msg}"),
            Self::InvalidGraph(err) => write!(f, "invalid render graph: {err}"),
            Self::Internal(msg) => write!(f, "internal error: {msg}"),
            Self::SurfaceOutdated => write!(f, "surface outdated, needs reconfiguration"),
            Self::SurfaceLost => write!(f, "surface lost, needs recreation"),
        }
    }
}

impl GraphicsError {
    /// The swapchain image could not be used this frame.
    ///
    /// The device is fine; the host decides whether to skip or reconfigure.
    pub fn is_surface_error(&self) -> bool {
        matches!(self, Self::SurfaceOutdated | Self::SurfaceLost)
    }
}

impl std::error::Error for GraphicsError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::InvalidGraph(err) => Some(err),
            _ => None,
        }
    }
}

impl From<GraphError> for GraphicsError {
    fn from(err: GraphError) -> Self {
        Self::InvalidGraph(err)
    }
}
