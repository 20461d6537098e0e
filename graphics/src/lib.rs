//! # Penumbra Graphics
//!
//! Render graph, frame ring and a VSM/MSM soft-shadow pipeline.
//!
//! ## Overview
//!
//! This crate provides:
//! - [`GraphicsInstance`] / [`GraphicsDevice`] - Backend selection and GPU object creation
//! - [`RenderGraph`] - Declarative passes with automatic barrier placement
//! - [`FrameResourceRing`] - K frames in flight, fenced per slot
//! - [`shadows`] - Shadow map, ping-pong blur and shading passes
//! - Multiple backend support: wgpu and Dummy (for testing)
//!
//! ## Example
//!
//! ```ignore
//! use penumbra_graphics::{GraphicsInstance, RenderTarget};
//! use penumbra_graphics::shadows::{ShadowPipelineConfig, ShadowPipelineContext, ShadowSettings};
//!
//! let device = GraphicsInstance::new()?.create_device()?;
//! let mut shadows = ShadowPipelineContext::new(
//!     &device,
//!     ShadowPipelineConfig::default(),
//!     ShadowSettings::default(),
//! )?;
//! shadows.update(1.0 / 60.0);
//! shadows.render_frame(RenderTarget::from_texture(output))?;
//! shadows.shutdown()?;
//! ```

pub mod backend;
pub mod compiler;
pub mod device;
pub mod error;
pub mod graph;
pub mod instance;
pub mod materials;
pub mod mesh;
pub mod pipeline;
pub mod resources;
pub mod shader;
pub mod shadows;
pub mod swapchain;
pub mod sync;
pub mod types;

// Re-export main types for convenience
pub use backend::{DeviceCapabilities, DummyBackend, DummyEvent, GpuBackend};
pub use compiler::{CompiledGraph, GraphError};
pub use device::GraphicsDevice;
pub use error::GraphicsError;
pub use graph::{
    BoundTable, ColorAttachment, ComputePass, DepthAttachment, GraphicsPass, PassHandle,
    RenderGraph, RenderTarget, RenderTargetConfig, ResourceState, ResourceStateTracker,
};
pub use instance::{BackendType, GraphicsInstance, InstanceParameters};
pub use materials::{
    BindingGroup, BindingLayout, CullMode, DescriptorTable, Material, MaterialDescriptor,
    RasterState, ShaderSource, ShaderStageFlags,
};
pub use mesh::{CpuMesh, Mesh, VertexLayout};
pub use pipeline::{FrameResourceRing, UniformRows};
pub use resources::{Buffer, Sampler, Texture, TextureId};
pub use swapchain::{PresentMode, Surface, SurfaceConfiguration, SurfaceTexture};
pub use sync::{Fence, FenceStatus, Semaphore};
pub use types::{
    BufferDescriptor, BufferUsage, ClearValue, CompareFunction, Extent2d, SamplerDescriptor,
    TextureDescriptor, TextureFormat, TextureUsage,
};

/// Graphics library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Initialize the graphics subsystem.
///
/// This should be called before using any graphics functionality.
pub fn init() {
    log::info!("Penumbra Graphics v{} initialized", VERSION);
}
