//! GPU backend abstraction layer.
//!
//! Backends are selected once per [`GraphicsInstance`](crate::GraphicsInstance)
//! and dispatched by matching on [`GpuBackend`]. Every GPU object is held
//! through one of the `Gpu*` handle enums below, with one variant per backend.
//!
//! # Available Backends
//!
//! - `Dummy` (always available): No GPU work. Records an event log when asked
//!   to, and can hold fences pending until a test completes them.
//! - `Wgpu` (feature `wgpu-backend`): Cross-platform backend using wgpu.

pub mod dummy;

#[cfg(feature = "wgpu-backend")]
pub mod wgpu_impl;

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

pub use dummy::{DummyBackend, DummyEvent, PassKind, ResourceKind, SlotBinding};

use crate::error::GraphicsError;
use crate::graph::{CompiledGraph, RenderGraph};
use crate::materials::MaterialDescriptor;
use crate::sync::Semaphore;
use crate::types::{BufferDescriptor, SamplerDescriptor, TextureDescriptor, TextureFormat};

/// What the selected adapter can do beyond the WebGPU baseline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DeviceCapabilities {
    /// `Rgba16Unorm` can be rendered to and written as a storage texture.
    pub storage_rgba16unorm: bool,
    /// `Rg32Float` can be written as a storage texture.
    pub storage_rg32float: bool,
    /// Largest 2D texture edge.
    pub max_texture_dimension_2d: u32,
    /// Required alignment of uniform buffer binding offsets.
    pub min_uniform_buffer_offset_alignment: u32,
}

impl DeviceCapabilities {
    /// Whether `format` can be bound as a write-only storage texture.
    pub fn supports_storage(&self, format: TextureFormat) -> bool {
        match format {
            TextureFormat::Rgba16Unorm => self.storage_rgba16unorm,
            TextureFormat::Rg32Float => self.storage_rg32float,
            other => other.wgsl_storage_name().is_some(),
        }
    }
}

impl Default for DeviceCapabilities {
    fn default() -> Self {
        Self {
            storage_rgba16unorm: true,
            storage_rg32float: true,
            max_texture_dimension_2d: 8192,
            min_uniform_buffer_offset_alignment: 256,
        }
    }
}

/// The backend an instance dispatches to.
pub enum GpuBackend {
    /// No-op backend for tests and headless runs.
    Dummy(DummyBackend),
    /// wgpu backend.
    #[cfg(feature = "wgpu-backend")]
    Wgpu(wgpu_impl::WgpuBackend),
}

impl std::fmt::Debug for GpuBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Dummy(b) => f.debug_tuple("GpuBackend::Dummy").field(b).finish(),
            #[cfg(feature = "wgpu-backend")]
            Self::Wgpu(b) => f.debug_tuple("GpuBackend::Wgpu").field(b).finish(),
        }
    }
}

impl GpuBackend {
    /// Get the backend name.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Dummy(b) => b.name(),
            #[cfg(feature = "wgpu-backend")]
            Self::Wgpu(b) => b.name(),
        }
    }

    pub fn capabilities(&self) -> DeviceCapabilities {
        match self {
            Self::Dummy(b) => b.capabilities(),
            #[cfg(feature = "wgpu-backend")]
            Self::Wgpu(b) => b.capabilities(),
        }
    }

    pub(crate) fn create_buffer(
        &self,
        descriptor: &BufferDescriptor,
    ) -> Result<GpuBuffer, GraphicsError> {
        match self {
            Self::Dummy(b) => b.create_buffer(descriptor),
            #[cfg(feature = "wgpu-backend")]
            Self::Wgpu(b) => b.create_buffer(descriptor),
        }
    }

    pub(crate) fn create_texture(
        &self,
        descriptor: &TextureDescriptor,
    ) -> Result<GpuTexture, GraphicsError> {
        match self {
            Self::Dummy(b) => b.create_texture(descriptor),
            #[cfg(feature = "wgpu-backend")]
            Self::Wgpu(b) => b.create_texture(descriptor),
        }
    }

    pub(crate) fn create_sampler(
        &self,
        descriptor: &SamplerDescriptor,
    ) -> Result<GpuSampler, GraphicsError> {
        match self {
            Self::Dummy(b) => b.create_sampler(descriptor),
            #[cfg(feature = "wgpu-backend")]
            Self::Wgpu(b) => b.create_sampler(descriptor),
        }
    }

    pub(crate) fn create_pipeline(
        &self,
        descriptor: &MaterialDescriptor,
    ) -> Result<GpuPipeline, GraphicsError> {
        match self {
            Self::Dummy(b) => b.create_pipeline(descriptor),
            #[cfg(feature = "wgpu-backend")]
            Self::Wgpu(b) => b.create_pipeline(descriptor),
        }
    }

    pub(crate) fn create_fence(&self, signaled: bool) -> GpuFence {
        match self {
            Self::Dummy(b) => b.create_fence(signaled),
            #[cfg(feature = "wgpu-backend")]
            Self::Wgpu(b) => b.create_fence(signaled),
        }
    }

    pub(crate) fn create_semaphore(&self) -> GpuSemaphore {
        match self {
            Self::Dummy(_) => GpuSemaphore::Dummy,
            #[cfg(feature = "wgpu-backend")]
            Self::Wgpu(_) => GpuSemaphore::Wgpu,
        }
    }

    pub(crate) fn write_buffer(
        &self,
        buffer: &GpuBuffer,
        label: Option<&str>,
        offset: u64,
        data: &[u8],
    ) -> Result<(), GraphicsError> {
        match self {
            Self::Dummy(b) => b.write_buffer(label, offset, data),
            #[cfg(feature = "wgpu-backend")]
            Self::Wgpu(b) => b.write_buffer(buffer, offset, data),
        }
    }

    /// Record that a descriptor table slot was rewritten.
    pub(crate) fn note_descriptor_write(&self, table: Option<&str>, slot: u32) {
        if let Self::Dummy(b) = self {
            b.note_descriptor_write(table, slot);
        }
    }

    /// Record creation of a CPU-side object (descriptor table, mesh).
    pub(crate) fn note_created(&self, kind: ResourceKind, label: Option<&str>) {
        if let Self::Dummy(b) = self {
            b.note_created(kind, label);
        }
    }

    /// Explicitly release a resource ahead of its last reference being dropped.
    ///
    /// Buffers and textures have their GPU memory freed immediately; other
    /// kinds are only logged.
    pub(crate) fn release(&self, kind: ResourceKind, label: Option<&str>, handle: ReleaseHandle<'_>) {
        log::trace!("Releasing {kind:?} {label:?}");
        match self {
            Self::Dummy(b) => b.note_released(kind, label),
            #[cfg(feature = "wgpu-backend")]
            Self::Wgpu(b) => b.release(handle),
        }
        #[cfg(not(feature = "wgpu-backend"))]
        let _ = handle;
    }

    pub(crate) fn execute_graph(
        &self,
        graph: &RenderGraph,
        compiled: &CompiledGraph,
        signal_fence: &Arc<GpuFence>,
        signal_semaphore: &Semaphore,
    ) -> Result<(), GraphicsError> {
        match self {
            Self::Dummy(b) => b.execute_graph(graph, compiled, signal_fence, signal_semaphore),
            #[cfg(feature = "wgpu-backend")]
            Self::Wgpu(b) => b.execute_graph(graph, compiled, signal_fence),
        }
    }

    /// Block until every submission has finished on the GPU.
    pub(crate) fn wait_idle(&self) -> Result<(), GraphicsError> {
        match self {
            Self::Dummy(b) => b.wait_idle(),
            #[cfg(feature = "wgpu-backend")]
            Self::Wgpu(b) => b.wait_idle(),
        }
    }
}

/// Backend handle passed to [`GpuBackend::release`].
#[derive(Debug, Clone, Copy)]
pub(crate) enum ReleaseHandle<'a> {
    Buffer(&'a GpuBuffer),
    Texture(&'a GpuTexture),
    None,
}

/// Handle to a GPU buffer resource.
pub enum GpuBuffer {
    /// Dummy backend (no GPU allocation)
    Dummy,
    /// wgpu backend buffer
    #[cfg(feature = "wgpu-backend")]
    Wgpu(Arc<wgpu::Buffer>),
}

impl std::fmt::Debug for GpuBuffer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Dummy => write!(f, "GpuBuffer::Dummy"),
            #[cfg(feature = "wgpu-backend")]
            Self::Wgpu(buffer) => f.debug_tuple("GpuBuffer::Wgpu").field(buffer).finish(),
        }
    }
}

/// Handle to a GPU texture resource.
pub enum GpuTexture {
    /// Dummy backend (no GPU allocation)
    Dummy,
    /// wgpu backend texture
    #[cfg(feature = "wgpu-backend")]
    Wgpu {
        texture: Arc<wgpu::Texture>,
        view: Arc<wgpu::TextureView>,
    },
}

impl std::fmt::Debug for GpuTexture {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Dummy => write!(f, "GpuTexture::Dummy"),
            #[cfg(feature = "wgpu-backend")]
            Self::Wgpu { texture, view } => f
                .debug_struct("GpuTexture::Wgpu")
                .field("texture", texture)
                .field("view", view)
                .finish(),
        }
    }
}

/// Handle to a GPU sampler resource.
pub enum GpuSampler {
    /// Dummy backend (no GPU allocation)
    Dummy,
    /// wgpu backend sampler
    #[cfg(feature = "wgpu-backend")]
    Wgpu(Arc<wgpu::Sampler>),
}

impl std::fmt::Debug for GpuSampler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Dummy => write!(f, "GpuSampler::Dummy"),
            #[cfg(feature = "wgpu-backend")]
            Self::Wgpu(sampler) => f.debug_tuple("GpuSampler::Wgpu").field(sampler).finish(),
        }
    }
}

/// Compiled pipeline state owned by a [`Material`](crate::materials::Material).
pub enum GpuPipeline {
    /// Dummy backend (nothing compiled)
    Dummy,
    /// wgpu render pipeline and the bind group layouts it was built with
    #[cfg(feature = "wgpu-backend")]
    WgpuGraphics {
        pipeline: wgpu::RenderPipeline,
        bind_group_layouts: Vec<wgpu::BindGroupLayout>,
    },
    /// wgpu compute pipeline and the bind group layouts it was built with
    #[cfg(feature = "wgpu-backend")]
    WgpuCompute {
        pipeline: wgpu::ComputePipeline,
        bind_group_layouts: Vec<wgpu::BindGroupLayout>,
    },
}

impl std::fmt::Debug for GpuPipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Dummy => write!(f, "GpuPipeline::Dummy"),
            #[cfg(feature = "wgpu-backend")]
            Self::WgpuGraphics { pipeline, .. } => f
                .debug_struct("GpuPipeline::WgpuGraphics")
                .field("pipeline", pipeline)
                .finish_non_exhaustive(),
            #[cfg(feature = "wgpu-backend")]
            Self::WgpuCompute { pipeline, .. } => f
                .debug_struct("GpuPipeline::WgpuCompute")
                .field("pipeline", pipeline)
                .finish_non_exhaustive(),
        }
    }
}

/// Handle to a GPU fence for CPU-GPU synchronization.
pub enum GpuFence {
    /// Dummy backend fence, signaled by the backend itself. `lost` is set
    /// when the dummy device is lost before the fence signals.
    Dummy {
        signaled: AtomicBool,
        lost: AtomicBool,
    },
    /// wgpu fence: a submission index plus a flag set by
    /// `Queue::on_submitted_work_done`.
    #[cfg(feature = "wgpu-backend")]
    Wgpu {
        device: Arc<wgpu::Device>,
        completed: Arc<AtomicBool>,
        submission_index: parking_lot::Mutex<Option<wgpu::SubmissionIndex>>,
    },
}

impl GpuFence {
    pub(crate) fn dummy(signaled: bool) -> Self {
        Self::Dummy {
            signaled: AtomicBool::new(signaled),
            lost: AtomicBool::new(false),
        }
    }

    /// Check if the fence is signaled (non-blocking).
    ///
    /// A fence on a lost device never reports signaled.
    pub fn is_signaled(&self) -> bool {
        match self {
            Self::Dummy { signaled, .. } => signaled.load(Ordering::Acquire),
            #[cfg(feature = "wgpu-backend")]
            Self::Wgpu {
                device, completed, ..
            } => {
                if completed.load(Ordering::Acquire) {
                    return true;
                }
                if let Err(e) = device.poll(wgpu::PollType::Poll) {
                    log::error!("Device poll failed: {e}");
                }
                completed.load(Ordering::Acquire)
            }
        }
    }

    /// Block until the fence is signaled.
    ///
    /// # Errors
    ///
    /// [`GraphicsError::DeviceLost`] if the device is lost first.
    pub fn wait(&self) -> Result<(), GraphicsError> {
        match self {
            Self::Dummy { signaled, lost } => {
                while !signaled.load(Ordering::Acquire) {
                    if lost.load(Ordering::Acquire) {
                        return Err(GraphicsError::DeviceLost);
                    }
                    std::thread::yield_now();
                }
                Ok(())
            }
            #[cfg(feature = "wgpu-backend")]
            Self::Wgpu {
                device,
                completed,
                submission_index,
            } => {
                if completed.load(Ordering::Acquire) {
                    return Ok(());
                }
                let index = submission_index.lock().clone();
                device
                    .poll(wgpu::PollType::Wait {
                        submission_index: index,
                        timeout: None,
                    })
                    .map_err(|e| {
                        log::error!("Fence wait failed: {e}");
                        GraphicsError::DeviceLost
                    })?;
                completed.store(true, Ordering::Release);
                Ok(())
            }
        }
    }

    /// Wait for the fence with a timeout.
    ///
    /// Returns `Ok(true)` if the fence was signaled, `Ok(false)` if the
    /// timeout elapsed.
    ///
    /// # Errors
    ///
    /// [`GraphicsError::DeviceLost`] if the device is lost first.
    pub fn wait_timeout(&self, timeout: Duration) -> Result<bool, GraphicsError> {
        match self {
            Self::Dummy { signaled, lost } => {
                let start = std::time::Instant::now();
                while !signaled.load(Ordering::Acquire) {
                    if lost.load(Ordering::Acquire) {
                        return Err(GraphicsError::DeviceLost);
                    }
                    if start.elapsed() >= timeout {
                        return Ok(false);
                    }
                    std::thread::yield_now();
                }
                Ok(true)
            }
            #[cfg(feature = "wgpu-backend")]
            Self::Wgpu {
                device,
                completed,
                submission_index,
            } => {
                if completed.load(Ordering::Acquire) {
                    return Ok(true);
                }
                let Some(index) = submission_index.lock().clone() else {
                    return Ok(false);
                };
                match device.poll(wgpu::PollType::Wait {
                    submission_index: Some(index),
                    timeout: Some(timeout),
                }) {
                    Ok(_) => {
                        completed.store(true, Ordering::Release);
                        Ok(true)
                    }
                    Err(wgpu::PollError::Timeout) => Ok(false),
                    Err(e) => {
                        log::error!("Fence wait failed: {e}");
                        Err(GraphicsError::DeviceLost)
                    }
                }
            }
        }
    }

    /// Signal a dummy fence. No effect on real GPU fences.
    pub(crate) fn signal(&self) {
        if let Self::Dummy { signaled, .. } = self {
            signaled.store(true, Ordering::Release);
        }
    }

    /// Mark a pending dummy fence as belonging to a lost device.
    pub(crate) fn mark_lost(&self) {
        if let Self::Dummy { lost, .. } = self {
            lost.store(true, Ordering::Release);
        }
    }
}

impl std::fmt::Debug for GpuFence {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Dummy { signaled, lost } => f
                .debug_struct("GpuFence::Dummy")
                .field("signaled", signaled)
                .field("lost", lost)
                .finish(),
            #[cfg(feature = "wgpu-backend")]
            Self::Wgpu {
                completed,
                submission_index,
                ..
            } => f
                .debug_struct("GpuFence::Wgpu")
                .field("completed", completed)
                .field("submission_index", submission_index)
                .finish_non_exhaustive(),
        }
    }
}

/// Handle to a GPU semaphore for GPU-GPU synchronization.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GpuSemaphore {
    /// Dummy backend (no GPU semaphore)
    Dummy,
    /// wgpu backend (queue ordering is implicit in wgpu)
    #[cfg(feature = "wgpu-backend")]
    Wgpu,
}

/// Create a backend for the requested type.
///
/// [`BackendType::Auto`](crate::BackendType::Auto) tries wgpu first and falls
/// back to the dummy backend.
pub fn create_backend(
    params: &crate::instance::InstanceParameters,
) -> Result<GpuBackend, GraphicsError> {
    use crate::instance::BackendType;

    match params.backend {
        BackendType::Dummy => {
            log::info!("Using dummy backend");
            Ok(GpuBackend::Dummy(DummyBackend::new()))
        }
        #[cfg(feature = "wgpu-backend")]
        BackendType::Wgpu => {
            let backend = wgpu_impl::WgpuBackend::with_params(params)?;
            log::info!("Using wgpu backend");
            Ok(GpuBackend::Wgpu(backend))
        }
        #[cfg(not(feature = "wgpu-backend"))]
        BackendType::Wgpu => Err(GraphicsError::FeatureNotSupported(
            "wgpu backend not compiled in".to_string(),
        )),
        BackendType::Auto => {
            #[cfg(feature = "wgpu-backend")]
            {
                match wgpu_impl::WgpuBackend::with_params(params) {
                    Ok(backend) => {
                        log::info!("Using wgpu backend");
                        return Ok(GpuBackend::Wgpu(backend));
                    }
                    Err(e) => {
                        log::warn!("Failed to create wgpu backend: {}", e);
                    }
                }
            }

            log::info!("Using dummy backend");
            Ok(GpuBackend::Dummy(DummyBackend::new()))
        }
    }
}

static_assertions::assert_impl_all!(GpuBackend: Send, Sync);
static_assertions::assert_impl_all!(GpuFence: Send, Sync);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dummy_fence_signal() {
        let fence = GpuFence::dummy(false);
        assert!(!fence.is_signaled());
        assert!(!fence.wait_timeout(Duration::from_millis(5)).unwrap());
        fence.signal();
        assert!(fence.is_signaled());
        fence.wait().unwrap();
    }

    #[test]
    fn test_lost_fence_fails_wait() {
        let fence = GpuFence::dummy(false);
        fence.mark_lost();
        assert!(!fence.is_signaled());
        assert!(matches!(fence.wait(), Err(GraphicsError::DeviceLost)));
        assert!(matches!(
            fence.wait_timeout(Duration::from_millis(5)),
            Err(GraphicsError::DeviceLost)
        ));
    }

    #[test]
    fn test_capabilities_storage() {
        let caps = DeviceCapabilities {
            storage_rgba16unorm: false,
            ..Default::default()
        };
        assert!(!caps.supports_storage(TextureFormat::Rgba16Unorm));
        assert!(caps.supports_storage(TextureFormat::Rg32Float));
        assert!(!caps.supports_storage(TextureFormat::Depth32Float));
    }
}
