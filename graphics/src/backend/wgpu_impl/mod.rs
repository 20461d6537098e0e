//! wgpu GPU backend implementation.
//!
//! This backend uses wgpu for cross-platform GPU access, supporting
//! Vulkan, Metal, DX12, and WebGPU.
//!
//! wgpu inserts resource transitions itself, so the barriers a compiled graph
//! carries are only traced here. Fences are backed by submission indices.

pub(crate) mod conversion;
mod pass_encoding;
mod resources;
pub mod swapchain;

use std::sync::Arc;
use std::sync::atomic::Ordering;

use crate::error::GraphicsError;
use crate::graph::{CompiledGraph, RenderGraph};
use crate::instance::InstanceParameters;

use super::{DeviceCapabilities, GpuFence};

/// A texture view for a surface texture (swapchain image).
///
/// This wraps the wgpu::TextureView from the surface texture for use in render passes.
#[derive(Clone)]
pub struct SurfaceTextureView {
    pub(crate) view: Arc<wgpu::TextureView>,
}

impl std::fmt::Debug for SurfaceTextureView {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SurfaceTextureView").finish()
    }
}

impl SurfaceTextureView {
    /// Get the underlying wgpu texture view.
    pub fn view(&self) -> &wgpu::TextureView {
        &self.view
    }
}

/// wgpu-based GPU backend.
pub struct WgpuBackend {
    instance: wgpu::Instance,
    adapter: wgpu::Adapter,
    device: Arc<wgpu::Device>,
    queue: Arc<wgpu::Queue>,
    capabilities: DeviceCapabilities,
}

impl std::fmt::Debug for WgpuBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WgpuBackend")
            .field("adapter", &self.adapter.get_info().name)
            .field("capabilities", &self.capabilities)
            .finish()
    }
}

/// Whether the adapter can bind `format` as a write-only storage texture.
fn adapter_supports_storage(
    adapter: &wgpu::Adapter,
    features: wgpu::Features,
    format: wgpu::TextureFormat,
) -> bool {
    if features.contains(wgpu::Features::TEXTURE_ADAPTER_SPECIFIC_FORMAT_FEATURES) {
        adapter
            .get_texture_format_features(format)
            .allowed_usages
            .contains(wgpu::TextureUsages::STORAGE_BINDING)
    } else {
        format
            .guaranteed_format_features(features)
            .allowed_usages
            .contains(wgpu::TextureUsages::STORAGE_BINDING)
    }
}

impl WgpuBackend {
    /// Create a new wgpu backend with default parameters.
    pub fn new() -> Result<Self, GraphicsError> {
        Self::with_params(&InstanceParameters::default())
    }

    /// Create a new wgpu backend with custom parameters.
    ///
    /// 16-bit normalized formats and adapter-specific format features are
    /// requested when the adapter offers them; the moment shadow technique
    /// needs both to write `Rgba16Unorm` from a compute shader.
    pub fn with_params(params: &InstanceParameters) -> Result<Self, GraphicsError> {
        let backends = wgpu::Backends::from_env().unwrap_or(wgpu::Backends::PRIMARY);

        let mut flags = wgpu::InstanceFlags::default();
        if params.validation {
            flags |= wgpu::InstanceFlags::VALIDATION;
            flags |= wgpu::InstanceFlags::DEBUG;
        }

        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends,
            flags,
            backend_options: wgpu::BackendOptions::default(),
            memory_budget_thresholds: wgpu::MemoryBudgetThresholds::default(),
        });

        let adapter = pollster::block_on(instance.request_adapter(&wgpu::RequestAdapterOptions {
            power_preference: wgpu::PowerPreference::HighPerformance,
            compatible_surface: None,
            force_fallback_adapter: false,
        }))
        .map_err(|e| {
            GraphicsError::InitializationFailed(format!("No compatible GPU adapter: {e}"))
        })?;

        log::info!("wgpu adapter: {:?}", adapter.get_info());

        let mut required_features = wgpu::Features::empty();
        for feature in [
            wgpu::Features::TEXTURE_FORMAT_16BIT_NORM,
            wgpu::Features::TEXTURE_ADAPTER_SPECIFIC_FORMAT_FEATURES,
        ] {
            if adapter.features().contains(feature) {
                required_features |= feature;
            } else {
                log::warn!("Adapter lacks {feature:?}; moment shadow maps may be unavailable");
            }
        }

        let (device, queue) = pollster::block_on(adapter.request_device(&wgpu::DeviceDescriptor {
            label: Some("Penumbra Device"),
            required_features,
            required_limits: wgpu::Limits::default(),
            memory_hints: wgpu::MemoryHints::default(),
            experimental_features: wgpu::ExperimentalFeatures::default(),
            trace: wgpu::Trace::Off,
        }))
        .map_err(|e| {
            GraphicsError::InitializationFailed(format!("Device creation failed: {e}"))
        })?;

        let limits = device.limits();
        let capabilities = DeviceCapabilities {
            storage_rgba16unorm: required_features
                .contains(wgpu::Features::TEXTURE_FORMAT_16BIT_NORM)
                && adapter_supports_storage(
                    &adapter,
                    required_features,
                    wgpu::TextureFormat::Rgba16Unorm,
                ),
            storage_rg32float: adapter_supports_storage(
                &adapter,
                required_features,
                wgpu::TextureFormat::Rg32Float,
            ),
            max_texture_dimension_2d: limits.max_texture_dimension_2d,
            min_uniform_buffer_offset_alignment: limits.min_uniform_buffer_offset_alignment,
        };
        log::info!("wgpu capabilities: {capabilities:?}");

        Ok(Self {
            instance,
            adapter,
            device: Arc::new(device),
            queue: Arc::new(queue),
            capabilities,
        })
    }

    /// Get the wgpu instance.
    pub fn instance(&self) -> &wgpu::Instance {
        &self.instance
    }

    /// Get the wgpu adapter.
    pub fn adapter(&self) -> &wgpu::Adapter {
        &self.adapter
    }

    /// Get the wgpu device.
    pub fn device(&self) -> &Arc<wgpu::Device> {
        &self.device
    }

    /// Get the wgpu queue.
    pub fn queue(&self) -> &Arc<wgpu::Queue> {
        &self.queue
    }

    /// Get the backend name.
    pub fn name(&self) -> &'static str {
        "wgpu Backend"
    }

    pub fn capabilities(&self) -> DeviceCapabilities {
        self.capabilities
    }

    /// Encode and submit a compiled render graph.
    ///
    /// Returns as soon as the work is queued. `signal_fence` receives the
    /// submission index and is flagged complete from the queue callback.
    pub fn execute_graph(
        &self,
        graph: &RenderGraph,
        compiled: &CompiledGraph,
        signal_fence: &Arc<GpuFence>,
    ) -> Result<(), GraphicsError> {
        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("RenderGraph Encoder"),
            });

        for (handle, barriers) in compiled.steps() {
            let pass = graph.pass(handle)?;
            for barrier in barriers.iter() {
                log::trace!(
                    "{}: {} {:?} -> {:?}",
                    pass.name(),
                    barrier.label,
                    barrier.from,
                    barrier.to
                );
            }
            self.encode_pass(&mut encoder, pass)?;
        }

        let submission_index = self.queue.submit(std::iter::once(encoder.finish()));

        if let GpuFence::Wgpu {
            completed,
            submission_index: fence_index,
            ..
        } = signal_fence.as_ref()
        {
            *fence_index.lock() = Some(submission_index);
            let completed = Arc::clone(completed);
            self.queue.on_submitted_work_done(move || {
                completed.store(true, Ordering::Release);
            });
        }

        Ok(())
    }

    /// Block until the queue is empty.
    pub fn wait_idle(&self) -> Result<(), GraphicsError> {
        self.device
            .poll(wgpu::PollType::wait_indefinitely())
            .map(|_| ())
            .map_err(|e| {
                log::error!("Device poll failed: {e}");
                GraphicsError::DeviceLost
            })
    }
}
