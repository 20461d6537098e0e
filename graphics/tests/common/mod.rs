//! Common utilities for shadow pipeline integration tests.
//!
//! Every test drives a [`ShadowPipelineContext`] on a recording dummy backend
//! and asserts on the backend's event log.

#![allow(dead_code)]

use std::sync::Arc;

use penumbra_graphics::shadows::{ShadowPipelineConfig, ShadowPipelineContext, ShadowSettings};
use penumbra_graphics::{
    BackendType, DummyBackend, DummyEvent, GpuBackend, GraphicsDevice, GraphicsInstance,
    InstanceParameters, RenderTarget, ResourceState, TextureDescriptor, TextureFormat,
    TextureUsage,
};

/// Output size used by every test.
pub const OUTPUT_WIDTH: u32 = 640;
pub const OUTPUT_HEIGHT: u32 = 480;
pub const OUTPUT_FORMAT: TextureFormat = TextureFormat::Bgra8UnormSrgb;

// ============================================================================
// Backend Enumeration
// ============================================================================

/// Available GPU backends for testing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Backend {
    /// Dummy backend (no actual GPU operations).
    Dummy,
    /// WebGPU backend (via wgpu).
    WebGpu,
}

impl Backend {
    /// Check if this backend is compiled in.
    pub fn is_available(&self) -> bool {
        match self {
            Backend::Dummy => true,
            #[cfg(feature = "wgpu-backend")]
            Backend::WebGpu => true,
            #[cfg(not(feature = "wgpu-backend"))]
            Backend::WebGpu => false,
        }
    }

    pub fn to_instance_parameters(self) -> InstanceParameters {
        match self {
            Backend::Dummy => InstanceParameters::new().with_backend(BackendType::Dummy),
            Backend::WebGpu => InstanceParameters::new().with_backend(BackendType::Wgpu),
        }
    }
}

// ============================================================================
// Test Context
// ============================================================================

/// A pipeline context plus the device and output texture it renders into.
pub struct TestContext {
    pub device: Arc<GraphicsDevice>,
    pub context: ShadowPipelineContext,
    pub output: RenderTarget,
}

impl TestContext {
    /// A context on a recording dummy backend with the default 2048² map.
    pub fn recording(settings: ShadowSettings) -> Self {
        Self::with_backend(DummyBackend::recording(), ShadowPipelineConfig::default(), settings)
    }

    /// A context whose fences only signal when the test completes them.
    pub fn deferred(settings: ShadowSettings) -> Self {
        Self::with_backend(
            DummyBackend::recording().with_deferred_completion(),
            ShadowPipelineConfig::default(),
            settings,
        )
    }

    pub fn with_backend(
        backend: DummyBackend,
        config: ShadowPipelineConfig,
        settings: ShadowSettings,
    ) -> Self {
        let device = GraphicsInstance::with_backend(GpuBackend::Dummy(backend))
            .create_device()
            .expect("Failed to create dummy device");
        Self::on_device(device, config, settings)
    }

    /// A context on a real or dummy instance. `None` if the backend is
    /// unavailable here.
    pub fn for_backend(backend: Backend, settings: ShadowSettings) -> Option<Self> {
        if !backend.is_available() {
            return None;
        }
        let instance = GraphicsInstance::with_parameters(backend.to_instance_parameters()).ok()?;
        let device = instance.create_device().ok()?;
        Some(Self::on_device(
            device,
            ShadowPipelineConfig::default().with_shadow_map_size(512),
            settings,
        ))
    }

    fn on_device(
        device: Arc<GraphicsDevice>,
        config: ShadowPipelineConfig,
        settings: ShadowSettings,
    ) -> Self {
        let config = config.with_output(OUTPUT_FORMAT, OUTPUT_WIDTH, OUTPUT_HEIGHT);
        let context = ShadowPipelineContext::new(&device, config, settings)
            .expect("Failed to build shadow pipeline");
        let output = RenderTarget::from_texture(
            device
                .create_texture(
                    &TextureDescriptor::new_2d(
                        OUTPUT_WIDTH,
                        OUTPUT_HEIGHT,
                        OUTPUT_FORMAT,
                        TextureUsage::RENDER_ATTACHMENT,
                    )
                    .with_label("output"),
                )
                .expect("Failed to create output texture"),
        );
        Self {
            device,
            context,
            output,
        }
    }

    /// The dummy backend's event log, drained.
    pub fn take_events(&self) -> Vec<DummyEvent> {
        self.device
            .dummy()
            .map(DummyBackend::take_events)
            .unwrap_or_default()
    }
}

// ============================================================================
// Event log helpers
// ============================================================================

/// A state transition as (pass, texture, to).
pub type Transition = (String, String, ResourceState);

pub fn transitions(events: &[DummyEvent]) -> Vec<Transition> {
    events
        .iter()
        .filter_map(|e| match e {
            DummyEvent::Transition { pass, texture, to, .. } => {
                Some((pass.clone(), texture.clone(), *to))
            }
            _ => None,
        })
        .collect()
}

/// Names of the passes in execution order.
pub fn pass_names(events: &[DummyEvent]) -> Vec<String> {
    events
        .iter()
        .filter_map(|e| match e {
            DummyEvent::BeginPass { name, .. } => Some(name.clone()),
            _ => None,
        })
        .collect()
}

/// Workgroup counts of every dispatch.
pub fn dispatches(events: &[DummyEvent]) -> Vec<(String, [u32; 3])> {
    events
        .iter()
        .filter_map(|e| match e {
            DummyEvent::Dispatch { pass, groups, .. } => Some((pass.clone(), *groups)),
            _ => None,
        })
        .collect()
}

/// Meshes drawn by `pass`.
pub fn draws<'a>(events: &'a [DummyEvent], pass_name: &str) -> Vec<&'a str> {
    events
        .iter()
        .filter_map(|e| match e {
            DummyEvent::Draw { pass, mesh, .. } if pass == pass_name => Some(mesh.as_str()),
            _ => None,
        })
        .collect()
}

/// Labels of created or released objects, in log order.
pub fn created(events: &[DummyEvent]) -> Vec<String> {
    events
        .iter()
        .filter_map(|e| match e {
            DummyEvent::Create { label, .. } => Some(label.clone()),
            _ => None,
        })
        .collect()
}

pub fn released(events: &[DummyEvent]) -> Vec<String> {
    events
        .iter()
        .filter_map(|e| match e {
            DummyEvent::Release { label, .. } => Some(label.clone()),
            _ => None,
        })
        .collect()
}
