//! Dummy GPU backend for testing and development.
//!
//! This backend doesn't perform actual GPU operations but provides a valid
//! implementation for exercising the whole frame loop without GPU hardware.
//!
//! Two switches make it useful as a test double:
//!
//! - [`DummyBackend::recording`] keeps an ordered [`DummyEvent`] log of every
//!   creation, release, buffer/descriptor write, barrier, draw, dispatch and
//!   submission, which tests assert against.
//! - [`DummyBackend::with_deferred_completion`] leaves submitted fences
//!   unsignaled until [`DummyBackend::complete_oldest`] or
//!   [`DummyBackend::complete_all`] is called, standing in for a GPU that
//!   runs behind the CPU.
//! - [`DummyBackend::lose_device`] fails every pending fence and later
//!   submission with [`GraphicsError::DeviceLost`].

use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::Mutex;

use crate::error::GraphicsError;
use crate::graph::{CompiledGraph, Pass, RenderGraph, ResourceState};
use crate::materials::MaterialDescriptor;
use crate::sync::Semaphore;
use crate::types::{BufferDescriptor, SamplerDescriptor, TextureDescriptor};

use super::{DeviceCapabilities, GpuBuffer, GpuFence, GpuPipeline, GpuSampler, GpuTexture};

/// Kind of object named in creation/release events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceKind {
    Buffer,
    Texture,
    Sampler,
    Material,
    DescriptorTable,
    Mesh,
}

/// Kind of pass named in [`DummyEvent::BeginPass`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PassKind {
    Graphics,
    Compute,
}

/// A descriptor table slot bound by a draw or dispatch.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SlotBinding {
    pub group_index: u32,
    pub table: String,
    pub slot: u32,
}

/// One entry of the dummy backend's event log.
#[derive(Debug, Clone, PartialEq)]
pub enum DummyEvent {
    Create {
        kind: ResourceKind,
        label: String,
    },
    Release {
        kind: ResourceKind,
        label: String,
    },
    WriteBuffer {
        label: String,
        offset: u64,
        len: usize,
    },
    WriteDescriptor {
        table: String,
        slot: u32,
    },
    Transition {
        pass: String,
        texture: String,
        from: ResourceState,
        to: ResourceState,
    },
    BeginPass {
        name: String,
        kind: PassKind,
    },
    Draw {
        pass: String,
        mesh: String,
        vertex_count: u32,
        bindings: Vec<SlotBinding>,
    },
    Dispatch {
        pass: String,
        groups: [u32; 3],
        bindings: Vec<SlotBinding>,
    },
    Submit {
        semaphore: u64,
        passes: usize,
    },
    WaitIdle,
    ConfigureSurface {
        width: u32,
        height: u32,
        vsync: bool,
    },
    Present,
}

fn label_or_unnamed(label: Option<&str>) -> String {
    label.unwrap_or("unnamed").to_string()
}

/// Dummy GPU backend.
#[derive(Debug)]
pub struct DummyBackend {
    capabilities: DeviceCapabilities,
    record: bool,
    deferred: bool,
    lost: AtomicBool,
    events: Mutex<Vec<DummyEvent>>,
    pending: Mutex<VecDeque<Arc<GpuFence>>>,
}

impl DummyBackend {
    /// Create a new dummy backend that signals fences on submit and keeps no log.
    pub fn new() -> Self {
        Self {
            capabilities: DeviceCapabilities::default(),
            record: false,
            deferred: false,
            lost: AtomicBool::new(false),
            events: Mutex::new(Vec::new()),
            pending: Mutex::new(VecDeque::new()),
        }
    }

    /// Create a dummy backend that records every operation into its event log.
    pub fn recording() -> Self {
        Self {
            record: true,
            ..Self::new()
        }
    }

    /// Leave submitted fences pending until completed explicitly.
    pub fn with_deferred_completion(mut self) -> Self {
        self.deferred = true;
        self
    }

    /// Override the reported device capabilities.
    pub fn with_capabilities(mut self, capabilities: DeviceCapabilities) -> Self {
        self.capabilities = capabilities;
        self
    }

    /// Get the backend name.
    pub fn name(&self) -> &'static str {
        "Dummy Backend"
    }

    pub fn capabilities(&self) -> DeviceCapabilities {
        self.capabilities
    }

    /// Snapshot of the event log.
    pub fn events(&self) -> Vec<DummyEvent> {
        self.events.lock().clone()
    }

    /// Drain the event log.
    pub fn take_events(&self) -> Vec<DummyEvent> {
        std::mem::take(&mut *self.events.lock())
    }

    /// Number of submissions whose fence has not been signaled yet.
    pub fn pending_count(&self) -> usize {
        self.pending.lock().len()
    }

    /// Signal the oldest pending fence. Returns `false` if none was pending.
    pub fn complete_oldest(&self) -> bool {
        match self.pending.lock().pop_front() {
            Some(fence) => {
                fence.signal();
                true
            }
            None => false,
        }
    }

    /// Signal every pending fence.
    pub fn complete_all(&self) {
        for fence in self.pending.lock().drain(..) {
            fence.signal();
        }
    }

    /// Simulate device loss. Pending fences fail their waits; submissions
    /// and idle waits return [`GraphicsError::DeviceLost`] from now on.
    pub fn lose_device(&self) {
        log::warn!("DummyBackend: device lost");
        self.lost.store(true, Ordering::Release);
        for fence in self.pending.lock().drain(..) {
            fence.mark_lost();
        }
    }

    pub fn is_lost(&self) -> bool {
        self.lost.load(Ordering::Acquire)
    }

    fn push(&self, event: DummyEvent) {
        if self.record {
            self.events.lock().push(event);
        }
    }

    pub(crate) fn note_created(&self, kind: ResourceKind, label: Option<&str>) {
        self.push(DummyEvent::Create {
            kind,
            label: label_or_unnamed(label),
        });
    }

    pub(crate) fn note_released(&self, kind: ResourceKind, label: Option<&str>) {
        self.push(DummyEvent::Release {
            kind,
            label: label_or_unnamed(label),
        });
    }

    pub(crate) fn note_descriptor_write(&self, table: Option<&str>, slot: u32) {
        self.push(DummyEvent::WriteDescriptor {
            table: label_or_unnamed(table),
            slot,
        });
    }

    pub(crate) fn note_surface_configured(&self, width: u32, height: u32, vsync: bool) {
        self.push(DummyEvent::ConfigureSurface {
            width,
            height,
            vsync,
        });
    }

    pub(crate) fn note_present(&self) {
        self.push(DummyEvent::Present);
    }

    /// Create a buffer resource.
    pub fn create_buffer(&self, descriptor: &BufferDescriptor) -> Result<GpuBuffer, GraphicsError> {
        log::trace!(
            "DummyBackend: creating buffer {:?} (size: {})",
            descriptor.label,
            descriptor.size
        );
        self.note_created(ResourceKind::Buffer, descriptor.label.as_deref());
        Ok(GpuBuffer::Dummy)
    }

    /// Create a texture resource.
    pub fn create_texture(
        &self,
        descriptor: &TextureDescriptor,
    ) -> Result<GpuTexture, GraphicsError> {
        log::trace!(
            "DummyBackend: creating texture {:?} ({}x{} {:?})",
            descriptor.label,
            descriptor.size.width,
            descriptor.size.height,
            descriptor.format
        );
        self.note_created(ResourceKind::Texture, descriptor.label.as_deref());
        Ok(GpuTexture::Dummy)
    }

    /// Create a sampler resource.
    pub fn create_sampler(
        &self,
        descriptor: &SamplerDescriptor,
    ) -> Result<GpuSampler, GraphicsError> {
        log::trace!("DummyBackend: creating sampler {:?}", descriptor.label);
        self.note_created(ResourceKind::Sampler, descriptor.label.as_deref());
        Ok(GpuSampler::Dummy)
    }

    /// Create a pipeline for a material.
    pub fn create_pipeline(
        &self,
        descriptor: &MaterialDescriptor,
    ) -> Result<GpuPipeline, GraphicsError> {
        log::trace!(
            "DummyBackend: creating pipeline {:?} ({} shader stages)",
            descriptor.label,
            descriptor.shaders.len()
        );
        self.note_created(ResourceKind::Material, descriptor.label.as_deref());
        Ok(GpuPipeline::Dummy)
    }

    /// Create a fence for CPU-GPU synchronization.
    pub fn create_fence(&self, signaled: bool) -> GpuFence {
        GpuFence::dummy(signaled)
    }

    /// Write data to a buffer.
    pub fn write_buffer(
        &self,
        label: Option<&str>,
        offset: u64,
        data: &[u8],
    ) -> Result<(), GraphicsError> {
        log::trace!(
            "DummyBackend: write_buffer {:?} offset={} len={}",
            label,
            offset,
            data.len()
        );
        self.push(DummyEvent::WriteBuffer {
            label: label_or_unnamed(label),
            offset,
            len: data.len(),
        });
        Ok(())
    }

    /// "Execute" a compiled render graph by logging it.
    pub fn execute_graph(
        &self,
        graph: &RenderGraph,
        compiled: &CompiledGraph,
        signal_fence: &Arc<GpuFence>,
        signal_semaphore: &Semaphore,
    ) -> Result<(), GraphicsError> {
        if self.is_lost() {
            return Err(GraphicsError::DeviceLost);
        }
        log::trace!(
            "DummyBackend: executing graph with {} passes",
            compiled.pass_order().len()
        );

        for (handle, barriers) in compiled.steps() {
            let pass = graph.pass(handle)?;
            let name = pass.name().to_string();

            for barrier in barriers.iter() {
                self.push(DummyEvent::Transition {
                    pass: name.clone(),
                    texture: barrier.label.clone(),
                    from: barrier.from,
                    to: barrier.to,
                });
            }

            match pass {
                Pass::Graphics(graphics) => {
                    self.push(DummyEvent::BeginPass {
                        name: name.clone(),
                        kind: PassKind::Graphics,
                    });
                    for draw in graphics.draws() {
                        let bindings = graphics
                            .bindings()
                            .iter()
                            .chain(draw.bindings.iter())
                            .map(|b| SlotBinding {
                                group_index: b.group_index,
                                table: label_or_unnamed(b.table.label()),
                                slot: b.slot,
                            })
                            .collect();
                        self.push(DummyEvent::Draw {
                            pass: name.clone(),
                            mesh: label_or_unnamed(draw.mesh.label()),
                            vertex_count: draw.mesh.vertex_count(),
                            bindings,
                        });
                    }
                }
                Pass::Compute(compute) => {
                    self.push(DummyEvent::BeginPass {
                        name: name.clone(),
                        kind: PassKind::Compute,
                    });
                    for dispatch in compute.dispatches() {
                        let bindings = dispatch
                            .bindings
                            .iter()
                            .map(|b| SlotBinding {
                                group_index: b.group_index,
                                table: label_or_unnamed(b.table.label()),
                                slot: b.slot,
                            })
                            .collect();
                        self.push(DummyEvent::Dispatch {
                            pass: name.clone(),
                            groups: dispatch.workgroups,
                            bindings,
                        });
                    }
                }
            }
        }

        self.push(DummyEvent::Submit {
            semaphore: signal_semaphore.id(),
            passes: compiled.pass_order().len(),
        });

        if self.deferred {
            self.pending.lock().push_back(Arc::clone(signal_fence));
        } else {
            // No real GPU work, so the submission is complete immediately.
            signal_fence.signal();
        }

        Ok(())
    }

    /// Wait for all submitted work. Completes every pending fence.
    pub fn wait_idle(&self) -> Result<(), GraphicsError> {
        log::trace!("DummyBackend: wait_idle");
        self.push(DummyEvent::WaitIdle);
        if self.is_lost() {
            return Err(GraphicsError::DeviceLost);
        }
        self.complete_all();
        Ok(())
    }
}

impl Default for DummyBackend {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recording_disabled_by_default() {
        let backend = DummyBackend::new();
        backend.note_created(ResourceKind::Texture, Some("t"));
        assert!(backend.events().is_empty());
    }

    #[test]
    fn test_recording_logs_in_order() {
        let backend = DummyBackend::recording();
        backend.note_created(ResourceKind::Texture, Some("a"));
        backend.note_descriptor_write(None, 3);
        backend.wait_idle().unwrap();
        assert_eq!(
            backend.take_events(),
            vec![
                DummyEvent::Create {
                    kind: ResourceKind::Texture,
                    label: "a".to_string()
                },
                DummyEvent::WriteDescriptor {
                    table: "unnamed".to_string(),
                    slot: 3
                },
                DummyEvent::WaitIdle,
            ]
        );
        assert!(backend.events().is_empty());
    }

    #[test]
    fn test_deferred_completion() {
        let backend = DummyBackend::new().with_deferred_completion();
        let a = Arc::new(backend.create_fence(false));
        let b = Arc::new(backend.create_fence(false));
        backend.pending.lock().push_back(Arc::clone(&a));
        backend.pending.lock().push_back(Arc::clone(&b));

        assert_eq!(backend.pending_count(), 2);
        assert!(backend.complete_oldest());
        assert!(a.is_signaled());
        assert!(!b.is_signaled());

        backend.wait_idle().unwrap();
        assert!(b.is_signaled());
        assert!(!backend.complete_oldest());
    }

    #[test]
    fn test_lose_device_fails_pending_fences() {
        let backend = DummyBackend::new().with_deferred_completion();
        let signaled = Arc::new(backend.create_fence(true));
        let pending = Arc::new(backend.create_fence(false));
        backend.pending.lock().push_back(Arc::clone(&pending));

        backend.lose_device();
        assert!(backend.is_lost());
        assert_eq!(backend.pending_count(), 0);
        assert!(signaled.wait().is_ok());
        assert!(matches!(pending.wait(), Err(GraphicsError::DeviceLost)));
        assert!(matches!(backend.wait_idle(), Err(GraphicsError::DeviceLost)));
    }
}
