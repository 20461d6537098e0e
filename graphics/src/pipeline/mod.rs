//! Frame resource ring for managing multiple frames in flight.
//!
//! This module provides [`FrameResourceRing`], which coordinates CPU-GPU
//! synchronization across K frame slots so the CPU can record frame N+1 while
//! the GPU renders frame N.
//!
//! # Synchronization Model
//!
//! | Level | Primitive | Purpose |
//! |-------|-----------|---------|
//! | Pass → Pass | Barriers | Resource state transitions within a graph |
//! | Frame → Frame | Semaphores | GPU-GPU ordering of submissions |
//! | Frame → CPU | Fences | A slot is reused only after its fence signals |
//!
//! # Frame Overlap
//!
//! ```text
//! frames_in_flight = 3
//!
//! Slot 0: [Frame 0] ──► [Frame 3] ──► [Frame 6] ──►
//! Slot 1: [Frame 1] ──► [Frame 4] ──► [Frame 7] ──►
//! Slot 2: [Frame 2] ──► [Frame 5] ──► [Frame 8] ──►
//! ```
//!
//! Everything a frame mutates on the CPU side (uniform rows, descriptor slots)
//! is indexed by slot, so writing slot `i` never touches data the GPU may
//! still be reading for another slot. [`FrameResourceRing::begin_frame`] is the
//! only place the frame loop blocks.
//!
//! # Example
//!
//! ```ignore
//! let mut ring = FrameResourceRing::new(&device, 3);
//!
//! while running {
//!     let slot = ring.begin_frame()?;         // may block on the slot's fence
//!     rows.write(slot, 0, &camera)?;          // per-slot uniform rows
//!     let (graph, compiled) = record(slot)?;
//!     ring.end_frame(graph, compiled)?;       // submit, keep the fence, advance
//! }
//!
//! ring.wait_idle()?;
//! ```

mod rows;

pub use rows::UniformRows;

use std::sync::Arc;
use std::time::Duration;

use crate::device::GraphicsDevice;
use crate::error::GraphicsError;
use crate::graph::{CompiledGraph, RenderGraph};
use crate::sync::{Fence, Semaphore};

/// One of the ring's rotating records.
#[derive(Debug)]
pub struct FrameSlot {
    /// Fence of the last submission from this slot. `None` if never used.
    fence: Option<Fence>,
    /// Signaled when this slot's rendering completes.
    semaphore: Semaphore,
    /// The last command list submitted from this slot.
    ///
    /// Kept alive until the fence signals so every resource the graph
    /// references outlives the GPU work.
    commands: Option<(RenderGraph, CompiledGraph)>,
}

impl FrameSlot {
    /// Fence of the last submission, if any.
    pub fn fence(&self) -> Option<&Fence> {
        self.fence.as_ref()
    }

    /// Render-complete semaphore.
    pub fn semaphore(&self) -> &Semaphore {
        &self.semaphore
    }

    /// The command list still held for the GPU, if any.
    pub fn commands(&self) -> Option<&(RenderGraph, CompiledGraph)> {
        self.commands.as_ref()
    }

    fn is_ready(&self) -> bool {
        self.fence.as_ref().is_none_or(Fence::is_signaled)
    }
}

/// Manages K frames in flight for CPU-GPU parallelism.
///
/// # Thread Safety
///
/// `FrameResourceRing` is **not** meant to be shared. It is owned by the
/// thread that records and submits frames.
#[derive(Debug)]
pub struct FrameResourceRing {
    device: Arc<GraphicsDevice>,
    slots: Vec<FrameSlot>,
    /// Current frame slot index (0 to frames_in_flight - 1).
    current_slot: usize,
    /// Total frames started.
    frame_count: u64,
}

impl FrameResourceRing {
    /// Create a ring with `frames_in_flight` slots.
    ///
    /// # Panics
    ///
    /// Panics if `frames_in_flight` is 0.
    pub fn new(device: &Arc<GraphicsDevice>, frames_in_flight: usize) -> Self {
        assert!(frames_in_flight > 0, "frames_in_flight must be at least 1");

        let slots = (0..frames_in_flight)
            .map(|_| FrameSlot {
                fence: None,
                semaphore: device.create_semaphore(),
                commands: None,
            })
            .collect();

        Self {
            device: Arc::clone(device),
            slots,
            current_slot: 0,
            frame_count: 0,
        }
    }

    /// Begin a new frame and return its slot index.
    ///
    /// Blocks while the GPU is still processing the previous frame recorded
    /// in this slot. Once the fence has signaled, the slot's old command list
    /// is dropped and its resources may be rewritten.
    ///
    /// # Errors
    ///
    /// [`GraphicsError::DeviceLost`] if the device is lost before the fence
    /// signals. The slot is left untouched and no frame is started.
    pub fn begin_frame(&mut self) -> Result<usize, GraphicsError> {
        let slot = &mut self.slots[self.current_slot];
        if let Some(fence) = &slot.fence {
            fence.wait()?;
        }
        slot.commands = None;

        self.frame_count += 1;
        log::trace!(
            "Begin frame {} (slot {})",
            self.frame_count,
            self.current_slot
        );
        Ok(self.current_slot)
    }

    /// Begin a new frame, giving up after `timeout`.
    ///
    /// Returns `Ok(false)` without starting a frame if the slot's fence did
    /// not signal in time.
    pub fn begin_frame_timeout(&mut self, timeout: Duration) -> Result<bool, GraphicsError> {
        let slot = &mut self.slots[self.current_slot];
        if let Some(fence) = &slot.fence
            && !fence.wait_timeout(timeout)?
        {
            log::trace!("Slot {} still busy after {:?}", self.current_slot, timeout);
            return Ok(false);
        }
        slot.commands = None;

        self.frame_count += 1;
        log::trace!(
            "Begin frame {} (slot {})",
            self.frame_count,
            self.current_slot
        );
        Ok(true)
    }

    /// Submit the frame's command list and advance to the next slot.
    ///
    /// The submission signals a fresh fence, which is recorded on the slot
    /// together with the command list.
    pub fn end_frame(
        &mut self,
        graph: RenderGraph,
        compiled: CompiledGraph,
    ) -> Result<Fence, GraphicsError> {
        log::trace!(
            "End frame {} (slot {}, {} passes)",
            self.frame_count,
            self.current_slot,
            compiled.pass_count()
        );

        let slot = &mut self.slots[self.current_slot];
        let fence = self.device.submit(&graph, &compiled, &slot.semaphore)?;
        slot.fence = Some(fence.clone());
        slot.commands = Some((graph, compiled));

        self.current_slot = (self.current_slot + 1) % self.slots.len();
        Ok(fence)
    }

    /// Wait for all in-flight GPU work to complete.
    ///
    /// Blocks until every slot's fence is signaled and releases the held
    /// command lists. Stops at the first slot whose wait fails, keeping that
    /// slot's commands.
    pub fn wait_idle(&mut self) -> Result<(), GraphicsError> {
        log::trace!("Waiting for GPU idle ({} slots)", self.slots.len());

        for (i, slot) in self.slots.iter_mut().enumerate() {
            if let Some(fence) = &slot.fence {
                log::trace!("Waiting for slot {}...", i);
                fence.wait()?;
            }
            slot.commands = None;
        }
        Ok(())
    }

    /// Return to slot 0 with every slot empty.
    ///
    /// Used after a swapchain rebuild. The caller waits for idle first.
    pub fn reset(&mut self) {
        debug_assert!(self.is_idle(), "FrameResourceRing reset while GPU busy");
        for slot in &mut self.slots {
            slot.fence = None;
            slot.commands = None;
        }
        self.current_slot = 0;
        log::trace!("FrameResourceRing reset");
    }

    /// Get the number of frames in flight.
    pub fn frames_in_flight(&self) -> usize {
        self.slots.len()
    }

    /// Get the current frame slot index.
    pub fn current_slot(&self) -> usize {
        self.current_slot
    }

    /// Get a slot by index.
    pub fn slot(&self, index: usize) -> &FrameSlot {
        &self.slots[index]
    }

    /// Get the total number of frames started.
    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }

    /// Check if a specific frame slot is ready (non-blocking).
    ///
    /// Returns `true` if the slot's fence is signaled or if the slot
    /// hasn't been used yet.
    pub fn is_slot_ready(&self, slot: usize) -> bool {
        assert!(slot < self.slots.len(), "Invalid slot index");
        self.slots[slot].is_ready()
    }

    /// Check if all frame slots are ready (non-blocking).
    pub fn is_idle(&self) -> bool {
        self.slots.iter().all(FrameSlot::is_ready)
    }
}
