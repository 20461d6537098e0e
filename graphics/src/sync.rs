//! GPU synchronization primitives.
//!
//! A [`Fence`] lets the CPU wait for one submission to finish on the GPU. A
//! [`Semaphore`] orders GPU work against GPU work and is never waited on by
//! the CPU.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use crate::backend::{GpuFence, GpuSemaphore};
use crate::error::GraphicsError;

/// GPU semaphore signaled when a frame's rendering completes.
///
/// wgpu orders submissions on the queue implicitly, so the semaphore only
/// carries an id that shows up in submission logs.
#[derive(Debug)]
pub struct Semaphore {
    /// Unique identifier for debugging.
    id: u64,
    gpu: GpuSemaphore,
}

impl Semaphore {
    pub(crate) fn new(gpu: GpuSemaphore) -> Self {
        static NEXT_ID: AtomicU64 = AtomicU64::new(1);
        Self {
            id: NEXT_ID.fetch_add(1, Ordering::Relaxed),
            gpu,
        }
    }

    /// Get the semaphore's unique ID (for debugging).
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Backend handle.
    pub fn gpu_handle(&self) -> GpuSemaphore {
        self.gpu
    }
}

/// Status of a fence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FenceStatus {
    /// The fence has not yet been signaled.
    Unsignaled,
    /// The fence has been signaled (GPU work complete).
    Signaled,
}

/// CPU-GPU synchronization primitive.
///
/// Each submission through [`GraphicsDevice::submit`] returns a fresh fence.
/// Clones share the underlying GPU fence.
///
/// # Example
///
/// ```ignore
/// let fence = device.submit(&graph, &compiled, slot.semaphore())?;
///
/// // Later, before reusing the slot's resources:
/// fence.wait()?;
/// assert_eq!(fence.status(), FenceStatus::Signaled);
/// ```
///
/// [`GraphicsDevice::submit`]: crate::GraphicsDevice::submit
#[derive(Debug, Clone)]
pub struct Fence {
    gpu: Arc<GpuFence>,
}

impl Fence {
    pub(crate) fn new(gpu: Arc<GpuFence>) -> Self {
        Self { gpu }
    }

    /// Check the current status of the fence.
    pub fn status(&self) -> FenceStatus {
        if self.gpu.is_signaled() {
            FenceStatus::Signaled
        } else {
            FenceStatus::Unsignaled
        }
    }

    /// Check if the fence is signaled (non-blocking).
    pub fn is_signaled(&self) -> bool {
        self.status() == FenceStatus::Signaled
    }

    /// Block until the GPU signals the fence.
    ///
    /// Returns immediately if already signaled.
    ///
    /// # Errors
    ///
    /// [`GraphicsError::DeviceLost`] if the device is lost before the fence
    /// signals. The fence's work never completes in that case.
    pub fn wait(&self) -> Result<(), GraphicsError> {
        self.gpu.wait()
    }

    /// Wait for the fence with a timeout.
    ///
    /// Returns `Ok(true)` if the fence was signaled, `Ok(false)` if the
    /// timeout elapsed.
    pub fn wait_timeout(&self, timeout: Duration) -> Result<bool, GraphicsError> {
        self.gpu.wait_timeout(timeout)
    }

    pub(crate) fn gpu_handle(&self) -> &Arc<GpuFence> {
        &self.gpu
    }
}

static_assertions::assert_impl_all!(Fence: Send, Sync);

#[cfg(test)]
mod tests {
    use super::*;
    fn dummy_fence(signaled: bool) -> Fence {
        Fence::new(Arc::new(GpuFence::dummy(signaled)))
    }

    #[test]
    fn test_semaphore_ids_unique() {
        let a = Semaphore::new(GpuSemaphore::Dummy);
        let b = Semaphore::new(GpuSemaphore::Dummy);
        assert_ne!(a.id(), b.id());
        assert_eq!(a.gpu_handle(), GpuSemaphore::Dummy);
    }

    #[test]
    fn test_fence_status() {
        assert_eq!(dummy_fence(false).status(), FenceStatus::Unsignaled);
        assert_eq!(dummy_fence(true).status(), FenceStatus::Signaled);
    }

    #[test]
    fn test_fence_signal_from_other_thread() {
        let fence = dummy_fence(false);
        let gpu = Arc::clone(fence.gpu_handle());
        std::thread::spawn(move || {
            std::thread::sleep(Duration::from_millis(10));
            gpu.signal();
        });

        fence.wait().unwrap();
        assert!(fence.is_signaled());
    }

    #[test]
    fn test_fence_wait_timeout() {
        let fence = dummy_fence(false);
        assert!(!fence.wait_timeout(Duration::from_millis(10)).unwrap());
        assert!(!fence.is_signaled());
    }

    #[test]
    fn test_fence_clone_shares_state() {
        let fence1 = dummy_fence(false);
        let fence2 = fence1.clone();
        fence1.gpu_handle().signal();
        assert!(fence2.is_signaled());
    }
}
