//! Ownership of the pipeline's GPU objects.
//!
//! A [`ResourceScope`] adopts every object the shadow pipeline creates and
//! releases them in reverse creation order, after the GPU has drained.

use std::sync::Arc;

use crate::backend::ResourceKind;
use crate::device::GraphicsDevice;
use crate::error::GraphicsError;
use crate::materials::{DescriptorTable, Material};
use crate::mesh::Mesh;
use crate::resources::{Buffer, Sampler, Texture};

/// A GPU object a [`ResourceScope`] can own.
pub trait ScopedResource: Send + Sync {
    /// Free the object's GPU memory.
    fn release(&self, device: &GraphicsDevice);

    /// Name for logs.
    fn describe(&self) -> String;
}

impl ScopedResource for Texture {
    fn release(&self, device: &GraphicsDevice) {
        device.release_texture(self);
    }

    fn describe(&self) -> String {
        format!("texture {}", self.debug_name())
    }
}

impl ScopedResource for Buffer {
    fn release(&self, device: &GraphicsDevice) {
        device.release_buffer(self);
    }

    fn describe(&self) -> String {
        format!("buffer {:?}", self.label())
    }
}

impl ScopedResource for Sampler {
    fn release(&self, device: &GraphicsDevice) {
        device.release_object(ResourceKind::Sampler, self.label());
    }

    fn describe(&self) -> String {
        format!("sampler {:?}", self.label())
    }
}

impl ScopedResource for Material {
    fn release(&self, device: &GraphicsDevice) {
        device.release_object(ResourceKind::Material, self.label());
    }

    fn describe(&self) -> String {
        format!("material {:?}", self.label())
    }
}

impl ScopedResource for DescriptorTable {
    fn release(&self, device: &GraphicsDevice) {
        device.release_object(ResourceKind::DescriptorTable, self.label());
    }

    fn describe(&self) -> String {
        format!("descriptor table {:?}", self.label())
    }
}

impl ScopedResource for Mesh {
    /// The mesh goes first, then the vertex buffer it was built from.
    fn release(&self, device: &GraphicsDevice) {
        device.release_object(ResourceKind::Mesh, self.label());
        device.release_buffer(self.vertex_buffer());
    }

    fn describe(&self) -> String {
        format!("mesh {:?}", self.label())
    }
}

/// Owns GPU objects and releases them in reverse creation order.
///
/// [`ResourceScope::release_all`] waits for the device to go idle before the
/// first release. Dropping a scope that still holds objects releases them
/// the same way.
pub struct ResourceScope {
    device: Arc<GraphicsDevice>,
    resources: Vec<Arc<dyn ScopedResource>>,
}

impl ResourceScope {
    pub fn new(device: &Arc<GraphicsDevice>) -> Self {
        Self {
            device: Arc::clone(device),
            resources: Vec::new(),
        }
    }

    /// Take ownership of a freshly created object.
    pub fn adopt<T: ScopedResource + 'static>(&mut self, resource: Arc<T>) -> Arc<T> {
        self.resources.push(Arc::clone(&resource) as Arc<dyn ScopedResource>);
        resource
    }

    /// Release `old` now and adopt `new` in its place.
    ///
    /// `new` counts as the most recently created object. The caller must
    /// have waited for the GPU to stop using `old`.
    ///
    /// # Panics
    ///
    /// Panics if `old` is not owned by this scope.
    pub fn replace<T: ScopedResource + 'static>(&mut self, old: &Arc<T>, new: Arc<T>) -> Arc<T> {
        let old_ptr = Arc::as_ptr(old) as *const ();
        let position = self
            .resources
            .iter()
            .position(|r| Arc::as_ptr(r) as *const () == old_ptr)
            .unwrap_or_else(|| panic!("{} is not owned by this scope", old.describe()));
        let removed = self.resources.remove(position);
        log::trace!("ResourceScope: replacing {}", removed.describe());
        removed.release(&self.device);
        self.adopt(new)
    }

    /// Number of owned objects.
    pub fn len(&self) -> usize {
        self.resources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.resources.is_empty()
    }

    /// Wait for the GPU to drain, then release everything, newest first.
    pub fn release_all(&mut self) -> Result<(), GraphicsError> {
        if self.resources.is_empty() {
            return Ok(());
        }
        self.device.wait_idle()?;
        log::trace!("ResourceScope: releasing {} objects", self.resources.len());
        while let Some(resource) = self.resources.pop() {
            resource.release(&self.device);
        }
        Ok(())
    }
}

impl Drop for ResourceScope {
    fn drop(&mut self) {
        if let Err(e) = self.release_all() {
            log::error!("ResourceScope: teardown failed: {e}");
        }
    }
}

impl std::fmt::Debug for ResourceScope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResourceScope")
            .field("resources", &self.resources.len())
            .finish()
    }
}

static_assertions::assert_impl_all!(ResourceScope: Send, Sync);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{DummyBackend, DummyEvent, GpuBackend};
    use crate::instance::GraphicsInstance;
    use crate::types::{BufferDescriptor, SamplerDescriptor};

    fn recording_device() -> Arc<GraphicsDevice> {
        GraphicsInstance::with_backend(GpuBackend::Dummy(DummyBackend::recording()))
            .create_device()
            .unwrap()
    }

    fn buffer(device: &Arc<GraphicsDevice>, label: &str) -> Arc<Buffer> {
        device
            .create_buffer(&BufferDescriptor::uniform(16).with_label(label))
            .unwrap()
    }

    fn released(device: &GraphicsDevice) -> Vec<String> {
        device
            .dummy()
            .unwrap()
            .take_events()
            .into_iter()
            .filter_map(|e| match e {
                DummyEvent::Release { label, .. } => Some(label),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn test_release_in_reverse_order_after_idle() {
        let device = recording_device();
        let mut scope = ResourceScope::new(&device);
        scope.adopt(buffer(&device, "a"));
        scope.adopt(device.create_sampler(&SamplerDescriptor::nearest().with_label("b")).unwrap());
        scope.adopt(buffer(&device, "c"));
        device.dummy().unwrap().take_events();

        scope.release_all().unwrap();
        let events = device.dummy().unwrap().take_events();
        assert_eq!(events.first(), Some(&DummyEvent::WaitIdle));
        let labels: Vec<_> = events
            .iter()
            .filter_map(|e| match e {
                DummyEvent::Release { label, .. } => Some(label.as_str()),
                _ => None,
            })
            .collect();
        assert_eq!(labels, vec!["c", "b", "a"]);
        assert!(scope.is_empty());
    }

    #[test]
    fn test_replace_moves_to_newest() {
        let device = recording_device();
        let mut scope = ResourceScope::new(&device);
        let old = scope.adopt(buffer(&device, "depth"));
        scope.adopt(buffer(&device, "other"));
        device.dummy().unwrap().take_events();

        scope.replace(&old, buffer(&device, "depth2"));
        assert_eq!(released(&device), vec!["depth"]);
        assert_eq!(scope.len(), 2);

        scope.release_all().unwrap();
        assert_eq!(released(&device), vec!["depth2", "other"]);
    }

    #[test]
    #[should_panic(expected = "is not owned by this scope")]
    fn test_replace_foreign_panics() {
        let device = recording_device();
        let mut scope = ResourceScope::new(&device);
        let foreign = buffer(&device, "foreign");
        scope.replace(&foreign, buffer(&device, "new"));
    }

    #[test]
    fn test_drop_releases() {
        let device = recording_device();
        {
            let mut scope = ResourceScope::new(&device);
            scope.adopt(buffer(&device, "x"));
            device.dummy().unwrap().take_events();
        }
        assert_eq!(released(&device), vec!["x"]);
    }
}
