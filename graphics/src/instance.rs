//! Graphics instance.
//!
//! The [`GraphicsInstance`] is the top-level entry point for the graphics system.
//! It selects a [`GpuBackend`] once and hands it to every [`GraphicsDevice`] and
//! [`Surface`] created from it.

use std::sync::{Arc, Weak};

use parking_lot::RwLock;

use crate::backend::{self, DummyBackend, GpuBackend};
use crate::device::GraphicsDevice;
use crate::error::GraphicsError;
use crate::swapchain::{Surface, WindowHandle};

/// Which backend an instance should use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum BackendType {
    /// Try wgpu, fall back to the dummy backend.
    #[default]
    Auto,
    /// wgpu only; fail if unavailable.
    Wgpu,
    /// Dummy backend (no GPU).
    Dummy,
}

/// Parameters for [`GraphicsInstance::with_parameters`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct InstanceParameters {
    /// Requested backend.
    pub backend: BackendType,
    /// Enable API validation layers where the backend supports them.
    pub validation: bool,
}

impl InstanceParameters {
    /// Create default parameters (auto backend, no validation).
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the backend type.
    pub fn with_backend(mut self, backend: BackendType) -> Self {
        self.backend = backend;
        self
    }

    /// Enable or disable validation.
    pub fn with_validation(mut self, validation: bool) -> Self {
        self.validation = validation;
        self
    }
}

/// The graphics instance owns the backend and the devices created on it.
///
/// # Thread Safety
///
/// `GraphicsInstance` is `Send + Sync` and can be safely shared across threads.
///
/// # Example
///
/// ```ignore
/// let instance = GraphicsInstance::new()?;
/// let device = instance.create_device()?;
/// ```
pub struct GraphicsInstance {
    /// Weak self-reference for creating devices.
    self_ref: RwLock<Weak<GraphicsInstance>>,
    /// Devices created by this instance.
    devices: RwLock<Vec<Arc<GraphicsDevice>>>,
    backend: Arc<GpuBackend>,
    parameters: InstanceParameters,
}

impl GraphicsInstance {
    /// Create an instance with default parameters.
    ///
    /// # Errors
    ///
    /// Returns an error if the graphics system cannot be initialized.
    pub fn new() -> Result<Arc<Self>, GraphicsError> {
        Self::with_parameters(InstanceParameters::default())
    }

    /// Create an instance with explicit parameters.
    pub fn with_parameters(parameters: InstanceParameters) -> Result<Arc<Self>, GraphicsError> {
        log::info!("Creating GraphicsInstance ({:?})", parameters.backend);
        let backend = backend::create_backend(&parameters)?;
        Ok(Self::from_backend(backend, parameters))
    }

    /// Create an instance on an already constructed backend.
    ///
    /// Tests use this to inject a recording or deferred [`DummyBackend`].
    pub fn with_backend(backend: GpuBackend) -> Arc<Self> {
        let parameters = InstanceParameters::new().with_backend(match backend {
            GpuBackend::Dummy(_) => BackendType::Dummy,
            #[cfg(feature = "wgpu-backend")]
            GpuBackend::Wgpu(_) => BackendType::Wgpu,
        });
        Self::from_backend(backend, parameters)
    }

    /// Create an instance on a fresh dummy backend.
    pub fn dummy() -> Arc<Self> {
        Self::with_backend(GpuBackend::Dummy(DummyBackend::new()))
    }

    fn from_backend(backend: GpuBackend, parameters: InstanceParameters) -> Arc<Self> {
        log::info!("Using GPU backend: {}", backend.name());
        let instance = Arc::new(Self {
            self_ref: RwLock::new(Weak::new()),
            devices: RwLock::new(Vec::new()),
            backend: Arc::new(backend),
            parameters,
        });
        *instance.self_ref.write() = Arc::downgrade(&instance);
        instance
    }

    /// Get the GPU backend.
    pub fn backend(&self) -> &Arc<GpuBackend> {
        &self.backend
    }

    /// Get the parameters the instance was created with.
    pub fn parameters(&self) -> &InstanceParameters {
        &self.parameters
    }

    fn arc_self(&self) -> Result<Arc<GraphicsInstance>, GraphicsError> {
        self.self_ref.read().upgrade().ok_or_else(|| {
            GraphicsError::ResourceCreationFailed("instance has been dropped".to_string())
        })
    }

    /// Create a graphics device on the instance's adapter.
    ///
    /// # Errors
    ///
    /// Returns an error if the instance is being torn down.
    pub fn create_device(&self) -> Result<Arc<GraphicsDevice>, GraphicsError> {
        let instance = self.arc_self()?;
        let name = self.backend.name().to_string();
        log::info!("Creating device on adapter: {name}");

        let device = Arc::new(GraphicsDevice::new(instance, name));
        self.devices.write().push(Arc::clone(&device));
        Ok(device)
    }

    /// Get all devices created by this instance.
    pub fn devices(&self) -> Vec<Arc<GraphicsDevice>> {
        self.devices.read().clone()
    }

    /// Get the number of devices created by this instance.
    pub fn device_count(&self) -> usize {
        self.devices.read().len()
    }

    /// Create a surface for presenting to a window.
    ///
    /// The surface keeps the window alive for as long as it exists.
    ///
    /// # Example
    ///
    /// ```ignore
    /// let surface = instance.create_surface(window.clone())?;
    /// surface.configure(&device, &SurfaceConfiguration::new(800, 600))?;
    /// ```
    pub fn create_surface(
        &self,
        window: Arc<dyn WindowHandle>,
    ) -> Result<Arc<Surface>, GraphicsError> {
        let instance = self.arc_self()?;
        Ok(Arc::new(Surface::new(instance, window)?))
    }
}

impl std::fmt::Debug for GraphicsInstance {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GraphicsInstance")
            .field("backend", &self.backend.name())
            .field("device_count", &self.device_count())
            .finish()
    }
}

// Ensure GraphicsInstance is Send + Sync
static_assertions::assert_impl_all!(GraphicsInstance: Send, Sync);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_instance_creation() {
        let instance = GraphicsInstance::dummy();
        assert_eq!(instance.device_count(), 0);
        assert_eq!(instance.parameters().backend, BackendType::Dummy);
    }

    #[test]
    fn test_dummy_parameters() {
        let params = InstanceParameters::new().with_backend(BackendType::Dummy);
        let instance = GraphicsInstance::with_parameters(params).unwrap();
        assert_eq!(instance.backend().name(), "Dummy Backend");
    }

    #[test]
    fn test_create_device() {
        let instance = GraphicsInstance::dummy();
        let device = instance.create_device().unwrap();
        assert_eq!(device.name(), "Dummy Backend");
        assert_eq!(instance.device_count(), 1);
    }

    #[test]
    fn test_device_has_instance_reference() {
        let instance = GraphicsInstance::dummy();
        let device = instance.create_device().unwrap();
        assert!(Arc::ptr_eq(device.instance(), &instance));
    }
}
