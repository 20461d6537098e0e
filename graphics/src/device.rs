//! Graphics device.
//!
//! The [`GraphicsDevice`] is the main interface for creating GPU resources and
//! submitting compiled render graphs. It is created by
//! [`GraphicsInstance::create_device`].

use std::sync::Arc;

use crate::backend::{DeviceCapabilities, DummyBackend, GpuBackend, ReleaseHandle, ResourceKind};
use crate::error::GraphicsError;
use crate::graph::{CompiledGraph, RenderGraph};
use crate::instance::GraphicsInstance;
use crate::materials::{BindingLayout, DescriptorTable, Material, MaterialDescriptor};
use crate::mesh::{CpuMesh, Mesh};
use crate::resources::{Buffer, Sampler, Texture};
use crate::shader;
use crate::sync::{Fence, Semaphore};
use crate::types::{BufferDescriptor, BufferUsage, SamplerDescriptor, TextureDescriptor};

/// A graphics device for creating GPU resources.
///
/// # Thread Safety
///
/// `GraphicsDevice` is `Send + Sync` and can be safely shared across threads.
///
/// # Example
///
/// ```ignore
/// let instance = GraphicsInstance::new()?;
/// let device = instance.create_device()?;
///
/// let buffer = device.create_buffer(&BufferDescriptor::uniform(256))?;
/// let texture = device.create_texture(&TextureDescriptor::new_2d(
///     2048, 2048,
///     TextureFormat::Rg32Float,
///     TextureUsage::RENDER_ATTACHMENT | TextureUsage::TEXTURE_BINDING,
/// ))?;
/// ```
pub struct GraphicsDevice {
    instance: Arc<GraphicsInstance>,
    name: String,
    capabilities: DeviceCapabilities,
}

impl GraphicsDevice {
    /// Create a new graphics device (called by GraphicsInstance).
    pub(crate) fn new(instance: Arc<GraphicsInstance>, name: String) -> Self {
        let capabilities = instance.backend().capabilities();
        Self {
            instance,
            name,
            capabilities,
        }
    }

    /// Get the parent instance.
    pub fn instance(&self) -> &Arc<GraphicsInstance> {
        &self.instance
    }

    /// Get the GPU backend.
    pub fn backend(&self) -> &GpuBackend {
        self.instance.backend()
    }

    /// The dummy backend, when this device runs on one.
    pub fn dummy(&self) -> Option<&DummyBackend> {
        match self.backend() {
            GpuBackend::Dummy(b) => Some(b),
            #[cfg(feature = "wgpu-backend")]
            _ => None,
        }
    }

    /// Get the device name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Get the device capabilities.
    pub fn capabilities(&self) -> &DeviceCapabilities {
        &self.capabilities
    }

    /// Create a GPU buffer.
    ///
    /// # Errors
    ///
    /// Returns an error if the buffer size is zero or allocation fails.
    pub fn create_buffer(
        self: &Arc<Self>,
        descriptor: &BufferDescriptor,
    ) -> Result<Arc<Buffer>, GraphicsError> {
        if descriptor.size == 0 {
            return Err(GraphicsError::InvalidParameter(
                "buffer size cannot be zero".to_string(),
            ));
        }

        let gpu = self.backend().create_buffer(descriptor)?;
        log::trace!(
            "GraphicsDevice: created buffer {:?}, size={}",
            descriptor.label,
            descriptor.size
        );
        Ok(Arc::new(Buffer::new(Arc::clone(self), descriptor.clone(), gpu)))
    }

    /// Create a GPU texture.
    ///
    /// # Errors
    ///
    /// Returns an error if the texture dimensions exceed device limits or allocation fails.
    pub fn create_texture(
        self: &Arc<Self>,
        descriptor: &TextureDescriptor,
    ) -> Result<Arc<Texture>, GraphicsError> {
        let max_dim = self.capabilities.max_texture_dimension_2d;
        if descriptor.size.width > max_dim || descriptor.size.height > max_dim {
            return Err(GraphicsError::InvalidParameter(format!(
                "texture dimension exceeds maximum {max_dim}"
            )));
        }
        if descriptor.size.is_empty() {
            return Err(GraphicsError::InvalidParameter(
                "texture dimensions cannot be zero".to_string(),
            ));
        }

        let gpu = self.backend().create_texture(descriptor)?;
        log::trace!(
            "GraphicsDevice: created texture {:?}, size={}x{}",
            descriptor.label,
            descriptor.size.width,
            descriptor.size.height
        );
        Ok(Arc::new(Texture::new(Arc::clone(self), descriptor.clone(), gpu)))
    }

    /// Create a texture sampler.
    pub fn create_sampler(
        self: &Arc<Self>,
        descriptor: &SamplerDescriptor,
    ) -> Result<Arc<Sampler>, GraphicsError> {
        let gpu = self.backend().create_sampler(descriptor)?;
        log::trace!("GraphicsDevice: created sampler {:?}", descriptor.label);
        Ok(Arc::new(Sampler::new(Arc::clone(self), descriptor.clone(), gpu)))
    }

    /// Create a material and its backend pipeline.
    ///
    /// The WGSL sources are validated with naga first, including a check
    /// that every binding the entry points use is declared by the material.
    ///
    /// # Errors
    ///
    /// Returns [`GraphicsError::ShaderCompilationFailed`] for invalid shaders,
    /// or the backend's error if pipeline creation fails.
    pub fn create_material(
        self: &Arc<Self>,
        descriptor: &MaterialDescriptor,
    ) -> Result<Arc<Material>, GraphicsError> {
        shader::validate_material(descriptor)?;
        let gpu = self.backend().create_pipeline(descriptor)?;
        log::trace!("GraphicsDevice: created material {:?}", descriptor.label);
        Ok(Arc::new(Material::new(
            Arc::clone(self),
            descriptor.clone(),
            gpu,
        )))
    }

    /// Create a descriptor table with `capacity` slots following `layout`.
    pub fn create_descriptor_table(
        self: &Arc<Self>,
        layout: Arc<BindingLayout>,
        capacity: u32,
        label: Option<&str>,
    ) -> Arc<DescriptorTable> {
        self.backend()
            .note_created(ResourceKind::DescriptorTable, label);
        log::trace!("GraphicsDevice: created descriptor table {label:?} ({capacity} slots)");
        Arc::new(DescriptorTable::new(
            Arc::clone(self),
            layout,
            capacity,
            label.map(str::to_string),
        ))
    }

    /// Upload a CPU mesh into a new vertex buffer.
    pub fn create_mesh_from_cpu(self: &Arc<Self>, cpu: &CpuMesh) -> Result<Arc<Mesh>, GraphicsError> {
        let label = cpu.label().map(|l| format!("{l}_vertices"));
        let mut descriptor = BufferDescriptor::vertices(cpu.vertex_data().len() as u64);
        descriptor.label = label;
        let buffer = self.create_buffer(&descriptor)?;
        buffer.write(0, cpu.vertex_data())?;

        self.backend().note_created(ResourceKind::Mesh, cpu.label());
        Ok(Arc::new(Mesh::new(
            Arc::clone(cpu.layout()),
            cpu.topology(),
            buffer,
            cpu.vertex_count(),
            cpu.label().map(str::to_string),
        )))
    }

    /// Write `data` into `buffer` at `offset`.
    ///
    /// # Errors
    ///
    /// Returns [`GraphicsError::InvalidParameter`] if the buffer was not created
    /// with `COPY_DST` or the write would run past its end.
    pub fn write_buffer(&self, buffer: &Buffer, offset: u64, data: &[u8]) -> Result<(), GraphicsError> {
        if !buffer.descriptor().is_writable() {
            return Err(GraphicsError::InvalidParameter(format!(
                "buffer {:?} is not a write target",
                buffer.label()
            )));
        }
        let end = offset + data.len() as u64;
        if end > buffer.size() {
            return Err(GraphicsError::InvalidParameter(format!(
                "write of {} bytes at offset {offset} exceeds buffer {:?} of size {}",
                data.len(),
                buffer.label(),
                buffer.size()
            )));
        }
        self.backend()
            .write_buffer(buffer.gpu_handle(), buffer.label(), offset, data)
    }

    /// Create a semaphore.
    pub fn create_semaphore(&self) -> Semaphore {
        Semaphore::new(self.backend().create_semaphore())
    }

    /// Submit a compiled graph.
    ///
    /// Every submission gets a fresh fence, signaled when the GPU finishes it.
    pub fn submit(
        &self,
        graph: &RenderGraph,
        compiled: &CompiledGraph,
        signal_semaphore: &Semaphore,
    ) -> Result<Fence, GraphicsError> {
        let gpu_fence = Arc::new(self.backend().create_fence(false));
        self.backend()
            .execute_graph(graph, compiled, &gpu_fence, signal_semaphore)?;
        Ok(Fence::new(gpu_fence))
    }

    /// Block until all submitted work has completed.
    pub fn wait_idle(&self) -> Result<(), GraphicsError> {
        self.backend().wait_idle()
    }

    /// Free a texture's GPU memory now.
    ///
    /// The caller must ensure no in-flight submission still uses it.
    pub fn release_texture(&self, texture: &Texture) {
        self.backend().release(
            ResourceKind::Texture,
            texture.label(),
            ReleaseHandle::Texture(texture.gpu_handle()),
        );
    }

    /// Free a buffer's GPU memory now.
    ///
    /// The caller must ensure no in-flight submission still uses it.
    pub fn release_buffer(&self, buffer: &Buffer) {
        self.backend().release(
            ResourceKind::Buffer,
            buffer.label(),
            ReleaseHandle::Buffer(buffer.gpu_handle()),
        );
    }

    /// Log the release of an object that owns no GPU memory of its own.
    pub fn release_object(&self, kind: ResourceKind, label: Option<&str>) {
        self.backend().release(kind, label, ReleaseHandle::None);
    }
}

impl std::fmt::Debug for GraphicsDevice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GraphicsDevice")
            .field("name", &self.name)
            .field("capabilities", &self.capabilities)
            .finish()
    }
}

// Ensure GraphicsDevice is Send + Sync
static_assertions::assert_impl_all!(GraphicsDevice: Send, Sync);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::DummyEvent;
    use crate::mesh::generators;
    use crate::types::{TextureFormat, TextureUsage};
    use penumbra_core::math::Vec3;

    fn create_test_device() -> Arc<GraphicsDevice> {
        GraphicsInstance::dummy().create_device().unwrap()
    }

    fn create_recording_device() -> Arc<GraphicsDevice> {
        GraphicsInstance::with_backend(GpuBackend::Dummy(DummyBackend::recording()))
            .create_device()
            .unwrap()
    }

    #[test]
    fn test_device_name() {
        let device = create_test_device();
        assert_eq!(device.name(), "Dummy Backend");
        assert!(device.dummy().is_some());
    }

    #[test]
    fn test_create_buffer_zero_size() {
        let device = create_test_device();
        let result = device.create_buffer(&BufferDescriptor::new(0, BufferUsage::VERTEX));
        assert!(result.is_err());
    }

    #[test]
    fn test_create_texture() {
        let device = create_test_device();
        let texture = device
            .create_texture(&TextureDescriptor::new_2d(
                512,
                512,
                TextureFormat::Rgba8Unorm,
                TextureUsage::TEXTURE_BINDING,
            ))
            .unwrap();
        assert_eq!(texture.width(), 512);
        assert_eq!(texture.height(), 512);
    }

    #[test]
    fn test_create_texture_too_large() {
        let device = create_test_device();
        let result = device.create_texture(&TextureDescriptor::new_2d(
            16384,
            16,
            TextureFormat::Rg32Float,
            TextureUsage::TEXTURE_BINDING,
        ));
        assert!(matches!(result, Err(GraphicsError::InvalidParameter(_))));
    }

    #[test]
    fn test_create_material_rejects_invalid_wgsl() {
        let device = create_test_device();
        let result = device.create_material(
            &MaterialDescriptor::new()
                .with_shader(crate::materials::ShaderSource::vertex("not wgsl", "main")),
        );
        assert!(matches!(
            result,
            Err(GraphicsError::ShaderCompilationFailed(_))
        ));
    }

    #[test]
    fn test_mesh_upload_records_events() {
        let device = create_recording_device();
        let cpu = generators::generate_cuboid(Vec3::ONE);
        let mesh = device.create_mesh_from_cpu(&cpu).unwrap();
        assert_eq!(mesh.vertex_count(), 36);

        let events = device.dummy().unwrap().take_events();
        assert!(events.contains(&DummyEvent::WriteBuffer {
            label: "cuboid_vertices".to_string(),
            offset: 0,
            len: 36 * 24,
        }));
        assert!(events.contains(&DummyEvent::Create {
            kind: ResourceKind::Mesh,
            label: "cuboid".to_string(),
        }));
    }

    #[test]
    fn test_release_logged() {
        let device = create_recording_device();
        let buffer = device
            .create_buffer(&BufferDescriptor::uniform(256).with_label("camera"))
            .unwrap();
        device.release_buffer(&buffer);
        assert_eq!(
            device.dummy().unwrap().take_events().last(),
            Some(&DummyEvent::Release {
                kind: ResourceKind::Buffer,
                label: "camera".to_string(),
            })
        );
    }
}
