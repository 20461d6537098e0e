//! Materials: validated WGSL plus the pipeline state built from it.
//!
//! [`GraphicsDevice::create_material`](crate::GraphicsDevice::create_material)
//! runs naga over every stage before the backend builds the pipeline, so a
//! mismatched binding fails at load time rather than on first draw.

use std::sync::Arc;

use penumbra_core::mesh::{PrimitiveTopology, VertexLayout};

use crate::backend::GpuPipeline;
use crate::device::GraphicsDevice;
use crate::types::{CompareFunction, TextureFormat};

use super::bindings::BindingLayout;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShaderStage {
    Vertex,
    Fragment,
    Compute,
}

/// One entry point of a WGSL module.
///
/// Stages of the same module share the source text.
#[derive(Debug, Clone)]
pub struct ShaderSource {
    pub stage: ShaderStage,
    pub source: Arc<str>,
    pub entry_point: String,
}

impl ShaderSource {
    pub fn new(stage: ShaderStage, source: impl Into<Arc<str>>, entry_point: impl Into<String>) -> Self {
        Self {
            stage,
            source: source.into(),
            entry_point: entry_point.into(),
        }
    }

    pub fn vertex(source: impl Into<Arc<str>>, entry_point: impl Into<String>) -> Self {
        Self::new(ShaderStage::Vertex, source, entry_point)
    }

    pub fn fragment(source: impl Into<Arc<str>>, entry_point: impl Into<String>) -> Self {
        Self::new(ShaderStage::Fragment, source, entry_point)
    }

    pub fn compute(source: impl Into<Arc<str>>, entry_point: impl Into<String>) -> Self {
        Self::new(ShaderStage::Compute, source, entry_point)
    }
}

/// Which triangle faces are discarded. Front faces wind counter-clockwise.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum CullMode {
    #[default]
    None,
    Front,
    Back,
}

/// Fixed-function state of a graphics material.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RasterState {
    pub topology: PrimitiveTopology,
    pub cull_mode: CullMode,
    /// Only used when the material has a depth format.
    pub depth_compare: CompareFunction,
}

impl Default for RasterState {
    fn default() -> Self {
        Self {
            topology: PrimitiveTopology::TriangleList,
            cull_mode: CullMode::None,
            depth_compare: CompareFunction::LessEqual,
        }
    }
}

/// Everything needed to build a material.
#[derive(Debug, Clone, Default)]
pub struct MaterialDescriptor {
    pub shaders: Vec<ShaderSource>,
    /// One layout per bind group index, in order.
    pub binding_layouts: Vec<Arc<BindingLayout>>,
    /// `None` for compute.
    pub vertex_layout: Option<Arc<VertexLayout>>,
    pub raster: RasterState,
    pub color_formats: Vec<TextureFormat>,
    pub depth_format: Option<TextureFormat>,
    pub label: Option<String>,
}

impl MaterialDescriptor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_shader(mut self, shader: ShaderSource) -> Self {
        self.shaders.push(shader);
        self
    }

    /// Layout for the next bind group index.
    pub fn with_binding_layout(mut self, layout: Arc<BindingLayout>) -> Self {
        self.binding_layouts.push(layout);
        self
    }

    pub fn with_vertex_layout(mut self, layout: Arc<VertexLayout>) -> Self {
        self.vertex_layout = Some(layout);
        self
    }

    pub fn with_color_format(mut self, format: TextureFormat) -> Self {
        self.color_formats.push(format);
        self
    }

    pub fn with_depth_format(mut self, format: TextureFormat) -> Self {
        self.depth_format = Some(format);
        self
    }

    pub fn with_cull_mode(mut self, cull_mode: CullMode) -> Self {
        self.raster.cull_mode = cull_mode;
        self
    }

    pub fn with_depth_compare(mut self, compare: CompareFunction) -> Self {
        self.raster.depth_compare = compare;
        self
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// A single compute stage and nothing else.
    pub fn is_compute(&self) -> bool {
        matches!(self.shaders.as_slice(), [only] if only.stage == ShaderStage::Compute)
    }

    pub fn shader(&self, stage: ShaderStage) -> Option<&ShaderSource> {
        self.shaders.iter().find(|s| s.stage == stage)
    }
}

/// A built pipeline and the descriptor it came from.
///
/// ```ignore
/// let material = device.create_material(
///     &MaterialDescriptor::new()
///         .with_shader(ShaderSource::vertex(SHADOW_MAP_WGSL, "vs_main"))
///         .with_shader(ShaderSource::fragment(SHADOW_MAP_WGSL, "fs_vsm"))
///         .with_binding_layout(light_layout())
///         .with_binding_layout(object_layout())
///         .with_cull_mode(CullMode::Front)
///         .with_label("vsm_shadow"),
/// )?;
/// ```
pub struct Material {
    device: Arc<GraphicsDevice>,
    descriptor: MaterialDescriptor,
    gpu_handle: GpuPipeline,
}

impl Material {
    pub(crate) fn new(
        device: Arc<GraphicsDevice>,
        descriptor: MaterialDescriptor,
        gpu_handle: GpuPipeline,
    ) -> Self {
        Self {
            device,
            descriptor,
            gpu_handle,
        }
    }

    pub fn gpu_handle(&self) -> &GpuPipeline {
        &self.gpu_handle
    }

    pub fn device(&self) -> &Arc<GraphicsDevice> {
        &self.device
    }

    pub fn descriptor(&self) -> &MaterialDescriptor {
        &self.descriptor
    }

    pub fn label(&self) -> Option<&str> {
        self.descriptor.label.as_deref()
    }

    pub fn binding_layouts(&self) -> &[Arc<BindingLayout>] {
        &self.descriptor.binding_layouts
    }

    pub fn vertex_layout(&self) -> Option<&Arc<VertexLayout>> {
        self.descriptor.vertex_layout.as_ref()
    }

    pub fn is_compute(&self) -> bool {
        self.descriptor.is_compute()
    }
}

impl std::fmt::Debug for Material {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Material")
            .field("label", &self.descriptor.label)
            .field("stages", &self.descriptor.shaders.iter().map(|s| s.stage).collect::<Vec<_>>())
            .field("groups", &self.descriptor.binding_layouts.len())
            .field("raster", &self.descriptor.raster)
            .finish()
    }
}

static_assertions::assert_impl_all!(Material: Send, Sync);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_material_descriptor_builder() {
        let source: Arc<str> = Arc::from("// shadow module");
        let desc = MaterialDescriptor::new()
            .with_shader(ShaderSource::vertex(Arc::clone(&source), "vs_main"))
            .with_shader(ShaderSource::fragment(Arc::clone(&source), "fs_vsm"))
            .with_cull_mode(CullMode::Front)
            .with_label("vsm_shadow");

        assert_eq!(desc.shaders.len(), 2);
        assert!(Arc::ptr_eq(&desc.shaders[0].source, &desc.shaders[1].source));
        assert_eq!(desc.label.as_deref(), Some("vsm_shadow"));
        assert_eq!(desc.raster.cull_mode, CullMode::Front);
        assert_eq!(desc.raster.depth_compare, CompareFunction::LessEqual);
        assert!(!desc.is_compute());
    }

    #[test]
    fn test_compute_descriptor() {
        let desc = MaterialDescriptor::new().with_shader(ShaderSource::compute("", "cs_main"));
        assert!(desc.is_compute());
        assert_eq!(
            desc.shader(ShaderStage::Compute).map(|s| s.entry_point.as_str()),
            Some("cs_main")
        );
        assert!(desc.shader(ShaderStage::Vertex).is_none());

        let mixed = desc.with_shader(ShaderSource::vertex("", "vs_main"));
        assert!(!mixed.is_compute());
    }
}
