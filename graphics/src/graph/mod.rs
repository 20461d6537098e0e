//! Render graph infrastructure.
//!
//! The render graph is a declarative description of one frame's GPU work.
//! Passes are fully configured before they are added; at that point the
//! graph infers which textures each pass reads and writes. Compilation then:
//!
//! - orders passes by topological sort over the declared dependencies;
//! - consults a [`ResourceStateTracker`] for each texture a pass uses and
//!   places a barrier before the pass only where the state changes.
//!
//! # Architecture
//!
//! | Layer | Type | Purpose |
//! |-------|------|---------|
//! | Pipeline | [`FrameResourceRing`](crate::pipeline::FrameResourceRing) | Multiple frames in flight |
//! | **Graph** | [`RenderGraph`] | Pass dependencies and barriers (this module) |
//! | Pass | [`GraphicsPass`], [`ComputePass`] | Single GPU operation |
//!
//! # Example
//!
//! ```ignore
//! let mut graph = RenderGraph::new();
//! let mut pass = GraphicsPass::new("shadow_map".into(), material);
//! pass.set_render_targets(
//!     RenderTargetConfig::new()
//!         .with_color(ColorAttachment::from_texture(target).with_clear(ClearValue::ZERO_COLOR)),
//! );
//! let shadow = graph.add_graphics_pass(pass);
//! let compiled = graph.compile(&mut tracker)?;
//! ```

mod pass;
mod resource_usage;
mod state;
mod target;

pub use pass::{BoundTable, ComputePass, DispatchCommand, DrawCommand, GraphicsPass, Pass};
pub use resource_usage::{PassResourceUsage, TextureAccessMode, TextureUsageDecl};
pub use state::{BarrierBatch, ResourceState, ResourceStateTracker, TextureBarrier};
pub use target::{
    ColorAttachment, DepthAttachment, LoadOp, RenderTarget, RenderTargetConfig, StoreOp,
};

pub use crate::compiler::{CompiledGraph, GraphError};

/// Handle to a pass in the render graph.
///
/// `PassHandle` is `Copy` and cheap to pass around. It is only valid within
/// the `RenderGraph` that created it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PassHandle(u32);

impl PassHandle {
    pub(crate) fn new(index: u32) -> Self {
        Self(index)
    }

    /// Index of the pass in insertion order.
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// The render graph describes a frame's rendering operations.
#[derive(Debug, Default)]
pub struct RenderGraph {
    passes: Vec<Pass>,
    /// Dependency edges stored as (dependent, dependency) pairs.
    edges: Vec<(PassHandle, PassHandle)>,
    /// Resource usage of each pass, inferred when the pass is added.
    usages: Vec<PassResourceUsage>,
}

impl RenderGraph {
    /// Create a new empty render graph.
    pub fn new() -> Self {
        Self::default()
    }

    fn push(&mut self, pass: Pass) -> PassHandle {
        let usage = pass.infer_resource_usage();
        log::trace!(
            "RenderGraph: added pass {} ({} textures)",
            pass.name(),
            usage.texture_count()
        );
        let index = self.passes.len() as u32;
        self.passes.push(pass);
        self.usages.push(usage);
        PassHandle::new(index)
    }

    /// Add a graphics pass to the graph.
    ///
    /// # Panics
    ///
    /// Panics if the pass uses a texture both as read source and write target.
    pub fn add_graphics_pass(&mut self, pass: GraphicsPass) -> PassHandle {
        self.push(Pass::Graphics(pass))
    }

    /// Add a compute pass to the graph.
    ///
    /// # Panics
    ///
    /// Panics if the pass uses a texture both as read source and write target.
    pub fn add_compute_pass(&mut self, pass: ComputePass) -> PassHandle {
        self.push(Pass::Compute(pass))
    }

    /// Add a dependency between passes.
    ///
    /// The `dependent` pass will execute after the `dependency` pass.
    pub fn add_dependency(&mut self, dependent: PassHandle, dependency: PassHandle) {
        assert!(
            dependent.index() < self.passes.len(),
            "Invalid dependent handle"
        );
        assert!(
            dependency.index() < self.passes.len(),
            "Invalid dependency handle"
        );
        assert!(dependent != dependency, "Pass cannot depend on itself");

        let exists = self
            .edges
            .iter()
            .any(|&(d, dep)| d == dependent && dep == dependency);
        if !exists {
            self.edges.push((dependent, dependency));
        }
    }

    /// Get dependencies of a pass.
    pub fn dependencies(&self, handle: PassHandle) -> impl Iterator<Item = PassHandle> + '_ {
        self.edges
            .iter()
            .filter(move |&&(dependent, _)| dependent == handle)
            .map(|&(_, dependency)| dependency)
    }

    /// Get all passes in the graph.
    pub fn passes(&self) -> &[Pass] {
        &self.passes
    }

    /// Look up a pass by handle.
    pub fn pass(&self, handle: PassHandle) -> Result<&Pass, GraphError> {
        self.passes
            .get(handle.index())
            .ok_or(GraphError::InvalidPassHandle(handle))
    }

    /// Inferred resource usage of a pass.
    pub fn usage(&self, handle: PassHandle) -> Result<&PassResourceUsage, GraphError> {
        self.usages
            .get(handle.index())
            .ok_or(GraphError::InvalidPassHandle(handle))
    }

    /// Get the number of passes in the graph.
    pub fn pass_count(&self) -> usize {
        self.passes.len()
    }

    pub(crate) fn edges(&self) -> &[(PassHandle, PassHandle)] {
        &self.edges
    }

    /// Compile the graph for execution.
    ///
    /// `tracker` holds the state every texture was left in by previously
    /// compiled graphs and is advanced to the state this graph leaves them in.
    pub fn compile(&self, tracker: &mut ResourceStateTracker) -> Result<CompiledGraph, GraphError> {
        crate::compiler::compile(self, tracker)
    }

    /// Clear all passes from the graph.
    pub fn clear(&mut self) {
        self.passes.clear();
        self.edges.clear();
        self.usages.clear();
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use std::sync::Arc;

    use crate::device::GraphicsDevice;
    use crate::materials::{
        BindingGroup, BindingLayout, DescriptorTable, Material, MaterialDescriptor, ShaderSource,
        ShaderStageFlags,
    };
    use crate::resources::Texture;
    use crate::types::{TextureDescriptor, TextureFormat, TextureUsage};

    pub const COPY_SHADER: &str = r#"
@group(0) @binding(0) var source: texture_2d<f32>;
@group(0) @binding(1) var dest: texture_storage_2d<rg32float, write>;

@compute @workgroup_size(8, 8)
fn cs_main(@builtin(global_invocation_id) id: vec3<u32>) {
    let value = textureLoad(source, vec2<i32>(id.xy), 0);
    textureStore(dest, vec2<i32>(id.xy), value);
}
"#;

    pub fn copy_layout() -> Arc<BindingLayout> {
        Arc::new(
            BindingLayout::new()
                .with_texture(0, false, ShaderStageFlags::COMPUTE)
                .with_storage_texture(1, TextureFormat::Rg32Float)
                .with_label("copy"),
        )
    }

    pub fn copy_material(device: &Arc<GraphicsDevice>) -> Arc<Material> {
        device
            .create_material(
                &MaterialDescriptor::new()
                    .with_shader(ShaderSource::compute(COPY_SHADER, "cs_main"))
                    .with_binding_layout(copy_layout())
                    .with_label("copy"),
            )
            .unwrap()
    }

    pub fn scratch(device: &Arc<GraphicsDevice>, label: &str) -> Arc<Texture> {
        device
            .create_texture(
                &TextureDescriptor::new_2d(
                    64,
                    64,
                    TextureFormat::Rg32Float,
                    TextureUsage::TEXTURE_BINDING | TextureUsage::STORAGE_BINDING,
                )
                .with_label(label),
            )
            .unwrap()
    }

    /// A table whose slot 0 copies `src` into `dst`.
    pub fn copy_table(
        device: &Arc<GraphicsDevice>,
        src: &Arc<Texture>,
        dst: &Arc<Texture>,
    ) -> Arc<DescriptorTable> {
        let table = device.create_descriptor_table(copy_layout(), 1, Some("copy"));
        table.write(
            0,
            Arc::new(
                BindingGroup::new()
                    .with_texture(0, Arc::clone(src))
                    .with_storage_texture(1, Arc::clone(dst)),
            ),
        );
        table
    }
}
