//! Render pass types.

use std::sync::Arc;

use crate::materials::{BindingGroup, DescriptorTable, Material};
use crate::mesh::Mesh;

use super::resource_usage::{PassResourceUsage, TextureAccessMode};
use super::target::{RenderTarget, RenderTargetConfig};

/// A pass in the render graph.
#[derive(Debug)]
pub enum Pass {
    /// Graphics pass (vertex/fragment shaders, rasterization).
    Graphics(GraphicsPass),
    /// Compute pass (compute shaders).
    Compute(ComputePass),
}

impl Pass {
    /// Get the pass name.
    pub fn name(&self) -> &str {
        match self {
            Pass::Graphics(p) => p.name(),
            Pass::Compute(p) => p.name(),
        }
    }

    /// Check if this is a compute pass.
    pub fn is_compute(&self) -> bool {
        matches!(self, Pass::Compute(_))
    }

    /// Infer resource usage from the pass configuration.
    ///
    /// Render targets become writes, bound textures become shader reads and
    /// bound storage textures become storage writes.
    ///
    /// # Panics
    ///
    /// Panics if a texture is used both as a read source and a write target.
    pub fn infer_resource_usage(&self) -> PassResourceUsage {
        match self {
            Pass::Graphics(p) => p.infer_resource_usage(),
            Pass::Compute(p) => p.infer_resource_usage(),
        }
    }
}

// ============================================================================
// Bound tables
// ============================================================================

/// A descriptor table slot bound at a bind group index.
///
/// The group stored in the slot is captured when the binding is created, so
/// rewriting the slot later does not change recorded work.
#[derive(Clone)]
pub struct BoundTable {
    /// Bind group index in the pipeline layout.
    pub group_index: u32,
    /// The table the slot belongs to.
    pub table: Arc<DescriptorTable>,
    /// Slot index within the table.
    pub slot: u32,
    /// Snapshot of the slot's contents.
    pub group: Arc<BindingGroup>,
}

impl BoundTable {
    /// Bind `slot` of `table` at `group_index`.
    ///
    /// # Panics
    ///
    /// Panics if the slot has never been written.
    pub fn new(group_index: u32, table: &Arc<DescriptorTable>, slot: u32) -> Self {
        let group = table.group(slot).unwrap_or_else(|| {
            panic!(
                "Descriptor slot {slot} of table {:?} bound before it was written",
                table.label()
            )
        });
        Self {
            group_index,
            table: Arc::clone(table),
            slot,
            group,
        }
    }
}

impl std::fmt::Debug for BoundTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BoundTable")
            .field("group_index", &self.group_index)
            .field("table", &self.table.label())
            .field("slot", &self.slot)
            .finish()
    }
}

fn check_layout(pass: &str, material: &Material, binding: &BoundTable) {
    let layouts = material.binding_layouts();
    let expected = layouts.get(binding.group_index as usize).unwrap_or_else(|| {
        panic!(
            "Pass {pass}: material {:?} has no bind group {}",
            material.label(),
            binding.group_index
        )
    });
    assert!(
        **expected == **binding.table.layout(),
        "Pass {pass}: table {:?} bound at group {} does not match material {:?}",
        binding.table.label(),
        binding.group_index,
        material.label()
    );
}

fn add_binding_usage(pass: &str, usage: &mut PassResourceUsage, binding: &BoundTable) {
    for texture in binding.group.read_textures() {
        usage.add_texture(pass, texture, TextureAccessMode::ShaderRead);
    }
    for texture in binding.group.written_textures() {
        usage.add_texture(pass, texture, TextureAccessMode::StorageWrite);
    }
}

// ============================================================================
// Draw Command
// ============================================================================

/// A non-indexed draw of a whole mesh.
#[derive(Debug)]
pub struct DrawCommand {
    /// The mesh to render.
    pub mesh: Arc<Mesh>,
    /// Per-draw bindings, applied after the pass-level ones.
    pub bindings: Vec<BoundTable>,
}

// ============================================================================
// Graphics Pass
// ============================================================================

/// A graphics pass: one material, one set of render targets, many draws.
pub struct GraphicsPass {
    name: String,
    material: Arc<Material>,
    render_targets: Option<RenderTargetConfig>,
    bindings: Vec<BoundTable>,
    draws: Vec<DrawCommand>,
}

impl GraphicsPass {
    /// Create a new graphics pass drawing with `material`.
    pub fn new(name: String, material: Arc<Material>) -> Self {
        debug_assert!(
            !material.is_compute(),
            "GraphicsPass {name} created with a compute material"
        );
        Self {
            name,
            material,
            render_targets: None,
            bindings: Vec::new(),
            draws: Vec::new(),
        }
    }

    /// Get the pass name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Get the material every draw uses.
    pub fn material(&self) -> &Arc<Material> {
        &self.material
    }

    /// Set the render targets.
    pub fn set_render_targets(&mut self, config: RenderTargetConfig) {
        self.render_targets = Some(config);
    }

    /// Get the render targets, if set.
    pub fn render_targets(&self) -> Option<&RenderTargetConfig> {
        self.render_targets.as_ref()
    }

    /// Bind a table slot for every draw of the pass.
    ///
    /// # Panics
    ///
    /// Panics if the slot is empty or the table's layout differs from the
    /// material's layout at `group_index`.
    pub fn bind_table(&mut self, group_index: u32, table: &Arc<DescriptorTable>, slot: u32) {
        let binding = BoundTable::new(group_index, table, slot);
        check_layout(&self.name, &self.material, &binding);
        self.bindings.push(binding);
    }

    /// Pass-level bindings.
    pub fn bindings(&self) -> &[BoundTable] {
        &self.bindings
    }

    /// Draw `mesh` with extra per-draw bindings.
    ///
    /// # Panics
    ///
    /// Panics if a binding does not match the material. In debug builds also
    /// panics if the mesh does not provide the attributes the material reads.
    pub fn add_draw(&mut self, mesh: Arc<Mesh>, bindings: Vec<BoundTable>) {
        #[cfg(debug_assertions)]
        if let Some(expected) = self.material.vertex_layout()
            && !expected.is_readable_from(mesh.layout())
        {
            panic!(
                "Mesh/Material incompatibility in pass {}: mesh {:?} (stride {}) cannot feed \
                 material {:?} (stride {})",
                self.name,
                mesh.label(),
                mesh.layout().stride(),
                self.material.label(),
                expected.stride()
            );
        }
        for binding in &bindings {
            check_layout(&self.name, &self.material, binding);
        }
        self.draws.push(DrawCommand { mesh, bindings });
    }

    /// Recorded draws in submission order.
    pub fn draws(&self) -> &[DrawCommand] {
        &self.draws
    }

    /// Infer resource usage from render targets and bindings.
    pub fn infer_resource_usage(&self) -> PassResourceUsage {
        let mut usage = PassResourceUsage::new();

        if let Some(targets) = &self.render_targets {
            for color in &targets.color_attachments {
                match &color.target {
                    RenderTarget::Texture(texture) => {
                        usage.add_texture(&self.name, texture, TextureAccessMode::RenderTargetWrite)
                    }
                    RenderTarget::Surface { .. } => usage.writes_surface = true,
                }
            }
            if let Some(depth) = &targets.depth_attachment {
                usage.add_texture(&self.name, &depth.texture, TextureAccessMode::DepthStencilWrite);
            }
        }

        for binding in self
            .bindings
            .iter()
            .chain(self.draws.iter().flat_map(|d| d.bindings.iter()))
        {
            add_binding_usage(&self.name, &mut usage, binding);
        }

        usage
    }
}

impl std::fmt::Debug for GraphicsPass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GraphicsPass")
            .field("name", &self.name)
            .field("material", &self.material.label())
            .field("render_targets", &self.render_targets)
            .field("bindings", &self.bindings)
            .field("draw_count", &self.draws.len())
            .finish()
    }
}

// ============================================================================
// Compute Pass
// ============================================================================

/// One compute dispatch with its bindings.
#[derive(Debug)]
pub struct DispatchCommand {
    /// Workgroup counts (x, y, z).
    pub workgroups: [u32; 3],
    /// Bindings for this dispatch.
    pub bindings: Vec<BoundTable>,
}

/// A compute pass: one compute material, many dispatches.
pub struct ComputePass {
    name: String,
    material: Arc<Material>,
    dispatches: Vec<DispatchCommand>,
}

impl ComputePass {
    /// Create a new compute pass dispatching `material`.
    pub fn new(name: String, material: Arc<Material>) -> Self {
        debug_assert!(
            material.is_compute(),
            "ComputePass {name} created with a graphics material"
        );
        Self {
            name,
            material,
            dispatches: Vec::new(),
        }
    }

    /// Get the pass name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Get the compute material.
    pub fn material(&self) -> &Arc<Material> {
        &self.material
    }

    /// Record a dispatch.
    ///
    /// # Panics
    ///
    /// Panics if a binding does not match the material.
    pub fn add_dispatch(&mut self, workgroups: [u32; 3], bindings: Vec<BoundTable>) {
        for binding in &bindings {
            check_layout(&self.name, &self.material, binding);
        }
        log::trace!(
            "ComputePass {}: dispatch {}x{}x{}",
            self.name,
            workgroups[0],
            workgroups[1],
            workgroups[2]
        );
        self.dispatches.push(DispatchCommand {
            workgroups,
            bindings,
        });
    }

    /// Recorded dispatches in submission order.
    pub fn dispatches(&self) -> &[DispatchCommand] {
        &self.dispatches
    }

    /// Infer resource usage from dispatch bindings.
    pub fn infer_resource_usage(&self) -> PassResourceUsage {
        let mut usage = PassResourceUsage::new();
        for binding in self.dispatches.iter().flat_map(|d| d.bindings.iter()) {
            add_binding_usage(&self.name, &mut usage, binding);
        }
        usage
    }
}

impl std::fmt::Debug for ComputePass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ComputePass")
            .field("name", &self.name)
            .field("material", &self.material.label())
            .field("dispatch_count", &self.dispatches.len())
            .finish()
    }
}
