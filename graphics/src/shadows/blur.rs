//! Separable Gaussian blur of a moment map.
//!
//! One iteration is a horizontal phase followed by a vertical phase, each a
//! compute pass of its own. The phases ping-pong between two scratch
//! textures:
//!
//! ```text
//! iteration 0:  shadow map ──H──► horizontal ──V──► vertical
//! iteration i:  vertical   ──H──► horizontal ──V──► vertical
//! ```
//!
//! so after N ≥ 1 iterations the result is always in the vertical texture.
//! Each phase gets its own descriptor slot and constant row for its
//! (frame, iteration, phase), see [`BlurSlotLayout`].

use std::sync::Arc;

use crate::device::GraphicsDevice;
use crate::error::GraphicsError;
use crate::graph::{BoundTable, ComputePass, PassHandle, RenderGraph};
use crate::materials::{BindingGroup, DescriptorTable, Material, MaterialDescriptor, ShaderSource};
use crate::pipeline::UniformRows;
use crate::resources::Texture;

use super::descriptors::{BlurPhase, BlurSlotLayout, blur_layout};
use super::scope::ResourceScope;
use super::shaders;
use super::targets::BlurScratch;
use super::technique::Technique;
use super::uniforms::ShadowConstants;

/// Edge of the blur kernel's square workgroup.
pub const BLUR_WORKGROUP_SIZE: u32 = 16;

/// Workgroups along one edge of a `size`×`size` map.
///
/// Always one more than needed when `size` is a multiple of the workgroup;
/// the kernel skips out-of-bounds invocations.
pub fn dispatch_size(size: u32) -> u32 {
    size / BLUR_WORKGROUP_SIZE + 1
}

/// Where the blurred moments ended up.
#[derive(Debug, Clone)]
pub struct BlurOutput {
    /// The last pass recorded, or the pass the blur was chained after when
    /// no iteration ran.
    pub last_pass: PassHandle,
    /// The texture the main pass must sample.
    pub texture: Arc<Texture>,
}

/// The blur kernel of one technique, with its descriptor slots.
pub struct BlurPipeline {
    technique: Technique,
    material: Arc<Material>,
    table: Arc<DescriptorTable>,
    constants: UniformRows,
    slots: BlurSlotLayout,
}

impl BlurPipeline {
    pub fn new(
        device: &Arc<GraphicsDevice>,
        scope: &mut ResourceScope,
        technique: Technique,
        slots: BlurSlotLayout,
    ) -> Result<Self, GraphicsError> {
        let format = technique.desc().render_target_format;
        let layout = blur_layout(format);
        let label = format!("blur_{}", technique.name());

        let material = scope.adopt(
            device.create_material(
                &MaterialDescriptor::new()
                    .with_shader(ShaderSource::compute(
                        shaders::blur_source(format)?,
                        shaders::BLUR_ENTRY,
                    ))
                    .with_binding_layout(Arc::clone(&layout))
                    .with_label(label.as_str()),
            )?,
        );
        let constants = UniformRows::new(
            device,
            &format!("blur_constants_{}", technique.name()),
            std::mem::size_of::<ShadowConstants>() as u64,
            slots.capacity(),
            1,
        )?;
        scope.adopt(Arc::clone(constants.buffer()));
        let table = scope.adopt(device.create_descriptor_table(
            layout,
            slots.capacity(),
            Some(&label),
        ));

        Ok(Self {
            technique,
            material,
            table,
            constants,
            slots,
        })
    }

    pub fn technique(&self) -> Technique {
        self.technique
    }

    pub fn slots(&self) -> BlurSlotLayout {
        self.slots
    }

    pub fn table(&self) -> &Arc<DescriptorTable> {
        &self.table
    }

    /// Record `iterations` blur iterations of `source` for `frame`, chained
    /// after `after`.
    ///
    /// With zero iterations nothing is recorded and `source` is returned.
    pub fn record(
        &self,
        graph: &mut RenderGraph,
        after: PassHandle,
        frame: u32,
        iterations: u32,
        source: &Arc<Texture>,
        scratch: &BlurScratch,
    ) -> Result<BlurOutput, GraphicsError> {
        if iterations > self.slots.max_blurs {
            return Err(GraphicsError::InvalidParameter(format!(
                "{iterations} blur iterations requested, at most {} supported",
                self.slots.max_blurs
            )));
        }

        let size = source.width();
        let groups = dispatch_size(size);
        let mut last_pass = after;
        for iteration in 0..iterations {
            for phase in BlurPhase::ALL {
                let (src, dst) = match phase {
                    BlurPhase::Horizontal if iteration == 0 => (source, &scratch.horizontal),
                    BlurPhase::Horizontal => (&scratch.vertical, &scratch.horizontal),
                    BlurPhase::Vertical => (&scratch.horizontal, &scratch.vertical),
                };

                let slot = self.slots.blur_descriptor_slot(frame, iteration, phase);
                self.constants
                    .write(0, slot, &ShadowConstants::new(size, phase.is_horizontal()))?;
                self.table.write(
                    slot,
                    Arc::new(
                        BindingGroup::new()
                            .with_texture(0, Arc::clone(src))
                            .with_storage_texture(1, Arc::clone(dst))
                            .with_buffer_range(
                                2,
                                Arc::clone(self.constants.buffer()),
                                self.constants.offset(0, slot),
                                self.constants.row_size(),
                            ),
                    ),
                );

                let mut pass = ComputePass::new(
                    format!("blur_{}_{iteration}", phase.name()),
                    Arc::clone(&self.material),
                );
                pass.add_dispatch([groups, groups, 1], vec![BoundTable::new(0, &self.table, slot)]);
                let handle = graph.add_compute_pass(pass);
                graph.add_dependency(handle, last_pass);
                last_pass = handle;
            }
        }

        let texture = if iterations == 0 {
            Arc::clone(source)
        } else {
            Arc::clone(&scratch.vertical)
        };
        Ok(BlurOutput { last_pass, texture })
    }
}

impl std::fmt::Debug for BlurPipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BlurPipeline")
            .field("technique", &self.technique)
            .field("slots", &self.slots)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::instance::GraphicsInstance;
    use crate::materials::BoundResource;
    use crate::types::{TextureDescriptor, TextureUsage};

    struct Fixture {
        blur: BlurPipeline,
        source: Arc<Texture>,
        scratch: BlurScratch,
        _scope: ResourceScope,
    }

    fn fixture() -> Fixture {
        let device = GraphicsInstance::dummy().create_device().unwrap();
        let mut scope = ResourceScope::new(&device);
        let blur = BlurPipeline::new(&device, &mut scope, Technique::Vsm, BlurSlotLayout::new(8, 3))
            .unwrap();
        let source = scope.adopt(
            device
                .create_texture(
                    &TextureDescriptor::new_2d(
                        256,
                        256,
                        Technique::Vsm.desc().render_target_format,
                        TextureUsage::RENDER_ATTACHMENT | TextureUsage::TEXTURE_BINDING,
                    )
                    .with_label("source"),
                )
                .unwrap(),
        );
        let scratch = BlurScratch::new(&device, &mut scope, Technique::Vsm, 256).unwrap();
        Fixture {
            blur,
            source,
            scratch,
            _scope: scope,
        }
    }

    fn textures(group: &BindingGroup) -> (String, String) {
        let name = |binding: u32| {
            group
                .entries
                .iter()
                .find(|e| e.binding == binding)
                .and_then(|e| match &e.resource {
                    BoundResource::Texture(t) | BoundResource::StorageTexture(t) => {
                        t.label().map(str::to_string)
                    }
                    _ => None,
                })
                .unwrap()
        };
        (name(0), name(1))
    }

    #[test]
    fn test_dispatch_size() {
        assert_eq!(dispatch_size(2048), 129);
        assert_eq!(dispatch_size(1000), 63);
    }

    #[test]
    fn test_workgroup_size_matches_kernel() {
        let source = shaders::blur_source(Technique::Vsm.desc().render_target_format).unwrap();
        let validated = crate::shader::validate_wgsl(&source, "shadow_blur").unwrap();
        let entry = validated
            .module
            .entry_points
            .iter()
            .find(|e| e.name == shaders::BLUR_ENTRY)
            .unwrap();
        assert_eq!(
            entry.workgroup_size,
            [BLUR_WORKGROUP_SIZE, BLUR_WORKGROUP_SIZE, 1]
        );
    }

    #[test]
    fn test_zero_iterations_passes_source_through() {
        let f = fixture();
        let mut graph = RenderGraph::new();
        let start = graph.add_compute_pass(ComputePass::new(
            "start".into(),
            Arc::clone(&f.blur.material),
        ));
        let output = f.blur.record(&mut graph, start, 0, 0, &f.source, &f.scratch).unwrap();
        assert_eq!(graph.pass_count(), 1);
        assert_eq!(output.last_pass, start);
        assert!(Arc::ptr_eq(&output.texture, &f.source));
    }

    #[test]
    fn test_ping_pong() {
        let f = fixture();
        let mut graph = RenderGraph::new();
        let start = graph.add_compute_pass(ComputePass::new(
            "start".into(),
            Arc::clone(&f.blur.material),
        ));
        let output = f.blur.record(&mut graph, start, 1, 3, &f.source, &f.scratch).unwrap();
        assert_eq!(graph.pass_count(), 1 + 6);
        assert!(Arc::ptr_eq(&output.texture, &f.scratch.vertical));

        let slots = f.blur.slots();
        let phase = |iteration, phase| {
            let slot = slots.blur_descriptor_slot(1, iteration, phase);
            textures(&f.blur.table().group(slot).unwrap())
        };
        let names = |a: &str, b: &str| (a.to_string(), b.to_string());
        assert_eq!(phase(0, BlurPhase::Horizontal), names("source", "blur_horizontal_vsm"));
        assert_eq!(phase(0, BlurPhase::Vertical), names("blur_horizontal_vsm", "blur_vertical_vsm"));
        assert_eq!(phase(2, BlurPhase::Horizontal), names("blur_vertical_vsm", "blur_horizontal_vsm"));
        assert_eq!(phase(2, BlurPhase::Vertical), names("blur_horizontal_vsm", "blur_vertical_vsm"));
    }

    #[test]
    fn test_too_many_iterations() {
        let f = fixture();
        let mut graph = RenderGraph::new();
        let start = graph.add_compute_pass(ComputePass::new(
            "start".into(),
            Arc::clone(&f.blur.material),
        ));
        let err = f.blur.record(&mut graph, start, 0, 9, &f.source, &f.scratch).unwrap_err();
        assert!(matches!(err, GraphicsError::InvalidParameter(_)));
    }
}
