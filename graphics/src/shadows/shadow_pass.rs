//! Moment emission from the light's point of view.

use std::sync::Arc;

use crate::device::GraphicsDevice;
use crate::error::GraphicsError;
use crate::graph::{ColorAttachment, DepthAttachment, GraphicsPass, RenderTargetConfig};
use crate::materials::{
    BindingLayout, CullMode, DescriptorTable, Material, MaterialDescriptor, ShaderSource,
};
use crate::mesh::VertexLayout;
use crate::types::{ClearValue, CompareFunction};

use super::descriptors::ObjectTable;
use super::meshes::SceneMeshes;
use super::scene::SceneObjectSet;
use super::scope::ResourceScope;
use super::targets::{DEPTH_FORMAT, ShadowTarget};
use super::technique::Technique;

/// Renders every shadow caster into a technique's moment target.
///
/// Front faces are culled so the stored depth comes from back faces, which
/// keeps lit surfaces from shadowing themselves.
#[derive(Debug)]
pub struct ShadowMapPass {
    technique: Technique,
    material: Arc<Material>,
}

impl ShadowMapPass {
    pub fn new(
        device: &Arc<GraphicsDevice>,
        scope: &mut ResourceScope,
        technique: Technique,
        light_layout: &Arc<BindingLayout>,
        object_layout: &Arc<BindingLayout>,
    ) -> Result<Self, GraphicsError> {
        let desc = technique.desc();
        let pair = desc.shadow_shader_pair;
        let material = scope.adopt(
            device.create_material(
                &MaterialDescriptor::new()
                    .with_shader(ShaderSource::vertex(pair.source, pair.vertex_entry))
                    .with_shader(ShaderSource::fragment(pair.source, pair.fragment_entry))
                    .with_binding_layout(Arc::clone(light_layout))
                    .with_binding_layout(Arc::clone(object_layout))
                    .with_vertex_layout(VertexLayout::position_only())
                    .with_color_format(desc.render_target_format)
                    .with_depth_format(DEPTH_FORMAT)
                    .with_cull_mode(CullMode::Front)
                    .with_depth_compare(CompareFunction::LessEqual)
                    .with_label(pair.label),
            )?,
        );
        Ok(Self {
            technique,
            material,
        })
    }

    pub fn technique(&self) -> Technique {
        self.technique
    }

    pub fn material(&self) -> &Arc<Material> {
        &self.material
    }

    /// Record the pass for `frame`.
    ///
    /// The moment target clears to zero and the depth to 1. The light is
    /// bound from `light_table` slot `frame`.
    pub fn record(
        &self,
        target: &ShadowTarget,
        light_table: &Arc<DescriptorTable>,
        objects: &ObjectTable,
        frame: u32,
        scene: &SceneObjectSet,
        meshes: &SceneMeshes,
    ) -> GraphicsPass {
        let mut pass = GraphicsPass::new("shadow_map".into(), Arc::clone(&self.material));
        pass.set_render_targets(
            RenderTargetConfig::new()
                .with_color(
                    ColorAttachment::from_texture(Arc::clone(&target.color))
                        .with_clear(ClearValue::ZERO_COLOR),
                )
                .with_depth(
                    DepthAttachment::new(Arc::clone(&target.depth))
                        .with_clear_depth(1.0),
                ),
        );
        pass.bind_table(0, light_table, frame);
        for (row, object) in scene.casters() {
            pass.add_draw(Arc::clone(meshes.get(object.kind)), vec![objects.bind(frame, row)]);
        }
        pass
    }
}
