//! Scene shading into the output target.

use std::sync::Arc;

use crate::device::GraphicsDevice;
use crate::error::GraphicsError;
use crate::graph::{
    ColorAttachment, DepthAttachment, GraphicsPass, RenderTarget, RenderTargetConfig,
};
use crate::materials::{
    BindingGroup, BindingLayout, CullMode, DescriptorTable, Material, MaterialDescriptor,
    ShaderSource,
};
use crate::mesh::VertexLayout;
use crate::pipeline::UniformRows;
use crate::resources::{Sampler, Texture};
use crate::types::{ClearValue, CompareFunction, TextureFormat};

use super::descriptors::ObjectTable;
use super::meshes::SceneMeshes;
use super::scene::SceneObjectSet;
use super::scope::ResourceScope;
use super::targets::DEPTH_FORMAT;
use super::technique::Technique;

/// Background of the main pass.
pub const CLEAR_COLOR: [f32; 4] = [0.15, 0.15, 0.15, 1.0];

/// Uniform rows read through the frame table.
#[derive(Debug)]
pub struct FrameRows {
    pub camera: UniformRows,
    pub light: UniformRows,
    pub constants: UniformRows,
}

impl FrameRows {
    /// Group 0 of the main pass for frame slot `slot`, sampling `shadow_map`.
    pub fn frame_group(
        &self,
        slot: usize,
        shadow_map: &Arc<Texture>,
        sampler: &Arc<Sampler>,
    ) -> BindingGroup {
        let row = |binding: u32, rows: &UniformRows| {
            (binding, Arc::clone(rows.buffer()), rows.offset(slot, 0), rows.row_size())
        };
        let mut group = BindingGroup::new();
        for (binding, buffer, offset, size) in [
            row(0, &self.camera),
            row(1, &self.light),
            row(2, &self.constants),
        ] {
            group = group.with_buffer_range(binding, buffer, offset, size);
        }
        group
            .with_texture(3, Arc::clone(shadow_map))
            .with_sampler(4, Arc::clone(sampler))
    }
}

/// Shades every visible object with one technique's visibility function.
#[derive(Debug)]
pub struct MainPass {
    technique: Technique,
    material: Arc<Material>,
}

impl MainPass {
    pub fn new(
        device: &Arc<GraphicsDevice>,
        scope: &mut ResourceScope,
        technique: Technique,
        frame_layout: &Arc<BindingLayout>,
        object_layout: &Arc<BindingLayout>,
        output_format: TextureFormat,
    ) -> Result<Self, GraphicsError> {
        let pair = technique.desc().main_shader_pair;
        let material = scope.adopt(
            device.create_material(
                &MaterialDescriptor::new()
                    .with_shader(ShaderSource::vertex(pair.source, pair.vertex_entry))
                    .with_shader(ShaderSource::fragment(pair.source, pair.fragment_entry))
                    .with_binding_layout(Arc::clone(frame_layout))
                    .with_binding_layout(Arc::clone(object_layout))
                    .with_vertex_layout(VertexLayout::position_normal())
                    .with_color_format(output_format)
                    .with_depth_format(DEPTH_FORMAT)
                    .with_cull_mode(CullMode::Back)
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

    /// Record the pass for `frame`.
    ///
    /// `frame_table` slot `frame` must already hold this frame's group.
    #[allow(clippy::too_many_arguments)]
    pub fn record(
        &self,
        output: RenderTarget,
        depth: &Arc<Texture>,
        frame_table: &Arc<DescriptorTable>,
        objects: &ObjectTable,
        frame: u32,
        scene: &SceneObjectSet,
        meshes: &SceneMeshes,
    ) -> GraphicsPass {
        let mut pass = GraphicsPass::new("main".into(), Arc::clone(&self.material));
        pass.set_render_targets(
            RenderTargetConfig::new()
                .with_color(ColorAttachment::new(output).with_clear(ClearValue::Color(CLEAR_COLOR)))
                .with_depth(
                    DepthAttachment::new(Arc::clone(depth)).with_clear_depth(1.0),
                ),
        );
        pass.bind_table(0, frame_table, frame);
        for (row, object) in scene.visible() {
            pass.add_draw(Arc::clone(meshes.get(object.kind)), vec![objects.bind(frame, row)]);
        }
        pass
    }
}
