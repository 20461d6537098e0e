//! Pass encoding for the wgpu backend.
//!
//! Pipelines are built when a material is created. Bind groups are built
//! here, at encode time, from the binding group snapshots the passes hold.

use std::num::NonZeroU64;

use crate::error::GraphicsError;
use crate::graph::{BoundTable, ComputePass, GraphicsPass, Pass, RenderTarget};
use crate::materials::{BindingGroup, BoundResource};
use crate::types::Extent2d;

use super::super::{GpuBuffer, GpuPipeline, GpuSampler, GpuTexture};
use super::WgpuBackend;
use super::conversion::{convert_depth_load_op, convert_load_op, convert_store_op};

impl WgpuBackend {
    pub(super) fn encode_pass(
        &self,
        encoder: &mut wgpu::CommandEncoder,
        pass: &Pass,
    ) -> Result<(), GraphicsError> {
        match pass {
            Pass::Graphics(graphics_pass) => self.encode_graphics_pass(encoder, graphics_pass),
            Pass::Compute(compute_pass) => self.encode_compute_pass(encoder, compute_pass),
        }
    }

    fn create_bind_group(
        &self,
        layout: &wgpu::BindGroupLayout,
        group: &BindingGroup,
    ) -> Result<wgpu::BindGroup, GraphicsError> {
        let mut entries = Vec::with_capacity(group.entries.len());
        for entry in &group.entries {
            let resource = match &entry.resource {
                BoundResource::Buffer {
                    buffer,
                    offset,
                    size,
                } => {
                    let GpuBuffer::Wgpu(wgpu_buffer) = buffer.gpu_handle() else {
                        return Err(GraphicsError::Internal(
                            "non-wgpu buffer bound on wgpu backend".to_string(),
                        ));
                    };
                    wgpu::BindingResource::Buffer(wgpu::BufferBinding {
                        buffer: wgpu_buffer,
                        offset: *offset,
                        size: NonZeroU64::new(*size),
                    })
                }
                BoundResource::Texture(texture) | BoundResource::StorageTexture(texture) => {
                    let GpuTexture::Wgpu { view, .. } = texture.gpu_handle() else {
                        return Err(GraphicsError::Internal(
                            "non-wgpu texture bound on wgpu backend".to_string(),
                        ));
                    };
                    wgpu::BindingResource::TextureView(view)
                }
                BoundResource::Sampler(sampler) => {
                    let GpuSampler::Wgpu(wgpu_sampler) = sampler.gpu_handle() else {
                        return Err(GraphicsError::Internal(
                            "non-wgpu sampler bound on wgpu backend".to_string(),
                        ));
                    };
                    wgpu::BindingResource::Sampler(wgpu_sampler)
                }
            };
            entries.push(wgpu::BindGroupEntry {
                binding: entry.binding,
                resource,
            });
        }

        Ok(self.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: group.label.as_deref(),
            layout,
            entries: &entries,
        }))
    }

    fn create_bind_groups(
        &self,
        layouts: &[wgpu::BindGroupLayout],
        bindings: &[BoundTable],
    ) -> Result<Vec<(u32, wgpu::BindGroup)>, GraphicsError> {
        bindings
            .iter()
            .map(|binding| {
                let layout = layouts.get(binding.group_index as usize).ok_or_else(|| {
                    GraphicsError::Internal(format!(
                        "no bind group layout at index {}",
                        binding.group_index
                    ))
                })?;
                Ok((
                    binding.group_index,
                    self.create_bind_group(layout, &binding.group)?,
                ))
            })
            .collect()
    }

    fn encode_graphics_pass(
        &self,
        encoder: &mut wgpu::CommandEncoder,
        pass: &GraphicsPass,
    ) -> Result<(), GraphicsError> {
        let Some(render_targets) = pass.render_targets() else {
            return Ok(());
        };

        let GpuPipeline::WgpuGraphics {
            pipeline,
            bind_group_layouts,
        } = pass.material().gpu_handle()
        else {
            log::warn!("Material has no wgpu graphics pipeline");
            return Ok(());
        };

        let mut color_attachments = Vec::with_capacity(render_targets.color_attachments.len());
        for attachment in &render_targets.color_attachments {
            let view = match &attachment.target {
                RenderTarget::Texture(texture) => match texture.gpu_handle() {
                    GpuTexture::Wgpu { view, .. } => Some(view.as_ref()),
                    GpuTexture::Dummy => None,
                },
                RenderTarget::Surface { view, .. } => {
                    if view.is_none() {
                        log::warn!(
                            "Pass '{}' has surface attachment but no texture view available",
                            pass.name()
                        );
                    }
                    view.as_ref().map(|v| v.view())
                }
            };
            color_attachments.push(view.map(|view| wgpu::RenderPassColorAttachment {
                view,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: convert_load_op(&attachment.load_op),
                    store: convert_store_op(&attachment.store_op),
                },
                depth_slice: None,
            }));
        }

        let depth_stencil_attachment = match &render_targets.depth_attachment {
            Some(attachment) => match attachment.texture.gpu_handle() {
                GpuTexture::Wgpu { view, .. } => Some(wgpu::RenderPassDepthStencilAttachment {
                    view,
                    depth_ops: Some(wgpu::Operations {
                        load: convert_depth_load_op(&attachment.load_op),
                        store: convert_store_op(&attachment.store_op),
                    }),
                    stencil_ops: None,
                }),
                GpuTexture::Dummy => {
                    return Err(GraphicsError::Internal(format!(
                        "pass {} has a depth attachment without a wgpu texture",
                        pass.name()
                    )));
                }
            },
            None => None,
        };

        // wgpu requires at least one attachment
        if color_attachments.iter().all(Option::is_none) && depth_stencil_attachment.is_none() {
            return Ok(());
        }

        let pass_groups = self.create_bind_groups(bind_group_layouts, pass.bindings())?;

        let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some(pass.name()),
            color_attachments: &color_attachments,
            depth_stencil_attachment,
            timestamp_writes: None,
            occlusion_query_set: None,
            multiview_mask: None,
        });

        if let Some(Extent2d { width, height }) = render_targets.extent() {
            render_pass.set_viewport(0.0, 0.0, width as f32, height as f32, 0.0, 1.0);
            render_pass.set_scissor_rect(0, 0, width, height);
        }

        render_pass.set_pipeline(pipeline);
        for (index, group) in &pass_groups {
            render_pass.set_bind_group(*index, group, &[]);
        }

        for draw in pass.draws() {
            let draw_groups = self.create_bind_groups(bind_group_layouts, &draw.bindings)?;
            for (index, group) in &draw_groups {
                render_pass.set_bind_group(*index, group, &[]);
            }

            let GpuBuffer::Wgpu(vertex_buffer) = draw.mesh.vertex_buffer().gpu_handle() else {
                continue;
            };
            render_pass.set_vertex_buffer(0, vertex_buffer.slice(..));
            render_pass.draw(0..draw.mesh.vertex_count(), 0..1);
        }

        Ok(())
    }

    fn encode_compute_pass(
        &self,
        encoder: &mut wgpu::CommandEncoder,
        pass: &ComputePass,
    ) -> Result<(), GraphicsError> {
        let GpuPipeline::WgpuCompute {
            pipeline,
            bind_group_layouts,
        } = pass.material().gpu_handle()
        else {
            log::warn!("Material has no wgpu compute pipeline");
            return Ok(());
        };

        let mut compute_pass = encoder.begin_compute_pass(&wgpu::ComputePassDescriptor {
            label: Some(pass.name()),
            timestamp_writes: None,
        });
        compute_pass.set_pipeline(pipeline);

        for dispatch in pass.dispatches() {
            let groups = self.create_bind_groups(bind_group_layouts, &dispatch.bindings)?;
            for (index, group) in &groups {
                compute_pass.set_bind_group(*index, group, &[]);
            }
            let [x, y, z] = dispatch.workgroups;
            compute_pass.dispatch_workgroups(x, y, z);
        }

        Ok(())
    }
}
