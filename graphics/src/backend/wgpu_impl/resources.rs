//! Resource creation for the wgpu backend.

use std::sync::Arc;
use std::sync::atomic::AtomicBool;

use crate::error::GraphicsError;
use crate::materials::{BindingLayout, MaterialDescriptor, ShaderStage};
use crate::types::{BufferDescriptor, SamplerDescriptor, TextureDescriptor};

use super::super::{GpuBuffer, GpuFence, GpuPipeline, GpuSampler, GpuTexture, ReleaseHandle};
use super::WgpuBackend;
use super::conversion::{
    convert_address_mode, convert_binding_type, convert_buffer_usage, convert_compare_function,
    convert_cull_mode, convert_filter_mode, convert_shader_stages, convert_texture_format,
    convert_texture_usage, convert_topology, convert_vertex_format,
};

impl WgpuBackend {
    /// Create a buffer resource.
    pub fn create_buffer(&self, descriptor: &BufferDescriptor) -> Result<GpuBuffer, GraphicsError> {
        let buffer = self.device.create_buffer(&wgpu::BufferDescriptor {
            label: descriptor.label.as_deref(),
            size: descriptor.size,
            usage: convert_buffer_usage(descriptor.usage),
            mapped_at_creation: false,
        });

        Ok(GpuBuffer::Wgpu(Arc::new(buffer)))
    }

    /// Create a 2D texture and its default view.
    pub fn create_texture(
        &self,
        descriptor: &TextureDescriptor,
    ) -> Result<GpuTexture, GraphicsError> {
        let texture = self.device.create_texture(&wgpu::TextureDescriptor {
            label: descriptor.label.as_deref(),
            size: wgpu::Extent3d {
                width: descriptor.size.width,
                height: descriptor.size.height,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: convert_texture_format(descriptor.format),
            usage: convert_texture_usage(descriptor.usage),
            view_formats: &[],
        });

        let view = texture.create_view(&wgpu::TextureViewDescriptor {
            dimension: Some(wgpu::TextureViewDimension::D2),
            ..Default::default()
        });

        Ok(GpuTexture::Wgpu {
            texture: Arc::new(texture),
            view: Arc::new(view),
        })
    }

    /// Create a sampler resource.
    pub fn create_sampler(
        &self,
        descriptor: &SamplerDescriptor,
    ) -> Result<GpuSampler, GraphicsError> {
        let sampler = self.device.create_sampler(&wgpu::SamplerDescriptor {
            label: descriptor.label.as_deref(),
            address_mode_u: convert_address_mode(descriptor.address_mode_u),
            address_mode_v: convert_address_mode(descriptor.address_mode_v),
            address_mode_w: convert_address_mode(descriptor.address_mode_u),
            mag_filter: convert_filter_mode(descriptor.mag_filter),
            min_filter: convert_filter_mode(descriptor.min_filter),
            mipmap_filter: wgpu::MipmapFilterMode::Nearest,
            lod_min_clamp: 0.0,
            lod_max_clamp: 32.0,
            compare: None,
            anisotropy_clamp: 1,
            border_color: None,
        });

        Ok(GpuSampler::Wgpu(Arc::new(sampler)))
    }

    fn create_bind_group_layouts(
        &self,
        layouts: &[Arc<BindingLayout>],
    ) -> Vec<wgpu::BindGroupLayout> {
        layouts
            .iter()
            .map(|layout| {
                let entries: Vec<wgpu::BindGroupLayoutEntry> = layout
                    .entries
                    .iter()
                    .map(|entry| wgpu::BindGroupLayoutEntry {
                        binding: entry.binding,
                        visibility: convert_shader_stages(entry.visibility),
                        ty: convert_binding_type(entry.binding_type),
                        count: None,
                    })
                    .collect();
                self.device
                    .create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                        label: layout.label.as_deref(),
                        entries: &entries,
                    })
            })
            .collect()
    }

    fn create_shader_module(
        &self,
        label: Option<&str>,
        source: &str,
    ) -> wgpu::ShaderModule {
        self.device
            .create_shader_module(wgpu::ShaderModuleDescriptor {
                label,
                source: wgpu::ShaderSource::Wgsl(source.into()),
            })
    }

    /// Create a GPU pipeline from a material descriptor.
    ///
    /// Graphics materials get a render pipeline, single compute shader
    /// materials a compute pipeline. The bind group layouts are kept with the
    /// pipeline so bind groups can be built against them at encode time.
    pub fn create_pipeline(
        &self,
        descriptor: &MaterialDescriptor,
    ) -> Result<GpuPipeline, GraphicsError> {
        if descriptor.is_compute() {
            return self.create_compute_pipeline(descriptor);
        }

        let label = descriptor.label.as_deref();
        let Some(vertex) = descriptor.shader(ShaderStage::Vertex) else {
            return Err(GraphicsError::ShaderCompilationFailed(
                "No vertex shader provided".into(),
            ));
        };
        let vertex_module = self.create_shader_module(label, &vertex.source);
        let fragment = descriptor.shader(ShaderStage::Fragment);
        let fragment_module = fragment
            .map(|f| self.create_shader_module(label, &f.source));

        let Some(layout) = descriptor.vertex_layout.as_ref() else {
            return Err(GraphicsError::InvalidParameter(format!(
                "graphics material {label:?} has no vertex layout"
            )));
        };
        let vertex_attrs: Vec<wgpu::VertexAttribute> = layout
            .attributes()
            .iter()
            .map(|attr| wgpu::VertexAttribute {
                format: convert_vertex_format(attr.format),
                offset: u64::from(attr.offset),
                shader_location: attr.location,
            })
            .collect();
        let vertex_buffers = [wgpu::VertexBufferLayout {
            array_stride: u64::from(layout.stride()),
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &vertex_attrs,
        }];

        let bind_group_layouts = self.create_bind_group_layouts(&descriptor.binding_layouts);
        let pipeline_layout = {
            let refs: Vec<&wgpu::BindGroupLayout> = bind_group_layouts.iter().collect();
            self.device
                .create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
                    label: Some("Material Pipeline Layout"),
                    bind_group_layouts: &refs,
                    immediate_size: 0,
                })
        };

        let color_targets: Vec<Option<wgpu::ColorTargetState>> = descriptor
            .color_formats
            .iter()
            .map(|format| {
                Some(wgpu::ColorTargetState {
                    format: convert_texture_format(*format),
                    // Moment targets (Rg32Float) are not blendable.
                    blend: None,
                    write_mask: wgpu::ColorWrites::ALL,
                })
            })
            .collect();

        let pipeline = self
            .device
            .create_render_pipeline(&wgpu::RenderPipelineDescriptor {
                label,
                layout: Some(&pipeline_layout),
                vertex: wgpu::VertexState {
                    module: &vertex_module,
                    entry_point: Some(&vertex.entry_point),
                    buffers: &vertex_buffers,
                    compilation_options: wgpu::PipelineCompilationOptions::default(),
                },
                fragment: fragment_module
                    .as_ref()
                    .zip(fragment)
                    .map(|(module, shader)| wgpu::FragmentState {
                        module,
                        entry_point: Some(&shader.entry_point),
                        targets: &color_targets,
                        compilation_options: wgpu::PipelineCompilationOptions::default(),
                    }),
                primitive: wgpu::PrimitiveState {
                    topology: convert_topology(descriptor.raster.topology),
                    strip_index_format: None,
                    front_face: wgpu::FrontFace::Ccw,
                    cull_mode: convert_cull_mode(descriptor.raster.cull_mode),
                    polygon_mode: wgpu::PolygonMode::Fill,
                    unclipped_depth: false,
                    conservative: false,
                },
                depth_stencil: descriptor
                    .depth_format
                    .map(|format| wgpu::DepthStencilState {
                        format: convert_texture_format(format),
                        depth_write_enabled: true,
                        depth_compare: convert_compare_function(descriptor.raster.depth_compare),
                        stencil: wgpu::StencilState::default(),
                        bias: wgpu::DepthBiasState::default(),
                    }),
                multisample: wgpu::MultisampleState::default(),
                multiview_mask: None,
                cache: None,
            });

        Ok(GpuPipeline::WgpuGraphics {
            pipeline,
            bind_group_layouts,
        })
    }

    fn create_compute_pipeline(
        &self,
        descriptor: &MaterialDescriptor,
    ) -> Result<GpuPipeline, GraphicsError> {
        let label = descriptor.label.as_deref();
        let Some(compute) = descriptor.shader(ShaderStage::Compute) else {
            return Err(GraphicsError::ShaderCompilationFailed(
                "No compute shader provided".into(),
            ));
        };
        let module = self.create_shader_module(label, &compute.source);

        let bind_group_layouts = self.create_bind_group_layouts(&descriptor.binding_layouts);
        let pipeline_layout = {
            let refs: Vec<&wgpu::BindGroupLayout> = bind_group_layouts.iter().collect();
            self.device
                .create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
                    label: Some("Compute Pipeline Layout"),
                    bind_group_layouts: &refs,
                    immediate_size: 0,
                })
        };

        let pipeline = self
            .device
            .create_compute_pipeline(&wgpu::ComputePipelineDescriptor {
                label,
                layout: Some(&pipeline_layout),
                module: &module,
                entry_point: Some(&compute.entry_point),
                compilation_options: wgpu::PipelineCompilationOptions::default(),
                cache: None,
            });

        Ok(GpuPipeline::WgpuCompute {
            pipeline,
            bind_group_layouts,
        })
    }

    /// Create a fence for CPU-GPU synchronization.
    ///
    /// wgpu tracks submissions rather than binary fences. The fence carries
    /// the submission index once [`WgpuBackend::execute_graph`] stores it,
    /// and a flag set from `Queue::on_submitted_work_done`.
    pub fn create_fence(&self, signaled: bool) -> GpuFence {
        GpuFence::Wgpu {
            device: Arc::clone(&self.device),
            completed: Arc::new(AtomicBool::new(signaled)),
            submission_index: parking_lot::Mutex::new(None),
        }
    }

    /// Write data to a buffer through the queue.
    pub fn write_buffer(
        &self,
        buffer: &GpuBuffer,
        offset: u64,
        data: &[u8],
    ) -> Result<(), GraphicsError> {
        if let GpuBuffer::Wgpu(wgpu_buffer) = buffer {
            self.queue.write_buffer(wgpu_buffer, offset, data);
            Ok(())
        } else {
            Err(GraphicsError::Internal(
                "write_buffer called with non-Wgpu buffer".to_string(),
            ))
        }
    }

    /// Destroy the GPU memory behind a buffer or texture now.
    pub(crate) fn release(&self, handle: ReleaseHandle<'_>) {
        match handle {
            ReleaseHandle::Buffer(GpuBuffer::Wgpu(buffer)) => buffer.destroy(),
            ReleaseHandle::Texture(GpuTexture::Wgpu { texture, .. }) => texture.destroy(),
            _ => {}
        }
    }
}
