//! The shadow pipeline driver.
//!
//! [`ShadowPipelineContext`] owns everything the demo renders with: the frame
//! ring, both techniques' targets and passes, the scene, the camera and the
//! live settings. One call to [`ShadowPipelineContext::render_frame`] records
//! and submits
//!
//! ```text
//! shadow_map ──► blur_horizontal_0 ──► blur_vertical_0 ──► ... ──► main
//! ```
//!
//! into the next frame slot.

use std::sync::Arc;

use crate::device::GraphicsDevice;
use crate::error::GraphicsError;
use crate::graph::{RenderGraph, RenderTarget, ResourceStateTracker};
use crate::materials::DescriptorTable;
use crate::pipeline::{FrameResourceRing, UniformRows};
use crate::resources::{Sampler, Texture};
use crate::sync::Fence;
use crate::types::SamplerDescriptor;

use super::blur::BlurPipeline;
use super::camera::Camera;
use super::descriptors::{
    BlurSlotLayout, ObjectTable, frame_layout, light_layout, object_layout, uniform_row_group,
};
use super::main_pass::{FrameRows, MainPass};
use super::meshes::SceneMeshes;
use super::scene::{SceneObjectSet, SphereLayout};
use super::scope::ResourceScope;
use super::settings::{ShadowPipelineConfig, ShadowSettings};
use super::shadow_pass::ShadowMapPass;
use super::targets::{BlurScratch, ShadowTarget, create_main_depth};
use super::technique::Technique;
use super::uniforms::{CameraUniform, LightUniform, ShadowConstants};

/// Targets and passes of one technique.
#[derive(Debug)]
struct TechniqueResources {
    target: ShadowTarget,
    scratch: BlurScratch,
    shadow_pass: ShadowMapPass,
    blur: BlurPipeline,
    main_pass: MainPass,
}

/// What one call to [`ShadowPipelineContext::render_frame`] submitted.
#[derive(Debug, Clone)]
pub struct FrameRecord {
    /// Frame slot the frame was recorded into.
    pub slot: usize,
    /// 1-based count of frames started.
    pub frame_number: u64,
    pub technique: Technique,
    pub blur_count: u32,
    /// The texture the main pass sampled as its shadow map.
    pub shadow_source: Arc<Texture>,
    pub pass_count: usize,
    pub barrier_count: usize,
    /// Signals when the GPU has finished the frame.
    pub fence: Fence,
}

/// Soft-shadow renderer state.
pub struct ShadowPipelineContext {
    /// First field: dropped, and so released, before everything else.
    scope: ResourceScope,
    device: Arc<GraphicsDevice>,
    config: ShadowPipelineConfig,
    settings: ShadowSettings,
    ring: FrameResourceRing,
    tracker: ResourceStateTracker,
    camera: Camera,
    scene: SceneObjectSet,
    meshes: SceneMeshes,
    objects: ObjectTable,
    frame_rows: FrameRows,
    light_table: Arc<DescriptorTable>,
    frame_table: Arc<DescriptorTable>,
    sampler: Arc<Sampler>,
    techniques: [Option<TechniqueResources>; 2],
    main_depth: Arc<Texture>,
}

impl ShadowPipelineContext {
    /// Build every GPU object of both techniques.
    ///
    /// MSM is skipped with a warning when the device cannot write
    /// `Rgba16Unorm` storage textures. VSM is required.
    pub fn new(
        device: &Arc<GraphicsDevice>,
        config: ShadowPipelineConfig,
        settings: ShadowSettings,
    ) -> Result<Self, GraphicsError> {
        let capabilities = *device.capabilities();
        config
            .validate(capabilities.max_texture_dimension_2d)
            .map_err(GraphicsError::InvalidParameter)?;

        let scene = SceneObjectSet::new(config.seed, &SphereLayout::grid());
        if scene.len() > config.object_capacity as usize {
            return Err(GraphicsError::InvalidParameter(format!(
                "scene has {} objects, capacity is {}",
                scene.len(),
                config.object_capacity
            )));
        }

        let frames = config.frames_in_flight;
        let mut scope = ResourceScope::new(device);

        let meshes = SceneMeshes::new(device, &mut scope)?;
        let objects = ObjectTable::new(device, &mut scope, frames, config.object_capacity)?;

        let mut rows = |label: &str, size: usize| -> Result<UniformRows, GraphicsError> {
            let rows = UniformRows::new(device, label, size as u64, 1, frames)?;
            scope.adopt(Arc::clone(rows.buffer()));
            Ok(rows)
        };
        let frame_rows = FrameRows {
            camera: rows("camera", std::mem::size_of::<CameraUniform>())?,
            light: rows("light", std::mem::size_of::<LightUniform>())?,
            constants: rows("shadow_constants", std::mem::size_of::<ShadowConstants>())?,
        };

        let light_layout = light_layout();
        let object_layout = object_layout();
        let frame_layout = frame_layout();

        let light_table = scope.adopt(device.create_descriptor_table(
            Arc::clone(&light_layout),
            frames,
            Some("light"),
        ));
        for frame in 0..frames {
            light_table.write(
                frame,
                Arc::new(uniform_row_group(&frame_rows.light, frame as usize, 0)),
            );
        }
        let frame_table = scope.adopt(device.create_descriptor_table(
            Arc::clone(&frame_layout),
            frames,
            Some("frame"),
        ));
        let sampler = scope.adopt(
            device.create_sampler(&SamplerDescriptor::nearest().with_label("shadow_sampler"))?,
        );

        let slots = BlurSlotLayout::new(config.max_blurs, frames);
        let mut techniques = [None, None];
        for technique in Technique::ALL {
            let format = technique.desc().render_target_format;
            if !capabilities.supports_storage(format) {
                if technique == Technique::Vsm {
                    return Err(GraphicsError::FeatureNotSupported(format!(
                        "{format:?} storage textures"
                    )));
                }
                log::warn!("{technique} disabled: device cannot write {format:?} storage textures");
                continue;
            }

            let size = config.shadow_map_size;
            let target = ShadowTarget::new(device, &mut scope, technique, size)?;
            let scratch = BlurScratch::new(device, &mut scope, technique, size)?;
            let shadow_pass =
                ShadowMapPass::new(device, &mut scope, technique, &light_layout, &object_layout)?;
            let blur = BlurPipeline::new(device, &mut scope, technique, slots)?;
            let main_pass = MainPass::new(
                device,
                &mut scope,
                technique,
                &frame_layout,
                &object_layout,
                config.output_format,
            )?;
            techniques[technique.index()] = Some(TechniqueResources {
                target,
                scratch,
                shadow_pass,
                blur,
                main_pass,
            });
        }

        let main_depth = scope.adopt(create_main_depth(
            device,
            config.output_width.max(1),
            config.output_height.max(1),
        )?);

        log::info!(
            "Shadow pipeline loaded: {}x{} shadow map, {} frames in flight, {} objects, {} GPU objects",
            config.shadow_map_size,
            config.shadow_map_size,
            frames,
            scene.len(),
            scope.len()
        );

        let mut context = Self {
            scope,
            device: Arc::clone(device),
            ring: FrameResourceRing::new(device, frames as usize),
            tracker: ResourceStateTracker::new(),
            camera: Camera::fixed(config.output_width, config.output_height),
            config,
            settings: ShadowSettings::default(),
            scene,
            meshes,
            objects,
            frame_rows,
            light_table,
            frame_table,
            sampler,
            techniques,
            main_depth,
        };
        let technique = settings.technique;
        context.settings = settings;
        context.set_technique(technique);
        Ok(context)
    }

    pub fn device(&self) -> &Arc<GraphicsDevice> {
        &self.device
    }

    pub fn config(&self) -> &ShadowPipelineConfig {
        &self.config
    }

    pub fn settings(&self) -> &ShadowSettings {
        &self.settings
    }

    /// Live parameters. A technique set here that is unavailable renders as
    /// VSM; prefer [`Self::set_technique`].
    pub fn settings_mut(&mut self) -> &mut ShadowSettings {
        &mut self.settings
    }

    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    pub fn scene(&self) -> &SceneObjectSet {
        &self.scene
    }

    pub fn ring(&self) -> &FrameResourceRing {
        &self.ring
    }

    pub fn frame_table(&self) -> &Arc<DescriptorTable> {
        &self.frame_table
    }

    pub fn main_depth(&self) -> &Arc<Texture> {
        &self.main_depth
    }

    /// Whether `technique` was built on this device.
    pub fn is_available(&self, technique: Technique) -> bool {
        self.techniques[technique.index()].is_some()
    }

    /// The shadow target and blur scratch of `technique`, if it is available.
    pub fn targets(&self, technique: Technique) -> Option<(&ShadowTarget, &BlurScratch)> {
        self.techniques[technique.index()]
            .as_ref()
            .map(|r| (&r.target, &r.scratch))
    }

    /// The technique the next frame renders with.
    pub fn active_technique(&self) -> Technique {
        if self.is_available(self.settings.technique) {
            self.settings.technique
        } else {
            Technique::Vsm
        }
    }

    /// Switch technique. Returns the technique now in use.
    ///
    /// Both techniques are built at load, so switching rebuilds nothing.
    pub fn set_technique(&mut self, technique: Technique) -> Technique {
        if !self.is_available(technique) {
            log::warn!("{technique} is not available, staying on {}", self.active_technique());
            return self.active_technique();
        }
        if self.settings.technique != technique {
            log::info!("Shadow technique: {technique}");
        }
        self.settings.technique = technique;
        technique
    }

    /// Advance the scene by `delta_time` seconds.
    pub fn update(&mut self, delta_time: f32) {
        self.scene.update(
            delta_time,
            self.settings.bounce_speed(),
            &self.settings.light,
        );
    }

    /// Record and submit one frame rendering into `output`.
    ///
    /// Blocks while the next frame slot is still in use by the GPU. If the
    /// output size differs from the current viewport the context resizes
    /// first.
    ///
    /// # Errors
    ///
    /// [`GraphicsError::DeviceLost`] when the device is lost while waiting on
    /// the slot or submitting. Texture states are only committed once the
    /// submission succeeds; a failed frame still counts as started.
    pub fn render_frame(&mut self, output: RenderTarget) -> Result<FrameRecord, GraphicsError> {
        if output.format() != self.config.output_format {
            return Err(GraphicsError::InvalidParameter(format!(
                "output format {:?}, pipeline built for {:?}",
                output.format(),
                self.config.output_format
            )));
        }
        let extent = output.extent();
        if (extent.width, extent.height) != self.camera.viewport() {
            self.resize(extent.width, extent.height)?;
        }

        let technique = self.active_technique();
        let blur_count = self.settings.blur_count().min(self.config.max_blurs);
        let slot = self.ring.begin_frame()?;
        let frame = slot as u32;

        let Some(resources) = self.techniques[technique.index()].as_ref() else {
            return Err(GraphicsError::Internal(format!("{technique} has no resources")));
        };

        self.frame_rows.camera.write(slot, 0, &self.camera.uniform())?;
        self.frame_rows.light.write(slot, 0, &self.settings.light.uniform())?;
        self.frame_rows.constants.write(
            slot,
            0,
            &ShadowConstants::new(resources.target.size(), false),
        )?;
        for (row, object) in self.scene.objects().iter().enumerate() {
            self.objects.write(slot, row as u32, &object.uniform())?;
        }

        let mut graph = RenderGraph::new();
        let shadow = graph.add_graphics_pass(resources.shadow_pass.record(
            &resources.target,
            &self.light_table,
            &self.objects,
            frame,
            &self.scene,
            &self.meshes,
        ));
        let blurred = resources.blur.record(
            &mut graph,
            shadow,
            frame,
            blur_count,
            &resources.target.color,
            &resources.scratch,
        )?;

        self.frame_table.write(
            frame,
            Arc::new(
                self.frame_rows
                    .frame_group(slot, &blurred.texture, &self.sampler),
            ),
        );
        let main = graph.add_graphics_pass(resources.main_pass.record(
            output,
            &self.main_depth,
            &self.frame_table,
            &self.objects,
            frame,
            &self.scene,
            &self.meshes,
        ));
        graph.add_dependency(main, blurred.last_pass);

        let mut tracker = self.tracker.clone();
        let compiled = graph.compile(&mut tracker)?;
        let pass_count = compiled.pass_count();
        let barrier_count = compiled.barrier_count();
        log::trace!(
            "Frame {} ({technique}, {blur_count} blurs): {pass_count} passes, {barrier_count} barriers",
            self.ring.frame_count()
        );
        let fence = self.ring.end_frame(graph, compiled)?;
        self.tracker = tracker;

        Ok(FrameRecord {
            slot,
            frame_number: self.ring.frame_count(),
            technique,
            blur_count,
            shadow_source: blurred.texture,
            pass_count,
            barrier_count,
            fence,
        })
    }

    /// Drain the GPU and return the ring to slot 0, then run `rebuild`.
    pub fn rebuild_swapchain<F>(&mut self, rebuild: F) -> Result<(), GraphicsError>
    where
        F: FnOnce() -> Result<(), GraphicsError>,
    {
        self.device.wait_idle()?;
        self.ring.wait_idle()?;
        self.ring.reset();
        rebuild()
    }

    /// Toggle vsync. `reconfigure` applies the new present mode to the
    /// surface once the GPU is idle.
    pub fn set_vsync<F>(&mut self, vsync: bool, reconfigure: F) -> Result<(), GraphicsError>
    where
        F: FnOnce(bool) -> Result<(), GraphicsError>,
    {
        if self.settings.vsync == vsync {
            return Ok(());
        }
        self.rebuild_swapchain(|| reconfigure(vsync))?;
        self.settings.vsync = vsync;
        log::info!("VSync {}", if vsync { "on" } else { "off" });
        Ok(())
    }

    /// Follow an output resize: recreate the main depth target and update the
    /// camera aspect.
    pub fn resize(&mut self, width: u32, height: u32) -> Result<(), GraphicsError> {
        let (width, height) = (width.max(1), height.max(1));
        if (width, height) == self.camera.viewport() {
            return Ok(());
        }
        self.rebuild_swapchain(|| Ok(()))?;

        let depth = create_main_depth(&self.device, width, height)?;
        self.tracker.forget(self.main_depth.id());
        self.main_depth = self.scope.replace(&self.main_depth, depth);
        self.camera.set_viewport(width, height);
        log::info!("Shadow pipeline resized to {width}x{height}");
        Ok(())
    }

    /// Wait for the GPU to drain, then release every GPU object in reverse
    /// creation order.
    pub fn shutdown(mut self) -> Result<(), GraphicsError> {
        self.ring.wait_idle()?;
        self.scope.release_all()?;
        log::info!("Shadow pipeline unloaded");
        Ok(())
    }
}

impl std::fmt::Debug for ShadowPipelineContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ShadowPipelineContext")
            .field("config", &self.config)
            .field("settings", &self.settings)
            .field("frame_count", &self.ring.frame_count())
            .field("objects", &self.scene.len())
            .field("scope", &self.scope)
            .finish()
    }
}
