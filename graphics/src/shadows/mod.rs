//! Soft shadows from filtered moment maps.
//!
//! Each frame renders depth moments from the light, blurs them with a
//! separable Gaussian and shades the scene with a visibility term
//! reconstructed from the blurred moments. Two techniques share the driver:
//! variance shadow maps (two moments) and Hamburger moment shadow maps (four
//! quantized moments), see [`Technique`].
//!
//! [`ShadowPipelineContext`] is the entry point:
//!
//! ```ignore
//! let mut context = ShadowPipelineContext::new(&device, config, settings)?;
//! loop {
//!     context.update(delta_time);
//!     let frame = surface.acquire_texture()?;
//!     context.render_frame(RenderTarget::from_surface(&frame))?;
//!     frame.present();
//! }
//! context.shutdown()?;
//! ```

mod blur;
mod camera;
mod context;
mod descriptors;
mod light;
mod main_pass;
mod meshes;
mod scene;
mod scope;
mod settings;
mod shaders;
mod shadow_pass;
mod targets;
mod technique;
mod uniforms;

pub use blur::{BLUR_WORKGROUP_SIZE, BlurOutput, BlurPipeline, dispatch_size};
pub use camera::Camera;
pub use context::{FrameRecord, ShadowPipelineContext};
pub use descriptors::{
    BlurPhase, BlurSlotLayout, ObjectTable, blur_layout, frame_layout, light_layout,
    object_layout, object_slot,
};
pub use light::{AZIMUTH_RANGE, COLOR_RANGE, INCLINATION_RANGE, LightState, RADIUS_RANGE};
pub use main_pass::{CLEAR_COLOR, FrameRows, MainPass};
pub use meshes::SceneMeshes;
pub use scene::{
    LOCATOR_SIZE, ObjectKind, PLANE_POSITION, PLANE_SIZE, SPHERE_COUNT, SceneObject,
    SceneObjectSet, SphereLayout,
};
pub use scope::{ResourceScope, ScopedResource};
pub use settings::{BOUNCE_SPEED_RANGE, MAX_BLUR_COUNT, ShadowPipelineConfig, ShadowSettings};
pub use shaders::{SHADING, SHADOW_BLUR, SHADOW_MAP, blur_source};
pub use shadow_pass::ShadowMapPass;
pub use targets::{BlurScratch, DEPTH_FORMAT, ShadowTarget};
pub use technique::{ShaderPair, Technique, TechniqueDesc};
pub use uniforms::{CameraUniform, LightUniform, ObjectUniform, ShadowConstants};
