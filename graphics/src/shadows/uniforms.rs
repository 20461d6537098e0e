//! GPU-visible uniform blocks.
//!
//! Layouts mirror the structs declared in the WGSL shaders under `shaders/`.
//! Every block is a multiple of 16 bytes so it can sit in a uniform row as is.

use bytemuck::{Pod, Zeroable};
use penumbra_core::math::{Mat4, UVec2, Vec4};

/// Per-frame camera data.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct CameraUniform {
    pub view_projection: Mat4,
    /// World position, w unused.
    pub position: Vec4,
    /// Output size in pixels in xy.
    pub viewport_size: Vec4,
}

/// Per-frame light data, read by both the shadow and main passes.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct LightUniform {
    pub view_projection: Mat4,
    pub position: Vec4,
    pub direction: Vec4,
    pub ambient: Vec4,
    pub intensity: Vec4,
}

/// Per-object data.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct ObjectUniform {
    pub world: Mat4,
    /// RGB diffuse. `w > 0` means lit, `w == 0` means emissive.
    pub diffuse: Vec4,
    /// RGB specular, shininess in `w`.
    pub specular: Vec4,
}

/// Constant block of the blur kernel, reused by the main pass as shadow map
/// metadata.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Pod, Zeroable)]
pub struct ShadowConstants {
    pub shadow_map_size: UVec2,
    /// 1 for the horizontal phase, 0 for the vertical one.
    pub horizontal_pass: u32,
    pub _padding: u32,
}

impl ShadowConstants {
    pub fn new(size: u32, horizontal_pass: bool) -> Self {
        Self {
            shadow_map_size: UVec2::splat(size),
            horizontal_pass: u32::from(horizontal_pass),
            _padding: 0,
        }
    }
}

static_assertions::const_assert_eq!(std::mem::size_of::<CameraUniform>(), 96);
static_assertions::const_assert_eq!(std::mem::size_of::<LightUniform>(), 128);
static_assertions::const_assert_eq!(std::mem::size_of::<ObjectUniform>(), 96);
static_assertions::const_assert_eq!(std::mem::size_of::<ShadowConstants>(), 16);
