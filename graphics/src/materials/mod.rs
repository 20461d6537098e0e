//! Material system for the graphics engine.
//!
//! - [`Material`] - Shaders, binding layouts and fixed-function state, compiled
//!   into a backend pipeline by [`GraphicsDevice::create_material`]
//! - [`BindingGroup`] - Concrete resources for one binding layout
//! - [`DescriptorTable`] - Fixed-capacity array of binding groups addressed by slot
//!
//! # Sharing via Arc
//!
//! Binding layouts and groups are wrapped in `Arc`. A pass records the `Arc` of
//! the group it binds, so rewriting a table slot later never changes what an
//! already recorded pass reads.
//!
//! [`GraphicsDevice::create_material`]: crate::GraphicsDevice::create_material

mod bindings;
mod group;
mod material;
mod table;

pub use bindings::{BindingLayout, BindingLayoutEntry, BindingType, ShaderStageFlags};
pub use group::{BindingEntry, BindingGroup, BoundResource};
pub use material::{
    CullMode, Material, MaterialDescriptor, RasterState, ShaderSource, ShaderStage,
};
pub use table::DescriptorTable;
