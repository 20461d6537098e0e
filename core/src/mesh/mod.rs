//! CPU-side mesh types and generators.
//!
//! - [`VertexLayout`] - Describes the attributes of an interleaved vertex buffer
//! - [`CpuMesh`] - CPU-side mesh data (vertex bytes, vertex count, layout)
//! - Generators for the shapes the shadow demo draws (sphere, cuboid)
//!
//! These types are re-exported by `penumbra-graphics` for convenience.

mod data;
pub mod generators;
mod layout;

pub use data::{CpuMesh, PrimitiveTopology};
pub use generators::VertexPN;
pub use layout::{VertexAttribute, VertexAttributeFormat, VertexAttributeSemantic, VertexLayout};
