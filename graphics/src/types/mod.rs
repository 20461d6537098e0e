//! Plain descriptor types handed to [`GraphicsDevice`](crate::GraphicsDevice).
//!
//! Nothing here owns GPU memory; see [`crate::resources`] for the objects
//! these describe.

mod buffer;
mod common;
mod sampler;
mod texture;

pub use buffer::{BufferDescriptor, BufferUsage};
pub use common::{ClearValue, Extent2d};
pub use sampler::{AddressMode, CompareFunction, FilterMode, SamplerDescriptor};
pub use texture::{TextureDescriptor, TextureFormat, TextureUsage};
