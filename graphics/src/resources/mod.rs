//! Device-owned GPU objects.
//!
//! Each object keeps its [`GraphicsDevice`](crate::GraphicsDevice) alive and is
//! shared behind an `Arc`. The shadow pipeline hands every one of them to a
//! [`ResourceScope`](crate::shadows::ResourceScope) so teardown order is explicit.
//! Textures carry a [`TextureId`] that keys resource-state tracking.

mod buffer;
mod sampler;
mod texture;

pub use buffer::Buffer;
pub use sampler::Sampler;
pub use texture::{Texture, TextureId};
