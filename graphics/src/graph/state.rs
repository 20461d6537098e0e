//! Texture resource states and the barriers between them.
//!
//! A [`ResourceStateTracker`] remembers the last state each texture was left in,
//! across frames. The graph compiler consults it for every texture a pass uses
//! and emits a [`TextureBarrier`] only when the required state differs from
//! the tracked one.

use std::collections::HashMap;

use crate::resources::TextureId;

/// The role a texture currently plays on the GPU.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ResourceState {
    /// Never used, contents undefined.
    #[default]
    Undefined,
    /// Color attachment of a render pass.
    RenderTarget,
    /// Depth attachment of a render pass.
    DepthWrite,
    /// Sampled in a shader.
    ShaderResource,
    /// Written as a storage texture in a compute shader.
    UnorderedAccess,
    /// Handed to the presentation engine.
    Present,
}

impl ResourceState {
    /// Whether work in this state writes the texture.
    pub fn is_write(self) -> bool {
        matches!(
            self,
            Self::RenderTarget | Self::DepthWrite | Self::UnorderedAccess
        )
    }
}

/// A single state transition placed before a pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextureBarrier {
    /// The texture transitioned.
    pub texture: TextureId,
    /// Texture label for logs.
    pub label: String,
    /// State before the barrier.
    pub from: ResourceState,
    /// State after the barrier.
    pub to: ResourceState,
}

/// All barriers placed before one pass, in declaration order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BarrierBatch {
    barriers: Vec<TextureBarrier>,
}

impl BarrierBatch {
    /// Create an empty batch.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a barrier. Same-state transitions are dropped.
    pub fn push(&mut self, barrier: TextureBarrier) {
        if barrier.from != barrier.to {
            self.barriers.push(barrier);
        }
    }

    /// Iterate the barriers.
    pub fn iter(&self) -> std::slice::Iter<'_, TextureBarrier> {
        self.barriers.iter()
    }

    /// Number of barriers.
    pub fn len(&self) -> usize {
        self.barriers.len()
    }

    /// True if there are no barriers.
    pub fn is_empty(&self) -> bool {
        self.barriers.is_empty()
    }
}

impl<'a> IntoIterator for &'a BarrierBatch {
    type Item = &'a TextureBarrier;
    type IntoIter = std::slice::Iter<'a, TextureBarrier>;

    fn into_iter(self) -> Self::IntoIter {
        self.barriers.iter()
    }
}

/// Last known state of every texture used by compiled graphs.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResourceStateTracker {
    states: HashMap<TextureId, ResourceState>,
}

impl ResourceStateTracker {
    /// Create an empty tracker; every texture starts [`ResourceState::Undefined`].
    pub fn new() -> Self {
        Self::default()
    }

    /// Current state of a texture.
    pub fn state(&self, texture: TextureId) -> ResourceState {
        self.states.get(&texture).copied().unwrap_or_default()
    }

    /// Move a texture to `to`, returning the state it was in.
    pub fn transition(&mut self, texture: TextureId, to: ResourceState) -> ResourceState {
        self.states.insert(texture, to).unwrap_or_default()
    }

    /// Stop tracking a texture that is about to be destroyed.
    pub fn forget(&mut self, texture: TextureId) {
        self.states.remove(&texture);
    }

    /// Forget every texture.
    pub fn clear(&mut self) {
        self.states.clear();
    }

    /// Number of tracked textures.
    pub fn len(&self) -> usize {
        self.states.len()
    }

    /// True if no texture is tracked.
    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::instance::GraphicsInstance;
    use crate::types::{TextureDescriptor, TextureFormat, TextureUsage};

    #[test]
    fn test_batch_drops_same_state() {
        let device = GraphicsInstance::dummy().create_device().unwrap();
        let texture = device
            .create_texture(&TextureDescriptor::new_2d(
                8,
                8,
                TextureFormat::Rg32Float,
                TextureUsage::TEXTURE_BINDING,
            ))
            .unwrap();

        let mut batch = BarrierBatch::new();
        batch.push(TextureBarrier {
            texture: texture.id(),
            label: "t".into(),
            from: ResourceState::ShaderResource,
            to: ResourceState::ShaderResource,
        });
        assert!(batch.is_empty());

        batch.push(TextureBarrier {
            texture: texture.id(),
            label: "t".into(),
            from: ResourceState::RenderTarget,
            to: ResourceState::ShaderResource,
        });
        assert_eq!(batch.len(), 1);
    }

    #[test]
    fn test_tracker_transition_returns_previous() {
        let device = GraphicsInstance::dummy().create_device().unwrap();
        let texture = device
            .create_texture(&TextureDescriptor::new_2d(
                8,
                8,
                TextureFormat::Rg32Float,
                TextureUsage::TEXTURE_BINDING,
            ))
            .unwrap();

        let mut tracker = ResourceStateTracker::new();
        assert_eq!(tracker.state(texture.id()), ResourceState::Undefined);
        assert_eq!(
            tracker.transition(texture.id(), ResourceState::RenderTarget),
            ResourceState::Undefined
        );
        assert_eq!(
            tracker.transition(texture.id(), ResourceState::ShaderResource),
            ResourceState::RenderTarget
        );
        tracker.forget(texture.id());
        assert!(tracker.is_empty());
    }

    #[test]
    fn test_write_states() {
        assert!(ResourceState::UnorderedAccess.is_write());
        assert!(ResourceState::RenderTarget.is_write());
        assert!(!ResourceState::ShaderResource.is_write());
        assert!(!ResourceState::Present.is_write());
    }
}
