//! Resource usage declarations for automatic barrier generation.
//!
//! Usage is inferred from a pass's render targets and bound descriptor slots
//! when the pass is added to a graph. The compiler turns each declaration into
//! a required [`ResourceState`] and emits barriers where the tracked state
//! differs.

use std::sync::Arc;

use crate::resources::Texture;

use super::state::ResourceState;

/// How a texture is used within a pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TextureAccessMode {
    /// Written as color render target (color attachment).
    RenderTargetWrite,
    /// Written as depth render target (depth attachment).
    DepthStencilWrite,
    /// Sampled in a shader (texture read).
    ShaderRead,
    /// Written as a storage texture.
    StorageWrite,
}

impl TextureAccessMode {
    /// The state the texture must be in for this access.
    pub fn required_state(self) -> ResourceState {
        match self {
            Self::RenderTargetWrite => ResourceState::RenderTarget,
            Self::DepthStencilWrite => ResourceState::DepthWrite,
            Self::ShaderRead => ResourceState::ShaderResource,
            Self::StorageWrite => ResourceState::UnorderedAccess,
        }
    }

    /// Check if this access mode is a write operation.
    pub fn is_write(self) -> bool {
        !matches!(self, Self::ShaderRead)
    }
}

/// A texture usage declaration for barrier analysis.
#[derive(Debug, Clone)]
pub struct TextureUsageDecl {
    /// The texture being used.
    pub texture: Arc<Texture>,
    /// How the texture is accessed.
    pub access: TextureAccessMode,
}

/// Resource usage declarations for a pass.
#[derive(Debug, Default, Clone)]
pub struct PassResourceUsage {
    /// All texture usages declared for this pass, without duplicates.
    pub texture_usages: Vec<TextureUsageDecl>,
    /// Whether the pass renders to the swapchain surface.
    pub writes_surface: bool,
}

impl PassResourceUsage {
    /// Create a new empty resource usage.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a texture usage declaration.
    ///
    /// Declaring the same texture twice with the same access is a no-op.
    ///
    /// # Panics
    ///
    /// Panics if the texture is already declared with a different access.
    /// A texture is never both read and written, or written two ways, by
    /// one pass.
    pub fn add_texture(&mut self, pass: &str, texture: &Arc<Texture>, access: TextureAccessMode) {
        if let Some(existing) = self
            .texture_usages
            .iter()
            .find(|u| u.texture.id() == texture.id())
        {
            assert!(
                existing.access == access,
                "Texture {} bound as both {:?} and {:?} in pass {pass}: a pass may not use a \
                 texture as both read source and write target",
                texture.debug_name(),
                existing.access,
                access
            );
            return;
        }
        self.texture_usages.push(TextureUsageDecl {
            texture: Arc::clone(texture),
            access,
        });
    }

    /// Get the number of texture usages.
    pub fn texture_count(&self) -> usize {
        self.texture_usages.len()
    }

    /// Check if any texture usage is a write operation.
    pub fn has_texture_writes(&self) -> bool {
        self.texture_usages.iter().any(|u| u.access.is_write())
    }

    /// Check if there are any resource usages.
    pub fn is_empty(&self) -> bool {
        self.texture_usages.is_empty() && !self.writes_surface
    }
}
