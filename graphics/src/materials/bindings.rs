//! Binding layout definitions for materials.
//!
//! Bindings describe what resources a shader expects. Layouts are shared via `Arc`
//! between a material and every [`DescriptorTable`](super::DescriptorTable) built
//! against it.

use crate::types::TextureFormat;

/// Type of resource that can be bound.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BindingType {
    /// Uniform buffer (read-only, small, frequently updated).
    UniformBuffer,

    /// Sampled 2D texture.
    ///
    /// `filterable: false` declares the texture as unfilterable float, which
    /// both shadow moment formats require.
    Texture { filterable: bool },

    /// Write-only 2D storage texture of the given format.
    StorageTexture(TextureFormat),

    /// Texture sampler.
    Sampler { filtering: bool },
}

impl BindingType {
    /// Whether a resource bound here is written by the shader.
    pub fn is_write(&self) -> bool {
        matches!(self, Self::StorageTexture(_))
    }
}

/// Describes a single binding slot in a layout.
#[derive(Debug, Clone, PartialEq)]
pub struct BindingLayoutEntry {
    /// Binding index within the group.
    pub binding: u32,

    /// Type of resource expected at this binding.
    pub binding_type: BindingType,

    /// Shader stages that can access this binding.
    pub visibility: ShaderStageFlags,

    /// Optional label for debugging.
    pub label: Option<String>,
}

impl BindingLayoutEntry {
    /// Create a new binding layout entry visible to vertex and fragment stages.
    pub fn new(binding: u32, binding_type: BindingType) -> Self {
        Self {
            binding,
            binding_type,
            visibility: ShaderStageFlags::VERTEX | ShaderStageFlags::FRAGMENT,
            label: None,
        }
    }

    /// Set the shader stage visibility.
    pub fn with_visibility(mut self, visibility: ShaderStageFlags) -> Self {
        self.visibility = visibility;
        self
    }

    /// Set a debug label.
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }
}

bitflags::bitflags! {
    /// Shader stages that can access a binding.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct ShaderStageFlags: u32 {
        /// Vertex shader stage.
        const VERTEX = 1 << 0;
        /// Fragment shader stage.
        const FRAGMENT = 1 << 1;
        /// Compute shader stage.
        const COMPUTE = 1 << 2;
    }
}

/// Describes the layout of bindings for a bind group.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BindingLayout {
    /// The binding entries in this layout.
    pub entries: Vec<BindingLayoutEntry>,

    /// Optional label for debugging.
    pub label: Option<String>,
}

impl BindingLayout {
    /// Create a new empty binding layout.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a binding entry to the layout.
    ///
    /// # Panics
    ///
    /// Panics if the binding index is already used.
    pub fn with_entry(mut self, entry: BindingLayoutEntry) -> Self {
        assert!(
            self.entry(entry.binding).is_none(),
            "Binding {} declared twice in layout {:?}",
            entry.binding,
            self.label
        );
        self.entries.push(entry);
        self
    }

    /// Add a uniform buffer binding.
    pub fn with_uniform_buffer(self, binding: u32, visibility: ShaderStageFlags) -> Self {
        self.with_entry(
            BindingLayoutEntry::new(binding, BindingType::UniformBuffer).with_visibility(visibility),
        )
    }

    /// Add a sampled texture binding.
    pub fn with_texture(self, binding: u32, filterable: bool, visibility: ShaderStageFlags) -> Self {
        self.with_entry(
            BindingLayoutEntry::new(binding, BindingType::Texture { filterable })
                .with_visibility(visibility),
        )
    }

    /// Add a compute-visible storage texture binding.
    pub fn with_storage_texture(self, binding: u32, format: TextureFormat) -> Self {
        self.with_entry(
            BindingLayoutEntry::new(binding, BindingType::StorageTexture(format))
                .with_visibility(ShaderStageFlags::COMPUTE),
        )
    }

    /// Add a sampler binding.
    pub fn with_sampler(self, binding: u32, filtering: bool, visibility: ShaderStageFlags) -> Self {
        self.with_entry(
            BindingLayoutEntry::new(binding, BindingType::Sampler { filtering })
                .with_visibility(visibility),
        )
    }

    /// Set a debug label.
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Look up the entry for a binding index.
    pub fn entry(&self, binding: u32) -> Option<&BindingLayoutEntry> {
        self.entries.iter().find(|e| e.binding == binding)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_binding_layout_builder() {
        let layout = BindingLayout::new()
            .with_uniform_buffer(0, ShaderStageFlags::VERTEX)
            .with_texture(1, false, ShaderStageFlags::FRAGMENT)
            .with_sampler(2, false, ShaderStageFlags::FRAGMENT)
            .with_label("main_frame");

        assert_eq!(layout.entries.len(), 3);
        assert_eq!(layout.label, Some("main_frame".to_string()));
        assert_eq!(
            layout.entry(1).map(|e| e.binding_type),
            Some(BindingType::Texture { filterable: false })
        );
    }

    #[test]
    fn test_storage_texture_is_compute_write() {
        let layout = BindingLayout::new().with_storage_texture(1, TextureFormat::Rg32Float);
        let entry = layout.entry(1).unwrap();
        assert_eq!(entry.visibility, ShaderStageFlags::COMPUTE);
        assert!(entry.binding_type.is_write());
    }

    #[test]
    #[should_panic(expected = "declared twice")]
    fn test_duplicate_binding_panics() {
        let _ = BindingLayout::new()
            .with_uniform_buffer(0, ShaderStageFlags::VERTEX)
            .with_uniform_buffer(0, ShaderStageFlags::FRAGMENT);
    }
}
