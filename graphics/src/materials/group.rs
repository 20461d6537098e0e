//! Binding groups: concrete resources for a binding layout.

use std::sync::Arc;

use crate::resources::{Buffer, Sampler, Texture};

use super::bindings::{BindingLayout, BindingType};

/// A bound resource for a specific binding slot.
#[derive(Debug, Clone)]
pub enum BoundResource {
    /// A range of a uniform buffer.
    Buffer {
        buffer: Arc<Buffer>,
        offset: u64,
        size: u64,
    },

    /// A texture read through a sampled binding.
    Texture(Arc<Texture>),

    /// A texture written through a storage binding.
    StorageTexture(Arc<Texture>),

    /// A sampler resource.
    Sampler(Arc<Sampler>),
}

impl BoundResource {
    /// Whether this resource fits a layout entry of `binding_type`.
    pub fn matches(&self, binding_type: &BindingType) -> bool {
        match (self, binding_type) {
            (Self::Buffer { .. }, BindingType::UniformBuffer) => true,
            (Self::Texture(_), BindingType::Texture { .. }) => true,
            (Self::StorageTexture(texture), BindingType::StorageTexture(format)) => {
                texture.format() == *format
            }
            (Self::Sampler(sampler), BindingType::Sampler { filtering }) => {
                *filtering || sampler.descriptor().is_non_filtering()
            }
            _ => false,
        }
    }
}

/// A binding entry with its slot and resource.
#[derive(Debug, Clone)]
pub struct BindingEntry {
    /// The binding slot index.
    pub binding: u32,

    /// The bound resource.
    pub resource: BoundResource,
}

/// A set of resources matching one [`BindingLayout`].
#[derive(Debug, Clone, Default)]
pub struct BindingGroup {
    /// The bound entries.
    pub entries: Vec<BindingEntry>,

    /// Optional label for debugging.
    pub label: Option<String>,
}

impl BindingGroup {
    /// Create a new empty binding group.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a binding entry.
    pub fn with_entry(mut self, binding: u32, resource: BoundResource) -> Self {
        self.entries.push(BindingEntry { binding, resource });
        self
    }

    /// Bind `size` bytes of `buffer` starting at `offset`.
    pub fn with_buffer_range(self, binding: u32, buffer: Arc<Buffer>, offset: u64, size: u64) -> Self {
        self.with_entry(
            binding,
            BoundResource::Buffer {
                buffer,
                offset,
                size,
            },
        )
    }

    /// Bind a whole buffer.
    pub fn with_buffer(self, binding: u32, buffer: Arc<Buffer>) -> Self {
        let size = buffer.size();
        self.with_buffer_range(binding, buffer, 0, size)
    }

    /// Add a sampled texture binding.
    pub fn with_texture(self, binding: u32, texture: Arc<Texture>) -> Self {
        self.with_entry(binding, BoundResource::Texture(texture))
    }

    /// Add a storage texture binding.
    pub fn with_storage_texture(self, binding: u32, texture: Arc<Texture>) -> Self {
        self.with_entry(binding, BoundResource::StorageTexture(texture))
    }

    /// Add a sampler binding.
    pub fn with_sampler(self, binding: u32, sampler: Arc<Sampler>) -> Self {
        self.with_entry(binding, BoundResource::Sampler(sampler))
    }

    /// Set a debug label.
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Textures read by this group.
    pub fn read_textures(&self) -> impl Iterator<Item = &Arc<Texture>> {
        self.entries.iter().filter_map(|e| match &e.resource {
            BoundResource::Texture(t) => Some(t),
            _ => None,
        })
    }

    /// Textures written by this group.
    pub fn written_textures(&self) -> impl Iterator<Item = &Arc<Texture>> {
        self.entries.iter().filter_map(|e| match &e.resource {
            BoundResource::StorageTexture(t) => Some(t),
            _ => None,
        })
    }

    /// Check that every layout entry has exactly one matching resource.
    pub fn is_compatible_with(&self, layout: &BindingLayout) -> bool {
        self.entries.len() == layout.entries.len()
            && layout.entries.iter().all(|entry| {
                self.entries
                    .iter()
                    .find(|e| e.binding == entry.binding)
                    .is_some_and(|e| e.resource.matches(&entry.binding_type))
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::instance::GraphicsInstance;
    use crate::materials::ShaderStageFlags;
    use crate::types::{BufferDescriptor, SamplerDescriptor, TextureDescriptor, TextureFormat, TextureUsage};

    #[test]
    fn test_group_matches_layout() {
        let device = GraphicsInstance::dummy().create_device().unwrap();
        let buffer = device.create_buffer(&BufferDescriptor::uniform(256)).unwrap();
        let texture = device
            .create_texture(&TextureDescriptor::new_2d(
                16,
                16,
                TextureFormat::Rg32Float,
                TextureUsage::TEXTURE_BINDING | TextureUsage::STORAGE_BINDING,
            ))
            .unwrap();
        let sampler = device.create_sampler(&SamplerDescriptor::nearest()).unwrap();

        let layout = BindingLayout::new()
            .with_uniform_buffer(0, ShaderStageFlags::FRAGMENT)
            .with_texture(1, false, ShaderStageFlags::FRAGMENT)
            .with_sampler(2, false, ShaderStageFlags::FRAGMENT);

        let group = BindingGroup::new()
            .with_buffer(0, buffer.clone())
            .with_texture(1, texture.clone())
            .with_sampler(2, sampler);
        assert!(group.is_compatible_with(&layout));
        assert_eq!(group.read_textures().count(), 1);
        assert_eq!(group.written_textures().count(), 0);

        let wrong = BindingGroup::new()
            .with_buffer(0, buffer)
            .with_storage_texture(1, texture);
        assert!(!wrong.is_compatible_with(&layout));
    }

    #[test]
    fn test_linear_sampler_rejected_by_non_filtering_slot() {
        let device = GraphicsInstance::dummy().create_device().unwrap();
        let linear = device.create_sampler(&SamplerDescriptor::linear()).unwrap();
        let resource = BoundResource::Sampler(linear);
        assert!(!resource.matches(&BindingType::Sampler { filtering: false }));
        assert!(resource.matches(&BindingType::Sampler { filtering: true }));
    }
}
