//! Buffer descriptors.

use bitflags::bitflags;

bitflags! {
    /// How a buffer may be used.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct BufferUsage: u32 {
        const VERTEX = 1 << 0;
        const UNIFORM = 1 << 1;
        /// Target of `write_buffer` uploads.
        const COPY_DST = 1 << 2;
    }
}

/// Descriptor for creating a buffer.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct BufferDescriptor {
    pub label: Option<String>,
    /// Size in bytes.
    pub size: u64,
    pub usage: BufferUsage,
}

impl BufferDescriptor {
    pub fn new(size: u64, usage: BufferUsage) -> Self {
        Self {
            label: None,
            size,
            usage,
        }
    }

    /// Uniform buffer rewritten from the CPU every frame.
    pub fn uniform(size: u64) -> Self {
        Self::new(size, BufferUsage::UNIFORM | BufferUsage::COPY_DST)
    }

    /// Vertex buffer filled once by an upload.
    pub fn vertices(size: u64) -> Self {
        Self::new(size, BufferUsage::VERTEX | BufferUsage::COPY_DST)
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Whether `write_buffer` may target this buffer.
    pub fn is_writable(&self) -> bool {
        self.usage.contains(BufferUsage::COPY_DST)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_buffer_kinds() {
        let rows = BufferDescriptor::uniform(768).with_label("frame_rows");
        assert!(rows.usage.contains(BufferUsage::UNIFORM));
        assert!(rows.is_writable());
        assert_eq!(rows.label.as_deref(), Some("frame_rows"));

        let mesh = BufferDescriptor::vertices(24 * 36);
        assert!(mesh.usage.contains(BufferUsage::VERTEX));
        assert!(!BufferDescriptor::new(16, BufferUsage::VERTEX).is_writable());
    }
}
