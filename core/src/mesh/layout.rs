//! Vertex layout description.
//!
//! Layouts are shared via `Arc` between CPU meshes, GPU meshes and material
//! descriptors. A layout may expose fewer attributes than its stride covers:
//! the shadow pass reads only positions out of the same interleaved
//! position+normal buffer the main pass uses.

use std::sync::Arc;

/// Format of a single vertex attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VertexAttributeFormat {
    Float32x2,
    Float32x3,
    Float32x4,
}

impl VertexAttributeFormat {
    /// Size of the attribute in bytes.
    pub fn size(&self) -> u32 {
        match self {
            Self::Float32x2 => 8,
            Self::Float32x3 => 12,
            Self::Float32x4 => 16,
        }
    }
}

/// What a vertex attribute means to the shader.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VertexAttributeSemantic {
    Position,
    Normal,
}

/// One attribute inside an interleaved vertex.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct VertexAttribute {
    pub semantic: VertexAttributeSemantic,
    pub format: VertexAttributeFormat,
    /// Byte offset from the start of the vertex.
    pub offset: u32,
    /// Shader location.
    pub location: u32,
}

/// Interleaved single-buffer vertex layout.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct VertexLayout {
    stride: u32,
    attributes: Vec<VertexAttribute>,
    label: Option<String>,
}

/// Stride of the generated meshes: position + normal, 6 floats.
pub(crate) const POSITION_NORMAL_STRIDE: u32 = 24;

impl VertexLayout {
    /// Create a layout with the given stride and no attributes.
    pub fn new(stride: u32) -> Self {
        Self {
            stride,
            attributes: Vec::new(),
            label: None,
        }
    }

    /// Append an attribute at the next free shader location.
    ///
    /// # Panics
    ///
    /// Panics if the attribute does not fit inside the stride.
    pub fn with_attribute(
        mut self,
        semantic: VertexAttributeSemantic,
        format: VertexAttributeFormat,
        offset: u32,
    ) -> Self {
        assert!(
            offset + format.size() <= self.stride,
            "Vertex attribute {semantic:?} at offset {offset} exceeds stride {}",
            self.stride
        );
        let location = self.attributes.len() as u32;
        self.attributes.push(VertexAttribute {
            semantic,
            format,
            offset,
            location,
        });
        self
    }

    /// Set a debug label.
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Position + normal, 24 bytes per vertex.
    pub fn position_normal() -> Arc<Self> {
        Arc::new(
            Self::new(POSITION_NORMAL_STRIDE)
                .with_attribute(
                    VertexAttributeSemantic::Position,
                    VertexAttributeFormat::Float32x3,
                    0,
                )
                .with_attribute(
                    VertexAttributeSemantic::Normal,
                    VertexAttributeFormat::Float32x3,
                    12,
                )
                .with_label("position_normal"),
        )
    }

    /// Position only, read out of a position + normal buffer (24 byte stride).
    pub fn position_only() -> Arc<Self> {
        Arc::new(
            Self::new(POSITION_NORMAL_STRIDE)
                .with_attribute(
                    VertexAttributeSemantic::Position,
                    VertexAttributeFormat::Float32x3,
                    0,
                )
                .with_label("position_only"),
        )
    }

    pub fn stride(&self) -> u32 {
        self.stride
    }

    pub fn attributes(&self) -> &[VertexAttribute] {
        &self.attributes
    }

    pub fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }

    /// Whether the layout exposes an attribute with the given semantic.
    pub fn has_semantic(&self, semantic: VertexAttributeSemantic) -> bool {
        self.attributes.iter().any(|a| a.semantic == semantic)
    }

    /// Whether a buffer laid out with `other` can be read through `self`.
    ///
    /// True when strides match and every attribute of `self` appears in
    /// `other` at the same offset and format.
    pub fn is_readable_from(&self, other: &VertexLayout) -> bool {
        self.stride == other.stride
            && self.attributes.iter().all(|a| {
                other
                    .attributes
                    .iter()
                    .any(|b| b.semantic == a.semantic && b.format == a.format && b.offset == a.offset)
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_position_normal_layout() {
        let layout = VertexLayout::position_normal();
        assert_eq!(layout.stride(), 24);
        assert_eq!(layout.attributes().len(), 2);
        assert_eq!(layout.attributes()[1].offset, 12);
        assert_eq!(layout.attributes()[1].location, 1);
        assert!(layout.has_semantic(VertexAttributeSemantic::Normal));
    }

    #[test]
    fn test_position_only_reads_position_normal() {
        let full = VertexLayout::position_normal();
        let pos = VertexLayout::position_only();
        assert_eq!(pos.stride(), 24);
        assert!(!pos.has_semantic(VertexAttributeSemantic::Normal));
        assert!(pos.is_readable_from(&full));
        assert!(!full.is_readable_from(&pos));
    }

    #[test]
    #[should_panic(expected = "exceeds stride")]
    fn test_attribute_overflow_panics() {
        let _ = VertexLayout::new(12).with_attribute(
            VertexAttributeSemantic::Normal,
            VertexAttributeFormat::Float32x3,
            4,
        );
    }
}
