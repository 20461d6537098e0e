//! CPU-side mesh data.

use std::sync::Arc;

use super::layout::VertexLayout;

/// Primitive topology describing how vertices are assembled into primitives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum PrimitiveTopology {
    /// Every two vertices form a line.
    LineList,
    /// Every three vertices form a triangle.
    #[default]
    TriangleList,
}

impl PrimitiveTopology {
    /// Number of vertices per primitive.
    pub fn vertices_per_primitive(&self) -> u32 {
        match self {
            Self::LineList => 2,
            Self::TriangleList => 3,
        }
    }
}

/// A CPU-side, non-indexed mesh holding raw interleaved vertex bytes.
///
/// Created by the generators and uploaded via
/// `GraphicsDevice::create_mesh_from_cpu`.
#[derive(Debug, Clone)]
pub struct CpuMesh {
    layout: Arc<VertexLayout>,
    topology: PrimitiveTopology,
    vertex_data: Vec<u8>,
    vertex_count: u32,
    label: Option<String>,
}

impl CpuMesh {
    /// Create an empty mesh with the given layout.
    pub fn new(layout: Arc<VertexLayout>) -> Self {
        Self {
            layout,
            topology: PrimitiveTopology::TriangleList,
            vertex_data: Vec::new(),
            vertex_count: 0,
            label: None,
        }
    }

    /// Set the vertex data from a slice of plain-old-data vertices.
    ///
    /// # Panics
    ///
    /// Panics if the vertex size does not match the layout stride.
    pub fn with_vertices<V: bytemuck::Pod>(mut self, vertices: &[V]) -> Self {
        assert_eq!(
            std::mem::size_of::<V>() as u32,
            self.layout.stride(),
            "Vertex size does not match layout stride"
        );
        self.vertex_data = bytemuck::cast_slice(vertices).to_vec();
        self.vertex_count = vertices.len() as u32;
        self
    }

    /// Set a debug label.
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn layout(&self) -> &Arc<VertexLayout> {
        &self.layout
    }

    pub fn topology(&self) -> PrimitiveTopology {
        self.topology
    }

    pub fn vertex_data(&self) -> &[u8] {
        &self.vertex_data
    }

    pub fn vertex_count(&self) -> u32 {
        self.vertex_count
    }

    pub fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }

    /// Number of complete primitives.
    pub fn primitive_count(&self) -> u32 {
        self.vertex_count / self.topology.vertices_per_primitive()
    }
}
