//! GPU meshes.
//!
//! CPU-side mesh data and vertex layouts live in `penumbra_core::mesh` and are
//! re-exported here. A [`Mesh`] is the uploaded form: one vertex buffer, its
//! layout and the number of vertices to draw.
//!
//! Vertex layouts are shared via `Arc`. A mesh can be drawn with a material
//! whenever [`VertexLayout::is_readable_from`] holds, which lets the shadow pass
//! read position-only data out of the same buffers the main pass uses.

use std::sync::Arc;

use crate::resources::Buffer;

pub use penumbra_core::mesh::{
    CpuMesh, PrimitiveTopology, VertexAttribute, VertexAttributeFormat, VertexAttributeSemantic,
    VertexLayout, VertexPN, generators,
};

/// A GPU mesh with a single, non-indexed vertex buffer.
///
/// # Example
///
/// ```ignore
/// let cpu = generators::generate_sphere(30, 0.5);
/// let sphere = device.create_mesh_from_cpu(&cpu)?;
/// assert_eq!(sphere.vertex_count(), cpu.vertex_count());
/// ```
pub struct Mesh {
    layout: Arc<VertexLayout>,
    topology: PrimitiveTopology,
    vertex_buffer: Arc<Buffer>,
    vertex_count: u32,
    label: Option<String>,
}

impl Mesh {
    /// Create a new mesh (called by GraphicsDevice).
    pub(crate) fn new(
        layout: Arc<VertexLayout>,
        topology: PrimitiveTopology,
        vertex_buffer: Arc<Buffer>,
        vertex_count: u32,
        label: Option<String>,
    ) -> Self {
        Self {
            layout,
            topology,
            vertex_buffer,
            vertex_count,
            label,
        }
    }

    /// Get the vertex layout.
    pub fn layout(&self) -> &Arc<VertexLayout> {
        &self.layout
    }

    /// Get the primitive topology.
    pub fn topology(&self) -> PrimitiveTopology {
        self.topology
    }

    /// Get the vertex buffer.
    pub fn vertex_buffer(&self) -> &Arc<Buffer> {
        &self.vertex_buffer
    }

    /// Number of vertices drawn.
    pub fn vertex_count(&self) -> u32 {
        self.vertex_count
    }

    /// Get the mesh label, if set.
    pub fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }
}

impl std::fmt::Debug for Mesh {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Mesh")
            .field("label", &self.label)
            .field("vertex_count", &self.vertex_count)
            .field("topology", &self.topology)
            .finish()
    }
}

// Ensure Mesh is Send + Sync
static_assertions::assert_impl_all!(Mesh: Send, Sync);
