//! Mesh generators for the demo shapes.
//!
//! Both generators emit non-indexed triangle lists in the
//! [`VertexLayout::position_normal`] layout, counter-clockwise when seen from
//! outside so back-face culling keeps the visible side.

use std::f32::consts::PI;

use glam::Vec3;

use super::data::CpuMesh;
use super::layout::VertexLayout;

/// Interleaved position + normal vertex (6 floats).
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct VertexPN {
    pub position: [f32; 3],
    pub normal: [f32; 3],
}

impl VertexPN {
    fn new(position: Vec3, normal: Vec3) -> Self {
        Self {
            position: position.to_array(),
            normal: normal.to_array(),
        }
    }
}

/// Generate a UV sphere centered at the origin.
///
/// `resolution` is used for both the longitudinal segments and the
/// latitudinal rings. Degenerate pole triangles are not emitted.
///
/// # Panics
///
/// Panics if `resolution < 3`.
pub fn generate_sphere(resolution: u32, diameter: f32) -> CpuMesh {
    assert!(resolution >= 3, "Sphere resolution must be at least 3");
    let radius = diameter * 0.5;
    let segments = resolution;
    let rings = resolution;

    let point = |ring: u32, segment: u32| -> VertexPN {
        let theta = ring as f32 * PI / rings as f32;
        let phi = segment as f32 * 2.0 * PI / segments as f32;
        let n = Vec3::new(theta.sin() * phi.cos(), theta.cos(), theta.sin() * phi.sin());
        VertexPN::new(n * radius, n)
    };

    let mut vertices = Vec::with_capacity((segments * (rings - 1) * 6) as usize);
    for ring in 0..rings {
        for segment in 0..segments {
            let a = point(ring, segment);
            let b = point(ring, segment + 1);
            let c = point(ring + 1, segment);
            let d = point(ring + 1, segment + 1);

            if ring != 0 {
                vertices.extend_from_slice(&[a, b, c]);
            }
            if ring != rings - 1 {
                vertices.extend_from_slice(&[b, d, c]);
            }
        }
    }

    CpuMesh::new(VertexLayout::position_normal())
        .with_vertices(&vertices)
        .with_label("sphere")
}

/// Generate an axis-aligned box centered at the origin with the given edge lengths.
pub fn generate_cuboid(size: Vec3) -> CpuMesh {
    let half = size * 0.5;
    // (normal, u, v) with u x v == normal.
    let faces = [
        (Vec3::X, Vec3::NEG_Z, Vec3::Y),
        (Vec3::NEG_X, Vec3::Z, Vec3::Y),
        (Vec3::Y, Vec3::X, Vec3::NEG_Z),
        (Vec3::NEG_Y, Vec3::X, Vec3::Z),
        (Vec3::Z, Vec3::X, Vec3::Y),
        (Vec3::NEG_Z, Vec3::NEG_X, Vec3::Y),
    ];

    let mut vertices = Vec::with_capacity(36);
    for (normal, u, v) in faces {
        let corner = |su: f32, sv: f32| VertexPN::new((normal + u * su + v * sv) * half, normal);
        let c0 = corner(-1.0, -1.0);
        let c1 = corner(1.0, -1.0);
        let c2 = corner(1.0, 1.0);
        let c3 = corner(-1.0, 1.0);
        vertices.extend_from_slice(&[c0, c1, c2, c0, c2, c3]);
    }

    CpuMesh::new(VertexLayout::position_normal())
        .with_vertices(&vertices)
        .with_label("cuboid")
}
