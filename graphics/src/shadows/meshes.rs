//! GPU meshes of the scene.

use std::sync::Arc;

use penumbra_core::math::Vec3;

use crate::device::GraphicsDevice;
use crate::error::GraphicsError;
use crate::mesh::{Mesh, generators};

use super::scene::{LOCATOR_SIZE, ObjectKind, PLANE_SIZE, SPHERE_DIAMETER, SPHERE_RESOLUTION};
use super::scope::ResourceScope;

/// One mesh per [`ObjectKind`], shared by every object of that kind.
#[derive(Clone)]
pub struct SceneMeshes {
    sphere: Arc<Mesh>,
    plane: Arc<Mesh>,
    locator: Arc<Mesh>,
}

impl SceneMeshes {
    pub fn new(device: &Arc<GraphicsDevice>, scope: &mut ResourceScope) -> Result<Self, GraphicsError> {
        let sphere = generators::generate_sphere(SPHERE_RESOLUTION, SPHERE_DIAMETER).with_label("sphere");
        let plane = generators::generate_cuboid(PLANE_SIZE).with_label("plane");
        let locator = generators::generate_cuboid(Vec3::splat(LOCATOR_SIZE)).with_label("locator");
        Ok(Self {
            sphere: scope.adopt(device.create_mesh_from_cpu(&sphere)?),
            plane: scope.adopt(device.create_mesh_from_cpu(&plane)?),
            locator: scope.adopt(device.create_mesh_from_cpu(&locator)?),
        })
    }

    pub fn get(&self, kind: ObjectKind) -> &Arc<Mesh> {
        match kind {
            ObjectKind::Sphere => &self.sphere,
            ObjectKind::Plane => &self.plane,
            ObjectKind::Locator => &self.locator,
        }
    }
}

impl std::fmt::Debug for SceneMeshes {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SceneMeshes")
            .field("sphere", &self.sphere.vertex_count())
            .field("plane", &self.plane.vertex_count())
            .field("locator", &self.locator.vertex_count())
            .finish()
    }
}
