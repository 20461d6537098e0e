//! The fixed scene: bouncing spheres, a ground plane and a light locator.
//!
//! Object order is stable and doubles as the object's row in the per-frame
//! uniform buffer: spheres first, then the plane, then the locator.

use penumbra_core::math::{self, Mat4, Vec3, Vec4};
use rand::rngs::StdRng;
use rand::{RngExt, SeedableRng};

use super::light::LightState;
use super::uniforms::ObjectUniform;

/// Number of spheres the scene allocates, drawn or not.
pub const SPHERE_COUNT: usize = 29;
/// Ground plane extent.
pub const PLANE_SIZE: Vec3 = Vec3::new(75.0, 1.0, 75.0);
/// Ground plane center.
pub const PLANE_POSITION: Vec3 = Vec3::new(0.0, -3.0, 0.0);
/// Edge length of the light locator cube.
pub const LOCATOR_SIZE: f32 = 3.0;
/// Sphere mesh resolution.
pub const SPHERE_RESOLUTION: u32 = 30;
/// Sphere mesh diameter before per-sphere scaling.
pub const SPHERE_DIAMETER: f32 = 0.5;

/// Which mesh an object is drawn with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ObjectKind {
    Sphere,
    Plane,
    Locator,
}

impl ObjectKind {
    /// Whether the object is drawn into the shadow map.
    pub fn casts_shadow(self) -> bool {
        !matches!(self, Self::Locator)
    }
}

/// One drawable instance.
#[derive(Debug, Clone, PartialEq)]
pub struct SceneObject {
    pub kind: ObjectKind,
    pub world: Mat4,
    /// RGB diffuse, `w = 0` for unlit objects.
    pub diffuse: Vec4,
    /// RGB specular, shininess in `w`.
    pub specular: Vec4,
    /// Hidden objects keep their row but are never drawn.
    pub visible: bool,
}

impl SceneObject {
    pub fn uniform(&self) -> ObjectUniform {
        ObjectUniform {
            world: self.world,
            diffuse: self.diffuse,
            specular: self.specular,
        }
    }
}

/// Where each sphere sits on the ground grid.
///
/// Three lines of spheres: a row along X through the origin and two columns
/// along Z at x = ±4. Each column crosses the row once; the sphere that
/// would land on an already occupied cell has no placement and is not drawn.
#[derive(Debug, Clone, PartialEq)]
pub struct SphereLayout {
    placements: Vec<Option<Vec3>>,
}

impl SphereLayout {
    /// The 9 + 10 + 10 grid, 27 distinct cells.
    pub fn grid() -> Self {
        let mut placements = Vec::with_capacity(SPHERE_COUNT);
        for i in 0..9 {
            placements.push(Some(Vec3::new(i as f32 - 4.0, 0.0, 0.0)));
        }
        for x in [-4.0, 4.0] {
            for j in 0..10 {
                let z = 5.0 - j as f32;
                placements.push((z != 0.0).then_some(Vec3::new(x, 0.0, z)));
            }
        }
        Self { placements }
    }

    /// Number of spheres, including the ones without a cell.
    pub fn sphere_count(&self) -> usize {
        self.placements.len()
    }

    /// Cell of sphere `index`, `None` if it is not drawn.
    pub fn placement(&self, index: usize) -> Option<Vec3> {
        self.placements.get(index).copied().flatten()
    }

    /// Every occupied cell.
    pub fn cells(&self) -> impl Iterator<Item = Vec3> + '_ {
        self.placements.iter().filter_map(|p| *p)
    }
}

impl Default for SphereLayout {
    fn default() -> Self {
        Self::grid()
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct Bounce {
    base: Vec3,
    scale: f32,
    timer: f32,
    speed_multiplier: f32,
}

impl Bounce {
    fn world(&self) -> Mat4 {
        let height = PLANE_POSITION.y
            + 1.0
            + ((self.timer * self.speed_multiplier).sin() * 4.0).abs();
        math::scale_translation(
            Vec3::splat(self.scale),
            Vec3::new(self.base.x, height, self.base.z),
        )
    }
}

/// All objects of the scene and the sphere animation state.
#[derive(Debug, Clone, PartialEq)]
pub struct SceneObjectSet {
    objects: Vec<SceneObject>,
    bounces: Vec<Bounce>,
}

impl SceneObjectSet {
    /// Build the scene. The same seed yields the same scene.
    ///
    /// Every sphere draws its random values in the same order whether or not
    /// it has a cell, so hiding a sphere never shifts the others' values.
    pub fn new(seed: u64, layout: &SphereLayout) -> Self {
        let mut rng = StdRng::seed_from_u64(seed);
        let mut unit = move || rng.random_range(0.0..1.0f32);

        let mut objects = Vec::with_capacity(layout.sphere_count() + 2);
        let mut bounces = Vec::with_capacity(layout.sphere_count());
        for index in 0..layout.sphere_count() {
            let placement = layout.placement(index);
            let timer = unit() * 100.0;
            let speed_multiplier = unit() + 0.5;
            let scale = unit() * 0.3 + 0.2;
            let diffuse = Vec4::new(unit(), unit(), unit(), 1.0);
            let specular = Vec3::splat(unit() * 0.03).extend(unit() * 24.0);

            let bounce = Bounce {
                base: placement.unwrap_or(Vec3::ZERO),
                scale,
                timer,
                speed_multiplier,
            };
            objects.push(SceneObject {
                kind: ObjectKind::Sphere,
                world: math::scale_translation(Vec3::splat(scale), bounce.base),
                diffuse,
                specular,
                visible: placement.is_some(),
            });
            bounces.push(bounce);
        }

        objects.push(SceneObject {
            kind: ObjectKind::Plane,
            world: Mat4::from_translation(PLANE_POSITION),
            diffuse: Vec4::new(0.65, 0.65, 0.65, 1.0),
            specular: Vec4::new(0.01, 0.01, 0.01, 2.0),
            visible: true,
        });
        objects.push(SceneObject {
            kind: ObjectKind::Locator,
            world: Mat4::IDENTITY,
            diffuse: Vec4::ZERO,
            specular: Vec4::ZERO,
            visible: true,
        });

        log::trace!(
            "SceneObjectSet: {} objects ({} spheres drawn), seed {seed}",
            objects.len(),
            layout.cells().count()
        );

        Self { objects, bounces }
    }

    /// Advance the bounce animation by `delta_time` seconds and move the
    /// locator to the light.
    pub fn update(&mut self, delta_time: f32, bounce_speed: f32, light: &LightState) {
        for (object, bounce) in self.objects.iter_mut().zip(self.bounces.iter_mut()) {
            object.world = bounce.world();
            bounce.timer += delta_time * bounce_speed * 0.4;
        }

        if let Some(locator) = self.objects.last_mut() {
            locator.world = Mat4::from_translation(light.position());
            locator.diffuse = light.locator_color().extend(0.0);
        }
    }

    pub fn objects(&self) -> &[SceneObject] {
        &self.objects
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    /// Drawn objects with their row index.
    pub fn visible(&self) -> impl Iterator<Item = (u32, &SceneObject)> {
        self.objects
            .iter()
            .enumerate()
            .filter(|(_, o)| o.visible)
            .map(|(i, o)| (i as u32, o))
    }

    /// Drawn objects that cast shadows, with their row index.
    pub fn casters(&self) -> impl Iterator<Item = (u32, &SceneObject)> {
        self.visible().filter(|(_, o)| o.kind.casts_shadow())
    }
}
