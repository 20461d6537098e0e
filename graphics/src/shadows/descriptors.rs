//! Descriptor slot addressing.
//!
//! Every per-frame binding lives in a slot private to its frame slot, so
//! rewriting it for frame N+1 never touches what the GPU may still read for
//! frame N. Blur slots are laid out as
//!
//! ```text
//! [ horizontal: frame 0 | frame 1 | ... ][ vertical: frame 0 | frame 1 | ... ]
//!    each frame block holds max_blurs iterations
//! ```
//!
//! The binding layouts below are shared by every material and table of the
//! pipeline. The object layout is identical for the shadow and main passes,
//! so one object table serves both.

use std::sync::Arc;

use crate::device::GraphicsDevice;
use crate::error::GraphicsError;
use crate::graph::BoundTable;
use crate::materials::{BindingGroup, BindingLayout, DescriptorTable, ShaderStageFlags};
use crate::pipeline::UniformRows;
use crate::types::TextureFormat;

use super::scope::ResourceScope;
use super::uniforms::ObjectUniform;

/// Half of a separable blur iteration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BlurPhase {
    Horizontal,
    Vertical,
}

impl BlurPhase {
    pub const ALL: [BlurPhase; 2] = [BlurPhase::Horizontal, BlurPhase::Vertical];

    pub fn is_horizontal(self) -> bool {
        self == Self::Horizontal
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Horizontal => "horizontal",
            Self::Vertical => "vertical",
        }
    }
}

/// Shape of a blur descriptor table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlurSlotLayout {
    pub max_blurs: u32,
    pub frames_in_flight: u32,
}

impl BlurSlotLayout {
    pub fn new(max_blurs: u32, frames_in_flight: u32) -> Self {
        Self {
            max_blurs,
            frames_in_flight,
        }
    }

    /// Slots needed for every (frame, iteration, phase).
    pub fn capacity(&self) -> u32 {
        self.max_blurs * self.frames_in_flight * BlurPhase::ALL.len() as u32
    }

    /// Slot of one blur phase. The same index addresses the phase's
    /// constant-block row.
    ///
    /// # Panics
    ///
    /// Panics if `frame` or `iteration` is out of range.
    pub fn blur_descriptor_slot(&self, frame: u32, iteration: u32, phase: BlurPhase) -> u32 {
        assert!(
            frame < self.frames_in_flight && iteration < self.max_blurs,
            "Blur slot (frame {frame}, iteration {iteration}) out of range ({} frames x {} blurs)",
            self.frames_in_flight,
            self.max_blurs
        );
        let base = frame * self.max_blurs + iteration;
        match phase {
            BlurPhase::Horizontal => base,
            BlurPhase::Vertical => base + self.max_blurs * self.frames_in_flight,
        }
    }
}

/// Slot of an object's uniform binding for a frame slot.
pub fn object_slot(frame: u32, object: u32, object_capacity: u32) -> u32 {
    debug_assert!(object < object_capacity);
    frame * object_capacity + object
}

/// Group 0 of the main pass: camera, light, shadow constants, shadow map
/// and its sampler.
pub fn frame_layout() -> Arc<BindingLayout> {
    let both = ShaderStageFlags::VERTEX | ShaderStageFlags::FRAGMENT;
    Arc::new(
        BindingLayout::new()
            .with_uniform_buffer(0, both)
            .with_uniform_buffer(1, both)
            .with_uniform_buffer(2, ShaderStageFlags::FRAGMENT)
            .with_texture(3, false, ShaderStageFlags::FRAGMENT)
            .with_sampler(4, false, ShaderStageFlags::FRAGMENT)
            .with_label("frame"),
    )
}

/// Group 0 of the shadow pass: the light.
pub fn light_layout() -> Arc<BindingLayout> {
    Arc::new(
        BindingLayout::new()
            .with_uniform_buffer(0, ShaderStageFlags::VERTEX)
            .with_label("light"),
    )
}

/// Group 1 of both scene passes: one object.
pub fn object_layout() -> Arc<BindingLayout> {
    Arc::new(
        BindingLayout::new()
            .with_uniform_buffer(0, ShaderStageFlags::VERTEX | ShaderStageFlags::FRAGMENT)
            .with_label("object"),
    )
}

/// Group 0 of a blur phase writing `format`.
pub fn blur_layout(format: TextureFormat) -> Arc<BindingLayout> {
    Arc::new(
        BindingLayout::new()
            .with_texture(0, false, ShaderStageFlags::COMPUTE)
            .with_storage_texture(1, format)
            .with_uniform_buffer(2, ShaderStageFlags::COMPUTE)
            .with_label("blur"),
    )
}

/// A uniform range of `rows` bound at binding 0.
pub fn uniform_row_group(rows: &UniformRows, slot: usize, row: u32) -> BindingGroup {
    BindingGroup::new().with_buffer_range(
        0,
        Arc::clone(rows.buffer()),
        rows.offset(slot, row),
        rows.row_size(),
    )
}

/// Per-object uniforms and the table that binds them.
///
/// Every (frame, object) pair gets its own row and its own slot, written once
/// at creation. Per frame only the row contents change.
#[derive(Debug)]
pub struct ObjectTable {
    rows: UniformRows,
    table: Arc<DescriptorTable>,
    capacity: u32,
}

impl ObjectTable {
    pub fn new(
        device: &Arc<GraphicsDevice>,
        scope: &mut ResourceScope,
        frames_in_flight: u32,
        capacity: u32,
    ) -> Result<Self, GraphicsError> {
        let rows = UniformRows::new(
            device,
            "objects",
            std::mem::size_of::<ObjectUniform>() as u64,
            capacity,
            frames_in_flight,
        )?;
        scope.adopt(Arc::clone(rows.buffer()));
        let table = scope.adopt(device.create_descriptor_table(
            object_layout(),
            frames_in_flight * capacity,
            Some("objects"),
        ));
        for frame in 0..frames_in_flight {
            for object in 0..capacity {
                table.write(
                    object_slot(frame, object, capacity),
                    Arc::new(uniform_row_group(&rows, frame as usize, object)),
                );
            }
        }
        Ok(Self {
            rows,
            table,
            capacity,
        })
    }

    /// Objects per frame slot.
    pub fn capacity(&self) -> u32 {
        self.capacity
    }

    pub fn table(&self) -> &Arc<DescriptorTable> {
        &self.table
    }

    pub fn write(&self, frame: usize, object: u32, value: &ObjectUniform) -> Result<(), GraphicsError> {
        self.rows.write(frame, object, value)
    }

    /// Bind an object's slot as group 1.
    pub fn bind(&self, frame: u32, object: u32) -> BoundTable {
        BoundTable::new(1, &self.table, object_slot(frame, object, self.capacity))
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    #[test]
    fn test_slots_match_formula() {
        let layout = BlurSlotLayout::new(8, 3);
        assert_eq!(layout.blur_descriptor_slot(0, 0, BlurPhase::Horizontal), 0);
        assert_eq!(layout.blur_descriptor_slot(2, 7, BlurPhase::Horizontal), 23);
        assert_eq!(layout.blur_descriptor_slot(0, 0, BlurPhase::Vertical), 24);
        assert_eq!(layout.blur_descriptor_slot(1, 3, BlurPhase::Vertical), 24 + 8 + 3);
        assert_eq!(layout.capacity(), 48);
    }

    #[test]
    fn test_every_triple_has_its_own_slot() {
        let layout = BlurSlotLayout::new(8, 3);
        let mut seen = HashSet::new();
        for frame in 0..3 {
            for iteration in 0..8 {
                for phase in BlurPhase::ALL {
                    let slot = layout.blur_descriptor_slot(frame, iteration, phase);
                    assert!(slot < layout.capacity());
                    assert!(
                        seen.insert(slot),
                        "slot {slot} reused by ({frame}, {iteration}, {phase:?})"
                    );
                }
            }
        }
        assert_eq!(seen.len() as u32, layout.capacity());
    }

    #[test]
    #[should_panic(expected = "out of range")]
    fn test_iteration_out_of_range() {
        BlurSlotLayout::new(8, 3).blur_descriptor_slot(0, 8, BlurPhase::Horizontal);
    }

    #[test]
    fn test_blur_layout_writes_technique_format() {
        let layout = blur_layout(TextureFormat::Rg32Float);
        assert!(layout.entry(1).unwrap().binding_type.is_write());
        assert!(!layout.entry(0).unwrap().binding_type.is_write());
    }

    #[test]
    fn test_object_table_binds_own_rows() {
        let device = crate::instance::GraphicsInstance::dummy().create_device().unwrap();
        let mut scope = ResourceScope::new(&device);
        let objects = ObjectTable::new(&device, &mut scope, 3, 4).unwrap();
        assert_eq!(objects.table().capacity(), 12);

        let bound = objects.bind(2, 1);
        assert_eq!(bound.group_index, 1);
        assert_eq!(bound.slot, 9);
        let offset = |bound: &BoundTable| match &bound.group.entries[0].resource {
            crate::materials::BoundResource::Buffer { offset, .. } => *offset,
            other => panic!("unexpected resource {other:?}"),
        };
        assert_eq!(offset(&bound), 256 * (2 * 4 + 1));
        assert_eq!(offset(&objects.bind(0, 0)), 0);
    }

    #[test]
    fn test_object_slots() {
        assert_eq!(object_slot(0, 5, 512), 5);
        assert_eq!(object_slot(2, 30, 512), 1054);
    }
}
