//! Descriptor tables.
//!
//! A [`DescriptorTable`] is a fixed-capacity array of [`BindingGroup`]s that all
//! follow one [`BindingLayout`]. Slots are addressed by index and can be
//! rewritten at any time. A pass that binds a slot snapshots the group `Arc` it
//! finds there, so a later rewrite never changes already recorded work.

use std::sync::Arc;

use parking_lot::RwLock;

use crate::device::GraphicsDevice;

use super::bindings::BindingLayout;
use super::group::BindingGroup;

/// Fixed-capacity, slot-addressed array of binding groups.
pub struct DescriptorTable {
    device: Arc<GraphicsDevice>,
    layout: Arc<BindingLayout>,
    slots: RwLock<Vec<Option<Arc<BindingGroup>>>>,
    label: Option<String>,
}

impl DescriptorTable {
    /// Create a new table (called by GraphicsDevice).
    pub(crate) fn new(
        device: Arc<GraphicsDevice>,
        layout: Arc<BindingLayout>,
        capacity: u32,
        label: Option<String>,
    ) -> Self {
        Self {
            device,
            layout,
            slots: RwLock::new(vec![None; capacity as usize]),
            label,
        }
    }

    /// Number of slots.
    pub fn capacity(&self) -> u32 {
        self.slots.read().len() as u32
    }

    /// Layout every slot follows.
    pub fn layout(&self) -> &Arc<BindingLayout> {
        &self.layout
    }

    /// Get the table label, if set.
    pub fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }

    /// Rewrite `slot` with `group`.
    ///
    /// # Panics
    ///
    /// Panics if `slot` is out of range or `group` does not match the table's
    /// layout. Both are configuration bugs.
    pub fn write(&self, slot: u32, group: Arc<BindingGroup>) {
        let mut slots = self.slots.write();
        assert!(
            (slot as usize) < slots.len(),
            "Descriptor slot {slot} out of range for table {:?} (capacity {})",
            self.label,
            slots.len()
        );
        assert!(
            group.is_compatible_with(&self.layout),
            "Binding group {:?} does not match layout of table {:?}",
            group.label,
            self.label
        );
        slots[slot as usize] = Some(group);
        drop(slots);

        self.device
            .backend()
            .note_descriptor_write(self.label.as_deref(), slot);
    }

    /// Read back the group stored at `slot`.
    pub fn group(&self, slot: u32) -> Option<Arc<BindingGroup>> {
        self.slots.read().get(slot as usize).cloned().flatten()
    }
}

impl std::fmt::Debug for DescriptorTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DescriptorTable")
            .field("label", &self.label)
            .field("capacity", &self.capacity())
            .finish()
    }
}

static_assertions::assert_impl_all!(DescriptorTable: Send, Sync);
