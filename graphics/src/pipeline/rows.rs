//! Per-slot uniform rows.

use std::sync::Arc;

use crate::device::GraphicsDevice;
use crate::error::GraphicsError;
use crate::resources::Buffer;
use crate::types::BufferDescriptor;

/// A uniform buffer split into `slots × rows_per_slot` rows.
///
/// Each row starts at a multiple of the device's uniform offset alignment, so
/// any row can be bound on its own. Frame slot `s` only ever writes rows
/// `s * rows_per_slot ..`, which keeps slots from racing each other.
#[derive(Debug)]
pub struct UniformRows {
    buffer: Arc<Buffer>,
    row_size: u64,
    stride: u64,
    rows_per_slot: u32,
    slots: u32,
}

impl UniformRows {
    /// Allocate rows of `row_size` bytes for `slots` frame slots.
    pub fn new(
        device: &Arc<GraphicsDevice>,
        label: &str,
        row_size: u64,
        rows_per_slot: u32,
        slots: u32,
    ) -> Result<Self, GraphicsError> {
        let alignment = u64::from(device.capabilities().min_uniform_buffer_offset_alignment).max(1);
        let stride = row_size.div_ceil(alignment) * alignment;
        let size = stride * u64::from(rows_per_slot) * u64::from(slots);
        let buffer = device.create_buffer(
            &BufferDescriptor::uniform(size).with_label(label),
        )?;
        Ok(Self {
            buffer,
            row_size,
            stride,
            rows_per_slot,
            slots,
        })
    }

    /// The backing buffer.
    pub fn buffer(&self) -> &Arc<Buffer> {
        &self.buffer
    }

    /// Bytes per row as seen by the shader.
    pub fn row_size(&self) -> u64 {
        self.row_size
    }

    /// Distance between consecutive rows.
    pub fn stride(&self) -> u64 {
        self.stride
    }

    pub fn rows_per_slot(&self) -> u32 {
        self.rows_per_slot
    }

    /// Index of `row` of `slot` across the whole buffer.
    ///
    /// # Panics
    ///
    /// Panics if `slot` or `row` is out of range.
    pub fn flat_index(&self, slot: usize, row: u32) -> u32 {
        assert!(
            (slot as u32) < self.slots && row < self.rows_per_slot,
            "Uniform row ({slot}, {row}) out of range for {:?} ({} slots x {} rows)",
            self.buffer.label(),
            self.slots,
            self.rows_per_slot
        );
        slot as u32 * self.rows_per_slot + row
    }

    /// Byte offset of `row` of `slot`.
    pub fn offset(&self, slot: usize, row: u32) -> u64 {
        u64::from(self.flat_index(slot, row)) * self.stride
    }

    /// Write one row.
    pub fn write<T: bytemuck::Pod>(&self, slot: usize, row: u32, value: &T) -> Result<(), GraphicsError> {
        let bytes = bytemuck::bytes_of(value);
        debug_assert!(bytes.len() as u64 <= self.row_size);
        self.buffer.write(self.offset(slot, row), bytes)
    }
}
