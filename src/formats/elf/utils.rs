//! Utility functions for ELF parsing

use crate::formats::elf::types::{ElfError, Result};

/// Little-endian reads that report truncation as `ElfError::Truncated`
pub trait LeRead {
    fn read_u16_le(&self, offset: usize) -> Result<u16>;
    fn read_u32_le(&self, offset: usize) -> Result<u32>;
}

impl LeRead for [u8] {
    fn read_u16_le(&self, offset: usize) -> Result<u16> {
        let bytes = self
            .get(offset..offset.saturating_add(2))
            .ok_or(ElfError::Truncated { offset, needed: 2 })?;
        Ok(u16::from_le_bytes([bytes[0], bytes[1]]))
    }

    fn read_u32_le(&self, offset: usize) -> Result<u32> {
        let bytes = self
            .get(offset..offset.saturating_add(4))
            .ok_or(ElfError::Truncated { offset, needed: 4 })?;
        Ok(u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
    }
}

/// Align a value up to the specified alignment (power of two or 0/1)
pub fn align_up(value: usize, alignment: usize) -> usize {
    if alignment <= 1 {
        value
    } else {
        value.saturating_add(alignment - 1) & !(alignment - 1)
    }
}

/// Check that `[offset, offset + size)` lies within `data_len`
pub fn check_bounds(offset: usize, size: usize, data_len: usize) -> Result<()> {
    match offset.checked_add(size) {
        Some(end) if end <= data_len => Ok(()),
        _ => Err(ElfError::Truncated {
            offset,
            needed: size,
        }),
    }
}
