//! Note segment parsing

use crate::formats::elf::utils::{align_up, LeRead};

/// Individual note entry; `desc_offset` is relative to the segment start
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Note<'a> {
    pub n_type: u32,
    pub name: &'a str,
    pub desc: &'a [u8],
    pub desc_offset: usize,
}

/// Walk the notes of one PT_NOTE segment.
///
/// A note whose name or descriptor runs past the segment ends the walk;
/// everything decoded before it is kept.
pub fn parse_notes(data: &[u8]) -> Vec<Note<'_>> {
    let mut notes = Vec::new();
    let mut offset = 0usize;

    while offset + 12 <= data.len() {
        let (Ok(n_namesz), Ok(n_descsz), Ok(n_type)) = (
            data.read_u32_le(offset),
            data.read_u32_le(offset + 4),
            data.read_u32_le(offset + 8),
        ) else {
            break;
        };
        offset += 12;

        let name_end = match offset.checked_add(n_namesz as usize) {
            Some(end) if end <= data.len() => end,
            _ => break,
        };
        let name_bytes = &data[offset..name_end];
        let len = memchr::memchr(0, name_bytes).unwrap_or(name_bytes.len());
        let name = std::str::from_utf8(&name_bytes[..len]).unwrap_or("");

        let desc_offset = align_up(name_end, 4);
        let desc_end = match desc_offset.checked_add(n_descsz as usize) {
            Some(end) if end <= data.len() => end,
            _ => break,
        };

        notes.push(Note {
            n_type,
            name,
            desc: &data[desc_offset..desc_end],
            desc_offset,
        });
        offset = align_up(desc_end, 4);
    }

    notes
}
