//! ELF32 container reader for kernel core dumps and homebrew executables.
//!
//! Only the pieces the analyzer needs are decoded: the file header, the
//! program header table, and the notes inside `PT_NOTE` segments.

pub mod headers;
pub mod notes;
pub mod segments;
pub mod types;
pub mod utils;

use bytes::Bytes;
use std::ops::Range;
use tracing::debug;

use crate::core::resolver::LoadedRange;
use crate::core::source::DumpSource;
use headers::parse_header;
use notes::parse_notes;
use segments::SegmentTable;
pub use types::*;

/// A parsed ELF core dump that owns its bytes.
///
/// Note descriptors and loaded segments are stored as byte ranges into the
/// shared buffer and handed out without copying.
#[derive(Debug, Clone)]
pub struct ElfCoreFile {
    data: Bytes,
    header: ElfHeader,
    notes: Vec<(String, Range<usize>)>,
    loads: Vec<(u32, Range<usize>)>,
}

impl ElfCoreFile {
    /// Parse a core dump. The file must be an ELF32 little-endian `ET_CORE`.
    pub fn parse(data: Bytes) -> Result<Self> {
        let header = parse_header(&data)?;
        if !header.is_core() {
            return Err(ElfError::UnexpectedType {
                expected: ET_CORE,
                found: header.e_type,
            });
        }

        let table = SegmentTable::parse(&data, &header)?;
        let mut notes = Vec::new();
        let mut loads = Vec::new();

        for ph in table.headers() {
            if ph.is_note() {
                let base = ph.p_offset as usize;
                for note in parse_notes(table.contents(ph)?) {
                    let start = base + note.desc_offset;
                    notes.push((note.name.to_string(), start..start + note.desc.len()));
                }
            } else if ph.is_load() {
                // bounds check only; the range is sliced lazily
                table.contents(ph)?;
                loads.push((ph.p_vaddr, ph.file_range()));
            }
        }

        debug!(
            notes = notes.len(),
            loaded_segments = loads.len(),
            "Parsed ELF core container"
        );

        Ok(Self {
            data,
            header,
            notes,
            loads,
        })
    }

    pub fn header(&self) -> &ElfHeader {
        &self.header
    }

    /// Names of all notes, in file order (duplicates included)
    pub fn note_names(&self) -> impl Iterator<Item = &str> + '_ {
        self.notes.iter().map(|(name, _)| name.as_str())
    }
}

impl DumpSource for ElfCoreFile {
    fn note_blob(&self, name: &str) -> Option<&[u8]> {
        // a repeated name resolves to the last occurrence
        self.notes
            .iter()
            .rev()
            .find(|(n, _)| n == name)
            .map(|(_, range)| &self.data[range.clone()])
    }

    fn loaded_ranges(&self) -> Vec<LoadedRange> {
        self.loads
            .iter()
            .map(|(vaddr, range)| LoadedRange::new(*vaddr, self.data.slice(range.clone())))
            .collect()
    }
}
