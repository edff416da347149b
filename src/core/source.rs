//! The container-reader boundary.
//!
//! The model never looks at the container format itself. It asks a
//! [`DumpSource`] for note blobs by name and for the captured memory ranges.

use std::collections::HashMap;

use bytes::Bytes;

use crate::core::resolver::LoadedRange;

/// What the analyzer needs from a core dump container.
pub trait DumpSource {
    /// Descriptor bytes of the note called `name`, if present.
    fn note_blob(&self, name: &str) -> Option<&[u8]>;

    /// Every captured memory range, in container order.
    fn loaded_ranges(&self) -> Vec<LoadedRange>;
}

/// A source assembled from blobs already in memory.
#[derive(Debug, Clone, Default)]
pub struct InMemorySource {
    notes: HashMap<String, Vec<u8>>,
    ranges: Vec<LoadedRange>,
}

impl InMemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_note(mut self, name: impl Into<String>, blob: impl Into<Vec<u8>>) -> Self {
        self.notes.insert(name.into(), blob.into());
        self
    }

    pub fn with_range(mut self, base: u32, bytes: impl Into<Bytes>) -> Self {
        self.ranges.push(LoadedRange::new(base, bytes));
        self
    }
}

impl DumpSource for InMemorySource {
    fn note_blob(&self, name: &str) -> Option<&[u8]> {
        self.notes.get(name).map(Vec::as_slice)
    }

    fn loaded_ranges(&self) -> Vec<LoadedRange> {
        self.ranges.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_in_memory_source() {
        let source = InMemorySource::new()
            .with_note("MODULE_INFO", vec![0u8; 8])
            .with_range(0x8100_0000, vec![1u8, 2, 3]);

        assert_eq!(source.note_blob("MODULE_INFO").map(<[u8]>::len), Some(8));
        assert!(source.note_blob("THREAD_INFO").is_none());
        let ranges = source.loaded_ranges();
        assert_eq!(ranges.len(), 1);
        assert_eq!(ranges[0].base(), 0x8100_0000);
    }
}
