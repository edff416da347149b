//! Virtual address resolution.
//!
//! Two independent questions are answered here: which module segment a
//! virtual address belongs to (kernel bookkeeping, for naming), and which
//! captured bytes back it (the dump's loaded ranges, for reading).

use bytes::Bytes;
use serde::Serialize;
use std::fmt;

use crate::formats::vita::records::{Module, Segment};

/// One contiguous span of captured process memory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadedRange {
    base: u32,
    data: Bytes,
}

impl LoadedRange {
    pub fn new(base: u32, data: impl Into<Bytes>) -> Self {
        Self {
            base,
            data: data.into(),
        }
    }

    pub fn base(&self) -> u32 {
        self.base
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Exclusive end address
    pub fn end(&self) -> u64 {
        self.base as u64 + self.data.len() as u64
    }

    pub fn bytes(&self) -> &[u8] {
        &self.data
    }

    /// The `len` bytes at `vaddr`, if this range covers all of them.
    pub fn slice(&self, vaddr: u32, len: u32) -> Option<&[u8]> {
        let start = (vaddr as u64).checked_sub(self.base as u64)?;
        let end = start + len as u64;
        if end > self.data.len() as u64 {
            return None;
        }
        Some(&self.data[start as usize..end as usize])
    }
}

/// Position of a segment in the model's module table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct SegmentRef {
    /// Index into the module table
    pub module: usize,
    /// Index into that module's segment list (0-based; the segment's own
    /// `index` field is 1-based)
    pub segment: usize,
}

/// Result of symbolic resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ResolvedAddress {
    Located {
        vaddr: u32,
        segment: SegmentRef,
        offset: u32,
    },
    Unresolved(u32),
}

impl ResolvedAddress {
    pub fn vaddr(&self) -> u32 {
        match *self {
            ResolvedAddress::Located { vaddr, .. } => vaddr,
            ResolvedAddress::Unresolved(vaddr) => vaddr,
        }
    }

    pub fn is_located(&self) -> bool {
        matches!(self, ResolvedAddress::Located { .. })
    }

    pub fn segment_ref(&self) -> Option<SegmentRef> {
        match *self {
            ResolvedAddress::Located { segment, .. } => Some(segment),
            ResolvedAddress::Unresolved(_) => None,
        }
    }
}

impl fmt::Display for ResolvedAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResolvedAddress::Located {
                vaddr,
                segment,
                offset,
            } => write!(
                f,
                "{:#010x} (module #{} segment #{} + {:#x})",
                vaddr, segment.module, segment.segment, offset
            ),
            ResolvedAddress::Unresolved(vaddr) => write!(f, "{:#010x} (unresolved)", vaddr),
        }
    }
}

/// Borrowed query view over a module table and the captured memory.
#[derive(Debug, Clone, Copy)]
pub struct AddressResolver<'m> {
    modules: &'m [Module],
    ranges: &'m [LoadedRange],
}

impl<'m> AddressResolver<'m> {
    pub fn new(modules: &'m [Module], ranges: &'m [LoadedRange]) -> Self {
        Self { modules, ranges }
    }

    /// First segment, in table order, whose range contains `vaddr`.
    pub fn resolve(&self, vaddr: u32) -> ResolvedAddress {
        for (mi, module) in self.modules.iter().enumerate() {
            for (si, segment) in module.segments.iter().enumerate() {
                if segment.contains(vaddr) {
                    return ResolvedAddress::Located {
                        vaddr,
                        segment: SegmentRef {
                            module: mi,
                            segment: si,
                        },
                        offset: vaddr - segment.start,
                    };
                }
            }
        }
        ResolvedAddress::Unresolved(vaddr)
    }

    /// Look a resolved segment back up.
    pub fn segment(&self, at: SegmentRef) -> Option<(&'m Module, &'m Segment)> {
        let module = self.modules.get(at.module)?;
        Some((module, module.segments.get(at.segment)?))
    }

    /// Exactly `len` captured bytes at `vaddr`, from a single loaded range.
    ///
    /// Reads that straddle two ranges return `None` even when the ranges are
    /// adjacent.
    pub fn read_memory(&self, vaddr: u32, len: u32) -> Option<&'m [u8]> {
        self.ranges.iter().find_map(|range| range.slice(vaddr, len))
    }

    /// Little-endian word at `vaddr`.
    pub fn read_u32(&self, vaddr: u32) -> Option<u32> {
        let b = self.read_memory(vaddr, 4)?;
        Some(u32::from_le_bytes([b[0], b[1], b[2], b[3]]))
    }
}
