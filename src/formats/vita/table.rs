//! Count-prefixed record lists inside the kernel note blobs.
//!
//! Each blob begins with an 8-byte header (4 reserved bytes, then a u32
//! element count). The module list uses fixed-size records with a variable
//! number of segment sub-records; the thread and register lists are
//! self-length-prefixed. Any decoding failure aborts the whole table.

use tracing::{debug, trace};

use crate::error::{CoreDumpError, Result};
use crate::formats::vita::reader::read_u32;
use crate::formats::vita::records::*;

/// Note carrying the module table
pub const MODULE_INFO: &str = "MODULE_INFO";
/// Note carrying the thread table
pub const THREAD_INFO: &str = "THREAD_INFO";
/// Note carrying the per-thread register table
pub const THREAD_REG_INFO: &str = "THREAD_REG_INFO";

/// Size of the reserved word plus element count
pub const TABLE_HEADER_SIZE: usize = 8;

/// A bounded cursor over one note blob.
pub struct NoteTable<'a> {
    table: &'static str,
    blob: &'a [u8],
    count: u32,
    cursor: usize,
}

impl<'a> NoteTable<'a> {
    /// Read the table header. `table` names the table in errors and logs.
    pub fn new(table: &'static str, blob: &'a [u8]) -> Result<Self> {
        if blob.len() < TABLE_HEADER_SIZE {
            return Err(CoreDumpError::TruncatedTable {
                table,
                offset: 0,
                needed: TABLE_HEADER_SIZE,
                available: blob.len(),
            });
        }
        let count = read_u32(blob, 4)?;
        debug!(table, count, bytes = blob.len(), "Parsing note table");
        Ok(Self {
            table,
            blob,
            count,
            cursor: TABLE_HEADER_SIZE,
        })
    }

    fn remaining(&self) -> usize {
        self.blob.len() - self.cursor
    }

    /// Consume `len` bytes, or fail with `TruncatedTable`.
    fn take(&mut self, len: usize) -> Result<&'a [u8]> {
        if len > self.remaining() {
            return Err(CoreDumpError::TruncatedTable {
                table: self.table,
                offset: self.cursor,
                needed: len,
                available: self.blob.len(),
            });
        }
        let blob: &'a [u8] = self.blob;
        let out = &blob[self.cursor..self.cursor + len];
        self.cursor += len;
        Ok(out)
    }

    /// Upper bound for pre-allocation, so a hostile count cannot reserve gigabytes.
    fn capacity_hint(&self, min_record: usize) -> usize {
        (self.count as usize).min(self.remaining() / min_record.max(1))
    }

    /// Self-length-prefixed mode: each record's first u32 is its total length.
    pub fn parse_prefixed<T>(
        mut self,
        min_record: usize,
        decode: impl Fn(&[u8], usize) -> Result<T>,
    ) -> Result<Vec<T>> {
        let mut out = Vec::with_capacity(self.capacity_hint(min_record));
        for index in 0..self.count as usize {
            if self.remaining() < 4 {
                return Err(CoreDumpError::TruncatedTable {
                    table: self.table,
                    offset: self.cursor,
                    needed: 4,
                    available: self.blob.len(),
                });
            }
            let len = read_u32(self.blob, self.cursor)? as usize;
            let start = self.cursor;
            let record = self.take(len)?;
            trace!(table = self.table, index, offset = start, len, "Record");
            out.push(decode(record, index)?);
        }
        debug!(table = self.table, parsed = out.len(), "Note table parsed");
        Ok(out)
    }

    /// Fixed-then-variable mode used by the module table.
    pub fn parse_modules(mut self) -> Result<Vec<Module>> {
        let mut modules =
            Vec::with_capacity(self.capacity_hint(MODULE_HEADER_SIZE + MODULE_TRAILER_SIZE));

        for index in 0..self.count as usize {
            let header = decode_module_header(self.take(MODULE_HEADER_SIZE)?)?;

            let segment_bytes = (header.segment_count as usize)
                .checked_mul(SEGMENT_RECORD_SIZE)
                .filter(|&n| n <= self.remaining())
                .ok_or_else(|| CoreDumpError::MalformedRecord {
                    table: self.table,
                    index,
                    reason: format!(
                        "segment count {} inconsistent with {} remaining bytes",
                        header.segment_count,
                        self.remaining()
                    ),
                })?;

            let segments = self
                .take(segment_bytes)?
                .chunks_exact(SEGMENT_RECORD_SIZE)
                .zip(1u32..)
                .map(|(record, seg_index)| decode_segment(record, seg_index))
                .collect::<Result<Vec<_>>>()?;
            let trailer = decode_module_trailer(self.take(MODULE_TRAILER_SIZE)?)?;

            trace!(
                index,
                id = header.id,
                name = %header.name,
                segments = segments.len(),
                "Decoded module record"
            );
            modules.push(Module {
                id: header.id,
                name: header.name,
                segments,
                trailer,
            });
        }

        debug!(table = self.table, parsed = modules.len(), "Note table parsed");
        Ok(modules)
    }
}

/// Parse the `MODULE_INFO` blob.
pub fn parse_module_table(blob: &[u8]) -> Result<Vec<Module>> {
    NoteTable::new("module", blob)?.parse_modules()
}

/// Parse the `THREAD_INFO` blob.
pub fn parse_thread_table(blob: &[u8]) -> Result<Vec<Thread>> {
    NoteTable::new("thread", blob)?.parse_prefixed(THREAD_MIN_SIZE, decode_thread)
}

/// Parse the `THREAD_REG_INFO` blob.
pub fn parse_register_table(blob: &[u8]) -> Result<Vec<RegisterSet>> {
    NoteTable::new("register", blob)?.parse_prefixed(REGISTER_SET_MIN_SIZE, decode_register_set)
}
