//! Fixed-layout record decoders for the kernel's module, thread and
//! register notes.
//!
//! Every decoder receives a slice that starts at the record's first byte
//! and ends at the record's declared (or assumed) end, so a field that lies
//! past the record boundary surfaces as `TruncatedRecord` or `MalformedRecord`
//! instead of being read out of the neighbouring record.

use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::error::{CoreDumpError, Result};
use crate::formats::vita::codes::{SegmentAttr, StopReason, ThreadStatus};
use crate::formats::vita::reader::{read_cstring, read_u16, read_u32};

/// Module header size
pub const MODULE_HEADER_SIZE: usize = 0x50;
/// Size of one segment record following a module header
pub const SEGMENT_RECORD_SIZE: usize = 0x14;
/// Size of the exception-table trailer closing a module record
pub const MODULE_TRAILER_SIZE: usize = 0x10;

const MODULE_ID_OFFSET: usize = 0x04;
const MODULE_NAME_OFFSET: usize = 0x24;
const MODULE_SEGMENT_COUNT_OFFSET: usize = 0x4C;

const THREAD_ID_OFFSET: usize = 0x04;
const THREAD_NAME_OFFSET: usize = 0x08;
const THREAD_NAME_END: usize = 0x28;
const THREAD_STATUS_OFFSET: usize = 0x30;
const THREAD_STOP_REASON_OFFSET: usize = 0x74;
const THREAD_PC_OFFSET: usize = 0x9C;
/// Smallest thread record that still carries the stop reason
pub const THREAD_MIN_SIZE: usize = THREAD_STOP_REASON_OFFSET + 4;

/// Number of general-purpose registers in a register record
pub const REGISTER_COUNT: usize = 16;
const REGISTERS_OFFSET: usize = 0x08;
/// Smallest register record holding all sixteen registers
pub const REGISTER_SET_MIN_SIZE: usize = REGISTERS_OFFSET + REGISTER_COUNT * 4;

pub const SP: usize = 13;
pub const LR: usize = 14;
pub const PC: usize = 15;

/// Fixed module header fields
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ModuleHeader {
    pub id: u32,
    pub name: String,
    pub segment_count: u32,
}

/// A code or data segment of a loaded module.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Segment {
    /// 1-based position within the owning module
    pub index: u32,
    pub attr: SegmentAttr,
    pub start: u32,
    pub size: u32,
    pub align: u32,
}

impl Segment {
    /// Exclusive end address, widened so `start + size` cannot wrap
    pub fn end(&self) -> u64 {
        self.start as u64 + self.size as u64
    }

    /// Whether `vaddr` lies in `[start, start + size)`. Empty segments contain nothing.
    pub fn contains(&self, vaddr: u32) -> bool {
        self.size > 0 && vaddr >= self.start && (vaddr as u64) < self.end()
    }

    pub fn overlaps(&self, other: &Segment) -> bool {
        self.size > 0
            && other.size > 0
            && (self.start as u64) < other.end()
            && (other.start as u64) < self.end()
    }
}

/// ARM exception table bounds closing a module record.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModuleTrailer {
    pub exidx_start: u32,
    pub exidx_end: u32,
    pub extab_start: u32,
    pub extab_end: u32,
}

/// A loaded module and its segments.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Module {
    pub id: u32,
    pub name: String,
    pub segments: Vec<Segment>,
    pub trailer: ModuleTrailer,
}

/// A thread as recorded by the kernel. Registers live in the model, keyed by id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Thread {
    pub id: u32,
    pub name: String,
    pub stop_reason: StopReason,
    pub status: ThreadStatus,
    /// Saved program counter; absent when the record is too short to carry it
    pub pc: Option<u32>,
}

impl Thread {
    pub fn is_crashed(&self) -> bool {
        self.stop_reason.is_crash()
    }
}

/// Saved general-purpose registers of one thread, in architectural order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegisterSet {
    pub thread_id: u32,
    pub gpr: [u32; REGISTER_COUNT],
}

impl RegisterSet {
    pub fn get(&self, index: usize) -> Option<u32> {
        self.gpr.get(index).copied()
    }

    pub fn sp(&self) -> u32 {
        self.gpr[SP]
    }

    pub fn lr(&self) -> u32 {
        self.gpr[LR]
    }

    pub fn pc(&self) -> u32 {
        self.gpr[PC]
    }
}

fn malformed(table: &'static str, index: usize, reason: String) -> CoreDumpError {
    CoreDumpError::MalformedRecord {
        table,
        index,
        reason,
    }
}

/// Decode the fixed 0x50-byte module header.
pub(crate) fn decode_module_header(header: &[u8]) -> Result<ModuleHeader> {
    let header = header
        .get(..MODULE_HEADER_SIZE)
        .ok_or(CoreDumpError::TruncatedRecord {
            offset: 0,
            needed: MODULE_HEADER_SIZE,
            available: header.len(),
        })?;
    Ok(ModuleHeader {
        id: read_u32(header, MODULE_ID_OFFSET)?,
        // bounded by the rest of the header
        name: read_cstring(&header[..MODULE_SEGMENT_COUNT_OFFSET], MODULE_NAME_OFFSET)?,
        segment_count: read_u32(header, MODULE_SEGMENT_COUNT_OFFSET)?,
    })
}

/// Decode one 0x14-byte segment record; `index` is 1-based.
pub fn decode_segment(record: &[u8], index: u32) -> Result<Segment> {
    Ok(Segment {
        index,
        attr: SegmentAttr(read_u32(record, 4)?),
        start: read_u32(record, 8)?,
        size: read_u32(record, 12)?,
        align: read_u32(record, 16)?,
    })
}

/// Decode the 0x10-byte exception-table trailer.
pub fn decode_module_trailer(record: &[u8]) -> Result<ModuleTrailer> {
    Ok(ModuleTrailer {
        exidx_start: read_u32(record, 0)?,
        exidx_end: read_u32(record, 4)?,
        extab_start: read_u32(record, 8)?,
        extab_end: read_u32(record, 12)?,
    })
}

/// Decode a self-length-prefixed thread record.
///
/// `record` must already be cut to the declared length.
pub fn decode_thread(record: &[u8], index: usize) -> Result<Thread> {
    if record.len() < THREAD_MIN_SIZE {
        return Err(malformed(
            "thread",
            index,
            format!(
                "declared length {:#x} is below the minimum {:#x}",
                record.len(),
                THREAD_MIN_SIZE
            ),
        ));
    }

    let name_end = THREAD_NAME_END.min(record.len());
    let thread = Thread {
        id: read_u32(record, THREAD_ID_OFFSET)?,
        name: read_cstring(&record[..name_end], THREAD_NAME_OFFSET)?,
        status: ThreadStatus(read_u16(record, THREAD_STATUS_OFFSET)?),
        stop_reason: StopReason(read_u32(record, THREAD_STOP_REASON_OFFSET)?),
        pc: read_u32(record, THREAD_PC_OFFSET).ok(),
    };

    trace!(
        index,
        id = thread.id,
        name = %thread.name,
        stop_reason = thread.stop_reason.0,
        "Decoded thread record"
    );
    Ok(thread)
}

/// Decode a self-length-prefixed register record.
pub fn decode_register_set(record: &[u8], index: usize) -> Result<RegisterSet> {
    if record.len() < REGISTER_SET_MIN_SIZE {
        return Err(malformed(
            "register",
            index,
            format!(
                "declared length {:#x} cannot hold {} registers",
                record.len(),
                REGISTER_COUNT
            ),
        ));
    }

    let mut gpr = [0u32; REGISTER_COUNT];
    for (i, slot) in gpr.iter_mut().enumerate() {
        *slot = read_u32(record, REGISTERS_OFFSET + 4 * i)?;
    }
    let thread_id = read_u32(record, 4)?;

    trace!(index, thread_id, "Decoded register record");
    Ok(RegisterSet { thread_id, gpr })
}
