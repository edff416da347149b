//! Kernel code values carried in thread and segment records.

use bitflags::bitflags;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Why the kernel stopped a thread. Zero means it did not crash.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StopReason(pub u32);

impl StopReason {
    pub const NONE: StopReason = StopReason(0);
    pub const UNDEFINED_INSTRUCTION: StopReason = StopReason(0x30002);
    pub const PREFETCH_ABORT: StopReason = StopReason(0x30003);
    pub const DATA_ABORT: StopReason = StopReason(0x30004);
    pub const DIVISION_BY_ZERO: StopReason = StopReason(0x60080);

    pub fn is_crash(&self) -> bool {
        self.0 != 0
    }

    /// Known description, empty for unknown codes
    pub fn description(&self) -> &'static str {
        match self.0 {
            0 => "No reason",
            0x30002 => "Undefined instruction exception",
            0x30003 => "Prefetch abort exception",
            0x30004 => "Data abort exception",
            0x60080 => "Division by zero",
            _ => "",
        }
    }
}

impl fmt::Display for StopReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#x} ({})", self.0, self.description())
    }
}

/// Scheduler status of a thread.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ThreadStatus(pub u16);

impl ThreadStatus {
    pub fn description(&self) -> &'static str {
        match self.0 {
            1 => "Running",
            8 => "Waiting",
            16 => "Not started",
            _ => "",
        }
    }
}

impl fmt::Display for ThreadStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#x} ({})", self.0, self.description())
    }
}

bitflags! {
    /// Access bits in the low nibble of a segment's attribute word.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct SegmentPerms: u32 {
        const EXECUTE = 0x1;
        const WRITE = 0x2;
        const READ = 0x4;
    }
}

/// Raw segment attribute word.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SegmentAttr(pub u32);

impl SegmentAttr {
    pub fn perms(&self) -> SegmentPerms {
        SegmentPerms::from_bits_truncate(self.0 & 0xF)
    }

    pub fn is_executable(&self) -> bool {
        self.perms().contains(SegmentPerms::EXECUTE)
    }

    pub fn description(&self) -> &'static str {
        match self.0 & 0xF {
            5 => "RX",
            6 => "RW",
            _ => "",
        }
    }
}

impl fmt::Display for SegmentAttr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#x} ({})", self.0, self.description())
    }
}

/// Conventional name of a general-purpose register index.
pub fn register_name(index: usize) -> String {
    match index {
        13 => "SP".to_string(),
        14 => "LR".to_string(),
        15 => "PC".to_string(),
        n => format!("R{}", n),
    }
}
