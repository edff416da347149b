//! Human-oriented rendering of a virtual address.

use serde::Serialize;
use std::fmt;

/// Where a located address sits inside a module.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Location {
    /// Module name
    pub module: String,
    /// 1-based segment index within the module
    pub segment_index: u32,
    /// Offset from the segment start
    pub offset: u32,
}

/// An address together with what is known about it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AddressNotation {
    /// Short label such as `PC` or `LR`; empty for anonymous values
    pub label: String,
    pub vaddr: u32,
    pub location: Option<Location>,
    /// Source line or symbol, for addresses inside executable segments
    pub line: Option<String>,
}

impl AddressNotation {
    pub fn is_located(&self) -> bool {
        self.location.is_some()
    }
}

impl fmt::Display for AddressNotation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if !self.label.is_empty() {
            write!(f, "{}: ", self.label)?;
        }
        write!(f, "{:#010x}", self.vaddr)?;
        match &self.location {
            Some(loc) => {
                write!(f, " ({}@{} + {:#x}", loc.module, loc.segment_index, loc.offset)?;
                if let Some(line) = &self.line {
                    write!(f, " => {}", line)?;
                }
                write!(f, ")")
            }
            None => write!(f, " (not in any segment)"),
        }
    }
}
