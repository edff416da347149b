//! Error types for core dump decoding.
//!
//! Decoding failures abort the table being parsed and propagate to whoever
//! asked for the [`CoreModel`](crate::core::model::CoreModel). Query-time
//! conditions such as an unresolved address are plain values, not errors;
//! the one exception is [`CoreDumpError::RegistersUnavailable`], which callers
//! are expected to match on and skip register-dependent output.

use thiserror::Error;

use crate::formats::elf::ElfError;
use crate::io::error::IoError;

/// Main error type for core dump operations.
#[derive(Debug, Error)]
pub enum CoreDumpError {
    /// A mandatory note is absent from the dump
    #[error("Required note {name} is missing from the dump")]
    MissingNote { name: &'static str },

    /// A primitive read ran past the end of its record
    #[error("Truncated record: read of {needed} bytes at offset {offset:#x} exceeds {available} available")]
    TruncatedRecord {
        offset: usize,
        needed: usize,
        available: usize,
    },

    /// A table ended before its declared element count was consumed
    #[error("Truncated {table} table: {needed} bytes needed at offset {offset:#x}, blob holds {available}")]
    TruncatedTable {
        table: &'static str,
        offset: usize,
        needed: usize,
        available: usize,
    },

    /// A decoded field failed a sanity check
    #[error("Malformed {table} record #{index}: {reason}")]
    MalformedRecord {
        table: &'static str,
        index: usize,
        reason: String,
    },

    /// No register set was captured for this thread
    #[error("Registers unavailable for thread {thread_id:#x}")]
    RegistersUnavailable { thread_id: u32 },

    /// Container (ELF) errors
    #[error("Container error: {0}")]
    Container(#[from] ElfError),

    /// Dump file I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] IoError),

    /// Configuration could not be loaded or failed validation
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl CoreDumpError {
    /// Whether analysis can continue past this error.
    pub fn is_fatal(&self) -> bool {
        !matches!(self, CoreDumpError::RegistersUnavailable { .. })
    }
}

/// Result type alias for core dump operations
pub type Result<T> = std::result::Result<T, CoreDumpError>;
