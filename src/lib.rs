//! Decoder and crash analyzer for PS Vita kernel core dumps.
//!
//! A dump is an ELF32 `ET_CORE` file. Its `PT_NOTE` segments carry the
//! kernel's module, thread and register tables; its `PT_LOAD` segments are
//! captured process memory. [`analyze_dump_file`] turns a dump into a
//! read-only [`CoreModel`], and [`CrashAnalyzer`] extracts report data for
//! crashed threads from it.

pub mod analysis;
pub mod config;
pub mod core;
pub mod error;
pub mod formats;
pub mod io;
pub mod logging;
pub mod symbolize;

use bytes::Bytes;
use std::path::Path;
use tracing::debug;

pub use analysis::{AddressNotation, CrashAnalyzer, CrashReport, StackEntry, ThreadSummary};
pub use config::AnalysisConfig;
pub use crate::core::{CoreModel, DumpSource, InMemorySource, LoadedRange, ResolvedAddress};
pub use error::{CoreDumpError, Result};
pub use formats::elf::ElfCoreFile;
pub use formats::vita::{Module, RegisterSet, Segment, StopReason, Thread};

/// Read, parse and assemble a dump file.
pub fn analyze_dump_file<P: AsRef<Path>>(path: P, config: &AnalysisConfig) -> Result<CoreModel> {
    config.validate()?;
    let path = path.as_ref();
    let data = io::read_dump(path, &config.io)?;
    debug!(path = %path.display(), size = data.len(), "Loaded core dump");
    analyze_dump_bytes(data, config)
}

/// Parse and assemble a dump already in memory.
pub fn analyze_dump_bytes(data: impl Into<Bytes>, config: &AnalysisConfig) -> Result<CoreModel> {
    let file = ElfCoreFile::parse(data.into())?;
    CoreModel::from_source(&file, &config.model)
}
