//! The assembled snapshot: modules, threads, their registers and the
//! captured memory.
//!
//! A [`CoreModel`] is built once and is read-only afterwards, so it can be
//! shared freely between report generators.

use std::collections::HashMap;

use tracing::{debug, error, info, warn};

use crate::config::ModelConfig;
use crate::core::resolver::{AddressResolver, LoadedRange, ResolvedAddress, SegmentRef};
use crate::core::source::DumpSource;
use crate::error::{CoreDumpError, Result};
use crate::formats::vita::records::{Module, RegisterSet, Segment, Thread};
use crate::formats::vita::table::{
    parse_module_table, parse_register_table, parse_thread_table, MODULE_INFO, THREAD_INFO,
    THREAD_REG_INFO,
};

/// In-memory model of one core dump.
#[derive(Debug, Clone)]
pub struct CoreModel {
    modules: Vec<Module>,
    threads: Vec<Thread>,
    /// Parallel to `threads`
    registers: Vec<Option<RegisterSet>>,
    thread_index: HashMap<u32, usize>,
    orphans: Vec<u32>,
    ranges: Vec<LoadedRange>,
}

fn required_note<'s>(source: &'s dyn DumpSource, name: &'static str) -> Result<&'s [u8]> {
    source
        .note_blob(name)
        .ok_or(CoreDumpError::MissingNote { name })
}

impl CoreModel {
    /// Parse the three kernel tables from `source` and assemble the model.
    pub fn from_source(source: &dyn DumpSource, config: &ModelConfig) -> Result<Self> {
        let modules = parse_module_table(required_note(source, MODULE_INFO)?)?;
        let threads = parse_thread_table(required_note(source, THREAD_INFO)?)?;
        let registers = parse_register_table(required_note(source, THREAD_REG_INFO)?)?;
        Self::from_tables(modules, threads, registers, source.loaded_ranges(), config)
    }

    /// Assemble a model from already-decoded tables.
    ///
    /// Checks segment overlap and module and thread id uniqueness (as
    /// configured), then
    /// attaches each register set to its thread. Register sets naming an
    /// unknown thread are logged and remembered as orphans.
    pub fn from_tables(
        modules: Vec<Module>,
        threads: Vec<Thread>,
        register_sets: Vec<RegisterSet>,
        ranges: Vec<LoadedRange>,
        config: &ModelConfig,
    ) -> Result<Self> {
        if config.check_segment_overlap {
            check_segment_overlap(&modules)?;
        }

        let mut module_ids = HashMap::with_capacity(modules.len());
        for (i, module) in modules.iter().enumerate() {
            if let Some(&previous) = module_ids.get(&module.id) {
                if config.reject_duplicate_module_ids {
                    return Err(CoreDumpError::MalformedRecord {
                        table: "module",
                        index: i,
                        reason: format!(
                            "module id {:#x} already used by record #{}",
                            module.id, previous
                        ),
                    });
                }
                warn!(module_id = module.id, previous, index = i, "Duplicate module id");
            } else {
                module_ids.insert(module.id, i);
            }
        }

        let mut thread_index = HashMap::with_capacity(threads.len());
        for (i, thread) in threads.iter().enumerate() {
            if let Some(previous) = thread_index.insert(thread.id, i) {
                if config.reject_duplicate_thread_ids {
                    return Err(CoreDumpError::MalformedRecord {
                        table: "thread",
                        index: i,
                        reason: format!(
                            "thread id {:#x} already used by record #{}",
                            thread.id, previous
                        ),
                    });
                }
                warn!(thread_id = thread.id, previous, index = i, "Duplicate thread id");
            }
        }

        let mut registers: Vec<Option<RegisterSet>> = vec![None; threads.len()];
        let mut orphans = Vec::new();
        for set in register_sets {
            match thread_index.get(&set.thread_id) {
                Some(&i) => {
                    if registers[i].is_some() {
                        warn!(thread_id = set.thread_id, "Duplicate register set, keeping the later one");
                    }
                    registers[i] = Some(set);
                }
                None => {
                    warn!(thread_id = set.thread_id, "Register set has no matching thread");
                    orphans.push(set.thread_id);
                }
            }
        }

        info!(
            modules = modules.len(),
            threads = threads.len(),
            orphans = orphans.len(),
            loaded_ranges = ranges.len(),
            "Core model assembled"
        );

        Ok(Self {
            modules,
            threads,
            registers,
            thread_index,
            orphans,
            ranges,
        })
    }

    pub fn modules(&self) -> &[Module] {
        &self.modules
    }

    pub fn module_by_id(&self, id: u32) -> Option<&Module> {
        self.modules.iter().find(|m| m.id == id)
    }

    /// Threads in table order
    pub fn threads(&self) -> &[Thread] {
        &self.threads
    }

    pub fn thread(&self, id: u32) -> Option<&Thread> {
        self.thread_index.get(&id).map(|&i| &self.threads[i])
    }

    /// Threads with a non-zero stop reason, in table order
    pub fn crashed_threads(&self) -> impl Iterator<Item = &Thread> + '_ {
        self.threads.iter().filter(|t| t.is_crashed())
    }

    /// Register set of a thread.
    ///
    /// Unknown thread ids and threads without a captured set both yield
    /// `RegistersUnavailable`.
    pub fn registers(&self, thread_id: u32) -> Result<&RegisterSet> {
        self.thread_index
            .get(&thread_id)
            .and_then(|&i| self.registers[i].as_ref())
            .ok_or(CoreDumpError::RegistersUnavailable { thread_id })
    }

    /// Thread ids named by register sets that matched no thread
    pub fn orphaned_register_sets(&self) -> &[u32] {
        &self.orphans
    }

    pub fn loaded_ranges(&self) -> &[LoadedRange] {
        &self.ranges
    }

    pub fn resolver(&self) -> AddressResolver<'_> {
        AddressResolver::new(&self.modules, &self.ranges)
    }

    pub fn resolve(&self, vaddr: u32) -> ResolvedAddress {
        self.resolver().resolve(vaddr)
    }

    pub fn segment(&self, at: SegmentRef) -> Option<(&Module, &Segment)> {
        self.resolver().segment(at)
    }

    pub fn read_memory(&self, vaddr: u32, len: u32) -> Option<&[u8]> {
        self.resolver().read_memory(vaddr, len)
    }

    pub fn read_u32(&self, vaddr: u32) -> Option<u32> {
        self.resolver().read_u32(vaddr)
    }
}

/// Fail if any two non-empty segments, across all modules, overlap.
fn check_segment_overlap(modules: &[Module]) -> Result<()> {
    let mut spans: Vec<(usize, &Module, &Segment)> = modules
        .iter()
        .enumerate()
        .flat_map(|(mi, m)| m.segments.iter().map(move |s| (mi, m, s)))
        .filter(|(_, _, s)| s.size > 0)
        .collect();
    spans.sort_by_key(|(_, _, s)| s.start);

    // compare against the span reaching furthest so far
    let mut furthest: Option<(usize, &Module, &Segment)> = None;
    for current in spans {
        if let Some(prev) = furthest {
            if prev.2.overlaps(current.2) {
                let reason = format!(
                    "segment {} of {} [{:#x}, {:#x}) overlaps segment {} of {} [{:#x}, {:#x})",
                    current.2.index,
                    current.1.name,
                    current.2.start,
                    current.2.end(),
                    prev.2.index,
                    prev.1.name,
                    prev.2.start,
                    prev.2.end()
                );
                error!(%reason, "Segment overlap");
                return Err(CoreDumpError::MalformedRecord {
                    table: "module",
                    index: current.0,
                    reason,
                });
            }
            if current.2.end() <= prev.2.end() {
                continue;
            }
        }
        furthest = Some(current);
    }
    debug!("No overlapping segments");
    Ok(())
}
