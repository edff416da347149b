//! Crash report data for crashed threads.
//!
//! The analyzer gathers everything a report needs (thread summary, register
//! values, annotated PC/LR, code around them and the stack around SP) into
//! serializable structures. Rendering them is left to the caller.

use serde::Serialize;
use tracing::{debug, warn};

use crate::analysis::notation::{AddressNotation, Location};
use crate::config::{AnalysisConfig, StackConfig};
use crate::core::model::CoreModel;
use crate::error::{CoreDumpError, Result};
use crate::formats::vita::codes::register_name;
use crate::formats::vita::records::{RegisterSet, Thread, SP};
use crate::symbolize::{DisasmLine, Disassembler, LineResolver};

/// Identity and state of a thread, with its program counter annotated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ThreadSummary {
    pub id: u32,
    pub name: String,
    pub stop_reason: u32,
    pub stop_reason_text: String,
    pub status: u16,
    pub status_text: String,
    pub pc: Option<AddressNotation>,
    /// Present when PC is not inside any segment and registers were captured
    pub lr: Option<AddressNotation>,
}

/// One word of the stack window.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StackEntry {
    pub address: u32,
    pub value: AddressNotation,
    pub is_sp: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RegisterValue {
    pub name: String,
    pub value: u32,
}

/// Instructions decoded around a labelled address.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DisasmBlock {
    pub label: String,
    pub lines: Vec<DisasmLine>,
}

/// Everything known about one crashed thread.
///
/// Register-dependent parts are empty when the dump has no register set for
/// the thread.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CrashReport {
    pub summary: ThreadSummary,
    /// R0..R12 and SP
    pub registers: Vec<RegisterValue>,
    pub pc: Option<AddressNotation>,
    pub lr: Option<AddressNotation>,
    pub disassembly: Vec<DisasmBlock>,
    pub stack: Vec<StackEntry>,
}

impl CrashReport {
    fn summary_only(summary: ThreadSummary) -> Self {
        Self {
            summary,
            registers: Vec::new(),
            pc: None,
            lr: None,
            disassembly: Vec::new(),
            stack: Vec::new(),
        }
    }
}

/// Builds crash reports over a read-only model.
pub struct CrashAnalyzer<'m> {
    model: &'m CoreModel,
    stack: StackConfig,
    disassembler: Option<&'m dyn Disassembler>,
    lines: Option<&'m dyn LineResolver>,
}

impl<'m> CrashAnalyzer<'m> {
    pub fn new(model: &'m CoreModel) -> Self {
        Self {
            model,
            stack: StackConfig::default(),
            disassembler: None,
            lines: None,
        }
    }

    pub fn with_stack_config(mut self, stack: StackConfig) -> Self {
        self.stack = stack;
        self
    }

    /// Apply the analysis settings of `config`.
    pub fn with_config(self, config: &AnalysisConfig) -> Self {
        self.with_stack_config(config.stack.clone())
    }

    pub fn with_disassembler(mut self, disassembler: &'m dyn Disassembler) -> Self {
        self.disassembler = Some(disassembler);
        self
    }

    pub fn with_line_resolver(mut self, lines: &'m dyn LineResolver) -> Self {
        self.lines = Some(lines);
        self
    }

    /// Offset of `vaddr` inside an executable segment, Thumb bit kept.
    fn code_offset(&self, vaddr: u32) -> Option<u32> {
        let at = self.model.resolve(vaddr).segment_ref()?;
        let (_, segment) = self.model.segment(at)?;
        segment
            .attr
            .is_executable()
            .then_some(vaddr - segment.start)
    }

    /// Annotate `vaddr` with its module location and, for code, its line.
    pub fn notation(&self, label: &str, vaddr: u32) -> AddressNotation {
        let location = self
            .model
            .resolve(vaddr)
            .segment_ref()
            .and_then(|at| self.model.segment(at))
            .map(|(module, segment)| Location {
                module: module.name.clone(),
                segment_index: segment.index,
                offset: vaddr - segment.start,
            });
        let line = match (self.lines, self.code_offset(vaddr)) {
            (Some(lines), Some(offset)) => lines.resolve(offset),
            _ => None,
        };
        AddressNotation {
            label: label.to_string(),
            vaddr,
            location,
            line,
        }
    }

    pub fn thread_summary(&self, thread: &Thread) -> ThreadSummary {
        let registers = self.model.registers(thread.id).ok();
        let pc = thread
            .pc
            .or_else(|| registers.map(RegisterSet::pc))
            .map(|pc| self.notation("PC", pc));
        let pc_located = pc.as_ref().is_some_and(AddressNotation::is_located);
        let lr = match registers {
            Some(regs) if !pc_located => Some(self.notation("LR", regs.lr())),
            _ => None,
        };

        ThreadSummary {
            id: thread.id,
            name: thread.name.clone(),
            stop_reason: thread.stop_reason.0,
            stop_reason_text: thread.stop_reason.description().to_string(),
            status: thread.status.0,
            status_text: thread.status.description().to_string(),
            pc,
            lr,
        }
    }

    /// Captured words around the thread's SP.
    ///
    /// Words not fully captured in a single loaded range are skipped.
    pub fn stack_window(&self, thread: &Thread) -> Result<Vec<StackEntry>> {
        let regs = self.model.registers(thread.id)?;
        let sp = regs.sp() as i64;
        let before = -(self.stack.words_before as i64);
        let after = self.stack.words_after as i64;

        let entries: Vec<StackEntry> = (before..after)
            .filter_map(|i| {
                let address = u32::try_from(sp + 4 * i).ok()?;
                let value = self.model.read_u32(address)?;
                Some(StackEntry {
                    address,
                    value: self.notation("", value),
                    is_sp: i == 0,
                })
            })
            .collect();

        debug!(
            thread_id = thread.id,
            sp = regs.sp(),
            captured = entries.len(),
            "Collected stack window"
        );
        Ok(entries)
    }

    fn disassemble(&self, label: &str, vaddr: u32) -> Option<DisasmBlock> {
        let disassembler = self.disassembler?;
        let offset = self.code_offset(vaddr)?;
        match disassembler.disassemble_around(offset) {
            Ok(lines) => Some(DisasmBlock {
                label: label.to_string(),
                lines,
            }),
            Err(e) => {
                warn!(label, vaddr, error = %e, "Disassembly failed");
                None
            }
        }
    }

    /// Full report for one thread. Fails with `RegistersUnavailable` when
    /// the dump has no register set for it.
    pub fn crash_report(&self, thread: &Thread) -> Result<CrashReport> {
        let regs = self.model.registers(thread.id)?;
        let registers = regs.gpr[..=SP]
            .iter()
            .enumerate()
            .map(|(i, &value)| RegisterValue {
                name: register_name(i),
                value,
            })
            .collect();

        // the thread record's PC is authoritative; register 15 is a fallback
        let pc = thread.pc.unwrap_or_else(|| regs.pc());
        let disassembly = [("PC", pc), ("LR", regs.lr())]
            .into_iter()
            .filter_map(|(label, vaddr)| self.disassemble(label, vaddr))
            .collect();

        Ok(CrashReport {
            summary: self.thread_summary(thread),
            registers,
            pc: Some(self.notation("PC", pc)),
            lr: Some(self.notation("LR", regs.lr())),
            disassembly,
            stack: self.stack_window(thread)?,
        })
    }

    /// Reports for every crashed thread, in table order.
    pub fn crash_reports(&self) -> Result<Vec<CrashReport>> {
        self.model
            .crashed_threads()
            .map(|thread| match self.crash_report(thread) {
                Err(CoreDumpError::RegistersUnavailable { thread_id }) => {
                    warn!(thread_id, "Crashed thread has no registers");
                    Ok(CrashReport::summary_only(self.thread_summary(thread)))
                }
                other => other,
            })
            .collect()
    }
}
