//! Crash analysis over an assembled [`CoreModel`](crate::core::CoreModel).

pub mod crash;
pub mod notation;

pub use crash::{
    CrashAnalyzer, CrashReport, DisasmBlock, RegisterValue, StackEntry, ThreadSummary,
};
pub use notation::{AddressNotation, Location};
