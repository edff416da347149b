//! Decoders for the PS Vita kernel's core dump notes.
//!
//! Layering, leaves first: [`reader`] primitives, [`records`] fixed-layout
//! decoders, [`table`] list parsing over a whole note blob.

pub mod codes;
pub mod reader;
pub mod records;
pub mod table;

pub use codes::{register_name, SegmentAttr, SegmentPerms, StopReason, ThreadStatus};
pub use records::{Module, ModuleTrailer, RegisterSet, Segment, Thread};
pub use table::{
    parse_module_table, parse_register_table, parse_thread_table, MODULE_INFO, THREAD_INFO,
    THREAD_REG_INFO,
};
