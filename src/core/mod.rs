//! The assembled core dump model and its address queries.

pub mod model;
pub mod resolver;
pub mod source;

pub use model::CoreModel;
pub use resolver::{AddressResolver, LoadedRange, ResolvedAddress, SegmentRef};
pub use source::{DumpSource, InMemorySource};
