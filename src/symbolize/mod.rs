//! Disassembly and symbolization of code addresses in the crashed program.
//!
//! Both capabilities are traits so the analyzer can run without them, or
//! with whatever backend the host prefers. Offsets passed to them are
//! relative to the start of the executable segment; a set low bit selects
//! Thumb.

pub mod disasm;
pub mod image;
pub mod symbols;

use serde::Serialize;
use thiserror::Error;

use crate::formats::elf::ElfError;

pub use disasm::CapstoneDisassembler;
pub use image::ExecutableImage;
pub use symbols::SymbolTableResolver;

/// Symbolization errors
#[derive(Debug, Error)]
pub enum SymbolizeError {
    #[error("Executable image error: {0}")]
    Image(#[from] ElfError),

    #[error("Executable has no R-X loadable segment")]
    NoCodeSegment,

    #[error("Offset {offset:#x} is outside the {size:#x}-byte code segment")]
    OutOfRange { offset: u32, size: usize },

    #[error("Backend error: {0}")]
    Backend(String),
}

/// One decoded instruction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DisasmLine {
    pub address: u32,
    pub bytes: Vec<u8>,
    pub text: String,
    /// The instruction at the requested offset
    pub is_target: bool,
}

/// Decodes the instructions surrounding a code offset.
pub trait Disassembler {
    fn disassemble_around(&self, offset: u32) -> Result<Vec<DisasmLine>, SymbolizeError>;
}

/// Maps a code offset to a human-readable location.
pub trait LineResolver {
    fn resolve(&self, offset: u32) -> Option<String>;
}

/// Strip the Thumb selector bit.
pub(crate) fn split_thumb(offset: u32) -> (u32, bool) {
    (offset & !1, offset & 1 != 0)
}

/// Demangle a symbol name, falling back to the raw name.
pub fn demangle(name: &str) -> String {
    if let Ok(dm) = rustc_demangle::try_demangle(name) {
        return format!("{:#}", dm);
    }
    if name.starts_with("_Z") {
        if let Ok(sym) = cpp_demangle::Symbol::new(name) {
            return sym.to_string();
        }
    }
    name.to_string()
}
