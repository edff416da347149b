//! Core ELF types and constants

use std::fmt;

/// ELF parsing errors
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ElfError {
    InvalidMagic,
    UnsupportedClass(u8),
    UnsupportedData(u8),
    Truncated { offset: usize, needed: usize },
    MalformedHeader(String),
    UnexpectedType { expected: u16, found: u16 },
}

impl fmt::Display for ElfError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidMagic => write!(f, "Invalid ELF magic"),
            Self::UnsupportedClass(c) => write!(f, "Unsupported ELF class: {} (need ELF32)", c),
            Self::UnsupportedData(d) => {
                write!(f, "Unsupported ELF data encoding: {} (need little-endian)", d)
            }
            Self::Truncated { offset, needed } => {
                write!(f, "Truncated at {:#x}, needed {} bytes", offset, needed)
            }
            Self::MalformedHeader(msg) => write!(f, "Malformed header: {}", msg),
            Self::UnexpectedType { expected, found } => {
                write!(f, "Unexpected ELF type {} (expected {})", found, expected)
            }
        }
    }
}

impl std::error::Error for ElfError {}

pub type Result<T> = std::result::Result<T, ElfError>;

/// ELF magic number
pub const ELF_MAGIC: &[u8; 4] = b"\x7fELF";

pub const ELFCLASS32: u8 = 1;
pub const ELFDATA2LSB: u8 = 1;

/// Size of an ELF32 file header
pub const ELF32_EHDR_SIZE: usize = 52;
/// Size of an ELF32 program header
pub const ELF32_PHDR_SIZE: usize = 32;

pub const ET_EXEC: u16 = 2;
pub const ET_CORE: u16 = 4;
pub const EM_ARM: u16 = 40;

/// ELF32 file header, widened where convenient
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ElfHeader {
    pub e_type: u16,
    pub e_machine: u16,
    pub e_version: u32,
    pub e_entry: u32,
    pub e_phoff: u32,
    pub e_flags: u32,
    pub e_phentsize: u16,
    pub e_phnum: u16,
}

impl ElfHeader {
    pub fn is_core(&self) -> bool {
        self.e_type == ET_CORE
    }
}

/// ELF32 program header
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProgramHeader {
    pub p_type: u32,
    pub p_offset: u32,
    pub p_vaddr: u32,
    pub p_paddr: u32,
    pub p_filesz: u32,
    pub p_memsz: u32,
    pub p_flags: u32,
    pub p_align: u32,
}

impl ProgramHeader {
    pub fn is_load(&self) -> bool {
        self.p_type == PT_LOAD
    }

    pub fn is_note(&self) -> bool {
        self.p_type == PT_NOTE
    }

    /// Readable and executable, not writable
    pub fn is_code(&self) -> bool {
        self.p_flags & (PF_R | PF_W | PF_X) == PF_R | PF_X
    }

    /// File byte range of the segment contents
    pub fn file_range(&self) -> std::ops::Range<usize> {
        let start = self.p_offset as usize;
        start..start.saturating_add(self.p_filesz as usize)
    }
}

// Program header types
pub const PT_NULL: u32 = 0;
pub const PT_LOAD: u32 = 1;
pub const PT_NOTE: u32 = 4;

// Program header flags
pub const PF_X: u32 = 0x1;
pub const PF_W: u32 = 0x2;
pub const PF_R: u32 = 0x4;
