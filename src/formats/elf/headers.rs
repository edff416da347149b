//! ELF header parsing

use crate::formats::elf::types::*;
use crate::formats::elf::utils::LeRead;

/// Parse an ELF32 little-endian file header
pub fn parse_header(data: &[u8]) -> Result<ElfHeader> {
    if data.len() < 16 {
        return Err(ElfError::Truncated {
            offset: 0,
            needed: 16,
        });
    }
    if &data[0..4] != ELF_MAGIC {
        return Err(ElfError::InvalidMagic);
    }
    if data[4] != ELFCLASS32 {
        return Err(ElfError::UnsupportedClass(data[4]));
    }
    if data[5] != ELFDATA2LSB {
        return Err(ElfError::UnsupportedData(data[5]));
    }
    if data.len() < ELF32_EHDR_SIZE {
        return Err(ElfError::Truncated {
            offset: 0,
            needed: ELF32_EHDR_SIZE,
        });
    }

    let header = ElfHeader {
        e_type: data.read_u16_le(16)?,
        e_machine: data.read_u16_le(18)?,
        e_version: data.read_u32_le(20)?,
        e_entry: data.read_u32_le(24)?,
        e_phoff: data.read_u32_le(28)?,
        e_flags: data.read_u32_le(36)?,
        e_phentsize: data.read_u16_le(42)?,
        e_phnum: data.read_u16_le(44)?,
    };

    if header.e_phnum > 0 && (header.e_phentsize as usize) < ELF32_PHDR_SIZE {
        return Err(ElfError::MalformedHeader(format!(
            "program header entry size {} is smaller than {}",
            header.e_phentsize, ELF32_PHDR_SIZE
        )));
    }

    Ok(header)
}
