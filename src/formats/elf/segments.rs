//! Program header table management

use crate::formats::elf::types::*;
use crate::formats::elf::utils::{check_bounds, LeRead};

/// Program headers of an ELF32 image, in file order
pub struct SegmentTable<'a> {
    headers: Vec<ProgramHeader>,
    data: &'a [u8],
}

impl<'a> SegmentTable<'a> {
    /// Parse the program header table described by `header`
    pub fn parse(data: &'a [u8], header: &ElfHeader) -> Result<Self> {
        let ph_offset = header.e_phoff as usize;
        let ph_entsize = header.e_phentsize as usize;
        let ph_num = header.e_phnum as usize;

        if ph_num == 0 {
            return Ok(Self {
                headers: Vec::new(),
                data,
            });
        }

        check_bounds(ph_offset, ph_num * ph_entsize, data.len())?;

        let headers = (0..ph_num)
            .map(|i| parse_program_header(data, ph_offset + i * ph_entsize))
            .collect::<Result<Vec<_>>>()?;

        Ok(Self { headers, data })
    }

    pub fn headers(&self) -> &[ProgramHeader] {
        &self.headers
    }

    /// PT_LOAD segments in file order
    pub fn load_segments(&self) -> impl Iterator<Item = &ProgramHeader> + '_ {
        self.headers.iter().filter(|ph| ph.is_load())
    }

    /// First loadable R-X segment
    pub fn code_segment(&self) -> Option<&ProgramHeader> {
        self.load_segments().find(|ph| ph.is_code())
    }

    /// File contents of a segment, bounds-checked against the image
    pub fn contents(&self, header: &ProgramHeader) -> Result<&'a [u8]> {
        check_bounds(header.p_offset as usize, header.p_filesz as usize, self.data.len())?;
        Ok(&self.data[header.file_range()])
    }

    pub fn count(&self) -> usize {
        self.headers.len()
    }
}

fn parse_program_header(data: &[u8], offset: usize) -> Result<ProgramHeader> {
    check_bounds(offset, ELF32_PHDR_SIZE, data.len())?;
    Ok(ProgramHeader {
        p_type: data.read_u32_le(offset)?,
        p_offset: data.read_u32_le(offset + 4)?,
        p_vaddr: data.read_u32_le(offset + 8)?,
        p_paddr: data.read_u32_le(offset + 12)?,
        p_filesz: data.read_u32_le(offset + 16)?,
        p_memsz: data.read_u32_le(offset + 20)?,
        p_flags: data.read_u32_le(offset + 24)?,
        p_align: data.read_u32_le(offset + 28)?,
    })
}
