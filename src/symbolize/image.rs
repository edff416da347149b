//! The crashed program's own ELF, as far as symbolization needs it.

use crate::formats::elf::headers::parse_header;
use crate::formats::elf::segments::SegmentTable;
use crate::symbolize::SymbolizeError;

/// Borrowed view of an executable's code segment.
#[derive(Debug, Clone, Copy)]
pub struct ExecutableImage<'data> {
    data: &'data [u8],
    code_base: u32,
    code: &'data [u8],
}

impl<'data> ExecutableImage<'data> {
    /// Locate the first R-X `PT_LOAD` segment of an ELF32 LE image.
    pub fn parse(data: &'data [u8]) -> Result<Self, SymbolizeError> {
        let header = parse_header(data)?;
        let table = SegmentTable::parse(data, &header)?;
        let code_header = table.code_segment().ok_or(SymbolizeError::NoCodeSegment)?;
        let code = table.contents(code_header)?;
        Ok(Self {
            data,
            code_base: code_header.p_vaddr,
            code,
        })
    }

    /// Whole ELF file
    pub fn data(&self) -> &'data [u8] {
        self.data
    }

    /// Link-time address of the code segment
    pub fn code_base(&self) -> u32 {
        self.code_base
    }

    pub fn code(&self) -> &'data [u8] {
        self.code
    }

    /// Link-time address of a code offset (Thumb bit preserved)
    pub fn address_of(&self, offset: u32) -> u32 {
        self.code_base.wrapping_add(offset)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::formats::elf::types::*;

    fn put_u32(data: &mut [u8], offset: usize, value: u32) {
        data[offset..offset + 4].copy_from_slice(&value.to_le_bytes());
    }

    /// ELF32 executable whose only segment is R-X and holds `code`.
    pub(crate) fn executable_with_code(base: u32, code: &[u8]) -> Vec<u8> {
        let code_off = ELF32_EHDR_SIZE + ELF32_PHDR_SIZE;
        let mut data = vec![0u8; code_off];
        data[0..4].copy_from_slice(ELF_MAGIC);
        data[4] = ELFCLASS32;
        data[5] = ELFDATA2LSB;
        data[6] = 1;
        data[16..18].copy_from_slice(&ET_EXEC.to_le_bytes());
        data[18..20].copy_from_slice(&EM_ARM.to_le_bytes());
        put_u32(&mut data, 20, 1);
        put_u32(&mut data, 28, ELF32_EHDR_SIZE as u32);
        data[40] = ELF32_EHDR_SIZE as u8;
        data[42] = ELF32_PHDR_SIZE as u8;
        data[44] = 1;

        let ph = ELF32_EHDR_SIZE;
        put_u32(&mut data, ph, PT_LOAD);
        put_u32(&mut data, ph + 4, code_off as u32);
        put_u32(&mut data, ph + 8, base);
        put_u32(&mut data, ph + 16, code.len() as u32);
        put_u32(&mut data, ph + 20, code.len() as u32);
        put_u32(&mut data, ph + 24, PF_R | PF_X);
        data.extend_from_slice(code);
        data
    }

    #[test]
    fn test_parse_image() {
        let data = executable_with_code(0x8100_0000, &[0u8; 0x40]);
        let image = ExecutableImage::parse(&data).unwrap();
        assert_eq!(image.code_base(), 0x8100_0000);
        assert_eq!(image.code().len(), 0x40);
        assert_eq!(image.address_of(0x11), 0x8100_0011);
    }

    #[test]
    fn test_image_without_code() {
        let mut data = executable_with_code(0x8100_0000, &[0u8; 4]);
        put_u32(&mut data, ELF32_EHDR_SIZE + 24, PF_R | PF_W);
        assert!(matches!(
            ExecutableImage::parse(&data),
            Err(SymbolizeError::NoCodeSegment)
        ));
    }
}
