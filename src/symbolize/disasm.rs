//! ARM/Thumb disassembly backed by capstone.

use capstone::arch::arm::ArchMode;
use capstone::prelude::*;
use capstone::Capstone;
use tracing::debug;

use crate::config::DisasmConfig;
use crate::symbolize::image::ExecutableImage;
use crate::symbolize::{split_thumb, DisasmLine, Disassembler, SymbolizeError};

/// ARM/Thumb disassembly over an executable's code segment.
pub struct CapstoneDisassembler<'data> {
    image: ExecutableImage<'data>,
    window: u32,
    arm: Capstone,
    thumb: Capstone,
}

fn build(mode: ArchMode) -> Result<Capstone, SymbolizeError> {
    Capstone::new()
        .arm()
        .mode(mode)
        .build()
        .map_err(|e| SymbolizeError::Backend(e.to_string()))
}

impl<'data> CapstoneDisassembler<'data> {
    /// `window` bytes are decoded on each side of the target.
    pub fn new(image: ExecutableImage<'data>, window: u32) -> Result<Self, SymbolizeError> {
        Ok(Self {
            image,
            window,
            arm: build(ArchMode::Arm)?,
            thumb: build(ArchMode::Thumb)?,
        })
    }

    /// Disassembler using the configured window.
    pub fn from_config(
        image: ExecutableImage<'data>,
        config: &DisasmConfig,
    ) -> Result<Self, SymbolizeError> {
        Self::new(image, config.window_bytes)
    }
}

impl Disassembler for CapstoneDisassembler<'_> {
    fn disassemble_around(&self, offset: u32) -> Result<Vec<DisasmLine>, SymbolizeError> {
        let (target, thumb) = split_thumb(offset);
        let code = self.image.code();
        if target as usize >= code.len() {
            return Err(SymbolizeError::OutOfRange {
                offset,
                size: code.len(),
            });
        }

        let start = target.saturating_sub(self.window);
        let end = (target as u64 + self.window as u64).min(code.len() as u64) as usize;
        let cs = if thumb { &self.thumb } else { &self.arm };
        let target_addr = self.image.address_of(target) as u64;

        let insns = cs
            .disasm_all(&code[start as usize..end], self.image.address_of(start) as u64)
            .map_err(|e| SymbolizeError::Backend(e.to_string()))?;

        let lines: Vec<DisasmLine> = insns
            .iter()
            .map(|insn| {
                let text = format!(
                    "{} {}",
                    insn.mnemonic().unwrap_or(""),
                    insn.op_str().unwrap_or("")
                );
                DisasmLine {
                    address: insn.address() as u32,
                    bytes: insn.bytes().to_vec(),
                    text: text.trim_end().to_string(),
                    is_target: insn.address() == target_addr,
                }
            })
            .collect();

        debug!(offset, thumb, count = lines.len(), "Disassembled window");
        Ok(lines)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::symbolize::image::tests::executable_with_code;

    // mov r0, #0 ; bx lr ; nop (mov r0, r0) x2, ARM mode
    const ARM_CODE: [u8; 16] = [
        0x00, 0x00, 0xA0, 0xE3, 0x1E, 0xFF, 0x2F, 0xE1, 0x00, 0x00, 0xA0, 0xE1, 0x00, 0x00,
        0xA0, 0xE1,
    ];

    #[test]
    fn test_arm_window_marks_target() {
        let data = executable_with_code(0x8100_0000, &ARM_CODE);
        let image = ExecutableImage::parse(&data).unwrap();
        let disasm = CapstoneDisassembler::new(image, 0x8).unwrap();

        let lines = disasm.disassemble_around(0x4).unwrap();
        assert!(!lines.is_empty());
        let target: Vec<_> = lines.iter().filter(|l| l.is_target).collect();
        assert_eq!(target.len(), 1);
        assert_eq!(target[0].address, 0x8100_0004);
        assert!(target[0].text.starts_with("bx"));
        assert_eq!(lines[0].address, 0x8100_0000);
    }

    #[test]
    fn test_thumb_bit_selects_thumb() {
        // movs r0, #0 ; bx lr
        let code = [0x00, 0x20, 0x70, 0x47];
        let data = executable_with_code(0x8100_0000, &code);
        let image = ExecutableImage::parse(&data).unwrap();
        let disasm = CapstoneDisassembler::new(image, 0x10).unwrap();

        let lines = disasm.disassemble_around(0x3).unwrap();
        assert_eq!(lines.len(), 2);
        assert!(lines[1].is_target);
        assert_eq!(lines[1].bytes.len(), 2);
    }

    #[test]
    fn test_window_from_config() {
        let data = executable_with_code(0x8100_0000, &ARM_CODE);
        let decoded = |window_bytes| {
            let image = ExecutableImage::parse(&data).unwrap();
            let config = DisasmConfig { window_bytes };
            let disasm = CapstoneDisassembler::from_config(image, &config).unwrap();
            disasm.disassemble_around(0x8).unwrap()
        };

        let narrow = decoded(0x4);
        assert_eq!(narrow.len(), 2);
        assert_eq!(narrow[0].address, 0x8100_0004);
        let wide = decoded(0x8);
        assert_eq!(wide.len(), 4);
        assert_eq!(wide.iter().filter(|l| l.is_target).count(), 1);
    }

    #[test]
    fn test_out_of_range() {
        let data = executable_with_code(0x8100_0000, &ARM_CODE);
        let image = ExecutableImage::parse(&data).unwrap();
        let disasm = CapstoneDisassembler::new(image, 0x10).unwrap();
        assert!(matches!(
            disasm.disassemble_around(0x100),
            Err(SymbolizeError::OutOfRange { .. })
        ));
    }
}
