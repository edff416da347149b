//! Binary format readers: the ELF container and the kernel's note records.

pub mod elf;
pub mod vita;
