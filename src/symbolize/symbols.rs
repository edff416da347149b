//! Symbol-table based line resolution.
//!
//! Homebrew executables are usually linked without stripping, so the ELF
//! symbol table is enough to name the function containing a code offset.

use object::{Object, ObjectSymbol, SymbolKind};
use tracing::debug;

use crate::symbolize::image::ExecutableImage;
use crate::symbolize::{demangle, split_thumb, LineResolver, SymbolizeError};

#[derive(Debug, Clone, PartialEq, Eq)]
struct FunctionSymbol {
    address: u32,
    size: u32,
    name: String,
}

/// Resolves code offsets to `function+0xdelta`.
#[derive(Debug, Clone)]
pub struct SymbolTableResolver {
    code_base: u32,
    /// Sorted by address
    symbols: Vec<FunctionSymbol>,
}

impl SymbolTableResolver {
    /// Collect the text symbols of an ELF executable.
    pub fn from_elf(data: &[u8]) -> Result<Self, SymbolizeError> {
        let image = ExecutableImage::parse(data)?;
        let file =
            object::File::parse(data).map_err(|e| SymbolizeError::Backend(e.to_string()))?;

        let symbols = file
            .symbols()
            .filter(|sym| sym.kind() == SymbolKind::Text)
            .filter_map(|sym| {
                let name = sym.name().ok().filter(|n| !n.is_empty())?;
                // Thumb functions carry the mode bit in their value
                Some((demangle(name), sym.address() as u32 & !1, sym.size() as u32))
            });

        let resolver = Self::from_symbols(image.code_base(), symbols);
        debug!(count = resolver.symbols.len(), "Loaded text symbols");
        Ok(resolver)
    }

    /// Build from `(name, address, size)` triples; a size of 0 means unknown.
    pub fn from_symbols<I, S>(code_base: u32, symbols: I) -> Self
    where
        I: IntoIterator<Item = (S, u32, u32)>,
        S: Into<String>,
    {
        let mut symbols: Vec<FunctionSymbol> = symbols
            .into_iter()
            .map(|(name, address, size)| FunctionSymbol {
                address,
                size,
                name: name.into(),
            })
            .collect();
        symbols.sort_by_key(|s| s.address);
        Self { code_base, symbols }
    }

    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }
}

impl LineResolver for SymbolTableResolver {
    fn resolve(&self, offset: u32) -> Option<String> {
        let (offset, _) = split_thumb(offset);
        let addr = self.code_base.checked_add(offset)?;
        let idx = self.symbols.partition_point(|s| s.address <= addr);
        let sym = self.symbols.get(idx.checked_sub(1)?)?;
        let delta = addr - sym.address;
        if sym.size != 0 && delta >= sym.size {
            return None;
        }
        if delta == 0 {
            Some(sym.name.clone())
        } else {
            Some(format!("{}+{:#x}", sym.name, delta))
        }
    }
}
