//! Configuration for dump loading, model assembly and crash analysis.
//!
//! Every group has defaults matching the behaviour of the stock crash
//! analyzer, so `AnalysisConfig::default()` is the usual starting point.

use serde::{Deserialize, Serialize};

use crate::error::{CoreDumpError, Result};

/// Master configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Limits applied when reading the dump from disk.
    pub io: IoLimits,
    /// Invariant checks performed while assembling the model.
    pub model: ModelConfig,
    /// Stack window captured for crashed threads.
    pub stack: StackConfig,
    /// Disassembly window around PC/LR.
    pub disasm: DisasmConfig,
}

impl AnalysisConfig {
    /// Parse a configuration from JSON. Missing fields keep their defaults.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)
            .map_err(|e| CoreDumpError::InvalidConfig(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values that would make analysis meaningless.
    pub fn validate(&self) -> Result<()> {
        if self.io.max_file_size == 0 {
            return Err(CoreDumpError::InvalidConfig(
                "io.max_file_size must be non-zero".to_string(),
            ));
        }
        if self.disasm.window_bytes == 0 {
            return Err(CoreDumpError::InvalidConfig(
                "disasm.window_bytes must be non-zero".to_string(),
            ));
        }
        Ok(())
    }
}

/// Resource limits for reading a dump file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct IoLimits {
    /// Largest dump file that will be mapped (default: 512 MiB).
    pub max_file_size: u64,
}

impl Default for IoLimits {
    fn default() -> Self {
        Self {
            max_file_size: 512 * 1024 * 1024,
        }
    }
}

/// Model assembly checks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    /// Fail assembly when two module segments overlap.
    pub check_segment_overlap: bool,
    /// Fail assembly when two threads share an id; otherwise the later one wins.
    pub reject_duplicate_thread_ids: bool,
    /// Fail assembly when two modules share an id; otherwise lookups by id
    /// return the first one.
    pub reject_duplicate_module_ids: bool,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            check_segment_overlap: true,
            reject_duplicate_thread_ids: true,
            reject_duplicate_module_ids: true,
        }
    }
}

/// Stack window around SP, in 32-bit words.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StackConfig {
    pub words_before: u32,
    pub words_after: u32,
}

impl Default for StackConfig {
    fn default() -> Self {
        Self {
            words_before: 16,
            words_after: 24,
        }
    }
}

/// Disassembly window configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DisasmConfig {
    /// Bytes decoded on each side of the target address.
    pub window_bytes: u32,
}

impl Default for DisasmConfig {
    fn default() -> Self {
        Self { window_bytes: 0x10 }
    }
}
