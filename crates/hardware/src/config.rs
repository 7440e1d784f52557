//! Configuration system for the emulator.
//!
//! This module defines the configuration structures used to parameterize a
//! system. It provides:
//! 1. **Defaults:** Baseline constants (hart count, memory size, TLB size, polling).
//! 2. **Structures:** Hierarchical config for the system, memory, and caches.
//! 3. **Loading:** JSON parsing from strings or files, followed by validation.
//!
//! Every field has a default, so `{}` is a complete configuration.

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::common::constants::MAX_HARTS;

/// Default configuration constants.
mod defaults {
    /// Number of harts.
    pub const HARTS: usize = 1;

    /// Cycles between two polls of the interrupt matrix.
    pub const INTERRUPT_POLL_INTERVAL: u32 = 100;

    /// Sleep of one `nop_loop` iteration, in microseconds.
    pub const NOP_LOOP_SLEEP_US: u64 = 100;

    /// Physical memory size in MiB.
    pub const MEMORY_SIZE_MIB: usize = 16;

    /// Entries per TLB.
    pub const TLB_SIZE: usize = 64;
}

/// Failure to load or validate a configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configuration file could not be read.
    #[error("failed to read configuration: {0}")]
    Io(#[from] std::io::Error),

    /// The JSON text is malformed or has fields of the wrong type.
    #[error("failed to parse configuration: {0}")]
    Parse(#[from] serde_json::Error),

    /// A field holds a value the emulator cannot honour.
    #[error("invalid configuration: {field} {reason}")]
    Invalid {
        /// Dotted path of the offending field.
        field: &'static str,
        /// What is wrong with it.
        reason: String,
    },
}

/// Root configuration structure.
///
/// # Examples
///
/// ```
/// use rvsmp_core::config::Config;
///
/// let config = Config::from_json(r#"{ "system": { "harts": 4 } }"#).unwrap();
/// assert_eq!(config.system.harts, 4);
/// assert_eq!(config.memory.size_mib, 16);
/// assert!(config.cache.dcache_enabled);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Harts, interrupts and boot settings.
    #[serde(default)]
    pub system: SystemConfig,
    /// Physical memory and translation settings.
    #[serde(default)]
    pub memory: MemoryConfig,
    /// Cache enables.
    #[serde(default)]
    pub cache: CacheConfig,
}

impl Config {
    /// Parses and validates a JSON configuration.
    ///
    /// # Errors
    ///
    /// [`ConfigError::Parse`] for malformed JSON, [`ConfigError::Invalid`] for
    /// out-of-range values.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads, parses and validates a JSON configuration file.
    ///
    /// # Errors
    ///
    /// [`ConfigError::Io`] if the file cannot be read, otherwise as [`Config::from_json`].
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json(&text)
    }

    /// Checks every field against the limits of the emulator.
    ///
    /// # Errors
    ///
    /// [`ConfigError::Invalid`] naming the first offending field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |field, reason: String| Err(ConfigError::Invalid { field, reason });

        if self.system.harts == 0 || self.system.harts > MAX_HARTS {
            return invalid(
                "system.harts",
                format!("must be between 1 and {MAX_HARTS}, got {}", self.system.harts),
            );
        }
        if self.system.interrupt_poll_interval == 0 {
            return invalid("system.interrupt_poll_interval", "must be non-zero".into());
        }
        if !self.system.start_pc.is_multiple_of(4) {
            return invalid(
                "system.start_pc",
                format!("must be 4-byte aligned, got {:#x}", self.system.start_pc),
            );
        }
        if !self.memory.size_mib.is_power_of_two() {
            return invalid(
                "memory.size_mib",
                format!("must be a power of two, got {}", self.memory.size_mib),
            );
        }
        if !self.memory.tlb_size.is_power_of_two() {
            return invalid(
                "memory.tlb_size",
                format!("must be a power of two, got {}", self.memory.tlb_size),
            );
        }
        Ok(())
    }
}

/// Hart count, interrupt delivery and boot settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SystemConfig {
    /// Number of harts (1 to 32).
    #[serde(default = "SystemConfig::default_harts")]
    pub harts: usize,

    /// Deliver hart-to-hart interrupts. When off, harts only see the system column.
    #[serde(default = "SystemConfig::default_ipi_enabled")]
    pub ipi_enabled: bool,

    /// Cycles between two polls of the interrupt matrix.
    #[serde(default = "SystemConfig::default_interrupt_poll_interval")]
    pub interrupt_poll_interval: u32,

    /// Host sleep per `nop_loop` iteration, in microseconds.
    #[serde(default = "SystemConfig::default_nop_loop_sleep_us")]
    pub nop_loop_sleep_us: u64,

    /// Program counter installed by the default boot handler.
    #[serde(default)]
    pub start_pc: u32,
}

impl SystemConfig {
    fn default_harts() -> usize {
        defaults::HARTS
    }

    fn default_ipi_enabled() -> bool {
        true
    }

    fn default_interrupt_poll_interval() -> u32 {
        defaults::INTERRUPT_POLL_INTERVAL
    }

    fn default_nop_loop_sleep_us() -> u64 {
        defaults::NOP_LOOP_SLEEP_US
    }
}

impl Default for SystemConfig {
    fn default() -> Self {
        Self {
            harts: defaults::HARTS,
            ipi_enabled: true,
            interrupt_poll_interval: defaults::INTERRUPT_POLL_INTERVAL,
            nop_loop_sleep_us: defaults::NOP_LOOP_SLEEP_US,
            start_pc: 0,
        }
    }
}

/// Physical memory and TLB configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemoryConfig {
    /// Physical memory size in MiB (power of two).
    #[serde(default = "MemoryConfig::default_size_mib")]
    pub size_mib: usize,

    /// Entries per TLB (power of two).
    #[serde(default = "MemoryConfig::default_tlb_size")]
    pub tlb_size: usize,
}

impl MemoryConfig {
    fn default_size_mib() -> usize {
        defaults::MEMORY_SIZE_MIB
    }

    fn default_tlb_size() -> usize {
        defaults::TLB_SIZE
    }

    /// Physical memory size in bytes.
    pub const fn size_bytes(&self) -> usize {
        self.size_mib * 1024 * 1024
    }
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self {
            size_mib: defaults::MEMORY_SIZE_MIB,
            tlb_size: defaults::TLB_SIZE,
        }
    }
}

/// Per-hart cache enables.
///
/// A disabled cache sends every access of its stream straight to memory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Instruction cache enable.
    #[serde(default = "CacheConfig::default_enabled")]
    pub icache_enabled: bool,

    /// Data cache enable.
    #[serde(default = "CacheConfig::default_enabled")]
    pub dcache_enabled: bool,
}

impl CacheConfig {
    fn default_enabled() -> bool {
        true
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            icache_enabled: true,
            dcache_enabled: true,
        }
    }
}
