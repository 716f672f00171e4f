//! Pack and load configuration
//!
//! Options are plain structs with builder-style setters and serde support,
//! so a `[pack]` / `[load]` table can be kept in a TOML or JSON file.
//!
//! ```toml
//! [pack]
//! quality = 9
//! workers = 4
//!
//! [load]
//! eager = true
//! ```

use crate::archive::format::{DEFAULT_QUALITY, MAX_QUALITY, PACKING_QUALITY};
use crate::error::{BroccoliError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Default ceiling for the decompressed outer stream (1 GiB)
pub const DEFAULT_MAX_ARCHIVE_SIZE: u64 = 1 << 30;

/// Default ceiling for a single file's declared plaintext size (1 GiB)
pub const DEFAULT_MAX_ENTRY_SIZE: u64 = 1 << 30;

/// Options for `ArchiveWriter`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PackOptions {
    /// Per-file quality, 0-11
    pub quality: u8,
    /// Quality of the outer pass, 0-11
    pub packing_quality: u8,
    /// Worker threads; 0 means one per logical CPU
    pub workers: usize,
}

impl Default for PackOptions {
    fn default() -> Self {
        Self {
            quality: DEFAULT_QUALITY,
            packing_quality: PACKING_QUALITY,
            workers: 0,
        }
    }
}

impl PackOptions {
    pub fn with_quality(mut self, quality: u8) -> Self {
        self.quality = quality;
        self
    }

    pub fn with_packing_quality(mut self, quality: u8) -> Self {
        self.packing_quality = quality;
        self
    }

    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.quality > MAX_QUALITY {
            return Err(BroccoliError::Config(format!(
                "unsupported quality {} (0-{})",
                self.quality, MAX_QUALITY
            )));
        }
        if self.packing_quality > MAX_QUALITY {
            return Err(BroccoliError::Config(format!(
                "unsupported packing quality {} (0-{})",
                self.packing_quality, MAX_QUALITY
            )));
        }
        Ok(())
    }
}

/// Options for `Vfs::load_with`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoadOptions {
    /// Decompress every file during load instead of on first open
    pub eager: bool,
    /// Worker threads for eager loads; 0 means one per logical CPU
    pub workers: usize,
    /// Largest decompressed outer stream accepted, in bytes
    pub max_archive_size: u64,
    /// Largest plaintext size a single file may declare, in bytes
    pub max_entry_size: u64,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self {
            eager: false,
            workers: 0,
            max_archive_size: DEFAULT_MAX_ARCHIVE_SIZE,
            max_entry_size: DEFAULT_MAX_ENTRY_SIZE,
        }
    }
}

impl LoadOptions {
    pub fn eager() -> Self {
        Self::default().with_eager(true)
    }

    pub fn with_eager(mut self, eager: bool) -> Self {
        self.eager = eager;
        self
    }

    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers;
        self
    }

    pub fn with_max_archive_size(mut self, limit: u64) -> Self {
        self.max_archive_size = limit;
        self
    }

    pub fn with_max_entry_size(mut self, limit: u64) -> Self {
        self.max_entry_size = limit;
        self
    }
}

/// Combined configuration file
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub pack: PackOptions,
    pub load: LoadOptions,
}

impl Config {
    /// Parse a TOML document
    pub fn from_toml_str(source: &str) -> Result<Self> {
        let config: Config = toml::from_str(source)?;
        config.pack.validate()?;
        Ok(config)
    }

    /// Parse a JSON document
    pub fn from_json_str(source: &str) -> Result<Self> {
        let config: Config = serde_json::from_str(source)?;
        config.pack.validate()?;
        Ok(config)
    }

    /// Read a `.json` or `.toml` file, chosen by extension
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path)?;
        match path.extension().and_then(|e| e.to_str()) {
            Some("json") => Self::from_json_str(&source),
            _ => Self::from_toml_str(&source),
        }
    }
}
