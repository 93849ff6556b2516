//! Run configuration
//!
//! The recorder is configured from a JSON settings document:
//!
//! ```json
//! {
//!   "seed": 1,
//!   "output": { "path": "surface_source.ssrc" },
//!   "surf_source_write": { "max_particles": 3000, "surface_ids": [4, 5], "cellfrom": 2 }
//! }
//! ```
//!
//! Everything except `surf_source_write.max_particles` has a default. When
//! `surf_source_write` is absent no recorder is built and no file is written.

mod surf_source;

pub use surf_source::SurfSourceWriteSettings;

use crate::io::SourceFormat;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Default file name for the written surface source
pub const DEFAULT_OUTPUT_PATH: &str = "surface_source.ssrc";

/// Default run seed, matching the transport engine's default
pub const DEFAULT_SEED: u64 = 1;

/// Configuration errors, reported before any event is processed
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error(
        "A maximum number of particles needs to be specified using the 'max_particles' \
         parameter to store surface source points."
    )]
    MissingMaxParticles,

    #[error("'max_particles' must be a positive integer.")]
    InvalidMaxParticles,

    #[error("'cell', 'cellfrom' and 'cellto' cannot be used at the same time.")]
    ConflictingCellFilters,

    #[error("Invalid settings document: {0}")]
    Parse(String),

    #[error("Failed to read settings file {path}: {message}")]
    Read { path: PathBuf, message: String },
}

/// Where and how the surface source file is written
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct OutputConfig {
    #[serde(default = "default_output_path")]
    pub path: PathBuf,

    /// Container format; inferred from the extension when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<SourceFormat>,
}

fn default_output_path() -> PathBuf {
    PathBuf::from(DEFAULT_OUTPUT_PATH)
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            path: default_output_path(),
            format: None,
        }
    }
}

impl OutputConfig {
    /// Format to write with: explicit, else by extension, else binary
    pub fn resolved_format(&self) -> SourceFormat {
        self.format
            .or_else(|| SourceFormat::from_path(&self.path))
            .unwrap_or_default()
    }
}

fn default_seed() -> u64 {
    DEFAULT_SEED
}

/// Top-level settings document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RecorderConfig {
    /// Seed for reservoir decisions
    #[serde(default = "default_seed")]
    pub seed: u64,

    #[serde(default)]
    pub output: OutputConfig,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub surf_source_write: Option<SurfSourceWriteSettings>,
}

impl Default for RecorderConfig {
    fn default() -> Self {
        Self {
            seed: DEFAULT_SEED,
            output: OutputConfig::default(),
            surf_source_write: None,
        }
    }
}

impl RecorderConfig {
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        serde_json::from_str(json).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| ConfigError::Read {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        Self::from_json_str(&text)
    }

    pub fn to_json_string(&self) -> Result<String, ConfigError> {
        serde_json::to_string_pretty(self).map_err(|e| ConfigError::Parse(e.to_string()))
    }
}

/// SHA-256 fingerprint of a serializable configuration, as lowercase hex
///
/// The value goes through `serde_json::Value` first. Its maps are ordered
/// by key, so the digest does not depend on struct field order.
pub fn fingerprint<T: Serialize>(config: &T) -> Result<String, ConfigError> {
    let canonical = serde_json::to_value(config)
        .and_then(|value| serde_json::to_vec(&value))
        .map_err(|e| ConfigError::Parse(e.to_string()))?;
    Ok(format!("{:x}", Sha256::digest(canonical)))
}
