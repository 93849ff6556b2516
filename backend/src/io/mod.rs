//! Surface source files
//!
//! A written file holds the retained set of one run together with the
//! capacity and the number of qualifying crossings seen. Record order inside
//! the file carries no meaning; compare files with [`compare_banks`].
//!
//! Two containers are supported:
//!
//! - **Binary** (`.ssrc`): fixed-width little-endian records followed by a
//!   SHA-256 digest of the file body
//! - **JSON** (`.json`): the same fields, human readable

mod binary;
mod compare;
mod json;

pub use binary::{DIGEST_SIZE, HEADER_SIZE, MAGIC, RECORD_SIZE};
pub use compare::{compare_banks, SourceMismatch, DEFAULT_RTOL, FIELD_NAMES};

use crate::error::{RecorderError, Result};
use crate::models::{SourceSite, UnknownParticle};
use crate::reservoir::ReservoirSnapshot;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufWriter, Read, Write};
use std::path::Path;
use thiserror::Error;
use tracing::info;

/// Current on-disk format version (both containers)
pub const FORMAT_VERSION: u16 = 1;

/// Decoding errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FormatError {
    #[error("bad magic bytes, not a surface source file")]
    BadMagic,

    #[error("unsupported format version {0}")]
    UnsupportedVersion(u16),

    #[error("file truncated: expected {expected} bytes, found {actual}")]
    Truncated { expected: usize, actual: usize },

    #[error("trailing data: expected {expected} bytes, found {actual}")]
    TrailingData { expected: usize, actual: usize },

    #[error("digest mismatch, file is corrupt")]
    DigestMismatch,

    #[error("record count {count} exceeds max_particles {max_particles}")]
    OverCapacity { count: u64, max_particles: u64 },

    #[error(transparent)]
    Particle(#[from] UnknownParticle),

    #[error("record {index} field {field} is not finite, JSON cannot hold it")]
    NonFinite { index: usize, field: &'static str },

    #[error("invalid JSON surface source: {0}")]
    Json(String),

    #[error("cannot infer surface source format from {0}")]
    UnknownExtension(String),
}

/// Container format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceFormat {
    #[default]
    Binary,
    Json,
}

impl SourceFormat {
    /// Infer the format from a file extension
    pub fn from_path(path: &Path) -> Option<Self> {
        match path.extension()?.to_str()? {
            "ssrc" | "bin" => Some(SourceFormat::Binary),
            "json" => Some(SourceFormat::Json),
            _ => None,
        }
    }
}

/// Contents of one surface source file
#[derive(Debug, Clone, PartialEq)]
pub struct SourceBank {
    pub max_particles: u64,
    /// Qualifying crossings seen during the run
    pub seen_count: u64,
    pub sites: Vec<SourceSite>,
}

impl SourceBank {
    pub fn len(&self) -> usize {
        self.sites.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sites.is_empty()
    }

    /// Encode into the given container
    pub fn encode(&self, format: SourceFormat) -> std::result::Result<Vec<u8>, FormatError> {
        match format {
            SourceFormat::Binary => Ok(binary::encode(self)),
            SourceFormat::Json => json::encode(self),
        }
    }

    /// Decode from the given container
    pub fn decode(bytes: &[u8], format: SourceFormat) -> std::result::Result<Self, FormatError> {
        let bank = match format {
            SourceFormat::Binary => binary::decode(bytes)?,
            SourceFormat::Json => json::decode(bytes)?,
        };
        if bank.sites.len() as u64 > bank.max_particles {
            return Err(FormatError::OverCapacity {
                count: bank.sites.len() as u64,
                max_particles: bank.max_particles,
            });
        }
        Ok(bank)
    }
}

impl From<ReservoirSnapshot> for SourceBank {
    fn from(snapshot: ReservoirSnapshot) -> Self {
        SourceBank {
            max_particles: snapshot.capacity as u64,
            seen_count: snapshot.seen,
            sites: snapshot.sites,
        }
    }
}

/// Write a bank to `path`
pub fn write_source_file(
    path: impl AsRef<Path>,
    bank: &SourceBank,
    format: SourceFormat,
) -> Result<()> {
    let path = path.as_ref();
    let bytes = bank.encode(format)?;

    let file = File::create(path).map_err(|e| RecorderError::io(path, e))?;
    let mut writer = BufWriter::new(file);
    writer
        .write_all(&bytes)
        .and_then(|_| writer.flush())
        .map_err(|e| RecorderError::io(path, e))?;

    info!(
        path = %path.display(),
        ?format,
        records = bank.len(),
        seen = bank.seen_count,
        "wrote surface source file"
    );
    Ok(())
}

/// Read a bank from `path`, inferring the format from its extension
pub fn read_source_file(path: impl AsRef<Path>) -> Result<SourceBank> {
    let path = path.as_ref();
    let format = SourceFormat::from_path(path)
        .ok_or_else(|| FormatError::UnknownExtension(path.display().to_string()))?;
    read_source_file_as(path, format)
}

/// Read a bank from `path` in an explicit format
pub fn read_source_file_as(path: impl AsRef<Path>, format: SourceFormat) -> Result<SourceBank> {
    let path = path.as_ref();
    let mut bytes = Vec::new();
    File::open(path)
        .and_then(|mut f| f.read_to_end(&mut bytes))
        .map_err(|e| RecorderError::io(path, e))?;
    Ok(SourceBank::decode(&bytes, format)?)
}
