//! Crate-level error type

use crate::config::ConfigError;
use crate::io::FormatError;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RecorderError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("Malformed surface source file: {0}")]
    Format(#[from] FormatError),

    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("max_particles {0} does not fit in memory on this platform")]
    CapacityTooLarge(u64),
}

impl RecorderError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        RecorderError::Io {
            path: path.into(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, RecorderError>;
