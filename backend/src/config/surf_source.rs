//! `surf_source_write` settings block
//!
//! The raw document keeps every key optional so a write/read cycle is
//! lossless; [`SurfSourceWriteSettings::validate`] turns it into a
//! [`CaptureFilter`] or reports the configuration error.

use super::ConfigError;
use crate::filter::{CaptureFilter, CellRestriction};
use crate::models::{CellId, SurfaceId};
use serde::{Deserialize, Serialize};

/// Raw `surf_source_write` settings as they appear in the document
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SurfSourceWriteSettings {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_particles: Option<u64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub surface_ids: Option<Vec<SurfaceId>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cell: Option<CellId>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cellfrom: Option<CellId>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cellto: Option<CellId>,
}

impl SurfSourceWriteSettings {
    /// Validate the block and build the filter
    ///
    /// # Errors
    ///
    /// - `ConfigError::MissingMaxParticles` if `max_particles` is absent
    /// - `ConfigError::InvalidMaxParticles` if it is zero
    /// - `ConfigError::ConflictingCellFilters` if more than one of
    ///   `cell`, `cellfrom`, `cellto` is set
    pub fn validate(&self) -> Result<CaptureFilter, ConfigError> {
        let max_particles = self.max_particles.ok_or(ConfigError::MissingMaxParticles)?;
        if max_particles == 0 {
            return Err(ConfigError::InvalidMaxParticles);
        }

        let restriction = match (self.cell, self.cellfrom, self.cellto) {
            (None, None, None) => None,
            (Some(c), None, None) => Some(CellRestriction::Either(c)),
            (None, Some(c), None) => Some(CellRestriction::From(c)),
            (None, None, Some(c)) => Some(CellRestriction::To(c)),
            _ => return Err(ConfigError::ConflictingCellFilters),
        };

        Ok(CaptureFilter::new(
            max_particles,
            self.surface_ids.clone(),
            restriction,
        ))
    }
}

impl From<&CaptureFilter> for SurfSourceWriteSettings {
    fn from(filter: &CaptureFilter) -> Self {
        let (cell, cellfrom, cellto) = match filter.cell_restriction() {
            None => (None, None, None),
            Some(CellRestriction::Either(c)) => (Some(c), None, None),
            Some(CellRestriction::From(c)) => (None, Some(c), None),
            Some(CellRestriction::To(c)) => (None, None, Some(c)),
        };
        SurfSourceWriteSettings {
            max_particles: Some(filter.max_particles()),
            surface_ids: filter.surface_ids().map(|ids| ids.to_vec()),
            cell,
            cellfrom,
            cellto,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_block_requires_max_particles() {
        let err = SurfSourceWriteSettings::default().validate().unwrap_err();
        assert_eq!(err, ConfigError::MissingMaxParticles);
    }

    #[test]
    fn test_zero_capacity_rejected() {
        let settings = SurfSourceWriteSettings {
            max_particles: Some(0),
            ..Default::default()
        };
        assert_eq!(
            settings.validate().unwrap_err(),
            ConfigError::InvalidMaxParticles
        );
    }

    #[test]
    fn test_unknown_key_rejected() {
        let result: Result<SurfSourceWriteSettings, _> =
            serde_json::from_str(r#"{"max_particles": 10, "cells": 3}"#);
        assert!(result.is_err());
    }
}
