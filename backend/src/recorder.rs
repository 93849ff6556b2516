//! Surface source recorder
//!
//! Glue between the transport engine and the reservoir. The engine reports
//! every surface crossing through [`CrossingObserver::on_crossing`]; the
//! recorder filters it, offers qualifying sites to the reservoir, and writes
//! the retained set once the run is over.
//!
//! # Example
//!
//! ```
//! use surface_source_core_rs::config::RecorderConfig;
//! use surface_source_core_rs::models::{CrossingEvent, ParticleType, Position, SourceSite};
//! use surface_source_core_rs::SurfaceSourceRecorder;
//!
//! let config = RecorderConfig::from_json_str(
//!     r#"{"seed": 1, "surf_source_write": {"max_particles": 10, "cellto": 2}}"#,
//! ).unwrap();
//! let recorder = SurfaceSourceRecorder::from_config(&config).unwrap().unwrap();
//!
//! let site = SourceSite {
//!     r: Position::new(0.0, 0.0, 0.0),
//!     u: Position::new(0.0, 0.0, 1.0),
//!     e: 1.0e6,
//!     time: 0.0,
//!     wgt: 1.0,
//!     delayed_group: 0,
//!     surf_id: 3,
//!     particle: ParticleType::Neutron,
//! };
//! recorder.record(&CrossingEvent::transmission(site, vec![1].into(), vec![2].into()));
//! recorder.record(&CrossingEvent::transmission(site, vec![2].into(), vec![1].into()));
//!
//! let bank = recorder.finish();
//! assert_eq!(bank.len(), 1);
//! ```

use crate::config::{
    fingerprint, ConfigError, OutputConfig, RecorderConfig, SurfSourceWriteSettings,
};
use crate::error::{RecorderError, Result};
use crate::filter::CaptureFilter;
use crate::io::{write_source_file, SourceBank, SourceFormat};
use crate::models::CrossingEvent;
use crate::reservoir::{Admission, ReservoirSnapshot, ReservoirStats, SourceReservoir};
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::info;

/// Per-crossing callback implemented by anything the transport loop feeds
pub trait CrossingObserver: Sync {
    fn on_crossing(&self, event: &CrossingEvent);
}

/// Recorder counters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RecorderStats {
    /// Crossings rejected by the filter
    pub rejected: u64,
    pub reservoir: ReservoirStats,
}

/// Filtered, bounded recorder of surface crossings
#[derive(Debug)]
pub struct SurfaceSourceRecorder {
    filter: CaptureFilter,
    reservoir: SourceReservoir,
    rejected: AtomicU64,
}

impl SurfaceSourceRecorder {
    /// Create a recorder for a validated filter
    ///
    /// # Errors
    ///
    /// `RecorderError::CapacityTooLarge` if `max_particles` does not fit
    /// in `usize`
    pub fn new(filter: CaptureFilter, seed: u64) -> Result<Self> {
        let capacity = usize::try_from(filter.max_particles())
            .map_err(|_| RecorderError::CapacityTooLarge(filter.max_particles()))?;

        info!(
            max_particles = filter.max_particles(),
            surface_ids = ?filter.surface_ids(),
            cell_filter = ?filter.cell_restriction(),
            seed,
            "surface source recorder initialized"
        );

        Ok(Self {
            reservoir: SourceReservoir::new(capacity, seed),
            filter,
            rejected: AtomicU64::new(0),
        })
    }

    /// Build from raw settings
    pub fn from_settings(settings: &SurfSourceWriteSettings, seed: u64) -> Result<Self> {
        Self::new(settings.validate()?, seed)
    }

    /// Build from a run configuration
    ///
    /// Returns `Ok(None)` when `surf_source_write` is not configured.
    pub fn from_config(config: &RecorderConfig) -> Result<Option<Self>> {
        config
            .surf_source_write
            .as_ref()
            .map(|settings| Self::from_settings(settings, config.seed))
            .transpose()
    }

    pub fn filter(&self) -> &CaptureFilter {
        &self.filter
    }

    /// Fingerprint of the filter configuration
    pub fn fingerprint(&self) -> std::result::Result<String, ConfigError> {
        fingerprint(&SurfSourceWriteSettings::from(&self.filter))
    }

    /// Process one crossing
    ///
    /// Returns `None` if the filter rejected the crossing.
    pub fn record(&self, event: &CrossingEvent) -> Option<Admission> {
        debug_assert!(
            event.site.has_unit_direction(),
            "direction must be a unit vector"
        );
        if !self.filter.qualifies(event) {
            self.rejected.fetch_add(1, Ordering::Relaxed);
            return None;
        }
        Some(self.reservoir.offer(event.site))
    }

    pub fn stats(&self) -> RecorderStats {
        RecorderStats {
            rejected: self.rejected.load(Ordering::Relaxed),
            reservoir: self.reservoir.stats(),
        }
    }

    /// Retained sites so far, without stopping the recorder
    pub fn snapshot(&self) -> ReservoirSnapshot {
        self.reservoir.snapshot()
    }

    /// Stop recording and return the retained bank
    pub fn finish(self) -> SourceBank {
        let stats = self.stats();
        let bank = SourceBank::from(self.reservoir.into_snapshot());
        info!(
            seen = bank.seen_count,
            retained = bank.len(),
            rejected = stats.rejected,
            "surface source recording finished"
        );
        bank
    }

    /// Stop recording and write the bank to `path`
    pub fn write_to(self, path: impl AsRef<Path>, format: SourceFormat) -> Result<SourceBank> {
        let fingerprint = self.fingerprint()?;
        let bank = self.finish();
        write_source_file(path.as_ref(), &bank, format)?;
        info!(config = %fingerprint, "surface source configuration fingerprint");
        Ok(bank)
    }

    /// Stop recording and write the bank where `output` says
    pub fn write(self, output: &OutputConfig) -> Result<SourceBank> {
        self.write_to(&output.path, output.resolved_format())
    }
}

impl CrossingObserver for SurfaceSourceRecorder {
    fn on_crossing(&self, event: &CrossingEvent) {
        self.record(event);
    }
}
