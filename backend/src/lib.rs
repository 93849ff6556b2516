//! Surface Source Recorder - Rust Core
//!
//! Records particle states at surface crossings during a Monte Carlo
//! transport run and writes a bounded, reproducible sample of them to a
//! surface source file.
//!
//! # Architecture
//!
//! - **config**: Settings document and validation
//! - **models**: Domain types (SourceSite, CrossingEvent)
//! - **filter**: Surface and cell filtering of crossings
//! - **reservoir**: Bounded, thread-safe reservoir sampling
//! - **recorder**: Per-crossing entry point for the transport engine
//! - **io**: Binary/JSON surface source files and comparison
//! - **merge**: Combining reservoirs from independent processes
//! - **rng**: Deterministic random number generation
//!
//! # Critical Invariants
//!
//! 1. Never more than `max_particles` sites are retained
//! 2. All randomness is deterministic (seed + event sequence number)
//! 3. Below capacity, the retained set does not depend on thread count

// Module declarations
pub mod config;
pub mod error;
pub mod filter;
pub mod io;
pub mod merge;
pub mod models;
pub mod recorder;
pub mod reservoir;
pub mod rng;

// Re-exports for convenience
pub use config::{ConfigError, OutputConfig, RecorderConfig, SurfSourceWriteSettings};
pub use error::{RecorderError, Result};
pub use filter::{CaptureFilter, CellRestriction};
pub use io::{
    compare_banks, read_source_file, write_source_file, FormatError, SourceBank, SourceFormat,
    SourceMismatch,
};
pub use merge::merge_snapshots;
pub use models::{
    BoundaryKind, CellId, CoordStack, CrossingEvent, ParticleType, Position, SourceSite, SurfaceId,
};
pub use recorder::{CrossingObserver, RecorderStats, SurfaceSourceRecorder};
pub use reservoir::{Admission, ReservoirSnapshot, ReservoirStats, SourceReservoir};
pub use rng::RngManager;

// FFI module (when feature enabled)
#[cfg(feature = "pyo3")]
pub mod ffi;

#[cfg(feature = "pyo3")]
use pyo3::prelude::*;

#[cfg(feature = "pyo3")]
#[pymodule]
fn surface_source_core_rs(m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_class::<ffi::recorder::PySurfaceSourceRecorder>()?;
    m.add_function(wrap_pyfunction!(ffi::recorder::py_read_source_file, m)?)?;
    Ok(())
}
