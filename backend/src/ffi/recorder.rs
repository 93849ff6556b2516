//! PyO3 wrapper for the surface source recorder
//!
//! # Example (from Python)
//!
//! ```python
//! from surface_source._core import SurfaceSourceRecorder
//!
//! rec = SurfaceSourceRecorder({"max_particles": 200, "cellto": 2}, seed=1)
//! rec.record({"r": [0, 0, 0], "u": [0, 0, 1], "E": 1e6, "surf_id": 3},
//!            from_cells=[1], to_cells=[2])
//! rec.write("surface_source.ssrc")
//! ```

use pyo3::prelude::*;
use pyo3::types::{PyDict, PyList};

use super::types::{
    parse_boundary, parse_site, parse_surf_source_write, site_to_py, surf_source_write_to_py,
};
use crate::config::SurfSourceWriteSettings;
use crate::io::{read_source_file, SourceFormat};
use crate::models::{CoordStack, CrossingEvent};
use crate::recorder::SurfaceSourceRecorder as RustRecorder;

fn runtime_error(msg: String) -> PyErr {
    PyErr::new::<pyo3::exceptions::PyRuntimeError, _>(msg)
}

/// Python wrapper for the Rust recorder
#[pyclass(name = "SurfaceSourceRecorder")]
pub struct PySurfaceSourceRecorder {
    inner: Option<RustRecorder>,
}

impl PySurfaceSourceRecorder {
    fn recorder(&self) -> PyResult<&RustRecorder> {
        self.inner
            .as_ref()
            .ok_or_else(|| runtime_error("Recorder has already been written".to_string()))
    }
}

#[pymethods]
impl PySurfaceSourceRecorder {
    /// Create a recorder from a `surf_source_write` dict
    ///
    /// Raises RuntimeError on configuration errors (missing
    /// `max_particles`, more than one of cell/cellfrom/cellto).
    #[new]
    #[pyo3(signature = (settings, seed=1))]
    fn new(settings: &Bound<'_, PyDict>, seed: u64) -> PyResult<Self> {
        let raw = parse_surf_source_write(settings)?;
        let inner = RustRecorder::from_settings(&raw, seed)
            .map_err(|e| runtime_error(e.to_string()))?;
        Ok(Self { inner: Some(inner) })
    }

    /// Report one surface crossing
    ///
    /// Returns True if the site was retained at the time of the call.
    #[pyo3(signature = (site, from_cells, to_cells=Vec::new(), boundary="transmission"))]
    fn record(
        &self,
        site: &Bound<'_, PyDict>,
        from_cells: Vec<i32>,
        to_cells: Vec<i32>,
        boundary: &str,
    ) -> PyResult<bool> {
        let event = CrossingEvent {
            site: parse_site(site)?,
            boundary: parse_boundary(boundary)?,
            from: CoordStack::new(from_cells),
            to: CoordStack::new(to_cells),
        };
        Ok(self
            .recorder()?
            .record(&event)
            .map(|admission| admission.is_retained())
            .unwrap_or(false))
    }

    /// Settings dict equivalent to this recorder's filter
    fn settings<'py>(&self, py: Python<'py>) -> PyResult<Bound<'py, PyDict>> {
        let settings = SurfSourceWriteSettings::from(self.recorder()?.filter());
        surf_source_write_to_py(py, &settings)
    }

    fn stats<'py>(&self, py: Python<'py>) -> PyResult<Bound<'py, PyDict>> {
        let stats = self.recorder()?.stats();
        let dict = PyDict::new_bound(py);
        dict.set_item("seen", stats.reservoir.seen)?;
        dict.set_item("retained", stats.reservoir.retained)?;
        dict.set_item("replaced", stats.reservoir.replaced)?;
        dict.set_item("discarded", stats.reservoir.discarded)?;
        dict.set_item("rejected", stats.rejected)?;
        Ok(dict)
    }

    /// Write the retained set and close the recorder
    #[pyo3(signature = (path, format=None))]
    fn write(&mut self, path: &str, format: Option<&str>) -> PyResult<usize> {
        let format = match format {
            None => SourceFormat::from_path(path.as_ref()).unwrap_or_default(),
            Some("binary") => SourceFormat::Binary,
            Some("json") => SourceFormat::Json,
            Some(other) => return Err(runtime_error(format!("Unknown format '{}'", other))),
        };
        let recorder = self
            .inner
            .take()
            .ok_or_else(|| runtime_error("Recorder has already been written".to_string()))?;
        let bank = recorder
            .write_to(path, format)
            .map_err(|e| runtime_error(e.to_string()))?;
        Ok(bank.len())
    }
}

/// Read a surface source file into a list of site dicts
#[pyfunction(name = "read_source_file")]
pub fn py_read_source_file<'py>(py: Python<'py>, path: &str) -> PyResult<Bound<'py, PyList>> {
    let bank = read_source_file(path).map_err(|e| runtime_error(e.to_string()))?;
    let list = PyList::empty_bound(py);
    for site in &bank.sites {
        list.append(site_to_py(py, site)?)?;
    }
    Ok(list)
}
