//! Type conversion utilities for FFI boundary
//!
//! Converts between Python dicts and recorder types.

use pyo3::prelude::*;
use pyo3::types::PyDict;

use crate::config::SurfSourceWriteSettings;
use crate::models::{BoundaryKind, ParticleType, Position, SourceSite};

// ========================================================================
// PyDict Extraction Helpers
// ========================================================================

/// Extract a required field from a Python dict with a clear error message.
fn extract_required<T>(dict: &Bound<'_, PyDict>, key: &str) -> PyResult<T>
where
    T: for<'py> FromPyObject<'py>,
{
    dict.get_item(key)?
        .ok_or_else(|| {
            PyErr::new::<pyo3::exceptions::PyValueError, _>(format!(
                "Missing required field '{}'",
                key
            ))
        })?
        .extract()
}

/// Extract an optional field; errors only on type conversion failure.
fn extract_optional<T>(dict: &Bound<'_, PyDict>, key: &str) -> PyResult<Option<T>>
where
    T: for<'py> FromPyObject<'py>,
{
    match dict.get_item(key)? {
        Some(value) if !value.is_none() => Ok(Some(value.extract()?)),
        _ => Ok(None),
    }
}

fn extract_with_default<T>(dict: &Bound<'_, PyDict>, key: &str, default: T) -> PyResult<T>
where
    T: for<'py> FromPyObject<'py>,
{
    Ok(extract_optional(dict, key)?.unwrap_or(default))
}

fn value_error(msg: String) -> PyErr {
    PyErr::new::<pyo3::exceptions::PyValueError, _>(msg)
}

// ========================================================================
// Settings
// ========================================================================

/// Convert the `surf_source_write` dict into raw settings
///
/// Unknown keys are rejected; validation happens later so the caller sees
/// the recorder's own error messages.
pub fn parse_surf_source_write(dict: &Bound<'_, PyDict>) -> PyResult<SurfSourceWriteSettings> {
    const KEYS: [&str; 5] = ["max_particles", "surface_ids", "cell", "cellfrom", "cellto"];
    for key in dict.keys() {
        let key: String = key.extract()?;
        if !KEYS.contains(&key.as_str()) {
            return Err(value_error(format!(
                "Unknown surf_source_write key '{}'",
                key
            )));
        }
    }

    Ok(SurfSourceWriteSettings {
        max_particles: extract_optional(dict, "max_particles")?,
        surface_ids: extract_optional(dict, "surface_ids")?,
        cell: extract_optional(dict, "cell")?,
        cellfrom: extract_optional(dict, "cellfrom")?,
        cellto: extract_optional(dict, "cellto")?,
    })
}

/// Convert raw settings back into a dict with only the set keys
pub fn surf_source_write_to_py<'py>(
    py: Python<'py>,
    settings: &SurfSourceWriteSettings,
) -> PyResult<Bound<'py, PyDict>> {
    let dict = PyDict::new_bound(py);
    if let Some(v) = settings.max_particles {
        dict.set_item("max_particles", v)?;
    }
    if let Some(ids) = &settings.surface_ids {
        dict.set_item("surface_ids", ids.clone())?;
    }
    if let Some(v) = settings.cell {
        dict.set_item("cell", v)?;
    }
    if let Some(v) = settings.cellfrom {
        dict.set_item("cellfrom", v)?;
    }
    if let Some(v) = settings.cellto {
        dict.set_item("cellto", v)?;
    }
    Ok(dict)
}

// ========================================================================
// Sites
// ========================================================================

pub fn parse_boundary(name: &str) -> PyResult<BoundaryKind> {
    match name {
        "transmission" => Ok(BoundaryKind::Transmission),
        "vacuum" => Ok(BoundaryKind::Vacuum),
        "reflective" => Ok(BoundaryKind::Reflective),
        "periodic" => Ok(BoundaryKind::Periodic),
        other => Err(value_error(format!("Unknown boundary type '{}'", other))),
    }
}

/// Convert a site dict (`r`, `u`, `E`, `surf_id`, ...) to a `SourceSite`
pub fn parse_site(dict: &Bound<'_, PyDict>) -> PyResult<SourceSite> {
    let r: [f64; 3] = extract_required(dict, "r")?;
    let u: [f64; 3] = extract_required(dict, "u")?;
    let particle_code: i32 = extract_with_default(dict, "particle", 0)?;
    let particle = ParticleType::try_from(particle_code).map_err(|e| value_error(e.to_string()))?;

    Ok(SourceSite {
        r: Position::from(r),
        u: Position::from(u),
        e: extract_required(dict, "E")?,
        time: extract_with_default(dict, "time", 0.0)?,
        wgt: extract_with_default(dict, "wgt", 1.0)?,
        delayed_group: extract_with_default(dict, "delayed_group", 0)?,
        surf_id: extract_required(dict, "surf_id")?,
        particle,
    })
}

pub fn site_to_py<'py>(py: Python<'py>, site: &SourceSite) -> PyResult<Bound<'py, PyDict>> {
    let dict = PyDict::new_bound(py);
    dict.set_item("r", site.r.to_array().to_vec())?;
    dict.set_item("u", site.u.to_array().to_vec())?;
    dict.set_item("E", site.e)?;
    dict.set_item("time", site.time)?;
    dict.set_item("wgt", site.wgt)?;
    dict.set_item("delayed_group", site.delayed_group)?;
    dict.set_item("surf_id", site.surf_id)?;
    dict.set_item("particle", site.particle.code())?;
    Ok(dict)
}

#[cfg(all(test, feature = "pyo3"))]
mod tests {
    use super::*;
    use pyo3::exceptions::PyValueError;

    #[test]
    fn test_surf_source_write_dict_round_trip() {
        pyo3::prepare_freethreaded_python();
        Python::with_gil(|py| {
            let dict = PyDict::new_bound(py);
            dict.set_item("max_particles", 200u64).unwrap();
            dict.set_item("surface_ids", vec![4, 5]).unwrap();
            dict.set_item("cellto", 2).unwrap();
            dict.set_item("cell", py.None()).unwrap();

            let settings = parse_surf_source_write(&dict).unwrap();
            assert_eq!(settings.max_particles, Some(200));
            assert_eq!(settings.surface_ids, Some(vec![4, 5]));
            assert_eq!(settings.cellto, Some(2));
            assert_eq!(settings.cell, None);

            let back = surf_source_write_to_py(py, &settings).unwrap();
            assert_eq!(back.len(), 3);
            assert!(back.get_item("cell").unwrap().is_none());
        });
    }

    #[test]
    fn test_unknown_key_is_value_error() {
        pyo3::prepare_freethreaded_python();
        Python::with_gil(|py| {
            let dict = PyDict::new_bound(py);
            dict.set_item("max_particle", 10).unwrap();
            let err = parse_surf_source_write(&dict).unwrap_err();
            assert!(err.is_instance_of::<PyValueError>(py));
            assert!(err.to_string().contains("'max_particle'"));
        });
    }

    #[test]
    fn test_site_dict_defaults_and_particle_codes() {
        pyo3::prepare_freethreaded_python();
        Python::with_gil(|py| {
            let dict = PyDict::new_bound(py);
            dict.set_item("r", vec![1.0, 2.0, 3.0]).unwrap();
            dict.set_item("u", vec![0.0, 0.0, 1.0]).unwrap();
            dict.set_item("E", 1.0e6).unwrap();
            dict.set_item("surf_id", 7).unwrap();

            let site = parse_site(&dict).unwrap();
            assert_eq!(site.particle, ParticleType::Neutron);
            assert_eq!(site.wgt, 1.0);
            assert_eq!(site.r, Position::new(1.0, 2.0, 3.0));

            dict.set_item("particle", 9).unwrap();
            assert!(parse_site(&dict)
                .unwrap_err()
                .is_instance_of::<PyValueError>(py));
        });
    }
}
