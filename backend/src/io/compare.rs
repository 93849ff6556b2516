//! Order-independent comparison of surface source banks
//!
//! Both banks are put in canonical order, then compared record by record
//! with a relative tolerance on every field.

use crate::models::{sort_canonical, SourceSite};
use thiserror::Error;

/// Default relative tolerance used for reference comparisons
pub const DEFAULT_RTOL: f64 = 1e-7;

/// Field names in serialization order
pub const FIELD_NAMES: [&str; 12] = [
    "r.x",
    "r.y",
    "r.z",
    "u.x",
    "u.y",
    "u.z",
    "E",
    "time",
    "wgt",
    "delayed_group",
    "surf_id",
    "particle",
];

#[derive(Debug, Clone, PartialEq, Error)]
pub enum SourceMismatch {
    #[error("record count differs: expected {expected}, found {actual}")]
    Length { expected: usize, actual: usize },

    #[error("record {index} field {field}: expected {expected}, found {actual}")]
    Field {
        index: usize,
        field: &'static str,
        expected: f64,
        actual: f64,
    },
}

/// Relative-tolerance match for one field
///
/// NaN only matches NaN, and an infinity only matches the same infinity.
fn field_matches(expected: f64, actual: f64, rtol: f64) -> bool {
    if expected.is_nan() || actual.is_nan() {
        return expected.is_nan() && actual.is_nan();
    }
    if expected.is_infinite() || actual.is_infinite() {
        return expected == actual;
    }
    (actual - expected).abs() <= rtol * expected.abs()
}

/// Compare two banks as unordered sets of sites
///
/// A field matches when `|actual - expected| <= rtol * |expected|`.
/// Non-finite values must agree exactly.
pub fn compare_banks(
    expected: &[SourceSite],
    actual: &[SourceSite],
    rtol: f64,
) -> Result<(), SourceMismatch> {
    if expected.len() != actual.len() {
        return Err(SourceMismatch::Length {
            expected: expected.len(),
            actual: actual.len(),
        });
    }

    let mut expected = expected.to_vec();
    let mut actual = actual.to_vec();
    sort_canonical(&mut expected);
    sort_canonical(&mut actual);

    for (index, (e, a)) in expected.iter().zip(actual.iter()).enumerate() {
        for ((field, ev), av) in FIELD_NAMES.iter().copied().zip(e.values()).zip(a.values()) {
            if !field_matches(ev, av, rtol) {
                return Err(SourceMismatch::Field {
                    index,
                    field,
                    expected: ev,
                    actual: av,
                });
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ParticleType, Position};

    fn site(x: f64) -> SourceSite {
        SourceSite {
            r: Position::new(x, 1.0, 2.0),
            u: Position::new(1.0, 0.0, 0.0),
            e: 1.0e6,
            time: 0.0,
            wgt: 1.0,
            delayed_group: 0,
            surf_id: 3,
            particle: ParticleType::Neutron,
        }
    }

    #[test]
    fn test_order_does_not_matter() {
        let a = [site(1.0), site(2.0), site(3.0)];
        let b = [site(3.0), site(1.0), site(2.0)];
        assert_eq!(compare_banks(&a, &b, DEFAULT_RTOL), Ok(()));
    }

    #[test]
    fn test_length_mismatch() {
        let err = compare_banks(&[site(1.0)], &[], DEFAULT_RTOL).unwrap_err();
        assert_eq!(
            err,
            SourceMismatch::Length {
                expected: 1,
                actual: 0
            }
        );
    }

    #[test]
    fn test_field_mismatch_reported() {
        let mut other = site(1.0);
        other.wgt = 0.5;
        let err = compare_banks(&[site(1.0)], &[other], DEFAULT_RTOL).unwrap_err();
        assert!(matches!(err, SourceMismatch::Field { field: "wgt", .. }));
    }

    #[test]
    fn test_nan_never_matches_a_number() {
        let mut corrupt = site(1.0);
        corrupt.e = f64::NAN;

        let err = compare_banks(&[corrupt], &[site(1.0)], DEFAULT_RTOL).unwrap_err();
        assert!(matches!(err, SourceMismatch::Field { field: "E", .. }));

        let err = compare_banks(&[site(1.0)], &[corrupt], DEFAULT_RTOL).unwrap_err();
        assert!(matches!(err, SourceMismatch::Field { field: "E", .. }));
    }

    #[test]
    fn test_non_finite_values_match_themselves() {
        let mut nan = site(1.0);
        nan.time = f64::NAN;
        assert_eq!(compare_banks(&[nan], &[nan], DEFAULT_RTOL), Ok(()));

        let mut inf = site(1.0);
        inf.e = f64::INFINITY;
        assert_eq!(compare_banks(&[inf], &[inf], DEFAULT_RTOL), Ok(()));

        let mut neg = inf;
        neg.e = f64::NEG_INFINITY;
        assert!(compare_banks(&[inf], &[neg], DEFAULT_RTOL).is_err());
        assert!(compare_banks(&[inf], &[site(1.0)], DEFAULT_RTOL).is_err());
    }

    #[test]
    fn test_within_tolerance() {
        let mut other = site(1.0);
        other.e *= 1.0 + 1e-9;
        assert_eq!(compare_banks(&[site(1.0)], &[other], DEFAULT_RTOL), Ok(()));
    }
}
