//! Source site model
//!
//! A `SourceSite` is the persisted form of one surface crossing: exactly
//! the fields a downstream simulation needs to restart a particle from the
//! surface.
//!
//! # Critical Invariants
//!
//! 1. `u` is a unit vector
//! 2. `surf_id` is the id of the crossed surface, never a cell id
//! 3. The field set is fixed: position (3), direction (3), energy, time,
//!    weight, delayed group, surface id, particle type

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use thiserror::Error;

/// User-facing surface identifier
pub type SurfaceId = i32;

/// Tolerance on |u| - 1 for a direction to count as normalized
const UNIT_TOLERANCE: f64 = 1e-8;

/// Cartesian triple used for both positions and directions
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Position {
    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    pub fn dot(&self, other: &Position) -> f64 {
        self.x * other.x + self.y * other.y + self.z * other.z
    }

    pub fn norm(&self) -> f64 {
        self.dot(self).sqrt()
    }

    pub fn to_array(self) -> [f64; 3] {
        [self.x, self.y, self.z]
    }
}

impl From<[f64; 3]> for Position {
    fn from(v: [f64; 3]) -> Self {
        Self::new(v[0], v[1], v[2])
    }
}

/// Particle type tag carried through unchanged by the recorder
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(into = "i32", try_from = "i32")]
pub enum ParticleType {
    Neutron,
    Photon,
    Electron,
    Positron,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("Unknown particle type code: {0}")]
pub struct UnknownParticle(pub i32);

impl ParticleType {
    pub fn code(self) -> i32 {
        match self {
            ParticleType::Neutron => 0,
            ParticleType::Photon => 1,
            ParticleType::Electron => 2,
            ParticleType::Positron => 3,
        }
    }
}

impl From<ParticleType> for i32 {
    fn from(p: ParticleType) -> i32 {
        p.code()
    }
}

impl TryFrom<i32> for ParticleType {
    type Error = UnknownParticle;

    fn try_from(code: i32) -> Result<Self, Self::Error> {
        match code {
            0 => Ok(ParticleType::Neutron),
            1 => Ok(ParticleType::Photon),
            2 => Ok(ParticleType::Electron),
            3 => Ok(ParticleType::Positron),
            other => Err(UnknownParticle(other)),
        }
    }
}

/// One stored surface source point
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SourceSite {
    /// Position at the crossing
    pub r: Position,

    /// Direction (unit vector)
    pub u: Position,

    /// Energy [eV]
    #[serde(rename = "E")]
    pub e: f64,

    /// Time [s]
    pub time: f64,

    /// Statistical weight
    pub wgt: f64,

    /// Delayed group (0 for prompt particles)
    pub delayed_group: i32,

    /// Crossed surface
    pub surf_id: SurfaceId,

    pub particle: ParticleType,
}

impl SourceSite {
    /// Whether `u` is a unit vector within tolerance
    pub fn has_unit_direction(&self) -> bool {
        (self.u.norm() - 1.0).abs() <= UNIT_TOLERANCE
    }

    /// Flat numeric view in serialization order
    pub fn values(&self) -> [f64; 12] {
        [
            self.r.x,
            self.r.y,
            self.r.z,
            self.u.x,
            self.u.y,
            self.u.z,
            self.e,
            self.time,
            self.wgt,
            f64::from(self.delayed_group),
            f64::from(self.surf_id),
            f64::from(self.particle.code()),
        ]
    }

    /// Sort key built from every field
    ///
    /// Two files holding the same set of sites produce the same sequence
    /// of keys once sorted, whatever order the sites were written in.
    pub fn canonical_key(&self) -> String {
        format!(
            "{:.10e} {:.10e} {:.10e} {:.10e} {:.10e} {:.10e} {:.10e} {:.10e} {:.10e} {} {} {}",
            self.r.x,
            self.r.y,
            self.r.z,
            self.u.x,
            self.u.y,
            self.u.z,
            self.e,
            self.time,
            self.wgt,
            self.delayed_group,
            self.surf_id,
            self.particle.code()
        )
    }

    /// Total order consistent with `canonical_key`, with exact float
    /// comparison as a tiebreaker
    pub fn canonical_cmp(&self, other: &SourceSite) -> Ordering {
        self.canonical_key()
            .cmp(&other.canonical_key())
            .then_with(|| {
                self.values()
                    .iter()
                    .zip(other.values().iter())
                    .map(|(a, b)| a.total_cmp(b))
                    .find(|o| o.is_ne())
                    .unwrap_or(Ordering::Equal)
            })
    }
}

impl fmt::Display for SourceSite {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "surf {} r=({:.6}, {:.6}, {:.6}) u=({:.6}, {:.6}, {:.6}) E={:.6e} wgt={}",
            self.surf_id,
            self.r.x,
            self.r.y,
            self.r.z,
            self.u.x,
            self.u.y,
            self.u.z,
            self.e,
            self.wgt
        )
    }
}

/// Sort sites into canonical order in place
pub fn sort_canonical(sites: &mut [SourceSite]) {
    // Keys are computed once; formatting dominates the comparison cost.
    let mut keyed: Vec<(String, SourceSite)> =
        sites.iter().map(|s| (s.canonical_key(), *s)).collect();
    keyed.sort_by(|a, b| a.0.cmp(&b.0).then_with(|| a.1.canonical_cmp(&b.1)));
    for (slot, (_, site)) in sites.iter_mut().zip(keyed) {
        *slot = site;
    }
}
