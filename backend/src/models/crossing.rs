//! Surface crossing events
//!
//! The transport engine builds one `CrossingEvent` per surface crossing and
//! hands it to the recorder. The event owns the candidate `SourceSite` plus
//! what the filter needs to decide whether the crossing leaves or enters a
//! given cell.

use super::site::{SourceSite, SurfaceId};
use serde::{Deserialize, Serialize};

/// User-facing cell identifier
pub type CellId = i32;

/// Boundary condition of the crossed surface
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BoundaryKind {
    /// Interior surface; the particle moves to the neighbouring cell
    #[default]
    Transmission,
    /// Particle leaves the geometry
    Vacuum,
    /// Particle is turned back into the cell it came from
    Reflective,
    /// Particle is translated to the matching periodic surface
    Periodic,
}

/// Cells occupied at each coordinate level, root universe first
///
/// A particle nested three universes deep has a stack of three cells.
/// The last entry is the innermost (lowest-level) cell.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CoordStack(Vec<CellId>);

impl CoordStack {
    pub fn new(cells: Vec<CellId>) -> Self {
        Self(cells)
    }

    /// Stack for a particle outside the geometry
    pub fn outside() -> Self {
        Self(Vec::new())
    }

    /// Innermost cell at this coordinate position
    pub fn innermost(&self) -> Option<CellId> {
        self.0.last().copied()
    }

    /// Whether `cell` is occupied at any level
    pub fn contains(&self, cell: CellId) -> bool {
        self.0.contains(&cell)
    }

    pub fn depth(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn cells(&self) -> &[CellId] {
        &self.0
    }
}

impl From<Vec<CellId>> for CoordStack {
    fn from(cells: Vec<CellId>) -> Self {
        Self(cells)
    }
}

/// One particle-surface crossing reported by the transport engine
#[derive(Debug, Clone, PartialEq)]
pub struct CrossingEvent {
    /// Candidate record, including the crossed surface id
    pub site: SourceSite,

    /// Boundary condition of the crossed surface
    pub boundary: BoundaryKind,

    /// Coordinate stack before the crossing
    pub from: CoordStack,

    /// Coordinate stack after the crossing
    ///
    /// Ignored for vacuum, reflective and periodic boundaries; see
    /// [`CrossingEvent::destination`].
    pub to: CoordStack,
}

impl CrossingEvent {
    /// Interior crossing between two cells
    pub fn transmission(site: SourceSite, from: CoordStack, to: CoordStack) -> Self {
        Self {
            site,
            boundary: BoundaryKind::Transmission,
            from,
            to,
        }
    }

    /// Crossing of a boundary surface
    pub fn boundary(site: SourceSite, boundary: BoundaryKind, from: CoordStack) -> Self {
        Self {
            site,
            boundary,
            from,
            to: CoordStack::outside(),
        }
    }

    pub fn surface_id(&self) -> SurfaceId {
        self.site.surf_id
    }

    /// Coordinate stack the particle ends up in
    ///
    /// Vacuum sends the particle out of the geometry. Reflective and
    /// periodic boundaries leave it in the cell it was in.
    pub fn destination(&self) -> &CoordStack {
        static OUTSIDE: CoordStack = CoordStack(Vec::new());
        match self.boundary {
            BoundaryKind::Transmission => &self.to,
            BoundaryKind::Vacuum => &OUTSIDE,
            BoundaryKind::Reflective | BoundaryKind::Periodic => &self.from,
        }
    }

    /// Whether the crossing takes the particle out of `cell`
    pub fn leaves(&self, cell: CellId) -> bool {
        self.from.contains(cell) && !self.destination().contains(cell)
    }

    /// Whether the crossing takes the particle into `cell`
    pub fn enters(&self, cell: CellId) -> bool {
        self.destination().contains(cell) && !self.from.contains(cell)
    }

    /// Innermost cell being left
    pub fn leaving_cell(&self) -> Option<CellId> {
        self.from.innermost()
    }

    /// Innermost cell being entered
    pub fn entering_cell(&self) -> Option<CellId> {
        self.destination().innermost()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::site::{ParticleType, Position};

    fn site() -> SourceSite {
        SourceSite {
            r: Position::new(0.0, 0.0, 0.0),
            u: Position::new(0.0, 0.0, 1.0),
            e: 2.0e6,
            time: 0.0,
            wgt: 1.0,
            delayed_group: 0,
            surf_id: 5,
            particle: ParticleType::Neutron,
        }
    }

    #[test]
    fn test_nested_container_is_not_crossed() {
        // box cell 3 holds both the core (1) and the water around it (2)
        let ev = CrossingEvent::transmission(site(), vec![3, 1].into(), vec![3, 2].into());
        assert!(ev.leaves(1));
        assert!(ev.enters(2));
        assert!(!ev.leaves(3));
        assert!(!ev.enters(3));
    }

    #[test]
    fn test_differing_depths() {
        let ev = CrossingEvent::transmission(site(), vec![3, 2].into(), vec![4].into());
        assert!(ev.leaves(3));
        assert!(ev.leaves(2));
        assert!(ev.enters(4));
        assert_eq!(ev.leaving_cell(), Some(2));
        assert_eq!(ev.entering_cell(), Some(4));
    }

    #[test]
    fn test_vacuum_and_reflective_destinations() {
        let vacuum = CrossingEvent::boundary(site(), BoundaryKind::Vacuum, vec![3].into());
        assert!(vacuum.leaves(3));
        assert_eq!(vacuum.entering_cell(), None);

        let reflective =
            CrossingEvent::boundary(site(), BoundaryKind::Reflective, vec![3].into());
        assert!(!reflective.leaves(3));
        assert!(!reflective.enters(3));
        assert_eq!(reflective.entering_cell(), Some(3));
    }
}
