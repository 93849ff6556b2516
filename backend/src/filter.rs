//! Capture filter
//!
//! Decides, per crossing, whether a surface crossing qualifies for the
//! surface source. Evaluation is read-only, so one filter is shared by all
//! worker threads without locking.

use crate::models::{CellId, CrossingEvent, SurfaceId};

/// Cell-based restriction; at most one is active per filter
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CellRestriction {
    /// Crossing leaves or enters the cell (`cell`)
    Either(CellId),
    /// Crossing leaves the cell (`cellfrom`)
    From(CellId),
    /// Crossing enters the cell (`cellto`)
    To(CellId),
}

impl CellRestriction {
    pub fn cell(&self) -> CellId {
        match *self {
            CellRestriction::Either(c) | CellRestriction::From(c) | CellRestriction::To(c) => c,
        }
    }

    /// Settings key this restriction is written under
    pub fn key(&self) -> &'static str {
        match self {
            CellRestriction::Either(_) => "cell",
            CellRestriction::From(_) => "cellfrom",
            CellRestriction::To(_) => "cellto",
        }
    }

    pub fn matches(&self, event: &CrossingEvent) -> bool {
        match *self {
            CellRestriction::Either(c) => event.leaves(c) || event.enters(c),
            CellRestriction::From(c) => event.leaves(c),
            CellRestriction::To(c) => event.enters(c),
        }
    }
}

/// Validated surface source filter
///
/// Built through [`crate::config::SurfSourceWriteSettings::validate`], which
/// guarantees a positive capacity and at most one cell restriction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaptureFilter {
    max_particles: u64,
    surface_ids: Option<Vec<SurfaceId>>,
    cell: Option<CellRestriction>,
}

impl CaptureFilter {
    pub(crate) fn new(
        max_particles: u64,
        surface_ids: Option<Vec<SurfaceId>>,
        cell: Option<CellRestriction>,
    ) -> Self {
        Self {
            max_particles,
            surface_ids,
            cell,
        }
    }

    pub fn max_particles(&self) -> u64 {
        self.max_particles
    }

    pub fn surface_ids(&self) -> Option<&[SurfaceId]> {
        self.surface_ids.as_deref()
    }

    pub fn cell_restriction(&self) -> Option<CellRestriction> {
        self.cell
    }

    /// Whether the crossing qualifies for storage
    ///
    /// Surface membership is checked first; the cell restriction, if any,
    /// then decides on the leaving/entering coordinate stacks.
    pub fn qualifies(&self, event: &CrossingEvent) -> bool {
        if let Some(ids) = &self.surface_ids {
            if !ids.contains(&event.surface_id()) {
                return false;
            }
        }
        match &self.cell {
            Some(restriction) => restriction.matches(event),
            None => true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{BoundaryKind, ParticleType, Position, SourceSite};

    fn event(surf_id: SurfaceId, from: Vec<CellId>, to: Vec<CellId>) -> CrossingEvent {
        let site = SourceSite {
            r: Position::new(0.0, 0.0, 0.0),
            u: Position::new(1.0, 0.0, 0.0),
            e: 1.0,
            time: 0.0,
            wgt: 1.0,
            delayed_group: 0,
            surf_id,
            particle: ParticleType::Neutron,
        };
        CrossingEvent::transmission(site, from.into(), to.into())
    }

    #[test]
    fn test_unrestricted_accepts_everything() {
        let filter = CaptureFilter::new(10, None, None);
        assert!(filter.qualifies(&event(1, vec![1], vec![2])));
        assert!(filter.qualifies(&event(9, vec![3, 1], vec![3, 2])));
    }

    #[test]
    fn test_surface_membership() {
        let filter = CaptureFilter::new(10, Some(vec![4, 5]), None);
        assert!(filter.qualifies(&event(4, vec![1], vec![2])));
        assert!(!filter.qualifies(&event(6, vec![1], vec![2])));
    }

    #[test]
    fn test_cell_restrictions() {
        let out_of_2 = event(1, vec![2], vec![1]);
        let into_2 = event(1, vec![1], vec![2]);

        let cell = CaptureFilter::new(10, None, Some(CellRestriction::Either(2)));
        assert!(cell.qualifies(&out_of_2));
        assert!(cell.qualifies(&into_2));

        let from = CaptureFilter::new(10, None, Some(CellRestriction::From(2)));
        assert!(from.qualifies(&out_of_2));
        assert!(!from.qualifies(&into_2));

        let to = CaptureFilter::new(10, None, Some(CellRestriction::To(2)));
        assert!(!to.qualifies(&out_of_2));
        assert!(to.qualifies(&into_2));
    }

    #[test]
    fn test_reflective_never_matches_cell_restriction() {
        let mut ev = event(7, vec![3], vec![]);
        ev.boundary = BoundaryKind::Reflective;
        let unrestricted = CaptureFilter::new(10, Some(vec![7]), None);
        assert!(unrestricted.qualifies(&ev));
        for r in [
            CellRestriction::Either(3),
            CellRestriction::From(3),
            CellRestriction::To(3),
        ] {
            assert!(!CaptureFilter::new(10, Some(vec![7]), Some(r)).qualifies(&ev));
        }
    }
}
