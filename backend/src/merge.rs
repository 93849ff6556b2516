//! Merging reservoirs from independent processes
//!
//! Each process keeps its own reservoir. When their combined retained sets
//! exceed the capacity, sites are drawn without replacement with weights
//! proportional to how many crossings each retained site stands for, so
//! a process that saw more crossings contributes proportionally more.

use crate::reservoir::ReservoirSnapshot;
use crate::rng::{mix64, RngManager};
use tracing::debug;

/// Combine per-process snapshots, given in rank order, into one
///
/// The merged `seen` is the sum over all parts. Output sites keep rank
/// order, and slot order within each rank.
///
/// # Panics
/// Panics if `capacity` is zero
pub fn merge_snapshots(
    parts: &[ReservoirSnapshot],
    capacity: usize,
    seed: u64,
) -> ReservoirSnapshot {
    assert!(capacity > 0, "capacity must be positive");

    let seen = parts.iter().map(|p| p.seen).sum();
    let total: usize = parts.iter().map(|p| p.len()).sum();

    if total <= capacity {
        return ReservoirSnapshot {
            capacity,
            seen,
            sites: parts.iter().flat_map(|p| p.sites.iter().copied()).collect(),
        };
    }

    debug!(parts = parts.len(), total, capacity, "merging surface source reservoirs");

    // Weighted sampling without replacement (Efraimidis-Spirakis):
    // key = ln(u) / w, keep the largest keys.
    let mut keyed: Vec<(f64, usize, usize)> = Vec::with_capacity(total);
    for (rank, part) in parts.iter().enumerate() {
        if part.is_empty() {
            continue;
        }
        let weight = part.seen as f64 / part.len() as f64;
        let rank_seed = mix64(seed.wrapping_add(rank as u64));
        for index in 0..part.len() {
            let u = RngManager::for_sequence(rank_seed, index as u64).next_open_f64();
            keyed.push((u.ln() / weight, rank, index));
        }
    }

    keyed.sort_by(|a, b| {
        b.0.total_cmp(&a.0)
            .then_with(|| a.1.cmp(&b.1))
            .then_with(|| a.2.cmp(&b.2))
    });
    keyed.truncate(capacity);
    keyed.sort_by_key(|&(_, rank, index)| (rank, index));

    ReservoirSnapshot {
        capacity,
        seen,
        sites: keyed
            .into_iter()
            .map(|(_, rank, index)| parts[rank].sites[index])
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ParticleType, Position, SourceSite};

    fn part(rank: usize, n: usize, seen: u64) -> ReservoirSnapshot {
        let sites = (0..n)
            .map(|i| SourceSite {
                r: Position::new(rank as f64, i as f64, 0.0),
                u: Position::new(0.0, 0.0, 1.0),
                e: 1.0,
                time: 0.0,
                wgt: 1.0,
                delayed_group: 0,
                surf_id: 1,
                particle: ParticleType::Neutron,
            })
            .collect();
        ReservoirSnapshot {
            capacity: n.max(1),
            seen,
            sites,
        }
    }

    #[test]
    fn test_concatenates_under_capacity() {
        let merged = merge_snapshots(&[part(0, 2, 2), part(1, 3, 3)], 10, 1);
        assert_eq!(merged.len(), 5);
        assert_eq!(merged.seen, 5);
        assert_eq!(merged.sites[0].r.x, 0.0);
        assert_eq!(merged.sites[4].r.x, 1.0);
    }

    #[test]
    fn test_capped_and_deterministic() {
        let parts = [part(0, 50, 500), part(1, 50, 100), part(2, 0, 0)];
        let a = merge_snapshots(&parts, 40, 9);
        let b = merge_snapshots(&parts, 40, 9);
        assert_eq!(a.len(), 40);
        assert_eq!(a.seen, 600);
        assert_eq!(a, b);
    }

    #[test]
    fn test_heavier_rank_contributes_more() {
        let parts = [part(0, 100, 10_000), part(1, 100, 100)];
        let merged = merge_snapshots(&parts, 100, 3);
        let from_heavy = merged.sites.iter().filter(|s| s.r.x == 0.0).count();
        assert!(from_heavy > 80, "heavy rank only contributed {}", from_heavy);
    }
}
