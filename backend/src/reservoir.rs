//! Bounded reservoir of surface source sites
//!
//! A fixed-capacity slot arena plus one monotonically increasing counter.
//! Every qualifying crossing goes through [`SourceReservoir::offer`], which
//! claims a global sequence number with a single atomic increment and then
//! maybe writes one slot (algorithm R).
//!
//! # Critical Invariants
//!
//! - **Capacity**: at most `capacity` sites are ever retained
//! - **Uniformity**: every offered site has the same probability of being
//!   retained at the end of the run
//! - **Determinism**: the retained set depends only on which site got which
//!   sequence number and on the seed, never on thread scheduling. A slot
//!   keeps the write with the highest sequence number, so racing writers
//!   that land out of order still produce the same contents.

use crate::models::SourceSite;
use crate::rng::RngManager;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::{debug, trace};

#[derive(Debug, Clone, Copy)]
struct Slot {
    seq: u64,
    site: SourceSite,
}

/// Logical outcome of offering one site
///
/// The outcome is a function of the sequence number alone: a site that was
/// stored and later overwritten still reports `Stored`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    /// Reservoir not yet full; site written to slot `seq`
    Stored { seq: u64, slot: usize },
    /// Reservoir full; site drew `slot` and overwrote it
    Replaced { seq: u64, slot: usize },
    /// Reservoir full; draw fell outside the arena
    Discarded { seq: u64 },
}

impl Admission {
    pub fn seq(&self) -> u64 {
        match *self {
            Admission::Stored { seq, .. }
            | Admission::Replaced { seq, .. }
            | Admission::Discarded { seq } => seq,
        }
    }

    pub fn is_retained(&self) -> bool {
        !matches!(self, Admission::Discarded { .. })
    }
}

/// Reservoir counters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ReservoirStats {
    pub capacity: usize,
    /// Sites offered so far (`seen_count`)
    pub seen: u64,
    /// `min(seen, capacity)`
    pub retained: usize,
    /// Offers past capacity that overwrote a slot
    pub replaced: u64,
    /// Offers past capacity that were dropped
    pub discarded: u64,
}

/// Retained contents of a reservoir at one point in time
#[derive(Debug, Clone, PartialEq)]
pub struct ReservoirSnapshot {
    pub capacity: usize,
    /// Sites offered to the reservoir, including discarded ones
    pub seen: u64,
    /// Retained sites in slot order
    pub sites: Vec<SourceSite>,
}

impl ReservoirSnapshot {
    pub fn empty(capacity: usize) -> Self {
        Self {
            capacity,
            seen: 0,
            sites: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.sites.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sites.is_empty()
    }
}

/// Thread-safe bounded reservoir
///
/// Shared by reference between worker threads; all mutation goes through
/// [`offer`](Self::offer).
pub struct SourceReservoir {
    capacity: usize,
    seed: u64,
    seen: AtomicU64,
    replaced: AtomicU64,
    discarded: AtomicU64,
    slots: Box<[Mutex<Option<Slot>>]>,
}

impl SourceReservoir {
    /// Create an empty reservoir
    ///
    /// The whole arena is allocated up front.
    ///
    /// # Panics
    /// Panics if `capacity` is zero
    pub fn new(capacity: usize, seed: u64) -> Self {
        assert!(capacity > 0, "capacity must be positive");
        let slots = (0..capacity).map(|_| Mutex::new(None)).collect();
        Self {
            capacity,
            seed,
            seen: AtomicU64::new(0),
            replaced: AtomicU64::new(0),
            discarded: AtomicU64::new(0),
            slots,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Qualifying sites offered so far
    pub fn seen(&self) -> u64 {
        self.seen.load(Ordering::Acquire)
    }

    /// Claim a sequence number for `site` and maybe store it
    pub fn offer(&self, site: SourceSite) -> Admission {
        let seq = self.seen.fetch_add(1, Ordering::AcqRel);
        let cap = self.capacity as u64;

        let slot = if seq < cap {
            seq as usize
        } else {
            if seq == cap {
                debug!(capacity = self.capacity, "surface source reservoir full, sampling");
            }
            let j = RngManager::for_sequence(self.seed, seq).below(seq + 1);
            if j >= cap {
                self.discarded.fetch_add(1, Ordering::Relaxed);
                return Admission::Discarded { seq };
            }
            self.replaced.fetch_add(1, Ordering::Relaxed);
            trace!(seq, slot = j, "replacing surface source site");
            j as usize
        };

        {
            let mut cell = self.slots[slot].lock();
            match *cell {
                // A later sequence number already owns the slot
                Some(existing) if existing.seq > seq => {}
                _ => *cell = Some(Slot { seq, site }),
            }
        }

        if seq < cap {
            Admission::Stored { seq, slot }
        } else {
            Admission::Replaced { seq, slot }
        }
    }

    pub fn stats(&self) -> ReservoirStats {
        let seen = self.seen();
        ReservoirStats {
            capacity: self.capacity,
            seen,
            retained: seen.min(self.capacity as u64) as usize,
            replaced: self.replaced.load(Ordering::Relaxed),
            discarded: self.discarded.load(Ordering::Relaxed),
        }
    }

    /// Copy of the currently retained sites
    ///
    /// Slots whose writer has claimed a sequence number but not yet landed
    /// are skipped.
    pub fn snapshot(&self) -> ReservoirSnapshot {
        let sites = self
            .slots
            .iter()
            .filter_map(|cell| {
                let slot = *cell.lock();
                slot.map(|slot| slot.site)
            })
            .collect();
        ReservoirSnapshot {
            capacity: self.capacity,
            seen: self.seen(),
            sites,
        }
    }

    /// Consume the reservoir once all writers are done
    pub fn into_snapshot(self) -> ReservoirSnapshot {
        let seen = self.seen.into_inner();
        let sites = self
            .slots
            .into_vec()
            .into_iter()
            .filter_map(|cell| cell.into_inner().map(|slot| slot.site))
            .collect();
        ReservoirSnapshot {
            capacity: self.capacity,
            seen,
            sites,
        }
    }
}

impl std::fmt::Debug for SourceReservoir {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SourceReservoir")
            .field("seed", &self.seed)
            .field("stats", &self.stats())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ParticleType, Position};

    fn site(i: u64) -> SourceSite {
        SourceSite {
            r: Position::new(i as f64, 0.0, 0.0),
            u: Position::new(0.0, 1.0, 0.0),
            e: 1.0,
            time: 0.0,
            wgt: 1.0,
            delayed_group: 0,
            surf_id: 1,
            particle: ParticleType::Neutron,
        }
    }

    #[test]
    fn test_fills_in_order_below_capacity() {
        let reservoir = SourceReservoir::new(4, 1);
        for i in 0..3 {
            assert_eq!(
                reservoir.offer(site(i)),
                Admission::Stored {
                    seq: i,
                    slot: i as usize
                }
            );
        }
        let snap = reservoir.into_snapshot();
        assert_eq!(snap.seen, 3);
        assert_eq!(snap.sites, vec![site(0), site(1), site(2)]);
    }

    #[test]
    fn test_stats_past_capacity() {
        let reservoir = SourceReservoir::new(5, 3);
        for i in 0..100 {
            reservoir.offer(site(i));
        }
        let stats = reservoir.stats();
        assert_eq!(stats.seen, 100);
        assert_eq!(stats.retained, 5);
        assert_eq!(stats.replaced + stats.discarded, 95);
        assert_eq!(reservoir.snapshot().len(), 5);
    }

    #[test]
    fn test_late_lower_sequence_does_not_overwrite() {
        let reservoir = SourceReservoir::new(2, 1);
        // Emulate a writer holding seq 5 landing before seq 1 does.
        *reservoir.slots[1].lock() = Some(Slot {
            seq: 5,
            site: site(5),
        });
        reservoir.offer(site(0));
        reservoir.offer(site(1));
        let snap = reservoir.into_snapshot();
        assert_eq!(snap.sites, vec![site(0), site(5)]);
    }

    #[test]
    fn test_admission_is_function_of_sequence() {
        let a = SourceReservoir::new(3, 42);
        let b = SourceReservoir::new(3, 42);
        for i in 0..50 {
            assert_eq!(a.offer(site(i)), b.offer(site(1000 + i)));
        }
    }
}
