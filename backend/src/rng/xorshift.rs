//! xorshift64* random number generator
//!
//! Fast, deterministic, and small enough to be rebuilt for every event.
//!
//! # Determinism
//!
//! Same seed → same sequence. The recorder relies on this to make
//! reservoir decisions a pure function of the global event sequence.

use serde::{Deserialize, Serialize};

/// splitmix64 finalizer
///
/// Spreads structured inputs (small seeds, consecutive sequence numbers)
/// over the whole 64-bit range before they seed a xorshift stream.
#[inline]
pub fn mix64(mut z: u64) -> u64 {
    z = z.wrapping_add(0x9E37_79B9_7F4A_7C15);
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}

/// Deterministic random number generator using xorshift64*
///
/// # Example
/// ```
/// use surface_source_core_rs::RngManager;
///
/// let mut rng = RngManager::new(12345);
/// let value = rng.next();
/// let index = rng.below(100); // [0, 100)
/// assert!(index < 100);
/// # let _ = value;
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RngManager {
    state: u64,
}

impl RngManager {
    /// Create a new RNG with given seed
    pub fn new(seed: u64) -> Self {
        // xorshift must never hold a zero state
        let state = if seed == 0 { 1 } else { seed };
        Self { state }
    }

    /// Stream dedicated to one event of a run
    ///
    /// The stream depends only on the run seed and the event's global
    /// sequence number, never on which thread produced the event.
    ///
    /// # Example
    /// ```
    /// use surface_source_core_rs::RngManager;
    ///
    /// let mut a = RngManager::for_sequence(1, 4096);
    /// let mut b = RngManager::for_sequence(1, 4096);
    /// assert_eq!(a.next(), b.next());
    /// ```
    pub fn for_sequence(seed: u64, seq: u64) -> Self {
        Self::new(mix64(mix64(seed) ^ seq))
    }

    /// Generate next random u64 value
    pub fn next(&mut self) -> u64 {
        let mut x = self.state;
        x ^= x >> 12;
        x ^= x << 25;
        x ^= x >> 27;
        self.state = x;
        x.wrapping_mul(0x2545F4914F6CDD1D)
    }

    /// Generate a value in `[0, bound)`
    ///
    /// # Panics
    /// Panics if `bound` is zero
    pub fn below(&mut self, bound: u64) -> u64 {
        assert!(bound > 0, "bound must be positive");
        self.next() % bound
    }

    /// Get current RNG state (for replay)
    pub fn get_state(&self) -> u64 {
        self.state
    }

    /// Generate random f64 in range [0.0, 1.0)
    pub fn next_f64(&mut self) -> f64 {
        let value = self.next();
        (value >> 11) as f64 * (1.0 / ((1u64 << 53) as f64))
    }

    /// Generate random f64 in range (0.0, 1.0]
    ///
    /// Used where a logarithm of the draw is taken.
    pub fn next_open_f64(&mut self) -> f64 {
        1.0 - self.next_f64()
    }
}
