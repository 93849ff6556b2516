//! Deterministic random number generation
//!
//! Uses xorshift64* for every draw the recorder makes. Reservoir decisions
//! never use thread-local state: each qualifying crossing gets its own
//! stream keyed by `(seed, sequence number)`.

mod xorshift;

pub use xorshift::{mix64, RngManager};
