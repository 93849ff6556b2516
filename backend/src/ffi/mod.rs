//! Python bindings
//!
//! Exposes the recorder to the Python scripting layer. Configuration errors
//! raise `RuntimeError` carrying the same messages as the Rust errors.

pub mod recorder;
pub mod types;
