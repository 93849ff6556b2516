//! Domain models for the surface source recorder

pub mod crossing;
pub mod site;

// Re-exports
pub use crossing::{BoundaryKind, CellId, CoordStack, CrossingEvent};
pub use site::{sort_canonical, ParticleType, Position, SourceSite, SurfaceId, UnknownParticle};
