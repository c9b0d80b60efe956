//! Zone system for object locations.
//!
//! Objects keep their id while they move between zones; the zone table is
//! the only place that records where an object is and in what order.
//!
//! ## Key Types
//!
//! - `Zone`: a zone kind plus the owning seat for per-player zones
//! - `ZoneVisibility`: who may observe a zone's contents
//! - `ZoneManager`: location tracking and movement
//! - `ZonePosition`: insertion point within a zone

pub mod manager;

pub use manager::{Zone, ZoneKind, ZoneManager, ZonePosition, ZoneVisibility};
