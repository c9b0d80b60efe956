//! Object model.
//!
//! - `Object`: a node with a stable id, a kind and its stored values
//! - `ObjectManager`: the authoritative container of one game's objects,
//!   zones and effects
//! - `GameEvent`: change notifications queued by the manager
//! - `ManagerSnapshot`: comparable, serializable view of manager state
//!
//! Readers use the manager directly. Writers go through commands
//! (`crate::commands`) so every change can be undone.

mod event;
mod manager;
mod object;
mod snapshot;

pub use event::{EventKind, GameEvent};
pub use manager::ObjectManager;
pub use object::Object;
pub use snapshot::{EffectRecord, ManagerSnapshot};
