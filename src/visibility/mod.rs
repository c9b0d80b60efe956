//! Visibility and per-observer views.
//!
//! A `VisibilityFilter` decides which objects a player (or a spectator)
//! may see; `ObserverView::build` applies it to the whole object graph and
//! strips private properties. The manager raises `VisibilityChanged` when an
//! object moves between zones of different visibility class, so views can
//! be refreshed selectively.

mod filter;
mod view;

pub use filter::{AlwaysVisible, VisibilityFilter, ZoneVisibilityFilter};
pub use view::{ObjectView, ObserverView};
