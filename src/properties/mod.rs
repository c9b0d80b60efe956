//! Property system.
//!
//! Properties are named, typed slots that objects carry. Each one is
//! described once by a `PropertyBase` in a `PropertyRegistry`:
//!
//! - **Modifiable** properties may be targeted by effects.
//! - **Attached** properties may be set on any object, whatever its kind
//!   declares ("lands played this turn" lives on player objects without the
//!   player kind declaring it).
//! - **Private** properties are only shown to the owning player.
//!
//! Registries are frozen before a game starts and shared through `Arc`.

mod property;
mod registry;
mod standard;
mod value;

pub use property::{ObjectKind, Property, PropertyBase, PropertyFlags, PropertyId};
pub use registry::{PropertyRegistry, PropertyRegistryBuilder};
pub use standard::StandardProperties;
pub use value::{PropertyType, Value, ValueKind};
