//! # ccg-rules
//!
//! Rules engine for a Magic-like trading card game: a typed property
//! system, an object model with layered continuous effects, undoable
//! commands grouped into transactions, event-driven scopes and a turn-flow
//! engine driven by player decisions.
//!
//! ## Design Principles
//!
//! 1. **One way to change state**: every mutation is a `Command` executed
//!    through the game's transaction log, so every change can be undone.
//!
//! 2. **Derived values are never stored**: an object's effective value is
//!    its stored (or default) value with the attached effects applied in
//!    `(layer, attach order)`. Results are cached and dropped when anything
//!    they read changes.
//!
//! 3. **Invalid input is not an error**: a part that receives an
//!    unacceptable answer asks again, and its partial changes are rolled
//!    back.
//!
//! ## Architecture
//!
//! - **Persistent object graph**: objects and effects live in `im-rs` maps,
//!   so snapshots for comparison and serialization are cheap.
//!
//! - **Deterministic**: the RNG is seeded from the configuration and its
//!   state is part of the undo record, so replays are exact.
//!
//! ## Modules
//!
//! - `core`: ids, players, configuration, errors, RNG, log sinks
//! - `properties`: property descriptors, values and the registry
//! - `zones`: object locations
//! - `objects`: `Object`, `ObjectManager`, change events, snapshots
//! - `effects`: the `Effect` trait, conditions and built-in effects
//! - `commands`: undoable commands and the transaction log
//! - `scope`: scope markers, the event bus and built-in scopes
//! - `flow`: parts, steps, the sequencer and decision providers
//! - `visibility`: visibility filters and per-observer views
//! - `game`: one game instance wiring everything together

pub mod core;
pub mod properties;
pub mod zones;
pub mod objects;
pub mod effects;
pub mod commands;
pub mod scope;
pub mod flow;
pub mod visibility;
pub mod game;

// Re-export commonly used types
pub use crate::core::{
    EngineConfig, EngineError, EngineResult,
    ObjectId, ObjectRef, PlayerId, PlayerMap,
    GameRng, GameRngState,
    LogSink, MemoryLogSink, NullLogSink, TracingLogSink,
};

pub use crate::properties::{
    ObjectKind, Property, PropertyFlags, PropertyId, PropertyRegistry, StandardProperties, Value, ValueKind,
};

pub use crate::zones::{Zone, ZoneKind, ZonePosition, ZoneVisibility};

pub use crate::objects::{EventKind, GameEvent, ManagerSnapshot, Object, ObjectManager};

pub use crate::effects::{AddInt, AddPropertyValue, ConditionalEffect, Effect, EffectContext, EffectId, SetValue};

pub use crate::commands::{
    Command, MultiCommand, ObjectController, TransactionLog, TransactionToken,
    AttachEffectCommand, CreateObjectCommand, DestroyObjectCommand, DetachEffectCommand,
    MoveObjectCommand, ResetValueCommand, SetValueCommand, ShuffleZoneCommand,
};

pub use crate::scope::{EventBus, GameObjectScope, Scope, ScopeContext, ScopeControl, ScopeId};

pub use crate::flow::{DecisionProvider, Part, PartResult, PassProvider, ScriptedProvider, Sequencer, Step};

pub use crate::visibility::{ObserverView, VisibilityFilter, ZoneVisibilityFilter};

pub use crate::game::{CardSpec, Game};
