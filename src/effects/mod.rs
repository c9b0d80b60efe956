//! Effect engine.
//!
//! Effects layer continuous modifications on top of stored property values:
//! - `Effect`: one modification of one modifiable property
//! - `EffectContext`: read access to other effective values, with the
//!   recursion guard that turns cyclic dependencies into `CyclicEffect`
//! - `Condition`: predicates for conditional effects
//!
//! Effects are attached to objects through `AttachEffectCommand` so that
//! attaching and detaching them is undoable like any other change.

mod builtin;
mod condition;
mod context;
mod effect;

pub use builtin::{AddInt, AddPropertyValue, ConditionalEffect, SetValue, SET_LAYER};
pub use condition::{AndCondition, Condition, InZone, NotCondition, OrCondition, PropertyEquals};
pub use context::EffectContext;
pub use effect::{ensure_modifiable, Effect, EffectId, EffectInstance};
