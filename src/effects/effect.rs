//! The `Effect` trait and attached effect instances.
//!
//! An effect transforms one property's value into its effective value. The
//! manager folds every effect attached to an (object, property) pair over
//! the stored base value.
//!
//! ## Ordering
//!
//! Effects on the same pair apply in ascending `(layer, timestamp)` order.
//! The timestamp is the attach sequence number, so effects in the same layer
//! apply in the order they were attached. Layers let a "becomes 0/1" effect
//! (`SetValue`, layer -10) apply before "+1/+1" effects (layer 0) no matter
//! which was attached first.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::core::{EngineError, EngineResult, ObjectId};
use crate::properties::{PropertyId, PropertyRegistry, Value};

use super::context::EffectContext;

/// Identifier of an attached effect. Also its timestamp.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct EffectId(pub u64);

impl fmt::Display for EffectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Effect({})", self.0)
    }
}

/// A continuous modification of one modifiable property.
pub trait Effect: Send + Sync + fmt::Debug {
    /// The property this effect modifies.
    fn property(&self) -> PropertyId;

    /// Transform `value` (the result of the base value and all earlier
    /// effects) for the object `owner`.
    fn modify(&self, ctx: &EffectContext<'_>, owner: ObjectId, value: Value) -> EngineResult<Value>;

    /// Whether a change to `property` (on any object) may change this
    /// effect's output. Changes to the targeted property itself are always
    /// picked up; this declares the additional dependencies.
    fn invalidate(&self, _property: PropertyId) -> bool {
        false
    }

    /// Application layer. Lower layers apply first.
    fn layer(&self) -> i32 {
        0
    }

    /// Short description for logs and snapshots.
    fn describe(&self) -> String {
        format!("{self:?}")
    }
}

/// An effect attached to a target object.
#[derive(Clone, Debug)]
pub struct EffectInstance {
    pub id: EffectId,
    pub target: ObjectId,
    pub effect: Arc<dyn Effect>,
}

impl EffectInstance {
    /// Sort key within one (object, property) pair.
    #[must_use]
    pub fn order_key(&self) -> (i32, u64) {
        (self.effect.layer(), self.id.0)
    }
}

/// Fail with `NotModifiable` unless `property` may be targeted by effects.
pub fn ensure_modifiable(registry: &PropertyRegistry, property: PropertyId) -> EngineResult<()> {
    let desc = registry.get(property)?;
    if desc.flags.is_modifiable() {
        Ok(())
    } else {
        Err(EngineError::NotModifiable {
            property: desc.qualified_name(),
        })
    }
}
