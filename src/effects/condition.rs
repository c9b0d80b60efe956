//! Conditions gating conditional effects.
//!
//! A condition is a predicate over the game state evaluated for the object
//! an effect is attached to. Like effects, conditions declare which
//! properties they read so the manager can drop cached values when one of
//! them changes.

use std::fmt;

use crate::core::{EngineResult, ObjectId};
use crate::properties::{PropertyId, Value};
use crate::zones::Zone;

use super::context::EffectContext;

/// A predicate evaluated during effect application.
pub trait Condition: Send + Sync + fmt::Debug {
    /// Whether the condition holds for `owner`.
    fn holds(&self, ctx: &EffectContext<'_>, owner: ObjectId) -> EngineResult<bool>;

    /// Whether a change to `property` may change the outcome.
    fn invalidate(&self, _property: PropertyId) -> bool {
        false
    }
}

/// Holds when a property's effective value equals `expected`.
///
/// Reads the property on `object`, or on the effect's owner when `object`
/// is `None`.
#[derive(Clone, Debug)]
pub struct PropertyEquals {
    pub object: Option<ObjectId>,
    pub property: PropertyId,
    pub expected: Value,
}

impl PropertyEquals {
    /// Compare a property of the effect's owner.
    pub fn on_owner(property: impl Into<PropertyId>, expected: impl Into<Value>) -> Self {
        Self { object: None, property: property.into(), expected: expected.into() }
    }

    /// Compare a property of a fixed object.
    pub fn on(object: ObjectId, property: impl Into<PropertyId>, expected: impl Into<Value>) -> Self {
        Self { object: Some(object), property: property.into(), expected: expected.into() }
    }
}

impl Condition for PropertyEquals {
    fn holds(&self, ctx: &EffectContext<'_>, owner: ObjectId) -> EngineResult<bool> {
        let value = ctx.value(self.object.unwrap_or(owner), self.property)?;
        Ok(value == self.expected)
    }

    fn invalidate(&self, property: PropertyId) -> bool {
        property == self.property
    }
}

/// Holds while the owner is in `zone`.
///
/// Zone moves drop every cached value, so no property dependency is declared.
#[derive(Clone, Copy, Debug)]
pub struct InZone(pub Zone);

impl Condition for InZone {
    fn holds(&self, ctx: &EffectContext<'_>, owner: ObjectId) -> EngineResult<bool> {
        Ok(ctx.manager().zone_of(owner) == Some(self.0))
    }
}

#[derive(Debug)]
pub struct AndCondition(pub Box<dyn Condition>, pub Box<dyn Condition>);

impl AndCondition {
    pub fn new(left: impl Condition + 'static, right: impl Condition + 'static) -> Self {
        Self(Box::new(left), Box::new(right))
    }
}

impl Condition for AndCondition {
    fn holds(&self, ctx: &EffectContext<'_>, owner: ObjectId) -> EngineResult<bool> {
        Ok(self.0.holds(ctx, owner)? && self.1.holds(ctx, owner)?)
    }

    fn invalidate(&self, property: PropertyId) -> bool {
        // Both sides are always asked.
        self.0.invalidate(property) | self.1.invalidate(property)
    }
}

#[derive(Debug)]
pub struct OrCondition(pub Box<dyn Condition>, pub Box<dyn Condition>);

impl OrCondition {
    pub fn new(left: impl Condition + 'static, right: impl Condition + 'static) -> Self {
        Self(Box::new(left), Box::new(right))
    }
}

impl Condition for OrCondition {
    fn holds(&self, ctx: &EffectContext<'_>, owner: ObjectId) -> EngineResult<bool> {
        Ok(self.0.holds(ctx, owner)? || self.1.holds(ctx, owner)?)
    }

    fn invalidate(&self, property: PropertyId) -> bool {
        self.0.invalidate(property) | self.1.invalidate(property)
    }
}

#[derive(Debug)]
pub struct NotCondition(pub Box<dyn Condition>);

impl NotCondition {
    pub fn new(inner: impl Condition + 'static) -> Self {
        Self(Box::new(inner))
    }
}

impl Condition for NotCondition {
    fn holds(&self, ctx: &EffectContext<'_>, owner: ObjectId) -> EngineResult<bool> {
        Ok(!self.0.holds(ctx, owner)?)
    }

    fn invalidate(&self, property: PropertyId) -> bool {
        self.0.invalidate(property)
    }
}
