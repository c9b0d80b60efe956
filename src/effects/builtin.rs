//! Built-in effects.
//!
//! Constructors take the registry so targeting a non-modifiable property
//! fails when the effect is built, before it can be attached anywhere.

use crate::core::{EngineError, EngineResult, ObjectId};
use crate::properties::{Property, PropertyId, PropertyRegistry, PropertyType, Value};

use super::condition::Condition;
use super::context::EffectContext;
use super::effect::{ensure_modifiable, Effect};

/// Layer of effects that replace the value outright.
pub const SET_LAYER: i32 = -10;

fn expect_int(property: PropertyId, value: &Value) -> EngineResult<i64> {
    value.as_int().ok_or_else(|| EngineError::TypeMismatch {
        property: format!("#{}", property.0),
        expected: "int",
        found: value.kind().name(),
    })
}

/// Adds a constant to an integer property ("+1/+1").
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AddInt {
    property: PropertyId,
    delta: i64,
}

impl AddInt {
    pub fn new(registry: &PropertyRegistry, property: Property<i64>, delta: i64) -> EngineResult<Self> {
        ensure_modifiable(registry, property.id())?;
        Ok(Self { property: property.id(), delta })
    }

    #[must_use]
    pub fn delta(&self) -> i64 {
        self.delta
    }
}

impl Effect for AddInt {
    fn property(&self) -> PropertyId {
        self.property
    }

    fn modify(&self, _ctx: &EffectContext<'_>, _owner: ObjectId, value: Value) -> EngineResult<Value> {
        let base = expect_int(self.property, &value)?;
        Ok(Value::Int(base.saturating_add(self.delta)))
    }

    fn describe(&self) -> String {
        format!("{:+}", self.delta)
    }
}

/// Replaces the value ("becomes 0/1"). Applies before additive effects.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SetValue {
    property: PropertyId,
    value: Value,
}

impl SetValue {
    pub fn new<T: PropertyType>(registry: &PropertyRegistry, property: Property<T>, value: T) -> EngineResult<Self> {
        ensure_modifiable(registry, property.id())?;
        Ok(Self { property: property.id(), value: value.into_value() })
    }
}

impl Effect for SetValue {
    fn property(&self) -> PropertyId {
        self.property
    }

    fn modify(&self, _ctx: &EffectContext<'_>, _owner: ObjectId, _value: Value) -> EngineResult<Value> {
        Ok(self.value.clone())
    }

    fn layer(&self) -> i32 {
        SET_LAYER
    }

    fn describe(&self) -> String {
        format!("= {}", self.value)
    }
}

/// Adds another integer property's effective value.
///
/// Reads `source_property` from `source`, or from the owner when `source` is
/// `None` (toughness equal to power, +X/+0 where X is lands you control...).
#[derive(Clone, Debug)]
pub struct AddPropertyValue {
    property: PropertyId,
    source: Option<ObjectId>,
    source_property: Property<i64>,
}

impl AddPropertyValue {
    pub fn new(
        registry: &PropertyRegistry,
        property: Property<i64>,
        source: Option<ObjectId>,
        source_property: Property<i64>,
    ) -> EngineResult<Self> {
        ensure_modifiable(registry, property.id())?;
        registry.get(source_property.id())?;
        Ok(Self { property: property.id(), source, source_property })
    }
}

impl Effect for AddPropertyValue {
    fn property(&self) -> PropertyId {
        self.property
    }

    fn modify(&self, ctx: &EffectContext<'_>, owner: ObjectId, value: Value) -> EngineResult<Value> {
        let base = expect_int(self.property, &value)?;
        let extra = ctx.get(self.source.unwrap_or(owner), self.source_property)?;
        Ok(Value::Int(base.saturating_add(extra)))
    }

    fn invalidate(&self, property: PropertyId) -> bool {
        property == self.source_property.id()
    }
}

/// Applies `inner` only while `condition` holds.
#[derive(Debug)]
pub struct ConditionalEffect<E> {
    inner: E,
    condition: Box<dyn Condition>,
}

impl<E: Effect> ConditionalEffect<E> {
    pub fn new(inner: E, condition: impl Condition + 'static) -> Self {
        Self { inner, condition: Box::new(condition) }
    }
}

impl<E: Effect> Effect for ConditionalEffect<E> {
    fn property(&self) -> PropertyId {
        self.inner.property()
    }

    fn modify(&self, ctx: &EffectContext<'_>, owner: ObjectId, value: Value) -> EngineResult<Value> {
        if self.condition.holds(ctx, owner)? {
            self.inner.modify(ctx, owner, value)
        } else {
            Ok(value)
        }
    }

    fn invalidate(&self, property: PropertyId) -> bool {
        self.inner.invalidate(property) | self.condition.invalidate(property)
    }

    fn layer(&self) -> i32 {
        self.inner.layer()
    }

    fn describe(&self) -> String {
        format!("{} if {:?}", self.inner.describe(), self.condition)
    }
}
