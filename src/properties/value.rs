//! Property values.
//!
//! Objects store `Value`s; typed handles (`Property<T>`) convert through the
//! `PropertyType` trait so callers work with `i64`, `bool`, `String` and ids
//! directly.

use serde::{Deserialize, Serialize};

use crate::core::{ObjectId, PlayerId};

/// A property value.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Value {
    /// Integer value (life, power, counters).
    Int(i64),
    /// Boolean flag (tapped, attacking).
    Bool(bool),
    /// Text value (card name).
    Text(String),
    /// Reference to another object (what a creature blocks).
    Object(Option<ObjectId>),
    /// Reference to a seat (owner, controller).
    Player(Option<PlayerId>),
}

/// The variant of a `Value`, used to type-check writes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ValueKind {
    Int,
    Bool,
    Text,
    Object,
    Player,
}

impl ValueKind {
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            ValueKind::Int => "int",
            ValueKind::Bool => "bool",
            ValueKind::Text => "text",
            ValueKind::Object => "object",
            ValueKind::Player => "player",
        }
    }
}

impl Value {
    #[must_use]
    pub fn kind(&self) -> ValueKind {
        match self {
            Value::Int(_) => ValueKind::Int,
            Value::Bool(_) => ValueKind::Bool,
            Value::Text(_) => ValueKind::Text,
            Value::Object(_) => ValueKind::Object,
            Value::Player(_) => ValueKind::Player,
        }
    }

    #[must_use]
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(v) => Some(*v),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(v) => Some(*v),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }
}

impl std::fmt::Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Value::Int(v) => write!(f, "{v}"),
            Value::Bool(v) => write!(f, "{v}"),
            Value::Text(s) => write!(f, "{s:?}"),
            Value::Object(Some(id)) => write!(f, "{id}"),
            Value::Player(Some(p)) => write!(f, "{p}"),
            Value::Object(None) | Value::Player(None) => write!(f, "none"),
        }
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int(v)
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Text(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Text(v)
    }
}

impl From<Option<ObjectId>> for Value {
    fn from(v: Option<ObjectId>) -> Self {
        Value::Object(v)
    }
}

impl From<Option<PlayerId>> for Value {
    fn from(v: Option<PlayerId>) -> Self {
        Value::Player(v)
    }
}

/// Rust types that can be stored in a property.
pub trait PropertyType: Sized + Clone + 'static {
    /// The `Value` variant this type maps to.
    const KIND: ValueKind;

    fn into_value(self) -> Value;

    fn from_value(value: &Value) -> Option<Self>;
}

impl PropertyType for i64 {
    const KIND: ValueKind = ValueKind::Int;

    fn into_value(self) -> Value {
        Value::Int(self)
    }

    fn from_value(value: &Value) -> Option<Self> {
        value.as_int()
    }
}

impl PropertyType for bool {
    const KIND: ValueKind = ValueKind::Bool;

    fn into_value(self) -> Value {
        Value::Bool(self)
    }

    fn from_value(value: &Value) -> Option<Self> {
        value.as_bool()
    }
}

impl PropertyType for String {
    const KIND: ValueKind = ValueKind::Text;

    fn into_value(self) -> Value {
        Value::Text(self)
    }

    fn from_value(value: &Value) -> Option<Self> {
        value.as_text().map(str::to_string)
    }
}

impl PropertyType for Option<ObjectId> {
    const KIND: ValueKind = ValueKind::Object;

    fn into_value(self) -> Value {
        Value::Object(self)
    }

    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Object(id) => Some(*id),
            _ => None,
        }
    }
}

impl PropertyType for Option<PlayerId> {
    const KIND: ValueKind = ValueKind::Player;

    fn into_value(self) -> Value {
        Value::Player(self)
    }

    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Player(p) => Some(*p),
            _ => None,
        }
    }
}
