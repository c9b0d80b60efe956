//! Game objects.
//!
//! An `Object` is an id, a kind and the table of values stored on it. The
//! table holds only what was explicitly set; unset properties read as the
//! descriptor's default and effects are layered on top by the manager.

use im::OrdMap;
use serde::{Deserialize, Serialize};

use crate::core::ObjectId;
use crate::properties::{ObjectKind, PropertyId, Value};

/// A node in the game's object graph.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Object {
    id: ObjectId,
    kind: ObjectKind,
    values: OrdMap<PropertyId, Value>,
}

impl Object {
    pub(crate) fn new(id: ObjectId, kind: ObjectKind) -> Self {
        Self {
            id,
            kind,
            values: OrdMap::new(),
        }
    }

    #[must_use]
    pub fn id(&self) -> ObjectId {
        self.id
    }

    #[must_use]
    pub fn kind(&self) -> &ObjectKind {
        &self.kind
    }

    /// The locally stored value, if any.
    #[must_use]
    pub fn local(&self, property: PropertyId) -> Option<&Value> {
        self.values.get(&property)
    }

    /// Properties with a stored value, in id order.
    pub fn stored(&self) -> impl Iterator<Item = (PropertyId, &Value)> {
        self.values.iter().map(|(k, v)| (*k, v))
    }

    /// Store or clear a value, returning what was stored before.
    pub(crate) fn replace_local(&mut self, property: PropertyId, value: Option<Value>) -> Option<Value> {
        match value {
            Some(v) => self.values.insert(property, v),
            None => self.values.remove(&property),
        }
    }
}
