//! Object identification.
//!
//! Every game object (player, card, token) has a stable `ObjectId` handed out
//! by the `ObjectManager` that owns it. An object keeps its id while it moves
//! between zones; ids are only recycled when the command that created the
//! object is undone.
//!
//! Ids are scoped to one manager. `ManagerId` tags each manager so that an id
//! leaking from one game into another is rejected instead of silently
//! addressing an unrelated object.
//!
//! ```
//! use ccg_rules::core::ObjectId;
//!
//! let id = ObjectId::new(7);
//! assert_eq!(id.raw(), 7);
//! assert_eq!(format!("{}", id), "Object(7)");
//! ```

use std::sync::atomic::{AtomicU32, Ordering};

use serde::{Deserialize, Serialize};

/// Unique identifier of a game object within one `ObjectManager`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ObjectId(pub u32);

impl ObjectId {
    /// Create an object id from a raw value.
    #[must_use]
    pub const fn new(id: u32) -> Self {
        Self(id)
    }

    /// Get the raw id value.
    #[must_use]
    pub const fn raw(self) -> u32 {
        self.0
    }
}

impl From<u32> for ObjectId {
    fn from(id: u32) -> Self {
        Self(id)
    }
}

impl std::fmt::Display for ObjectId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Object({})", self.0)
    }
}

static NEXT_MANAGER: AtomicU32 = AtomicU32::new(1);

/// Process-unique tag of an `ObjectManager`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ManagerId(pub u32);

impl ManagerId {
    /// Allocate a fresh manager tag.
    #[must_use]
    pub fn fresh() -> Self {
        Self(NEXT_MANAGER.fetch_add(1, Ordering::Relaxed))
    }
}

impl std::fmt::Display for ManagerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Manager({})", self.0)
    }
}

/// An object id qualified by the manager that issued it.
///
/// Hosts that juggle several games hold `ObjectRef`s; the manager checks the
/// tag before resolving the id.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ObjectRef {
    pub manager: ManagerId,
    pub id: ObjectId,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_object_id_basics() {
        let id = ObjectId::new(42);
        assert_eq!(id.raw(), 42);
        assert_eq!(ObjectId::from(42), id);
        assert_eq!(format!("{}", id), "Object(42)");
    }

    #[test]
    fn test_object_id_ordering() {
        let mut ids = vec![ObjectId(3), ObjectId(1), ObjectId(2)];
        ids.sort();
        assert_eq!(ids, vec![ObjectId(1), ObjectId(2), ObjectId(3)]);
    }

    #[test]
    fn test_manager_ids_are_unique() {
        let a = ManagerId::fresh();
        let b = ManagerId::fresh();
        assert_ne!(a, b);
    }

    #[test]
    fn test_serialization() {
        let id = ObjectId(123);
        let json = serde_json::to_string(&id).unwrap();
        let deserialized: ObjectId = serde_json::from_str(&json).unwrap();
        assert_eq!(id, deserialized);
    }
}
