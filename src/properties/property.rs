//! Property descriptors.
//!
//! A `PropertyBase` is the registered, immutable description of a named
//! property: who declares it, what it holds, its default and its flags.
//! `Property<T>` is the typed handle game code passes around.

use std::borrow::Cow;
use std::marker::PhantomData;
use std::ops::BitOr;

use serde::{Deserialize, Serialize};

use super::value::{PropertyType, Value, ValueKind};

/// Flags on a property descriptor.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PropertyFlags(u8);

impl PropertyFlags {
    pub const NONE: Self = Self(0);
    /// Effects may target the property.
    pub const MODIFIABLE: Self = Self(1);
    /// Any object may carry the property, whatever its kind declares.
    pub const ATTACHED: Self = Self(1 << 1);
    /// Only the owning player observes the property.
    pub const PRIVATE: Self = Self(1 << 2);

    #[must_use]
    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    #[must_use]
    pub const fn is_modifiable(self) -> bool {
        self.contains(Self::MODIFIABLE)
    }

    #[must_use]
    pub const fn is_attached(self) -> bool {
        self.contains(Self::ATTACHED)
    }

    #[must_use]
    pub const fn is_private(self) -> bool {
        self.contains(Self::PRIVATE)
    }
}

impl BitOr for PropertyFlags {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

/// The declared type of an object ("Player", "Card").
///
/// Properties are registered against a kind; an object may only carry
/// properties its kind declares, plus attached ones.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ObjectKind(Cow<'static, str>);

impl ObjectKind {
    pub const PLAYER: Self = Self(Cow::Borrowed("Player"));
    pub const CARD: Self = Self(Cow::Borrowed("Card"));
    /// Owner kind of attached properties.
    pub const ANY: Self = Self(Cow::Borrowed("*"));

    /// A host-defined kind.
    pub fn new(name: impl Into<Cow<'static, str>>) -> Self {
        Self(name.into())
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ObjectKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Index of a descriptor in its `PropertyRegistry`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PropertyId(pub u32);

impl PropertyId {
    #[must_use]
    pub const fn raw(self) -> u32 {
        self.0
    }
}

/// Registered description of a property.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PropertyBase {
    pub id: PropertyId,
    pub name: String,
    pub owner: ObjectKind,
    pub kind: ValueKind,
    pub default: Value,
    pub flags: PropertyFlags,
}

impl PropertyBase {
    /// "Owner.Name", used in error messages and logs.
    #[must_use]
    pub fn qualified_name(&self) -> String {
        format!("{}.{}", self.owner, self.name)
    }

    /// Whether objects of `kind` may carry this property.
    #[must_use]
    pub fn applies_to(&self, kind: &ObjectKind) -> bool {
        self.flags.is_attached() || &self.owner == kind
    }
}

/// Typed handle to a registered property.
pub struct Property<T> {
    id: PropertyId,
    _marker: PhantomData<fn() -> T>,
}

impl<T: PropertyType> Property<T> {
    pub(crate) const fn from_id(id: PropertyId) -> Self {
        Self {
            id,
            _marker: PhantomData,
        }
    }

    #[must_use]
    pub const fn id(self) -> PropertyId {
        self.id
    }

    /// The value kind this handle reads and writes.
    #[must_use]
    pub const fn kind(self) -> ValueKind {
        T::KIND
    }
}

impl<T> Clone for Property<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for Property<T> {}

impl<T> PartialEq for Property<T> {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl<T> Eq for Property<T> {}

impl<T> std::fmt::Debug for Property<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Property({})", self.id.0)
    }
}

impl<T> From<Property<T>> for PropertyId {
    fn from(p: Property<T>) -> Self {
        p.id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flags_combine() {
        let flags = PropertyFlags::MODIFIABLE | PropertyFlags::ATTACHED;
        assert!(flags.is_modifiable());
        assert!(flags.is_attached());
        assert!(!flags.is_private());
        assert!(!PropertyFlags::NONE.is_modifiable());
    }

    #[test]
    fn test_applies_to() {
        let declared = PropertyBase {
            id: PropertyId(0),
            name: "Power".into(),
            owner: ObjectKind::CARD,
            kind: ValueKind::Int,
            default: Value::Int(0),
            flags: PropertyFlags::MODIFIABLE,
        };
        assert!(declared.applies_to(&ObjectKind::CARD));
        assert!(!declared.applies_to(&ObjectKind::PLAYER));
        assert_eq!(declared.qualified_name(), "Card.Power");

        let attached = PropertyBase {
            flags: PropertyFlags::ATTACHED,
            owner: ObjectKind::ANY,
            ..declared
        };
        assert!(attached.applies_to(&ObjectKind::PLAYER));
        assert!(attached.applies_to(&ObjectKind::new("Emblem")));
    }

    #[test]
    fn test_handle_is_copy() {
        let p: Property<i64> = Property::from_id(PropertyId(3));
        let q = p;
        assert_eq!(p, q);
        assert_eq!(PropertyId::from(q), PropertyId(3));
        assert_eq!(p.kind(), ValueKind::Int);
    }
}
