//! Property registry.
//!
//! Descriptors are registered once, during setup, through a
//! `PropertyRegistryBuilder`. `build()` freezes the set into an
//! `Arc<PropertyRegistry>` that managers share read-only, from any thread.
//!
//! ## Example
//!
//! ```
//! use ccg_rules::properties::{ObjectKind, PropertyFlags, PropertyRegistry};
//!
//! let mut builder = PropertyRegistry::builder();
//! let poison = builder
//!     .register::<i64>("Poison", ObjectKind::PLAYER, PropertyFlags::NONE, 0)
//!     .unwrap();
//! let registry = builder.build();
//!
//! let found = registry.lookup(&ObjectKind::PLAYER, "Poison").unwrap();
//! assert_eq!(found.id, poison.id());
//! ```

use std::sync::Arc;

use once_cell::sync::Lazy;
use rustc_hash::FxHashMap;

use super::property::{ObjectKind, Property, PropertyBase, PropertyFlags, PropertyId};
use super::standard::StandardProperties;
use super::value::{PropertyType, Value};
use crate::core::{EngineError, EngineResult};

static SHARED: Lazy<Arc<PropertyRegistry>> = Lazy::new(|| PropertyRegistry::builder().build());

/// Descriptor storage shared by the builder and the frozen registry.
#[derive(Debug, Default)]
pub(super) struct Descriptors {
    list: Vec<PropertyBase>,
    by_key: FxHashMap<(ObjectKind, String), PropertyId>,
}

impl Descriptors {
    /// Append a descriptor without the duplicate check.
    pub(super) fn push(
        &mut self,
        name: &str,
        owner: ObjectKind,
        flags: PropertyFlags,
        default: Value,
    ) -> PropertyId {
        let id = PropertyId(self.list.len() as u32);
        self.by_key.insert((owner.clone(), name.to_string()), id);
        self.list.push(PropertyBase {
            id,
            name: name.to_string(),
            owner,
            kind: default.kind(),
            default,
            flags,
        });
        id
    }

    fn lookup(&self, owner: &ObjectKind, name: &str) -> Option<&PropertyBase> {
        let id = self.by_key.get(&(owner.clone(), name.to_string()))?;
        self.list.get(id.0 as usize)
    }
}

/// Frozen set of property descriptors.
#[derive(Debug)]
pub struct PropertyRegistry {
    table: Descriptors,
    standard: StandardProperties,
}

impl PropertyRegistry {
    /// Start a registry. The standard rule properties are registered first.
    #[must_use]
    pub fn builder() -> PropertyRegistryBuilder {
        PropertyRegistryBuilder::new()
    }

    /// Process-wide registry holding only the standard properties.
    ///
    /// Initialised on first use; read-only afterwards.
    #[must_use]
    pub fn shared() -> Arc<PropertyRegistry> {
        Arc::clone(&SHARED)
    }

    /// Handles to the built-in properties.
    #[must_use]
    pub fn standard(&self) -> &StandardProperties {
        &self.standard
    }

    /// Get a descriptor by id.
    pub fn get(&self, id: PropertyId) -> EngineResult<&PropertyBase> {
        self.table
            .list
            .get(id.0 as usize)
            .ok_or(EngineError::UnknownProperty(id.0))
    }

    /// Find a descriptor by owner kind and name.
    #[must_use]
    pub fn lookup(&self, owner: &ObjectKind, name: &str) -> Option<&PropertyBase> {
        self.table.lookup(owner, name)
    }

    /// Find a descriptor and return a typed handle if its kind matches `T`.
    #[must_use]
    pub fn lookup_typed<T: PropertyType>(&self, owner: &ObjectKind, name: &str) -> Option<Property<T>> {
        self.lookup(owner, name)
            .filter(|d| d.kind == T::KIND)
            .map(|d| Property::from_id(d.id))
    }

    #[must_use]
    pub fn contains(&self, id: PropertyId) -> bool {
        (id.0 as usize) < self.table.list.len()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.table.list.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.table.list.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &PropertyBase> {
        self.table.list.iter()
    }
}

/// Mutable registry under construction.
#[derive(Debug)]
pub struct PropertyRegistryBuilder {
    table: Descriptors,
    standard: StandardProperties,
}

impl PropertyRegistryBuilder {
    fn new() -> Self {
        let mut table = Descriptors::default();
        let standard = StandardProperties::register(&mut table);
        Self { table, standard }
    }

    /// Register a property.
    ///
    /// Attached properties are keyed under `ObjectKind::ANY` whatever owner
    /// is passed. Registering the same (owner, name) twice is an error.
    pub fn register<T: PropertyType>(
        &mut self,
        name: impl Into<String>,
        owner: ObjectKind,
        flags: PropertyFlags,
        default: T,
    ) -> EngineResult<Property<T>> {
        let name = name.into();
        let owner = if flags.is_attached() { ObjectKind::ANY } else { owner };

        if self.table.lookup(&owner, &name).is_some() {
            return Err(EngineError::DuplicateProperty {
                owner: owner.to_string(),
                name,
            });
        }
        Ok(Property::from_id(self.table.push(&name, owner, flags, default.into_value())))
    }

    /// Find an already registered descriptor for reuse.
    #[must_use]
    pub fn lookup(&self, owner: &ObjectKind, name: &str) -> Option<&PropertyBase> {
        self.table.lookup(owner, name)
    }

    #[must_use]
    pub fn standard(&self) -> &StandardProperties {
        &self.standard
    }

    /// Freeze the registry.
    #[must_use]
    pub fn build(self) -> Arc<PropertyRegistry> {
        tracing::debug!(properties = self.table.list.len(), "property registry frozen");
        Arc::new(PropertyRegistry {
            table: self.table,
            standard: self.standard,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::properties::ValueKind;

    #[test]
    fn test_register_and_lookup() {
        let mut builder = PropertyRegistry::builder();
        let poison = builder
            .register::<i64>("Poison", ObjectKind::PLAYER, PropertyFlags::NONE, 0)
            .unwrap();
        let registry = builder.build();

        let desc = registry.get(poison.id()).unwrap();
        assert_eq!(desc.name, "Poison");
        assert_eq!(desc.kind, ValueKind::Int);
        assert_eq!(desc.default, Value::Int(0));
        assert!(registry.lookup(&ObjectKind::CARD, "Poison").is_none());
    }

    #[test]
    fn test_duplicate_registration_fails() {
        let mut builder = PropertyRegistry::builder();
        builder
            .register::<bool>("Flying", ObjectKind::CARD, PropertyFlags::MODIFIABLE, false)
            .unwrap();
        let err = builder
            .register::<bool>("Flying", ObjectKind::CARD, PropertyFlags::MODIFIABLE, false)
            .unwrap_err();
        assert!(matches!(err, EngineError::DuplicateProperty { .. }));

        // Same name under another kind is a different property.
        assert!(builder
            .register::<bool>("Flying", ObjectKind::new("Emblem"), PropertyFlags::NONE, false)
            .is_ok());
    }

    #[test]
    fn test_standard_names_are_reserved() {
        let mut builder = PropertyRegistry::builder();
        let err = builder
            .register::<i64>("Power", ObjectKind::CARD, PropertyFlags::NONE, 0)
            .unwrap_err();
        assert!(matches!(err, EngineError::DuplicateProperty { .. }));
    }

    #[test]
    fn test_attached_keyed_under_any() {
        let mut builder = PropertyRegistry::builder();
        let marked = builder
            .register::<bool>("Marked", ObjectKind::CARD, PropertyFlags::ATTACHED, false)
            .unwrap();
        let registry = builder.build();

        assert!(registry.lookup(&ObjectKind::CARD, "Marked").is_none());
        let found: Property<bool> = registry.lookup_typed(&ObjectKind::ANY, "Marked").unwrap();
        assert_eq!(found, marked);
        assert!(registry.lookup_typed::<i64>(&ObjectKind::ANY, "Marked").is_none());
    }

    #[test]
    fn test_unknown_id() {
        let registry = PropertyRegistry::shared();
        let err = registry.get(PropertyId(10_000)).unwrap_err();
        assert_eq!(err, EngineError::UnknownProperty(10_000));
    }

    #[test]
    fn test_shared_is_reused() {
        let a = PropertyRegistry::shared();
        let b = PropertyRegistry::shared();
        assert!(Arc::ptr_eq(&a, &b));
    }

    #[test]
    fn test_registry_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<PropertyRegistry>();
    }
}
