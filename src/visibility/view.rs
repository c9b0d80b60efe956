//! Per-observer views of the object graph.

use serde::{Deserialize, Serialize};

use crate::core::{EngineResult, ObjectId, PlayerId};
use crate::objects::{Object, ObjectManager};
use crate::properties::{ObjectKind, PropertyBase, Value};
use crate::zones::Zone;

use super::filter::VisibilityFilter;

/// One visible object with its effective values.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectView {
    pub id: ObjectId,
    pub kind: ObjectKind,
    pub zone: Option<Zone>,
    /// Qualified property name and effective value, in property id order.
    pub values: Vec<(String, Value)>,
}

impl ObjectView {
    /// Effective value by unqualified property name.
    #[must_use]
    pub fn value(&self, name: &str) -> Option<&Value> {
        self.values
            .iter()
            .find(|(qualified, _)| qualified.rsplit('.').next() == Some(name))
            .map(|(_, v)| v)
    }
}

/// What one observer (or a spectator) can see.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObserverView {
    pub observer: Option<PlayerId>,
    pub objects: Vec<ObjectView>,
}

impl ObserverView {
    /// Collect every object visible to `observer`, in id order.
    ///
    /// Declared properties are always listed; attached properties only when
    /// stored on the object. Private properties are listed only for the
    /// object's owner.
    pub fn build(
        manager: &ObjectManager,
        filter: &dyn VisibilityFilter,
        observer: Option<PlayerId>,
    ) -> EngineResult<Self> {
        let mut objects = Vec::new();
        for object in manager.objects() {
            if !filter.is_visible(manager, object.id(), observer) {
                continue;
            }
            let owner = owner_of(manager, object)?;
            let mut values = Vec::new();
            for desc in manager.registry().iter() {
                if !listed(desc, object) {
                    continue;
                }
                if desc.flags.is_private() && (observer.is_none() || observer != owner) {
                    continue;
                }
                values.push((desc.qualified_name(), manager.value(object.id(), desc.id)?));
            }
            objects.push(ObjectView {
                id: object.id(),
                kind: object.kind().clone(),
                zone: manager.zone_of(object.id()),
                values,
            });
        }
        Ok(Self { observer, objects })
    }

    #[must_use]
    pub fn get(&self, id: ObjectId) -> Option<&ObjectView> {
        self.objects.iter().find(|o| o.id == id)
    }

    #[must_use]
    pub fn contains(&self, id: ObjectId) -> bool {
        self.get(id).is_some()
    }
}

fn listed(desc: &PropertyBase, object: &Object) -> bool {
    if desc.flags.is_attached() {
        object.local(desc.id).is_some()
    } else {
        desc.owner == *object.kind()
    }
}

fn owner_of(manager: &ObjectManager, object: &Object) -> EngineResult<Option<PlayerId>> {
    let std = manager.standard();
    if *object.kind() == ObjectKind::PLAYER {
        manager.get_value(object.id(), std.seat)
    } else if *object.kind() == ObjectKind::CARD {
        manager.get_value(object.id(), std.owner)
    } else {
        Ok(None)
    }
}
