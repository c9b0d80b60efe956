//! Built-in commands.
//!
//! Each command records on `execute` exactly what `unexecute` needs to put
//! the manager back: the previous local value (or its absence), the zone
//! index an object left, the removed object itself, the order a zone had
//! before a shuffle, or the detached effect instance.

use std::sync::Arc;

use tracing::debug;

use crate::core::{EngineError, EngineResult, GameRngState, ObjectId};
use crate::effects::{Effect, EffectId, EffectInstance};
use crate::objects::{Object, ObjectManager};
use crate::properties::{ObjectKind, Property, PropertyId, PropertyType, Value};
use crate::zones::{Zone, ZonePosition};

use super::command::Command;

fn not_executed(command: &dyn Command) -> EngineError {
    EngineError::command_state(command.describe(), "not executed")
}

fn executed_twice(command: &dyn Command) -> EngineError {
    EngineError::command_state(command.describe(), "already executed")
}

// === Values ===

/// Store a value on an object.
#[derive(Debug)]
pub struct SetValueCommand {
    object: ObjectId,
    property: PropertyId,
    value: Value,
    previous: Option<Option<Value>>,
}

impl SetValueCommand {
    pub fn new<T: PropertyType>(object: ObjectId, property: Property<T>, value: T) -> Self {
        Self::raw(object, property.id(), value.into_value())
    }

    /// Untyped form; the manager still checks the value kind.
    pub fn raw(object: ObjectId, property: PropertyId, value: Value) -> Self {
        Self { object, property, value, previous: None }
    }
}

impl Command for SetValueCommand {
    fn execute(&mut self, manager: &mut ObjectManager) -> EngineResult<()> {
        if self.previous.is_some() {
            return Err(executed_twice(self));
        }
        let previous = manager.replace_local(self.object, self.property, Some(self.value.clone()))?;
        self.previous = Some(previous);
        Ok(())
    }

    fn unexecute(&mut self, manager: &mut ObjectManager) -> EngineResult<()> {
        let previous = self.previous.clone().ok_or_else(|| not_executed(self))?;
        manager.replace_local(self.object, self.property, previous)?;
        self.previous = None;
        Ok(())
    }

    fn describe(&self) -> String {
        format!("set {}#{} = {}", self.object, self.property.0, self.value)
    }
}

/// Clear a stored value so the property reads its default again.
#[derive(Debug)]
pub struct ResetValueCommand {
    object: ObjectId,
    property: PropertyId,
    previous: Option<Option<Value>>,
}

impl ResetValueCommand {
    pub fn new(object: ObjectId, property: impl Into<PropertyId>) -> Self {
        Self { object, property: property.into(), previous: None }
    }
}

impl Command for ResetValueCommand {
    fn execute(&mut self, manager: &mut ObjectManager) -> EngineResult<()> {
        if self.previous.is_some() {
            return Err(executed_twice(self));
        }
        let previous = manager.replace_local(self.object, self.property, None)?;
        self.previous = Some(previous);
        Ok(())
    }

    fn unexecute(&mut self, manager: &mut ObjectManager) -> EngineResult<()> {
        let previous = self.previous.clone().ok_or_else(|| not_executed(self))?;
        manager.replace_local(self.object, self.property, previous)?;
        self.previous = None;
        Ok(())
    }

    fn describe(&self) -> String {
        format!("reset {}#{}", self.object, self.property.0)
    }
}

// === Objects ===

/// Create an object, optionally with initial values and a starting zone.
///
/// The new object receives `ObjectManager::next_object_id()`.
#[derive(Debug)]
pub struct CreateObjectCommand {
    kind: ObjectKind,
    values: Vec<(PropertyId, Value)>,
    zone: Option<(Zone, ZonePosition)>,
    created: Option<ObjectId>,
}

impl CreateObjectCommand {
    pub fn new(kind: ObjectKind) -> Self {
        Self { kind, values: Vec::new(), zone: None, created: None }
    }

    #[must_use]
    pub fn with_value<T: PropertyType>(mut self, property: Property<T>, value: T) -> Self {
        self.values.push((property.id(), value.into_value()));
        self
    }

    #[must_use]
    pub fn in_zone(mut self, zone: Zone, position: ZonePosition) -> Self {
        self.zone = Some((zone, position));
        self
    }

    /// The created object's id, once executed.
    #[must_use]
    pub fn created(&self) -> Option<ObjectId> {
        self.created
    }

    fn populate(&self, manager: &mut ObjectManager, id: ObjectId) -> EngineResult<()> {
        for (property, value) in &self.values {
            manager.replace_local(id, *property, Some(value.clone()))?;
        }
        if let Some((zone, position)) = self.zone {
            manager.move_object(id, zone, position)?;
        }
        Ok(())
    }
}

impl Command for CreateObjectCommand {
    fn execute(&mut self, manager: &mut ObjectManager) -> EngineResult<()> {
        if self.created.is_some() {
            return Err(executed_twice(self));
        }
        let id = manager.create_object(self.kind.clone());
        if let Err(err) = self.populate(manager, id) {
            manager.uncreate_object(id)?;
            return Err(err);
        }
        self.created = Some(id);
        Ok(())
    }

    fn unexecute(&mut self, manager: &mut ObjectManager) -> EngineResult<()> {
        let id = self.created.ok_or_else(|| not_executed(self))?;
        manager.uncreate_object(id)?;
        self.created = None;
        Ok(())
    }

    fn describe(&self) -> String {
        match self.created {
            Some(id) => format!("create {} {id}", self.kind),
            None => format!("create {}", self.kind),
        }
    }
}

#[derive(Debug)]
struct Removed {
    object: Object,
    location: Option<(Zone, usize)>,
    effects: Vec<EffectInstance>,
}

/// Remove an object from the game along with every effect attached to it.
#[derive(Debug)]
pub struct DestroyObjectCommand {
    object: ObjectId,
    removed: Option<Removed>,
}

impl DestroyObjectCommand {
    pub fn new(object: ObjectId) -> Self {
        Self { object, removed: None }
    }

    /// Put a restored object back in its zone slot and re-attach its effects.
    fn restore_surroundings(object: ObjectId, removed: &Removed, manager: &mut ObjectManager) -> EngineResult<()> {
        if let Some((zone, index)) = removed.location {
            manager.move_object(object, zone, ZonePosition::Index(index))?;
        }
        for instance in removed.effects.iter().rev() {
            manager.restore_effect(instance.clone())?;
        }
        Ok(())
    }
}

impl Command for DestroyObjectCommand {
    fn execute(&mut self, manager: &mut ObjectManager) -> EngineResult<()> {
        if self.removed.is_some() {
            return Err(executed_twice(self));
        }
        manager.object(self.object)?;

        let mut effects = Vec::new();
        for id in manager.effects_targeting(self.object) {
            effects.push(manager.detach_effect(id)?);
        }
        let location = manager.unplace_object(self.object);
        let object = manager.destroy_object(self.object)?;
        self.removed = Some(Removed { object, location, effects });
        Ok(())
    }

    fn unexecute(&mut self, manager: &mut ObjectManager) -> EngineResult<()> {
        let removed = self.removed.as_ref().ok_or_else(|| not_executed(self))?;
        manager.restore_object(removed.object.clone())?;
        if let Err(err) = Self::restore_surroundings(self.object, removed, manager) {
            for instance in &removed.effects {
                if manager.effect(instance.id).is_ok() {
                    manager.detach_effect(instance.id)?;
                }
            }
            manager.unplace_object(self.object);
            manager.destroy_object(self.object)?;
            return Err(err);
        }
        self.removed = None;
        Ok(())
    }

    fn describe(&self) -> String {
        format!("destroy {}", self.object)
    }
}

/// Move an object to a zone (or place it for the first time).
#[derive(Debug)]
pub struct MoveObjectCommand {
    object: ObjectId,
    to: Zone,
    position: ZonePosition,
    previous: Option<Option<(Zone, usize)>>,
}

impl MoveObjectCommand {
    pub fn new(object: ObjectId, to: Zone, position: ZonePosition) -> Self {
        Self { object, to, position, previous: None }
    }

    pub fn to_top(object: ObjectId, to: Zone) -> Self {
        Self::new(object, to, ZonePosition::Top)
    }
}

impl Command for MoveObjectCommand {
    fn execute(&mut self, manager: &mut ObjectManager) -> EngineResult<()> {
        if self.previous.is_some() {
            return Err(executed_twice(self));
        }
        let previous = manager.move_object(self.object, self.to, self.position)?;
        self.previous = Some(previous);
        Ok(())
    }

    fn unexecute(&mut self, manager: &mut ObjectManager) -> EngineResult<()> {
        match self.previous.ok_or_else(|| not_executed(self))? {
            Some((zone, index)) => {
                manager.move_object(self.object, zone, ZonePosition::Index(index))?;
            }
            None => {
                manager.unplace_object(self.object);
            }
        }
        self.previous = None;
        Ok(())
    }

    fn describe(&self) -> String {
        format!("move {} to {}", self.object, self.to)
    }
}

/// Shuffle a zone with the game RNG.
#[derive(Debug)]
pub struct ShuffleZoneCommand {
    zone: Zone,
    saved: Option<(Vec<ObjectId>, GameRngState)>,
}

impl ShuffleZoneCommand {
    pub fn new(zone: Zone) -> Self {
        Self { zone, saved: None }
    }
}

impl Command for ShuffleZoneCommand {
    fn execute(&mut self, manager: &mut ObjectManager) -> EngineResult<()> {
        if self.saved.is_some() {
            return Err(executed_twice(self));
        }
        let rng = manager.rng_state();
        let order = manager.shuffle_zone(self.zone)?;
        self.saved = Some((order, rng));
        Ok(())
    }

    fn unexecute(&mut self, manager: &mut ObjectManager) -> EngineResult<()> {
        let (order, rng) = self.saved.clone().ok_or_else(|| not_executed(self))?;
        manager.restore_zone_order(self.zone, order)?;
        manager.restore_rng(&rng);
        self.saved = None;
        Ok(())
    }

    fn describe(&self) -> String {
        format!("shuffle {}", self.zone)
    }
}

// === Effects ===

/// Attach an effect to a target object.
///
/// The effect receives `ObjectManager::next_effect_id()`.
#[derive(Debug)]
pub struct AttachEffectCommand {
    target: ObjectId,
    effect: Arc<dyn Effect>,
    attached: Option<EffectId>,
}

impl AttachEffectCommand {
    pub fn new(target: ObjectId, effect: impl Effect + 'static) -> Self {
        Self::shared(target, Arc::new(effect))
    }

    pub fn shared(target: ObjectId, effect: Arc<dyn Effect>) -> Self {
        Self { target, effect, attached: None }
    }

    #[must_use]
    pub fn attached(&self) -> Option<EffectId> {
        self.attached
    }
}

impl Command for AttachEffectCommand {
    fn execute(&mut self, manager: &mut ObjectManager) -> EngineResult<()> {
        if self.attached.is_some() {
            return Err(executed_twice(self));
        }
        let id = manager.attach_effect(self.target, Arc::clone(&self.effect))?;
        debug!(effect = %id, target = %self.target, "effect attached");
        self.attached = Some(id);
        Ok(())
    }

    fn unexecute(&mut self, manager: &mut ObjectManager) -> EngineResult<()> {
        let id = self.attached.ok_or_else(|| not_executed(self))?;
        manager.unattach_effect(id)?;
        self.attached = None;
        Ok(())
    }

    fn describe(&self) -> String {
        format!("attach {} to {}", self.effect.describe(), self.target)
    }
}

/// Detach an effect; undo re-attaches it with its original timestamp.
#[derive(Debug)]
pub struct DetachEffectCommand {
    effect: EffectId,
    detached: Option<EffectInstance>,
}

impl DetachEffectCommand {
    pub fn new(effect: EffectId) -> Self {
        Self { effect, detached: None }
    }
}

impl Command for DetachEffectCommand {
    fn execute(&mut self, manager: &mut ObjectManager) -> EngineResult<()> {
        if self.detached.is_some() {
            return Err(executed_twice(self));
        }
        self.detached = Some(manager.detach_effect(self.effect)?);
        Ok(())
    }

    fn unexecute(&mut self, manager: &mut ObjectManager) -> EngineResult<()> {
        let instance = self.detached.clone().ok_or_else(|| not_executed(self))?;
        manager.restore_effect(instance)?;
        self.detached = None;
        Ok(())
    }

    fn describe(&self) -> String {
        format!("detach {}", self.effect)
    }
}
