//! The object manager: authoritative state of one game.
//!
//! The manager owns every object, the zone table, the attached effects,
//! the lifecycle of every event-bus scope and the RNG used for shuffles. Readers get effective values through
//! `get_value`; all mutators are crate-private and reached only through
//! commands, so every change lands in the transaction log.
//!
//! ## Effective values
//!
//! `get_value` folds the attached effects over the stored (or default) value
//! and caches the result. Setting a property drops the cached value of that
//! (object, property) pair and, transitively, of every pair whose effects
//! declare a dependency on the changed property. Structural changes (objects
//! created, destroyed or moved) drop the whole cache.

use std::cell::{Cell, RefCell};
use std::sync::Arc;

use im::OrdMap;
use rustc_hash::{FxHashMap, FxHashSet};
use smallvec::SmallVec;
use tracing::trace;

use crate::core::{
    EngineConfig, EngineError, EngineResult, GameRng, GameRngState, ManagerId, ObjectId, ObjectRef,
};
use crate::effects::{Effect, EffectContext, EffectId, EffectInstance};
use crate::properties::{
    ObjectKind, Property, PropertyBase, PropertyId, PropertyRegistry, PropertyType,
    StandardProperties, Value,
};
use crate::scope::{ScopeId, ScopeState};
use crate::zones::{Zone, ZoneManager, ZonePosition};

use super::event::GameEvent;
use super::object::Object;
use super::snapshot::{EffectRecord, ManagerSnapshot};

type Key = (ObjectId, PropertyId);

/// Authoritative container of all live objects of one game.
pub struct ObjectManager {
    id: ManagerId,
    registry: Arc<PropertyRegistry>,
    max_effect_depth: usize,

    objects: OrdMap<ObjectId, Object>,
    zones: ZoneManager,
    effects: OrdMap<EffectId, EffectInstance>,
    by_target: FxHashMap<Key, SmallVec<[EffectId; 2]>>,
    scopes: OrdMap<ScopeId, ScopeState>,
    rng: GameRng,

    next_object: u32,
    next_effect: u64,

    events: Vec<GameEvent>,
    cache: RefCell<FxHashMap<Key, Value>>,
    recomputations: Cell<u64>,
}

impl ObjectManager {
    /// Create an empty manager.
    #[must_use]
    pub fn new(registry: Arc<PropertyRegistry>, config: &EngineConfig) -> Self {
        Self {
            id: ManagerId::fresh(),
            registry,
            max_effect_depth: config.max_effect_depth,
            objects: OrdMap::new(),
            zones: ZoneManager::new(),
            effects: OrdMap::new(),
            by_target: FxHashMap::default(),
            scopes: OrdMap::new(),
            rng: GameRng::new(config.seed),
            next_object: 0,
            next_effect: 0,
            events: Vec::new(),
            cache: RefCell::new(FxHashMap::default()),
            recomputations: Cell::new(0),
        }
    }

    #[must_use]
    pub fn id(&self) -> ManagerId {
        self.id
    }

    #[must_use]
    pub fn registry(&self) -> &Arc<PropertyRegistry> {
        &self.registry
    }

    #[must_use]
    pub fn standard(&self) -> StandardProperties {
        *self.registry.standard()
    }

    // === Objects ===

    /// Qualify an id with this manager's tag.
    #[must_use]
    pub fn object_ref(&self, id: ObjectId) -> ObjectRef {
        ObjectRef { manager: self.id, id }
    }

    /// Resolve a qualified reference, rejecting references into other games.
    pub fn resolve(&self, object: ObjectRef) -> EngineResult<ObjectId> {
        if object.manager != self.id {
            return Err(EngineError::ForeignObject {
                expected: self.id,
                found: object.manager,
            });
        }
        self.object(object.id).map(Object::id)
    }

    #[must_use]
    pub fn contains(&self, id: ObjectId) -> bool {
        self.objects.contains_key(&id)
    }

    pub fn object(&self, id: ObjectId) -> EngineResult<&Object> {
        self.objects.get(&id).ok_or(EngineError::UnknownObject(id))
    }

    /// All objects in id order.
    pub fn objects(&self) -> impl Iterator<Item = &Object> {
        self.objects.values()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.objects.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    /// The id the next created object will receive.
    #[must_use]
    pub fn next_object_id(&self) -> ObjectId {
        ObjectId(self.next_object)
    }

    pub(crate) fn create_object(&mut self, kind: ObjectKind) -> ObjectId {
        let id = ObjectId(self.next_object);
        self.next_object += 1;
        self.objects.insert(id, Object::new(id, kind));
        self.structure_changed();
        self.emit(GameEvent::ObjectCreated { object: id });
        id
    }

    /// Undo the most recent creation, handing its id back to the allocator.
    pub(crate) fn uncreate_object(&mut self, id: ObjectId) -> EngineResult<Object> {
        if id.0 + 1 != self.next_object {
            return Err(EngineError::command_state(
                format!("create {id}"),
                "undone out of order",
            ));
        }
        let object = self.destroy_object(id)?;
        self.next_object = id.0;
        Ok(object)
    }

    /// Remove an object from the game (and from its zone).
    pub(crate) fn destroy_object(&mut self, id: ObjectId) -> EngineResult<Object> {
        let object = self.objects.remove(&id).ok_or(EngineError::UnknownObject(id))?;
        if let Some((zone, _)) = self.zones.remove(id) {
            self.emit(GameEvent::ObjectMoved { object: id, from: Some(zone), to: None });
        }
        self.structure_changed();
        self.emit(GameEvent::ObjectDestroyed { object: id });
        Ok(object)
    }

    /// Put a removed object back with its stored values intact.
    pub(crate) fn restore_object(&mut self, object: Object) -> EngineResult<()> {
        let id = object.id();
        if self.objects.contains_key(&id) {
            return Err(EngineError::ObjectExists(id));
        }
        self.objects.insert(id, object);
        self.structure_changed();
        self.emit(GameEvent::ObjectCreated { object: id });
        Ok(())
    }

    // === Values ===

    /// Descriptor lookup that also checks the object's kind may carry it.
    fn descriptor_for(&self, object: ObjectId, property: PropertyId) -> EngineResult<&PropertyBase> {
        let obj = self.object(object)?;
        let desc = self.registry.get(property)?;
        if !desc.applies_to(obj.kind()) {
            return Err(EngineError::NotDeclared {
                property: desc.qualified_name(),
                kind: obj.kind().to_string(),
            });
        }
        Ok(desc)
    }

    /// Stored value, or the descriptor's default when unset.
    pub fn base_value_raw(&self, object: ObjectId, property: PropertyId) -> EngineResult<Value> {
        let desc = self.descriptor_for(object, property)?;
        Ok(self
            .object(object)?
            .local(property)
            .cloned()
            .unwrap_or_else(|| desc.default.clone()))
    }

    /// Typed base value, ignoring effects.
    pub fn base_value<T: PropertyType>(&self, object: ObjectId, property: Property<T>) -> EngineResult<T> {
        let value = self.base_value_raw(object, property.id())?;
        self.convert(property.id(), &value)
    }

    /// Effective value with all attached effects applied.
    pub fn value(&self, object: ObjectId, property: PropertyId) -> EngineResult<Value> {
        let ctx = EffectContext::new(self);
        self.evaluate(&ctx, object, property)
    }

    /// Typed effective value.
    pub fn get_value<T: PropertyType>(&self, object: ObjectId, property: Property<T>) -> EngineResult<T> {
        let value = self.value(object, property.id())?;
        self.convert(property.id(), &value)
    }

    pub(crate) fn convert<T: PropertyType>(&self, property: PropertyId, value: &Value) -> EngineResult<T> {
        T::from_value(value).ok_or_else(|| EngineError::TypeMismatch {
            property: self.property_name(property),
            expected: T::KIND.name(),
            found: value.kind().name(),
        })
    }

    pub(crate) fn evaluate(
        &self,
        ctx: &EffectContext<'_>,
        object: ObjectId,
        property: PropertyId,
    ) -> EngineResult<Value> {
        let key = (object, property);
        let Some(ids) = self.by_target.get(&key) else {
            return self.base_value_raw(object, property);
        };

        if let Some(cached) = self.cache.borrow().get(&key).cloned() {
            return Ok(cached);
        }

        ctx.enter(key, self.max_effect_depth)?;
        let result = self.fold_effects(ctx, object, property, ids);
        ctx.leave();
        let value = result?;

        self.recomputations.set(self.recomputations.get() + 1);
        trace!(object = object.0, property = property.0, %value, "effective value recomputed");
        self.cache.borrow_mut().insert(key, value.clone());
        Ok(value)
    }

    fn fold_effects(
        &self,
        ctx: &EffectContext<'_>,
        object: ObjectId,
        property: PropertyId,
        ids: &[EffectId],
    ) -> EngineResult<Value> {
        let desc = self.registry.get(property)?;
        let mut value = self.base_value_raw(object, property)?;
        for id in ids {
            let instance = self.effects.get(id).ok_or(EngineError::UnknownEffect(id.0))?;
            value = instance.effect.modify(ctx, object, value)?;
            if value.kind() != desc.kind {
                return Err(EngineError::TypeMismatch {
                    property: desc.qualified_name(),
                    expected: desc.kind.name(),
                    found: value.kind().name(),
                });
            }
        }
        Ok(value)
    }

    /// Store (`Some`) or clear (`None`) a value; returns the previous local value.
    pub(crate) fn replace_local(
        &mut self,
        object: ObjectId,
        property: PropertyId,
        value: Option<Value>,
    ) -> EngineResult<Option<Value>> {
        let desc = self.descriptor_for(object, property)?;
        if let Some(v) = &value {
            if v.kind() != desc.kind {
                return Err(EngineError::TypeMismatch {
                    property: desc.qualified_name(),
                    expected: desc.kind.name(),
                    found: v.kind().name(),
                });
            }
        }
        let obj = self.objects.get_mut(&object).ok_or(EngineError::UnknownObject(object))?;
        let previous = obj.replace_local(property, value);
        self.invalidate(object, property);
        self.emit(GameEvent::PropertyChanged { object, property });
        Ok(previous)
    }

    /// Number of effective values computed through effects so far.
    #[must_use]
    pub fn recomputations(&self) -> u64 {
        self.recomputations.get()
    }

    fn invalidate(&self, object: ObjectId, property: PropertyId) {
        let mut cache = self.cache.borrow_mut();
        if cache.is_empty() {
            return;
        }
        let mut work: SmallVec<[Key; 8]> = SmallVec::new();
        let mut seen: FxHashSet<Key> = FxHashSet::default();
        work.push((object, property));

        while let Some(key) = work.pop() {
            if !seen.insert(key) {
                continue;
            }
            cache.remove(&key);
            for instance in self.effects.values() {
                if instance.effect.invalidate(key.1) {
                    work.push((instance.target, instance.effect.property()));
                }
            }
        }
    }

    fn structure_changed(&self) {
        self.cache.borrow_mut().clear();
    }

    // === Effects ===

    /// Effects attached to one (object, property) pair, in application order.
    pub fn effects_on(&self, object: ObjectId, property: PropertyId) -> Vec<&EffectInstance> {
        self.by_target
            .get(&(object, property))
            .map(|ids| ids.iter().filter_map(|id| self.effects.get(id)).collect())
            .unwrap_or_default()
    }

    pub fn effect(&self, id: EffectId) -> EngineResult<&EffectInstance> {
        self.effects.get(&id).ok_or(EngineError::UnknownEffect(id.0))
    }

    #[must_use]
    pub fn effect_count(&self) -> usize {
        self.effects.len()
    }

    /// Every effect attached to `object`, in id order.
    #[must_use]
    pub fn effects_targeting(&self, object: ObjectId) -> Vec<EffectId> {
        self.effects
            .values()
            .filter(|e| e.target == object)
            .map(|e| e.id)
            .collect()
    }

    /// The id the next attached effect will receive.
    #[must_use]
    pub fn next_effect_id(&self) -> EffectId {
        EffectId(self.next_effect)
    }

    pub(crate) fn attach_effect(&mut self, target: ObjectId, effect: Arc<dyn Effect>) -> EngineResult<EffectId> {
        let property = effect.property();
        crate::effects::ensure_modifiable(&self.registry, property)?;
        self.descriptor_for(target, property)?;

        let id = EffectId(self.next_effect);
        self.next_effect += 1;
        self.insert_effect(EffectInstance { id, target, effect });
        Ok(id)
    }

    /// Undo the most recent attach, handing its id back to the allocator.
    pub(crate) fn unattach_effect(&mut self, id: EffectId) -> EngineResult<EffectInstance> {
        if id.0 + 1 != self.next_effect {
            return Err(EngineError::command_state(
                format!("attach {id}"),
                "undone out of order",
            ));
        }
        let instance = self.detach_effect(id)?;
        self.next_effect = id.0;
        Ok(instance)
    }

    pub(crate) fn detach_effect(&mut self, id: EffectId) -> EngineResult<EffectInstance> {
        let instance = self.effects.remove(&id).ok_or(EngineError::UnknownEffect(id.0))?;
        let key = (instance.target, instance.effect.property());
        if let Some(ids) = self.by_target.get_mut(&key) {
            ids.retain(|e| *e != id);
            if ids.is_empty() {
                self.by_target.remove(&key);
            }
        }
        self.invalidate(key.0, key.1);
        self.emit(GameEvent::EffectDetached { effect: id, target: instance.target });
        Ok(instance)
    }

    /// Re-attach a detached instance under its original id and timestamp.
    pub(crate) fn restore_effect(&mut self, instance: EffectInstance) -> EngineResult<()> {
        if self.effects.contains_key(&instance.id) {
            return Err(EngineError::command_state(
                format!("restore {}", instance.id),
                "effect is already attached",
            ));
        }
        self.object(instance.target)?;
        self.insert_effect(instance);
        Ok(())
    }

    fn insert_effect(&mut self, instance: EffectInstance) {
        let id = instance.id;
        let target = instance.target;
        let key = (target, instance.effect.property());
        let order_key = instance.order_key();
        self.effects.insert(id, instance);

        let effects = &self.effects;
        let ids = self.by_target.entry(key).or_default();
        let pos = ids.partition_point(|other| {
            effects.get(other).map_or(true, |e| e.order_key() <= order_key)
        });
        ids.insert(pos, id);

        self.invalidate(key.0, key.1);
        self.emit(GameEvent::EffectAttached { effect: id, target });
    }

    // === Zones ===

    #[must_use]
    pub fn zones(&self) -> &ZoneManager {
        &self.zones
    }

    #[must_use]
    pub fn zone_of(&self, object: ObjectId) -> Option<Zone> {
        self.zones.zone_of(object)
    }

    #[must_use]
    pub fn zone_contents(&self, zone: Zone) -> Vec<ObjectId> {
        self.zones.contents(zone)
    }

    /// Declare a zone. Part of setup; not recorded for undo.
    pub fn init_zone(&mut self, zone: Zone) {
        self.zones.init_zone(zone);
    }

    /// Move (or first place) an object. Returns where it was.
    pub(crate) fn move_object(
        &mut self,
        object: ObjectId,
        zone: Zone,
        position: ZonePosition,
    ) -> EngineResult<Option<(Zone, usize)>> {
        self.object(object)?;
        let previous = self.zones.move_to(object, zone, position)?;
        let from = previous.map(|(z, _)| z);
        self.structure_changed();
        self.emit(GameEvent::ObjectMoved { object, from, to: Some(zone) });
        let was = from.map(|z| z.kind.visibility());
        if was != Some(zone.kind.visibility()) {
            self.emit(GameEvent::VisibilityChanged { object });
        }
        Ok(previous)
    }

    /// Take an object out of the zone table without destroying it.
    pub(crate) fn unplace_object(&mut self, object: ObjectId) -> Option<(Zone, usize)> {
        let previous = self.zones.remove(object)?;
        self.structure_changed();
        self.emit(GameEvent::ObjectMoved { object, from: Some(previous.0), to: None });
        self.emit(GameEvent::VisibilityChanged { object });
        Some(previous)
    }

    pub(crate) fn shuffle_zone(&mut self, zone: Zone) -> EngineResult<Vec<ObjectId>> {
        self.zones.shuffle(zone, &mut self.rng)
    }

    pub(crate) fn restore_zone_order(&mut self, zone: Zone, order: Vec<ObjectId>) -> EngineResult<()> {
        self.zones.restore_order(zone, order)
    }

    #[must_use]
    pub fn rng_state(&self) -> GameRngState {
        self.rng.checkpoint()
    }

    pub(crate) fn restore_rng(&mut self, state: &GameRngState) {
        self.rng.rewind(state);
    }

    // === Scopes ===

    #[must_use]
    pub fn scope_state(&self, id: ScopeId) -> Option<ScopeState> {
        self.scopes.get(&id).copied()
    }

    #[must_use]
    pub fn active_scopes(&self) -> usize {
        self.scopes.values().filter(|s| **s == ScopeState::Active).count()
    }

    pub(crate) fn replace_scope_state(&mut self, id: ScopeId, state: Option<ScopeState>) -> Option<ScopeState> {
        trace!(scope = %id, ?state, "scope state");
        match state {
            Some(state) => self.scopes.insert(id, state),
            None => self.scopes.remove(&id),
        }
    }

    // === Events ===

    pub(crate) fn emit(&mut self, event: GameEvent) {
        self.events.push(event);
    }

    /// Events queued since the last drain.
    #[must_use]
    pub fn pending_events(&self) -> &[GameEvent] {
        &self.events
    }

    /// Take all queued events.
    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }

    pub(crate) fn event_mark(&self) -> usize {
        self.events.len()
    }

    /// Drop events queued after `mark`; used when a transaction is cancelled.
    pub(crate) fn truncate_events(&mut self, mark: usize) {
        self.events.truncate(mark);
    }

    // === Snapshots ===

    /// Observable state, for equality checks and persistence.
    #[must_use]
    pub fn snapshot(&self) -> ManagerSnapshot {
        ManagerSnapshot {
            objects: self.objects.clone(),
            zones: self.zones.clone(),
            effects: self
                .effects
                .values()
                .map(|e| EffectRecord {
                    id: e.id,
                    target: e.target,
                    property: e.effect.property(),
                    layer: e.effect.layer(),
                    description: e.effect.describe(),
                })
                .collect(),
            scopes: self.scopes.clone(),
            next_object: self.next_object,
            next_effect: self.next_effect,
            rng: self.rng.checkpoint(),
        }
    }

    /// Bincode encoding of the snapshot, for bit-for-bit comparisons.
    pub fn fingerprint(&self) -> EngineResult<Vec<u8>> {
        bincode::serialize(&self.snapshot()).map_err(|e| EngineError::Serialization(e.to_string()))
    }

    // === Names ===

    pub(crate) fn property_name(&self, property: PropertyId) -> String {
        self.registry
            .get(property)
            .map(PropertyBase::qualified_name)
            .unwrap_or_else(|_| format!("#{}", property.0))
    }

    pub(crate) fn key_name(&self, object: ObjectId, property: PropertyId) -> String {
        let name = self
            .registry
            .get(property)
            .map(|d| d.name.clone())
            .unwrap_or_else(|_| format!("#{}", property.0));
        format!("{object}.{name}")
    }
}

impl std::fmt::Debug for ObjectManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ObjectManager")
            .field("id", &self.id)
            .field("objects", &self.objects.len())
            .field("effects", &self.effects.len())
            .field("scopes", &self.scopes.len())
            .finish()
    }
}
