//! Observable manager state.
//!
//! A snapshot captures everything that distinguishes two managers: stored
//! values, zone order, attached effects, scope lifecycles, id allocators and
//! the RNG position.
//! Cached effective values are derived state and are not part of it.

use im::OrdMap;
use serde::{Deserialize, Serialize};

use crate::core::{GameRngState, ObjectId};
use crate::effects::EffectId;
use crate::properties::PropertyId;
use crate::scope::{ScopeId, ScopeState};
use crate::zones::ZoneManager;

use super::object::Object;

/// Description of an attached effect.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EffectRecord {
    pub id: EffectId,
    pub target: ObjectId,
    pub property: PropertyId,
    pub layer: i32,
    pub description: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManagerSnapshot {
    pub objects: OrdMap<ObjectId, Object>,
    pub zones: ZoneManager,
    pub effects: Vec<EffectRecord>,
    pub scopes: OrdMap<ScopeId, ScopeState>,
    pub next_object: u32,
    pub next_effect: u64,
    pub rng: GameRngState,
}

impl ManagerSnapshot {
    /// Pretty JSON, for debugging dumps.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}
