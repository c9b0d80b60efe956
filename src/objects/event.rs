//! Change notifications and rule events.
//!
//! The object manager queues an event for every observable change; the flow
//! engine adds turn-structure events. Queued events are drained after each
//! part and handed to scopes and presentation observers.

use serde::{Deserialize, Serialize};

use crate::core::{ObjectId, PlayerId};
use crate::effects::EffectId;
use crate::flow::Step;
use crate::properties::PropertyId;
use crate::zones::Zone;

/// Discriminant of a `GameEvent`, used to index scope handlers.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum EventKind {
    PropertyChanged,
    ObjectCreated,
    ObjectDestroyed,
    ObjectMoved,
    EffectAttached,
    EffectDetached,
    VisibilityChanged,
    TurnBegan,
    TurnEnded,
    StepBegan,
    StepEnded,
    CardDrawn,
    CardDiscarded,
    LandPlayed,
}

/// Something that happened in a game.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum GameEvent {
    /// A stored value was set or reset.
    PropertyChanged { object: ObjectId, property: PropertyId },
    ObjectCreated { object: ObjectId },
    ObjectDestroyed { object: ObjectId },
    /// `from`/`to` are `None` when the object enters or leaves the zone table.
    ObjectMoved { object: ObjectId, from: Option<Zone>, to: Option<Zone> },
    EffectAttached { effect: EffectId, target: ObjectId },
    EffectDetached { effect: EffectId, target: ObjectId },
    /// The object moved between zones of different visibility class.
    VisibilityChanged { object: ObjectId },
    TurnBegan { player: PlayerId, turn: u32 },
    TurnEnded { player: PlayerId, turn: u32 },
    StepBegan { player: PlayerId, step: Step },
    StepEnded { player: PlayerId, step: Step },
    CardDrawn { player: PlayerId, card: ObjectId },
    CardDiscarded { player: PlayerId, card: ObjectId },
    LandPlayed { player: PlayerId, card: ObjectId },
}

impl GameEvent {
    #[must_use]
    pub fn kind(&self) -> EventKind {
        match self {
            GameEvent::PropertyChanged { .. } => EventKind::PropertyChanged,
            GameEvent::ObjectCreated { .. } => EventKind::ObjectCreated,
            GameEvent::ObjectDestroyed { .. } => EventKind::ObjectDestroyed,
            GameEvent::ObjectMoved { .. } => EventKind::ObjectMoved,
            GameEvent::EffectAttached { .. } => EventKind::EffectAttached,
            GameEvent::EffectDetached { .. } => EventKind::EffectDetached,
            GameEvent::VisibilityChanged { .. } => EventKind::VisibilityChanged,
            GameEvent::TurnBegan { .. } => EventKind::TurnBegan,
            GameEvent::TurnEnded { .. } => EventKind::TurnEnded,
            GameEvent::StepBegan { .. } => EventKind::StepBegan,
            GameEvent::StepEnded { .. } => EventKind::StepEnded,
            GameEvent::CardDrawn { .. } => EventKind::CardDrawn,
            GameEvent::CardDiscarded { .. } => EventKind::CardDiscarded,
            GameEvent::LandPlayed { .. } => EventKind::LandPlayed,
        }
    }

    /// The player the event is about, if any.
    #[must_use]
    pub fn player(&self) -> Option<PlayerId> {
        match self {
            GameEvent::TurnBegan { player, .. }
            | GameEvent::TurnEnded { player, .. }
            | GameEvent::StepBegan { player, .. }
            | GameEvent::StepEnded { player, .. }
            | GameEvent::CardDrawn { player, .. }
            | GameEvent::CardDiscarded { player, .. }
            | GameEvent::LandPlayed { player, .. } => Some(*player),
            _ => None,
        }
    }
}
