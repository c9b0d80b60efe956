//! Parts: the units of rule execution.
//!
//! A part runs once. It either finishes (`Done`), hands over to a follow-up
//! part (`Continue`), or asks to be run again because the player's answer
//! was not acceptable (`Retry`). The sequencer runs every part in its own
//! transaction; a retried part's transaction is cancelled, so an invalid
//! answer never changes the game.

use std::fmt;

use crate::commands::{Command, ObjectController};
use crate::core::{EngineConfig, EngineResult, LogSink, ObjectId, PlayerId, PlayerMap};
use crate::objects::{GameEvent, ObjectManager};
use crate::properties::{Property, PropertyType};
use crate::zones::Zone;

use super::decision::DecisionProvider;
use super::step::{Step, TurnState};

/// Outcome of running a part.
pub enum PartResult {
    Done,
    /// Run this part next.
    Continue(Box<dyn Part>),
    /// The input was invalid; run this part again. Nothing was changed.
    Retry(Box<dyn Part>),
}

impl PartResult {
    #[must_use]
    pub fn is_done(&self) -> bool {
        matches!(self, PartResult::Done)
    }

    #[must_use]
    pub fn is_retry(&self) -> bool {
        matches!(self, PartResult::Retry(_))
    }

    /// Name of the follow-up part, if any.
    #[must_use]
    pub fn next_name(&self) -> Option<&'static str> {
        match self {
            PartResult::Done => None,
            PartResult::Continue(p) | PartResult::Retry(p) => Some(p.name()),
        }
    }
}

impl fmt::Debug for PartResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PartResult::Done => write!(f, "Done"),
            PartResult::Continue(p) => write!(f, "Continue({p:?})"),
            PartResult::Retry(p) => write!(f, "Retry({p:?})"),
        }
    }
}

/// A unit of rule execution.
pub trait Part: fmt::Debug {
    fn execute(self: Box<Self>, ctx: &mut FlowContext<'_>) -> EngineResult<PartResult>;

    fn name(&self) -> &'static str;
}

/// The game pieces a part may use.
pub struct FlowContext<'a> {
    controller: &'a mut dyn ObjectController,
    providers: &'a mut PlayerMap<Box<dyn DecisionProvider>>,
    players: &'a PlayerMap<ObjectId>,
    sink: &'a dyn LogSink,
    config: &'a EngineConfig,
    turn: TurnState,
}

impl<'a> FlowContext<'a> {
    pub fn new(
        controller: &'a mut dyn ObjectController,
        providers: &'a mut PlayerMap<Box<dyn DecisionProvider>>,
        players: &'a PlayerMap<ObjectId>,
        sink: &'a dyn LogSink,
        config: &'a EngineConfig,
        turn: TurnState,
    ) -> Self {
        Self { controller, providers, players, sink, config, turn }
    }

    #[must_use]
    pub fn manager(&self) -> &ObjectManager {
        self.controller.manager()
    }

    pub fn controller(&mut self) -> &mut dyn ObjectController {
        &mut *self.controller
    }

    pub fn provider(&mut self, player: PlayerId) -> &mut dyn DecisionProvider {
        &mut *self.providers[player]
    }

    #[must_use]
    pub fn config(&self) -> &EngineConfig {
        self.config
    }

    #[must_use]
    pub fn turn(&self) -> TurnState {
        self.turn
    }

    #[must_use]
    pub fn step(&self) -> Option<Step> {
        self.turn.step
    }

    #[must_use]
    pub fn active_player(&self) -> PlayerId {
        self.turn.active
    }

    #[must_use]
    pub fn player_count(&self) -> usize {
        self.players.player_count()
    }

    /// The object representing `player`.
    #[must_use]
    pub fn player_object(&self, player: PlayerId) -> ObjectId {
        self.players[player]
    }

    #[must_use]
    pub fn hand(&self, player: PlayerId) -> Vec<ObjectId> {
        self.manager().zone_contents(Zone::hand(player))
    }

    #[must_use]
    pub fn library(&self, player: PlayerId) -> Vec<ObjectId> {
        self.manager().zone_contents(Zone::library(player))
    }

    /// Battlefield objects whose effective controller is `player`.
    pub fn controlled_by(&self, player: PlayerId) -> EngineResult<Vec<ObjectId>> {
        let manager = self.manager();
        let controller = manager.standard().controller;
        let mut out = Vec::new();
        for id in manager.zone_contents(Zone::BATTLEFIELD) {
            if manager.get_value(id, controller)? == Some(player) {
                out.push(id);
            }
        }
        Ok(out)
    }

    /// Effective value shorthand.
    pub fn get<T: PropertyType>(&self, object: ObjectId, property: Property<T>) -> EngineResult<T> {
        self.manager().get_value(object, property)
    }

    pub fn apply(&mut self, command: impl Command + 'static) -> EngineResult<()> {
        self.controller.execute(Box::new(command))
    }

    pub fn raise(&mut self, event: GameEvent) {
        self.controller.raise(event);
    }

    pub fn log(&self, source: Option<PlayerId>, message: &str) {
        self.sink.log(source, message);
    }
}
