//! Built-in scopes.

use std::sync::Arc;

use crate::commands::{AttachEffectCommand, DetachEffectCommand, ResetValueCommand, SetValueCommand};
use crate::core::{EngineResult, ObjectId, PlayerId};
use crate::effects::{Effect, EffectId};
use crate::objects::{EventKind, GameEvent};

use super::bus::{GameObjectScope, ScopeContext, ScopeControl};

/// Keeps an effect attached until the current turn ends.
///
/// The effect is attached in `on_init` and detached in `on_uninit`, which
/// runs at the end of the turn or when the scope is ended early.
#[derive(Debug)]
pub struct UntilEndOfTurn {
    target: ObjectId,
    effect: Arc<dyn Effect>,
    attached: Option<EffectId>,
}

impl UntilEndOfTurn {
    pub fn new(target: ObjectId, effect: impl Effect + 'static) -> Self {
        Self { target, effect: Arc::new(effect), attached: None }
    }

    #[must_use]
    pub fn attached(&self) -> Option<EffectId> {
        self.attached
    }
}

impl GameObjectScope for UntilEndOfTurn {
    fn handled_events(&self) -> &[EventKind] {
        &[EventKind::TurnEnded]
    }

    fn on_init(&mut self, ctx: &mut ScopeContext<'_>) -> EngineResult<()> {
        let id = ctx.manager().next_effect_id();
        ctx.apply(AttachEffectCommand::shared(self.target, Arc::clone(&self.effect)))?;
        self.attached = Some(id);
        Ok(())
    }

    fn on_event(&mut self, _event: &GameEvent, _ctx: &mut ScopeContext<'_>) -> EngineResult<ScopeControl> {
        Ok(ScopeControl::End)
    }

    fn on_uninit(&mut self, ctx: &mut ScopeContext<'_>) -> EngineResult<()> {
        let Some(id) = self.attached else {
            return Ok(());
        };
        // The attach may have been undone since.
        let still_ours = ctx
            .manager()
            .effect(id)
            .is_ok_and(|e| e.target == self.target && Arc::ptr_eq(&e.effect, &self.effect));
        if still_ours {
            ctx.apply(DetachEffectCommand::new(id))?;
        }
        Ok(())
    }
}

/// Counts the lands a player plays each turn.
///
/// Bumps the attached `LandsPlayedThisTurn` property on the player's object
/// for every land they play and clears it when any turn ends.
#[derive(Debug)]
pub struct LandsPlayedCounter {
    player: PlayerId,
    player_object: ObjectId,
}

impl LandsPlayedCounter {
    pub fn new(player: PlayerId, player_object: ObjectId) -> Self {
        Self { player, player_object }
    }
}

impl GameObjectScope for LandsPlayedCounter {
    fn handled_events(&self) -> &[EventKind] {
        &[EventKind::LandPlayed, EventKind::TurnEnded]
    }

    fn on_event(&mut self, event: &GameEvent, ctx: &mut ScopeContext<'_>) -> EngineResult<ScopeControl> {
        let counter = ctx.manager().standard().lands_played_this_turn;
        match event {
            GameEvent::LandPlayed { player, .. } if *player == self.player => {
                let played = ctx.manager().base_value(self.player_object, counter)?;
                ctx.apply(SetValueCommand::new(self.player_object, counter, played + 1))?;
            }
            GameEvent::TurnEnded { .. } => {
                if ctx.manager().object(self.player_object)?.local(counter.id()).is_some() {
                    ctx.apply(ResetValueCommand::new(self.player_object, counter))?;
                }
            }
            _ => {}
        }
        Ok(ScopeControl::Continue)
    }
}
