//! Scope system integration tests.
//!
//! Scope lifetimes on a running game: effects bounded by a scope, handlers
//! that end themselves, spawned scopes and the rule bypass marker.

use std::cell::RefCell;
use std::rc::Rc;

use ccg_rules::core::{EngineConfig, EngineError, EngineResult, ObjectId, PlayerId};
use ccg_rules::effects::AddInt;
use ccg_rules::flow::{Answer, DecisionProvider, PriorityAction, ScriptedProvider, Step};
use ccg_rules::game::{CardSpec, Game};
use ccg_rules::objects::{EventKind, GameEvent};
use ccg_rules::properties::PropertyRegistry;
use ccg_rules::scope::{GameObjectScope, Scope, ScopeContext, ScopeControl, ScopeState, UntilEndOfTurn};
use ccg_rules::zones::Zone;

fn game() -> Game {
    Game::new(EngineConfig::default(), PropertyRegistry::shared(), Vec::new()).unwrap()
}

fn plus_one(game: &Game) -> AddInt {
    let power = game.manager().standard().power;
    AddInt::new(game.manager().registry(), power, 1).unwrap()
}

/// Records the events it sees; ends itself after `limit` of them.
#[derive(Debug)]
struct Recorder {
    seen: Rc<RefCell<Vec<EventKind>>>,
    limit: usize,
}

impl GameObjectScope for Recorder {
    fn handled_events(&self) -> &[EventKind] {
        &[EventKind::StepBegan, EventKind::TurnEnded]
    }

    fn on_event(&mut self, event: &GameEvent, _ctx: &mut ScopeContext<'_>) -> EngineResult<ScopeControl> {
        let mut seen = self.seen.borrow_mut();
        seen.push(event.kind());
        if seen.len() >= self.limit {
            Ok(ScopeControl::End)
        } else {
            Ok(ScopeControl::Continue)
        }
    }
}

// =============================================================================
// Effect lifetimes
// =============================================================================

#[test]
fn test_plus_one_until_scope_ends() {
    let mut game = game();
    let p0 = PlayerId::new(0);
    let card = game.add_card_to_battlefield(p0, &CardSpec::creature("Bear", 0, 2)).unwrap();
    let power = game.manager().standard().power;
    assert_eq!(game.get(card, power).unwrap(), 0);

    let effect = plus_one(&game);
    let scope = game.add_scope(UntilEndOfTurn::new(card, effect)).unwrap();
    assert_eq!(game.get(card, power).unwrap(), 1);
    assert_eq!(game.scope_state(scope), Some(ScopeState::Active));

    game.end_scope(scope).unwrap();
    assert_eq!(game.get(card, power).unwrap(), 0);
    assert_eq!(game.scope_state(scope), Some(ScopeState::Ended));
    assert_eq!(game.manager().effect_count(), 0);
}

#[test]
fn test_until_end_of_turn_expires() {
    let mut game = game();
    let p0 = PlayerId::new(0);
    let card = game.add_card_to_battlefield(p0, &CardSpec::creature("Bear", 2, 2)).unwrap();
    let power = game.manager().standard().power;

    let effect = plus_one(&game);
    let scope = game.add_scope(UntilEndOfTurn::new(card, effect)).unwrap();
    assert_eq!(game.get(card, power).unwrap(), 3);

    game.run_turn().unwrap();
    assert_eq!(game.get(card, power).unwrap(), 2);
    assert_eq!(game.scope_state(scope), Some(ScopeState::Ended));
}

#[test]
fn test_undo_of_scope_init_removes_effect() {
    let mut game = game();
    let p0 = PlayerId::new(0);
    let card = game.add_card_to_battlefield(p0, &CardSpec::creature("Bear", 2, 2)).unwrap();
    let power = game.manager().standard().power;

    let effect = plus_one(&game);
    let scope = game.add_scope(UntilEndOfTurn::new(card, effect)).unwrap();
    game.undo().unwrap();
    assert_eq!(game.get(card, power).unwrap(), 2);
    assert_eq!(game.scope_state(scope), None);
    assert!(matches!(game.end_scope(scope), Err(EngineError::ScopeState { .. })));

    game.redo().unwrap();
    assert_eq!(game.scope_state(scope), Some(ScopeState::Active));
    assert_eq!(game.get(card, power).unwrap(), 3);
    game.run_turn().unwrap();
    assert_eq!(game.get(card, power).unwrap(), 2);
    assert_eq!(game.scope_state(scope), Some(ScopeState::Ended));
}

#[test]
fn test_undone_end_revives_scope_and_effect() {
    let mut game = game();
    let p0 = PlayerId::new(0);
    let card = game.add_card_to_battlefield(p0, &CardSpec::creature("Bear", 2, 2)).unwrap();
    let power = game.manager().standard().power;

    let effect = plus_one(&game);
    let scope = game.add_scope(UntilEndOfTurn::new(card, effect)).unwrap();
    game.end_scope(scope).unwrap();
    assert_eq!(game.get(card, power).unwrap(), 2);

    game.undo().unwrap();
    assert_eq!(game.get(card, power).unwrap(), 3);
    assert_eq!(game.scope_state(scope), Some(ScopeState::Active));

    // The revived scope still ends with the turn and takes its effect along.
    game.run_turn().unwrap();
    assert_eq!(game.get(card, power).unwrap(), 2);
    assert_eq!(game.scope_state(scope), Some(ScopeState::Ended));
    assert_eq!(game.manager().effect_count(), 0);
    game.run_turn().unwrap();
    assert_eq!(game.get(card, power).unwrap(), 2);
}

/// Fails whenever a turn ends.
#[derive(Debug)]
struct FailsAtEndOfTurn;

impl GameObjectScope for FailsAtEndOfTurn {
    fn handled_events(&self) -> &[EventKind] {
        &[EventKind::TurnEnded]
    }

    fn on_event(&mut self, _event: &GameEvent, _ctx: &mut ScopeContext<'_>) -> EngineResult<ScopeControl> {
        Err(EngineError::command_state("end of turn", "handler failed"))
    }
}

#[test]
fn test_failed_dispatch_keeps_earlier_scopes_alive() {
    let mut game = game();
    let p0 = PlayerId::new(0);
    let card = game.add_card_to_battlefield(p0, &CardSpec::creature("Bear", 2, 2)).unwrap();
    let power = game.manager().standard().power;

    let effect = plus_one(&game);
    let boost = game.add_scope(UntilEndOfTurn::new(card, effect)).unwrap();
    let failing = game.add_scope(FailsAtEndOfTurn).unwrap();

    // The boost ends first, then the failing handler cancels the whole part.
    let err = game.run_turn().unwrap_err();
    assert!(matches!(err, EngineError::CommandState { .. }));
    assert_eq!(game.scope_state(boost), Some(ScopeState::Active));
    assert_eq!(game.get(card, power).unwrap(), 3);
    assert_eq!(game.manager().effect_count(), 1);

    game.end_scope(failing).unwrap();
    game.end_scope(boost).unwrap();
    assert_eq!(game.get(card, power).unwrap(), 2);
    assert_eq!(game.manager().effect_count(), 0);
}

// =============================================================================
// Handler lifecycle
// =============================================================================

#[test]
fn test_nothing_delivered_after_end() {
    let mut game = game();
    let seen = Rc::new(RefCell::new(Vec::new()));
    let scope = game.add_scope(Recorder { seen: Rc::clone(&seen), limit: 2 }).unwrap();

    game.run_turn().unwrap();
    assert_eq!(*seen.borrow(), vec![EventKind::StepBegan, EventKind::StepBegan]);
    assert_eq!(game.scope_state(scope), Some(ScopeState::Ended));

    let err = game.end_scope(scope).unwrap_err();
    assert!(matches!(err, EngineError::ScopeState { .. }));
}

#[test]
fn test_every_step_reaches_live_scope() {
    let mut game = game();
    let seen = Rc::new(RefCell::new(Vec::new()));
    game.add_scope(Recorder { seen: Rc::clone(&seen), limit: usize::MAX }).unwrap();

    game.run_turn().unwrap();
    game.run_turn().unwrap();
    let seen = seen.borrow();
    assert_eq!(seen.iter().filter(|k| **k == EventKind::StepBegan).count(), 24);
    assert_eq!(seen.iter().filter(|k| **k == EventKind::TurnEnded).count(), 2);
}

/// Spawns an end-of-turn boost when its turn begins.
#[derive(Debug)]
struct Spawner {
    boost: Option<UntilEndOfTurn>,
}

impl GameObjectScope for Spawner {
    fn handled_events(&self) -> &[EventKind] {
        &[EventKind::TurnBegan]
    }

    fn on_event(&mut self, _event: &GameEvent, ctx: &mut ScopeContext<'_>) -> EngineResult<ScopeControl> {
        if let Some(boost) = self.boost.take() {
            ctx.spawn(boost);
        }
        Ok(ScopeControl::End)
    }
}

#[test]
fn test_spawned_scope_runs() {
    let mut game = game();
    let p0 = PlayerId::new(0);
    let card = game.add_card_to_battlefield(p0, &CardSpec::creature("Bear", 2, 2)).unwrap();
    let attached = Rc::new(RefCell::new(Vec::new()));
    let record = Rc::clone(&attached);
    game.subscribe(move |event| match event {
        GameEvent::EffectAttached { .. } => record.borrow_mut().push("attached"),
        GameEvent::EffectDetached { .. } => record.borrow_mut().push("detached"),
        _ => {}
    });

    let boost = UntilEndOfTurn::new(card, plus_one(&game));
    game.add_scope(Spawner { boost: Some(boost) }).unwrap();
    game.run_turn().unwrap();

    assert_eq!(*attached.borrow(), vec!["attached", "detached"]);
    assert_eq!(game.get(card, game.manager().standard().power).unwrap(), 2);
}

// =============================================================================
// Rule bypass
// =============================================================================

#[test]
fn test_rule_bypass_allows_extra_lands() {
    let p0 = PlayerId::new(0);
    // Player objects take ids 0 and 1; the two lands follow.
    let (forest, island) = (ObjectId(2), ObjectId(3));
    let script = ScriptedProvider::new()
        .then(Answer::Priority(PriorityAction::PlayLand(forest)))
        .then(Answer::Priority(PriorityAction::PlayLand(island)));
    let providers: Vec<Box<dyn DecisionProvider>> = vec![Box::new(script)];
    let mut game = Game::new(EngineConfig::default(), PropertyRegistry::shared(), providers).unwrap();
    assert_eq!(game.add_card_to_hand(p0, &CardSpec::land("Forest")).unwrap(), forest);
    assert_eq!(game.add_card_to_hand(p0, &CardSpec::land("Island")).unwrap(), island);

    {
        let _bypass = Scope::rule_bypass().begin();
        game.run_step(Step::Main1).unwrap();
    }

    assert_eq!(game.manager().zone_contents(Zone::BATTLEFIELD), vec![forest, island]);
    let counter = game.manager().standard().lands_played_this_turn;
    assert_eq!(game.get(game.player_object(p0), counter).unwrap(), 2);
}
