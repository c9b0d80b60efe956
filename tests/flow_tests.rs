//! Turn flow integration tests.
//!
//! Parts driven directly through a `FlowContext`, and whole steps driven
//! through a `Game` with scripted players.

use std::cell::RefCell;
use std::rc::Rc;

use ccg_rules::commands::{MoveObjectCommand, ObjectController, SetValueCommand, TransactionLog};
use ccg_rules::core::{EngineConfig, EngineError, NullLogSink, ObjectId, PlayerId, PlayerMap};
use ccg_rules::flow::{
    Answer, AttackContext, Block, DecisionProvider, DiscardPart, FlowContext, MulliganDecision, Part, PartResult,
    PassProvider, PriorityAction, ScriptedProvider, Step, TurnState,
};
use ccg_rules::game::{CardSpec, Game};
use ccg_rules::objects::{GameEvent, ObjectManager};
use ccg_rules::properties::{ObjectKind, PropertyRegistry};
use ccg_rules::zones::{Zone, ZonePosition};

const P0: PlayerId = PlayerId::new(0);
const P1: PlayerId = PlayerId::new(1);

fn game_with(providers: Vec<Box<dyn DecisionProvider>>) -> Game {
    Game::new(EngineConfig::default(), PropertyRegistry::shared(), providers).unwrap()
}

// =============================================================================
// Parts in isolation
// =============================================================================

/// A log with two player objects and `cards` cards in the first player's hand.
struct Table {
    log: TransactionLog,
    players: PlayerMap<ObjectId>,
    hand: Vec<ObjectId>,
}

fn table(cards: usize) -> Table {
    let mut manager = ObjectManager::new(PropertyRegistry::shared(), &EngineConfig::default());
    for player in PlayerId::all(2) {
        manager.init_zone(Zone::hand(player));
        manager.init_zone(Zone::graveyard(player));
    }
    let mut log = TransactionLog::new(manager);
    let players = PlayerMap::new(2, |_| log.create_object(ObjectKind::PLAYER).unwrap());

    let mut hand = Vec::new();
    for _ in 0..cards {
        let id = log.create_object(ObjectKind::CARD).unwrap();
        log.execute(Box::new(MoveObjectCommand::new(id, Zone::hand(P0), ZonePosition::Top))).unwrap();
        hand.push(id);
    }
    Table { log, players, hand }
}

fn discard(table: &mut Table, provider: ScriptedProvider) -> (PartResult, usize) {
    let config = EngineConfig::default();
    let mut scripted = Some(provider);
    let mut providers: PlayerMap<Box<dyn DecisionProvider>> = PlayerMap::new(2, |player| {
        match (player == P0).then(|| scripted.take()).flatten() {
            Some(provider) => Box::new(provider) as Box<dyn DecisionProvider>,
            None => Box::new(PassProvider),
        }
    });
    let turn = TurnState { active: P0, turn: 1, step: Some(Step::Cleanup) };
    let result = {
        let controller: &mut dyn ObjectController = &mut table.log;
        let mut ctx = FlowContext::new(controller, &mut providers, &table.players, &NullLogSink, &config, turn);
        Box::new(DiscardPart::new(P0)).execute(&mut ctx).unwrap()
    };
    let hand = table.log.manager().zone_contents(Zone::hand(P0)).len();
    (result, hand)
}

#[test]
fn test_invalid_discard_is_retried_without_changes() {
    let mut table = table(9);
    let before = table.log.manager().snapshot();

    let outsider = ObjectId(999);
    let (result, hand) = discard(&mut table, ScriptedProvider::new().then(Answer::Targets(vec![outsider])));
    assert!(result.is_retry());
    assert_eq!(result.next_name(), Some("Discard"));
    assert_eq!(hand, 9);
    assert_eq!(table.log.manager().snapshot(), before);

    let both = vec![table.hand[0], table.hand[1]];
    let (result, _) = discard(&mut table, ScriptedProvider::new().then(Answer::Targets(both)));
    assert!(result.is_retry());
}

#[test]
fn test_discard_continues_until_hand_fits() {
    let mut table = table(9);
    let first = table.hand[3];

    let (result, hand) = discard(&mut table, ScriptedProvider::new().then(Answer::Targets(vec![first])));
    assert!(matches!(result, PartResult::Continue(_)));
    assert_eq!(result.next_name(), Some("Discard"));
    assert_eq!(hand, 8);
    assert_eq!(table.log.manager().zone_of(first), Some(Zone::graveyard(P0)));

    let second = table.hand[0];
    let (result, hand) = discard(&mut table, ScriptedProvider::new().then(Answer::Targets(vec![second])));
    assert!(result.is_done());
    assert_eq!(hand, 7);
}

#[test]
fn test_small_hand_is_not_prompted() {
    let mut table = table(7);
    let before = table.log.manager().snapshot();
    // An invalid scripted answer would force a retry if the player were asked.
    let (result, hand) = discard(&mut table, ScriptedProvider::new().then(Answer::Targets(Vec::new())));
    assert!(result.is_done());
    assert_eq!(hand, 7);
    assert_eq!(table.log.manager().snapshot(), before);
}

#[test]
fn test_untap_never_schedules_priority() {
    let config = EngineConfig::default();
    for turn in 1..6 {
        let state = TurnState { active: PlayerId::new((turn % 2) as u8), turn, step: Some(Step::Untap) };
        let names: Vec<&str> = Step::Untap.sequence(&state, &config).iter().map(|p| p.name()).collect();
        assert!(!names.contains(&"Priority"));
    }
}

// =============================================================================
// Cleanup discard
// =============================================================================

#[test]
fn test_cleanup_discards_down_to_maximum() {
    let outsider = ObjectId(999);
    let mut hand = Vec::new();
    let script = ScriptedProvider::new()
        .then(Answer::Targets(vec![outsider]))
        // Player objects take ids 0 and 1; the hand starts at 2.
        .then(Answer::Targets(vec![ObjectId(2)]))
        .then(Answer::Targets(vec![ObjectId(5)]));
    let mut game = game_with(vec![Box::new(script)]);
    for i in 0..9 {
        hand.push(game.add_card_to_hand(P0, &CardSpec::spell(format!("Card {i}"))).unwrap());
    }
    let discarded = Rc::new(RefCell::new(Vec::new()));
    let record = Rc::clone(&discarded);
    game.subscribe(move |event| {
        if let GameEvent::CardDiscarded { card, .. } = event {
            record.borrow_mut().push(*card);
        }
    });

    game.run_step(Step::Cleanup).unwrap();

    assert_eq!(game.manager().zone_contents(Zone::hand(P0)).len(), 7);
    assert_eq!(game.manager().zone_contents(Zone::graveyard(P0)), vec![hand[0], hand[3]]);
    assert_eq!(*discarded.borrow(), vec![hand[0], hand[3]]);
}

#[test]
fn test_retried_discard_runs_again() {
    let script = ScriptedProvider::new()
        .then(Answer::Targets(vec![ObjectId(999)]))
        .then(Answer::Targets(vec![ObjectId(2)]));
    let mut game = game_with(vec![Box::new(script)]);
    for i in 0..8 {
        game.add_card_to_hand(P0, &CardSpec::spell(format!("Card {i}"))).unwrap();
    }
    let before = game.parts_run();

    game.run_step(Step::Cleanup).unwrap();
    // Two announcements, the retried discard, the discard and cleanup.
    assert_eq!(game.parts_run() - before, 5);
    assert_eq!(game.manager().zone_contents(Zone::graveyard(P0)), vec![ObjectId(2)]);
}

// =============================================================================
// Mulligan
// =============================================================================

#[test]
fn test_mulligan_draws_one_fewer() {
    let script = ScriptedProvider::new()
        .then(Answer::Mulligan(MulliganDecision::Mulligan))
        .then(Answer::Mulligan(MulliganDecision::Keep));
    let mut game = game_with(vec![Box::new(script)]);
    for player in [P0, P1] {
        for i in 0..20 {
            game.add_card_to_library(player, &CardSpec::land(format!("Land {i}"))).unwrap();
        }
    }

    game.start().unwrap();

    let std = game.manager().standard();
    assert_eq!(game.manager().zone_contents(Zone::hand(P0)).len(), 6);
    assert_eq!(game.manager().zone_contents(Zone::library(P0)).len(), 14);
    assert_eq!(game.get(game.player_object(P0), std.mulligans_taken).unwrap(), 1);
    assert_eq!(game.manager().zone_contents(Zone::hand(P1)).len(), 7);
    assert_eq!(game.get(game.player_object(P1), std.mulligans_taken).unwrap(), 0);
}

#[test]
fn test_start_is_deterministic_per_seed() {
    let deal = || {
        let mut game = game_with(Vec::new());
        for i in 0..20 {
            game.add_card_to_library(P0, &CardSpec::land(format!("Land {i}"))).unwrap();
        }
        game.start().unwrap();
        game.manager().zone_contents(Zone::hand(P0))
    };
    assert_eq!(deal(), deal());
}

// =============================================================================
// Combat
// =============================================================================

#[test]
fn test_unblocked_attacker_hits_player() {
    // The attacker is the first card, so it takes id 2.
    let script = ScriptedProvider::new().then(Answer::Attackers(vec![ObjectId(2)]));
    let mut game = game_with(vec![Box::new(script)]);
    let bear = game.add_card_to_battlefield(P0, &CardSpec::creature("Bear", 3, 3)).unwrap();
    assert_eq!(bear, ObjectId(2));
    let std = game.manager().standard();

    for step in [Step::DeclareAttackers, Step::DeclareBlockers, Step::CombatDamage] {
        game.run_step(step).unwrap();
    }
    assert_eq!(game.get(game.player_object(P1), std.life).unwrap(), 17);
    assert!(game.get(bear, std.tapped).unwrap());

    game.run_step(Step::EndCombat).unwrap();
    assert!(!game.get(bear, std.attacking).unwrap());
}

#[test]
fn test_blocked_creatures_trade() {
    let (attacker, blocker) = (ObjectId(2), ObjectId(3));
    let offence = ScriptedProvider::new().then(Answer::Attackers(vec![attacker]));
    let defence = ScriptedProvider::new().then(Answer::Blockers(vec![Block { blocker, attacker }]));
    let mut game = game_with(vec![Box::new(offence), Box::new(defence)]);
    game.add_card_to_battlefield(P0, &CardSpec::creature("Bear", 2, 2)).unwrap();
    game.add_card_to_battlefield(P1, &CardSpec::creature("Wolf", 2, 2)).unwrap();
    let std = game.manager().standard();

    for step in [Step::DeclareAttackers, Step::DeclareBlockers, Step::CombatDamage] {
        game.run_step(step).unwrap();
    }

    assert_eq!(game.get(game.player_object(P1), std.life).unwrap(), 20);
    assert_eq!(game.manager().zone_of(attacker), Some(Zone::graveyard(P0)));
    assert_eq!(game.manager().zone_of(blocker), Some(Zone::graveyard(P1)));
    assert_eq!(game.get(attacker, std.damage).unwrap(), 0);
}

#[test]
fn test_damage_to_player_saturates() {
    let script = ScriptedProvider::new().then(Answer::Attackers(vec![ObjectId(2)]));
    let mut game = game_with(vec![Box::new(script)]);
    game.add_card_to_battlefield(P0, &CardSpec::creature("Colossus", i64::MAX, 1)).unwrap();
    let std = game.manager().standard();
    let defender = game.player_object(P1);
    game.apply(SetValueCommand::new(defender, std.life, -5)).unwrap();

    for step in [Step::DeclareAttackers, Step::DeclareBlockers, Step::CombatDamage] {
        game.run_step(step).unwrap();
    }
    assert_eq!(game.get(defender, std.life).unwrap(), i64::MIN);
}

#[test]
fn test_damage_to_creature_saturates() {
    let (attacker, blocker) = (ObjectId(2), ObjectId(3));
    let offence = ScriptedProvider::new().then(Answer::Attackers(vec![attacker]));
    let defence = ScriptedProvider::new().then(Answer::Blockers(vec![Block { blocker, attacker }]));
    let mut game = game_with(vec![Box::new(offence), Box::new(defence)]);
    game.add_card_to_battlefield(P0, &CardSpec::creature("Colossus", i64::MAX, 10)).unwrap();
    game.add_card_to_battlefield(P1, &CardSpec::creature("Wall", 0, i64::MAX)).unwrap();
    let std = game.manager().standard();
    game.apply(SetValueCommand::new(blocker, std.damage, 1)).unwrap();

    for step in [Step::DeclareAttackers, Step::DeclareBlockers, Step::CombatDamage] {
        game.run_step(step).unwrap();
    }
    assert_eq!(game.manager().zone_of(blocker), Some(Zone::graveyard(P1)));
    assert_eq!(game.manager().zone_of(attacker), Some(Zone::BATTLEFIELD));
}

#[test]
fn test_invalid_attackers_are_retried() {
    let (bear, stranger) = (ObjectId(2), ObjectId(3));
    let script = ScriptedProvider::new()
        .then(Answer::Attackers(vec![bear, bear]))
        .then(Answer::Attackers(vec![stranger]))
        .then(Answer::Attackers(vec![bear]));
    let mut game = game_with(vec![Box::new(script)]);
    game.add_card_to_battlefield(P0, &CardSpec::creature("Bear", 2, 2)).unwrap();
    game.add_card_to_battlefield(P1, &CardSpec::creature("Stranger", 1, 1)).unwrap();
    let std = game.manager().standard();

    game.run_step(Step::DeclareAttackers).unwrap();
    assert!(game.get(bear, std.attacking).unwrap());
    assert!(!game.get(stranger, std.attacking).unwrap());
}

/// Always attacks with a creature it does not control.
struct Stubborn {
    attacker: ObjectId,
}

impl DecisionProvider for Stubborn {
    fn declare_attackers(&mut self, _ctx: &AttackContext) -> Vec<ObjectId> {
        vec![self.attacker]
    }
}

#[test]
fn test_endless_retries_hit_the_limit() {
    let stranger = ObjectId(3);
    let config = EngineConfig::default().with_max_part_retries(3);
    let providers: Vec<Box<dyn DecisionProvider>> = vec![Box::new(Stubborn { attacker: stranger })];
    let mut game = Game::new(config, PropertyRegistry::shared(), providers).unwrap();
    game.add_card_to_battlefield(P0, &CardSpec::creature("Bear", 2, 2)).unwrap();
    game.add_card_to_battlefield(P1, &CardSpec::creature("Stranger", 1, 1)).unwrap();
    let before = game.parts_run();

    let err = game.run_step(Step::DeclareAttackers).unwrap_err();
    assert_eq!(err, EngineError::RetryLimit { part: "DeclareAttackers", attempts: 4 });
    // The step announcement plus four attempts.
    assert_eq!(game.parts_run() - before, 5);
    assert!(!game.get(stranger, game.manager().standard().attacking).unwrap());
}

// =============================================================================
// Priority and lands
// =============================================================================

#[test]
fn test_second_land_is_illegal() {
    let (forest, island) = (ObjectId(2), ObjectId(3));
    let script = ScriptedProvider::new()
        .then(Answer::Priority(PriorityAction::PlayLand(forest)))
        .then(Answer::Priority(PriorityAction::PlayLand(island)));
    let mut game = game_with(vec![Box::new(script)]);
    game.add_card_to_hand(P0, &CardSpec::land("Forest")).unwrap();
    game.add_card_to_hand(P0, &CardSpec::land("Island")).unwrap();

    game.run_step(Step::Main1).unwrap();

    assert_eq!(game.manager().zone_contents(Zone::BATTLEFIELD), vec![forest]);
    assert_eq!(game.manager().zone_contents(Zone::hand(P0)), vec![island]);
    let counter = game.manager().standard().lands_played_this_turn;
    assert_eq!(game.get(game.player_object(P0), counter).unwrap(), 1);
}

#[test]
fn test_no_lands_outside_main_phase() {
    let forest = ObjectId(2);
    let script = ScriptedProvider::new().then(Answer::Priority(PriorityAction::PlayLand(forest)));
    let mut game = game_with(vec![Box::new(script)]);
    game.add_card_to_hand(P0, &CardSpec::land("Forest")).unwrap();

    game.run_step(Step::Upkeep).unwrap();
    assert_eq!(game.manager().zone_of(forest), Some(Zone::hand(P0)));
}

#[test]
fn test_land_counter_resets_at_end_of_turn() {
    let forest = ObjectId(2);
    let script = ScriptedProvider::new().then(Answer::Priority(PriorityAction::PlayLand(forest)));
    let mut game = game_with(vec![Box::new(script)]);
    game.add_card_to_hand(P0, &CardSpec::land("Forest")).unwrap();
    let counter = game.manager().standard().lands_played_this_turn;

    game.run_step(Step::Main1).unwrap();
    assert_eq!(game.manager().zone_of(forest), Some(Zone::BATTLEFIELD));
    assert_eq!(game.get(game.player_object(P0), counter).unwrap(), 1);

    game.run_step(Step::Cleanup).unwrap();
    assert_eq!(game.get(game.player_object(P0), counter).unwrap(), 0);
}

// =============================================================================
// Game transactions
// =============================================================================

#[test]
fn test_cancelled_game_transaction_leaves_no_trace() {
    let mut game = game_with(Vec::new());
    let bear = game.add_card_to_battlefield(P0, &CardSpec::creature("Bear", 2, 2)).unwrap();
    let std = game.manager().standard();
    let before = game.fingerprint().unwrap();
    let history = game.history().len();

    let token = game.begin_transaction();
    game.apply(SetValueCommand::new(bear, std.power, 9)).unwrap();
    assert_eq!(game.run_turn().unwrap_err(), EngineError::TransactionOpen);
    game.end_transaction(false, token).unwrap();

    assert_eq!(game.fingerprint().unwrap(), before);
    assert_eq!(game.history().len(), history);
}

#[test]
fn test_committed_game_transaction_is_one_step() {
    let mut game = game_with(Vec::new());
    let bear = game.add_card_to_battlefield(P0, &CardSpec::creature("Bear", 2, 2)).unwrap();
    let std = game.manager().standard();
    let history = game.history().len();

    let token = game.begin_transaction();
    game.apply(SetValueCommand::new(bear, std.power, 4)).unwrap();
    game.apply(SetValueCommand::new(bear, std.tapped, true)).unwrap();
    game.end_transaction(true, token).unwrap();
    assert_eq!(game.history().len(), history + 1);

    game.undo().unwrap();
    assert_eq!(game.get(bear, std.power).unwrap(), 2);
    assert!(!game.get(bear, std.tapped).unwrap());
}
