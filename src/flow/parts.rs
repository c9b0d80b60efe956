//! Turn-based actions and player decision points.

use tracing::{info, warn};

use crate::commands::{MoveObjectCommand, ResetValueCommand, SetValueCommand, ShuffleZoneCommand};
use crate::core::{EngineResult, ObjectId, PlayerId};
use crate::objects::GameEvent;
use crate::scope::Scope;
use crate::zones::{Zone, ZonePosition};

use super::decision::{
    AttackContext, Block, BlockContext, MulliganContext, MulliganDecision, PriorityAction,
    PriorityContext, TargetContext,
};
use super::part::{FlowContext, Part, PartResult};
use super::step::Step;

/// Raises a turn-structure event.
#[derive(Debug)]
pub(crate) struct AnnouncePart {
    event: GameEvent,
}

impl AnnouncePart {
    pub(crate) fn new(event: GameEvent) -> Self {
        Self { event }
    }
}

impl Part for AnnouncePart {
    fn execute(self: Box<Self>, ctx: &mut FlowContext<'_>) -> EngineResult<PartResult> {
        if let GameEvent::TurnBegan { player, turn } = self.event {
            ctx.log(Some(player), &format!("{player} begins turn {turn}"));
        }
        ctx.raise(self.event);
        Ok(PartResult::Done)
    }

    fn name(&self) -> &'static str {
        "Announce"
    }
}

// === Beginning phase ===

/// Untaps every permanent the player controls.
#[derive(Debug)]
pub struct UntapPart {
    player: PlayerId,
}

impl UntapPart {
    pub fn new(player: PlayerId) -> Self {
        Self { player }
    }
}

impl Part for UntapPart {
    fn execute(self: Box<Self>, ctx: &mut FlowContext<'_>) -> EngineResult<PartResult> {
        let tapped = ctx.manager().standard().tapped;
        for id in ctx.controlled_by(self.player)? {
            if ctx.get(id, tapped)? {
                ctx.apply(SetValueCommand::new(id, tapped, false))?;
            }
        }
        Ok(PartResult::Done)
    }

    fn name(&self) -> &'static str {
        "Untap"
    }
}

/// Draws `count` cards from the top of the player's library.
///
/// Drawing from an empty library marks the player with
/// `DrewFromEmptyLibrary` instead.
#[derive(Debug)]
pub struct DrawPart {
    player: PlayerId,
    count: usize,
}

impl DrawPart {
    pub fn new(player: PlayerId, count: usize) -> Self {
        Self { player, count }
    }
}

impl Part for DrawPart {
    fn execute(self: Box<Self>, ctx: &mut FlowContext<'_>) -> EngineResult<PartResult> {
        let library = Zone::library(self.player);
        let hand = Zone::hand(self.player);
        for _ in 0..self.count {
            match ctx.manager().zones().top(library) {
                Some(card) => {
                    ctx.apply(MoveObjectCommand::to_top(card, hand))?;
                    ctx.raise(GameEvent::CardDrawn { player: self.player, card });
                    ctx.log(Some(self.player), &format!("{} draws a card", self.player));
                }
                None => {
                    let flag = ctx.manager().standard().drew_from_empty_library;
                    let object = ctx.player_object(self.player);
                    ctx.apply(SetValueCommand::new(object, flag, true))?;
                    ctx.log(Some(self.player), &format!("{} cannot draw from an empty library", self.player));
                    break;
                }
            }
        }
        Ok(PartResult::Done)
    }

    fn name(&self) -> &'static str {
        "Draw"
    }
}

// === Ending phase ===

/// Discard one card down towards the maximum hand size.
///
/// Asks the player for a card from their hand. An answer that is not
/// exactly one card in that hand is retried. After a valid discard the part
/// continues with a fresh `DiscardPart` while the hand is still too large.
#[derive(Debug)]
pub struct DiscardPart {
    player: PlayerId,
}

impl DiscardPart {
    pub fn new(player: PlayerId) -> Self {
        Self { player }
    }
}

impl Part for DiscardPart {
    fn execute(self: Box<Self>, ctx: &mut FlowContext<'_>) -> EngineResult<PartResult> {
        let max_hand_size = ctx.manager().standard().max_hand_size;
        let max = ctx.get(ctx.player_object(self.player), max_hand_size)?;
        let hand = ctx.hand(self.player);
        let excess = i64::try_from(hand.len()).unwrap_or(i64::MAX) - max;
        if excess <= 0 {
            return Ok(PartResult::Done);
        }

        let chosen = ctx.provider(self.player).target(&TargetContext {
            player: self.player,
            prompt: format!("Discard a card ({excess} over the maximum hand size)"),
            candidates: hand.clone(),
            min: 1,
            max: 1,
        });
        let card = match chosen.as_slice() {
            [card] if hand.contains(card) => *card,
            _ => {
                warn!(player = %self.player, ?chosen, "invalid discard choice, asking again");
                return Ok(PartResult::Retry(self));
            }
        };

        ctx.apply(MoveObjectCommand::to_top(card, Zone::graveyard(self.player)))?;
        ctx.raise(GameEvent::CardDiscarded { player: self.player, card });
        ctx.log(Some(self.player), &format!("{} discards a card", self.player));

        if excess > 1 {
            Ok(PartResult::Continue(Box::new(DiscardPart::new(self.player))))
        } else {
            Ok(PartResult::Done)
        }
    }

    fn name(&self) -> &'static str {
        "Discard"
    }
}

/// Removes damage from permanents and ends the turn.
#[derive(Debug)]
pub struct CleanupPart {
    player: PlayerId,
}

impl CleanupPart {
    pub fn new(player: PlayerId) -> Self {
        Self { player }
    }
}

impl Part for CleanupPart {
    fn execute(self: Box<Self>, ctx: &mut FlowContext<'_>) -> EngineResult<PartResult> {
        let damage = ctx.manager().standard().damage;
        for id in ctx.manager().zone_contents(Zone::BATTLEFIELD) {
            if ctx.manager().object(id)?.local(damage.id()).is_some() {
                ctx.apply(ResetValueCommand::new(id, damage))?;
            }
        }
        let turn = ctx.turn().turn;
        ctx.raise(GameEvent::TurnEnded { player: self.player, turn });
        info!(player = %self.player, turn, "turn ended");
        Ok(PartResult::Done)
    }

    fn name(&self) -> &'static str {
        "Cleanup"
    }
}

// === Priority ===

/// Gives priority to a player.
///
/// Priority passes around the table from the active player; the part is
/// done once every player passed in succession. Playing a land resets the
/// pass count and the player keeps priority. An illegal land play is
/// retried.
#[derive(Debug)]
pub struct PriorityPart {
    player: PlayerId,
    passes: usize,
}

impl PriorityPart {
    pub fn new(player: PlayerId) -> Self {
        Self { player, passes: 0 }
    }

    fn playable_lands(&self, ctx: &FlowContext<'_>) -> EngineResult<Vec<ObjectId>> {
        let step_allows = ctx.step().is_some_and(Step::is_main) && ctx.active_player() == self.player;
        let bypass = Scope::rule_bypass().in_scope();
        if !step_allows && !bypass {
            return Ok(Vec::new());
        }

        let std = ctx.manager().standard();
        let object = ctx.player_object(self.player);
        let played = ctx.get(object, std.lands_played_this_turn)?;
        let allowed = ctx.get(object, std.lands_per_turn)?;
        if played >= allowed && !bypass {
            return Ok(Vec::new());
        }

        let mut lands = Vec::new();
        for card in ctx.hand(self.player) {
            if ctx.get(card, std.is_land)? {
                lands.push(card);
            }
        }
        Ok(lands)
    }
}

impl Part for PriorityPart {
    fn execute(self: Box<Self>, ctx: &mut FlowContext<'_>) -> EngineResult<PartResult> {
        let playable_lands = self.playable_lands(ctx)?;
        let request = PriorityContext { player: self.player, step: ctx.step(), playable_lands };
        match ctx.provider(self.player).give_priority(&request) {
            PriorityAction::Pass => {
                let passes = self.passes + 1;
                if passes >= ctx.player_count() {
                    return Ok(PartResult::Done);
                }
                let next = self.player.next(ctx.player_count());
                Ok(PartResult::Continue(Box::new(PriorityPart { player: next, passes })))
            }
            PriorityAction::PlayLand(card) if request.playable_lands.contains(&card) => {
                let controller = ctx.manager().standard().controller;
                ctx.apply(MoveObjectCommand::to_top(card, Zone::BATTLEFIELD))?;
                ctx.apply(SetValueCommand::new(card, controller, Some(self.player)))?;
                ctx.raise(GameEvent::LandPlayed { player: self.player, card });
                let name = ctx.get(card, ctx.manager().standard().name)?;
                ctx.log(Some(self.player), &format!("{} plays {name}", self.player));
                Ok(PartResult::Continue(Box::new(PriorityPart::new(self.player))))
            }
            PriorityAction::PlayLand(card) => {
                warn!(player = %self.player, %card, "illegal land play, asking again");
                Ok(PartResult::Retry(self))
            }
        }
    }

    fn name(&self) -> &'static str {
        "Priority"
    }
}

// === Combat ===

fn is_untapped_creature(ctx: &FlowContext<'_>, id: ObjectId) -> EngineResult<bool> {
    let std = ctx.manager().standard();
    Ok(ctx.get(id, std.is_creature)? && !ctx.get(id, std.tapped)?)
}

fn has_no_duplicates(ids: &[ObjectId]) -> bool {
    let mut sorted = ids.to_vec();
    sorted.sort_unstable();
    sorted.windows(2).all(|w| w[0] != w[1])
}

/// The active player declares attackers against the next player.
#[derive(Debug)]
pub struct DeclareAttackersPart {
    player: PlayerId,
}

impl DeclareAttackersPart {
    pub fn new(player: PlayerId) -> Self {
        Self { player }
    }
}

impl Part for DeclareAttackersPart {
    fn execute(self: Box<Self>, ctx: &mut FlowContext<'_>) -> EngineResult<PartResult> {
        let mut candidates = Vec::new();
        for id in ctx.controlled_by(self.player)? {
            if is_untapped_creature(ctx, id)? {
                candidates.push(id);
            }
        }
        if candidates.is_empty() {
            return Ok(PartResult::Done);
        }

        let defender = self.player.next(ctx.player_count());
        let request = AttackContext { player: self.player, defender, candidates };
        let attackers = ctx.provider(self.player).declare_attackers(&request);
        let valid = has_no_duplicates(&attackers) && attackers.iter().all(|a| request.candidates.contains(a));
        if !valid {
            warn!(player = %self.player, ?attackers, "invalid attackers, asking again");
            return Ok(PartResult::Retry(self));
        }

        let std = ctx.manager().standard();
        for attacker in &attackers {
            ctx.apply(SetValueCommand::new(*attacker, std.attacking, true))?;
            ctx.apply(SetValueCommand::new(*attacker, std.tapped, true))?;
        }
        if !attackers.is_empty() {
            ctx.log(Some(self.player), &format!("{} attacks with {} creature(s)", self.player, attackers.len()));
        }
        Ok(PartResult::Done)
    }

    fn name(&self) -> &'static str {
        "DeclareAttackers"
    }
}

fn attacking_creatures(ctx: &FlowContext<'_>) -> EngineResult<Vec<ObjectId>> {
    let attacking = ctx.manager().standard().attacking;
    let mut out = Vec::new();
    for id in ctx.manager().zone_contents(Zone::BATTLEFIELD) {
        if ctx.get(id, attacking)? {
            out.push(id);
        }
    }
    Ok(out)
}

/// The defending player assigns blockers.
#[derive(Debug)]
pub struct DeclareBlockersPart {
    attacker: PlayerId,
}

impl DeclareBlockersPart {
    /// `attacker` is the active player; the next player defends.
    pub fn new(attacker: PlayerId) -> Self {
        Self { attacker }
    }
}

impl Part for DeclareBlockersPart {
    fn execute(self: Box<Self>, ctx: &mut FlowContext<'_>) -> EngineResult<PartResult> {
        let attackers = attacking_creatures(ctx)?;
        if attackers.is_empty() {
            return Ok(PartResult::Done);
        }
        let defender = self.attacker.next(ctx.player_count());
        let mut candidates = Vec::new();
        for id in ctx.controlled_by(defender)? {
            if is_untapped_creature(ctx, id)? {
                candidates.push(id);
            }
        }
        if candidates.is_empty() {
            return Ok(PartResult::Done);
        }

        let request = BlockContext { player: defender, attackers, candidates };
        let blocks = ctx.provider(defender).declare_blockers(&request);
        let blockers: Vec<ObjectId> = blocks.iter().map(|b| b.blocker).collect();
        let valid = has_no_duplicates(&blockers)
            && blocks.iter().all(|Block { blocker, attacker }| {
                request.candidates.contains(blocker) && request.attackers.contains(attacker)
            });
        if !valid {
            warn!(player = %defender, ?blocks, "invalid blocks, asking again");
            return Ok(PartResult::Retry(self));
        }

        let blocking = ctx.manager().standard().blocking;
        for block in blocks {
            ctx.apply(SetValueCommand::new(block.blocker, blocking, Some(block.attacker)))?;
        }
        Ok(PartResult::Done)
    }

    fn name(&self) -> &'static str {
        "DeclareBlockers"
    }
}

/// Attackers and blockers deal damage; lethally damaged creatures die.
#[derive(Debug)]
pub struct CombatDamagePart {
    attacker: PlayerId,
}

impl CombatDamagePart {
    pub fn new(attacker: PlayerId) -> Self {
        Self { attacker }
    }
}

impl CombatDamagePart {
    fn deal_damage(ctx: &mut FlowContext<'_>, target: ObjectId, amount: i64) -> EngineResult<()> {
        if amount <= 0 {
            return Ok(());
        }
        let damage = ctx.manager().standard().damage;
        let current = ctx.manager().base_value(target, damage)?;
        ctx.apply(SetValueCommand::new(target, damage, current.saturating_add(amount)))
    }
}

impl Part for CombatDamagePart {
    fn execute(self: Box<Self>, ctx: &mut FlowContext<'_>) -> EngineResult<PartResult> {
        let std = ctx.manager().standard();
        let attackers = attacking_creatures(ctx)?;
        if attackers.is_empty() {
            return Ok(PartResult::Done);
        }
        let defender = self.attacker.next(ctx.player_count());
        let defender_object = ctx.player_object(defender);
        let battlefield = ctx.manager().zone_contents(Zone::BATTLEFIELD);

        for attacker in attackers {
            let power = ctx.get(attacker, std.power)?;
            let mut blockers = Vec::new();
            for id in &battlefield {
                if ctx.get(*id, std.blocking)? == Some(attacker) {
                    blockers.push(*id);
                }
            }

            match blockers.first() {
                None => {
                    let life = ctx.manager().base_value(defender_object, std.life)?;
                    ctx.apply(SetValueCommand::new(defender_object, std.life, life.saturating_sub(power.max(0))))?;
                    ctx.log(Some(defender), &format!("{defender} takes {} damage", power.max(0)));
                }
                Some(first) => {
                    Self::deal_damage(ctx, *first, power)?;
                    for blocker in &blockers {
                        let blocker_power = ctx.get(*blocker, std.power)?;
                        Self::deal_damage(ctx, attacker, blocker_power)?;
                    }
                }
            }
        }

        for id in battlefield {
            let creature = ctx.get(id, std.is_creature)?;
            let toughness = ctx.get(id, std.toughness)?;
            let damage = ctx.get(id, std.damage)?;
            if creature && damage > 0 && damage >= toughness {
                let owner = ctx.get(id, std.owner)?.unwrap_or(self.attacker);
                ctx.apply(MoveObjectCommand::to_top(id, Zone::graveyard(owner)))?;
                ctx.apply(ResetValueCommand::new(id, std.damage))?;
                ctx.log(Some(owner), &format!("{id} dies"));
            }
        }
        Ok(PartResult::Done)
    }

    fn name(&self) -> &'static str {
        "CombatDamage"
    }
}

/// Removes creatures from combat.
#[derive(Debug)]
pub struct EndCombatPart;

impl Part for EndCombatPart {
    fn execute(self: Box<Self>, ctx: &mut FlowContext<'_>) -> EngineResult<PartResult> {
        let std = ctx.manager().standard();
        let mut clear = Vec::new();
        for zone in ctx.manager().zones().zones().collect::<Vec<_>>() {
            for id in ctx.manager().zone_contents(zone) {
                let object = ctx.manager().object(id)?;
                for property in [std.attacking.id(), std.blocking.id()] {
                    if object.local(property).is_some() {
                        clear.push((id, property));
                    }
                }
            }
        }
        for (id, property) in clear {
            ctx.apply(ResetValueCommand::new(id, property))?;
        }
        Ok(PartResult::Done)
    }

    fn name(&self) -> &'static str {
        "EndCombat"
    }
}

// === Game start ===

/// Shuffle, draw an opening hand and offer a mulligan.
///
/// Each mulligan returns the hand to the library and draws one card fewer.
#[derive(Debug)]
pub struct MulliganPart {
    player: PlayerId,
    taken: usize,
}

impl MulliganPart {
    pub fn new(player: PlayerId) -> Self {
        Self { player, taken: 0 }
    }
}

impl Part for MulliganPart {
    fn execute(self: Box<Self>, ctx: &mut FlowContext<'_>) -> EngineResult<PartResult> {
        let library = Zone::library(self.player);
        for card in ctx.hand(self.player) {
            ctx.apply(MoveObjectCommand::new(card, library, ZonePosition::Bottom))?;
        }
        ctx.apply(ShuffleZoneCommand::new(library))?;

        let size = ctx.config().starting_hand_size.saturating_sub(self.taken);
        DrawPart::new(self.player, size).execute_inline(ctx)?;

        let object = ctx.player_object(self.player);
        let taken_property = ctx.manager().standard().mulligans_taken;
        ctx.apply(SetValueCommand::new(object, taken_property, self.taken as i64))?;

        if self.taken >= ctx.config().max_mulligans {
            return Ok(PartResult::Done);
        }
        let request = MulliganContext {
            player: self.player,
            hand: ctx.hand(self.player),
            mulligans_taken: self.taken,
        };
        match ctx.provider(self.player).mulligan(&request) {
            MulliganDecision::Keep => {
                ctx.log(Some(self.player), &format!("{} keeps {} cards", self.player, request.hand.len()));
                Ok(PartResult::Done)
            }
            MulliganDecision::Mulligan => {
                ctx.log(Some(self.player), &format!("{} mulligans", self.player));
                Ok(PartResult::Continue(Box::new(MulliganPart {
                    player: self.player,
                    taken: self.taken + 1,
                })))
            }
        }
    }

    fn name(&self) -> &'static str {
        "Mulligan"
    }
}

impl DrawPart {
    /// Run as part of another part's transaction.
    fn execute_inline(self, ctx: &mut FlowContext<'_>) -> EngineResult<()> {
        Box::new(self).execute(ctx).map(|_| ())
    }
}
