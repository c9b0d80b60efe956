//! Player decisions.
//!
//! Parts ask a `DecisionProvider` whenever a player has to choose. Each
//! prompt takes a context value describing the choice and returns the
//! answer; parts validate answers and retry on invalid ones, so providers
//! never need to be trusted. Every method has a conservative default (pass,
//! keep, choose the minimum) so a provider only overrides what it cares
//! about.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

use crate::core::{ObjectId, PlayerId};

use super::step::Step;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModalChoiceContext {
    pub player: PlayerId,
    pub prompt: String,
    pub options: Vec<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriorityContext {
    pub player: PlayerId,
    pub step: Option<Step>,
    /// Lands in hand the player may legally play right now.
    pub playable_lands: Vec<ObjectId>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum PriorityAction {
    Pass,
    PlayLand(ObjectId),
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PayManaContext {
    pub player: PlayerId,
    pub source: Option<ObjectId>,
    pub amount: i64,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MulliganContext {
    pub player: PlayerId,
    pub hand: Vec<ObjectId>,
    pub mulligans_taken: usize,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum MulliganDecision {
    Keep,
    Mulligan,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TargetContext {
    pub player: PlayerId,
    pub prompt: String,
    pub candidates: Vec<ObjectId>,
    pub min: usize,
    pub max: usize,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttackContext {
    pub player: PlayerId,
    pub defender: PlayerId,
    pub candidates: Vec<ObjectId>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockContext {
    pub player: PlayerId,
    pub attackers: Vec<ObjectId>,
    pub candidates: Vec<ObjectId>,
}

/// A blocker and the attacker it blocks.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Block {
    pub blocker: ObjectId,
    pub attacker: ObjectId,
}

/// Answers player prompts.
pub trait DecisionProvider {
    /// Index into `ctx.options`.
    fn ask_modal_choice(&mut self, _ctx: &ModalChoiceContext) -> usize {
        0
    }

    fn give_priority(&mut self, _ctx: &PriorityContext) -> PriorityAction {
        PriorityAction::Pass
    }

    /// Whether the player pays.
    fn pay_mana(&mut self, _ctx: &PayManaContext) -> bool {
        false
    }

    fn mulligan(&mut self, _ctx: &MulliganContext) -> MulliganDecision {
        MulliganDecision::Keep
    }

    fn target(&mut self, ctx: &TargetContext) -> Vec<ObjectId> {
        ctx.candidates.iter().take(ctx.min).copied().collect()
    }

    fn declare_attackers(&mut self, _ctx: &AttackContext) -> Vec<ObjectId> {
        Vec::new()
    }

    fn declare_blockers(&mut self, _ctx: &BlockContext) -> Vec<Block> {
        Vec::new()
    }
}

/// Takes every default.
#[derive(Clone, Copy, Debug, Default)]
pub struct PassProvider;

impl DecisionProvider for PassProvider {}

/// A queued answer for a `ScriptedProvider`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Answer {
    Choice(usize),
    Priority(PriorityAction),
    Pay(bool),
    Mulligan(MulliganDecision),
    Targets(Vec<ObjectId>),
    Attackers(Vec<ObjectId>),
    Blockers(Vec<Block>),
}

/// Replays queued answers in order, falling back to the defaults when the
/// next answer does not fit the prompt or the queue is empty.
#[derive(Clone, Debug, Default)]
pub struct ScriptedProvider {
    answers: VecDeque<Answer>,
    prompts: usize,
}

impl ScriptedProvider {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn then(mut self, answer: Answer) -> Self {
        self.answers.push_back(answer);
        self
    }

    pub fn push(&mut self, answer: Answer) {
        self.answers.push_back(answer);
    }

    /// Answers not yet consumed.
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.answers.len()
    }

    /// Prompts received so far.
    #[must_use]
    pub fn prompts(&self) -> usize {
        self.prompts
    }

    fn next<T>(&mut self, pick: impl FnOnce(&Answer) -> Option<T>) -> Option<T> {
        self.prompts += 1;
        let value = pick(self.answers.front()?)?;
        self.answers.pop_front();
        Some(value)
    }
}

impl DecisionProvider for ScriptedProvider {
    fn ask_modal_choice(&mut self, _ctx: &ModalChoiceContext) -> usize {
        self.next(|a| match a {
            Answer::Choice(i) => Some(*i),
            _ => None,
        })
        .unwrap_or(0)
    }

    fn give_priority(&mut self, _ctx: &PriorityContext) -> PriorityAction {
        self.next(|a| match a {
            Answer::Priority(action) => Some(*action),
            _ => None,
        })
        .unwrap_or(PriorityAction::Pass)
    }

    fn pay_mana(&mut self, _ctx: &PayManaContext) -> bool {
        self.next(|a| match a {
            Answer::Pay(pay) => Some(*pay),
            _ => None,
        })
        .unwrap_or(false)
    }

    fn mulligan(&mut self, _ctx: &MulliganContext) -> MulliganDecision {
        self.next(|a| match a {
            Answer::Mulligan(decision) => Some(*decision),
            _ => None,
        })
        .unwrap_or(MulliganDecision::Keep)
    }

    fn target(&mut self, ctx: &TargetContext) -> Vec<ObjectId> {
        self.next(|a| match a {
            Answer::Targets(t) => Some(t.clone()),
            _ => None,
        })
        .unwrap_or_else(|| ctx.candidates.iter().take(ctx.min).copied().collect())
    }

    fn declare_attackers(&mut self, _ctx: &AttackContext) -> Vec<ObjectId> {
        self.next(|a| match a {
            Answer::Attackers(t) => Some(t.clone()),
            _ => None,
        })
        .unwrap_or_default()
    }

    fn declare_blockers(&mut self, _ctx: &BlockContext) -> Vec<Block> {
        self.next(|a| match a {
            Answer::Blockers(b) => Some(b.clone()),
            _ => None,
        })
        .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn target_ctx() -> TargetContext {
        TargetContext {
            player: PlayerId::new(0),
            prompt: "discard".into(),
            candidates: vec![ObjectId(4), ObjectId(5)],
            min: 1,
            max: 1,
        }
    }

    #[test]
    fn test_defaults() {
        let mut provider = PassProvider;
        assert_eq!(provider.target(&target_ctx()), vec![ObjectId(4)]);
        let ctx = PriorityContext { player: PlayerId::new(0), step: None, playable_lands: vec![] };
        assert_eq!(provider.give_priority(&ctx), PriorityAction::Pass);
    }

    #[test]
    fn test_scripted_answers_in_order() {
        let mut provider = ScriptedProvider::new()
            .then(Answer::Targets(vec![ObjectId(5)]))
            .then(Answer::Targets(vec![ObjectId(9)]));

        assert_eq!(provider.target(&target_ctx()), vec![ObjectId(5)]);
        assert_eq!(provider.target(&target_ctx()), vec![ObjectId(9)]);
        assert_eq!(provider.target(&target_ctx()), vec![ObjectId(4)]);
        assert_eq!(provider.prompts(), 3);
    }

    #[test]
    fn test_mismatched_answer_is_kept() {
        let mut provider = ScriptedProvider::new().then(Answer::Mulligan(MulliganDecision::Mulligan));
        let ctx = PriorityContext { player: PlayerId::new(0), step: None, playable_lands: vec![] };

        assert_eq!(provider.give_priority(&ctx), PriorityAction::Pass);
        assert_eq!(provider.remaining(), 1);
    }
}
