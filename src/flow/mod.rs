//! Turn flow engine.
//!
//! A turn is a fixed sequence of steps. Each step schedules parts (untap,
//! draw, discard, priority...) on the sequencer's work queue. Parts that
//! need a player's decision ask the player's `DecisionProvider` and validate
//! the answer; an invalid answer makes the part return `Retry`, which
//! discards the part's changes and asks again.
//!
//! ## Key Components
//!
//! - [`Step`] / [`Phase`]: turn structure
//! - [`Part`] / [`PartResult`]: units of rule execution
//! - [`Sequencer`]: runs parts, one transaction each
//! - [`DecisionProvider`]: player prompts, with [`ScriptedProvider`] for tests

mod decision;
mod part;
mod parts;
mod sequencer;
mod step;

pub use decision::{
    Answer, AttackContext, Block, BlockContext, DecisionProvider, ModalChoiceContext, MulliganContext,
    MulliganDecision, PassProvider, PayManaContext, PriorityAction, PriorityContext, ScriptedProvider,
    TargetContext,
};
pub use part::{FlowContext, Part, PartResult};
pub use parts::{
    CleanupPart, CombatDamagePart, DeclareAttackersPart, DeclareBlockersPart, DiscardPart, DrawPart,
    EndCombatPart, MulliganPart, PriorityPart, UntapPart,
};
pub use sequencer::Sequencer;
pub use step::{Phase, Step, TurnState};
