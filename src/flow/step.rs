//! Turn structure: phases and steps.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::core::{EngineConfig, PlayerId};

use super::part::Part;
use super::parts::{
    CleanupPart, CombatDamagePart, DeclareAttackersPart, DeclareBlockersPart, DiscardPart, DrawPart,
    EndCombatPart, PriorityPart, UntapPart,
};

/// Where the game is within the turn cycle.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TurnState {
    /// Player whose turn it is.
    pub active: PlayerId,
    /// Turn number, starting at 1.
    pub turn: u32,
    /// Step being run, `None` between turns.
    pub step: Option<Step>,
}

impl TurnState {
    #[must_use]
    pub fn first() -> Self {
        Self { active: PlayerId::new(0), turn: 1, step: None }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Phase {
    Beginning,
    PrecombatMain,
    Combat,
    PostcombatMain,
    Ending,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Step {
    Untap,
    Upkeep,
    Draw,
    Main1,
    BeginCombat,
    DeclareAttackers,
    DeclareBlockers,
    CombatDamage,
    EndCombat,
    Main2,
    End,
    Cleanup,
}

impl Step {
    /// Every step in turn order.
    pub const ALL: [Step; 12] = [
        Step::Untap,
        Step::Upkeep,
        Step::Draw,
        Step::Main1,
        Step::BeginCombat,
        Step::DeclareAttackers,
        Step::DeclareBlockers,
        Step::CombatDamage,
        Step::EndCombat,
        Step::Main2,
        Step::End,
        Step::Cleanup,
    ];

    /// The following step, `None` after cleanup.
    #[must_use]
    pub fn next(self) -> Option<Step> {
        let index = Self::ALL.iter().position(|s| *s == self)?;
        Self::ALL.get(index + 1).copied()
    }

    #[must_use]
    pub fn phase(self) -> Phase {
        match self {
            Step::Untap | Step::Upkeep | Step::Draw => Phase::Beginning,
            Step::Main1 => Phase::PrecombatMain,
            Step::BeginCombat
            | Step::DeclareAttackers
            | Step::DeclareBlockers
            | Step::CombatDamage
            | Step::EndCombat => Phase::Combat,
            Step::Main2 => Phase::PostcombatMain,
            Step::End | Step::Cleanup => Phase::Ending,
        }
    }

    /// Whether players receive priority during this step.
    ///
    /// Nobody gets priority during untap; cleanup only grants it when
    /// something triggers, which this engine does not model.
    #[must_use]
    pub fn grants_priority(self) -> bool {
        !matches!(self, Step::Untap | Step::Cleanup)
    }

    /// Whether lands may be played during this step.
    #[must_use]
    pub fn is_main(self) -> bool {
        matches!(self, Step::Main1 | Step::Main2)
    }

    /// Parts this step schedules for the active player: turn-based actions
    /// first, then priority if the step grants it.
    #[must_use]
    pub fn sequence(self, turn: &TurnState, config: &EngineConfig) -> Vec<Box<dyn Part>> {
        let player = turn.active;
        let mut parts: Vec<Box<dyn Part>> = Vec::new();
        match self {
            Step::Untap => parts.push(Box::new(UntapPart::new(player))),
            Step::Draw => {
                let skip = config.skip_first_draw && turn.turn == 1;
                if !skip {
                    parts.push(Box::new(DrawPart::new(player, 1)));
                }
            }
            Step::DeclareAttackers => parts.push(Box::new(DeclareAttackersPart::new(player))),
            Step::DeclareBlockers => parts.push(Box::new(DeclareBlockersPart::new(player))),
            Step::CombatDamage => parts.push(Box::new(CombatDamagePart::new(player))),
            Step::EndCombat => parts.push(Box::new(EndCombatPart)),
            Step::Cleanup => {
                parts.push(Box::new(DiscardPart::new(player)));
                parts.push(Box::new(CleanupPart::new(player)));
            }
            Step::Upkeep | Step::Main1 | Step::BeginCombat | Step::Main2 | Step::End => {}
        }
        if self.grants_priority() {
            parts.push(Box::new(PriorityPart::new(player)));
        }
        parts
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{self:?}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_next_walks_the_turn() {
        let mut step = Step::Untap;
        let mut count = 1;
        while let Some(next) = step.next() {
            step = next;
            count += 1;
        }
        assert_eq!(step, Step::Cleanup);
        assert_eq!(count, Step::ALL.len());
    }

    #[test]
    fn test_phases() {
        assert_eq!(Step::Draw.phase(), Phase::Beginning);
        assert_eq!(Step::DeclareBlockers.phase(), Phase::Combat);
        assert_eq!(Step::Cleanup.phase(), Phase::Ending);
    }

    #[test]
    fn test_untap_never_schedules_priority() {
        let config = EngineConfig::default();
        for player in PlayerId::all(4) {
            for turn in 1..4 {
                let state = TurnState { active: player, turn, step: Some(Step::Untap) };
                let names: Vec<_> = Step::Untap.sequence(&state, &config).iter().map(|p| p.name()).collect();
                assert_eq!(names, vec!["Untap"]);
            }
        }
    }

    #[test]
    fn test_first_draw_skipped() {
        let config = EngineConfig::default();
        let first = TurnState::first();
        let names: Vec<_> = Step::Draw.sequence(&first, &config).iter().map(|p| p.name()).collect();
        assert_eq!(names, vec!["Priority"]);

        let second = TurnState { turn: 2, ..first };
        let names: Vec<_> = Step::Draw.sequence(&second, &config).iter().map(|p| p.name()).collect();
        assert_eq!(names, vec!["Draw", "Priority"]);
    }

    #[test]
    fn test_cleanup_discards_before_cleanup() {
        let config = EngineConfig::default();
        let names: Vec<_> = Step::Cleanup
            .sequence(&TurnState::first(), &config)
            .iter()
            .map(|p| p.name())
            .collect();
        assert_eq!(names, vec!["Discard", "Cleanup"]);
    }
}
