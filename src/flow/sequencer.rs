//! The sequencer: runs parts from a work queue.
//!
//! Each part runs inside its own transaction. When a part finishes or
//! continues, the events it queued are dispatched to scopes and observers
//! while its transaction is still open (so scope reactions undo together
//! with the part) and the transaction is committed. A retried part's
//! transaction is cancelled.

use std::collections::VecDeque;

use tracing::{debug, info, warn};

use crate::commands::ObjectController;
use crate::core::{EngineError, EngineResult};
use crate::game::GameCore;
use crate::objects::GameEvent;

use super::part::{Part, PartResult};
use super::parts::AnnouncePart;
use super::step::{Step, TurnState};

/// Work queue of parts plus the turn position.
#[derive(Debug)]
pub struct Sequencer {
    queue: VecDeque<Box<dyn Part>>,
    turn: TurnState,
    parts_run: u64,
}

impl Default for Sequencer {
    fn default() -> Self {
        Self::new()
    }
}

impl Sequencer {
    #[must_use]
    pub fn new() -> Self {
        Self { queue: VecDeque::new(), turn: TurnState::first(), parts_run: 0 }
    }

    #[must_use]
    pub fn turn(&self) -> TurnState {
        self.turn
    }

    /// Parts executed so far, retries included.
    #[must_use]
    pub fn parts_run(&self) -> u64 {
        self.parts_run
    }

    #[must_use]
    pub fn pending(&self) -> usize {
        self.queue.len()
    }

    /// Add a part to the back of the queue.
    pub fn schedule(&mut self, part: Box<dyn Part>) {
        self.queue.push_back(part);
    }

    /// Run one part in its own transaction.
    pub(crate) fn run_part(&mut self, core: &mut GameCore, part: Box<dyn Part>) -> EngineResult<PartResult> {
        let name = part.name();
        self.parts_run += 1;
        let token = core.log.begin_transaction();

        let result = {
            let mut ctx = core.flow_context(self.turn);
            part.execute(&mut ctx)
        };

        match result {
            Err(err) => {
                core.log.end_transaction(false, token)?;
                Err(err)
            }
            Ok(result @ PartResult::Retry(_)) => {
                debug!(part = name, "retry");
                core.log.end_transaction(false, token)?;
                Ok(result)
            }
            Ok(result) => {
                if let Err(err) = core.dispatch_pending() {
                    core.log.end_transaction(false, token)?;
                    return Err(err);
                }
                core.log.end_transaction(true, token)?;
                Ok(result)
            }
        }
    }

    /// Run queued parts until the queue is empty. Follow-up and retried
    /// parts run before anything already queued.
    ///
    /// A part retried more than `EngineConfig::max_part_retries` times in a
    /// row fails with `RetryLimit`.
    pub(crate) fn run_queue(&mut self, core: &mut GameCore) -> EngineResult<()> {
        let mut retries = 0u32;
        while let Some(part) = self.queue.pop_front() {
            match self.run_part(core, part)? {
                PartResult::Done => retries = 0,
                PartResult::Continue(next) => {
                    retries = 0;
                    self.queue.push_front(next);
                }
                PartResult::Retry(again) => {
                    retries += 1;
                    let part = again.name();
                    warn!(part, attempt = retries, "part retried");
                    if core.config.max_part_retries.is_some_and(|limit| retries > limit) {
                        return Err(EngineError::RetryLimit { part, attempts: retries });
                    }
                    self.queue.push_front(again);
                }
            }
        }
        Ok(())
    }

    /// Run one step of the current turn.
    pub(crate) fn run_step(&mut self, core: &mut GameCore, step: Step) -> EngineResult<()> {
        self.turn.step = Some(step);
        let player = self.turn.active;
        info!(%player, turn = self.turn.turn, %step, "step began");

        self.schedule(Box::new(AnnouncePart::new(GameEvent::StepBegan { player, step })));
        for part in step.sequence(&self.turn, &core.config) {
            self.schedule(part);
        }
        self.schedule(Box::new(AnnouncePart::new(GameEvent::StepEnded { player, step })));
        self.run_queue(core)
    }

    /// Run a whole turn, then pass the turn to the next player.
    pub(crate) fn run_turn(&mut self, core: &mut GameCore) -> EngineResult<()> {
        let player = self.turn.active;
        info!(%player, turn = self.turn.turn, "turn began");
        self.schedule(Box::new(AnnouncePart::new(GameEvent::TurnBegan { player, turn: self.turn.turn })));
        self.run_queue(core)?;

        for step in Step::ALL {
            self.run_step(core, step)?;
        }
        self.end_turn(core.config.player_count);
        Ok(())
    }

    /// Advance to the next player's turn.
    pub(crate) fn end_turn(&mut self, player_count: usize) {
        self.turn = TurnState {
            active: self.turn.active.next(player_count),
            turn: self.turn.turn + 1,
            step: None,
        };
    }
}
