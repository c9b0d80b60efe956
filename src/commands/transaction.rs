//! Transactions and the undo/redo log.
//!
//! A transaction groups every command executed between `begin_transaction`
//! and `end_transaction` into one `MultiCommand`. Committing the outermost
//! transaction pushes that composite onto the undo stack (unless it is
//! empty); cancelling unexecutes it. Transactions nest: a committed inner
//! transaction becomes a child of the enclosing one, a cancelled inner
//! transaction rolls back only its own commands.
//!
//! ```
//! use ccg_rules::commands::{ObjectController, SetValueCommand, TransactionLog};
//! use ccg_rules::core::EngineConfig;
//! use ccg_rules::objects::ObjectManager;
//! use ccg_rules::properties::{ObjectKind, PropertyRegistry};
//!
//! let manager = ObjectManager::new(PropertyRegistry::shared(), &EngineConfig::default());
//! let mut log = TransactionLog::new(manager);
//! let std = log.manager().standard();
//! let card = log.create_object(ObjectKind::CARD).unwrap();
//!
//! let token = log.begin_transaction();
//! log.execute(Box::new(SetValueCommand::new(card, std.power, 3))).unwrap();
//! log.end_transaction(false, token).unwrap();
//! assert_eq!(log.manager().get_value(card, std.power).unwrap(), 0);
//! ```

use tracing::debug;

use crate::core::{EngineError, EngineResult, ObjectId};
use crate::objects::{GameEvent, ObjectManager};
use crate::properties::{ObjectKind, Property, PropertyType};

use super::builtin::{CreateObjectCommand, SetValueCommand};
use super::command::{Command, MultiCommand};

/// Proof that a transaction was opened; consumed by `end_transaction`.
#[derive(Debug, PartialEq, Eq)]
#[must_use = "a transaction must be ended with its token"]
pub struct TransactionToken {
    depth: usize,
    serial: u64,
}

impl TransactionToken {
    /// Nesting depth of the transaction this token opened (1 = outermost).
    #[must_use]
    pub fn depth(&self) -> usize {
        self.depth
    }
}

/// The interface rule code uses to change game state.
pub trait ObjectController {
    /// Read access to the state being controlled.
    fn manager(&self) -> &ObjectManager;

    fn begin_transaction(&mut self) -> TransactionToken;

    /// Commit (`true`) or cancel (`false`) the innermost transaction.
    ///
    /// `token` must be the one returned by the matching `begin_transaction`.
    fn end_transaction(&mut self, commit: bool, token: TransactionToken) -> EngineResult<()>;

    /// Execute a command inside the current transaction, or inside a
    /// transaction of its own when none is open.
    fn execute(&mut self, command: Box<dyn Command>) -> EngineResult<()>;

    fn in_transaction(&self) -> bool;

    /// Queue a rule event (turn structure, draws) for dispatch with the
    /// change events of the current transaction.
    fn raise(&mut self, event: GameEvent);
}

impl dyn ObjectController + '_ {
    /// Box and execute a command.
    pub fn apply(&mut self, command: impl Command + 'static) -> EngineResult<()> {
        self.execute(Box::new(command))
    }

    /// Store a typed value.
    pub fn set_value<T: PropertyType>(&mut self, object: ObjectId, property: Property<T>, value: T) -> EngineResult<()> {
        self.apply(SetValueCommand::new(object, property, value))
    }

    /// Execute a creation and return the new object's id.
    pub fn create(&mut self, command: CreateObjectCommand) -> EngineResult<ObjectId> {
        let id = self.manager().next_object_id();
        self.apply(command)?;
        Ok(id)
    }
}

#[derive(Debug)]
struct Frame {
    command: MultiCommand,
    event_mark: usize,
    serial: u64,
}

/// Owns a manager and records every change made to it.
#[derive(Debug)]
pub struct TransactionLog {
    manager: ObjectManager,
    open: Vec<Frame>,
    undo: Vec<MultiCommand>,
    redo: Vec<MultiCommand>,
    next_serial: u64,
}

impl TransactionLog {
    #[must_use]
    pub fn new(manager: ObjectManager) -> Self {
        Self {
            manager,
            open: Vec::new(),
            undo: Vec::new(),
            redo: Vec::new(),
            next_serial: 0,
        }
    }

    /// Mutable access for event draining. State changes still go through
    /// commands.
    pub(crate) fn manager_mut(&mut self) -> &mut ObjectManager {
        &mut self.manager
    }

    /// Number of open transactions.
    #[must_use]
    pub fn depth(&self) -> usize {
        self.open.len()
    }

    #[must_use]
    pub fn can_undo(&self) -> bool {
        !self.undo.is_empty()
    }

    #[must_use]
    pub fn can_redo(&self) -> bool {
        !self.redo.is_empty()
    }

    /// Descriptions of undoable transactions, oldest first.
    pub fn history(&self) -> impl Iterator<Item = String> + '_ {
        self.undo.iter().map(Command::describe)
    }

    /// Create an object outside any explicit transaction.
    pub fn create_object(&mut self, kind: ObjectKind) -> EngineResult<ObjectId> {
        let id = self.manager.next_object_id();
        self.execute(Box::new(CreateObjectCommand::new(kind)))?;
        Ok(id)
    }

    /// Undo the most recent committed transaction.
    pub fn undo(&mut self) -> EngineResult<()> {
        if !self.open.is_empty() {
            return Err(EngineError::TransactionOpen);
        }
        let mut command = self.undo.pop().ok_or(EngineError::NothingToUndo)?;
        debug!(command = %command.describe(), "undo");
        if let Err(err) = command.unexecute(&mut self.manager) {
            self.undo.push(command);
            return Err(err);
        }
        self.redo.push(command);
        Ok(())
    }

    /// Re-apply the most recently undone transaction.
    pub fn redo(&mut self) -> EngineResult<()> {
        if !self.open.is_empty() {
            return Err(EngineError::TransactionOpen);
        }
        let mut command = self.redo.pop().ok_or(EngineError::NothingToRedo)?;
        debug!(command = %command.describe(), "redo");
        if let Err(err) = command.execute(&mut self.manager) {
            self.redo.push(command);
            return Err(err);
        }
        self.undo.push(command);
        Ok(())
    }

    /// Drop all undo and redo history.
    pub fn clear_history(&mut self) {
        self.undo.clear();
        self.redo.clear();
    }
}

impl ObjectController for TransactionLog {
    fn manager(&self) -> &ObjectManager {
        &self.manager
    }

    fn begin_transaction(&mut self) -> TransactionToken {
        let serial = self.next_serial;
        self.next_serial += 1;
        self.open.push(Frame {
            command: MultiCommand::new(),
            event_mark: self.manager.event_mark(),
            serial,
        });
        TransactionToken { depth: self.open.len(), serial }
    }

    fn end_transaction(&mut self, commit: bool, token: TransactionToken) -> EngineResult<()> {
        match self.open.last() {
            Some(frame) if frame.serial == token.serial && self.open.len() == token.depth => {}
            _ => return Err(EngineError::NoTransaction),
        }
        let Some(mut frame) = self.open.pop() else {
            return Err(EngineError::NoTransaction);
        };

        if !commit {
            debug!(depth = token.depth, commands = frame.command.len(), "transaction cancelled");
            frame.command.unexecute(&mut self.manager)?;
            self.manager.truncate_events(frame.event_mark);
            return Ok(());
        }

        if let Some(outer) = self.open.last_mut() {
            if frame.command.has_children() {
                outer.command.push_executed(Box::new(frame.command));
            }
        } else if !frame.command.is_empty() {
            debug!(commands = frame.command.len(), "transaction committed");
            self.undo.push(frame.command);
            self.redo.clear();
        }
        Ok(())
    }

    fn execute(&mut self, mut command: Box<dyn Command>) -> EngineResult<()> {
        if self.open.is_empty() {
            let token = self.begin_transaction();
            return match self.execute(command) {
                Ok(()) => self.end_transaction(true, token),
                Err(err) => {
                    self.end_transaction(false, token)?;
                    Err(err)
                }
            };
        }

        let mark = self.manager.event_mark();
        if let Err(err) = command.execute(&mut self.manager) {
            self.manager.truncate_events(mark);
            return Err(err);
        }
        debug!(command = %command.describe(), "executed");
        match self.open.last_mut() {
            Some(frame) => frame.command.push_executed(command),
            None => return Err(EngineError::NoTransaction),
        }
        Ok(())
    }

    fn in_transaction(&self) -> bool {
        !self.open.is_empty()
    }

    fn raise(&mut self, event: GameEvent) {
        self.manager.emit(event);
    }
}
