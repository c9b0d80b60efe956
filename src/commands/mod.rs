//! Commands and the transaction log.
//!
//! Every change to an `ObjectManager` is a `Command`: an execute/unexecute
//! pair that restores the manager exactly. Commands are executed through an
//! `ObjectController` (normally a `TransactionLog`), which groups them into
//! transactions for atomic cancel and undo/redo.
//!
//! ## Key Components
//!
//! - [`Command`]: the undoable operation trait
//! - [`MultiCommand`]: ordered composite, undone in reverse order
//! - [`TransactionLog`]: transaction nesting plus undo/redo stacks
//! - Built-ins for values, objects, zones and effects

mod builtin;
mod command;
mod transaction;

pub use builtin::{
    AttachEffectCommand, CreateObjectCommand, DestroyObjectCommand, DetachEffectCommand,
    MoveObjectCommand, ResetValueCommand, SetValueCommand, ShuffleZoneCommand,
};
pub use command::{Command, MultiCommand};
pub use transaction::{ObjectController, TransactionLog, TransactionToken};
