//! Engine errors.
//!
//! Errors fall in three groups:
//! - configuration errors raised while setting up properties, effects and
//!   collaborators;
//! - protocol/state errors, which indicate a structural bug in the caller
//!   (an id from another game, ending a transaction that is not open);
//! - cyclic effect evaluation, raised while computing effective values.
//!
//! Invalid player input is not an error: the flow engine retries the part.

use thiserror::Error;

use super::entity::{ManagerId, ObjectId};

/// Result alias used throughout the engine.
pub type EngineResult<T> = Result<T, EngineError>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EngineError {
    // === Configuration ===
    #[error("property `{owner}.{name}` is already registered")]
    DuplicateProperty { owner: String, name: String },

    #[error("unknown property id {0}")]
    UnknownProperty(u32),

    #[error("property `{property}` is not modifiable; effects cannot target it")]
    NotModifiable { property: String },

    #[error("property `{property}` is not declared by objects of kind `{kind}`")]
    NotDeclared { property: String, kind: String },

    #[error("property `{property}` holds {expected} values, got {found}")]
    TypeMismatch {
        property: String,
        expected: &'static str,
        found: &'static str,
    },

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    // === Protocol / state ===
    #[error("{0} does not exist")]
    UnknownObject(ObjectId),

    #[error("{0} already exists")]
    ObjectExists(ObjectId),

    #[error("object reference belongs to {found}, expected {expected}")]
    ForeignObject { expected: ManagerId, found: ManagerId },

    #[error("no transaction is open")]
    NoTransaction,

    #[error("a transaction is still open")]
    TransactionOpen,

    #[error("nothing to undo")]
    NothingToUndo,

    #[error("nothing to redo")]
    NothingToRedo,

    #[error("effect {0} is not attached")]
    UnknownEffect(u64),

    #[error("zone `{0}` does not exist")]
    UnknownZone(String),

    #[error("scope {scope} is {state}")]
    ScopeState { scope: u32, state: &'static str },

    #[error("command `{command}`: {reason}")]
    CommandState { command: String, reason: &'static str },

    #[error("part `{part}` retried {attempts} times without a valid answer")]
    RetryLimit { part: &'static str, attempts: u32 },

    // === Effects ===
    #[error("cyclic effect evaluation: {}", .chain.join(" -> "))]
    CyclicEffect { chain: Vec<String> },

    #[error("serialization failed: {0}")]
    Serialization(String),
}

impl EngineError {
    /// Shorthand for a command used out of order.
    pub fn command_state(command: impl Into<String>, reason: &'static str) -> Self {
        Self::CommandState {
            command: command.into(),
            reason,
        }
    }

    /// True for errors caused by configuration rather than game state.
    #[must_use]
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            Self::DuplicateProperty { .. }
                | Self::UnknownProperty(_)
                | Self::NotModifiable { .. }
                | Self::NotDeclared { .. }
                | Self::TypeMismatch { .. }
                | Self::InvalidConfig(_)
                | Self::CyclicEffect { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cyclic_message_names_chain() {
        let err = EngineError::CyclicEffect {
            chain: vec!["Object(1).Power".into(), "Object(2).Power".into(), "Object(1).Power".into()],
        };
        assert_eq!(
            err.to_string(),
            "cyclic effect evaluation: Object(1).Power -> Object(2).Power -> Object(1).Power"
        );
        assert!(err.is_configuration());
    }

    #[test]
    fn test_protocol_errors_are_not_configuration() {
        assert!(!EngineError::NoTransaction.is_configuration());
        assert!(!EngineError::UnknownObject(ObjectId(3)).is_configuration());
    }
}
