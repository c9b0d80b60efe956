//! Scopes: lifetime-bound activity markers and event handlers.
//!
//! - [`Scope`]: re-entrant, reference-counted "currently active" marker
//!   (the rule-bypass scope is one)
//! - [`GameObjectScope`]: a handler whose registration on the [`EventBus`]
//!   is bracketed by `init` and `uninit`
//! - Built-ins: [`UntilEndOfTurn`] and [`LandsPlayedCounter`]
//!
//! ## Delivery guarantees
//!
//! A scope is marked active before `on_init` runs and ended before
//! `on_uninit` runs, so a handler only ever sees events raised while its
//! scope is active. The lifecycle is recorded in the transaction log: undo,
//! redo and cancelled transactions restore it along with the effects the
//! scope attached or detached.

mod builtin;
mod bus;
mod marker;

pub use builtin::{LandsPlayedCounter, UntilEndOfTurn};
pub use bus::{EventBus, GameObjectScope, ScopeContext, ScopeControl, ScopeId, ScopeState};
pub use marker::{Scope, ScopeGuard};
