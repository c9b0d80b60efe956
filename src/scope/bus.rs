//! Event bus and game-object scopes.
//!
//! A `GameObjectScope` is a handler whose lifetime is bracketed by `init`
//! and `uninit` on an `EventBus`. The bus keeps the handlers; the lifecycle
//! itself (`Active`, then `Ended`) is stored in the object manager and only
//! changes through `ScopeStateCommand`. Each transition runs in a nested
//! transaction together with the scope's `on_init` or `on_uninit`, so undo,
//! redo and a cancelled transaction move the lifecycle and the scope's
//! changes back together.
//!
//! Events are only delivered to scopes that are active at the moment of
//! delivery, so nothing reaches a handler after its scope ended, even later
//! in the same dispatch.

use std::fmt;

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::commands::{Command, ObjectController};
use crate::core::{EngineError, EngineResult, LogSink, PlayerId};
use crate::objects::{EventKind, GameEvent, ObjectManager};

/// Identifier of a scope registered on a bus.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ScopeId(pub u32);

impl fmt::Display for ScopeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Scope({})", self.0)
    }
}

/// What a handler wants after seeing an event.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ScopeControl {
    Continue,
    /// End the scope; it is uninitialised right after the handler returns.
    End,
}

/// Lifecycle of a registered scope.
///
/// A scope whose initialisation was undone has no state at all.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ScopeState {
    Active,
    Ended,
}

impl fmt::Display for ScopeState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Active => f.write_str("active"),
            Self::Ended => f.write_str("ended"),
        }
    }
}

/// Move a scope to a new lifecycle state.
#[derive(Debug)]
pub(crate) struct ScopeStateCommand {
    scope: ScopeId,
    state: ScopeState,
    previous: Option<Option<ScopeState>>,
}

impl ScopeStateCommand {
    pub(crate) fn new(scope: ScopeId, state: ScopeState) -> Self {
        Self { scope, state, previous: None }
    }
}

impl Command for ScopeStateCommand {
    fn execute(&mut self, manager: &mut ObjectManager) -> EngineResult<()> {
        if self.previous.is_some() {
            return Err(EngineError::command_state(self.describe(), "already executed"));
        }
        self.previous = Some(manager.replace_scope_state(self.scope, Some(self.state)));
        Ok(())
    }

    fn unexecute(&mut self, manager: &mut ObjectManager) -> EngineResult<()> {
        let previous = self
            .previous
            .ok_or_else(|| EngineError::command_state(self.describe(), "not executed"))?;
        manager.replace_scope_state(self.scope, previous);
        self.previous = None;
        Ok(())
    }

    fn describe(&self) -> String {
        format!("{} {}", self.scope, self.state)
    }
}

/// Everything a scope handler may touch.
pub struct ScopeContext<'a> {
    controller: &'a mut dyn ObjectController,
    sink: &'a dyn LogSink,
    spawned: Vec<Box<dyn GameObjectScope>>,
}

impl<'a> ScopeContext<'a> {
    pub fn new(controller: &'a mut dyn ObjectController, sink: &'a dyn LogSink) -> Self {
        Self { controller, sink, spawned: Vec::new() }
    }

    #[must_use]
    pub fn manager(&self) -> &ObjectManager {
        self.controller.manager()
    }

    pub fn controller(&mut self) -> &mut dyn ObjectController {
        &mut *self.controller
    }

    /// Execute a command through the controller.
    pub fn apply(&mut self, command: impl Command + 'static) -> EngineResult<()> {
        self.controller.execute(Box::new(command))
    }

    pub fn log(&self, source: Option<PlayerId>, message: &str) {
        self.sink.log(source, message);
    }

    /// Ask for a new scope to be initialised once the current dispatch ends.
    pub fn spawn(&mut self, scope: impl GameObjectScope + 'static) {
        self.spawned.push(Box::new(scope));
    }

    /// Scopes requested through `spawn`.
    pub fn take_spawned(&mut self) -> Vec<Box<dyn GameObjectScope>> {
        std::mem::take(&mut self.spawned)
    }

    /// Run `work` in a nested transaction: committed on success, cancelled
    /// on error.
    fn atomically(&mut self, work: impl FnOnce(&mut Self) -> EngineResult<()>) -> EngineResult<()> {
        let token = self.controller.begin_transaction();
        match work(self) {
            Ok(()) => self.controller.end_transaction(true, token),
            Err(err) => {
                self.controller.end_transaction(false, token)?;
                Err(err)
            }
        }
    }
}

/// A lifetime-bound event handler.
///
/// A scope may see `on_uninit` more than once: undoing the end of a scope
/// makes it active again, and it is uninitialised anew when it next ends.
pub trait GameObjectScope: fmt::Debug {
    /// Event kinds delivered to `on_event`.
    fn handled_events(&self) -> &[EventKind];

    fn on_init(&mut self, _ctx: &mut ScopeContext<'_>) -> EngineResult<()> {
        Ok(())
    }

    fn on_event(&mut self, event: &GameEvent, ctx: &mut ScopeContext<'_>) -> EngineResult<ScopeControl>;

    fn on_uninit(&mut self, _ctx: &mut ScopeContext<'_>) -> EngineResult<()> {
        Ok(())
    }
}

#[derive(Debug)]
struct Entry {
    /// Taken out while one of the scope's callbacks runs.
    scope: Option<Box<dyn GameObjectScope>>,
}

/// Routes events to active scopes by event kind.
#[derive(Debug, Default)]
pub struct EventBus {
    entries: FxHashMap<ScopeId, Entry>,
    by_kind: FxHashMap<EventKind, Vec<ScopeId>>,
    next_id: u32,
}

impl EventBus {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a scope's handlers, mark it active and run its `on_init`.
    ///
    /// If `on_init` fails the scope is unregistered again, everything it
    /// changed is rolled back and the error is returned.
    pub fn init(&mut self, scope: Box<dyn GameObjectScope>, ctx: &mut ScopeContext<'_>) -> EngineResult<ScopeId> {
        let id = ScopeId(self.next_id);
        self.next_id += 1;

        let mut kinds = scope.handled_events().to_vec();
        kinds.sort();
        kinds.dedup();
        for kind in &kinds {
            self.by_kind.entry(*kind).or_default().push(id);
        }

        let mut scope = scope;
        let result = ctx.atomically(|ctx| {
            ctx.apply(ScopeStateCommand::new(id, ScopeState::Active))?;
            scope.on_init(ctx)
        });
        if let Err(err) = result {
            self.unregister(id, &kinds);
            return Err(err);
        }
        debug!(scope = %id, ?scope, "scope initialised");
        self.entries.insert(id, Entry { scope: Some(scope) });
        Ok(id)
    }

    /// Mark a scope ended and run its `on_uninit`.
    ///
    /// Both happen in one nested transaction; if `on_uninit` fails the scope
    /// stays active.
    pub fn uninit(&mut self, id: ScopeId, ctx: &mut ScopeContext<'_>) -> EngineResult<()> {
        match ctx.manager().scope_state(id) {
            Some(ScopeState::Active) => {}
            Some(ScopeState::Ended) => {
                return Err(EngineError::ScopeState { scope: id.0, state: "already ended" });
            }
            None => return Err(EngineError::ScopeState { scope: id.0, state: "not active" }),
        }
        let entry = self.entries.get_mut(&id).ok_or(EngineError::ScopeState {
            scope: id.0,
            state: "unknown",
        })?;
        let mut scope = entry.scope.take();

        let result = ctx.atomically(|ctx| {
            ctx.apply(ScopeStateCommand::new(id, ScopeState::Ended))?;
            match scope.as_mut() {
                Some(scope) => scope.on_uninit(ctx),
                None => Ok(()),
            }
        });
        if let Some(entry) = self.entries.get_mut(&id) {
            entry.scope = scope;
        }
        if result.is_ok() {
            debug!(scope = %id, "scope ended");
        }
        result
    }

    /// Deliver an event to every active scope handling its kind.
    ///
    /// Scopes whose handler returns `ScopeControl::End` are uninitialised
    /// before the next scope sees the event.
    pub fn dispatch(&mut self, event: &GameEvent, ctx: &mut ScopeContext<'_>) -> EngineResult<()> {
        let Some(ids) = self.by_kind.get(&event.kind()).cloned() else {
            return Ok(());
        };
        for id in ids {
            if ctx.manager().scope_state(id) != Some(ScopeState::Active) {
                continue;
            }
            let Some(scope) = self.entries.get_mut(&id).and_then(|e| e.scope.as_mut()) else {
                continue;
            };
            trace!(scope = %id, ?event, "deliver");
            if scope.on_event(event, ctx)? == ScopeControl::End {
                self.uninit(id, ctx)?;
            }
        }
        Ok(())
    }

    /// Scopes registered for an event kind that are active in `manager`.
    #[must_use]
    pub fn listeners(&self, kind: EventKind, manager: &ObjectManager) -> usize {
        self.by_kind.get(&kind).map_or(0, |ids| {
            ids.iter()
                .filter(|id| manager.scope_state(**id) == Some(ScopeState::Active))
                .count()
        })
    }

    fn unregister(&mut self, id: ScopeId, kinds: &[EventKind]) {
        for kind in kinds {
            if let Some(list) = self.by_kind.get_mut(kind) {
                list.retain(|s| *s != id);
                if list.is_empty() {
                    self.by_kind.remove(kind);
                }
            }
        }
        self.entries.remove(&id);
    }
}
