//! Re-entrant activity markers.

use std::sync::atomic::{AtomicUsize, Ordering};

/// A "currently active" marker.
///
/// `in_scope` is true while at least one guard returned by `begin` is alive.
/// Guards nest freely. The counter is atomic so a scope can live in a
/// `static` and be shared between games.
///
/// ```
/// use ccg_rules::scope::Scope;
///
/// let scope = Scope::new();
/// assert!(!scope.in_scope());
/// {
///     let _outer = scope.begin();
///     let _inner = scope.begin();
///     assert!(scope.in_scope());
/// }
/// assert!(!scope.in_scope());
/// ```
#[derive(Debug, Default)]
pub struct Scope {
    active: AtomicUsize,
}

static RULE_BYPASS: Scope = Scope::new();

impl Scope {
    #[must_use]
    pub const fn new() -> Self {
        Self { active: AtomicUsize::new(0) }
    }

    /// The process-wide scope under which rule legality checks (land drops
    /// per turn, hand size) are skipped. Used to set up test positions.
    #[must_use]
    pub fn rule_bypass() -> &'static Scope {
        &RULE_BYPASS
    }

    /// Enter the scope until the guard is dropped.
    pub fn begin(&self) -> ScopeGuard<'_> {
        self.active.fetch_add(1, Ordering::AcqRel);
        ScopeGuard { scope: self }
    }

    #[must_use]
    pub fn in_scope(&self) -> bool {
        self.active.load(Ordering::Acquire) > 0
    }
}

/// Keeps its `Scope` active while alive.
#[derive(Debug)]
#[must_use = "the scope ends when the guard is dropped"]
pub struct ScopeGuard<'a> {
    scope: &'a Scope,
}

impl Drop for ScopeGuard<'_> {
    fn drop(&mut self) {
        self.scope.active.fetch_sub(1, Ordering::AcqRel);
    }
}
