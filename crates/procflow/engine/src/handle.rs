//! Tree-level exclusion: shared access to one linked-instance group
//!
//! All mutations and dispatch decisions against one linked group of
//! instances must be serialized: a `raise` holds the group lock for
//! its full walk-cancel-branch duration, so no two raises against
//! overlapping subtrees can interleave. Disjoint groups live in
//! separate engines and separate handles, and proceed fully in
//! parallel.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use procflow_types::{CodeFilter, EngineResult, EscalationOutcome, ScopeId, ScopeKind, TaskId};

use crate::ProcessEngine;

/// Cloneable, thread-safe handle to one process engine
#[derive(Clone)]
pub struct EngineHandle {
    inner: Arc<Mutex<ProcessEngine>>,
}

impl EngineHandle {
    pub fn new(engine: ProcessEngine) -> Self {
        Self {
            inner: Arc::new(Mutex::new(engine)),
        }
    }

    fn lock(&self) -> MutexGuard<'_, ProcessEngine> {
        // A panic while holding the lock poisons it; the engine state
        // itself stays consistent because every operation completes
        // or fails without partial mutation visible to callers.
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Run a closure with exclusive access to the engine
    pub fn with_engine<R>(&self, f: impl FnOnce(&mut ProcessEngine) -> R) -> R {
        f(&mut self.lock())
    }

    // ── Forwarded operations ─────────────────────────────────────────

    pub fn start_instance(&self) -> ScopeId {
        self.lock().start_instance()
    }

    pub fn start_scope(&self, parent: &ScopeId, kind: ScopeKind) -> EngineResult<ScopeId> {
        self.lock().start_scope(parent, kind)
    }

    pub fn start_call_activity(&self, parent: &ScopeId) -> EngineResult<(ScopeId, ScopeId)> {
        self.lock().start_call_activity(parent)
    }

    pub fn start_multi_instance(
        &self,
        parent: &ScopeId,
        count: usize,
    ) -> EngineResult<(ScopeId, Vec<ScopeId>)> {
        self.lock().start_multi_instance(parent, count)
    }

    pub fn register_boundary(
        &self,
        scope: &ScopeId,
        filter: CodeFilter,
        interrupting: Option<bool>,
        handler_task: impl Into<String>,
    ) -> EngineResult<()> {
        self.lock()
            .register_boundary(scope, filter, interrupting, handler_task)
    }

    pub fn raise(&self, origin: &ScopeId, code: &str) -> EngineResult<EscalationOutcome> {
        self.lock().raise(origin, code)
    }

    pub fn complete_scope(&self, scope: &ScopeId) -> EngineResult<()> {
        self.lock().complete_scope(scope)
    }

    pub fn complete_with_escalation(
        &self,
        scope: &ScopeId,
        code: &str,
    ) -> EngineResult<EscalationOutcome> {
        self.lock().complete_with_escalation(scope, code)
    }

    pub fn create_task(&self, scope: &ScopeId, name: &str) -> EngineResult<TaskId> {
        self.lock().create_task(scope, name)
    }

    pub fn complete_task(&self, scope: &ScopeId, task: &TaskId) -> EngineResult<()> {
        self.lock().complete_task(scope, task)
    }

    pub fn count_tasks(&self, name: Option<&str>) -> usize {
        self.lock().count_tasks(name)
    }

    pub fn is_active(&self, scope: &ScopeId) -> bool {
        self.lock().is_active(scope)
    }
}
