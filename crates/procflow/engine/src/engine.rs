//! Process engine facade
//!
//! One [`ProcessEngine`] owns exactly one linked group of process
//! instances: a top-level instance plus every instance reachable from
//! it through call links (call activities always start their callee
//! through the same engine). The surrounding runtime — the process
//! graph walker — drives scope lifecycle through this facade and the
//! engine handles escalation dispatch and cancellation.

use procflow_types::{
    CodeFilter, EngineError, EngineResult, EscalationOutcome, EscalationSubscription,
    InMemoryTaskSink, Liveness, Scope, ScopeId, ScopeKind, TaskId, TaskSink,
};

use crate::{
    CallLinkResolver, EscalationDispatcher, ScopeCanceller, ScopeTree, SubscriptionRegistry,
};

// ── Configuration ────────────────────────────────────────────────────

/// Engine configuration
#[derive(Clone, Copy, Debug, serde::Serialize, serde::Deserialize)]
pub struct EngineConfig {
    /// Interruption mode applied when a boundary declaration leaves
    /// it unspecified. The original runtime's observed default is
    /// interrupting, but the behavior is disputed, so it is explicit
    /// and configurable here.
    #[serde(default = "default_interrupting")]
    pub default_interrupting: bool,
}

fn default_interrupting() -> bool {
    true
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            default_interrupting: true,
        }
    }
}

impl EngineConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_default_interrupting(mut self, interrupting: bool) -> Self {
        self.default_interrupting = interrupting;
        self
    }
}

// ── Engine ───────────────────────────────────────────────────────────

/// The escalation engine for one linked group of process instances
pub struct ProcessEngine {
    config: EngineConfig,
    tree: ScopeTree,
    registry: SubscriptionRegistry,
    links: CallLinkResolver,
    canceller: ScopeCanceller,
    dispatcher: EscalationDispatcher,
    sink: Box<dyn TaskSink + Send>,
}

impl Default for ProcessEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl ProcessEngine {
    /// Create an engine with default configuration and an in-memory
    /// task sink
    pub fn new() -> Self {
        Self::with_config(EngineConfig::default())
    }

    pub fn with_config(config: EngineConfig) -> Self {
        Self {
            config,
            tree: ScopeTree::new(),
            registry: SubscriptionRegistry::new(),
            links: CallLinkResolver::new(),
            canceller: ScopeCanceller::new(),
            dispatcher: EscalationDispatcher::new(),
            sink: Box::new(InMemoryTaskSink::new()),
        }
    }

    /// Replace the task sink collaborator
    pub fn with_sink(mut self, sink: Box<dyn TaskSink + Send>) -> Self {
        self.sink = sink;
        self
    }

    // ── Instance & scope lifecycle ───────────────────────────────────

    /// Start a top-level process instance, returning its root scope
    pub fn start_instance(&mut self) -> ScopeId {
        let root = self.tree.create_instance();
        tracing::info!(root = %root, "process instance started");
        root
    }

    /// Start a scope under an active parent
    pub fn start_scope(&mut self, parent: &ScopeId, kind: ScopeKind) -> EngineResult<ScopeId> {
        self.tree.create_scope(parent, kind)
    }

    /// Start a call activity and its called process instance,
    /// recording the link between them
    pub fn start_call_activity(&mut self, parent: &ScopeId) -> EngineResult<(ScopeId, ScopeId)> {
        let call = self.tree.create_scope(parent, ScopeKind::CallActivity)?;
        let callee_root = self.tree.create_instance();
        self.links.link(&call, &callee_root)?;
        tracing::info!(call = %call, callee_root = %callee_root, "call activity started");
        Ok((call, callee_root))
    }

    /// Start a multi-instance group with `count` member instances,
    /// created together
    pub fn start_multi_instance(
        &mut self,
        parent: &ScopeId,
        count: usize,
    ) -> EngineResult<(ScopeId, Vec<ScopeId>)> {
        if count == 0 {
            return Err(EngineError::EmptyMultiInstanceGroup);
        }
        let group = self
            .tree
            .create_scope(parent, ScopeKind::MultiInstanceGroup)?;
        self.tree.get_mut(&group)?.multi_instance =
            Some(procflow_types::MultiInstanceState::new(count));
        let members = (0..count)
            .map(|_| self.tree.create_scope(&group, ScopeKind::MultiInstanceMember))
            .collect::<EngineResult<Vec<_>>>()?;
        Ok((group, members))
    }

    /// Complete a scope through the ordinary completion path: its
    /// subscriptions are unregistered, call links are released, and
    /// multi-instance bookkeeping is updated.
    pub fn complete_scope(&mut self, scope: &ScopeId) -> EngineResult<()> {
        let node = self.tree.get(scope)?;
        if !node.is_active() {
            return Err(EngineError::ScopeNotActive(scope.clone()));
        }
        let kind = node.kind;
        let parent = node.parent.clone();

        self.registry.unregister_scope(scope);
        if self.links.caller_of(scope).is_some() {
            self.links.unlink(scope)?;
        }
        if let Some(callee_root) = self.links.callee_of(scope).cloned() {
            self.links.unlink(&callee_root)?;
        }
        self.tree.terminate(scope, Liveness::Completed)?;

        if kind == ScopeKind::MultiInstanceMember {
            if let Some(group) = parent {
                if let Ok(group_scope) = self.tree.get_mut(&group) {
                    if let Some(mi) = group_scope.multi_instance.as_mut() {
                        mi.record_completed();
                    }
                }
            }
        }
        Ok(())
    }

    /// Complete a scope through an escalation end: ordinary
    /// completion first, then an escalation raised with the completed
    /// scope's parent as origin. The completing scope's own
    /// subscriptions are already gone by the time the signal is
    /// dispatched, so its own boundary can no longer catch it.
    pub fn complete_with_escalation(
        &mut self,
        scope: &ScopeId,
        code: &str,
    ) -> EngineResult<EscalationOutcome> {
        let node = self.tree.get(scope)?;
        let origin = node
            .parent
            .clone()
            .or_else(|| self.links.caller_of(scope).cloned());
        self.complete_scope(scope)?;
        match origin {
            Some(origin) => self.raise(&origin, code),
            // Completing a top-level root: nowhere left to escalate
            None => Ok(EscalationOutcome::Discarded),
        }
    }

    // ── Subscriptions ────────────────────────────────────────────────

    /// Register a boundary subscription on an active scope.
    ///
    /// `interrupting` left unspecified resolves through
    /// [`EngineConfig::default_interrupting`].
    pub fn register_boundary(
        &mut self,
        scope: &ScopeId,
        filter: CodeFilter,
        interrupting: Option<bool>,
        handler_task: impl Into<String>,
    ) -> EngineResult<()> {
        if !self.tree.get(scope)?.is_active() {
            return Err(EngineError::ScopeNotActive(scope.clone()));
        }
        let interrupting = interrupting.unwrap_or(self.config.default_interrupting);
        self.registry.register(EscalationSubscription::new(
            scope.clone(),
            filter,
            interrupting,
            handler_task,
        ));
        Ok(())
    }

    // ── Escalation ───────────────────────────────────────────────────

    /// Raise an escalation from an origin scope
    pub fn raise(&mut self, origin: &ScopeId, code: &str) -> EngineResult<EscalationOutcome> {
        self.dispatcher.raise(
            &mut self.tree,
            &mut self.registry,
            &mut self.links,
            &self.canceller,
            self.sink.as_mut(),
            origin,
            code,
        )
    }

    /// Cancel a scope subtree directly (outside escalation dispatch)
    pub fn cancel_scope(&mut self, scope: &ScopeId) -> EngineResult<usize> {
        self.canceller.cancel(
            &mut self.tree,
            &mut self.registry,
            &mut self.links,
            self.sink.as_mut(),
            scope,
        )
    }

    // ── Tasks ────────────────────────────────────────────────────────

    /// Create a task owned by an active scope
    pub fn create_task(&mut self, scope: &ScopeId, name: &str) -> EngineResult<TaskId> {
        if !self.tree.get(scope)?.is_active() {
            return Err(EngineError::ScopeNotActive(scope.clone()));
        }
        let task = self.sink.create_task(scope, name);
        self.tree.get_mut(scope)?.track_task(task.clone());
        Ok(task)
    }

    /// Complete a task: removed from the sink, back-reference dropped
    pub fn complete_task(&mut self, scope: &ScopeId, task: &TaskId) -> EngineResult<()> {
        let node = self.tree.get_mut(scope)?;
        if !node.tasks.contains(task) {
            return Err(EngineError::TaskNotFound(task.clone()));
        }
        node.untrack_task(task);
        self.sink.remove_task(task);
        Ok(())
    }

    /// Count observable tasks, optionally filtered by exact name
    pub fn count_tasks(&self, name: Option<&str>) -> usize {
        self.sink.count_tasks(name)
    }

    // ── Queries ──────────────────────────────────────────────────────

    /// Look up a scope
    pub fn scope(&self, scope: &ScopeId) -> EngineResult<&Scope> {
        self.tree.get(scope)
    }

    /// Check if a scope is live
    pub fn is_active(&self, scope: &ScopeId) -> bool {
        self.tree.is_active(scope)
    }

    /// Number of live process instances in this linked group
    pub fn instance_count(&self) -> usize {
        self.tree.instance_count()
    }

    /// The engine configuration
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }
}
