//! Execution scopes: nodes in the live execution tree
//!
//! A scope represents one running piece of work — an activity, an
//! embedded sub-process, a member of a multi-instance group, a call
//! activity, or the root of a process instance. Scopes form a tree:
//! a scope references its parent weakly and owns its children.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::TaskId;

// ── Identifiers ──────────────────────────────────────────────────────

/// Unique identifier for an execution scope
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ScopeId(pub String);

impl ScopeId {
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn short(&self) -> &str {
        &self.0[..8.min(self.0.len())]
    }
}

impl std::fmt::Display for ScopeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Unique identifier for a process instance
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ProcessInstanceId(pub String);

impl ProcessInstanceId {
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }
}

impl std::fmt::Display for ProcessInstanceId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ── Scope Kind ───────────────────────────────────────────────────────

/// What a scope represents in the execution tree
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ScopeKind {
    /// A plain activity (task, handler branch, control node)
    Activity,
    /// An embedded sub-process
    Subprocess,
    /// A multi-instance group — its children are the member instances
    MultiInstanceGroup,
    /// One member instance of a multi-instance group
    MultiInstanceMember,
    /// An activity whose work is delegated to a called process instance
    CallActivity,
    /// The root scope of a process instance
    ProcessRoot,
}

impl ScopeKind {
    /// Check if this is a process instance root
    pub fn is_root(&self) -> bool {
        matches!(self, Self::ProcessRoot)
    }

    /// Check if this is a call activity
    pub fn is_call_activity(&self) -> bool {
        matches!(self, Self::CallActivity)
    }
}

// ── Liveness ─────────────────────────────────────────────────────────

/// The lifecycle state of a scope.
///
/// `Completed` and `Cancelled` are both terminated, but the engine
/// treats them differently when an escalation is raised from a dead
/// scope: a cancelled origin means the raise lost a race against an
/// interrupting catch and is discarded silently; a completed origin
/// is a contract violation by the caller.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum Liveness {
    /// Actively executing
    #[default]
    Active,
    /// Terminated through the ordinary completion path
    Completed,
    /// Terminated by the scope canceller
    Cancelled,
}

impl Liveness {
    /// Check if this is a terminated state
    pub fn is_terminated(&self) -> bool {
        matches!(self, Self::Completed | Self::Cancelled)
    }
}

// ── Multi-instance bookkeeping ───────────────────────────────────────

/// Completion/cancellation counters carried by a multi-instance group scope
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MultiInstanceState {
    /// Number of member instances created when the group started
    pub total: usize,
    /// Members that completed normally
    pub completed: usize,
    /// Members terminated by cancellation
    pub cancelled: usize,
}

impl MultiInstanceState {
    pub fn new(total: usize) -> Self {
        Self {
            total,
            completed: 0,
            cancelled: 0,
        }
    }

    /// Record one member completing normally
    pub fn record_completed(&mut self) {
        self.completed += 1;
    }

    /// Record one member being cancelled
    pub fn record_cancelled(&mut self) {
        self.cancelled += 1;
    }

    /// Check if every member has reached a terminal state
    pub fn all_settled(&self) -> bool {
        self.completed + self.cancelled >= self.total
    }
}

// ── Scope ────────────────────────────────────────────────────────────

/// A node in the execution tree
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Scope {
    /// Unique scope identifier
    pub id: ScopeId,
    /// What this scope represents
    pub kind: ScopeKind,
    /// The process instance this scope belongs to
    pub instance_id: ProcessInstanceId,
    /// Parent scope (weak reference — a scope never owns its parent).
    /// `None` for the root scope of a process instance.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent: Option<ScopeId>,
    /// Ordered child scope ids (owned — destroying a scope destroys
    /// all descendants, but that cascade is the canceller's job)
    pub children: Vec<ScopeId>,
    /// Current lifecycle state
    pub liveness: Liveness,
    /// Back-references to tasks created by this scope. The tasks
    /// themselves are owned by the task sink; the ids are kept only
    /// so cancellation can remove them.
    pub tasks: Vec<TaskId>,
    /// Counters for multi-instance group scopes
    #[serde(skip_serializing_if = "Option::is_none")]
    pub multi_instance: Option<MultiInstanceState>,
    /// When the scope was created
    pub created_at: DateTime<Utc>,
    /// When the scope terminated (if terminated)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub terminated_at: Option<DateTime<Utc>>,
}

impl Scope {
    /// Create a new active scope
    pub fn new(kind: ScopeKind, instance_id: ProcessInstanceId, parent: Option<ScopeId>) -> Self {
        Self {
            id: ScopeId::generate(),
            kind,
            instance_id,
            parent,
            children: Vec::new(),
            liveness: Liveness::Active,
            tasks: Vec::new(),
            multi_instance: None,
            created_at: Utc::now(),
            terminated_at: None,
        }
    }

    /// Attach multi-instance counters (for group scopes)
    pub fn with_multi_instance(mut self, total: usize) -> Self {
        self.multi_instance = Some(MultiInstanceState::new(total));
        self
    }

    /// Check if the scope is live
    pub fn is_active(&self) -> bool {
        self.liveness == Liveness::Active
    }

    /// Check if the scope was terminated by cancellation
    pub fn is_cancelled(&self) -> bool {
        self.liveness == Liveness::Cancelled
    }

    /// Mark the scope as completed through the ordinary completion path
    pub fn mark_completed(&mut self) {
        self.liveness = Liveness::Completed;
        self.terminated_at = Some(Utc::now());
    }

    /// Mark the scope as cancelled
    pub fn mark_cancelled(&mut self) {
        self.liveness = Liveness::Cancelled;
        self.terminated_at = Some(Utc::now());
    }

    /// Record a task created by this scope
    pub fn track_task(&mut self, task: TaskId) {
        self.tasks.push(task);
    }

    /// Drop the back-reference to a task (on task completion)
    pub fn untrack_task(&mut self, task: &TaskId) {
        self.tasks.retain(|t| t != task);
    }
}
