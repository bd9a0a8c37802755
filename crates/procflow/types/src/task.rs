//! Tasks: observable work items owned by the task sink
//!
//! The engine never manages tasks itself. Handler branches and
//! ordinary activities create tasks through a [`TaskSink`], and the
//! scope canceller removes them through the same interface. Task
//! counts by name are the observable contract for the whole engine.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::ScopeId;

// ── Identifier ───────────────────────────────────────────────────────

/// Unique identifier for a task
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TaskId(pub String);

impl TaskId {
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }
}

impl std::fmt::Display for TaskId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ── Task Sink ────────────────────────────────────────────────────────

/// Collaborator interface for task management.
///
/// The sink owns the tasks. Scopes keep task-id back-references for
/// cancellation only.
pub trait TaskSink {
    /// Create a task on behalf of a scope, returning its id
    fn create_task(&mut self, scope: &ScopeId, name: &str) -> TaskId;

    /// Remove a task (on completion or cancellation)
    fn remove_task(&mut self, task: &TaskId);

    /// Count tasks, optionally filtered by exact name
    fn count_tasks(&self, name: Option<&str>) -> usize;
}

// ── In-memory implementation ─────────────────────────────────────────

/// A recorded task inside the in-memory sink
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TaskRecord {
    /// The scope that created the task
    pub scope: ScopeId,
    /// Human-readable task name
    pub name: String,
    /// When the task was created
    pub created_at: DateTime<Utc>,
}

/// In-memory task sink for tests and embedding
#[derive(Clone, Debug, Default)]
pub struct InMemoryTaskSink {
    tasks: HashMap<TaskId, TaskRecord>,
}

impl InMemoryTaskSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Total number of live tasks
    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Look up a task record
    pub fn get(&self, task: &TaskId) -> Option<&TaskRecord> {
        self.tasks.get(task)
    }
}

impl TaskSink for InMemoryTaskSink {
    fn create_task(&mut self, scope: &ScopeId, name: &str) -> TaskId {
        let id = TaskId::generate();
        self.tasks.insert(
            id.clone(),
            TaskRecord {
                scope: scope.clone(),
                name: name.to_string(),
                created_at: Utc::now(),
            },
        );
        id
    }

    fn remove_task(&mut self, task: &TaskId) {
        self.tasks.remove(task);
    }

    fn count_tasks(&self, name: Option<&str>) -> usize {
        match name {
            Some(name) => self.tasks.values().filter(|t| t.name == name).count(),
            None => self.tasks.len(),
        }
    }
}
