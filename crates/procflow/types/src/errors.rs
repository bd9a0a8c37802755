//! Error types for the escalation engine
//!
//! Absence of a matching subscription is NOT an error — escalations
//! are business signals and may go uncaught. Only structural
//! contract violations surface here.

use crate::{ScopeId, TaskId};

/// Errors that can occur in engine operations
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("Scope not found: {0}")]
    ScopeNotFound(ScopeId),

    #[error("Scope not active: {0}")]
    ScopeNotActive(ScopeId),

    #[error("Call activity already linked: {0}")]
    AlreadyLinked(ScopeId),

    #[error("No call link recorded for root scope: {0}")]
    LinkNotFound(ScopeId),

    #[error("Task not found: {0}")]
    TaskNotFound(TaskId),

    #[error("Multi-instance group must have at least one member")]
    EmptyMultiInstanceGroup,
}

/// Result type alias for engine operations
pub type EngineResult<T> = Result<T, EngineError>;
