//! Procflow domain types
//!
//! Pure data for the escalation propagation engine: execution scopes
//! and their lifecycle, boundary subscriptions with code filters,
//! ephemeral escalation signals, and the task sink collaborator
//! interface.
//!
//! These types carry no engine logic. The live tree, matching walk,
//! and cancellation cascade live in `procflow-engine`.

#![deny(unsafe_code)]

pub mod errors;
pub mod escalation;
pub mod scope;
pub mod subscription;
pub mod task;

pub use errors::{EngineError, EngineResult};
pub use escalation::{EscalationOutcome, EscalationSignal};
pub use scope::{Liveness, MultiInstanceState, ProcessInstanceId, Scope, ScopeId, ScopeKind};
pub use subscription::{CodeFilter, EscalationSubscription};
pub use task::{InMemoryTaskSink, TaskId, TaskRecord, TaskSink};
