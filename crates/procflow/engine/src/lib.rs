//! Escalation propagation and scope cancellation for Procflow
//!
//! A running unit of work can raise a named business escalation that
//! travels up the tree of live execution scopes — activities,
//! embedded sub-processes, multi-instance groups, and sub-process
//! calls spanning separate process instances — until the nearest
//! willing boundary catches it, or it is silently discarded.
//!
//! # Key principle
//!
//! **An uncaught escalation is not an error.** Escalations are
//! business signals, not faults; absence of a handler leaves
//! execution entirely unaffected.
//!
//! # Architecture
//!
//! The [`ProcessEngine`] facade composes specialized components:
//!
//! - [`ScopeTree`] — the live hierarchy of execution scopes
//! - [`SubscriptionRegistry`] — boundary-catch declarations per scope
//! - [`CallLinkResolver`] — crossing process-instance boundaries
//! - [`ScopeCanceller`] — cascading termination of live subtrees
//! - [`EscalationDispatcher`] — the propagation and matching walk
//!
//! [`EngineHandle`] wraps an engine for shared use: one lock per
//! linked group of instances, held for the full duration of each
//! operation.
//!
//! # Example
//!
//! ```rust
//! use procflow_engine::ProcessEngine;
//! use procflow_types::{CodeFilter, ScopeKind};
//!
//! let mut engine = ProcessEngine::new();
//! let root = engine.start_instance();
//!
//! // A subprocess with a non-interrupting catch-all boundary
//! let sub = engine.start_scope(&root, ScopeKind::Subprocess).unwrap();
//! engine
//!     .register_boundary(&sub, CodeFilter::CatchAll, Some(false), "task after catched escalation")
//!     .unwrap();
//!
//! // Work inside the subprocess raises an escalation
//! let work = engine.start_scope(&sub, ScopeKind::Activity).unwrap();
//! engine.create_task(&work, "task in subprocess").unwrap();
//! let outcome = engine.raise(&work, "order-limit-exceeded").unwrap();
//!
//! // Caught, handled, and the subprocess continues
//! assert!(outcome.was_caught());
//! assert_eq!(engine.count_tasks(None), 2);
//! assert!(engine.is_active(&sub));
//! ```

#![deny(unsafe_code)]

pub mod call_links;
pub mod canceller;
pub mod dispatcher;
pub mod engine;
pub mod handle;
pub mod registry;
pub mod scope_tree;

// Re-export main types
pub use call_links::CallLinkResolver;
pub use canceller::ScopeCanceller;
pub use dispatcher::EscalationDispatcher;
pub use engine::{EngineConfig, ProcessEngine};
pub use handle::EngineHandle;
pub use registry::SubscriptionRegistry;
pub use scope_tree::ScopeTree;
