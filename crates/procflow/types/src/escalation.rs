//! Escalation signals and dispatch outcomes
//!
//! An escalation is a named business signal, not a fault. It exists
//! only for the duration of one dispatch and is never persisted.

use serde::{Deserialize, Serialize};

use crate::ScopeId;

// ── Signal ───────────────────────────────────────────────────────────

/// An ephemeral escalation signal
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EscalationSignal {
    /// The escalation code (possibly empty)
    pub code: String,
    /// The scope the escalation was raised from
    pub origin: ScopeId,
}

impl EscalationSignal {
    pub fn new(origin: ScopeId, code: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            origin,
        }
    }
}

// ── Outcome ──────────────────────────────────────────────────────────

/// The result of dispatching one escalation
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum EscalationOutcome {
    /// A subscription caught the escalation
    Caught {
        /// The scope owning the matched subscription
        scope: ScopeId,
        /// Whether delivery cancelled the matched scope's subtree
        interrupting: bool,
        /// The handler branch scope started by the catch
        handler_scope: ScopeId,
    },
    /// No subscription on the search path matched — the escalation
    /// was dropped and execution continues unaffected
    Discarded,
    /// The origin scope had been cancelled by the time the raise was
    /// dispatched; the signal is dropped rather than delivered
    DiscardedCancelledOrigin,
}

impl EscalationOutcome {
    /// Check if the escalation was caught by a subscription
    pub fn was_caught(&self) -> bool {
        matches!(self, Self::Caught { .. })
    }

    /// The matched scope, if the escalation was caught
    pub fn caught_by(&self) -> Option<&ScopeId> {
        match self {
            Self::Caught { scope, .. } => Some(scope),
            _ => None,
        }
    }
}
