//! Boundary subscriptions: a scope's declared willingness to catch
//! escalations
//!
//! A subscription is registered when its owning scope starts and
//! unregistered when the scope terminates. A scope may carry any
//! number of subscriptions; two differing only by code filter may
//! coexist so that a specific code can override a catch-all.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::ScopeId;

// ── Code Filter ──────────────────────────────────────────────────────

/// The code restriction of a boundary subscription
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum CodeFilter {
    /// No code restriction — catches every escalation
    CatchAll,
    /// Catches only escalations with exactly this code (case-sensitive)
    Code(String),
}

impl CodeFilter {
    /// Build a filter from a declared code. A declared-but-empty code
    /// is required to behave as catch-all, so it normalizes here.
    pub fn code(code: impl Into<String>) -> Self {
        let code = code.into();
        if code.is_empty() {
            Self::CatchAll
        } else {
            Self::Code(code)
        }
    }

    /// Check if this filter accepts the given escalation code
    pub fn matches(&self, code: &str) -> bool {
        match self {
            Self::CatchAll => true,
            Self::Code(filter) => filter == code,
        }
    }

    /// Check if this is a catch-all filter
    pub fn is_catch_all(&self) -> bool {
        matches!(self, Self::CatchAll)
    }
}

// ── Subscription ─────────────────────────────────────────────────────

/// A boundary-catch declaration bound to a scope
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct EscalationSubscription {
    /// The scope that owns this subscription (the boundary's host)
    pub owner: ScopeId,
    /// Which escalation codes this subscription catches
    pub filter: CodeFilter,
    /// Whether catching cancels the owning scope's subtree first
    pub interrupting: bool,
    /// Name of the task the handler branch creates when this
    /// subscription fires — the observable output of the catch
    pub handler_task: String,
    /// When the subscription was registered
    pub registered_at: DateTime<Utc>,
}

impl EscalationSubscription {
    pub fn new(
        owner: ScopeId,
        filter: CodeFilter,
        interrupting: bool,
        handler_task: impl Into<String>,
    ) -> Self {
        Self {
            owner,
            filter,
            interrupting,
            handler_task: handler_task.into(),
            registered_at: Utc::now(),
        }
    }

    /// Check if this subscription catches the given code
    pub fn matches(&self, code: &str) -> bool {
        self.filter.matches(code)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_catch_all_matches_everything() {
        let filter = CodeFilter::CatchAll;
        assert!(filter.matches("order-limit"));
        assert!(filter.matches(""));
        assert!(filter.is_catch_all());
    }

    #[test]
    fn test_specific_code_matches_exactly() {
        let filter = CodeFilter::code("order-limit");
        assert!(filter.matches("order-limit"));
        assert!(!filter.matches("Order-Limit")); // case-sensitive
        assert!(!filter.matches("order"));
        assert!(!filter.is_catch_all());
    }

    #[test]
    fn test_empty_declared_code_normalizes_to_catch_all() {
        let filter = CodeFilter::code("");
        assert!(filter.is_catch_all());
        assert!(filter.matches("anything"));
    }

    #[test]
    fn test_subscription_matches_through_filter() {
        let sub = EscalationSubscription::new(
            ScopeId::new("scope-1"),
            CodeFilter::code("late-delivery"),
            false,
            "task after catched escalation",
        );
        assert!(sub.matches("late-delivery"));
        assert!(!sub.matches("other"));
        assert!(!sub.interrupting);
    }
}
