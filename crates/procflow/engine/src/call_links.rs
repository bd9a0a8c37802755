//! Call-link resolver: crossing process-instance boundaries
//!
//! A call activity delegates its work to a nested process instance.
//! The instance owns its scopes one-directionally; the resolver holds
//! the back-reference from the callee's root to the calling activity
//! separately, so there is no ownership cycle. The dispatcher uses it
//! to continue the ancestor walk past an instance root, and the
//! canceller uses it to descend into called instances.

use std::collections::HashMap;

use procflow_types::{EngineError, EngineResult, ScopeId};

/// Bidirectional call-activity ↔ callee-root mapping
#[derive(Clone, Debug, Default)]
pub struct CallLinkResolver {
    /// callee root → call activity in the enclosing instance
    callers: HashMap<ScopeId, ScopeId>,
    /// call activity → callee root
    callees: HashMap<ScopeId, ScopeId>,
}

impl CallLinkResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a link when a call activity starts its nested instance
    pub fn link(&mut self, call_activity: &ScopeId, callee_root: &ScopeId) -> EngineResult<()> {
        if self.callees.contains_key(call_activity) {
            return Err(EngineError::AlreadyLinked(call_activity.clone()));
        }
        if self.callers.contains_key(callee_root) {
            return Err(EngineError::AlreadyLinked(callee_root.clone()));
        }
        self.callees
            .insert(call_activity.clone(), callee_root.clone());
        self.callers
            .insert(callee_root.clone(), call_activity.clone());
        Ok(())
    }

    /// Remove a link on completion or cancellation of the call
    pub fn unlink(&mut self, callee_root: &ScopeId) -> EngineResult<()> {
        let call_activity = self
            .callers
            .remove(callee_root)
            .ok_or_else(|| EngineError::LinkNotFound(callee_root.clone()))?;
        self.callees.remove(&call_activity);
        Ok(())
    }

    /// The call activity that started the instance rooted at
    /// `callee_root`, or none for a top-level instance
    pub fn caller_of(&self, callee_root: &ScopeId) -> Option<&ScopeId> {
        self.callers.get(callee_root)
    }

    /// The root of the instance called by `call_activity`, if any
    pub fn callee_of(&self, call_activity: &ScopeId) -> Option<&ScopeId> {
        self.callees.get(call_activity)
    }

    /// Number of live call links
    pub fn len(&self) -> usize {
        self.callers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.callers.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_link_and_resolve_both_ways() {
        let mut links = CallLinkResolver::new();
        let call = ScopeId::new("call-activity");
        let root = ScopeId::new("callee-root");

        links.link(&call, &root).unwrap();
        assert_eq!(links.caller_of(&root), Some(&call));
        assert_eq!(links.callee_of(&call), Some(&root));
        assert_eq!(links.len(), 1);
    }

    #[test]
    fn test_top_level_instance_has_no_caller() {
        let links = CallLinkResolver::new();
        assert!(links.caller_of(&ScopeId::new("top-root")).is_none());
    }

    #[test]
    fn test_double_link_fails() {
        let mut links = CallLinkResolver::new();
        let call = ScopeId::new("call");
        let root = ScopeId::new("root");
        links.link(&call, &root).unwrap();

        let result = links.link(&call, &ScopeId::new("other-root"));
        assert!(matches!(result, Err(EngineError::AlreadyLinked(_))));

        let result = links.link(&ScopeId::new("other-call"), &root);
        assert!(matches!(result, Err(EngineError::AlreadyLinked(_))));
    }

    #[test]
    fn test_unlink() {
        let mut links = CallLinkResolver::new();
        let call = ScopeId::new("call");
        let root = ScopeId::new("root");
        links.link(&call, &root).unwrap();

        links.unlink(&root).unwrap();
        assert!(links.is_empty());
        assert!(links.caller_of(&root).is_none());
        assert!(links.callee_of(&call).is_none());

        let result = links.unlink(&root);
        assert!(matches!(result, Err(EngineError::LinkNotFound(_))));
    }
}
