//! The live hierarchy of execution scopes
//!
//! The tree is a pure data structure. It creates scopes, marks single
//! scopes terminated, and answers ancestor queries. Terminating a
//! scope never recurses into its children — the cascading version is
//! the scope canceller's job, kept separate so the tree itself stays
//! simple.

use std::collections::HashMap;

use procflow_types::{
    EngineError, EngineResult, Liveness, ProcessInstanceId, Scope, ScopeId, ScopeKind,
};

/// The live execution tree for one linked group of process instances
#[derive(Clone, Debug, Default)]
pub struct ScopeTree {
    /// Every scope ever created, terminated ones included. Terminated
    /// scopes stay reachable for in-flight dispatch bookkeeping.
    scopes: HashMap<ScopeId, Scope>,
    /// Live process instances, by their root scope
    instances: HashMap<ProcessInstanceId, ScopeId>,
}

impl ScopeTree {
    pub fn new() -> Self {
        Self::default()
    }

    // ── Creation ─────────────────────────────────────────────────────

    /// Start a new process instance, creating its root scope
    pub fn create_instance(&mut self) -> ScopeId {
        let instance_id = ProcessInstanceId::generate();
        let root = Scope::new(ScopeKind::ProcessRoot, instance_id.clone(), None);
        let id = root.id.clone();
        self.instances.insert(instance_id, id.clone());
        self.scopes.insert(id.clone(), root);
        id
    }

    /// Create a scope under an active parent.
    ///
    /// The new scope belongs to the parent's process instance. A
    /// terminated parent is a contract violation by the caller.
    pub fn create_scope(&mut self, parent: &ScopeId, kind: ScopeKind) -> EngineResult<ScopeId> {
        let parent_scope = self.get(parent)?;
        if !parent_scope.is_active() {
            return Err(EngineError::ScopeNotActive(parent.clone()));
        }
        let scope = Scope::new(kind, parent_scope.instance_id.clone(), Some(parent.clone()));
        let id = scope.id.clone();
        self.scopes.insert(id.clone(), scope);
        if let Some(parent_scope) = self.scopes.get_mut(parent) {
            parent_scope.children.push(id.clone());
        }
        Ok(id)
    }

    /// Create a scope with no parent inside an existing instance.
    ///
    /// Used for a handler branch whose catching scope was a top-level
    /// root with no surviving parent to attach to.
    pub fn create_detached(&mut self, instance: ProcessInstanceId, kind: ScopeKind) -> ScopeId {
        let scope = Scope::new(kind, instance, None);
        let id = scope.id.clone();
        self.scopes.insert(id.clone(), scope);
        id
    }

    // ── Termination ──────────────────────────────────────────────────

    /// Mark a single scope terminated and detach it from its parent's
    /// active-children view. The node stays reachable through
    /// [`ScopeTree::get`]. If the scope is an instance root, the
    /// instance is destroyed with it.
    pub fn terminate(&mut self, scope: &ScopeId, liveness: Liveness) -> EngineResult<()> {
        let node = self
            .scopes
            .get_mut(scope)
            .ok_or_else(|| EngineError::ScopeNotFound(scope.clone()))?;
        if !node.is_active() {
            return Err(EngineError::ScopeNotActive(scope.clone()));
        }
        match liveness {
            Liveness::Completed => node.mark_completed(),
            Liveness::Cancelled => node.mark_cancelled(),
            Liveness::Active => return Err(EngineError::ScopeNotActive(scope.clone())),
        }
        let parent = node.parent.clone();
        let instance = node.instance_id.clone();
        let is_root = node.kind.is_root();

        if let Some(parent) = parent {
            if let Some(parent_scope) = self.scopes.get_mut(&parent) {
                parent_scope.children.retain(|c| c != scope);
            }
        }
        if is_root {
            self.instances.remove(&instance);
        }
        Ok(())
    }

    // ── Queries ──────────────────────────────────────────────────────

    /// Ancestors of a scope within its linked chain of parents,
    /// nearest first, starting with the scope itself and ending at
    /// its instance root.
    ///
    /// Only the starting scope may be terminated (mid-termination
    /// dispatch); every parent of an active scope is active by
    /// invariant.
    pub fn ancestors_of(&self, scope: &ScopeId) -> EngineResult<Vec<ScopeId>> {
        let mut path = Vec::new();
        let mut current = Some(scope.clone());
        while let Some(id) = current {
            let node = self.get(&id)?;
            current = node.parent.clone();
            path.push(id);
        }
        Ok(path)
    }

    /// Check if a scope exists and is live
    pub fn is_active(&self, scope: &ScopeId) -> bool {
        self.scopes.get(scope).is_some_and(|s| s.is_active())
    }

    /// Look up a scope
    pub fn get(&self, scope: &ScopeId) -> EngineResult<&Scope> {
        self.scopes
            .get(scope)
            .ok_or_else(|| EngineError::ScopeNotFound(scope.clone()))
    }

    /// Look up a scope mutably
    pub fn get_mut(&mut self, scope: &ScopeId) -> EngineResult<&mut Scope> {
        self.scopes
            .get_mut(scope)
            .ok_or_else(|| EngineError::ScopeNotFound(scope.clone()))
    }

    /// Active children of a scope
    pub fn children_of(&self, scope: &ScopeId) -> EngineResult<&[ScopeId]> {
        Ok(&self.get(scope)?.children)
    }

    /// The root scope of a live instance
    pub fn root_of(&self, instance: &ProcessInstanceId) -> Option<&ScopeId> {
        self.instances.get(instance)
    }

    /// Number of live process instances
    pub fn instance_count(&self) -> usize {
        self.instances.len()
    }

    /// Total scopes, terminated ones included
    pub fn scope_count(&self) -> usize {
        self.scopes.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_instance() {
        let mut tree = ScopeTree::new();
        let root = tree.create_instance();

        let scope = tree.get(&root).unwrap();
        assert_eq!(scope.kind, ScopeKind::ProcessRoot);
        assert!(scope.parent.is_none());
        assert_eq!(tree.instance_count(), 1);
        assert_eq!(tree.root_of(&scope.instance_id), Some(&root));
    }

    #[test]
    fn test_create_scope_under_parent() {
        let mut tree = ScopeTree::new();
        let root = tree.create_instance();
        let child = tree.create_scope(&root, ScopeKind::Subprocess).unwrap();

        let child_scope = tree.get(&child).unwrap();
        assert_eq!(child_scope.parent, Some(root.clone()));
        assert_eq!(tree.children_of(&root).unwrap(), &[child.clone()]);

        // Child inherits the parent's instance
        assert_eq!(
            child_scope.instance_id,
            tree.get(&root).unwrap().instance_id
        );
    }

    #[test]
    fn test_create_scope_under_terminated_parent_fails() {
        let mut tree = ScopeTree::new();
        let root = tree.create_instance();
        let sub = tree.create_scope(&root, ScopeKind::Subprocess).unwrap();
        tree.terminate(&sub, Liveness::Completed).unwrap();

        let result = tree.create_scope(&sub, ScopeKind::Activity);
        assert!(matches!(result, Err(EngineError::ScopeNotActive(_))));
    }

    #[test]
    fn test_create_scope_under_unknown_parent_fails() {
        let mut tree = ScopeTree::new();
        let result = tree.create_scope(&ScopeId::new("ghost"), ScopeKind::Activity);
        assert!(matches!(result, Err(EngineError::ScopeNotFound(_))));
    }

    #[test]
    fn test_terminate_detaches_but_keeps_reachable() {
        let mut tree = ScopeTree::new();
        let root = tree.create_instance();
        let sub = tree.create_scope(&root, ScopeKind::Subprocess).unwrap();

        tree.terminate(&sub, Liveness::Cancelled).unwrap();

        // Detached from the parent's active-children view
        assert!(tree.children_of(&root).unwrap().is_empty());
        // But still reachable for bookkeeping
        assert!(tree.get(&sub).unwrap().is_cancelled());
        assert!(!tree.is_active(&sub));
    }

    #[test]
    fn test_terminate_does_not_recurse() {
        let mut tree = ScopeTree::new();
        let root = tree.create_instance();
        let sub = tree.create_scope(&root, ScopeKind::Subprocess).unwrap();
        let inner = tree.create_scope(&sub, ScopeKind::Activity).unwrap();

        tree.terminate(&sub, Liveness::Completed).unwrap();

        // The child is untouched — cascading is the canceller's job
        assert!(tree.is_active(&inner));
    }

    #[test]
    fn test_terminate_twice_fails() {
        let mut tree = ScopeTree::new();
        let root = tree.create_instance();
        let sub = tree.create_scope(&root, ScopeKind::Subprocess).unwrap();

        tree.terminate(&sub, Liveness::Completed).unwrap();
        let result = tree.terminate(&sub, Liveness::Completed);
        assert!(matches!(result, Err(EngineError::ScopeNotActive(_))));
    }

    #[test]
    fn test_terminating_root_destroys_instance() {
        let mut tree = ScopeTree::new();
        let root = tree.create_instance();
        assert_eq!(tree.instance_count(), 1);

        tree.terminate(&root, Liveness::Cancelled).unwrap();
        assert_eq!(tree.instance_count(), 0);
    }

    #[test]
    fn test_ancestors_nearest_first() {
        let mut tree = ScopeTree::new();
        let root = tree.create_instance();
        let sub = tree.create_scope(&root, ScopeKind::Subprocess).unwrap();
        let inner = tree.create_scope(&sub, ScopeKind::Activity).unwrap();

        let path = tree.ancestors_of(&inner).unwrap();
        assert_eq!(path, vec![inner, sub, root]);
    }

    #[test]
    fn test_ancestors_of_root_is_just_root() {
        let mut tree = ScopeTree::new();
        let root = tree.create_instance();
        assert_eq!(tree.ancestors_of(&root).unwrap(), vec![root]);
    }

    #[test]
    fn test_detached_scope_has_no_parent() {
        let mut tree = ScopeTree::new();
        let root = tree.create_instance();
        let instance = tree.get(&root).unwrap().instance_id.clone();

        let orphan = tree.create_detached(instance, ScopeKind::Activity);
        assert!(tree.get(&orphan).unwrap().parent.is_none());
        assert_eq!(tree.ancestors_of(&orphan).unwrap().len(), 1);
    }
}
