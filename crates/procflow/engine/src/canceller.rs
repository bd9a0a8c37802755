//! Scope canceller: cascading termination of live subtrees
//!
//! Cancelling a scope terminates the scope and every live descendant,
//! removes every task those scopes own through the task sink, and
//! unregisters every subscription they carry. The cascade follows
//! call links downward, so cancelling a call activity also cancels
//! the instance it called. After `cancel` returns, no descendant is
//! active and any escalation later raised from a cancelled scope is
//! discarded instead of dispatched.

use procflow_types::{EngineError, EngineResult, Liveness, ScopeId, ScopeKind, TaskSink};

use crate::{CallLinkResolver, ScopeTree, SubscriptionRegistry};

/// Cancels scope subtrees, coordinating tree, registry, links and sink
#[derive(Clone, Copy, Debug, Default)]
pub struct ScopeCanceller;

impl ScopeCanceller {
    pub fn new() -> Self {
        Self
    }

    /// Cancel a scope and its entire live subtree, depth-first.
    ///
    /// Returns the number of scopes terminated. Cancelling an already
    /// terminated or unknown scope is a contract violation.
    pub fn cancel(
        &self,
        tree: &mut ScopeTree,
        registry: &mut SubscriptionRegistry,
        links: &mut CallLinkResolver,
        sink: &mut dyn TaskSink,
        scope: &ScopeId,
    ) -> EngineResult<usize> {
        let node = tree.get(scope)?;
        if !node.is_active() {
            return Err(EngineError::ScopeNotActive(scope.clone()));
        }

        // A cancelled multi-instance member counts against its group,
        // unless the group itself is going down with it.
        let member_group = if node.kind == ScopeKind::MultiInstanceMember {
            node.parent.clone()
        } else {
            None
        };

        // Collect the live subtree, crossing call links downward.
        // Children vectors only hold active scopes, so terminated
        // branches are never revisited.
        let mut order = Vec::new();
        let mut stack = vec![scope.clone()];
        while let Some(id) = stack.pop() {
            let node = tree.get(&id)?;
            stack.extend(node.children.iter().cloned());
            if let Some(callee_root) = links.callee_of(&id) {
                stack.push(callee_root.clone());
            }
            order.push(id);
        }

        // Any callee root caught in the cascade drops its call link.
        for id in &order {
            if links.caller_of(id).is_some() {
                links.unlink(id)?;
            }
        }

        // Terminate leaves first.
        for id in order.iter().rev() {
            let tasks = tree.get(id)?.tasks.clone();
            for task in &tasks {
                sink.remove_task(task);
            }
            registry.unregister_scope(id);
            tree.terminate(id, Liveness::Cancelled)?;
        }

        if let Some(group) = member_group {
            if let Ok(group_scope) = tree.get_mut(&group) {
                if let Some(mi) = group_scope.multi_instance.as_mut() {
                    mi.record_cancelled();
                }
            }
        }

        tracing::debug!(
            scope = %scope,
            terminated = order.len(),
            "scope subtree cancelled"
        );
        Ok(order.len())
    }
}
