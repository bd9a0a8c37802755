//! Escalation dispatcher: the propagation algorithm
//!
//! `raise` builds the search path from the origin scope upward,
//! crossing instance boundaries through call links, selects the
//! nearest matching subscription, and delivers: interrupting delivery
//! cancels the matched scope's subtree before starting the handler
//! branch, non-interrupting delivery starts the handler branch
//! concurrently and touches nothing else. No match is a normal,
//! silent outcome.

use procflow_types::{
    EngineError, EngineResult, EscalationOutcome, EscalationSubscription, Liveness, ScopeId,
    ScopeKind, TaskSink,
};

use crate::{registry, CallLinkResolver, ScopeCanceller, ScopeTree, SubscriptionRegistry};

/// Build the search path for an escalation: the origin's ancestors,
/// nearest first, extended across call links whenever a root scope
/// has a caller. Stops at the outermost top-level root.
pub fn search_path(
    tree: &ScopeTree,
    links: &CallLinkResolver,
    origin: &ScopeId,
) -> EngineResult<Vec<ScopeId>> {
    let mut path = Vec::new();
    let mut current = origin.clone();
    loop {
        let ancestors = tree.ancestors_of(&current)?;
        let root = ancestors
            .last()
            .cloned()
            .unwrap_or_else(|| current.clone());
        path.extend(ancestors);
        match links.caller_of(&root) {
            Some(caller) => current = caller.clone(),
            None => break,
        }
    }
    Ok(path)
}

/// Walk the path nearest-first and select the winning subscription.
///
/// The first scope carrying at least one match wins; within that
/// scope a specific code beats a catch-all.
pub fn select_subscription<'a>(
    registry_ref: &'a SubscriptionRegistry,
    path: &[ScopeId],
    code: &str,
) -> Option<&'a EscalationSubscription> {
    path.iter()
        .find_map(|scope| registry::best_match(registry_ref.subscriptions_of(scope), code))
}

/// Dispatches raised escalations against the live tree
#[derive(Clone, Copy, Debug, Default)]
pub struct EscalationDispatcher;

impl EscalationDispatcher {
    pub fn new() -> Self {
        Self
    }

    /// Raise an escalation from an origin scope.
    ///
    /// Raising from a cancelled origin means the signal lost a race
    /// against an interrupting catch and is discarded. Raising from a
    /// completed or unknown origin is a contract violation.
    pub fn raise(
        &self,
        tree: &mut ScopeTree,
        registry_ref: &mut SubscriptionRegistry,
        links: &mut CallLinkResolver,
        canceller: &ScopeCanceller,
        sink: &mut dyn TaskSink,
        origin: &ScopeId,
        code: &str,
    ) -> EngineResult<EscalationOutcome> {
        match tree.get(origin)?.liveness {
            Liveness::Active => {}
            Liveness::Cancelled => {
                tracing::debug!(origin = %origin, code, "escalation from cancelled scope discarded");
                return Ok(EscalationOutcome::DiscardedCancelledOrigin);
            }
            Liveness::Completed => return Err(EngineError::ScopeNotActive(origin.clone())),
        }

        let path = search_path(tree, links, origin)?;
        let chosen = select_subscription(registry_ref, &path, code).cloned();

        let Some(subscription) = chosen else {
            tracing::debug!(origin = %origin, code, "escalation not caught, discarded");
            return Ok(EscalationOutcome::Discarded);
        };

        let owner = subscription.owner.clone();
        let handler_scope = if subscription.interrupting {
            // The handler branch survives the cancelled scope, so it
            // attaches to the scope's former parent — or, across an
            // instance boundary, to the calling activity.
            let attach = tree
                .get(&owner)?
                .parent
                .clone()
                .or_else(|| links.caller_of(&owner).cloned());

            canceller.cancel(tree, registry_ref, links, sink, &owner)?;

            match attach {
                Some(parent) if tree.is_active(&parent) => {
                    tree.create_scope(&parent, ScopeKind::Activity)?
                }
                _ => {
                    let instance = tree.get(&owner)?.instance_id.clone();
                    tree.create_detached(instance, ScopeKind::Activity)
                }
            }
        } else {
            tree.create_scope(&owner, ScopeKind::Activity)?
        };

        let task = sink.create_task(&handler_scope, &subscription.handler_task);
        tree.get_mut(&handler_scope)?.track_task(task);

        tracing::info!(
            origin = %origin,
            code,
            caught_by = %owner,
            interrupting = subscription.interrupting,
            "escalation caught"
        );
        Ok(EscalationOutcome::Caught {
            scope: owner,
            interrupting: subscription.interrupting,
            handler_scope,
        })
    }
}
