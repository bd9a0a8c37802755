//! Subscription registry: boundary-catch declarations bound to scopes
//!
//! Registration follows scope lifecycle — a subscription is added
//! when its owning scope starts and removed when the scope
//! terminates. Selecting among the subscriptions of one scope is a
//! pure function so the tie-break rule stays independently testable.

use std::collections::HashMap;

use procflow_types::{EscalationSubscription, ScopeId};

/// Registry of escalation subscriptions, keyed by owning scope
#[derive(Clone, Debug, Default)]
pub struct SubscriptionRegistry {
    by_scope: HashMap<ScopeId, Vec<EscalationSubscription>>,
}

impl SubscriptionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a subscription under its owning scope
    pub fn register(&mut self, subscription: EscalationSubscription) {
        self.by_scope
            .entry(subscription.owner.clone())
            .or_default()
            .push(subscription);
    }

    /// Remove every subscription owned by a scope. Called
    /// automatically when the scope terminates.
    pub fn unregister_scope(&mut self, scope: &ScopeId) {
        self.by_scope.remove(scope);
    }

    /// Subscriptions owned by a scope (possibly empty)
    pub fn subscriptions_of(&self, scope: &ScopeId) -> &[EscalationSubscription] {
        self.by_scope.get(scope).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Total number of registered subscriptions
    pub fn len(&self) -> usize {
        self.by_scope.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.by_scope.is_empty()
    }
}

/// Select the best matching subscription among those of one scope.
///
/// A specific-code match is preferred over a catch-all so that
/// authors get a predictable override mechanism. At most one specific
/// filter can match a given code, so no further tie-break is needed.
pub fn best_match<'a>(
    subscriptions: &'a [EscalationSubscription],
    code: &str,
) -> Option<&'a EscalationSubscription> {
    let mut catch_all = None;
    for sub in subscriptions {
        if !sub.matches(code) {
            continue;
        }
        if sub.filter.is_catch_all() {
            catch_all.get_or_insert(sub);
        } else {
            return Some(sub);
        }
    }
    catch_all
}

#[cfg(test)]
mod tests {
    use super::*;
    use procflow_types::CodeFilter;

    fn sub(owner: &str, filter: CodeFilter, handler: &str) -> EscalationSubscription {
        EscalationSubscription::new(ScopeId::new(owner), filter, false, handler)
    }

    #[test]
    fn test_register_and_lookup() {
        let mut registry = SubscriptionRegistry::new();
        registry.register(sub("s1", CodeFilter::CatchAll, "h1"));
        registry.register(sub("s1", CodeFilter::code("x"), "h2"));
        registry.register(sub("s2", CodeFilter::CatchAll, "h3"));

        assert_eq!(registry.subscriptions_of(&ScopeId::new("s1")).len(), 2);
        assert_eq!(registry.subscriptions_of(&ScopeId::new("s2")).len(), 1);
        assert!(registry.subscriptions_of(&ScopeId::new("s3")).is_empty());
        assert_eq!(registry.len(), 3);
    }

    #[test]
    fn test_unregister_scope_removes_all() {
        let mut registry = SubscriptionRegistry::new();
        registry.register(sub("s1", CodeFilter::CatchAll, "h1"));
        registry.register(sub("s1", CodeFilter::code("x"), "h2"));

        registry.unregister_scope(&ScopeId::new("s1"));
        assert!(registry.subscriptions_of(&ScopeId::new("s1")).is_empty());
        assert!(registry.is_empty());
    }

    #[test]
    fn test_best_match_specific_beats_catch_all() {
        let subs = vec![
            sub("s", CodeFilter::CatchAll, "generic"),
            sub("s", CodeFilter::code("overload"), "specific"),
        ];

        let chosen = best_match(&subs, "overload").unwrap();
        assert_eq!(chosen.handler_task, "specific");

        // Order must not matter
        let reversed: Vec<_> = subs.into_iter().rev().collect();
        let chosen = best_match(&reversed, "overload").unwrap();
        assert_eq!(chosen.handler_task, "specific");
    }

    #[test]
    fn test_best_match_falls_back_to_catch_all() {
        let subs = vec![
            sub("s", CodeFilter::code("overload"), "specific"),
            sub("s", CodeFilter::CatchAll, "generic"),
        ];
        let chosen = best_match(&subs, "unrelated").unwrap();
        assert_eq!(chosen.handler_task, "generic");
    }

    #[test]
    fn test_best_match_none_when_nothing_matches() {
        let subs = vec![sub("s", CodeFilter::code("a"), "h")];
        assert!(best_match(&subs, "b").is_none());
        assert!(best_match(&[], "a").is_none());
    }

    #[cfg(test)]
    mod properties {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            /// Whatever is selected actually matches the code.
            #[test]
            fn selected_subscription_matches(code in "[a-z]{0,8}", filters in prop::collection::vec("[a-z]{0,8}", 0..6)) {
                let subs: Vec<_> = filters
                    .iter()
                    .map(|f| sub("s", CodeFilter::code(f.clone()), f))
                    .collect();
                if let Some(chosen) = best_match(&subs, &code) {
                    prop_assert!(chosen.matches(&code));
                }
            }

            /// With a catch-all present, a match always exists, and a
            /// specific match wins over it.
            #[test]
            fn catch_all_never_shadows_specific(code in "[a-z]{1,8}") {
                let subs = vec![
                    sub("s", CodeFilter::CatchAll, "generic"),
                    sub("s", CodeFilter::code(code.clone()), "specific"),
                ];
                let chosen = best_match(&subs, &code).unwrap();
                prop_assert_eq!(chosen.handler_task.as_str(), "specific");
            }
        }
    }
}
