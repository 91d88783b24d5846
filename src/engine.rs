//! The policy decision engine.

use std::collections::HashSet;
use std::sync::Arc;

use itertools::Itertools;
use tracing::debug;

use crate::matchers::{ClaimAuthenticationMatcher, RoleAuthenticationMatcher};
use crate::pattern::resource_pattern_matches;
use crate::traits::{AuthenticationMatcher, AuthorizationContext, PolicyRepository, SubjectHint};
use crate::types::{AccessPolicy, AccessRule, Action, Authentication, Effect, Permission, Principal};

/// Decides access requests against the current policy of a
/// [`PolicyRepository`].
///
/// The engine itself is stateless; every decision works on an immutable
/// policy snapshot, so it can be shared freely across threads.
pub struct AuthorizationEngine {
    repository: Arc<dyn PolicyRepository>,
    matchers: Vec<Arc<dyn AuthenticationMatcher>>,
}

impl AuthorizationEngine {
    /// An engine with the built-in role and claim subject matchers.
    pub fn new(repository: Arc<dyn PolicyRepository>) -> Self {
        AuthorizationEngine::with_matchers(
            repository,
            vec![
                Arc::new(RoleAuthenticationMatcher),
                Arc::new(ClaimAuthenticationMatcher),
            ],
        )
    }

    /// An engine with an explicit matcher list, replacing the built-ins.
    pub fn with_matchers(
        repository: Arc<dyn PolicyRepository>,
        matchers: Vec<Arc<dyn AuthenticationMatcher>>,
    ) -> Self {
        AuthorizationEngine {
            repository,
            matchers,
        }
    }

    /// Decide whether the given actions on the given resource shall be
    /// allowed, against the repository's current policy.
    ///
    /// Rules are filtered by subject, resource and conditions; for each
    /// action the first rule whose action patterns match decides. A single
    /// matching DENY denies the whole request. If every action found a
    /// matching ALLOW the request is allowed; otherwise the policy's default
    /// effect applies. The empty action set is vacuously allowed.
    pub fn is_access_allowed(
        &self,
        resource: &str,
        actions: &HashSet<Action>,
        authentication: &Authentication,
        context: &dyn AuthorizationContext,
    ) -> bool {
        let policy = self.repository.current_policy();
        self.is_access_allowed_with_policy(resource, actions, authentication, context, &policy)
    }

    /// Like [`AuthorizationEngine::is_access_allowed`], but against an
    /// explicit policy snapshot.
    pub fn is_access_allowed_with_policy(
        &self,
        resource: &str,
        actions: &HashSet<Action>,
        authentication: &Authentication,
        context: &dyn AuthorizationContext,
        policy: &AccessPolicy,
    ) -> bool {
        let matching_rules = self.matching_rules(policy, resource, authentication, context);

        // decide each action individually
        let mut all_matched = true;
        for action in actions {
            let matching_rule = matching_rules
                .iter()
                .find(|r| matches_actions(action.key(), &r.actions));

            match matching_rule {
                // deny means deny
                Some(rule) if rule.effect == Effect::Deny => {
                    debug!(
                        event = "decision",
                        resource,
                        action = %action,
                        rule = rule.name.as_deref(),
                        principal = %authentication,
                        effect = %Effect::Deny,
                    );
                    return false;
                }
                Some(_) => {}
                None => all_matched = false,
            }
        }

        let effect = if all_matched {
            Effect::Allow
        } else {
            policy.default_effect
        };

        debug!(
            event = "decision",
            resource,
            actions = ?actions,
            principal = %authentication,
            effect = %effect,
        );

        effect == Effect::Allow
    }

    /// Compute the permissions applying to the given resource, in rule
    /// order. Successive permissions with the same effect are combined into
    /// one; when the default effect is ALLOW, a final `ALLOW [*]` is
    /// appended before combining.
    pub fn permissions(
        &self,
        resource: &str,
        authentication: &Authentication,
        context: &dyn AuthorizationContext,
    ) -> Vec<Permission> {
        let policy = self.repository.current_policy();

        let rule_permissions = self
            .matching_rules(&policy, resource, authentication, context)
            .into_iter()
            .map(|r| Permission::new(r.effect, r.actions.clone()));

        let default_permission = (policy.default_effect == Effect::Allow)
            .then(|| Permission::allow([Action::ANY_KEY]));

        rule_permissions
            .chain(default_permission)
            .coalesce(|previous, next| {
                if previous.effect == next.effect {
                    let mut combined = previous.action_keys;
                    combined.extend(next.action_keys);
                    Ok(Permission::new(previous.effect, combined))
                } else {
                    Err((previous, next))
                }
            })
            .collect()
    }

    /// The subject pattern hints supported by this engine: the built-in
    /// patterns plus whatever the registered matchers contribute.
    pub fn subject_hints(&self) -> Vec<SubjectHint> {
        let core = [
            SubjectHint::new(AccessRule::ANY, "anything"),
            SubjectHint::new(AccessRule::AUTHENTICATED, "any authenticated principal"),
            SubjectHint::new(
                AccessRule::PRINCIPAL_PREFIX,
                "name of a principal (e.g. user id)",
            ),
            SubjectHint::new(AccessRule::ANONYMOUS, "anonymous"),
        ];

        core.into_iter()
            .chain(self.matchers.iter().flat_map(|m| m.hints()))
            .collect()
    }

    /// The rules applying to this request: subject, resource and conditions
    /// must match, in policy order.
    fn matching_rules<'a>(
        &self,
        policy: &'a AccessPolicy,
        resource: &str,
        authentication: &Authentication,
        context: &dyn AuthorizationContext,
    ) -> Vec<&'a AccessRule> {
        policy
            .rules
            .iter()
            .filter(|r| self.matches_subjects(r, authentication))
            .filter(|r| matches_resource(r, resource))
            .filter(|r| satisfies_conditions(r, context))
            .collect()
    }

    fn matches_subjects(&self, rule: &AccessRule, authentication: &Authentication) -> bool {
        let matched = match authentication.principal() {
            Some(principal) => self.matches_principal(rule, principal),
            None => {
                rule.subjects.iter().any(|s| {
                    s == AccessRule::ANY || s == AccessRule::ANONYMOUS
                })
            }
        };

        debug!(
            event = "match_subjects",
            rule = rule.name.as_deref(),
            principal = %authentication,
            matched,
        );

        matched
    }

    fn matches_principal(&self, rule: &AccessRule, principal: &Principal) -> bool {
        let named = format!("{}{}", AccessRule::PRINCIPAL_PREFIX, principal.name);

        rule.subjects.iter().any(|s| {
            s == AccessRule::ANY || s == AccessRule::AUTHENTICATED || s == &named
        }) || self
            .matchers
            .iter()
            .any(|m| m.matches(principal, &rule.subjects))
    }
}

fn matches_resource(rule: &AccessRule, resource: &str) -> bool {
    let matched = rule
        .resources
        .iter()
        .any(|pattern| resource_pattern_matches(pattern, resource));

    debug!(
        event = "match_resource",
        rule = rule.name.as_deref(),
        resource,
        matched,
    );

    matched
}

fn satisfies_conditions(rule: &AccessRule, context: &dyn AuthorizationContext) -> bool {
    let matched = rule.conditions.matches(context);

    debug!(
        event = "match_conditions",
        rule = rule.name.as_deref(),
        matched,
    );

    matched
}

/// Match an action key against a rule's action patterns: the universal `*`,
/// trivial key equality, or a trailing-wildcard pattern.
fn matches_actions(key: &str, actions: &[String]) -> bool {
    actions.iter().any(|a| a == Action::ANY_KEY || a == key)
        || matches_wildcard_action(key, actions)
}

/// Trailing-wildcard matching: `ns:*` matches all keys starting with `ns:`,
/// `ns:sub:*` all keys starting with `ns:sub:` etc.
fn matches_wildcard_action(key: &str, actions: &[String]) -> bool {
    let mut prefix = String::with_capacity(key.len() + 2);
    for part in key.split(':') {
        prefix.push_str(part);
        prefix.push_str(":*");

        if actions.iter().any(|a| a == &prefix) {
            return true;
        }

        prefix.pop();
    }

    false
}
