//! The seams between the decision engine and its host application.

use std::sync::{Arc, RwLock};

use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::ToSchema;

use crate::specifier::Specifier;
use crate::types::{AccessPolicy, Principal};

/// Supplies the policy the engine decides against. Implementations are free
/// to load from wherever suits the application; the engine fetches the
/// current policy once per decision, so swapping policies takes effect on
/// the next call.
pub trait PolicyRepository: Send + Sync {
    fn current_policy(&self) -> AccessPolicy;
}

/// A [`PolicyRepository`] holding a single replaceable policy in memory.
#[derive(Debug, Default)]
pub struct InMemoryPolicyRepository {
    policy: Arc<RwLock<AccessPolicy>>,
}

impl InMemoryPolicyRepository {
    pub fn new(policy: AccessPolicy) -> Self {
        InMemoryPolicyRepository {
            policy: Arc::new(RwLock::new(policy)),
        }
    }

    /// Replace the current policy. Decisions already in flight keep the
    /// policy they started with.
    pub fn replace(&self, policy: AccessPolicy) {
        match self.policy.write() {
            Ok(mut current) => *current = policy,
            Err(poisoned) => *poisoned.into_inner() = policy,
        }
    }
}

impl PolicyRepository for InMemoryPolicyRepository {
    fn current_policy(&self) -> AccessPolicy {
        match self.policy.read() {
            Ok(policy) => policy.clone(),
            Err(poisoned) => (*poisoned.into_inner()).clone(),
        }
    }
}

/// Resolves condition targets to the values of the entity under
/// authorization.
pub trait AuthorizationContext {
    /// The value the given specifier points at, or `None` if it cannot be
    /// resolved.
    fn resolve_value(&self, key: &Specifier) -> Option<Value>;
}

/// A context resolving nothing. Useful when a decision only depends on
/// subjects, resources and actions.
#[derive(Debug, Clone, Copy, Default)]
pub struct EmptyAuthorizationContext;

impl AuthorizationContext for EmptyAuthorizationContext {
    fn resolve_value(&self, _: &Specifier) -> Option<Value> {
        None
    }
}

/// A context resolving specifiers by walking a JSON document, one segment
/// per object level.
#[derive(Debug, Clone)]
pub struct ValueAuthorizationContext {
    root: Value,
}

impl ValueAuthorizationContext {
    pub fn new(root: Value) -> Self {
        ValueAuthorizationContext { root }
    }
}

impl AuthorizationContext for ValueAuthorizationContext {
    fn resolve_value(&self, key: &Specifier) -> Option<Value> {
        let mut current = &self.root;
        for segment in key.segments() {
            current = current.as_object()?.get(segment)?;
        }
        Some(current.clone())
    }
}

/// A completion hint for one class of subject patterns, surfaced to policy
/// editors.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct SubjectHint {
    /// The pattern prefix, e.g. `role:`.
    pub prefix: String,

    /// A human-readable description of what the prefix matches.
    pub description: String,
}

impl SubjectHint {
    pub fn new<P: Into<String>, D: Into<String>>(prefix: P, description: D) -> Self {
        SubjectHint {
            prefix: prefix.into(),
            description: description.into(),
        }
    }
}

/// Matches one class of subject patterns against an authenticated principal.
/// The engine consults its matchers for any subject pattern that is not one
/// of the built-in literals.
pub trait AuthenticationMatcher: Send + Sync {
    /// Whether the principal satisfies any of the given subject patterns.
    /// Patterns of foreign classes must be ignored, not rejected.
    fn matches(&self, principal: &Principal, subjects: &[String]) -> bool;

    /// The hints describing the pattern class this matcher supports.
    fn hints(&self) -> Vec<SubjectHint>;
}
