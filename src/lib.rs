// src/lib.rs
pub use condition::{
    register_condition_kind, CompositeCondition, Condition, ConditionFactory, ConditionRegistry,
    CustomCondition, EqualsCondition, ExistsCondition,
};
pub use engine::AuthorizationEngine;
pub use error::PolicyError;
pub use matchers::{ClaimAuthenticationMatcher, RoleAuthenticationMatcher};
pub use pattern::resource_pattern_matches;
pub use specifier::Specifier;
pub use traits::{
    AuthenticationMatcher, AuthorizationContext, EmptyAuthorizationContext,
    InMemoryPolicyRepository, PolicyRepository, SubjectHint, ValueAuthorizationContext,
};
pub use types::{
    AccessPolicy, AccessRule, Action, Authentication, Effect, Permission, Principal,
};

mod condition;
mod engine;
mod error;
mod matchers;
mod pattern;
mod specifier;
mod traits;
mod types;
