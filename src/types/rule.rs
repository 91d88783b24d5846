//! Access rules: one policy entry binding subjects, resources, actions and
//! conditions to an effect.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::condition::CompositeCondition;

use super::Effect;

/// A single entry of an access policy.
///
/// A rule applies to a request when the caller matches one of its subject
/// patterns, the targeted resource matches one of its resource patterns, and
/// its conditions are satisfied by the authorization context. Rules are
/// evaluated in policy order; for each requested action the first rule whose
/// action patterns match decides the effect.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(default, deny_unknown_fields, rename_all = "camelCase")]
pub struct AccessRule {
    /// An optional name used for diagnostics only.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// The effect caused when this rule matches.
    pub effect: Effect,

    /// Subject patterns: [`AccessRule::ANY`], [`AccessRule::AUTHENTICATED`],
    /// [`AccessRule::ANONYMOUS`], `principal:<name>`, or a prefix handled by
    /// a registered `AuthenticationMatcher` such as `role:<authority>`.
    pub subjects: Vec<String>,

    /// Ant-style dot-path patterns naming the resources the rule applies to.
    pub resources: Vec<String>,

    /// Action keys or trailing-wildcard action patterns.
    pub actions: Vec<String>,

    /// Additional conditions gating the rule. The empty composite is always
    /// satisfied.
    #[serde(skip_serializing_if = "CompositeCondition::is_empty")]
    #[schema(value_type = Object)]
    pub conditions: CompositeCondition,
}

impl AccessRule {
    /// Subject pattern matching any caller.
    pub const ANY: &'static str = "*";

    /// Subject pattern matching any authenticated caller.
    pub const AUTHENTICATED: &'static str = "authenticated";

    /// Subject pattern matching unauthenticated callers.
    pub const ANONYMOUS: &'static str = "anonymous";

    /// Prefix for subject patterns naming a principal.
    pub const PRINCIPAL_PREFIX: &'static str = "principal:";
}
