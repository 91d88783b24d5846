//! Access policies: an ordered rule list plus a default effect.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::{AccessRule, Effect};

/// A complete access policy snapshot.
///
/// Rule order is significant: for every requested action the first matching
/// rule wins. The default effect applies to actions no rule matches.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(default, deny_unknown_fields, rename_all = "camelCase")]
pub struct AccessPolicy {
    /// The effect applied when no rule matches a requested action.
    pub default_effect: Effect,

    /// A human-readable description. Not used during evaluation.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// The instant from which this policy is meant to apply. Not used during
    /// evaluation; policy activation is the concern of the policy source.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub valid_from: Option<DateTime<Utc>>,

    /// The ordered list of rules.
    pub rules: Vec<AccessRule>,
}
