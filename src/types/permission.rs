//! Resolved permissions for a resource.

use std::fmt::{Display, Formatter, Result as FmtResult};

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::Effect;

/// A computed permission: an effect together with the action keys it applies
/// to. Action keys may be namespaced and may use the trailing wildcard `*`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Permission {
    /// The effect to apply when one of the keys matches.
    pub effect: Effect,

    /// The action keys this permission affects.
    pub action_keys: Vec<String>,
}

impl Permission {
    pub fn new<I, S>(effect: Effect, action_keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Permission {
            effect,
            action_keys: action_keys.into_iter().map(Into::into).collect(),
        }
    }

    /// A permission allowing the given action keys.
    pub fn allow<I, S>(action_keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Permission::new(Effect::Allow, action_keys)
    }

    /// A permission denying the given action keys.
    pub fn deny<I, S>(action_keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Permission::new(Effect::Deny, action_keys)
    }
}

impl Display for Permission {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "{}[{}]", self.effect, self.action_keys.join(", "))
    }
}
