//! Actions subject to permission checks.

use std::fmt::{Display, Formatter, Result as FmtResult};

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// An action names the type of interaction with a resource that is the
/// subject of a permission check. The only requirement is a unique key;
/// uniqueness can be helped along by namespacing the key with `:`, e.g.
/// `document:metadata:read`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
pub struct Action(String);

impl Action {
    /// The key of the action matching all other actions.
    pub const ANY_KEY: &'static str = "*";

    /// Create an action with the given key.
    pub fn of<T: Into<String>>(key: T) -> Self {
        Action(key.into())
    }

    /// The action matching all other actions.
    pub fn any() -> Self {
        Action::of(Self::ANY_KEY)
    }

    /// The action's unique key.
    pub fn key(&self) -> &str {
        &self.0
    }
}

impl Display for Action {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for Action {
    fn from(key: &str) -> Self {
        Action::of(key)
    }
}

impl From<String> for Action {
    fn from(key: String) -> Self {
        Action::of(key)
    }
}
