//! The authentication state of the caller being authorized.

use std::fmt::{Display, Formatter, Result as FmtResult};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use utoipa::ToSchema;

/// An already-authenticated identity: its principal name, granted
/// authorities and token claims. Verification of the identity itself is out
/// of scope; the engine consumes whatever the authentication layer produced.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Principal {
    /// The principal name, e.g. a user id.
    pub name: String,

    /// Granted authorities (roles), matched by `role:<authority>` subjects.
    pub authorities: Vec<String>,

    /// Token claims, matched by `claim:<expression>` subjects.
    #[schema(value_type = Object)]
    pub claims: Map<String, Value>,
}

impl Principal {
    pub fn new<T: Into<String>>(name: T) -> Self {
        Principal {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn with_authorities<I, S>(mut self, authorities: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.authorities = authorities.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_claims(mut self, claims: Map<String, Value>) -> Self {
        self.claims = claims;
        self
    }
}

/// The authentication state accompanying an authorization request.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
pub enum Authentication {
    /// No authenticated identity is present.
    #[default]
    Anonymous,

    /// The request carries an authenticated identity.
    Authenticated(Principal),
}

impl Authentication {
    pub fn is_authenticated(&self) -> bool {
        matches!(self, Authentication::Authenticated(_))
    }

    /// The authenticated principal, if any.
    pub fn principal(&self) -> Option<&Principal> {
        match self {
            Authentication::Anonymous => None,
            Authentication::Authenticated(principal) => Some(principal),
        }
    }
}

impl Display for Authentication {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            Authentication::Anonymous => write!(f, "anonymous"),
            Authentication::Authenticated(principal) => write!(f, "{}", principal.name),
        }
    }
}
