use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error, Serialize, Deserialize)]
pub enum PolicyError {
    #[error("failed to parse specifier: {0}")]
    ParseError(String),

    #[error("unknown condition kind: {0}")]
    UnknownConditionKind(String),

    #[error("invalid policy: {0}")]
    InvalidPolicy(String),

    #[error("specifier index {index} out of bounds for length {length}")]
    IndexOutOfBounds { index: usize, length: usize },

    #[error("failed to lock condition registry: {0}")]
    LockError(String),
}

impl From<serde_json::Error> for PolicyError {
    fn from(err: serde_json::Error) -> Self {
        PolicyError::InvalidPolicy(err.to_string())
    }
}
