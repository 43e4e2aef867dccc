use thiserror::Error;

use crate::application::repos::ApiError;

/// Failure kinds surfaced to callers of the client.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ClientError {
    #[error("{entity} not found")]
    NotFound { entity: &'static str },
    #[error("sign in required")]
    Unauthorized,
    #[error("not allowed to modify {entity}")]
    Forbidden { entity: &'static str },
    #[error("invalid input: {0}")]
    Validation(String),
    #[error(transparent)]
    Transport(ApiError),
}

impl ClientError {
    /// Classifies a transport failure for an operation on `entity`.
    pub fn from_api(err: ApiError, entity: &'static str) -> Self {
        match err {
            ApiError::NotFound => Self::NotFound { entity },
            ApiError::Unauthorized => Self::Unauthorized,
            ApiError::Forbidden => Self::Forbidden { entity },
            other => Self::Transport(other),
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}
