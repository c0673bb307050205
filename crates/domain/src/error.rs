//! Error taxonomy surfaced to callers

use thiserror::Error;

use crate::model::Response;
use crate::ports::{AuthError, HashError, StoreError};

/// Errors returned by service operations
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("Field {0} is missing, or empty.")]
    FieldMissing(&'static str),
    #[error("{0}")]
    FieldError(String),
    #[error("Invalid token.")]
    InvalidToken(#[source] AuthError),
    #[error("Invalid email or password.")]
    InvalidCredentials,
    #[error("User does not exist.")]
    UserNotFound,
    #[error("User's email already exists.")]
    AlreadyExists,
    #[error("Store failure: {0}")]
    Store(#[from] StoreError),
    #[error("Internal error: {0}")]
    Internal(String),
}

impl ServiceError {
    /// Machine readable classification
    pub fn response_type(&self) -> &'static str {
        match self {
            ServiceError::FieldMissing(_) => "FIELD_MISSING",
            ServiceError::FieldError(_) => "FIELD_ERROR",
            ServiceError::InvalidToken(_) => "INVALID_TOKEN",
            ServiceError::InvalidCredentials => "INVALID_CREDENTIALS",
            ServiceError::UserNotFound => "USER_DOES_NOT_EXIST",
            ServiceError::AlreadyExists => "USER_ALREADY_EXISTS",
            ServiceError::Store(_) | ServiceError::Internal(_) => "UNKNOWN_ERROR",
        }
    }

    /// HTTP-equivalent status code
    pub fn status_code(&self) -> u16 {
        match self {
            ServiceError::FieldMissing(_) | ServiceError::FieldError(_) => 400,
            ServiceError::InvalidToken(_) | ServiceError::InvalidCredentials => 401,
            ServiceError::UserNotFound => 404,
            ServiceError::AlreadyExists => 409,
            ServiceError::Store(_) | ServiceError::Internal(_) => 500,
        }
    }

    /// Message safe to hand back to a caller; store internals stay opaque
    pub fn public_message(&self) -> String {
        match self {
            ServiceError::Store(_) | ServiceError::Internal(_) => {
                "Something went wrong, please try again later.".to_string()
            }
            other => other.to_string(),
        }
    }

    /// Failure response carrying this error's classification and no payload
    pub fn into_response(self) -> Response {
        let msg = self.public_message();
        Response {
            success: false,
            ..Default::default()
        }
        .with_type(self.response_type(), msg)
    }
}

impl From<HashError> for ServiceError {
    fn from(e: HashError) -> Self {
        ServiceError::Internal(e.to_string())
    }
}
