//! Error types for the outpass workflow.

use thiserror::Error;

use crate::domain::request::OutpassStatus;

/// Result type alias using the outpass error type.
pub type Result<T> = std::result::Result<T, OutpassError>;

/// Main error type for the outpass workflow.
#[derive(Error, Debug)]
pub enum OutpassError {
    /// A required submission field is absent or blank
    #[error("Missing required field: {0}")]
    MissingField(String),

    /// Validation error (e.g., unrecognized decision value, malformed body)
    #[error("Validation error: {0}")]
    ValidationError(String),

    /// No record exists for the given id
    #[error("Outpass request not found: {0}")]
    NotFound(String),

    /// The request already reached a terminal status
    #[error("Outpass request has already been {}", .0.as_str().to_lowercase())]
    AlreadyDecided(OutpassStatus),

    /// A record with this id already exists
    #[error("Outpass request already exists: {0}")]
    DuplicateRequest(String),

    /// Credential rendering or link creation failed
    #[error("Credential issuance failed: {0}")]
    IssuanceError(String),

    /// A notification channel failed to deliver
    #[error("Notification transport failed: {0}")]
    TransportError(String),

    /// Unexpected failure after validation passed
    #[error("Internal error: {0}")]
    Internal(String),

    /// General error from anyhow
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl OutpassError {
    /// True for failures caused by the caller's input rather than by this service.
    ///
    /// These are always detected before any mutation.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            OutpassError::MissingField(_)
                | OutpassError::ValidationError(_)
                | OutpassError::NotFound(_)
                | OutpassError::AlreadyDecided(_)
                | OutpassError::DuplicateRequest(_)
        )
    }
}
