//! Typed errors returned by the harvest engine

use thiserror::Error;

/// Errors produced by engine operations.
///
/// Every public operation in this crate returns these as values; callers are
/// expected to propagate them unchanged rather than substitute defaults.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EngineError {
    #[error("{resource} not found: {key}")]
    NotFound { resource: &'static str, key: String },

    #[error("Invalid {field}: {message}")]
    InvalidInput { field: String, message: String },

    #[error("Concurrency conflict: {0}")]
    ConcurrencyConflict(String),

    #[error("Expired: {0}")]
    Expired(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Grading strategy unavailable: {0}")]
    GradingUnavailable(String),
}

impl EngineError {
    pub fn crop_not_found(key: impl Into<String>) -> Self {
        EngineError::NotFound {
            resource: "Crop",
            key: key.into(),
        }
    }

    pub fn invalid(field: impl Into<String>, message: impl Into<String>) -> Self {
        EngineError::InvalidInput {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// Result alias for engine operations
pub type EngineResult<T> = Result<T, EngineError>;
