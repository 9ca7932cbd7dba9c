// Central Error Type for construction and configuration

use thiserror::Error;

/// Application-level error type
///
/// Raised by constructors, the registry and config parsing. Failures of
/// queued operations never use this type; they travel through
/// [`crate::domain::QueueError`] to the submitting caller.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AppError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),
}

/// Result type alias using AppError
pub type Result<T> = std::result::Result<T, AppError>;
