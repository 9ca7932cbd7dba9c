// Queue Error Types

use super::WorkItemId;
use thiserror::Error;

/// Error delivered to the caller who submitted a specific work item
///
/// `Operation` passes the wrapped operation's own error through unchanged.
/// The remaining variants are produced by the queue itself.
#[derive(Error, Debug)]
pub enum QueueError<E> {
    #[error(transparent)]
    Operation(E),

    #[error("Queue cleared before {label} ({id}) started")]
    Cleared { id: WorkItemId, label: String },

    #[error("Operation {id} panicked: {message}")]
    Panicked { id: WorkItemId, message: String },

    #[error("Operation {id} was abandoned before it settled")]
    Abandoned { id: WorkItemId },
}

impl<E> QueueError<E> {
    /// Borrow the operation's error, if that is what failed
    pub fn operation_error(&self) -> Option<&E> {
        match self {
            QueueError::Operation(e) => Some(e),
            _ => None,
        }
    }

    /// Take the operation's error, if that is what failed
    pub fn into_operation_error(self) -> Option<E> {
        match self {
            QueueError::Operation(e) => Some(e),
            _ => None,
        }
    }

    pub fn is_cleared(&self) -> bool {
        matches!(self, QueueError::Cleared { .. })
    }

    /// Whether a retry loop may re-submit after this failure
    ///
    /// Cleared and abandoned items are terminal: a cleared queue must stay empty.
    pub fn is_retryable(&self) -> bool {
        matches!(self, QueueError::Operation(_) | QueueError::Panicked { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Error, PartialEq)]
    #[error("backend said no")]
    struct BackendError;

    #[test]
    fn test_operation_error_is_transparent() {
        let err: QueueError<BackendError> = QueueError::Operation(BackendError);
        assert_eq!(err.to_string(), "backend said no");
        assert_eq!(err.operation_error(), Some(&BackendError));
        assert!(err.is_retryable());
    }

    #[test]
    fn test_cleared_is_terminal() {
        let err: QueueError<BackendError> = QueueError::Cleared {
            id: "item-7".to_string(),
            label: "sync".to_string(),
        };
        assert!(err.is_cleared());
        assert!(!err.is_retryable());
        assert!(err.to_string().contains("item-7"));
        assert_eq!(err.into_operation_error(), None);
    }

    #[test]
    fn test_panicked_is_retryable() {
        let err: QueueError<BackendError> = QueueError::Panicked {
            id: "item-1".to_string(),
            message: "boom".to_string(),
        };
        assert!(err.is_retryable());
        assert!(err.to_string().contains("boom"));
    }
}
