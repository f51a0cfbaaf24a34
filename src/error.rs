//! Error types for the worker pool service.

use uuid::Uuid;

/// Top-level error type for the service.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Submit error: {0}")]
    Submit(#[from] SubmitError),

    #[error("Job error: {0}")]
    Job(#[from] JobError),

    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

/// Configuration-related errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid configuration value for {key}: {message}")]
    InvalidValue { key: String, message: String },
}

/// Admission errors, returned synchronously from `submit`.
///
/// A job rejected with any of these is never written to the store.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SubmitError {
    #[error("job queue is full (capacity {capacity})")]
    QueueFull { capacity: usize },

    #[error("worker pool is shut down")]
    ShutDown,

    #[error("submission cancelled by caller")]
    Cancelled,
}

/// Per-job execution failures. Recorded into the job's `error` field.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ExecutionError {
    #[error("invalid duration {input:?}: {reason}")]
    InvalidDuration { input: String, reason: String },

    #[error("invalid {kind} payload type")]
    PayloadMismatch { kind: String },

    #[error("job cancelled: worker pool is shutting down")]
    Cancelled,

    #[error("unknown job type: {kind}")]
    UnknownKind { kind: String },
}

/// Job lookup and lifecycle errors.
#[derive(Debug, thiserror::Error)]
pub enum JobError {
    #[error("job not found: {id}")]
    NotFound { id: Uuid },

    #[error("Job {id} already in state {state}, cannot transition to {target}")]
    InvalidTransition {
        id: Uuid,
        state: String,
        target: String,
    },
}

/// Boundary validation errors (bad kind, payload, filter or id).
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("type is invalid: {0:?}")]
    InvalidKind(String),

    #[error("invalid {kind} job payload: {reason}")]
    InvalidPayload { kind: String, reason: String },

    #[error("duration is required")]
    MissingDuration,

    #[error("number {0} is too large")]
    NumberTooLarge(i64),

    #[error("status cannot be empty")]
    EmptyStatus,

    #[error("invalid status: {0}")]
    InvalidStatus(String),

    #[error("invalid job ID: {0}")]
    InvalidId(String),
}

/// Result type alias for the service.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn queue_full_message() {
        let err = SubmitError::QueueFull { capacity: 3 };
        assert!(err.to_string().contains("job queue is full"));
    }

    #[test]
    fn execution_errors_render_for_records() {
        assert_eq!(
            ExecutionError::UnknownKind {
                kind: "math".into()
            }
            .to_string(),
            "unknown job type: math"
        );
        assert!(ExecutionError::Cancelled.to_string().contains("cancelled"));
    }

    #[test]
    fn wraps_into_top_level() {
        let err: Error = SubmitError::ShutDown.into();
        assert!(matches!(err, Error::Submit(SubmitError::ShutDown)));
    }
}
