//! Saga error types.

use domain::DomainError;
use store::StoreError;
use thiserror::Error;

/// Errors that can occur while coordinating a saga.
///
/// Threshold results (`Exceeded`) are deliberately absent: they are
/// business outcomes carried as data through the decision table, never
/// raised as errors.
#[derive(Debug, Error)]
pub enum SagaError {
    /// Domain validation rejected the input; terminal, never retried.
    #[error("{0}")]
    InvalidInput(#[from] DomainError),

    /// A transient backend failure; eligible for retry where a retry
    /// policy applies.
    #[error("Transient failure: {0}")]
    Transient(String),

    /// The retry budget for a step was exhausted.
    #[error("Retries exhausted after {attempts} attempts: {last_error}")]
    RetriesExhausted { attempts: u32, last_error: String },

    /// The resource store failed.
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// A notification was missing a required detail field.
    #[error("Notification missing detail field: {0}")]
    MissingField(&'static str),

    /// A wire notification carried an unknown routing pair.
    #[error("Unrecognized notification routing: ({origin}, {detail_type})")]
    Unroutable { origin: String, detail_type: String },
}

impl SagaError {
    /// Returns true for the retryable error class.
    pub fn is_transient(&self) -> bool {
        matches!(self, SagaError::Transient(_))
    }

    /// Returns true for domain validation failures.
    pub fn is_invalid_input(&self) -> bool {
        matches!(self, SagaError::InvalidInput(_))
    }
}

/// Result type for saga operations.
pub type Result<T> = std::result::Result<T, SagaError>;
