//! Domain error types.

use thiserror::Error;

/// Errors raised by domain validation and parsing.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DomainError {
    /// A payment amount was negative.
    #[error("Invalid payment amount.")]
    InvalidAmount(i64),

    /// A shipping quantity was negative.
    #[error("Invalid shipping quantity.")]
    InvalidQuantity(i64),

    /// A persisted status string did not name a known status.
    #[error("Unknown status: {0}")]
    UnknownStatus(String),
}
