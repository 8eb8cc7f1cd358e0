use common::SagaId;
use thiserror::Error;

/// The record kinds the store distinguishes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceKind {
    Order,
    Payment,
    Shipment,
    Context,
}

impl ResourceKind {
    /// Returns the kind name as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            ResourceKind::Order => "order",
            ResourceKind::Payment => "payment",
            ResourceKind::Shipment => "shipment",
            ResourceKind::Context => "context",
        }
    }
}

impl std::fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Errors that can occur when interacting with the resource store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// A record with this id already exists for the kind.
    #[error("{kind} record already exists: {id}")]
    AlreadyExists { kind: ResourceKind, id: SagaId },

    /// No record with this id exists for the kind.
    #[error("{kind} record not found: {id}")]
    NotFound { kind: ResourceKind, id: SagaId },

    /// A database error occurred.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A persisted record could not be mapped back to the domain.
    #[error("Corrupt record: {0}")]
    Corrupt(#[from] domain::DomainError),
}

impl StoreError {
    /// Returns true for the duplicate-create error.
    pub fn is_already_exists(&self) -> bool {
        matches!(self, StoreError::AlreadyExists { .. })
    }

    /// Returns true for the missing-record error.
    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::NotFound { .. })
    }
}

/// Result type for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;
