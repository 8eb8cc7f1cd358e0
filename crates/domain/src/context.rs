//! Per-saga context projection for the choreographed variant.

use common::SagaId;
use serde::{Deserialize, Serialize};

use crate::error::DomainError;

/// What a participant has reported into the context so far.
///
/// A column is unset until the participant's first notification arrives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ContextStatus {
    /// The participant's record was created.
    Created,

    /// The participant processed successfully.
    Processed,

    /// The participant reported a failure outcome.
    Error,

    /// The participant was reconciled after a sibling failure.
    Reconciled,
}

impl ContextStatus {
    /// Returns the status name as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            ContextStatus::Created => "Created",
            ContextStatus::Processed => "Processed",
            ContextStatus::Error => "Error",
            ContextStatus::Reconciled => "Reconciled",
        }
    }
}

impl std::fmt::Display for ContextStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for ContextStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Created" => Ok(ContextStatus::Created),
            "Processed" => Ok(ContextStatus::Processed),
            "Error" => Ok(ContextStatus::Error),
            "Reconciled" => Ok(ContextStatus::Reconciled),
            other => Err(DomainError::UnknownStatus(other.to_string())),
        }
    }
}

/// Denormalized view of one saga instance, keyed by saga id.
///
/// The context keeper is the only writer. It substitutes for the
/// orchestrator's call stack: every inbound notification updates one
/// column, and the keeper inspects the projected pair to decide when
/// enough information has arrived to proceed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SagaContext {
    pub id: SagaId,
    pub amount: i64,
    pub quantity: i64,
    pub order: Option<ContextStatus>,
    pub payment: Option<ContextStatus>,
    pub shipping: Option<ContextStatus>,
}

impl SagaContext {
    /// Creates a fresh context with no participants reported yet.
    pub fn new(id: SagaId, amount: i64, quantity: i64) -> Self {
        Self {
            id,
            amount,
            quantity,
            order: None,
            payment: None,
            shipping: None,
        }
    }

    /// Returns true once both sibling records have been created.
    pub fn both_created(&self) -> bool {
        self.payment == Some(ContextStatus::Created)
            && self.shipping == Some(ContextStatus::Created)
    }

    /// Returns the processing outcome pair once both siblings have
    /// reported either `Processed` or `Error`, and `None` before that.
    pub fn processing_pair(&self) -> Option<(ContextStatus, ContextStatus)> {
        match (self.payment, self.shipping) {
            (
                Some(p @ (ContextStatus::Processed | ContextStatus::Error)),
                Some(s @ (ContextStatus::Processed | ContextStatus::Error)),
            ) => Some((p, s)),
            _ => None,
        }
    }
}
