//! Saga state machine.

use serde::{Deserialize, Serialize};

/// The state of a saga instance, driven by sub-resource outcomes.
///
/// State transitions:
/// ```text
/// Created ──► PendingCreate ──► PendingProcess ──┬──► Completed ────► Processed
///                 │                              └──► Reconciling ──► OnHold
///                 └────────────► Failed (create failure / retries exhausted)
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum SagaState {
    /// Saga instance minted, nothing persisted yet.
    #[default]
    Created,

    /// The three pending records are being created.
    PendingCreate,

    /// Payment and shipment processing are in flight.
    PendingProcess,

    /// Both siblings processed; the order is being finalized.
    Completed,

    /// At least one sibling failed; compensations are in flight.
    Reconciling,

    /// Everything processed (terminal state).
    Processed,

    /// Compensated after a sibling failure (terminal state).
    OnHold,

    /// Hard failure before the siblings settled (terminal state).
    Failed,
}

impl SagaState {
    /// Returns true if this is a terminal state.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            SagaState::Processed | SagaState::OnHold | SagaState::Failed
        )
    }

    /// Returns true while compensation is still required or running.
    pub fn is_reconciling(&self) -> bool {
        matches!(self, SagaState::Reconciling)
    }

    /// Returns the state name as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            SagaState::Created => "Created",
            SagaState::PendingCreate => "PendingCreate",
            SagaState::PendingProcess => "PendingProcess",
            SagaState::Completed => "Completed",
            SagaState::Reconciling => "Reconciling",
            SagaState::Processed => "Processed",
            SagaState::OnHold => "OnHold",
            SagaState::Failed => "Failed",
        }
    }
}

impl std::fmt::Display for SagaState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_state_is_created() {
        assert_eq!(SagaState::default(), SagaState::Created);
    }

    #[test]
    fn test_terminal_states() {
        assert!(!SagaState::Created.is_terminal());
        assert!(!SagaState::PendingCreate.is_terminal());
        assert!(!SagaState::PendingProcess.is_terminal());
        assert!(!SagaState::Completed.is_terminal());
        assert!(!SagaState::Reconciling.is_terminal());
        assert!(SagaState::Processed.is_terminal());
        assert!(SagaState::OnHold.is_terminal());
        assert!(SagaState::Failed.is_terminal());
    }

    #[test]
    fn test_reconciling() {
        assert!(SagaState::Reconciling.is_reconciling());
        assert!(!SagaState::Completed.is_reconciling());
        assert!(!SagaState::OnHold.is_reconciling());
    }

    #[test]
    fn test_display() {
        assert_eq!(SagaState::PendingProcess.to_string(), "PendingProcess");
        assert_eq!(SagaState::OnHold.to_string(), "OnHold");
    }

    #[test]
    fn test_serialization() {
        let state = SagaState::Reconciling;
        let json = serde_json::to_string(&state).unwrap();
        let deserialized: SagaState = serde_json::from_str(&json).unwrap();
        assert_eq!(state, deserialized);
    }
}
