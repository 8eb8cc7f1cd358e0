//! Status state machines for the three saga records.

use serde::{Deserialize, Serialize};

use crate::error::DomainError;

/// The status of an Order record.
///
/// Transitions:
/// ```text
/// Pending ──┬──► Processed
///           └──► OnHold
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum OrderStatus {
    /// Order has been recorded but the siblings have not settled yet.
    #[default]
    Pending,

    /// Payment and shipment both processed (terminal state).
    Processed,

    /// At least one sibling failed and was compensated (terminal state).
    OnHold,
}

impl OrderStatus {
    /// Returns true if this is a terminal state.
    pub fn is_terminal(&self) -> bool {
        matches!(self, OrderStatus::Processed | OrderStatus::OnHold)
    }

    /// Returns the status name as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "Pending",
            OrderStatus::Processed => "Processed",
            OrderStatus::OnHold => "OnHold",
        }
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for OrderStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Pending" => Ok(OrderStatus::Pending),
            "Processed" => Ok(OrderStatus::Processed),
            "OnHold" => Ok(OrderStatus::OnHold),
            other => Err(DomainError::UnknownStatus(other.to_string())),
        }
    }
}

/// The status of a Payment record.
///
/// Transitions:
/// ```text
/// Pending ──┬──► Processed ──► OnHold   (reconciled: sibling failed)
///           ├──► Exceeded
///           ├──► OnHold
///           └──► Reconciled
/// ```
///
/// `Processed → OnHold` is the only transition out of a terminal status,
/// and only reconciliation performs it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum PaymentStatus {
    /// Payment recorded, not yet processed.
    #[default]
    Pending,

    /// Amount was within the limit (terminal unless the sibling failed).
    Processed,

    /// Amount was over the limit; a valid business outcome, not a fault.
    Exceeded,

    /// Compensated because a sibling failed (terminal state).
    OnHold,

    /// Explicitly reconciled to a caller-supplied terminal state.
    Reconciled,
}

impl PaymentStatus {
    /// Returns true if this is a terminal state.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            PaymentStatus::Processed | PaymentStatus::OnHold | PaymentStatus::Reconciled
        )
    }

    /// Returns the status name as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Pending => "Pending",
            PaymentStatus::Processed => "Processed",
            PaymentStatus::Exceeded => "Exceeded",
            PaymentStatus::OnHold => "OnHold",
            PaymentStatus::Reconciled => "Reconciled",
        }
    }
}

impl std::fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for PaymentStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Pending" => Ok(PaymentStatus::Pending),
            "Processed" => Ok(PaymentStatus::Processed),
            "Exceeded" => Ok(PaymentStatus::Exceeded),
            "OnHold" => Ok(PaymentStatus::OnHold),
            "Reconciled" => Ok(PaymentStatus::Reconciled),
            other => Err(DomainError::UnknownStatus(other.to_string())),
        }
    }
}

/// The status of a Shipment record.
///
/// Same shape as [`PaymentStatus`]; the two are distinct types so a
/// payment status can never be written to a shipment record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum ShipmentStatus {
    /// Shipment recorded, not yet processed.
    #[default]
    Pending,

    /// Quantity was within the limit (terminal unless the sibling failed).
    Processed,

    /// Quantity was over the limit; a valid business outcome, not a fault.
    Exceeded,

    /// Compensated because a sibling failed (terminal state).
    OnHold,

    /// Explicitly reconciled to a caller-supplied terminal state.
    Reconciled,
}

impl ShipmentStatus {
    /// Returns true if this is a terminal state.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            ShipmentStatus::Processed | ShipmentStatus::OnHold | ShipmentStatus::Reconciled
        )
    }

    /// Returns the status name as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            ShipmentStatus::Pending => "Pending",
            ShipmentStatus::Processed => "Processed",
            ShipmentStatus::Exceeded => "Exceeded",
            ShipmentStatus::OnHold => "OnHold",
            ShipmentStatus::Reconciled => "Reconciled",
        }
    }
}

impl std::fmt::Display for ShipmentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for ShipmentStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Pending" => Ok(ShipmentStatus::Pending),
            "Processed" => Ok(ShipmentStatus::Processed),
            "Exceeded" => Ok(ShipmentStatus::Exceeded),
            "OnHold" => Ok(ShipmentStatus::OnHold),
            "Reconciled" => Ok(ShipmentStatus::Reconciled),
            other => Err(DomainError::UnknownStatus(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_statuses_are_pending() {
        assert_eq!(OrderStatus::default(), OrderStatus::Pending);
        assert_eq!(PaymentStatus::default(), PaymentStatus::Pending);
        assert_eq!(ShipmentStatus::default(), ShipmentStatus::Pending);
    }

    #[test]
    fn test_order_terminal_states() {
        assert!(!OrderStatus::Pending.is_terminal());
        assert!(OrderStatus::Processed.is_terminal());
        assert!(OrderStatus::OnHold.is_terminal());
    }

    #[test]
    fn test_payment_terminal_states() {
        assert!(!PaymentStatus::Pending.is_terminal());
        assert!(!PaymentStatus::Exceeded.is_terminal());
        assert!(PaymentStatus::Processed.is_terminal());
        assert!(PaymentStatus::OnHold.is_terminal());
        assert!(PaymentStatus::Reconciled.is_terminal());
    }

    #[test]
    fn test_display_matches_wire_names() {
        assert_eq!(OrderStatus::OnHold.to_string(), "OnHold");
        assert_eq!(PaymentStatus::Exceeded.to_string(), "Exceeded");
        assert_eq!(ShipmentStatus::Reconciled.to_string(), "Reconciled");
    }

    #[test]
    fn test_from_str_roundtrip() {
        for status in [
            PaymentStatus::Pending,
            PaymentStatus::Processed,
            PaymentStatus::Exceeded,
            PaymentStatus::OnHold,
            PaymentStatus::Reconciled,
        ] {
            assert_eq!(status.as_str().parse::<PaymentStatus>().unwrap(), status);
        }
        for status in [OrderStatus::Pending, OrderStatus::Processed, OrderStatus::OnHold] {
            assert_eq!(status.as_str().parse::<OrderStatus>().unwrap(), status);
        }
    }

    #[test]
    fn test_from_str_rejects_unknown() {
        assert!("Cancelled".parse::<OrderStatus>().is_err());
        assert!("processed".parse::<PaymentStatus>().is_err());
    }

    #[test]
    fn test_serialization() {
        let json = serde_json::to_string(&ShipmentStatus::OnHold).unwrap();
        assert_eq!(json, "\"OnHold\"");
        let back: ShipmentStatus = serde_json::from_str(&json).unwrap();
        assert_eq!(back, ShipmentStatus::OnHold);
    }
}
