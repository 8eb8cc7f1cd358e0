//! Notification types for the choreographed variant.
//!
//! On the wire every notification is a `(source, detailType, detail)`
//! triple: commands travel under source `OrderContext` with the command
//! name as detail type, and participant outcomes travel under the
//! operation name as source with `Success`/`Error`/`Reconcile` as
//! detail type. In code both sides are tagged enums dispatched through
//! exhaustive matches; [`WireNotification`] is the serde boundary that
//! preserves the pairing exactly.

use chrono::{DateTime, Utc};
use common::SagaId;
use domain::DomainError;
use serde::{Deserialize, Serialize};

use crate::error::{Result, SagaError};

/// Source name of the context keeper.
pub const ORDER_CONTEXT_SOURCE: &str = "OrderContext";

/// Commands the context keeper broadcasts to the participants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Command {
    CreateOrder,
    OrderCreated,
    ProcessPayment,
    ProcessShipping,
    ProcessOrder,
    ReconcileOrder,
    ReconcilePayment,
    ReconcileShipping,
}

impl Command {
    /// Returns the wire detail-type name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Command::CreateOrder => "CreateOrder",
            Command::OrderCreated => "OrderCreated",
            Command::ProcessPayment => "ProcessPayment",
            Command::ProcessShipping => "ProcessShipping",
            Command::ProcessOrder => "ProcessOrder",
            Command::ReconcileOrder => "ReconcileOrder",
            Command::ReconcilePayment => "ReconcilePayment",
            Command::ReconcileShipping => "ReconcileShipping",
        }
    }

    fn from_name(name: &str) -> Option<Self> {
        Some(match name {
            "CreateOrder" => Command::CreateOrder,
            "OrderCreated" => Command::OrderCreated,
            "ProcessPayment" => Command::ProcessPayment,
            "ProcessShipping" => Command::ProcessShipping,
            "ProcessOrder" => Command::ProcessOrder,
            "ReconcileOrder" => Command::ReconcileOrder,
            "ReconcilePayment" => Command::ReconcilePayment,
            "ReconcileShipping" => Command::ReconcileShipping,
            _ => return None,
        })
    }
}

/// The participant operation an outcome notification reports on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    CreateOrder,
    CreatePayment,
    CreateShipping,
    ProcessOrder,
    ProcessPayment,
    ProcessShipping,
    ReconcileOrder,
    ReconcilePayment,
    ReconcileShipping,
}

impl Operation {
    /// Returns the wire source name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Operation::CreateOrder => "CreateOrder",
            Operation::CreatePayment => "CreatePayment",
            Operation::CreateShipping => "CreateShipping",
            Operation::ProcessOrder => "ProcessOrder",
            Operation::ProcessPayment => "ProcessPayment",
            Operation::ProcessShipping => "ProcessShipping",
            Operation::ReconcileOrder => "ReconcileOrder",
            Operation::ReconcilePayment => "ReconcilePayment",
            Operation::ReconcileShipping => "ReconcileShipping",
        }
    }

    fn from_name(name: &str) -> Option<Self> {
        Some(match name {
            "CreateOrder" => Operation::CreateOrder,
            "CreatePayment" => Operation::CreatePayment,
            "CreateShipping" => Operation::CreateShipping,
            "ProcessOrder" => Operation::ProcessOrder,
            "ProcessPayment" => Operation::ProcessPayment,
            "ProcessShipping" => Operation::ProcessShipping,
            "ReconcileOrder" => Operation::ReconcileOrder,
            "ReconcilePayment" => Operation::ReconcilePayment,
            "ReconcileShipping" => Operation::ReconcileShipping,
            _ => return None,
        })
    }
}

/// How a participant operation turned out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Signal {
    /// The operation succeeded.
    Success,

    /// The operation failed hard (validation or backend failure).
    Error,

    /// The operation hit its business threshold and needs
    /// reconciliation upstream.
    Reconcile,
}

impl Signal {
    /// Returns the wire detail-type name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Signal::Success => "Success",
            Signal::Error => "Error",
            Signal::Reconcile => "Reconcile",
        }
    }

    fn from_name(name: &str) -> Option<Self> {
        Some(match name {
            "Success" => Signal::Success,
            "Error" => Signal::Error,
            "Reconcile" => Signal::Reconcile,
            _ => return None,
        })
    }
}

/// The notification payload. Only `id` is always present; the other
/// fields travel when the receiving handler needs them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Detail {
    pub id: SagaId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub amount: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quantity: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl Detail {
    /// Creates a detail carrying only the saga id.
    pub fn for_id(id: SagaId) -> Self {
        Self {
            id,
            amount: None,
            quantity: None,
            status: None,
            error: None,
        }
    }

    pub fn with_amount(mut self, amount: i64) -> Self {
        self.amount = Some(amount);
        self
    }

    pub fn with_quantity(mut self, quantity: i64) -> Self {
        self.quantity = Some(quantity);
        self
    }

    pub fn with_status(mut self, status: impl Into<String>) -> Self {
        self.status = Some(status.into());
        self
    }

    pub fn with_error(mut self, error: impl Into<String>) -> Self {
        self.error = Some(error.into());
        self
    }

    /// Returns the amount or a missing-field error.
    pub fn require_amount(&self) -> Result<i64> {
        self.amount.ok_or(SagaError::MissingField("amount"))
    }

    /// Returns the quantity or a missing-field error.
    pub fn require_quantity(&self) -> Result<i64> {
        self.quantity.ok_or(SagaError::MissingField("quantity"))
    }

    /// Parses the status field into the target status type.
    pub fn require_status<T>(&self) -> Result<T>
    where
        T: std::str::FromStr<Err = DomainError>,
    {
        self.status
            .as_deref()
            .ok_or(SagaError::MissingField("status"))?
            .parse()
            .map_err(SagaError::from)
    }
}

/// One notification on the channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notification {
    /// A command from the context keeper to a participant.
    Command {
        command: Command,
        detail: Detail,
        time: DateTime<Utc>,
    },

    /// An outcome reported by a participant operation.
    Outcome {
        operation: Operation,
        signal: Signal,
        detail: Detail,
        time: DateTime<Utc>,
    },
}

impl Notification {
    /// Creates a command notification stamped with the current time.
    pub fn command(command: Command, detail: Detail) -> Self {
        Notification::Command {
            command,
            detail,
            time: Utc::now(),
        }
    }

    /// Creates an outcome notification stamped with the current time.
    pub fn outcome(operation: Operation, signal: Signal, detail: Detail) -> Self {
        Notification::Outcome {
            operation,
            signal,
            detail,
            time: Utc::now(),
        }
    }

    /// Returns the wire source name.
    pub fn source(&self) -> &'static str {
        match self {
            Notification::Command { .. } => ORDER_CONTEXT_SOURCE,
            Notification::Outcome { operation, .. } => operation.as_str(),
        }
    }

    /// Returns the wire detail-type name.
    pub fn detail_type(&self) -> &'static str {
        match self {
            Notification::Command { command, .. } => command.as_str(),
            Notification::Outcome { signal, .. } => signal.as_str(),
        }
    }

    /// Returns the payload.
    pub fn detail(&self) -> &Detail {
        match self {
            Notification::Command { detail, .. } => detail,
            Notification::Outcome { detail, .. } => detail,
        }
    }
}

/// The serialized notification shape.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireNotification {
    pub source: String,
    pub detail_type: String,
    pub detail: Detail,
    pub time: DateTime<Utc>,
}

impl From<Notification> for WireNotification {
    fn from(notification: Notification) -> Self {
        let source = notification.source().to_string();
        let detail_type = notification.detail_type().to_string();
        let (detail, time) = match notification {
            Notification::Command { detail, time, .. } => (detail, time),
            Notification::Outcome { detail, time, .. } => (detail, time),
        };
        Self {
            source,
            detail_type,
            detail,
            time,
        }
    }
}

impl TryFrom<WireNotification> for Notification {
    type Error = SagaError;

    fn try_from(wire: WireNotification) -> Result<Self> {
        if wire.source == ORDER_CONTEXT_SOURCE {
            if let Some(command) = Command::from_name(&wire.detail_type) {
                return Ok(Notification::Command {
                    command,
                    detail: wire.detail,
                    time: wire.time,
                });
            }
        } else if let (Some(operation), Some(signal)) = (
            Operation::from_name(&wire.source),
            Signal::from_name(&wire.detail_type),
        ) {
            return Ok(Notification::Outcome {
                operation,
                signal,
                detail: wire.detail,
                time: wire.time,
            });
        }
        Err(SagaError::Unroutable {
            origin: wire.source,
            detail_type: wire.detail_type,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_routing_key() {
        let n = Notification::command(
            Command::ProcessPayment,
            Detail::for_id(SagaId::new()).with_amount(500),
        );
        assert_eq!(n.source(), "OrderContext");
        assert_eq!(n.detail_type(), "ProcessPayment");
    }

    #[test]
    fn test_outcome_routing_key() {
        let n = Notification::outcome(
            Operation::ProcessShipping,
            Signal::Reconcile,
            Detail::for_id(SagaId::new()),
        );
        assert_eq!(n.source(), "ProcessShipping");
        assert_eq!(n.detail_type(), "Reconcile");
    }

    #[test]
    fn test_wire_roundtrip_command() {
        let id = SagaId::new();
        let original = Notification::command(
            Command::ReconcileOrder,
            Detail::for_id(id).with_status("OnHold"),
        );
        let wire = WireNotification::from(original.clone());
        assert_eq!(wire.source, "OrderContext");
        assert_eq!(wire.detail_type, "ReconcileOrder");
        assert_eq!(wire.detail.status.as_deref(), Some("OnHold"));

        let back = Notification::try_from(wire).unwrap();
        assert_eq!(back, original);
    }

    #[test]
    fn test_wire_roundtrip_outcome() {
        let original = Notification::outcome(
            Operation::CreatePayment,
            Signal::Error,
            Detail::for_id(SagaId::new()).with_error("Invalid payment amount."),
        );
        let json = serde_json::to_string(&WireNotification::from(original.clone())).unwrap();
        assert!(json.contains("\"detailType\":\"Error\""));
        assert!(json.contains("\"source\":\"CreatePayment\""));

        let wire: WireNotification = serde_json::from_str(&json).unwrap();
        let back = Notification::try_from(wire).unwrap();
        assert_eq!(back, original);
    }

    #[test]
    fn test_unroutable_pairs_are_rejected() {
        let wire = WireNotification {
            source: "OrderContext".to_string(),
            detail_type: "Success".to_string(),
            detail: Detail::for_id(SagaId::new()),
            time: Utc::now(),
        };
        assert!(matches!(
            Notification::try_from(wire),
            Err(SagaError::Unroutable { .. })
        ));

        let wire = WireNotification {
            source: "Unknown".to_string(),
            detail_type: "Success".to_string(),
            detail: Detail::for_id(SagaId::new()),
            time: Utc::now(),
        };
        assert!(matches!(
            Notification::try_from(wire),
            Err(SagaError::Unroutable { .. })
        ));
    }

    #[test]
    fn test_detail_field_requirements() {
        let detail = Detail::for_id(SagaId::new()).with_amount(100);
        assert_eq!(detail.require_amount().unwrap(), 100);
        assert!(matches!(
            detail.require_quantity(),
            Err(SagaError::MissingField("quantity"))
        ));

        let detail = Detail::for_id(SagaId::new()).with_status("OnHold");
        let status: domain::OrderStatus = detail.require_status().unwrap();
        assert_eq!(status, domain::OrderStatus::OnHold);
    }
}
