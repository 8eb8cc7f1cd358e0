//! The three records owned by one saga instance.
//!
//! All three share the saga id and are created together in `Pending`
//! status before any processing step runs. Terminal records are never
//! deleted; they are the saga's audit trail.

use common::SagaId;
use serde::{Deserialize, Serialize};

use crate::status::{OrderStatus, PaymentStatus, ShipmentStatus};

/// The aggregate order record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    pub id: SagaId,
    pub status: OrderStatus,
    pub amount: i64,
    pub quantity: i64,
}

impl Order {
    /// Creates a pending order record.
    pub fn pending(id: SagaId, amount: i64, quantity: i64) -> Self {
        Self {
            id,
            status: OrderStatus::Pending,
            amount,
            quantity,
        }
    }
}

/// The payment sub-resource record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Payment {
    pub id: SagaId,
    pub status: PaymentStatus,
    pub amount: i64,
}

impl Payment {
    /// Creates a pending payment record.
    pub fn pending(id: SagaId, amount: i64) -> Self {
        Self {
            id,
            status: PaymentStatus::Pending,
            amount,
        }
    }
}

/// The shipment sub-resource record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Shipment {
    pub id: SagaId,
    pub status: ShipmentStatus,
    pub quantity: i64,
}

impl Shipment {
    /// Creates a pending shipment record.
    pub fn pending(id: SagaId, quantity: i64) -> Self {
        Self {
            id,
            status: ShipmentStatus::Pending,
            quantity,
        }
    }
}
