//! Participant services for the saga steps.
//!
//! The traits are the transport seam: the coordinators only know the
//! participant contracts, so a remote (HTTP or queue-backed) participant
//! is just another implementation. The store-backed services here are
//! the direct-call transport.

pub mod order;
pub mod payment;
pub mod shipping;

use async_trait::async_trait;
use common::SagaId;
use domain::{OrderStatus, PaymentStatus, ShipmentStatus};
use serde::Serialize;

use crate::decision::StepOutcome;
use crate::error::Result;

pub use order::OrderService;
pub use payment::PaymentService;
pub use shipping::ShippingService;

/// Acknowledgement of a participant operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Ack {
    pub message: String,
}

impl Ack {
    pub(crate) fn of(message: &str) -> Self {
        Self {
            message: message.to_string(),
        }
    }
}

/// What a processing step produced: the business outcome plus the
/// message (or threshold error text) to surface to the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessReport {
    pub outcome: StepOutcome,
    pub message: String,
}

/// The order participant: owner of the aggregate order record.
#[async_trait]
pub trait OrderParticipant: Send + Sync {
    /// Creates the pending order record. Idempotent per id.
    async fn create(&self, id: SagaId, amount: i64, quantity: i64) -> Result<Ack>;

    /// Marks the order processed once both siblings succeeded.
    async fn process(&self, id: SagaId) -> Result<Ack>;

    /// Force-sets the order to the compensation target.
    async fn reconcile(&self, id: SagaId, status: OrderStatus) -> Result<Ack>;

    /// Reads the order's current status.
    async fn status(&self, id: SagaId) -> Result<OrderStatus>;
}

/// The payment participant.
#[async_trait]
pub trait PaymentParticipant: Send + Sync {
    /// Validates the amount and creates the pending payment record.
    async fn create(&self, id: SagaId, amount: i64) -> Result<Ack>;

    /// Applies the amount threshold rule; `Exceeded` is returned as
    /// data, never as an error.
    async fn process(&self, id: SagaId, amount: i64) -> Result<ProcessReport>;

    /// Force-sets the payment to the compensation target.
    async fn reconcile(&self, id: SagaId, status: PaymentStatus) -> Result<Ack>;
}

/// The shipping participant.
#[async_trait]
pub trait ShippingParticipant: Send + Sync {
    /// Validates the quantity and creates the pending shipment record.
    async fn create(&self, id: SagaId, quantity: i64) -> Result<Ack>;

    /// Applies the quantity threshold rule; `Exceeded` is returned as
    /// data, never as an error.
    async fn process(&self, id: SagaId, quantity: i64) -> Result<ProcessReport>;

    /// Force-sets the shipment to the compensation target.
    async fn reconcile(&self, id: SagaId, status: ShipmentStatus) -> Result<Ack>;
}
