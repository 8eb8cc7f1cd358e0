use async_trait::async_trait;
use common::SagaId;
use domain::{ContextStatus, Order, OrderStatus, Payment, PaymentStatus, SagaContext, Shipment, ShipmentStatus};

use crate::Result;

/// Core contract for the saga's keyed-record store.
///
/// `create_*` fails with `AlreadyExists` when a record with the same id
/// already exists for that kind; `get_*` and `set_*_status` fail with
/// `NotFound` when it does not. Each call is its own atomic unit; the
/// monolithic variant groups calls through [`ResourceStore::begin`]
/// instead. All implementations must be thread-safe (Send + Sync).
#[async_trait]
pub trait ResourceStore: Send + Sync {
    /// The transaction type produced by [`ResourceStore::begin`].
    type Tx: StoreTransaction;

    /// Starts a transaction covering writes to all three record kinds.
    async fn begin(&self) -> Result<Self::Tx>;

    /// Inserts an order record.
    async fn create_order(&self, order: Order) -> Result<()>;

    /// Inserts a payment record.
    async fn create_payment(&self, payment: Payment) -> Result<()>;

    /// Inserts a shipment record.
    async fn create_shipment(&self, shipment: Shipment) -> Result<()>;

    /// Loads an order record.
    async fn get_order(&self, id: SagaId) -> Result<Order>;

    /// Loads a payment record.
    async fn get_payment(&self, id: SagaId) -> Result<Payment>;

    /// Loads a shipment record.
    async fn get_shipment(&self, id: SagaId) -> Result<Shipment>;

    /// Updates the status of an order record.
    async fn set_order_status(&self, id: SagaId, status: OrderStatus) -> Result<()>;

    /// Updates the status of a payment record.
    async fn set_payment_status(&self, id: SagaId, status: PaymentStatus) -> Result<()>;

    /// Updates the status of a shipment record.
    async fn set_shipment_status(&self, id: SagaId, status: ShipmentStatus) -> Result<()>;
}

/// Write operations staged inside one atomic unit.
///
/// Dropping a transaction without calling [`StoreTransaction::commit`]
/// discards its writes, as does an explicit
/// [`StoreTransaction::rollback`]. Either all staged writes apply or
/// none do.
#[async_trait]
pub trait StoreTransaction: Send {
    /// Stages an order insert.
    async fn create_order(&mut self, order: Order) -> Result<()>;

    /// Stages a payment insert.
    async fn create_payment(&mut self, payment: Payment) -> Result<()>;

    /// Stages a shipment insert.
    async fn create_shipment(&mut self, shipment: Shipment) -> Result<()>;

    /// Stages an order status update.
    async fn set_order_status(&mut self, id: SagaId, status: OrderStatus) -> Result<()>;

    /// Stages a payment status update.
    async fn set_payment_status(&mut self, id: SagaId, status: PaymentStatus) -> Result<()>;

    /// Stages a shipment status update.
    async fn set_shipment_status(&mut self, id: SagaId, status: ShipmentStatus) -> Result<()>;

    /// Applies every staged write atomically.
    async fn commit(self) -> Result<()>;

    /// Discards every staged write.
    async fn rollback(self) -> Result<()>;
}

/// Storage contract for the choreography context record.
///
/// The column setters report whether the stored value actually changed.
/// The context keeper only evaluates its join decisions on a changed
/// write, which is what keeps each decision to exactly one firing under
/// at-least-once notification delivery.
#[async_trait]
pub trait ContextStore: Send + Sync {
    /// Inserts a fresh context record.
    async fn insert_context(&self, context: SagaContext) -> Result<()>;

    /// Loads a context record.
    async fn get_context(&self, id: SagaId) -> Result<SagaContext>;

    /// Sets the order column; returns true if the value changed.
    async fn set_context_order(&self, id: SagaId, status: ContextStatus) -> Result<bool>;

    /// Sets the payment column; returns true if the value changed.
    async fn set_context_payment(&self, id: SagaId, status: ContextStatus) -> Result<bool>;

    /// Sets the shipping column; returns true if the value changed.
    async fn set_context_shipping(&self, id: SagaId, status: ContextStatus) -> Result<bool>;
}
