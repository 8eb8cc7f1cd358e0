use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use common::SagaId;
use domain::{
    ContextStatus, Order, OrderStatus, Payment, PaymentStatus, SagaContext, Shipment,
    ShipmentStatus,
};
use tokio::sync::RwLock;

use crate::{
    ResourceKind, Result, StoreError,
    store::{ContextStore, ResourceStore, StoreTransaction},
};

#[derive(Debug, Clone, Default)]
struct Inner {
    orders: HashMap<SagaId, Order>,
    payments: HashMap<SagaId, Payment>,
    shipments: HashMap<SagaId, Shipment>,
    contexts: HashMap<SagaId, SagaContext>,
}

impl Inner {
    fn create_order(&mut self, order: Order) -> Result<()> {
        if self.orders.contains_key(&order.id) {
            return Err(StoreError::AlreadyExists {
                kind: ResourceKind::Order,
                id: order.id,
            });
        }
        self.orders.insert(order.id, order);
        Ok(())
    }

    fn create_payment(&mut self, payment: Payment) -> Result<()> {
        if self.payments.contains_key(&payment.id) {
            return Err(StoreError::AlreadyExists {
                kind: ResourceKind::Payment,
                id: payment.id,
            });
        }
        self.payments.insert(payment.id, payment);
        Ok(())
    }

    fn create_shipment(&mut self, shipment: Shipment) -> Result<()> {
        if self.shipments.contains_key(&shipment.id) {
            return Err(StoreError::AlreadyExists {
                kind: ResourceKind::Shipment,
                id: shipment.id,
            });
        }
        self.shipments.insert(shipment.id, shipment);
        Ok(())
    }

    fn set_order_status(&mut self, id: SagaId, status: OrderStatus) -> Result<()> {
        let order = self.orders.get_mut(&id).ok_or(StoreError::NotFound {
            kind: ResourceKind::Order,
            id,
        })?;
        order.status = status;
        Ok(())
    }

    fn set_payment_status(&mut self, id: SagaId, status: PaymentStatus) -> Result<()> {
        let payment = self.payments.get_mut(&id).ok_or(StoreError::NotFound {
            kind: ResourceKind::Payment,
            id,
        })?;
        payment.status = status;
        Ok(())
    }

    fn set_shipment_status(&mut self, id: SagaId, status: ShipmentStatus) -> Result<()> {
        let shipment = self.shipments.get_mut(&id).ok_or(StoreError::NotFound {
            kind: ResourceKind::Shipment,
            id,
        })?;
        shipment.status = status;
        Ok(())
    }

    fn apply(&mut self, op: WriteOp) -> Result<()> {
        match op {
            WriteOp::CreateOrder(order) => self.create_order(order),
            WriteOp::CreatePayment(payment) => self.create_payment(payment),
            WriteOp::CreateShipment(shipment) => self.create_shipment(shipment),
            WriteOp::SetOrderStatus(id, status) => self.set_order_status(id, status),
            WriteOp::SetPaymentStatus(id, status) => self.set_payment_status(id, status),
            WriteOp::SetShipmentStatus(id, status) => self.set_shipment_status(id, status),
        }
    }
}

#[derive(Debug, Clone)]
enum WriteOp {
    CreateOrder(Order),
    CreatePayment(Payment),
    CreateShipment(Shipment),
    SetOrderStatus(SagaId, OrderStatus),
    SetPaymentStatus(SagaId, PaymentStatus),
    SetShipmentStatus(SagaId, ShipmentStatus),
}

/// In-memory store implementation.
///
/// All record kinds share one lock so that transactional commits are
/// atomic across kinds, exactly like the PostgreSQL implementation.
#[derive(Clone, Default)]
pub struct InMemoryStore {
    inner: Arc<RwLock<Inner>>,
}

impl InMemoryStore {
    /// Creates a new empty in-memory store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of order records.
    pub async fn order_count(&self) -> usize {
        self.inner.read().await.orders.len()
    }

    /// Returns the number of payment records.
    pub async fn payment_count(&self) -> usize {
        self.inner.read().await.payments.len()
    }

    /// Returns the number of shipment records.
    pub async fn shipment_count(&self) -> usize {
        self.inner.read().await.shipments.len()
    }

    /// Clears all records.
    pub async fn clear(&self) {
        let mut inner = self.inner.write().await;
        *inner = Inner::default();
    }
}

/// A buffered transaction over the in-memory store.
///
/// Writes are staged and validated/applied in one shot at commit time
/// under the store's write lock; a failed validation applies nothing.
pub struct InMemoryTransaction {
    inner: Arc<RwLock<Inner>>,
    ops: Vec<WriteOp>,
}

#[async_trait]
impl StoreTransaction for InMemoryTransaction {
    async fn create_order(&mut self, order: Order) -> Result<()> {
        self.ops.push(WriteOp::CreateOrder(order));
        Ok(())
    }

    async fn create_payment(&mut self, payment: Payment) -> Result<()> {
        self.ops.push(WriteOp::CreatePayment(payment));
        Ok(())
    }

    async fn create_shipment(&mut self, shipment: Shipment) -> Result<()> {
        self.ops.push(WriteOp::CreateShipment(shipment));
        Ok(())
    }

    async fn set_order_status(&mut self, id: SagaId, status: OrderStatus) -> Result<()> {
        self.ops.push(WriteOp::SetOrderStatus(id, status));
        Ok(())
    }

    async fn set_payment_status(&mut self, id: SagaId, status: PaymentStatus) -> Result<()> {
        self.ops.push(WriteOp::SetPaymentStatus(id, status));
        Ok(())
    }

    async fn set_shipment_status(&mut self, id: SagaId, status: ShipmentStatus) -> Result<()> {
        self.ops.push(WriteOp::SetShipmentStatus(id, status));
        Ok(())
    }

    async fn commit(self) -> Result<()> {
        let InMemoryTransaction { inner, ops } = self;
        let mut guard = inner.write().await;
        // Validate and apply against a scratch copy, then swap: a
        // failed op applies nothing.
        let mut scratch = guard.clone();
        for op in ops {
            scratch.apply(op)?;
        }
        *guard = scratch;
        Ok(())
    }

    async fn rollback(self) -> Result<()> {
        Ok(())
    }
}

#[async_trait]
impl ResourceStore for InMemoryStore {
    type Tx = InMemoryTransaction;

    async fn begin(&self) -> Result<Self::Tx> {
        Ok(InMemoryTransaction {
            inner: self.inner.clone(),
            ops: Vec::new(),
        })
    }

    async fn create_order(&self, order: Order) -> Result<()> {
        self.inner.write().await.create_order(order)
    }

    async fn create_payment(&self, payment: Payment) -> Result<()> {
        self.inner.write().await.create_payment(payment)
    }

    async fn create_shipment(&self, shipment: Shipment) -> Result<()> {
        self.inner.write().await.create_shipment(shipment)
    }

    async fn get_order(&self, id: SagaId) -> Result<Order> {
        self.inner
            .read()
            .await
            .orders
            .get(&id)
            .cloned()
            .ok_or(StoreError::NotFound {
                kind: ResourceKind::Order,
                id,
            })
    }

    async fn get_payment(&self, id: SagaId) -> Result<Payment> {
        self.inner
            .read()
            .await
            .payments
            .get(&id)
            .cloned()
            .ok_or(StoreError::NotFound {
                kind: ResourceKind::Payment,
                id,
            })
    }

    async fn get_shipment(&self, id: SagaId) -> Result<Shipment> {
        self.inner
            .read()
            .await
            .shipments
            .get(&id)
            .cloned()
            .ok_or(StoreError::NotFound {
                kind: ResourceKind::Shipment,
                id,
            })
    }

    async fn set_order_status(&self, id: SagaId, status: OrderStatus) -> Result<()> {
        self.inner.write().await.set_order_status(id, status)
    }

    async fn set_payment_status(&self, id: SagaId, status: PaymentStatus) -> Result<()> {
        self.inner.write().await.set_payment_status(id, status)
    }

    async fn set_shipment_status(&self, id: SagaId, status: ShipmentStatus) -> Result<()> {
        self.inner.write().await.set_shipment_status(id, status)
    }
}

#[async_trait]
impl ContextStore for InMemoryStore {
    async fn insert_context(&self, context: SagaContext) -> Result<()> {
        let mut inner = self.inner.write().await;
        if inner.contexts.contains_key(&context.id) {
            return Err(StoreError::AlreadyExists {
                kind: ResourceKind::Context,
                id: context.id,
            });
        }
        inner.contexts.insert(context.id, context);
        Ok(())
    }

    async fn get_context(&self, id: SagaId) -> Result<SagaContext> {
        self.inner
            .read()
            .await
            .contexts
            .get(&id)
            .cloned()
            .ok_or(StoreError::NotFound {
                kind: ResourceKind::Context,
                id,
            })
    }

    async fn set_context_order(&self, id: SagaId, status: ContextStatus) -> Result<bool> {
        let mut inner = self.inner.write().await;
        let context = inner.contexts.get_mut(&id).ok_or(StoreError::NotFound {
            kind: ResourceKind::Context,
            id,
        })?;
        if context.order == Some(status) {
            return Ok(false);
        }
        context.order = Some(status);
        Ok(true)
    }

    async fn set_context_payment(&self, id: SagaId, status: ContextStatus) -> Result<bool> {
        let mut inner = self.inner.write().await;
        let context = inner.contexts.get_mut(&id).ok_or(StoreError::NotFound {
            kind: ResourceKind::Context,
            id,
        })?;
        if context.payment == Some(status) {
            return Ok(false);
        }
        context.payment = Some(status);
        Ok(true)
    }

    async fn set_context_shipping(&self, id: SagaId, status: ContextStatus) -> Result<bool> {
        let mut inner = self.inner.write().await;
        let context = inner.contexts.get_mut(&id).ok_or(StoreError::NotFound {
            kind: ResourceKind::Context,
            id,
        })?;
        if context.shipping == Some(status) {
            return Ok(false);
        }
        context.shipping = Some(status);
        Ok(true)
    }
}
