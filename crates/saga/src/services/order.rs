//! Order service: the store-backed order participant.

use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use common::SagaId;
use domain::{Order, OrderStatus};
use store::ResourceStore;

use crate::error::{Result, SagaError};
use crate::services::{Ack, OrderParticipant};

pub const ORDER_CREATED: &str = "Order was created.";
pub const ORDER_PROCESSED: &str = "Order was processed.";
pub const ORDER_RECONCILED: &str = "Order was reconciled.";

/// Store-backed order participant.
///
/// Supports injecting transient create failures, which is how the
/// workflow variant's retry policy is exercised without a flaky
/// backend. The fault counter is per service instance, not
/// process-wide.
#[derive(Clone)]
pub struct OrderService<S> {
    store: S,
    process_delay: Duration,
    transient_faults: Arc<AtomicU32>,
    create_calls: Arc<AtomicU32>,
}

impl<S> OrderService<S> {
    /// Creates an order service over the given store.
    pub fn new(store: S) -> Self {
        Self {
            store,
            process_delay: Duration::ZERO,
            transient_faults: Arc::new(AtomicU32::new(0)),
            create_calls: Arc::new(AtomicU32::new(0)),
        }
    }

    /// Sets a simulated latency for the process step.
    pub fn with_process_delay(mut self, delay: Duration) -> Self {
        self.process_delay = delay;
        self
    }

    /// Makes the next `count` create calls fail with a transient error.
    pub fn inject_create_faults(&self, count: u32) {
        self.transient_faults.store(count, Ordering::SeqCst);
    }

    /// Returns how many create calls have been made.
    pub fn create_call_count(&self) -> u32 {
        self.create_calls.load(Ordering::SeqCst)
    }

    fn take_fault(&self) -> bool {
        self.transient_faults
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
    }
}

#[async_trait]
impl<S: ResourceStore> OrderParticipant for OrderService<S> {
    async fn create(&self, id: SagaId, amount: i64, quantity: i64) -> Result<Ack> {
        self.create_calls.fetch_add(1, Ordering::SeqCst);
        if self.take_fault() {
            return Err(SagaError::Transient(
                "order backend temporarily unavailable".to_string(),
            ));
        }

        match self
            .store
            .create_order(Order::pending(id, amount, quantity))
            .await
        {
            Ok(()) => {}
            // Re-running creation with the same id is a no-op.
            Err(e) if e.is_already_exists() => {}
            Err(e) => return Err(e.into()),
        }
        tracing::debug!(%id, "order record created");
        Ok(Ack::of(ORDER_CREATED))
    }

    async fn process(&self, id: SagaId) -> Result<Ack> {
        tokio::time::sleep(self.process_delay).await;
        self.store
            .set_order_status(id, OrderStatus::Processed)
            .await?;
        Ok(Ack::of(ORDER_PROCESSED))
    }

    async fn reconcile(&self, id: SagaId, status: OrderStatus) -> Result<Ack> {
        self.store.set_order_status(id, status).await?;
        tracing::debug!(%id, %status, "order reconciled");
        Ok(Ack::of(ORDER_RECONCILED))
    }

    async fn status(&self, id: SagaId) -> Result<OrderStatus> {
        Ok(self.store.get_order(id).await?.status)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use store::InMemoryStore;

    #[tokio::test]
    async fn test_create_and_process() {
        let store = InMemoryStore::new();
        let service = OrderService::new(store.clone());
        let id = SagaId::new();

        let ack = service.create(id, 500, 10).await.unwrap();
        assert_eq!(ack.message, ORDER_CREATED);
        assert_eq!(service.status(id).await.unwrap(), OrderStatus::Pending);

        let ack = service.process(id).await.unwrap();
        assert_eq!(ack.message, ORDER_PROCESSED);
        assert_eq!(service.status(id).await.unwrap(), OrderStatus::Processed);
    }

    #[tokio::test]
    async fn test_create_is_idempotent() {
        let store = InMemoryStore::new();
        let service = OrderService::new(store.clone());
        let id = SagaId::new();

        service.create(id, 500, 10).await.unwrap();
        service.create(id, 500, 10).await.unwrap();
        assert_eq!(store.order_count().await, 1);
    }

    #[tokio::test]
    async fn test_reconcile_force_sets_status() {
        let store = InMemoryStore::new();
        let service = OrderService::new(store);
        let id = SagaId::new();

        service.create(id, 500, 10).await.unwrap();
        service.process(id).await.unwrap();

        let ack = service.reconcile(id, OrderStatus::OnHold).await.unwrap();
        assert_eq!(ack.message, ORDER_RECONCILED);
        assert_eq!(service.status(id).await.unwrap(), OrderStatus::OnHold);

        // Repeating the reconcile is a no-op in effect.
        service.reconcile(id, OrderStatus::OnHold).await.unwrap();
        assert_eq!(service.status(id).await.unwrap(), OrderStatus::OnHold);
    }

    #[tokio::test]
    async fn test_injected_faults_are_transient_and_bounded() {
        let store = InMemoryStore::new();
        let service = OrderService::new(store);
        let id = SagaId::new();

        service.inject_create_faults(2);

        let err = service.create(id, 500, 10).await.unwrap_err();
        assert!(err.is_transient());
        let err = service.create(id, 500, 10).await.unwrap_err();
        assert!(err.is_transient());

        // Third attempt goes through.
        service.create(id, 500, 10).await.unwrap();
        assert_eq!(service.create_call_count(), 3);
    }

    #[tokio::test]
    async fn test_process_missing_order_is_store_error() {
        let service = OrderService::new(InMemoryStore::new());
        let result = service.process(SagaId::new()).await;
        assert!(matches!(result, Err(SagaError::Store(_))));
    }
}
