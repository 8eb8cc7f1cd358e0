//! Monolithic coordinator: the whole saga inside store transactions.
//!
//! The create phase commits all three pending records as one atomic
//! unit; the process phase evaluates both siblings, takes the shared
//! decision and applies every resulting update under a second
//! transaction, rolling back on any unexpected failure so a
//! mid-processing crash leaves no partial update.

use common::SagaId;
use domain::{
    Order, OrderStatus, Payment, PaymentStatus, Shipment, ShipmentStatus, payment_status_for,
    shipment_status_for, validate_amount, validate_quantity,
};
use store::{ResourceStore, StoreTransaction};

use crate::decision::{Decision, StepOutcome};
use crate::error::Result;
use crate::report::{SagaReport, record_saga_metrics};
use crate::services::order::{ORDER_CREATED, ORDER_PROCESSED, ORDER_RECONCILED};
use crate::services::payment::{PAYMENT_LIMIT_EXCEEDED, PAYMENT_PROCESSED, PAYMENT_RECONCILED};
use crate::services::shipping::{
    SHIPPING_LIMIT_EXCEEDED, SHIPPING_PROCESSED, SHIPPING_RECONCILED,
};
use crate::state::SagaState;

/// Coordinator running the saga as in-process transactions.
#[derive(Clone)]
pub struct MonolithCoordinator<S> {
    store: S,
}

impl<S: ResourceStore> MonolithCoordinator<S> {
    /// Creates a monolithic coordinator over the given store.
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Runs one saga instance to a terminal state.
    #[tracing::instrument(skip(self))]
    pub async fn run(&self, amount: i64, quantity: i64) -> Result<SagaReport> {
        metrics::counter!("saga_executions_total", "variant" => "monolith").increment(1);
        let started = std::time::Instant::now();
        let result = self.execute(amount, quantity).await;
        record_saga_metrics("monolith", started, &result);
        result
    }

    async fn execute(&self, amount: i64, quantity: i64) -> Result<SagaReport> {
        validate_amount(amount)?;
        validate_quantity(quantity)?;

        let id = SagaId::new();
        let mut report = SagaReport::started(id, amount, quantity);
        tracing::info!(%id, amount, quantity, "saga started");

        // Create phase: either all three pending records exist or none do.
        report.state = SagaState::PendingCreate;
        let mut tx = self.store.begin().await?;
        tx.create_order(Order::pending(id, amount, quantity)).await?;
        tx.create_payment(Payment::pending(id, amount)).await?;
        tx.create_shipment(Shipment::pending(id, quantity)).await?;
        tx.commit().await?;
        report.messages.push(ORDER_CREATED.to_string());

        // Process phase: siblings plus reconciliation in one unit.
        report.state = SagaState::PendingProcess;
        let mut tx = self.store.begin().await?;
        match self.process_and_reconcile(&mut tx, &mut report).await {
            Ok(()) => tx.commit().await?,
            Err(e) => {
                tracing::error!(%id, error = %e, "process phase failed, rolling back");
                tx.rollback().await?;
                return Err(e);
            }
        }

        tracing::info!(%id, state = %report.state, "saga finished");
        Ok(report)
    }

    async fn process_and_reconcile(
        &self,
        tx: &mut S::Tx,
        report: &mut SagaReport,
    ) -> Result<()> {
        let id = report.id;

        // Both siblings are evaluated before any decision; a threshold
        // failure is an outcome to join on, not an early exit.
        let payment_status = payment_status_for(report.amount);
        tx.set_payment_status(id, payment_status).await?;
        report.messages.push(
            match StepOutcome::from(payment_status) {
                StepOutcome::Processed => PAYMENT_PROCESSED,
                StepOutcome::Exceeded => PAYMENT_LIMIT_EXCEEDED,
            }
            .to_string(),
        );

        let shipment_status = shipment_status_for(report.quantity);
        tx.set_shipment_status(id, shipment_status).await?;
        report.messages.push(
            match StepOutcome::from(shipment_status) {
                StepOutcome::Processed => SHIPPING_PROCESSED,
                StepOutcome::Exceeded => SHIPPING_LIMIT_EXCEEDED,
            }
            .to_string(),
        );

        let decision = Decision::from_outcomes(payment_status.into(), shipment_status.into());
        report.state = if decision.requires_reconciliation() {
            SagaState::Reconciling
        } else {
            SagaState::Completed
        };
        tracing::info!(%id, ?decision, "sibling outcomes joined");

        match decision {
            Decision::Complete => {
                tx.set_order_status(id, OrderStatus::Processed).await?;
                report.messages.push(ORDER_PROCESSED.to_string());
                report.state = SagaState::Processed;
            }
            Decision::HoldOrderOnly => {
                tx.set_order_status(id, OrderStatus::OnHold).await?;
                report.messages.push(ORDER_RECONCILED.to_string());
                report.state = SagaState::OnHold;
            }
            Decision::HoldOrderAndShipment => {
                tx.set_shipment_status(id, ShipmentStatus::OnHold).await?;
                report.messages.push(SHIPPING_RECONCILED.to_string());
                tx.set_order_status(id, OrderStatus::OnHold).await?;
                report.messages.push(ORDER_RECONCILED.to_string());
                report.state = SagaState::OnHold;
            }
            Decision::HoldOrderAndPayment => {
                tx.set_payment_status(id, PaymentStatus::OnHold).await?;
                report.messages.push(PAYMENT_RECONCILED.to_string());
                tx.set_order_status(id, OrderStatus::OnHold).await?;
                report.messages.push(ORDER_RECONCILED.to_string());
                report.state = SagaState::OnHold;
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use store::InMemoryStore;

    async fn run_saga(amount: i64, quantity: i64) -> (InMemoryStore, Result<SagaReport>) {
        let store = InMemoryStore::new();
        let coordinator = MonolithCoordinator::new(store.clone());
        let result = coordinator.run(amount, quantity).await;
        (store, result)
    }

    #[tokio::test]
    async fn test_happy_path() {
        let (store, result) = run_saga(500, 10).await;
        let report = result.unwrap();

        assert_eq!(report.state, SagaState::Processed);
        assert_eq!(
            store.get_order(report.id).await.unwrap().status,
            OrderStatus::Processed
        );
        assert_eq!(
            store.get_payment(report.id).await.unwrap().status,
            PaymentStatus::Processed
        );
        assert_eq!(
            store.get_shipment(report.id).await.unwrap().status,
            ShipmentStatus::Processed
        );
        assert_eq!(
            report.messages,
            vec![
                ORDER_CREATED,
                PAYMENT_PROCESSED,
                SHIPPING_PROCESSED,
                ORDER_PROCESSED
            ]
        );
    }

    #[tokio::test]
    async fn test_payment_exceeded_compensates_shipment() {
        let (store, result) = run_saga(1500, 10).await;
        let report = result.unwrap();

        assert_eq!(report.state, SagaState::OnHold);
        assert_eq!(
            store.get_order(report.id).await.unwrap().status,
            OrderStatus::OnHold
        );
        assert_eq!(
            store.get_payment(report.id).await.unwrap().status,
            PaymentStatus::Exceeded
        );
        assert_eq!(
            store.get_shipment(report.id).await.unwrap().status,
            ShipmentStatus::OnHold
        );
    }

    #[tokio::test]
    async fn test_shipping_exceeded_compensates_payment() {
        let (store, result) = run_saga(500, 200).await;
        let report = result.unwrap();

        assert_eq!(report.state, SagaState::OnHold);
        assert_eq!(
            store.get_order(report.id).await.unwrap().status,
            OrderStatus::OnHold
        );
        assert_eq!(
            store.get_payment(report.id).await.unwrap().status,
            PaymentStatus::OnHold
        );
        assert_eq!(
            store.get_shipment(report.id).await.unwrap().status,
            ShipmentStatus::Exceeded
        );
    }

    #[tokio::test]
    async fn test_both_exceeded_holds_order_only() {
        let (store, result) = run_saga(1500, 200).await;
        let report = result.unwrap();

        assert_eq!(report.state, SagaState::OnHold);
        assert_eq!(
            store.get_order(report.id).await.unwrap().status,
            OrderStatus::OnHold
        );
        assert_eq!(
            store.get_payment(report.id).await.unwrap().status,
            PaymentStatus::Exceeded
        );
        assert_eq!(
            store.get_shipment(report.id).await.unwrap().status,
            ShipmentStatus::Exceeded
        );
    }

    #[tokio::test]
    async fn test_invalid_input_creates_nothing() {
        let (store, result) = run_saga(-1, 10).await;
        assert!(result.unwrap_err().is_invalid_input());
        assert_eq!(store.order_count().await, 0);
        assert_eq!(store.payment_count().await, 0);
        assert_eq!(store.shipment_count().await, 0);

        let (store, result) = run_saga(10, -1).await;
        assert!(result.unwrap_err().is_invalid_input());
        assert_eq!(store.order_count().await, 0);
    }
}
