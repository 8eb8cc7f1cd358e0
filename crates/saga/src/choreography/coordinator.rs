//! Event-choreographed coordinator.
//!
//! No single control thread drives this variant: each participant
//! reacts to commands from the bus and reports outcomes back onto it,
//! and the context keeper projects those outcomes into the persisted
//! [`SagaContext`] to decide when enough information has arrived to
//! proceed. The keeper acts only when a context write actually changed
//! the projection, so redelivered or reordered notifications can never
//! fire a decision twice.

use common::SagaId;
use domain::{ContextStatus, OrderStatus, PaymentStatus, SagaContext, ShipmentStatus};
use store::{ContextStore, ResourceStore};

use crate::choreography::bus::InMemoryEventBus;
use crate::choreography::notification::{Command, Detail, Notification, Operation, Signal};
use crate::decision::{Decision, StepOutcome};
use crate::error::Result;
use crate::report::SagaReport;
use crate::services::order::ORDER_CREATED;
use crate::services::{
    OrderParticipant, OrderService, PaymentParticipant, PaymentService, ShippingParticipant,
    ShippingService,
};
use crate::state::SagaState;

fn outcome_of(status: ContextStatus) -> StepOutcome {
    match status {
        ContextStatus::Processed => StepOutcome::Processed,
        _ => StepOutcome::Exceeded,
    }
}

/// Coordinator for the choreographed variant.
#[derive(Clone)]
pub struct ChoreographyCoordinator<S> {
    store: S,
    bus: InMemoryEventBus,
    order: OrderService<S>,
    payment: PaymentService<S>,
    shipping: ShippingService<S>,
}

impl<S> ChoreographyCoordinator<S>
where
    S: ResourceStore + ContextStore + Clone,
{
    /// Creates a choreography coordinator. The services must share the
    /// coordinator's store.
    pub fn new(
        store: S,
        order: OrderService<S>,
        payment: PaymentService<S>,
        shipping: ShippingService<S>,
    ) -> Self {
        Self {
            store,
            bus: InMemoryEventBus::new(),
            order,
            payment,
            shipping,
        }
    }

    /// The notification channel this coordinator drains.
    pub fn bus(&self) -> &InMemoryEventBus {
        &self.bus
    }

    /// Entry point: records the saga context and kicks off the flow.
    /// The response is returned before the saga settles; progress is
    /// observable through check-order-status.
    #[tracing::instrument(skip(self))]
    pub async fn submit(&self, amount: i64, quantity: i64) -> Result<SagaReport> {
        metrics::counter!("saga_executions_total", "variant" => "choreography").increment(1);
        let id = SagaId::new();
        self.store
            .insert_context(SagaContext::new(id, amount, quantity))
            .await?;
        self.bus.publish(Notification::command(
            Command::CreateOrder,
            Detail::for_id(id).with_amount(amount).with_quantity(quantity),
        ));
        tracing::info!(%id, amount, quantity, "saga submitted");

        let mut report = SagaReport::started(id, amount, quantity);
        report.state = SagaState::PendingCreate;
        report.messages.push(ORDER_CREATED.to_string());
        Ok(report)
    }

    /// Drains the bus until no notifications remain.
    pub async fn run_to_completion(&self) -> Result<()> {
        while let Some(notification) = self.bus.pop() {
            self.dispatch(notification).await?;
        }
        Ok(())
    }

    /// Routes one notification to its handlers, mirroring the channel's
    /// `(source, detailType)` subscription rules.
    pub async fn dispatch(&self, notification: Notification) -> Result<()> {
        tracing::debug!(
            source = notification.source(),
            detail_type = notification.detail_type(),
            id = %notification.detail().id,
            "dispatching notification"
        );
        match notification {
            Notification::Command {
                command, detail, ..
            } => match command {
                Command::CreateOrder => self.on_create_order(&detail).await,
                Command::OrderCreated => {
                    let (payment, shipping) = tokio::join!(
                        self.on_create_payment(&detail),
                        self.on_create_shipping(&detail)
                    );
                    payment?;
                    shipping
                }
                Command::ProcessPayment => self.on_process_payment(&detail).await,
                Command::ProcessShipping => self.on_process_shipping(&detail).await,
                Command::ProcessOrder => self.on_process_order(&detail).await,
                Command::ReconcileOrder => self.on_reconcile_order(&detail).await,
                Command::ReconcilePayment => self.on_reconcile_payment(&detail).await,
                Command::ReconcileShipping => self.on_reconcile_shipping(&detail).await,
            },
            Notification::Outcome {
                operation,
                signal,
                detail,
                ..
            } => self.on_order_context(operation, signal, &detail).await,
        }
    }

    // -- Participant reactions --

    async fn on_create_order(&self, detail: &Detail) -> Result<()> {
        let id = detail.id;
        let amount = detail.require_amount()?;
        let quantity = detail.require_quantity()?;
        match self.order.create(id, amount, quantity).await {
            Ok(_) => self.bus.publish(Notification::outcome(
                Operation::CreateOrder,
                Signal::Success,
                Detail::for_id(id),
            )),
            Err(error) => {
                tracing::error!(%id, %error, "create order failed");
                self.bus.publish(Notification::outcome(
                    Operation::CreateOrder,
                    Signal::Error,
                    Detail::for_id(id).with_error(error.to_string()),
                ));
            }
        }
        Ok(())
    }

    async fn on_create_payment(&self, detail: &Detail) -> Result<()> {
        let id = detail.id;
        let amount = detail.require_amount()?;
        match self.payment.create(id, amount).await {
            Ok(_) => self.bus.publish(Notification::outcome(
                Operation::CreatePayment,
                Signal::Success,
                Detail::for_id(id),
            )),
            Err(error) => {
                tracing::error!(%id, %error, "create payment failed");
                self.bus.publish(Notification::outcome(
                    Operation::CreatePayment,
                    Signal::Error,
                    Detail::for_id(id).with_error(error.to_string()),
                ));
            }
        }
        Ok(())
    }

    async fn on_create_shipping(&self, detail: &Detail) -> Result<()> {
        let id = detail.id;
        let quantity = detail.require_quantity()?;
        match self.shipping.create(id, quantity).await {
            Ok(_) => self.bus.publish(Notification::outcome(
                Operation::CreateShipping,
                Signal::Success,
                Detail::for_id(id),
            )),
            Err(error) => {
                tracing::error!(%id, %error, "create shipping failed");
                self.bus.publish(Notification::outcome(
                    Operation::CreateShipping,
                    Signal::Error,
                    Detail::for_id(id).with_error(error.to_string()),
                ));
            }
        }
        Ok(())
    }

    async fn on_process_payment(&self, detail: &Detail) -> Result<()> {
        let id = detail.id;
        let amount = detail.require_amount()?;
        match self.payment.process(id, amount).await {
            Ok(report) => {
                let signal = match report.outcome {
                    StepOutcome::Processed => Signal::Success,
                    StepOutcome::Exceeded => Signal::Reconcile,
                };
                self.bus.publish(Notification::outcome(
                    Operation::ProcessPayment,
                    signal,
                    Detail::for_id(id),
                ));
            }
            Err(error) => {
                tracing::error!(%id, %error, "process payment failed");
                self.bus.publish(Notification::outcome(
                    Operation::ProcessPayment,
                    Signal::Error,
                    Detail::for_id(id).with_error(error.to_string()),
                ));
            }
        }
        Ok(())
    }

    async fn on_process_shipping(&self, detail: &Detail) -> Result<()> {
        let id = detail.id;
        let quantity = detail.require_quantity()?;
        match self.shipping.process(id, quantity).await {
            Ok(report) => {
                let signal = match report.outcome {
                    StepOutcome::Processed => Signal::Success,
                    StepOutcome::Exceeded => Signal::Reconcile,
                };
                self.bus.publish(Notification::outcome(
                    Operation::ProcessShipping,
                    signal,
                    Detail::for_id(id),
                ));
            }
            Err(error) => {
                tracing::error!(%id, %error, "process shipping failed");
                self.bus.publish(Notification::outcome(
                    Operation::ProcessShipping,
                    Signal::Error,
                    Detail::for_id(id).with_error(error.to_string()),
                ));
            }
        }
        Ok(())
    }

    async fn on_process_order(&self, detail: &Detail) -> Result<()> {
        let id = detail.id;
        match self.order.process(id).await {
            Ok(_) => self.bus.publish(Notification::outcome(
                Operation::ProcessOrder,
                Signal::Success,
                Detail::for_id(id),
            )),
            Err(error) => {
                tracing::error!(%id, %error, "process order failed");
                self.bus.publish(Notification::outcome(
                    Operation::ProcessOrder,
                    Signal::Error,
                    Detail::for_id(id).with_error(error.to_string()),
                ));
            }
        }
        Ok(())
    }

    async fn on_reconcile_order(&self, detail: &Detail) -> Result<()> {
        let id = detail.id;
        let status: OrderStatus = detail.require_status()?;
        match self.order.reconcile(id, status).await {
            Ok(_) => self.bus.publish(Notification::outcome(
                Operation::ReconcileOrder,
                Signal::Success,
                Detail::for_id(id),
            )),
            Err(error) => {
                tracing::error!(%id, %error, "reconcile order failed");
                self.bus.publish(Notification::outcome(
                    Operation::ReconcileOrder,
                    Signal::Error,
                    Detail::for_id(id).with_error(error.to_string()),
                ));
            }
        }
        Ok(())
    }

    async fn on_reconcile_payment(&self, detail: &Detail) -> Result<()> {
        let id = detail.id;
        let status: PaymentStatus = detail.require_status()?;
        match self.payment.reconcile(id, status).await {
            Ok(_) => self.bus.publish(Notification::outcome(
                Operation::ReconcilePayment,
                Signal::Success,
                Detail::for_id(id),
            )),
            Err(error) => {
                tracing::error!(%id, %error, "reconcile payment failed");
                self.bus.publish(Notification::outcome(
                    Operation::ReconcilePayment,
                    Signal::Error,
                    Detail::for_id(id).with_error(error.to_string()),
                ));
            }
        }
        Ok(())
    }

    async fn on_reconcile_shipping(&self, detail: &Detail) -> Result<()> {
        let id = detail.id;
        let status: ShipmentStatus = detail.require_status()?;
        match self.shipping.reconcile(id, status).await {
            Ok(_) => self.bus.publish(Notification::outcome(
                Operation::ReconcileShipping,
                Signal::Success,
                Detail::for_id(id),
            )),
            Err(error) => {
                tracing::error!(%id, %error, "reconcile shipping failed");
                self.bus.publish(Notification::outcome(
                    Operation::ReconcileShipping,
                    Signal::Error,
                    Detail::for_id(id).with_error(error.to_string()),
                ));
            }
        }
        Ok(())
    }

    // -- The context keeper --

    /// Projects one participant outcome into the context record and
    /// fires the next commands once the necessary pair is complete.
    async fn on_order_context(
        &self,
        operation: Operation,
        signal: Signal,
        detail: &Detail,
    ) -> Result<()> {
        let id = detail.id;

        if signal == Signal::Error {
            tracing::error!(
                %id,
                source = operation.as_str(),
                error = detail.error.as_deref().unwrap_or("unknown"),
                "participant reported an error"
            );
            return Ok(());
        }

        match (operation, signal) {
            (Operation::CreateOrder, Signal::Success) => {
                if !self.store.set_context_order(id, ContextStatus::Created).await? {
                    return Ok(());
                }
                let context = self.store.get_context(id).await?;
                self.bus.publish(Notification::command(
                    Command::OrderCreated,
                    Detail::for_id(id)
                        .with_amount(context.amount)
                        .with_quantity(context.quantity),
                ));
            }

            (Operation::CreatePayment | Operation::CreateShipping, Signal::Success) => {
                let changed = match operation {
                    Operation::CreatePayment => {
                        self.store.set_context_payment(id, ContextStatus::Created).await?
                    }
                    _ => self.store.set_context_shipping(id, ContextStatus::Created).await?,
                };
                if !changed {
                    return Ok(());
                }
                let context = self.store.get_context(id).await?;
                if context.both_created() {
                    tracing::info!(%id, "both siblings created, starting process phase");
                    self.bus.publish(Notification::command(
                        Command::ProcessPayment,
                        Detail::for_id(id).with_amount(context.amount),
                    ));
                    self.bus.publish(Notification::command(
                        Command::ProcessShipping,
                        Detail::for_id(id).with_quantity(context.quantity),
                    ));
                }
            }

            (
                Operation::ProcessPayment | Operation::ProcessShipping,
                Signal::Success | Signal::Reconcile,
            ) => {
                let status = if signal == Signal::Success {
                    ContextStatus::Processed
                } else {
                    ContextStatus::Error
                };
                let changed = match operation {
                    Operation::ProcessPayment => {
                        self.store.set_context_payment(id, status).await?
                    }
                    _ => self.store.set_context_shipping(id, status).await?,
                };
                if !changed {
                    return Ok(());
                }
                let context = self.store.get_context(id).await?;
                let Some((payment, shipping)) = context.processing_pair() else {
                    return Ok(());
                };

                let decision =
                    Decision::from_outcomes(outcome_of(payment), outcome_of(shipping));
                tracing::info!(%id, ?decision, "sibling outcomes joined");
                let hold = Detail::for_id(id).with_status(OrderStatus::OnHold.as_str());
                match decision {
                    Decision::Complete => {
                        self.bus.publish(Notification::command(
                            Command::ProcessOrder,
                            Detail::for_id(id),
                        ));
                    }
                    Decision::HoldOrderOnly => {
                        self.bus
                            .publish(Notification::command(Command::ReconcileOrder, hold));
                    }
                    Decision::HoldOrderAndShipment => {
                        self.bus
                            .publish(Notification::command(Command::ReconcileOrder, hold));
                        self.bus.publish(Notification::command(
                            Command::ReconcileShipping,
                            Detail::for_id(id).with_status(ShipmentStatus::OnHold.as_str()),
                        ));
                    }
                    Decision::HoldOrderAndPayment => {
                        self.bus
                            .publish(Notification::command(Command::ReconcileOrder, hold));
                        self.bus.publish(Notification::command(
                            Command::ReconcilePayment,
                            Detail::for_id(id).with_status(PaymentStatus::OnHold.as_str()),
                        ));
                    }
                }
            }

            (Operation::ProcessOrder, Signal::Success) => {
                self.store.set_context_order(id, ContextStatus::Processed).await?;
                tracing::info!(%id, "order is processed");
            }

            (Operation::ReconcileOrder, Signal::Success) => {
                self.store.set_context_order(id, ContextStatus::Reconciled).await?;
            }
            (Operation::ReconcilePayment, Signal::Success) => {
                self.store.set_context_payment(id, ContextStatus::Reconciled).await?;
            }
            (Operation::ReconcileShipping, Signal::Success) => {
                self.store.set_context_shipping(id, ContextStatus::Reconciled).await?;
            }

            other => {
                tracing::warn!(%id, ?other, "ignoring unhandled notification");
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use domain::{Order, Payment, Shipment, payment_status_for, shipment_status_for};
    use std::time::Duration;
    use store::InMemoryStore;

    fn setup() -> (InMemoryStore, ChoreographyCoordinator<InMemoryStore>) {
        let store = InMemoryStore::new();
        let coordinator = ChoreographyCoordinator::new(
            store.clone(),
            OrderService::new(store.clone()),
            PaymentService::new(store.clone()),
            ShippingService::new(store.clone()).with_process_delay(Duration::ZERO),
        );
        (store, coordinator)
    }

    async fn run_saga(
        amount: i64,
        quantity: i64,
    ) -> (InMemoryStore, ChoreographyCoordinator<InMemoryStore>, SagaId) {
        let (store, coordinator) = setup();
        let report = coordinator.submit(amount, quantity).await.unwrap();
        coordinator.run_to_completion().await.unwrap();
        (store, coordinator, report.id)
    }

    /// Stages a saga that has settled its create phase and whose
    /// participants have written their processing statuses, so tests
    /// can deliver the outcome notifications by hand.
    async fn staged_after_processing(
        store: &InMemoryStore,
        amount: i64,
        quantity: i64,
    ) -> SagaId {
        let id = SagaId::new();
        store
            .insert_context(SagaContext::new(id, amount, quantity))
            .await
            .unwrap();
        store
            .create_order(Order::pending(id, amount, quantity))
            .await
            .unwrap();
        store.create_payment(Payment::pending(id, amount)).await.unwrap();
        store
            .create_shipment(Shipment::pending(id, quantity))
            .await
            .unwrap();
        store.set_context_order(id, ContextStatus::Created).await.unwrap();
        store.set_context_payment(id, ContextStatus::Created).await.unwrap();
        store.set_context_shipping(id, ContextStatus::Created).await.unwrap();
        store
            .set_payment_status(id, payment_status_for(amount))
            .await
            .unwrap();
        store
            .set_shipment_status(id, shipment_status_for(quantity))
            .await
            .unwrap();
        id
    }

    fn payment_outcome(id: SagaId, signal: Signal) -> Notification {
        Notification::outcome(Operation::ProcessPayment, signal, Detail::for_id(id))
    }

    fn shipping_outcome(id: SagaId, signal: Signal) -> Notification {
        Notification::outcome(Operation::ProcessShipping, signal, Detail::for_id(id))
    }

    #[tokio::test]
    async fn test_happy_path() {
        let (store, _, id) = run_saga(500, 10).await;

        assert_eq!(store.get_order(id).await.unwrap().status, OrderStatus::Processed);
        assert_eq!(
            store.get_payment(id).await.unwrap().status,
            PaymentStatus::Processed
        );
        assert_eq!(
            store.get_shipment(id).await.unwrap().status,
            ShipmentStatus::Processed
        );

        let context = store.get_context(id).await.unwrap();
        assert_eq!(context.order, Some(ContextStatus::Processed));
        assert_eq!(context.payment, Some(ContextStatus::Processed));
        assert_eq!(context.shipping, Some(ContextStatus::Processed));
    }

    #[tokio::test]
    async fn test_payment_exceeded_compensates_shipment() {
        let (store, _, id) = run_saga(1500, 10).await;

        assert_eq!(store.get_order(id).await.unwrap().status, OrderStatus::OnHold);
        assert_eq!(
            store.get_payment(id).await.unwrap().status,
            PaymentStatus::Exceeded
        );
        assert_eq!(
            store.get_shipment(id).await.unwrap().status,
            ShipmentStatus::OnHold
        );

        let context = store.get_context(id).await.unwrap();
        assert_eq!(context.order, Some(ContextStatus::Reconciled));
        assert_eq!(context.payment, Some(ContextStatus::Error));
        assert_eq!(context.shipping, Some(ContextStatus::Reconciled));
    }

    #[tokio::test]
    async fn test_shipping_exceeded_compensates_payment() {
        let (store, _, id) = run_saga(500, 200).await;

        assert_eq!(store.get_order(id).await.unwrap().status, OrderStatus::OnHold);
        assert_eq!(
            store.get_payment(id).await.unwrap().status,
            PaymentStatus::OnHold
        );
        assert_eq!(
            store.get_shipment(id).await.unwrap().status,
            ShipmentStatus::Exceeded
        );
    }

    #[tokio::test]
    async fn test_both_exceeded_holds_order_only() {
        let (store, _, id) = run_saga(1500, 200).await;

        assert_eq!(store.get_order(id).await.unwrap().status, OrderStatus::OnHold);
        assert_eq!(
            store.get_payment(id).await.unwrap().status,
            PaymentStatus::Exceeded
        );
        assert_eq!(
            store.get_shipment(id).await.unwrap().status,
            ShipmentStatus::Exceeded
        );

        let context = store.get_context(id).await.unwrap();
        assert_eq!(context.order, Some(ContextStatus::Reconciled));
        assert_eq!(context.payment, Some(ContextStatus::Error));
        assert_eq!(context.shipping, Some(ContextStatus::Error));
    }

    #[tokio::test]
    async fn test_invalid_amount_stalls_before_processing() {
        let (store, _, id) = run_saga(-5, 10).await;

        // The payment create was rejected; nothing ever processed.
        assert_eq!(store.payment_count().await, 0);
        assert_eq!(store.get_order(id).await.unwrap().status, OrderStatus::Pending);
        assert_eq!(
            store.get_shipment(id).await.unwrap().status,
            ShipmentStatus::Pending
        );
        let context = store.get_context(id).await.unwrap();
        assert!(context.payment.is_none());
    }

    #[tokio::test]
    async fn test_outcome_order_does_not_matter() {
        // Payment processed, shipping over limit; deliver the two
        // outcome notifications in both relative orders.
        let mut results = Vec::new();
        for payment_first in [true, false] {
            let (store, coordinator) = setup();
            let id = staged_after_processing(&store, 500, 200).await;

            let payment = payment_outcome(id, Signal::Success);
            let shipping = shipping_outcome(id, Signal::Reconcile);
            if payment_first {
                coordinator.dispatch(payment).await.unwrap();
                coordinator.dispatch(shipping).await.unwrap();
            } else {
                coordinator.dispatch(shipping).await.unwrap();
                coordinator.dispatch(payment).await.unwrap();
            }
            coordinator.run_to_completion().await.unwrap();

            let context = store.get_context(id).await.unwrap();
            results.push((
                store.get_order(id).await.unwrap().status,
                store.get_payment(id).await.unwrap().status,
                store.get_shipment(id).await.unwrap().status,
                context.order,
                context.payment,
                context.shipping,
            ));
        }

        assert_eq!(results[0], results[1]);
        assert_eq!(
            results[0],
            (
                OrderStatus::OnHold,
                PaymentStatus::OnHold,
                ShipmentStatus::Exceeded,
                Some(ContextStatus::Reconciled),
                Some(ContextStatus::Reconciled),
                Some(ContextStatus::Error),
            )
        );
    }

    #[tokio::test]
    async fn test_duplicate_delivery_fires_decision_once() {
        let (store, coordinator) = setup();
        let id = staged_after_processing(&store, 500, 10).await;

        coordinator
            .dispatch(payment_outcome(id, Signal::Success))
            .await
            .unwrap();
        assert!(coordinator.bus().is_empty());

        // The pair completes here: exactly one ProcessOrder command.
        coordinator
            .dispatch(shipping_outcome(id, Signal::Success))
            .await
            .unwrap();
        assert_eq!(coordinator.bus().len(), 1);

        // A redelivered payment outcome must not fire again.
        coordinator
            .dispatch(payment_outcome(id, Signal::Success))
            .await
            .unwrap();
        assert_eq!(coordinator.bus().len(), 1);

        coordinator.run_to_completion().await.unwrap();
        assert_eq!(store.get_order(id).await.unwrap().status, OrderStatus::Processed);
    }
}
