//! Synchronous orchestrator: one coordinator invoking the participants
//! directly and observing every result.
//!
//! Within each phase the two sibling calls run concurrently and the
//! coordinator waits for both outcomes: a join, not a race. A
//! threshold failure never short-circuits the join; validation
//! failures during the create phase fail the saga before the process
//! phase is entered.

use common::SagaId;
use domain::{OrderStatus, PaymentStatus, ShipmentStatus};

use crate::decision::Decision;
use crate::error::Result;
use crate::report::{SagaReport, record_saga_metrics};
use crate::services::{OrderParticipant, PaymentParticipant, ShippingParticipant};
use crate::state::SagaState;

/// Coordinator for the request/response variant.
#[derive(Clone)]
pub struct SagaOrchestrator<O, P, Sh> {
    order: O,
    payment: P,
    shipping: Sh,
}

impl<O, P, Sh> SagaOrchestrator<O, P, Sh>
where
    O: OrderParticipant,
    P: PaymentParticipant,
    Sh: ShippingParticipant,
{
    /// Creates an orchestrator over the given participants.
    pub fn new(order: O, payment: P, shipping: Sh) -> Self {
        Self {
            order,
            payment,
            shipping,
        }
    }

    /// Runs one saga instance to a terminal state.
    #[tracing::instrument(skip(self))]
    pub async fn run(&self, amount: i64, quantity: i64) -> Result<SagaReport> {
        metrics::counter!("saga_executions_total", "variant" => "orchestration").increment(1);
        let started = std::time::Instant::now();
        let result = self.execute(amount, quantity).await;
        record_saga_metrics("orchestration", started, &result);
        result
    }

    async fn execute(&self, amount: i64, quantity: i64) -> Result<SagaReport> {
        let id = SagaId::new();
        let mut report = SagaReport::started(id, amount, quantity);
        tracing::info!(%id, amount, quantity, "saga started");

        // Create phase: order first, then both siblings concurrently.
        // A validation failure here is terminal for the saga.
        report.state = SagaState::PendingCreate;
        report.messages.push(self.order.create(id, amount, quantity).await?.message);
        let (payment_ack, shipping_ack) = tokio::join!(
            self.payment.create(id, amount),
            self.shipping.create(id, quantity)
        );
        report.messages.push(payment_ack?.message);
        report.messages.push(shipping_ack?.message);

        // Process phase: the join point. Both outcomes are required
        // regardless of which side settles first.
        report.state = SagaState::PendingProcess;
        let (payment_report, shipping_report) = tokio::join!(
            self.payment.process(id, amount),
            self.shipping.process(id, quantity)
        );
        let payment_report = payment_report?;
        let shipping_report = shipping_report?;
        report.messages.push(payment_report.message.clone());
        report.messages.push(shipping_report.message.clone());

        let decision = Decision::from_outcomes(payment_report.outcome, shipping_report.outcome);
        report.state = if decision.requires_reconciliation() {
            SagaState::Reconciling
        } else {
            SagaState::Completed
        };
        tracing::info!(%id, ?decision, "sibling outcomes joined");

        match decision {
            Decision::Complete => {
                report.messages.push(self.order.process(id).await?.message);
            }
            Decision::HoldOrderOnly => {
                report
                    .messages
                    .push(self.order.reconcile(id, OrderStatus::OnHold).await?.message);
            }
            Decision::HoldOrderAndShipment => {
                let (order_ack, shipping_ack) = tokio::join!(
                    self.order.reconcile(id, OrderStatus::OnHold),
                    self.shipping.reconcile(id, ShipmentStatus::OnHold)
                );
                report.messages.push(order_ack?.message);
                report.messages.push(shipping_ack?.message);
            }
            Decision::HoldOrderAndPayment => {
                let (order_ack, payment_ack) = tokio::join!(
                    self.order.reconcile(id, OrderStatus::OnHold),
                    self.payment.reconcile(id, PaymentStatus::OnHold)
                );
                report.messages.push(order_ack?.message);
                report.messages.push(payment_ack?.message);
            }
        }

        report.state = if decision.requires_reconciliation() {
            SagaState::OnHold
        } else {
            SagaState::Processed
        };
        tracing::info!(%id, state = %report.state, "saga finished");
        Ok(report)
    }
}
