//! Workflow variant: a table-driven state machine interpreter.
//!
//! What a workflow engine expresses declaratively (states, parallel
//! branches, retry and catch clauses) is interpreted here explicitly:
//! [`FlowStep`] is the state alphabet, the retry table maps steps to a
//! [`RetryPolicy`] over the transient error class, and the catch table
//! maps a failed step to its error state. Unlike the other variants the
//! interpreter always drives the machine to a terminal step, so a hard
//! failure surfaces as a report in the `Failed` state rather than as an
//! error.

use common::SagaId;
use domain::{OrderStatus, PaymentStatus, ShipmentStatus};

use crate::decision::{Decision, StepOutcome};
use crate::error::{Result, SagaError};
use crate::report::{SagaReport, record_saga_metrics};
use crate::retry::RetryPolicy;
use crate::services::{Ack, OrderParticipant, PaymentParticipant, ShippingParticipant};
use crate::state::SagaState;

/// The steps of the interpreted workflow.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlowStep {
    /// Create the pending order record (retried on transient errors).
    CreateOrder,

    /// Create both sibling records in parallel.
    CreateSiblings,

    /// Process both siblings in parallel and join their outcomes.
    ProcessSiblings,

    /// Evaluate the joined outcomes through the decision table.
    CheckResults,

    /// Finalize the order after two successful siblings.
    ProcessOrder,

    /// Both siblings exceeded: hold the order only.
    HoldOrderOnly,

    /// Payment exceeded: hold order and shipment in parallel.
    HoldOrderAndShipment,

    /// Shipping exceeded: hold order and payment in parallel.
    HoldOrderAndPayment,

    /// Successful terminal step.
    Finish,

    /// Hard-failure terminal step.
    Fail,
}

impl FlowStep {
    /// Returns true for the two terminal steps.
    pub fn is_terminal(&self) -> bool {
        matches!(self, FlowStep::Finish | FlowStep::Fail)
    }
}

/// Mutable context threaded through one interpreter run.
struct WorkflowRun {
    id: SagaId,
    amount: i64,
    quantity: i64,
    state: SagaState,
    outcomes: Option<(StepOutcome, StepOutcome)>,
    messages: Vec<String>,
    failure: Option<String>,
}

/// Coordinator interpreting the declarative workflow definition.
#[derive(Clone)]
pub struct WorkflowCoordinator<O, P, Sh> {
    order: O,
    payment: P,
    shipping: Sh,
    retry: RetryPolicy,
}

impl<O, P, Sh> WorkflowCoordinator<O, P, Sh>
where
    O: OrderParticipant,
    P: PaymentParticipant,
    Sh: ShippingParticipant,
{
    /// Creates a workflow coordinator with the default retry policy.
    pub fn new(order: O, payment: P, shipping: Sh) -> Self {
        Self {
            order,
            payment,
            shipping,
            retry: RetryPolicy::default(),
        }
    }

    /// Overrides the retry policy for the create-order step.
    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// The retry table: which steps retry, and under which policy.
    /// Only transient errors consume the budget; anything else goes
    /// straight to the catch table.
    fn retry_rule(&self, step: FlowStep) -> Option<RetryPolicy> {
        match step {
            FlowStep::CreateOrder => Some(self.retry),
            _ => None,
        }
    }

    /// The catch table: where a failed step sends the machine. Every
    /// error, including a validation failure during the parallel
    /// create, lands in the hard-failure state.
    fn catch_target(_step: FlowStep) -> FlowStep {
        FlowStep::Fail
    }

    /// Runs one saga instance to a terminal state.
    #[tracing::instrument(skip(self))]
    pub async fn run(&self, amount: i64, quantity: i64) -> Result<SagaReport> {
        metrics::counter!("saga_executions_total", "variant" => "workflow").increment(1);
        let started = std::time::Instant::now();
        let result = self.execute(amount, quantity).await;
        record_saga_metrics("workflow", started, &result);
        result
    }

    async fn execute(&self, amount: i64, quantity: i64) -> Result<SagaReport> {
        let id = SagaId::new();
        let mut run = WorkflowRun {
            id,
            amount,
            quantity,
            state: SagaState::Created,
            outcomes: None,
            messages: Vec::new(),
            failure: None,
        };
        tracing::info!(%id, amount, quantity, "saga started");

        let mut step = FlowStep::CreateOrder;
        while !step.is_terminal() {
            step = match self.run_step(step, &mut run).await {
                Ok(next) => next,
                Err(error) => {
                    tracing::warn!(%id, ?step, %error, "step failed, taking catch transition");
                    run.failure = Some(error.to_string());
                    Self::catch_target(step)
                }
            };
        }

        if step == FlowStep::Fail {
            run.state = SagaState::Failed;
        }
        tracing::info!(%id, state = %run.state, "saga finished");

        Ok(SagaReport {
            id: run.id,
            amount: run.amount,
            quantity: run.quantity,
            state: run.state,
            messages: run.messages,
            failure: run.failure,
        })
    }

    /// Executes one step and returns the next one.
    async fn run_step(&self, step: FlowStep, run: &mut WorkflowRun) -> Result<FlowStep> {
        match step {
            FlowStep::CreateOrder => {
                run.state = SagaState::PendingCreate;
                let ack = self.create_order_with_retry(run).await?;
                run.messages.push(ack.message);
                Ok(FlowStep::CreateSiblings)
            }
            FlowStep::CreateSiblings => {
                let (payment_ack, shipping_ack) = tokio::join!(
                    self.payment.create(run.id, run.amount),
                    self.shipping.create(run.id, run.quantity)
                );
                run.messages.push(payment_ack?.message);
                run.messages.push(shipping_ack?.message);
                Ok(FlowStep::ProcessSiblings)
            }
            FlowStep::ProcessSiblings => {
                run.state = SagaState::PendingProcess;
                let (payment_report, shipping_report) = tokio::join!(
                    self.payment.process(run.id, run.amount),
                    self.shipping.process(run.id, run.quantity)
                );
                let payment_report = payment_report?;
                let shipping_report = shipping_report?;
                run.messages.push(payment_report.message.clone());
                run.messages.push(shipping_report.message.clone());
                run.outcomes = Some((payment_report.outcome, shipping_report.outcome));
                Ok(FlowStep::CheckResults)
            }
            FlowStep::CheckResults => {
                // The join is complete by construction; the outcomes are
                // recorded by ProcessSiblings.
                let (payment, shipping) = run
                    .outcomes
                    .ok_or_else(|| SagaError::Transient("outcomes not recorded".to_string()))?;
                let decision = Decision::from_outcomes(payment, shipping);
                tracing::info!(id = %run.id, ?decision, "sibling outcomes joined");
                run.state = if decision.requires_reconciliation() {
                    SagaState::Reconciling
                } else {
                    SagaState::Completed
                };
                Ok(match decision {
                    Decision::Complete => FlowStep::ProcessOrder,
                    Decision::HoldOrderOnly => FlowStep::HoldOrderOnly,
                    Decision::HoldOrderAndShipment => FlowStep::HoldOrderAndShipment,
                    Decision::HoldOrderAndPayment => FlowStep::HoldOrderAndPayment,
                })
            }
            FlowStep::ProcessOrder => {
                let ack = self.order.process(run.id).await?;
                run.messages.push(ack.message);
                run.state = SagaState::Processed;
                Ok(FlowStep::Finish)
            }
            FlowStep::HoldOrderOnly => {
                let ack = self.order.reconcile(run.id, OrderStatus::OnHold).await?;
                run.messages.push(ack.message);
                run.state = SagaState::OnHold;
                Ok(FlowStep::Finish)
            }
            FlowStep::HoldOrderAndShipment => {
                let (order_ack, shipping_ack) = tokio::join!(
                    self.order.reconcile(run.id, OrderStatus::OnHold),
                    self.shipping.reconcile(run.id, ShipmentStatus::OnHold)
                );
                run.messages.push(order_ack?.message);
                run.messages.push(shipping_ack?.message);
                run.state = SagaState::OnHold;
                Ok(FlowStep::Finish)
            }
            FlowStep::HoldOrderAndPayment => {
                let (order_ack, payment_ack) = tokio::join!(
                    self.order.reconcile(run.id, OrderStatus::OnHold),
                    self.payment.reconcile(run.id, PaymentStatus::OnHold)
                );
                run.messages.push(order_ack?.message);
                run.messages.push(payment_ack?.message);
                run.state = SagaState::OnHold;
                Ok(FlowStep::Finish)
            }
            FlowStep::Finish | FlowStep::Fail => unreachable!("terminal steps are not executed"),
        }
    }

    /// The retry loop for a step with a retry rule. The attempt counter
    /// is local to this call, so concurrent sagas never share a budget.
    async fn create_order_with_retry(&self, run: &mut WorkflowRun) -> Result<Ack> {
        let policy = self
            .retry_rule(FlowStep::CreateOrder)
            .unwrap_or_default();
        let mut attempt = 0u32;
        loop {
            attempt += 1;
            match self.order.create(run.id, run.amount, run.quantity).await {
                Ok(ack) => return Ok(ack),
                Err(error) if error.is_transient() && policy.allows_retry(attempt) => {
                    let delay = policy.delay_after(attempt);
                    tracing::warn!(
                        id = %run.id,
                        attempt,
                        delay_ms = delay.as_millis() as u64,
                        %error,
                        "transient create failure, backing off"
                    );
                    tokio::time::sleep(delay).await;
                }
                Err(error) if error.is_transient() => {
                    return Err(SagaError::RetriesExhausted {
                        attempts: attempt,
                        last_error: error.to_string(),
                    });
                }
                Err(error) => return Err(error),
            }
        }
    }
}
