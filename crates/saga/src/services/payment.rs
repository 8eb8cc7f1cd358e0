//! Payment service: the store-backed payment participant.

use std::time::Duration;

use async_trait::async_trait;
use common::SagaId;
use domain::{Payment, PaymentStatus, payment_status_for, validate_amount};
use store::ResourceStore;

use crate::decision::StepOutcome;
use crate::error::Result;
use crate::services::{Ack, PaymentParticipant, ProcessReport};

pub const PAYMENT_CREATED: &str = "Payment was created.";
pub const PAYMENT_PROCESSED: &str = "Payment was processed.";
pub const PAYMENT_RECONCILED: &str = "Payment was reconciled.";
pub const PAYMENT_LIMIT_EXCEEDED: &str = "Exceeds payment amount limit.";

/// Store-backed payment participant.
#[derive(Clone)]
pub struct PaymentService<S> {
    store: S,
    process_delay: Duration,
}

impl<S> PaymentService<S> {
    /// Creates a payment service over the given store.
    pub fn new(store: S) -> Self {
        Self {
            store,
            process_delay: Duration::ZERO,
        }
    }

    /// Sets a simulated latency for the process step.
    pub fn with_process_delay(mut self, delay: Duration) -> Self {
        self.process_delay = delay;
        self
    }
}

#[async_trait]
impl<S: ResourceStore> PaymentParticipant for PaymentService<S> {
    async fn create(&self, id: SagaId, amount: i64) -> Result<Ack> {
        validate_amount(amount)?;
        match self.store.create_payment(Payment::pending(id, amount)).await {
            Ok(()) => {}
            // Re-running creation with the same id is a no-op.
            Err(e) if e.is_already_exists() => {}
            Err(e) => return Err(e.into()),
        }
        tracing::debug!(%id, amount, "payment record created");
        Ok(Ack::of(PAYMENT_CREATED))
    }

    async fn process(&self, id: SagaId, amount: i64) -> Result<ProcessReport> {
        tokio::time::sleep(self.process_delay).await;

        let status = payment_status_for(amount);
        self.store.set_payment_status(id, status).await?;

        Ok(match StepOutcome::from(status) {
            StepOutcome::Processed => ProcessReport {
                outcome: StepOutcome::Processed,
                message: PAYMENT_PROCESSED.to_string(),
            },
            StepOutcome::Exceeded => {
                tracing::warn!(%id, amount, "payment amount over limit");
                ProcessReport {
                    outcome: StepOutcome::Exceeded,
                    message: PAYMENT_LIMIT_EXCEEDED.to_string(),
                }
            }
        })
    }

    async fn reconcile(&self, id: SagaId, status: PaymentStatus) -> Result<Ack> {
        self.store.set_payment_status(id, status).await?;
        tracing::debug!(%id, %status, "payment reconciled");
        Ok(Ack::of(PAYMENT_RECONCILED))
    }
}
