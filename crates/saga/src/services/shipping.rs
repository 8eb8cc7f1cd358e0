//! Shipping service: the store-backed shipping participant.
//!
//! Processing is deliberately slower than the payment side (a real
//! warehouse check would be), which is what forces the coordinators to
//! treat the process phase as a join rather than a race.

use std::time::Duration;

use async_trait::async_trait;
use common::SagaId;
use domain::{Shipment, ShipmentStatus, shipment_status_for, validate_quantity};
use store::ResourceStore;

use crate::decision::StepOutcome;
use crate::error::Result;
use crate::services::{Ack, ProcessReport, ShippingParticipant};

pub const SHIPPING_CREATED: &str = "Shipping was created.";
pub const SHIPPING_PROCESSED: &str = "Shipping was processed.";
pub const SHIPPING_RECONCILED: &str = "Shipping was reconciled.";
pub const SHIPPING_LIMIT_EXCEEDED: &str = "Exceeds shipping quantity limit.";

/// Default simulated latency of the shipping process step.
pub const DEFAULT_PROCESS_DELAY: Duration = Duration::from_secs(3);

/// Store-backed shipping participant.
#[derive(Clone)]
pub struct ShippingService<S> {
    store: S,
    process_delay: Duration,
}

impl<S> ShippingService<S> {
    /// Creates a shipping service over the given store.
    pub fn new(store: S) -> Self {
        Self {
            store,
            process_delay: DEFAULT_PROCESS_DELAY,
        }
    }

    /// Overrides the simulated latency of the process step.
    pub fn with_process_delay(mut self, delay: Duration) -> Self {
        self.process_delay = delay;
        self
    }
}

#[async_trait]
impl<S: ResourceStore> ShippingParticipant for ShippingService<S> {
    async fn create(&self, id: SagaId, quantity: i64) -> Result<Ack> {
        validate_quantity(quantity)?;
        match self
            .store
            .create_shipment(Shipment::pending(id, quantity))
            .await
        {
            Ok(()) => {}
            // Re-running creation with the same id is a no-op.
            Err(e) if e.is_already_exists() => {}
            Err(e) => return Err(e.into()),
        }
        tracing::debug!(%id, quantity, "shipment record created");
        Ok(Ack::of(SHIPPING_CREATED))
    }

    async fn process(&self, id: SagaId, quantity: i64) -> Result<ProcessReport> {
        tokio::time::sleep(self.process_delay).await;

        let status = shipment_status_for(quantity);
        self.store.set_shipment_status(id, status).await?;

        Ok(match StepOutcome::from(status) {
            StepOutcome::Processed => ProcessReport {
                outcome: StepOutcome::Processed,
                message: SHIPPING_PROCESSED.to_string(),
            },
            StepOutcome::Exceeded => {
                tracing::warn!(%id, quantity, "shipping quantity over limit");
                ProcessReport {
                    outcome: StepOutcome::Exceeded,
                    message: SHIPPING_LIMIT_EXCEEDED.to_string(),
                }
            }
        })
    }

    async fn reconcile(&self, id: SagaId, status: ShipmentStatus) -> Result<Ack> {
        self.store.set_shipment_status(id, status).await?;
        tracing::debug!(%id, %status, "shipment reconciled");
        Ok(Ack::of(SHIPPING_RECONCILED))
    }
}
