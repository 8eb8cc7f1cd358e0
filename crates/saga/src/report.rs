//! The result a coordinator hands back to its caller.

use common::SagaId;
use serde::Serialize;

use crate::error::Result;
use crate::state::SagaState;

/// Summary of one saga run: the id minted for the instance, the
/// terminal state reached, and the participant messages collected
/// along the way.
#[derive(Debug, Clone, Serialize)]
pub struct SagaReport {
    pub id: SagaId,
    pub amount: i64,
    pub quantity: i64,
    pub state: SagaState,
    pub messages: Vec<String>,
    /// Failure description when `state` is `Failed`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure: Option<String>,
}

impl SagaReport {
    /// Creates a report in the given state with no messages yet.
    pub fn started(id: SagaId, amount: i64, quantity: i64) -> Self {
        Self {
            id,
            amount,
            quantity,
            state: SagaState::Created,
            messages: Vec::new(),
            failure: None,
        }
    }
}

/// Records the per-variant saga metrics for one finished run.
pub(crate) fn record_saga_metrics(
    variant: &'static str,
    started: std::time::Instant,
    outcome: &Result<SagaReport>,
) {
    metrics::histogram!("saga_duration_seconds", "variant" => variant)
        .record(started.elapsed().as_secs_f64());
    match outcome {
        Ok(report) if report.state == SagaState::Processed => {
            metrics::counter!("saga_completed", "variant" => variant).increment(1);
        }
        Ok(report) if report.state == SagaState::OnHold => {
            metrics::counter!("saga_reconciled", "variant" => variant).increment(1);
        }
        Ok(_) | Err(_) => {
            metrics::counter!("saga_failed", "variant" => variant).increment(1);
        }
    }
}
