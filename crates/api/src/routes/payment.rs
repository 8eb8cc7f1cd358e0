//! Payment participant endpoints (request/response surface).

use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use common::SagaId;
use domain::PaymentStatus;
use saga::{PaymentParticipant, StepOutcome};
use serde::Deserialize;
use store::{ContextStore, ResourceStore};

use crate::error::ApiError;
use crate::routes::orders::AppState;
use crate::routes::{MessageResponse, ProcessResponse};

#[derive(Deserialize)]
pub struct CreatePaymentRequest {
    pub id: uuid::Uuid,
    pub amount: i64,
}

#[derive(Deserialize)]
pub struct ReconcilePaymentRequest {
    pub id: uuid::Uuid,
    pub status: String,
}

/// POST /payment/create-payment — insert the pending payment record.
#[tracing::instrument(skip(state, req))]
pub async fn create<S: ResourceStore + ContextStore + Clone + Send + Sync + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Json(req): Json<CreatePaymentRequest>,
) -> Result<Json<MessageResponse>, ApiError> {
    let ack = state
        .payment
        .create(SagaId::from_uuid(req.id), req.amount)
        .await?;
    Ok(Json(MessageResponse {
        message: ack.message,
    }))
}

/// POST /payment/process-payment — apply the amount threshold rule.
#[tracing::instrument(skip(state, req))]
pub async fn process<S: ResourceStore + ContextStore + Clone + Send + Sync + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Json(req): Json<CreatePaymentRequest>,
) -> Result<Json<ProcessResponse>, ApiError> {
    let report = state
        .payment
        .process(SagaId::from_uuid(req.id), req.amount)
        .await?;
    Ok(Json(match report.outcome {
        StepOutcome::Processed => ProcessResponse::processed(report.message),
        StepOutcome::Exceeded => ProcessResponse::on_hold(report.message),
    }))
}

/// POST /payment/reconcile-payment — force-set the payment status.
#[tracing::instrument(skip(state, req))]
pub async fn reconcile<S: ResourceStore + ContextStore + Clone + Send + Sync + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Json(req): Json<ReconcilePaymentRequest>,
) -> Result<Json<MessageResponse>, ApiError> {
    let status: PaymentStatus = req
        .status
        .parse()
        .map_err(|e: domain::DomainError| ApiError::BadRequest(e.to_string()))?;
    let ack = state
        .payment
        .reconcile(SagaId::from_uuid(req.id), status)
        .await?;
    Ok(Json(MessageResponse {
        message: ack.message,
    }))
}
