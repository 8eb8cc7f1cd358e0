//! Shipping participant endpoints (request/response surface).

use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use common::SagaId;
use domain::ShipmentStatus;
use saga::{ShippingParticipant, StepOutcome};
use serde::Deserialize;
use store::{ContextStore, ResourceStore};

use crate::error::ApiError;
use crate::routes::orders::AppState;
use crate::routes::{MessageResponse, ProcessResponse};

#[derive(Deserialize)]
pub struct CreateShippingRequest {
    pub id: uuid::Uuid,
    pub quantity: i64,
}

#[derive(Deserialize)]
pub struct ReconcileShippingRequest {
    pub id: uuid::Uuid,
    pub status: String,
}

/// POST /shipping/create-shipping — insert the pending shipment record.
#[tracing::instrument(skip(state, req))]
pub async fn create<S: ResourceStore + ContextStore + Clone + Send + Sync + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Json(req): Json<CreateShippingRequest>,
) -> Result<Json<MessageResponse>, ApiError> {
    let ack = state
        .shipping
        .create(SagaId::from_uuid(req.id), req.quantity)
        .await?;
    Ok(Json(MessageResponse {
        message: ack.message,
    }))
}

/// POST /shipping/process-shipping — apply the quantity threshold rule.
#[tracing::instrument(skip(state, req))]
pub async fn process<S: ResourceStore + ContextStore + Clone + Send + Sync + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Json(req): Json<CreateShippingRequest>,
) -> Result<Json<ProcessResponse>, ApiError> {
    let report = state
        .shipping
        .process(SagaId::from_uuid(req.id), req.quantity)
        .await?;
    Ok(Json(match report.outcome {
        StepOutcome::Processed => ProcessResponse::processed(report.message),
        StepOutcome::Exceeded => ProcessResponse::on_hold(report.message),
    }))
}

/// POST /shipping/reconcile-shipping — force-set the shipment status.
#[tracing::instrument(skip(state, req))]
pub async fn reconcile<S: ResourceStore + ContextStore + Clone + Send + Sync + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Json(req): Json<ReconcileShippingRequest>,
) -> Result<Json<MessageResponse>, ApiError> {
    let status: ShipmentStatus = req
        .status
        .parse()
        .map_err(|e: domain::DomainError| ApiError::BadRequest(e.to_string()))?;
    let ack = state
        .shipping
        .reconcile(SagaId::from_uuid(req.id), status)
        .await?;
    Ok(Json(MessageResponse {
        message: ack.message,
    }))
}
