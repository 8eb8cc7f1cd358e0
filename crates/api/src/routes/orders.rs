//! Saga entry points and order-level operations.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use common::SagaId;
use domain::OrderStatus;
use saga::{
    ChoreographyCoordinator, MonolithCoordinator, OrderParticipant, OrderService,
    PaymentService, SagaOrchestrator, SagaReport, SagaState, ShippingService,
    WorkflowCoordinator,
};
use serde::{Deserialize, Serialize};
use store::{ContextStore, ResourceStore};

use crate::error::ApiError;
use crate::routes::MessageResponse;

/// Shared application state accessible from all handlers.
pub struct AppState<S: ResourceStore + ContextStore + Clone + Send + Sync + 'static> {
    pub monolith: MonolithCoordinator<S>,
    pub orchestrator:
        SagaOrchestrator<OrderService<S>, PaymentService<S>, ShippingService<S>>,
    pub workflow: WorkflowCoordinator<OrderService<S>, PaymentService<S>, ShippingService<S>>,
    pub choreography: ChoreographyCoordinator<S>,
    pub order: OrderService<S>,
    pub payment: PaymentService<S>,
    pub shipping: ShippingService<S>,
}

impl<S: ResourceStore + ContextStore + Clone + Send + Sync + 'static> AppState<S> {
    /// Builds every coordinator over one store and one set of services.
    pub fn new(
        store: S,
        order: OrderService<S>,
        payment: PaymentService<S>,
        shipping: ShippingService<S>,
    ) -> Self {
        Self {
            monolith: MonolithCoordinator::new(store.clone()),
            orchestrator: SagaOrchestrator::new(
                order.clone(),
                payment.clone(),
                shipping.clone(),
            ),
            workflow: WorkflowCoordinator::new(order.clone(), payment.clone(), shipping.clone()),
            choreography: ChoreographyCoordinator::new(
                store,
                order.clone(),
                payment.clone(),
                shipping.clone(),
            ),
            order,
            payment,
            shipping,
        }
    }
}

// -- Request types --

#[derive(Deserialize)]
pub struct CreateOrderRequest {
    pub amount: i64,
    pub quantity: i64,
}

#[derive(Deserialize)]
pub struct ReconcileOrderRequest {
    pub id: uuid::Uuid,
    pub status: String,
}

// -- Response types --

#[derive(Serialize)]
pub struct MessageEntry {
    pub message: String,
}

#[derive(Serialize)]
pub struct CreateOrderResponse {
    pub id: String,
    pub amount: i64,
    pub quantity: i64,
    pub state: String,
    pub results: Vec<MessageEntry>,
}

impl CreateOrderResponse {
    fn from_report(report: SagaReport) -> Self {
        Self {
            id: report.id.to_string(),
            amount: report.amount,
            quantity: report.quantity,
            state: report.state.to_string(),
            results: report
                .messages
                .into_iter()
                .map(|message| MessageEntry { message })
                .collect(),
        }
    }
}

#[derive(Serialize)]
pub struct StatusResponse {
    pub status: String,
}

pub(crate) fn parse_saga_id(raw: &str) -> Result<SagaId, ApiError> {
    let uuid = uuid::Uuid::parse_str(raw)
        .map_err(|e| ApiError::BadRequest(format!("Invalid saga id: {e}")))?;
    Ok(SagaId::from_uuid(uuid))
}

// -- Handlers --

/// POST /monolith/create-order — run the saga as one set of store
/// transactions.
#[tracing::instrument(skip(state, req))]
pub async fn create_monolith<S: ResourceStore + ContextStore + Clone + Send + Sync + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Json(req): Json<CreateOrderRequest>,
) -> Result<Json<CreateOrderResponse>, ApiError> {
    let report = state.monolith.run(req.amount, req.quantity).await?;
    Ok(Json(CreateOrderResponse::from_report(report)))
}

/// POST /orchestration/create-order — run the saga through the
/// synchronous orchestrator.
#[tracing::instrument(skip(state, req))]
pub async fn create_orchestration<
    S: ResourceStore + ContextStore + Clone + Send + Sync + 'static,
>(
    State(state): State<Arc<AppState<S>>>,
    Json(req): Json<CreateOrderRequest>,
) -> Result<Json<CreateOrderResponse>, ApiError> {
    let report = state.orchestrator.run(req.amount, req.quantity).await?;
    Ok(Json(CreateOrderResponse::from_report(report)))
}

/// POST /workflow/create-order — run the saga through the workflow
/// interpreter; a hard-failure terminal state maps to an error body.
#[tracing::instrument(skip(state, req))]
pub async fn create_workflow<S: ResourceStore + ContextStore + Clone + Send + Sync + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Json(req): Json<CreateOrderRequest>,
) -> Result<Json<CreateOrderResponse>, ApiError> {
    let report = state.workflow.run(req.amount, req.quantity).await?;
    if report.state == SagaState::Failed {
        let reason = report
            .failure
            .unwrap_or_else(|| "saga failed".to_string());
        return Err(ApiError::SagaFailed(reason));
    }
    Ok(Json(CreateOrderResponse::from_report(report)))
}

/// POST /choreography/create-order — record the context, kick off the
/// notification flow and respond before the saga settles.
#[tracing::instrument(skip(state, req))]
pub async fn create_choreography<
    S: ResourceStore + ContextStore + Clone + Send + Sync + 'static,
>(
    State(state): State<Arc<AppState<S>>>,
    Json(req): Json<CreateOrderRequest>,
) -> Result<(StatusCode, Json<CreateOrderResponse>), ApiError> {
    let report = state.choreography.submit(req.amount, req.quantity).await?;

    let coordinator = state.choreography.clone();
    tokio::spawn(async move {
        if let Err(error) = coordinator.run_to_completion().await {
            tracing::error!(%error, "choreography drain failed");
        }
    });

    Ok((
        StatusCode::ACCEPTED,
        Json(CreateOrderResponse::from_report(report)),
    ))
}

/// GET /orders/{id}/status — the order's current status.
#[tracing::instrument(skip(state))]
pub async fn status<S: ResourceStore + ContextStore + Clone + Send + Sync + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
) -> Result<Json<StatusResponse>, ApiError> {
    let id = parse_saga_id(&id)?;
    let status = state.order.status(id).await.map_err(|e| match e {
        saga::SagaError::Store(ref store_err) if store_err.is_not_found() => {
            ApiError::NotFound(format!("Order {id} not found"))
        }
        other => ApiError::Saga(other),
    })?;
    Ok(Json(StatusResponse {
        status: status.to_string(),
    }))
}

/// POST /order/reconcile-order — force-set the order status.
#[tracing::instrument(skip(state, req))]
pub async fn reconcile<S: ResourceStore + ContextStore + Clone + Send + Sync + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Json(req): Json<ReconcileOrderRequest>,
) -> Result<Json<MessageResponse>, ApiError> {
    let status: OrderStatus = req
        .status
        .parse()
        .map_err(|e: domain::DomainError| ApiError::BadRequest(e.to_string()))?;
    let ack = state
        .order
        .reconcile(SagaId::from_uuid(req.id), status)
        .await?;
    Ok(Json(MessageResponse {
        message: ack.message,
    }))
}
