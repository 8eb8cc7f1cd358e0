//! HTTP API server for the order fulfillment saga.
//!
//! Exposes one create-order entry point per coordination variant, the
//! participant operations of the request/response surface, and a
//! status endpoint, with structured logging (tracing) and Prometheus
//! metrics.

pub mod config;
pub mod error;
pub mod routes;

use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post};
use metrics_exporter_prometheus::PrometheusHandle;
use saga::{OrderService, PaymentService, ShippingService};
use store::{ContextStore, ResourceStore};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use routes::orders::AppState;

/// Creates the Axum application router with all routes and shared state.
pub fn create_app<S: ResourceStore + ContextStore + Clone + Send + Sync + 'static>(
    state: Arc<AppState<S>>,
    metrics_handle: PrometheusHandle,
) -> Router {
    let metrics_router = Router::new()
        .route("/metrics", get(routes::metrics::get))
        .with_state(metrics_handle);

    Router::new()
        .route("/health", get(routes::health::check))
        .route(
            "/monolith/create-order",
            post(routes::orders::create_monolith::<S>),
        )
        .route(
            "/orchestration/create-order",
            post(routes::orders::create_orchestration::<S>),
        )
        .route(
            "/workflow/create-order",
            post(routes::orders::create_workflow::<S>),
        )
        .route(
            "/choreography/create-order",
            post(routes::orders::create_choreography::<S>),
        )
        .route("/orders/{id}/status", get(routes::orders::status::<S>))
        .route("/order/reconcile-order", post(routes::orders::reconcile::<S>))
        .route("/payment/create-payment", post(routes::payment::create::<S>))
        .route("/payment/process-payment", post(routes::payment::process::<S>))
        .route(
            "/payment/reconcile-payment",
            post(routes::payment::reconcile::<S>),
        )
        .route("/shipping/create-shipping", post(routes::shipping::create::<S>))
        .route(
            "/shipping/process-shipping",
            post(routes::shipping::process::<S>),
        )
        .route(
            "/shipping/reconcile-shipping",
            post(routes::shipping::reconcile::<S>),
        )
        .with_state(state)
        .merge(metrics_router)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
}

/// Creates the default application state over the given store.
pub fn create_default_state<S: ResourceStore + ContextStore + Clone + Send + Sync + 'static>(
    store: S,
) -> Arc<AppState<S>> {
    let order = OrderService::new(store.clone());
    let payment = PaymentService::new(store.clone());
    let shipping = ShippingService::new(store.clone());
    Arc::new(AppState::new(store, order, payment, shipping))
}
