//! PostgreSQL integration tests
//!
//! These tests share one PostgreSQL container; serial_test keeps the
//! per-test table truncation from racing.

use std::sync::Arc;

use domain::{
    ContextStatus, Order, OrderStatus, Payment, PaymentStatus, SagaContext, Shipment,
    ShipmentStatus,
};
use serial_test::serial;
use sqlx::PgPool;
use store::{ContextStore, PostgresStore, ResourceStore, SagaId, StoreTransaction};
use testcontainers::{ContainerAsync, runners::AsyncRunner};
use testcontainers_modules::postgres::Postgres;
use tokio::sync::OnceCell;

/// Shared container info - container stays alive for all tests
struct ContainerInfo {
    #[allow(dead_code)] // Container must stay alive for tests
    container: ContainerAsync<Postgres>,
    connection_string: String,
}

/// Global shared container
static CONTAINER: OnceCell<Arc<ContainerInfo>> = OnceCell::const_new();

async fn get_container_info() -> Arc<ContainerInfo> {
    CONTAINER
        .get_or_init(|| async {
            let container = Postgres::default().start().await.unwrap();

            let host = container.get_host().await.unwrap();
            let port = container.get_host_port_ipv4(5432).await.unwrap();

            let connection_string =
                format!("postgres://postgres:postgres@{}:{}/postgres", host, port);

            // Create a temporary pool just for the schema bootstrap
            let temp_pool = PgPool::connect(&connection_string).await.unwrap();

            sqlx::raw_sql(include_str!(
                "../../../migrations/001_create_saga_tables.sql"
            ))
            .execute(&temp_pool)
            .await
            .unwrap();

            temp_pool.close().await;

            Arc::new(ContainerInfo {
                container,
                connection_string,
            })
        })
        .await
        .clone()
}

/// Get a fresh store with its own pool and cleared tables
async fn get_test_store() -> PostgresStore {
    let info = get_container_info().await;

    let pool = sqlx::postgres::PgPoolOptions::new()
        .max_connections(5)
        .connect(&info.connection_string)
        .await
        .unwrap();

    sqlx::query("TRUNCATE TABLE orders, payments, shipments, saga_contexts")
        .execute(&pool)
        .await
        .unwrap();

    PostgresStore::new(pool)
}

#[tokio::test]
#[serial]
async fn create_and_get_records() {
    let store = get_test_store().await;
    let id = SagaId::new();

    store.create_order(Order::pending(id, 500, 10)).await.unwrap();
    store.create_payment(Payment::pending(id, 500)).await.unwrap();
    store.create_shipment(Shipment::pending(id, 10)).await.unwrap();

    let order = store.get_order(id).await.unwrap();
    assert_eq!(order.status, OrderStatus::Pending);
    assert_eq!(order.amount, 500);
    assert_eq!(order.quantity, 10);

    assert_eq!(store.get_payment(id).await.unwrap().amount, 500);
    assert_eq!(store.get_shipment(id).await.unwrap().quantity, 10);
}

#[tokio::test]
#[serial]
async fn duplicate_create_is_rejected() {
    let store = get_test_store().await;
    let id = SagaId::new();

    store.create_payment(Payment::pending(id, 500)).await.unwrap();
    let err = store
        .create_payment(Payment::pending(id, 999))
        .await
        .unwrap_err();
    assert!(err.is_already_exists());

    // The original record is untouched.
    assert_eq!(store.get_payment(id).await.unwrap().amount, 500);
}

#[tokio::test]
#[serial]
async fn missing_records_are_not_found() {
    let store = get_test_store().await;
    let id = SagaId::new();

    assert!(store.get_order(id).await.unwrap_err().is_not_found());
    assert!(
        store
            .set_payment_status(id, PaymentStatus::OnHold)
            .await
            .unwrap_err()
            .is_not_found()
    );
    assert!(store.get_context(id).await.unwrap_err().is_not_found());
}

#[tokio::test]
#[serial]
async fn status_update_roundtrip() {
    let store = get_test_store().await;
    let id = SagaId::new();

    store.create_shipment(Shipment::pending(id, 500)).await.unwrap();
    store
        .set_shipment_status(id, ShipmentStatus::Exceeded)
        .await
        .unwrap();
    assert_eq!(
        store.get_shipment(id).await.unwrap().status,
        ShipmentStatus::Exceeded
    );

    store
        .set_shipment_status(id, ShipmentStatus::OnHold)
        .await
        .unwrap();
    assert_eq!(
        store.get_shipment(id).await.unwrap().status,
        ShipmentStatus::OnHold
    );
}

#[tokio::test]
#[serial]
async fn transaction_commit_is_atomic() {
    let store = get_test_store().await;
    let id = SagaId::new();

    let mut tx = store.begin().await.unwrap();
    tx.create_order(Order::pending(id, 100, 5)).await.unwrap();
    tx.create_payment(Payment::pending(id, 100)).await.unwrap();
    tx.create_shipment(Shipment::pending(id, 5)).await.unwrap();
    tx.commit().await.unwrap();

    assert!(store.get_order(id).await.is_ok());
    assert!(store.get_payment(id).await.is_ok());
    assert!(store.get_shipment(id).await.is_ok());
}

#[tokio::test]
#[serial]
async fn transaction_rollback_discards_writes() {
    let store = get_test_store().await;
    let id = SagaId::new();

    let mut tx = store.begin().await.unwrap();
    tx.create_order(Order::pending(id, 100, 5)).await.unwrap();
    tx.create_payment(Payment::pending(id, 100)).await.unwrap();
    tx.rollback().await.unwrap();

    assert!(store.get_order(id).await.unwrap_err().is_not_found());
    assert!(store.get_payment(id).await.unwrap_err().is_not_found());
}

#[tokio::test]
#[serial]
async fn context_roundtrip_and_change_detection() {
    let store = get_test_store().await;
    let id = SagaId::new();

    store
        .insert_context(SagaContext::new(id, 100, 5))
        .await
        .unwrap();

    let context = store.get_context(id).await.unwrap();
    assert_eq!(context.amount, 100);
    assert_eq!(context.quantity, 5);
    assert!(context.order.is_none());
    assert!(context.payment.is_none());
    assert!(context.shipping.is_none());

    assert!(
        store
            .set_context_payment(id, ContextStatus::Created)
            .await
            .unwrap()
    );
    assert!(
        !store
            .set_context_payment(id, ContextStatus::Created)
            .await
            .unwrap()
    );
    assert!(
        store
            .set_context_payment(id, ContextStatus::Processed)
            .await
            .unwrap()
    );
    assert!(
        store
            .set_context_shipping(id, ContextStatus::Error)
            .await
            .unwrap()
    );
    assert!(
        store
            .set_context_order(id, ContextStatus::Reconciled)
            .await
            .unwrap()
    );

    let context = store.get_context(id).await.unwrap();
    assert_eq!(context.payment, Some(ContextStatus::Processed));
    assert_eq!(context.shipping, Some(ContextStatus::Error));
    assert_eq!(context.order, Some(ContextStatus::Reconciled));

    let err = store
        .insert_context(SagaContext::new(id, 100, 5))
        .await
        .unwrap_err();
    assert!(err.is_already_exists());
}

#[tokio::test]
#[serial]
async fn context_setter_on_missing_record_is_not_found() {
    let store = get_test_store().await;
    let id = SagaId::new();

    let err = store
        .set_context_order(id, ContextStatus::Created)
        .await
        .unwrap_err();
    assert!(err.is_not_found());
}
