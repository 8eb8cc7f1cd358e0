use async_trait::async_trait;
use common::SagaId;
use domain::{
    ContextStatus, Order, OrderStatus, Payment, PaymentStatus, SagaContext, Shipment,
    ShipmentStatus,
};
use sqlx::{PgExecutor, PgPool, Postgres, Row, Transaction, postgres::PgRow};
use uuid::Uuid;

use crate::{
    ResourceKind, Result, StoreError,
    store::{ContextStore, ResourceStore, StoreTransaction},
};

/// PostgreSQL-backed resource store.
#[derive(Clone)]
pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    /// Creates a new PostgreSQL store.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Gets a reference to the underlying connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Runs the database migrations.
    pub async fn run_migrations(&self) -> std::result::Result<(), sqlx::migrate::MigrateError> {
        sqlx::migrate!("../../migrations").run(&self.pool).await
    }
}

fn row_to_order(row: PgRow) -> Result<Order> {
    Ok(Order {
        id: SagaId::from_uuid(row.try_get::<Uuid, _>("id")?),
        status: row.try_get::<String, _>("status")?.parse()?,
        amount: row.try_get("amount")?,
        quantity: row.try_get("quantity")?,
    })
}

fn row_to_payment(row: PgRow) -> Result<Payment> {
    Ok(Payment {
        id: SagaId::from_uuid(row.try_get::<Uuid, _>("id")?),
        status: row.try_get::<String, _>("status")?.parse()?,
        amount: row.try_get("amount")?,
    })
}

fn row_to_shipment(row: PgRow) -> Result<Shipment> {
    Ok(Shipment {
        id: SagaId::from_uuid(row.try_get::<Uuid, _>("id")?),
        status: row.try_get::<String, _>("status")?.parse()?,
        quantity: row.try_get("quantity")?,
    })
}

fn parse_context_column(value: Option<String>) -> Result<Option<ContextStatus>> {
    value
        .map(|s| s.parse::<ContextStatus>())
        .transpose()
        .map_err(StoreError::from)
}

fn row_to_context(row: PgRow) -> Result<SagaContext> {
    Ok(SagaContext {
        id: SagaId::from_uuid(row.try_get::<Uuid, _>("id")?),
        amount: row.try_get("amount")?,
        quantity: row.try_get("quantity")?,
        order: parse_context_column(row.try_get("order_status")?)?,
        payment: parse_context_column(row.try_get("payment_status")?)?,
        shipping: parse_context_column(row.try_get("shipping_status")?)?,
    })
}

// Shared between the pool-backed store and the transaction: the same
// statement runs against either executor.

async fn insert_order<'e, E: PgExecutor<'e>>(executor: E, order: &Order) -> Result<()> {
    let result = sqlx::query(
        "INSERT INTO orders (id, status, amount, quantity) VALUES ($1, $2, $3, $4) \
         ON CONFLICT (id) DO NOTHING",
    )
    .bind(order.id.as_uuid())
    .bind(order.status.as_str())
    .bind(order.amount)
    .bind(order.quantity)
    .execute(executor)
    .await?;

    if result.rows_affected() == 0 {
        return Err(StoreError::AlreadyExists {
            kind: ResourceKind::Order,
            id: order.id,
        });
    }
    Ok(())
}

async fn insert_payment<'e, E: PgExecutor<'e>>(executor: E, payment: &Payment) -> Result<()> {
    let result = sqlx::query(
        "INSERT INTO payments (id, status, amount) VALUES ($1, $2, $3) \
         ON CONFLICT (id) DO NOTHING",
    )
    .bind(payment.id.as_uuid())
    .bind(payment.status.as_str())
    .bind(payment.amount)
    .execute(executor)
    .await?;

    if result.rows_affected() == 0 {
        return Err(StoreError::AlreadyExists {
            kind: ResourceKind::Payment,
            id: payment.id,
        });
    }
    Ok(())
}

async fn insert_shipment<'e, E: PgExecutor<'e>>(executor: E, shipment: &Shipment) -> Result<()> {
    let result = sqlx::query(
        "INSERT INTO shipments (id, status, quantity) VALUES ($1, $2, $3) \
         ON CONFLICT (id) DO NOTHING",
    )
    .bind(shipment.id.as_uuid())
    .bind(shipment.status.as_str())
    .bind(shipment.quantity)
    .execute(executor)
    .await?;

    if result.rows_affected() == 0 {
        return Err(StoreError::AlreadyExists {
            kind: ResourceKind::Shipment,
            id: shipment.id,
        });
    }
    Ok(())
}

async fn update_status<'e, E: PgExecutor<'e>>(
    executor: E,
    table: &str,
    kind: ResourceKind,
    id: SagaId,
    status: &str,
) -> Result<()> {
    let sql = format!("UPDATE {table} SET status = $2 WHERE id = $1");
    let result = sqlx::query(&sql)
        .bind(id.as_uuid())
        .bind(status)
        .execute(executor)
        .await?;

    if result.rows_affected() == 0 {
        return Err(StoreError::NotFound { kind, id });
    }
    Ok(())
}

#[async_trait]
impl ResourceStore for PostgresStore {
    type Tx = PostgresTransaction;

    async fn begin(&self) -> Result<Self::Tx> {
        let tx = self.pool.begin().await?;
        Ok(PostgresTransaction { tx })
    }

    async fn create_order(&self, order: Order) -> Result<()> {
        insert_order(&self.pool, &order).await
    }

    async fn create_payment(&self, payment: Payment) -> Result<()> {
        insert_payment(&self.pool, &payment).await
    }

    async fn create_shipment(&self, shipment: Shipment) -> Result<()> {
        insert_shipment(&self.pool, &shipment).await
    }

    async fn get_order(&self, id: SagaId) -> Result<Order> {
        let row = sqlx::query("SELECT id, status, amount, quantity FROM orders WHERE id = $1")
            .bind(id.as_uuid())
            .fetch_optional(&self.pool)
            .await?
            .ok_or(StoreError::NotFound {
                kind: ResourceKind::Order,
                id,
            })?;
        row_to_order(row)
    }

    async fn get_payment(&self, id: SagaId) -> Result<Payment> {
        let row = sqlx::query("SELECT id, status, amount FROM payments WHERE id = $1")
            .bind(id.as_uuid())
            .fetch_optional(&self.pool)
            .await?
            .ok_or(StoreError::NotFound {
                kind: ResourceKind::Payment,
                id,
            })?;
        row_to_payment(row)
    }

    async fn get_shipment(&self, id: SagaId) -> Result<Shipment> {
        let row = sqlx::query("SELECT id, status, quantity FROM shipments WHERE id = $1")
            .bind(id.as_uuid())
            .fetch_optional(&self.pool)
            .await?
            .ok_or(StoreError::NotFound {
                kind: ResourceKind::Shipment,
                id,
            })?;
        row_to_shipment(row)
    }

    async fn set_order_status(&self, id: SagaId, status: OrderStatus) -> Result<()> {
        update_status(&self.pool, "orders", ResourceKind::Order, id, status.as_str()).await
    }

    async fn set_payment_status(&self, id: SagaId, status: PaymentStatus) -> Result<()> {
        update_status(
            &self.pool,
            "payments",
            ResourceKind::Payment,
            id,
            status.as_str(),
        )
        .await
    }

    async fn set_shipment_status(&self, id: SagaId, status: ShipmentStatus) -> Result<()> {
        update_status(
            &self.pool,
            "shipments",
            ResourceKind::Shipment,
            id,
            status.as_str(),
        )
        .await
    }
}

impl PostgresStore {
    async fn set_context_column(
        &self,
        column: &str,
        id: SagaId,
        status: ContextStatus,
    ) -> Result<bool> {
        let sql = format!(
            "UPDATE saga_contexts SET {column} = $2 \
             WHERE id = $1 AND {column} IS DISTINCT FROM $2"
        );
        let result = sqlx::query(&sql)
            .bind(id.as_uuid())
            .bind(status.as_str())
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 1 {
            return Ok(true);
        }

        // Zero rows means either the value was already set or the record
        // is missing; disambiguate for the caller.
        let exists = sqlx::query("SELECT 1 FROM saga_contexts WHERE id = $1")
            .bind(id.as_uuid())
            .fetch_optional(&self.pool)
            .await?;
        if exists.is_none() {
            return Err(StoreError::NotFound {
                kind: ResourceKind::Context,
                id,
            });
        }
        Ok(false)
    }
}

#[async_trait]
impl ContextStore for PostgresStore {
    async fn insert_context(&self, context: SagaContext) -> Result<()> {
        let result = sqlx::query(
            "INSERT INTO saga_contexts (id, amount, quantity, order_status, payment_status, shipping_status) \
             VALUES ($1, $2, $3, $4, $5, $6) ON CONFLICT (id) DO NOTHING",
        )
        .bind(context.id.as_uuid())
        .bind(context.amount)
        .bind(context.quantity)
        .bind(context.order.map(|s| s.as_str()))
        .bind(context.payment.map(|s| s.as_str()))
        .bind(context.shipping.map(|s| s.as_str()))
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::AlreadyExists {
                kind: ResourceKind::Context,
                id: context.id,
            });
        }
        Ok(())
    }

    async fn get_context(&self, id: SagaId) -> Result<SagaContext> {
        let row = sqlx::query(
            "SELECT id, amount, quantity, order_status, payment_status, shipping_status \
             FROM saga_contexts WHERE id = $1",
        )
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await?
        .ok_or(StoreError::NotFound {
            kind: ResourceKind::Context,
            id,
        })?;
        row_to_context(row)
    }

    async fn set_context_order(&self, id: SagaId, status: ContextStatus) -> Result<bool> {
        self.set_context_column("order_status", id, status).await
    }

    async fn set_context_payment(&self, id: SagaId, status: ContextStatus) -> Result<bool> {
        self.set_context_column("payment_status", id, status).await
    }

    async fn set_context_shipping(&self, id: SagaId, status: ContextStatus) -> Result<bool> {
        self.set_context_column("shipping_status", id, status).await
    }
}

/// A PostgreSQL transaction over the resource tables.
pub struct PostgresTransaction {
    tx: Transaction<'static, Postgres>,
}

#[async_trait]
impl StoreTransaction for PostgresTransaction {
    async fn create_order(&mut self, order: Order) -> Result<()> {
        insert_order(&mut *self.tx, &order).await
    }

    async fn create_payment(&mut self, payment: Payment) -> Result<()> {
        insert_payment(&mut *self.tx, &payment).await
    }

    async fn create_shipment(&mut self, shipment: Shipment) -> Result<()> {
        insert_shipment(&mut *self.tx, &shipment).await
    }

    async fn set_order_status(&mut self, id: SagaId, status: OrderStatus) -> Result<()> {
        update_status(
            &mut *self.tx,
            "orders",
            ResourceKind::Order,
            id,
            status.as_str(),
        )
        .await
    }

    async fn set_payment_status(&mut self, id: SagaId, status: PaymentStatus) -> Result<()> {
        update_status(
            &mut *self.tx,
            "payments",
            ResourceKind::Payment,
            id,
            status.as_str(),
        )
        .await
    }

    async fn set_shipment_status(&mut self, id: SagaId, status: ShipmentStatus) -> Result<()> {
        update_status(
            &mut *self.tx,
            "shipments",
            ResourceKind::Shipment,
            id,
            status.as_str(),
        )
        .await
    }

    async fn commit(self) -> Result<()> {
        self.tx.commit().await?;
        Ok(())
    }

    async fn rollback(self) -> Result<()> {
        self.tx.rollback().await?;
        Ok(())
    }
}
