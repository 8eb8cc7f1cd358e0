//! Resource store for the order fulfillment saga.
//!
//! The store is a transactional keyed-record store holding the Order,
//! Payment and Shipment records plus the choreography context record.
//! Two implementations are provided: an in-memory store for tests,
//! benches and the default server, and a PostgreSQL store.

pub mod error;
pub mod memory;
pub mod postgres;
pub mod store;

pub use common::SagaId;
pub use error::{ResourceKind, Result, StoreError};
pub use memory::{InMemoryStore, InMemoryTransaction};
pub use postgres::{PostgresStore, PostgresTransaction};
pub use store::{ContextStore, ResourceStore, StoreTransaction};
