//! Domain model for the order fulfillment saga.
//!
//! This crate provides the pure domain layer shared by every coordination
//! variant:
//! - the Order / Payment / Shipment records and their status state machines
//! - the saga context projection used by the choreographed variant
//! - input validation and the payment/shipping threshold rules

pub mod context;
pub mod error;
pub mod record;
pub mod rules;
pub mod status;

pub use context::{ContextStatus, SagaContext};
pub use error::DomainError;
pub use record::{Order, Payment, Shipment};
pub use rules::{
    PAYMENT_AMOUNT_LIMIT, SHIPPING_QUANTITY_LIMIT, payment_status_for, shipment_status_for,
    validate_amount, validate_quantity,
};
pub use status::{OrderStatus, PaymentStatus, ShipmentStatus};
