//! Asynchronous event-choreography variant.
//!
//! Coordination happens through broadcast notifications instead of a
//! controlling call stack: participants react to commands, the context
//! keeper projects their outcomes, and the persisted context record
//! decides when the saga may advance.

pub mod bus;
pub mod coordinator;
pub mod notification;

pub use bus::InMemoryEventBus;
pub use coordinator::ChoreographyCoordinator;
pub use notification::{
    Command, Detail, Notification, Operation, ORDER_CONTEXT_SOURCE, Signal, WireNotification,
};
