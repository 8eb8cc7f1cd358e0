//! Order fulfillment saga.
//!
//! One saga (create an Order, a Payment and a Shipment, process the two
//! siblings concurrently, then reconcile partial failure back to a
//! consistent terminal state) implemented over four coordination
//! strategies that share one state machine and one decision table:
//!
//! 1. [`MonolithCoordinator`]: every write in one store transaction.
//! 2. [`SagaOrchestrator`]: a synchronous coordinator invoking the
//!    participant services directly and joining their outcomes.
//! 3. [`WorkflowCoordinator`]: a table-driven state machine interpreter
//!    with retry and catch rules.
//! 4. [`ChoreographyCoordinator`]: independent reactions to bus
//!    notifications, coordinated through a persisted context record.

pub mod choreography;
pub mod decision;
pub mod error;
pub mod monolith;
pub mod orchestrator;
pub mod report;
pub mod retry;
pub mod services;
pub mod state;
pub mod workflow;

pub use choreography::{
    ChoreographyCoordinator, Command, Detail, InMemoryEventBus, Notification, Operation, Signal,
    WireNotification,
};
pub use decision::{Decision, StepOutcome};
pub use error::SagaError;
pub use monolith::MonolithCoordinator;
pub use orchestrator::SagaOrchestrator;
pub use report::SagaReport;
pub use retry::RetryPolicy;
pub use services::{
    Ack, OrderParticipant, OrderService, PaymentParticipant, PaymentService, ProcessReport,
    ShippingParticipant, ShippingService,
};
pub use state::SagaState;
pub use workflow::{FlowStep, WorkflowCoordinator};
