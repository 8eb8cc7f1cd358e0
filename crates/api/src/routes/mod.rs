//! Route handlers.

pub mod health;
pub mod metrics;
pub mod orders;
pub mod payment;
pub mod shipping;

use serde::Serialize;

/// Plain acknowledgement body.
#[derive(Serialize)]
pub struct MessageResponse {
    pub message: String,
}

/// Body of a processing operation: a message on success, or the
/// threshold error with the suggested compensation status. Both are
/// HTTP 200 — a threshold result is business data, not a fault.
#[derive(Serialize)]
pub struct ProcessResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
}

impl ProcessResponse {
    pub(crate) fn processed(message: String) -> Self {
        Self {
            message: Some(message),
            error: None,
            status: None,
        }
    }

    pub(crate) fn on_hold(error: String) -> Self {
        Self {
            message: None,
            error: Some(error),
            status: Some("OnHold".to_string()),
        }
    }
}
