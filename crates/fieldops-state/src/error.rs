//! Error types for fieldops-state

use thiserror::Error;

use crate::schema::{AgentId, EventId};

/// Errors that can occur while talking to the back-office API
#[derive(Error, Debug)]
pub enum BackendError {
    /// Connection refused, DNS failure, timeout
    #[error("Backend unreachable: {0}")]
    Transport(String),

    /// Non-2xx response
    #[error("Backend returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    /// Response body did not have the expected shape
    #[error("Malformed backend response: {0}")]
    MalformedResponse(String),

    /// Agent not known to the backend
    #[error("Agent not found: {agent_id}")]
    AgentNotFound { agent_id: AgentId },

    /// Event not known to the backend
    #[error("Event not found: {event_id}")]
    EventNotFound { event_id: EventId },

    /// Injected by the in-memory fakes
    #[error("Backend offline")]
    Offline,

    /// Invalid backend configuration
    #[error("Invalid backend configuration: {0}")]
    Config(String),
}

impl From<reqwest::Error> for BackendError {
    fn from(err: reqwest::Error) -> Self {
        if let Some(status) = err.status() {
            BackendError::Status {
                status: status.as_u16(),
                body: err.to_string(),
            }
        } else if err.is_decode() {
            BackendError::MalformedResponse(err.to_string())
        } else {
            BackendError::Transport(err.to_string())
        }
    }
}

impl From<serde_json::Error> for BackendError {
    fn from(err: serde_json::Error) -> Self {
        BackendError::MalformedResponse(err.to_string())
    }
}
