//! FieldOps-State: Backend Layer for FieldOps
//!
//! This crate owns everything that talks to the back-office API: the wire
//! records for agents and calendar events, the async backend traits, a
//! `reqwest` implementation and in-memory fakes for tests.
//!
//! ## Key Components
//!
//! - `Agent` / `AgentPatch`: Agent records and partial updates
//! - `CalendarEvent`: Generic calendar event, normalized at the boundary
//! - `AgentBackend` / `EventSource`: Backend-agnostic async traits
//! - `HttpBackend`: REST implementation of both traits
//! - `fakes`: In-memory implementations with call counters and failure injection

pub mod backend;
mod config;
mod error;
pub mod fakes;
pub mod http;
mod schema;

pub use backend::{AgentBackend, BackendResult, EventSource};
pub use config::BackendConfig;
pub use error::BackendError;
pub use http::HttpBackend;
pub use schema::{
    Agent, AgentId, AgentPatch, AgentStatus, CalendarEvent, EventId, EventUpdate,
    Participant, MISSION_EVENT_TYPE,
};
