//! Backend trait definitions for FieldOps
//!
//! These traits define the two remote collaborators of the agent core:
//! - `AgentBackend`: agent records (list, patch, delete, assign)
//! - `EventSource`: calendar events, of which missions are a projection
//!
//! All traits are async and transport-agnostic. `HttpBackend` implements both
//! against the REST API; in-memory fakes are provided for testing via the
//! `fakes` module.

use async_trait::async_trait;

use crate::error::BackendError;
use crate::schema::{Agent, AgentId, AgentPatch, CalendarEvent, EventId, EventUpdate};

/// Result type for backend operations
pub type BackendResult<T> = std::result::Result<T, BackendError>;

// ---------------------------------------------------------------------------
// AgentBackend
// ---------------------------------------------------------------------------

/// Remote store of agent records.
///
/// Every call is a single attempt; callers decide how to recover.
#[async_trait]
pub trait AgentBackend: Send + Sync {
    /// Fetch every agent.
    async fn list_agents(&self) -> BackendResult<Vec<Agent>>;

    /// Apply a partial update and return the server's representation.
    async fn update_agent(&self, id: AgentId, patch: &AgentPatch) -> BackendResult<Agent>;

    /// Delete an agent.
    async fn delete_agent(&self, id: AgentId) -> BackendResult<()>;

    /// Assign an agent to a mission and return the updated agent.
    async fn assign_agent(&self, id: AgentId, mission_id: EventId) -> BackendResult<Agent>;
}

// ---------------------------------------------------------------------------
// EventSource
// ---------------------------------------------------------------------------

/// Remote calendar holding mission events.
#[async_trait]
pub trait EventSource: Send + Sync {
    /// Fetch every calendar event, of any type.
    async fn list_events(&self) -> BackendResult<Vec<CalendarEvent>>;

    /// Overwrite an event's status and agent list.
    async fn update_event(&self, id: EventId, update: &EventUpdate)
        -> BackendResult<CalendarEvent>;
}

#[async_trait]
impl<T: AgentBackend + ?Sized> AgentBackend for std::sync::Arc<T> {
    async fn list_agents(&self) -> BackendResult<Vec<Agent>> {
        (**self).list_agents().await
    }

    async fn update_agent(&self, id: AgentId, patch: &AgentPatch) -> BackendResult<Agent> {
        (**self).update_agent(id, patch).await
    }

    async fn delete_agent(&self, id: AgentId) -> BackendResult<()> {
        (**self).delete_agent(id).await
    }

    async fn assign_agent(&self, id: AgentId, mission_id: EventId) -> BackendResult<Agent> {
        (**self).assign_agent(id, mission_id).await
    }
}

#[async_trait]
impl<T: EventSource + ?Sized> EventSource for std::sync::Arc<T> {
    async fn list_events(&self) -> BackendResult<Vec<CalendarEvent>> {
        (**self).list_events().await
    }

    async fn update_event(
        &self,
        id: EventId,
        update: &EventUpdate,
    ) -> BackendResult<CalendarEvent> {
        (**self).update_event(id, update).await
    }
}
