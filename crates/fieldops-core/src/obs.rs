//! Structured observability hooks for the agent core.
//!
//! This module provides:
//! - Session-scoped tracing spans via the `SessionSpan` RAII guard
//! - Emission functions for directory and mission-board events
//!
//! Every event carries an `event = "<area>.<what>"` field so log pipelines
//! can filter without parsing messages.

use tracing::{error, info, warn};
use uuid::Uuid;

use fieldops_state::{AgentId, EventId};

/// RAII guard that enters a session-scoped span.
///
/// # Example
///
/// ```ignore
/// let _span = SessionSpan::enter();
/// // every directory/board event now carries session_id
/// ```
pub struct SessionSpan {
    session_id: Uuid,
    _span: tracing::span::EnteredSpan,
}

impl SessionSpan {
    /// Create and enter a span tagged with a fresh session id.
    pub fn enter() -> Self {
        let session_id = Uuid::new_v4();
        let span = tracing::info_span!("fieldops.session", session_id = %session_id);
        Self {
            session_id,
            _span: span.entered(),
        }
    }

    pub fn session_id(&self) -> Uuid {
        self.session_id
    }
}

/// Emit event: directory collection replaced by a refresh.
pub fn emit_refresh_finished(agents: usize, active_ids: usize, reconciled: usize) {
    info!(
        event = "directory.refreshed",
        agents = agents,
        active_ids = active_ids,
        reconciled = reconciled,
    );
}

/// Emit event: a read path failed; the previous state is kept.
pub fn emit_load_failed(what: &str, error: &dyn std::fmt::Display) {
    error!(event = "load.failed", what = %what, error = %error);
}

/// Emit event: a backend mutation failed and a local patch was applied.
pub fn emit_fallback_applied(operation: &str, agent_id: AgentId, error: &dyn std::fmt::Display) {
    warn!(
        event = "directory.fallback",
        operation = %operation,
        agent_id = agent_id,
        error = %error,
    );
}

/// Emit event: a backend delete failed; the agent is removed locally anyway.
pub fn emit_remote_delete_failed(agent_id: AgentId, error: &dyn std::fmt::Display) {
    warn!(event = "directory.delete_failed", agent_id = agent_id, error = %error);
}

/// Emit event: assignment refused before any backend call.
pub fn emit_assign_rejected(agent_id: AgentId, mission_id: EventId) {
    warn!(
        event = "directory.assign_rejected",
        agent_id = agent_id,
        mission_id = mission_id,
    );
}

/// Emit event: a reconciliation pass ran over the collection.
pub fn emit_reconciled(active_ids: usize, changed: usize) {
    info!(event = "directory.reconciled", active_ids = active_ids, changed = changed);
}

/// Emit event: mission board loaded.
pub fn emit_missions_loaded(missions: usize, running: usize) {
    info!(event = "missions.loaded", missions = missions, running = running);
}

/// Emit event: the calendar rejected a mission update; the local copy is
/// updated anyway.
pub fn emit_mission_update_failed(mission_id: EventId, error: &dyn std::fmt::Display) {
    warn!(event = "missions.update_failed", mission_id = mission_id, error = %error);
}

/// Emit event: mission closed after detaching its agents.
pub fn emit_mission_ended(mission_id: EventId, detached: usize, remote_ok: bool) {
    info!(
        event = "missions.ended",
        mission_id = mission_id,
        detached = detached,
        remote_ok = remote_ok,
    );
}
