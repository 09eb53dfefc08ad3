//! Agent directory: the session's authoritative list of agents.
//!
//! Two layers are in play. The backend holds the durable records; the
//! directory holds a local copy that is always usable. Mutations go to the
//! backend first and, when that fails, are applied to the local copy as if
//! they had succeeded. The next successful [`AgentDirectory::refresh`]
//! replaces the local copy with backend truth, reconciled against running
//! missions.
//!
//! Nothing is retried. Concurrent callers are not sequenced; the last write
//! to the collection wins.

use std::collections::BTreeMap;

use fieldops_state::{
    Agent, AgentBackend, AgentId, AgentPatch, AgentStatus, BackendError, EventId, EventSource,
};

use crate::domain::{mission_label, FieldOpsError, Result};
use crate::metrics::METRICS;
use crate::missions::project_missions;
use crate::obs;
use crate::reconcile::{pending_changes, reconcile, ActiveAgentIds, ACTIVE_MISSION_LABEL};

/// In-memory agent store backed by an agent API and a calendar.
pub struct AgentDirectory<B, E> {
    backend: B,
    events: E,
    agents: Vec<Agent>,
    last_error: Option<String>,
}

impl<B, E> AgentDirectory<B, E>
where
    B: AgentBackend,
    E: EventSource,
{
    /// Empty directory; call [`refresh`](Self::refresh) to populate it.
    pub fn new(backend: B, events: E) -> Self {
        Self::with_agents(backend, events, Vec::new())
    }

    /// Directory seeded with a local collection.
    pub fn with_agents(backend: B, events: E, agents: Vec<Agent>) -> Self {
        AgentDirectory {
            backend,
            events,
            agents,
            last_error: None,
        }
    }

    pub fn agents(&self) -> &[Agent] {
        &self.agents
    }

    pub fn get(&self, id: AgentId) -> Option<&Agent> {
        self.agents.iter().find(|a| a.id == id)
    }

    /// Message of the last failed refresh, cleared by a successful one.
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    /// Id for an agent created while the backend is unavailable.
    pub fn next_local_id(&self) -> AgentId {
        self.agents
            .iter()
            .map(|a| a.id)
            .max()
            .unwrap_or(0)
            .saturating_add(1)
    }

    /// Number of agents per status; statuses with no agents are omitted.
    pub fn count_by_status(&self) -> BTreeMap<AgentStatus, usize> {
        let mut counts = BTreeMap::new();
        for agent in &self.agents {
            *counts.entry(agent.status).or_insert(0) += 1;
        }
        counts
    }

    /// Reload agents and events, reconcile, and replace the collection.
    ///
    /// Returns `false` (and keeps the current collection) if either fetch
    /// fails; the failure is logged and kept in [`last_error`](Self::last_error).
    pub async fn refresh(&mut self) -> bool {
        let (agents, events) =
            futures::join!(self.backend.list_agents(), self.events.list_events());

        let fetched = match (agents, events) {
            (Ok(agents), Ok(events)) => Ok((agents, events)),
            (Err(err), _) | (_, Err(err)) => Err(err),
        };

        match fetched {
            Ok((agents, events)) => {
                let active = ActiveAgentIds::from_missions(&project_missions(&events));
                let reconciled = pending_changes(&agents, &active);
                self.agents = reconcile(&agents, &active);
                self.last_error = None;

                METRICS.inc_refreshes();
                METRICS.inc_reconciliations();
                obs::emit_refresh_finished(self.agents.len(), active.len(), reconciled);
                true
            }
            Err(err) => {
                METRICS.inc_backend_failures();
                obs::emit_load_failed("agents", &err);
                self.last_error = Some(err.to_string());
                false
            }
        }
    }

    /// Patch an agent; on backend failure the patch is merged locally.
    pub async fn update_agent(&mut self, id: AgentId, patch: &AgentPatch) -> Option<&Agent> {
        let result = self.backend.update_agent(id, patch).await;
        self.settle("update", id, result, patch);
        self.get(id)
    }

    /// Delete an agent. The local record is removed whatever the backend says.
    ///
    /// Returns whether a local record was removed.
    pub async fn remove_agent(&mut self, id: AgentId) -> bool {
        if let Err(err) = self.backend.delete_agent(id).await {
            METRICS.inc_backend_failures();
            obs::emit_remote_delete_failed(id, &err);
        }

        let before = self.agents.len();
        self.agents.retain(|a| a.id != id);
        self.agents.len() != before
    }

    /// Assign an agent to a mission.
    ///
    /// Fails without touching the backend if the local record already shows
    /// the agent on a mission. On backend failure the agent is marked
    /// `on_mission` locally with the label `Mission #<mission_id>`.
    pub async fn assign_to_mission(
        &mut self,
        agent_id: AgentId,
        mission_id: EventId,
    ) -> Result<Option<&Agent>> {
        if let Some(agent) = self.get(agent_id).filter(|a| a.is_on_mission()) {
            obs::emit_assign_rejected(agent_id, mission_id);
            return Err(FieldOpsError::AlreadyOnMission {
                agent_id,
                mission: agent
                    .current_mission
                    .clone()
                    .unwrap_or_else(|| ACTIVE_MISSION_LABEL.to_string()),
            });
        }

        let result = self.backend.assign_agent(agent_id, mission_id).await;
        self.settle(
            "assign",
            agent_id,
            result,
            &AgentPatch::on_mission(mission_label(mission_id)),
        );
        Ok(self.get(agent_id))
    }

    /// Return an agent to `active` with no mission.
    pub async fn detach_from_mission(&mut self, agent_id: AgentId) -> Option<&Agent> {
        let patch = AgentPatch::released();
        let result = self.backend.update_agent(agent_id, &patch).await;
        self.settle("detach", agent_id, result, &patch);
        self.get(agent_id)
    }

    /// Reconcile the local collection against `active`; no backend call.
    ///
    /// Returns the number of agents that changed.
    pub fn reconcile_statuses(&mut self, active: &ActiveAgentIds) -> usize {
        let changed = pending_changes(&self.agents, active);
        self.agents = reconcile(&self.agents, active);

        METRICS.inc_reconciliations();
        obs::emit_reconciled(active.len(), changed);
        changed
    }

    /// Register an agent created elsewhere; local only.
    ///
    /// An agent with id `0` gets [`next_local_id`](Self::next_local_id). An
    /// agent whose id is already present replaces that record.
    pub fn add_agent(&mut self, mut agent: Agent) -> &Agent {
        if agent.id == 0 {
            agent.id = self.next_local_id();
        }

        let id = agent.id;
        match self.agents.iter().position(|a| a.id == id) {
            Some(index) => {
                self.agents[index] = agent;
                &self.agents[index]
            }
            None => {
                self.agents.push(agent);
                &self.agents[self.agents.len() - 1]
            }
        }
    }

    /// Apply a backend outcome: server record on success, `fallback` merged
    /// into the local record on failure.
    fn settle(
        &mut self,
        operation: &str,
        id: AgentId,
        result: std::result::Result<Agent, BackendError>,
        fallback: &AgentPatch,
    ) {
        match result {
            Ok(server) => {
                if let Some(slot) = self.agents.iter_mut().find(|a| a.id == id) {
                    *slot = server;
                }
            }
            Err(err) => {
                METRICS.inc_backend_failures();
                METRICS.inc_fallbacks();
                obs::emit_fallback_applied(operation, id, &err);
                if let Some(agent) = self.agents.iter_mut().find(|a| a.id == id) {
                    fallback.apply_to(agent);
                }
            }
        }
    }
}
