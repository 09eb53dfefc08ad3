//! Mission board: calendar events projected into missions.
//!
//! The board owns the mission list shown to operators and feeds the agent
//! directory its reconciliation input after every successful load.

use serde::Serialize;

use fieldops_state::{AgentBackend, BackendError, CalendarEvent, EventId, EventSource, EventUpdate};

use crate::directory::AgentDirectory;
use crate::domain::{FieldOpsError, Mission, MissionStatus, Result};
use crate::metrics::METRICS;
use crate::obs;
use crate::reconcile::ActiveAgentIds;

/// Keep the mission events and project them, preserving calendar order.
pub fn project_missions(events: &[CalendarEvent]) -> Vec<Mission> {
    events.iter().filter_map(Mission::from_event).collect()
}

/// Missions grouped for display.
#[derive(Debug, Default, Serialize)]
pub struct MissionGroups<'a> {
    /// `active` or `in_progress`
    pub running: Vec<&'a Mission>,
    /// Planned, or any status that is neither running nor finished
    pub upcoming: Vec<&'a Mission>,
    /// `completed` or `cancelled`
    pub finished: Vec<&'a Mission>,
}

/// Mission list backed by a calendar event source
pub struct MissionBoard<E> {
    source: E,
    missions: Vec<Mission>,
    error: Option<String>,
}

impl<E: EventSource> MissionBoard<E> {
    pub fn new(source: E) -> Self {
        MissionBoard {
            source,
            missions: Vec::new(),
            error: None,
        }
    }

    pub fn missions(&self) -> &[Mission] {
        &self.missions
    }

    pub fn get(&self, id: EventId) -> Option<&Mission> {
        self.missions.iter().find(|m| m.id == id)
    }

    /// User-facing message from the last failed load.
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Agents referenced by running missions.
    pub fn active_agent_ids(&self) -> ActiveAgentIds {
        ActiveAgentIds::from_missions(&self.missions)
    }

    pub fn groups(&self) -> MissionGroups<'_> {
        let mut groups = MissionGroups::default();
        for mission in &self.missions {
            if mission.status.is_running() {
                groups.running.push(mission);
            } else if mission.status.is_finished() {
                groups.finished.push(mission);
            } else {
                groups.upcoming.push(mission);
            }
        }
        groups
    }

    /// Load missions and reconcile `directory` against them.
    ///
    /// A response of the wrong shape empties the board; any other failure
    /// keeps the previous missions. Either way the directory is left alone
    /// and a message is recorded in [`error`](Self::error).
    pub async fn load<B, S>(&mut self, directory: &mut AgentDirectory<B, S>) -> bool
    where
        B: AgentBackend,
        S: EventSource,
    {
        match self.source.list_events().await {
            Ok(events) => {
                self.missions = project_missions(&events);
                self.error = None;

                let active = self.active_agent_ids();
                obs::emit_missions_loaded(self.missions.len(), self.groups().running.len());
                directory.reconcile_statuses(&active);
                true
            }
            Err(err) => {
                METRICS.inc_backend_failures();
                obs::emit_load_failed("missions", &err);
                let message = if matches!(err, BackendError::MalformedResponse(_)) {
                    self.missions.clear();
                    "Unexpected response from the calendar; no missions to show".to_string()
                } else {
                    format!("Could not load missions: {}", err)
                };
                self.error = Some(message);
                false
            }
        }
    }

    /// End a mission: detach every assigned agent, then mark the event
    /// `completed` with an empty agent list in a single update.
    ///
    /// If the calendar rejects the update the local mission is still marked
    /// completed.
    pub async fn end_mission<B, S>(
        &mut self,
        id: EventId,
        directory: &mut AgentDirectory<B, S>,
    ) -> Result<&Mission>
    where
        B: AgentBackend,
        S: EventSource,
    {
        let index = self
            .missions
            .iter()
            .position(|m| m.id == id)
            .ok_or(FieldOpsError::MissionNotFound(id))?;

        let agent_ids = self.missions[index].agent_ids.clone();
        for agent_id in &agent_ids {
            directory.detach_from_mission(*agent_id).await;
        }

        let remote_ok = match self.source.update_event(id, &EventUpdate::completed()).await {
            Ok(_) => true,
            Err(err) => {
                METRICS.inc_backend_failures();
                METRICS.inc_fallbacks();
                obs::emit_mission_update_failed(id, &err);
                false
            }
        };

        let mission = &mut self.missions[index];
        mission.status = MissionStatus::Completed;
        mission.agent_ids.clear();
        obs::emit_mission_ended(id, agent_ids.len(), remote_ok);

        Ok(&self.missions[index])
    }
}
