//! Wire records for the back-office API
//!
//! Field names are camelCase on the wire. Unknown agent fields are kept in
//! `Agent::extra` so a record fetched from the backend survives a local patch
//! without losing data.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// Agent identifier (backend-assigned, or local counter fallback)
pub type AgentId = u64;

/// Calendar event identifier
pub type EventId = u64;

/// Calendar event `type` discriminator for missions
pub const MISSION_EVENT_TYPE: &str = "mission";

// ---------------------------------------------------------------------------
// Agent
// ---------------------------------------------------------------------------

/// Operational status of a field agent
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum AgentStatus {
    #[default]
    Active,
    Inactive,
    OnMission,
}

impl AgentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AgentStatus::Active => "active",
            AgentStatus::Inactive => "inactive",
            AgentStatus::OnMission => "on_mission",
        }
    }
}

impl std::fmt::Display for AgentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for AgentStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "active" => Ok(AgentStatus::Active),
            "inactive" => Ok(AgentStatus::Inactive),
            "on_mission" => Ok(AgentStatus::OnMission),
            other => Err(format!("unknown agent status: {}", other)),
        }
    }
}

/// A field security operative
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Agent {
    pub id: AgentId,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub status: AgentStatus,
    /// Label of the mission the agent is currently on
    #[serde(default)]
    pub current_mission: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rank: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub specialization: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    /// Backend fields this crate does not model
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Agent {
    /// Create an active agent with no mission
    pub fn new(id: AgentId, name: impl Into<String>) -> Self {
        Agent {
            id,
            name: name.into(),
            status: AgentStatus::Active,
            current_mission: None,
            rank: None,
            specialization: None,
            phone: None,
            email: None,
            extra: Map::new(),
        }
    }

    pub fn with_status(mut self, status: AgentStatus) -> Self {
        self.status = status;
        self
    }

    pub fn with_mission(mut self, label: impl Into<String>) -> Self {
        self.current_mission = Some(label.into());
        self
    }

    pub fn is_on_mission(&self) -> bool {
        self.status == AgentStatus::OnMission
    }
}

// ---------------------------------------------------------------------------
// AgentPatch
// ---------------------------------------------------------------------------

/// Partial update for an agent.
///
/// `current_mission` is tri-state: `None` leaves it untouched, `Some(None)`
/// clears it (serialized as `null`), `Some(Some(label))` sets it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<AgentStatus>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "present_or_null"
    )]
    pub current_mission: Option<Option<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rank: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub specialization: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

fn present_or_null<'de, D>(deserializer: D) -> Result<Option<Option<String>>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<String>::deserialize(deserializer).map(Some)
}

impl AgentPatch {
    /// Patch that only changes the status
    pub fn status(status: AgentStatus) -> Self {
        AgentPatch {
            status: Some(status),
            ..Default::default()
        }
    }

    /// Patch marking the agent as on a mission with the given label
    pub fn on_mission(label: impl Into<String>) -> Self {
        AgentPatch {
            status: Some(AgentStatus::OnMission),
            current_mission: Some(Some(label.into())),
            ..Default::default()
        }
    }

    /// Patch returning the agent to duty with no mission
    pub fn released() -> Self {
        AgentPatch {
            status: Some(AgentStatus::Active),
            current_mission: Some(None),
            ..Default::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        *self == AgentPatch::default()
    }

    /// Merge the present fields into `agent`.
    pub fn apply_to(&self, agent: &mut Agent) {
        if let Some(name) = &self.name {
            agent.name = name.clone();
        }
        if let Some(status) = self.status {
            agent.status = status;
        }
        if let Some(mission) = &self.current_mission {
            agent.current_mission = mission.clone();
        }
        if let Some(rank) = &self.rank {
            agent.rank = Some(rank.clone());
        }
        if let Some(specialization) = &self.specialization {
            agent.specialization = Some(specialization.clone());
        }
        if let Some(phone) = &self.phone {
            agent.phone = Some(phone.clone());
        }
        if let Some(email) = &self.email {
            agent.email = Some(email.clone());
        }
    }
}

// ---------------------------------------------------------------------------
// CalendarEvent
// ---------------------------------------------------------------------------

/// One entry of an event's `participants` list.
///
/// Calendars store participant IDs as strings; some also emit bare numbers.
/// Anything else (contact objects, negative numbers) is kept as `Other` and
/// never names an agent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Participant {
    Id(AgentId),
    Text(String),
    Other(Value),
}

impl Participant {
    fn agent_id(&self) -> Option<AgentId> {
        match self {
            Participant::Id(id) => Some(*id),
            Participant::Text(text) => text.trim().parse().ok(),
            Participant::Other(_) => None,
        }
    }
}

/// Generic calendar event; missions are events with `type == "mission"`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CalendarEvent {
    pub id: EventId,
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub agents: Option<Vec<AgentId>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub participants: Option<Vec<Participant>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl CalendarEvent {
    pub fn new(id: EventId, kind: impl Into<String>, title: impl Into<String>) -> Self {
        CalendarEvent {
            id,
            kind: kind.into(),
            title: title.into(),
            status: None,
            agents: None,
            participants: None,
            start: None,
            end: None,
            location: None,
            description: None,
        }
    }

    /// Mission event with an explicit agent list
    pub fn mission(
        id: EventId,
        title: impl Into<String>,
        status: &str,
        agents: Vec<AgentId>,
    ) -> Self {
        CalendarEvent {
            status: Some(status.to_string()),
            agents: Some(agents),
            ..CalendarEvent::new(id, MISSION_EVENT_TYPE, title)
        }
    }

    pub fn is_mission(&self) -> bool {
        self.kind == MISSION_EVENT_TYPE
    }

    /// Normalized agent IDs: `agents` when present, otherwise every
    /// participant that parses as an integer.
    pub fn agent_ids(&self) -> Vec<AgentId> {
        if let Some(agents) = &self.agents {
            return agents.clone();
        }
        self.participants
            .iter()
            .flatten()
            .filter_map(Participant::agent_id)
            .collect()
    }
}

/// Body of an event update (`PUT {events}/{id}`)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventUpdate {
    pub status: String,
    pub agents: Vec<AgentId>,
}

impl EventUpdate {
    /// Close a mission: status `completed`, no agents
    pub fn completed() -> Self {
        EventUpdate {
            status: "completed".to_string(),
            agents: Vec::new(),
        }
    }

    /// Merge the update into `event`.
    pub fn apply_to(&self, event: &mut CalendarEvent) {
        event.status = Some(self.status.clone());
        event.agents = Some(self.agents.clone());
        event.participants = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_agent_deserializes_camel_case_and_keeps_unknown_fields() {
        let agent: Agent = serde_json::from_value(json!({
            "id": 3,
            "name": "R. Okafor",
            "status": "on_mission",
            "currentMission": "Convoy escort",
            "badgeNumber": "B-117"
        }))
        .unwrap();

        assert_eq!(agent.status, AgentStatus::OnMission);
        assert_eq!(agent.current_mission.as_deref(), Some("Convoy escort"));
        assert_eq!(agent.extra["badgeNumber"], "B-117");

        let back = serde_json::to_value(&agent).unwrap();
        assert_eq!(back["badgeNumber"], "B-117");
        assert_eq!(back["currentMission"], "Convoy escort");
    }

    #[test]
    fn test_agent_missing_status_defaults_to_active() {
        let agent: Agent = serde_json::from_value(json!({ "id": 9 })).unwrap();
        assert_eq!(agent.status, AgentStatus::Active);
        assert!(agent.current_mission.is_none());
    }

    #[test]
    fn test_released_patch_serializes_null_mission() {
        let body = serde_json::to_value(AgentPatch::released()).unwrap();
        assert_eq!(body, json!({ "status": "active", "currentMission": null }));
    }

    #[test]
    fn test_status_patch_omits_mission() {
        let body = serde_json::to_value(AgentPatch::status(AgentStatus::Inactive)).unwrap();
        assert_eq!(body, json!({ "status": "inactive" }));
    }

    #[test]
    fn test_patch_distinguishes_null_from_absent() {
        let cleared: AgentPatch =
            serde_json::from_value(json!({ "currentMission": null })).unwrap();
        assert_eq!(cleared.current_mission, Some(None));

        let untouched: AgentPatch = serde_json::from_value(json!({ "rank": "Lead" })).unwrap();
        assert_eq!(untouched.current_mission, None);
    }

    #[test]
    fn test_patch_apply_only_overwrites_present_fields() {
        let mut agent = Agent::new(1, "A. Diallo")
            .with_status(AgentStatus::OnMission)
            .with_mission("Night watch");
        AgentPatch {
            rank: Some("Sergeant".to_string()),
            ..Default::default()
        }
        .apply_to(&mut agent);

        assert_eq!(agent.status, AgentStatus::OnMission);
        assert_eq!(agent.current_mission.as_deref(), Some("Night watch"));
        assert_eq!(agent.rank.as_deref(), Some("Sergeant"));

        AgentPatch::released().apply_to(&mut agent);
        assert_eq!(agent.status, AgentStatus::Active);
        assert!(agent.current_mission.is_none());
    }

    #[test]
    fn test_event_agent_ids_prefers_agents_field() {
        let mut event = CalendarEvent::mission(1, "Escort", "active", vec![4, 5]);
        event.participants = Some(vec![Participant::Text("9".to_string())]);
        assert_eq!(event.agent_ids(), vec![4, 5]);
    }

    #[test]
    fn test_event_agent_ids_parses_participants() {
        let event: CalendarEvent = serde_json::from_value(json!({
            "id": 12,
            "type": "mission",
            "status": "in_progress",
            "participants": ["5", " 6 ", "dispatch", 7]
        }))
        .unwrap();
        assert_eq!(event.agent_ids(), vec![5, 6, 7]);
    }

    #[test]
    fn test_event_participants_tolerate_contact_objects() {
        let event: CalendarEvent = serde_json::from_value(json!({
            "id": 13,
            "type": "mission",
            "participants": [{ "name": "HR" }, "8", -1]
        }))
        .unwrap();
        assert_eq!(event.participants.as_ref().map(Vec::len), Some(3));
        assert_eq!(event.agent_ids(), vec![8]);
    }

    #[test]
    fn test_event_without_agents_or_participants() {
        let event = CalendarEvent::new(2, "meeting", "Briefing");
        assert!(event.agent_ids().is_empty());
        assert!(!event.is_mission());
    }

    #[test]
    fn test_completed_update_clears_agents() {
        let mut event = CalendarEvent::mission(8, "Patrol", "active", vec![1, 2]);
        EventUpdate::completed().apply_to(&mut event);
        assert_eq!(event.status.as_deref(), Some("completed"));
        assert!(event.agent_ids().is_empty());
    }

    #[test]
    fn test_agent_status_from_str() {
        assert_eq!("on_mission".parse::<AgentStatus>(), Ok(AgentStatus::OnMission));
        assert!("retired".parse::<AgentStatus>().is_err());
    }
}
