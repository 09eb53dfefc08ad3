//! Mission domain model.
//!
//! The backend has no mission resource: a mission is a calendar event whose
//! `type` is `mission`. `Mission::from_event` is the only place that looks at
//! the raw event shape.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use fieldops_state::{AgentId, CalendarEvent, EventId};

/// Label used for an agent assigned to mission `id`.
pub fn mission_label(id: EventId) -> String {
    format!("Mission #{}", id)
}

/// Parsed mission status.
///
/// `Active` and `InProgress` are both "running". Statuses this crate does not
/// know are kept verbatim in `Other` and treated as not yet finished.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum MissionStatus {
    Planned,
    Active,
    InProgress,
    Completed,
    Cancelled,
    Other(String),
}

impl MissionStatus {
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "planned" | "scheduled" | "pending" => MissionStatus::Planned,
            "active" => MissionStatus::Active,
            "in_progress" | "in-progress" => MissionStatus::InProgress,
            "completed" => MissionStatus::Completed,
            "cancelled" | "canceled" => MissionStatus::Cancelled,
            _ => MissionStatus::Other(raw.trim().to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            MissionStatus::Planned => "planned",
            MissionStatus::Active => "active",
            MissionStatus::InProgress => "in_progress",
            MissionStatus::Completed => "completed",
            MissionStatus::Cancelled => "cancelled",
            MissionStatus::Other(raw) => raw,
        }
    }

    /// Whether agents on this mission count as deployed.
    pub fn is_running(&self) -> bool {
        matches!(self, MissionStatus::Active | MissionStatus::InProgress)
    }

    pub fn is_finished(&self) -> bool {
        matches!(self, MissionStatus::Completed | MissionStatus::Cancelled)
    }
}

impl From<String> for MissionStatus {
    fn from(raw: String) -> Self {
        MissionStatus::parse(&raw)
    }
}

impl From<MissionStatus> for String {
    fn from(status: MissionStatus) -> Self {
        status.as_str().to_string()
    }
}

impl std::fmt::Display for MissionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A mission as the rest of the application sees it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Mission {
    pub id: EventId,
    pub title: String,
    pub status: MissionStatus,
    /// Normalized from the event's `agents` or `participants`
    pub agent_ids: Vec<AgentId>,
    pub start: Option<DateTime<Utc>>,
    pub end: Option<DateTime<Utc>>,
    pub location: Option<String>,
}

impl Mission {
    /// Project a calendar event; `None` unless it is a mission.
    ///
    /// A mission event without a status is treated as planned.
    pub fn from_event(event: &CalendarEvent) -> Option<Self> {
        if !event.is_mission() {
            return None;
        }

        let title = if event.title.trim().is_empty() {
            mission_label(event.id)
        } else {
            event.title.clone()
        };

        Some(Mission {
            id: event.id,
            title,
            status: event
                .status
                .as_deref()
                .map(MissionStatus::parse)
                .unwrap_or(MissionStatus::Planned),
            agent_ids: event.agent_ids(),
            start: event.start,
            end: event.end,
            location: event.location.clone(),
        })
    }

    pub fn is_running(&self) -> bool {
        self.status.is_running()
    }
}
