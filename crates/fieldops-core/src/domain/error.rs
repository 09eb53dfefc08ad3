//! Domain-level error taxonomy for FieldOps.
//!
//! Backend failures never surface here; the directory and the mission board
//! absorb them with a local fallback.

use fieldops_state::{AgentId, EventId};

/// FieldOps domain errors.
#[derive(Debug, thiserror::Error)]
pub enum FieldOpsError {
    #[error("agent {agent_id} is already on a mission ({mission}); detach it first")]
    AlreadyOnMission { agent_id: AgentId, mission: String },

    #[error("mission not found: {0}")]
    MissionNotFound(EventId),
}

/// Result type for FieldOps domain operations.
pub type Result<T> = std::result::Result<T, FieldOpsError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_already_on_mission_display() {
        let err = FieldOpsError::AlreadyOnMission {
            agent_id: 7,
            mission: "Mission #3".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("agent 7"));
        assert!(msg.contains("Mission #3"));
    }

    #[test]
    fn test_mission_not_found_display() {
        assert_eq!(
            FieldOpsError::MissionNotFound(12).to_string(),
            "mission not found: 12"
        );
    }
}
