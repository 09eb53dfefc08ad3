//! Agent status reconciliation.
//!
//! An agent's `on_mission` flag is derived, not stored: it is recomputed
//! wholesale from the set of agent IDs referenced by running missions.
//!
//! Per agent:
//! 1. In the set: `on_mission`, keeping an existing mission label or using
//!    [`ACTIVE_MISSION_LABEL`]. This wins over any prior status, `inactive`
//!    included.
//! 2. Not in the set but `on_mission`: back to `active` with no mission.
//! 3. Otherwise unchanged.
//!
//! The transform is pure and idempotent.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use fieldops_state::{Agent, AgentId, AgentStatus};

use crate::domain::Mission;

/// Mission label given to an agent found on a running mission that carried
/// no label of its own.
pub const ACTIVE_MISSION_LABEL: &str = "Active mission";

/// Agent IDs referenced by at least one running mission.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActiveAgentIds(BTreeSet<AgentId>);

impl ActiveAgentIds {
    pub fn new() -> Self {
        Self::default()
    }

    /// Union of the agent lists of every running mission.
    pub fn from_missions<'a>(missions: impl IntoIterator<Item = &'a Mission>) -> Self {
        missions
            .into_iter()
            .filter(|m| m.is_running())
            .flat_map(|m| m.agent_ids.iter().copied())
            .collect()
    }

    pub fn contains(&self, id: AgentId) -> bool {
        self.0.contains(&id)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = AgentId> + '_ {
        self.0.iter().copied()
    }
}

impl FromIterator<AgentId> for ActiveAgentIds {
    fn from_iter<I: IntoIterator<Item = AgentId>>(iter: I) -> Self {
        ActiveAgentIds(iter.into_iter().collect())
    }
}

/// Reconcile a single agent against the active set.
pub fn reconcile_agent(agent: &Agent, active: &ActiveAgentIds) -> Agent {
    let mut next = agent.clone();
    if active.contains(agent.id) {
        next.status = AgentStatus::OnMission;
        if next.current_mission.is_none() {
            next.current_mission = Some(ACTIVE_MISSION_LABEL.to_string());
        }
    } else if agent.status == AgentStatus::OnMission {
        next.status = AgentStatus::Active;
        next.current_mission = None;
    }
    next
}

/// Reconcile every agent against the active set, preserving order.
pub fn reconcile(agents: &[Agent], active: &ActiveAgentIds) -> Vec<Agent> {
    agents.iter().map(|a| reconcile_agent(a, active)).collect()
}

/// Number of agents whose status or mission label `reconcile` would change.
pub fn pending_changes(agents: &[Agent], active: &ActiveAgentIds) -> usize {
    agents
        .iter()
        .filter(|a| reconcile_agent(a, active) != **a)
        .count()
}
