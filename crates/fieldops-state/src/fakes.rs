//! In-memory fakes for backend traits (testing only)
//!
//! Provides `MemoryAgentBackend` and `MemoryEventSource` that satisfy the
//! trait contracts without a server. Both record every call they receive and
//! can be switched into a failing mode, so they double as spies for the
//! fallback paths of the agent directory.

use std::collections::BTreeMap;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::backend::*;
use crate::error::BackendError;
use crate::schema::*;

/// Failure injected into a fake
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Failure {
    /// Every call fails with `BackendError::Offline`
    Offline,
    /// Every call fails with `BackendError::MalformedResponse`
    Malformed,
}

impl Failure {
    fn to_error(self, what: &str) -> BackendError {
        match self {
            Failure::Offline => BackendError::Offline,
            Failure::Malformed => BackendError::MalformedResponse(format!(
                "expected a list of {}, got an object",
                what
            )),
        }
    }
}

// ---------------------------------------------------------------------------
// MemoryAgentBackend
// ---------------------------------------------------------------------------

/// A call received by `MemoryAgentBackend`
#[derive(Debug, Clone, PartialEq)]
pub enum AgentCall {
    List,
    Update(AgentId, AgentPatch),
    Delete(AgentId),
    Assign(AgentId, EventId),
}

/// In-memory agent store backed by a `BTreeMap<AgentId, Agent>`.
#[derive(Debug, Default)]
pub struct MemoryAgentBackend {
    agents: Mutex<BTreeMap<AgentId, Agent>>,
    failure: Mutex<Option<Failure>>,
    calls: Mutex<Vec<AgentCall>>,
}

impl MemoryAgentBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_agents(agents: impl IntoIterator<Item = Agent>) -> Self {
        let backend = Self::new();
        backend
            .agents
            .lock()
            .unwrap()
            .extend(agents.into_iter().map(|a| (a.id, a)));
        backend
    }

    /// Make every subsequent call fail (or succeed again with `None`).
    pub fn set_failure(&self, failure: Option<Failure>) {
        *self.failure.lock().unwrap() = failure;
    }

    pub fn set_offline(&self, offline: bool) {
        self.set_failure(offline.then_some(Failure::Offline));
    }

    /// Calls received so far, in order.
    pub fn calls(&self) -> Vec<AgentCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    /// Current server-side state.
    pub fn snapshot(&self) -> Vec<Agent> {
        self.agents.lock().unwrap().values().cloned().collect()
    }

    fn record(&self, call: AgentCall) -> BackendResult<()> {
        self.calls.lock().unwrap().push(call);
        match *self.failure.lock().unwrap() {
            Some(failure) => Err(failure.to_error("agents")),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl AgentBackend for MemoryAgentBackend {
    async fn list_agents(&self) -> BackendResult<Vec<Agent>> {
        self.record(AgentCall::List)?;
        Ok(self.snapshot())
    }

    async fn update_agent(&self, id: AgentId, patch: &AgentPatch) -> BackendResult<Agent> {
        self.record(AgentCall::Update(id, patch.clone()))?;
        let mut agents = self.agents.lock().unwrap();
        let agent = agents
            .get_mut(&id)
            .ok_or(BackendError::AgentNotFound { agent_id: id })?;
        patch.apply_to(agent);
        Ok(agent.clone())
    }

    async fn delete_agent(&self, id: AgentId) -> BackendResult<()> {
        self.record(AgentCall::Delete(id))?;
        self.agents
            .lock()
            .unwrap()
            .remove(&id)
            .map(|_| ())
            .ok_or(BackendError::AgentNotFound { agent_id: id })
    }

    async fn assign_agent(&self, id: AgentId, mission_id: EventId) -> BackendResult<Agent> {
        self.record(AgentCall::Assign(id, mission_id))?;
        let mut agents = self.agents.lock().unwrap();
        let agent = agents
            .get_mut(&id)
            .ok_or(BackendError::AgentNotFound { agent_id: id })?;
        AgentPatch::on_mission(format!("Mission #{}", mission_id)).apply_to(agent);
        Ok(agent.clone())
    }
}

// ---------------------------------------------------------------------------
// MemoryEventSource
// ---------------------------------------------------------------------------

/// A call received by `MemoryEventSource`
#[derive(Debug, Clone, PartialEq)]
pub enum EventCall {
    List,
    Update(EventId, EventUpdate),
}

/// In-memory calendar backed by a `Vec<CalendarEvent>` in insertion order.
#[derive(Debug, Default)]
pub struct MemoryEventSource {
    events: Mutex<Vec<CalendarEvent>>,
    failure: Mutex<Option<Failure>>,
    calls: Mutex<Vec<EventCall>>,
}

impl MemoryEventSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_events(events: impl IntoIterator<Item = CalendarEvent>) -> Self {
        let source = Self::new();
        source.events.lock().unwrap().extend(events);
        source
    }

    pub fn set_failure(&self, failure: Option<Failure>) {
        *self.failure.lock().unwrap() = failure;
    }

    pub fn set_offline(&self, offline: bool) {
        self.set_failure(offline.then_some(Failure::Offline));
    }

    /// Replace the stored events.
    pub fn replace_events(&self, events: Vec<CalendarEvent>) {
        *self.events.lock().unwrap() = events;
    }

    pub fn calls(&self) -> Vec<EventCall> {
        self.calls.lock().unwrap().clone()
    }

    /// Only the update calls, in order.
    pub fn updates(&self) -> Vec<(EventId, EventUpdate)> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter_map(|call| match call {
                EventCall::Update(id, update) => Some((*id, update.clone())),
                EventCall::List => None,
            })
            .collect()
    }

    pub fn snapshot(&self) -> Vec<CalendarEvent> {
        self.events.lock().unwrap().clone()
    }

    fn record(&self, call: EventCall) -> BackendResult<()> {
        self.calls.lock().unwrap().push(call);
        match *self.failure.lock().unwrap() {
            Some(failure) => Err(failure.to_error("events")),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl EventSource for MemoryEventSource {
    async fn list_events(&self) -> BackendResult<Vec<CalendarEvent>> {
        self.record(EventCall::List)?;
        Ok(self.snapshot())
    }

    async fn update_event(
        &self,
        id: EventId,
        update: &EventUpdate,
    ) -> BackendResult<CalendarEvent> {
        self.record(EventCall::Update(id, update.clone()))?;
        let mut events = self.events.lock().unwrap();
        let event = events
            .iter_mut()
            .find(|e| e.id == id)
            .ok_or(BackendError::EventNotFound { event_id: id })?;
        update.apply_to(event);
        Ok(event.clone())
    }
}
