//! REST client for the back-office API
//!
//! Implements `AgentBackend` and `EventSource` over `reqwest`. Response
//! bodies are decoded through `serde_json::Value` first so a body of the
//! wrong shape (an object where a list was expected) surfaces as
//! `BackendError::MalformedResponse` rather than a generic decode failure.
//!
//! The calendar is shared with other tools, so event lists are decoded entry
//! by entry and entries this crate cannot read are skipped.

use async_trait::async_trait;
use reqwest::{RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, warn};

use crate::backend::{AgentBackend, BackendResult, EventSource};
use crate::config::BackendConfig;
use crate::error::BackendError;
use crate::schema::{
    Agent, AgentId, AgentPatch, CalendarEvent, EventId, EventUpdate, MISSION_EVENT_TYPE,
};

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct AssignBody {
    mission_id: EventId,
}

/// HTTP implementation of both backend traits
#[derive(Debug, Clone)]
pub struct HttpBackend {
    config: BackendConfig,
    client: reqwest::Client,
}

impl HttpBackend {
    /// Create a new client; fails on invalid configuration.
    pub fn new(config: BackendConfig) -> BackendResult<Self> {
        config.validate()?;
        let client = reqwest::Client::builder()
            .user_agent(concat!("fieldops/", env!("CARGO_PKG_VERSION")))
            .timeout(config.timeout())
            .build()?;

        Ok(HttpBackend { config, client })
    }

    /// Create client from environment variables
    pub fn from_env() -> BackendResult<Self> {
        Self::new(BackendConfig::from_env())
    }

    pub fn config(&self) -> &BackendConfig {
        &self.config
    }

    fn agent_url(&self, id: AgentId) -> String {
        self.config.url(&format!("agents/{}", id))
    }

    fn event_url(&self, id: EventId) -> String {
        self.config
            .url(&format!("{}/{}", self.config.events_path.trim_end_matches('/'), id))
    }

    async fn send(&self, request: RequestBuilder) -> BackendResult<Response> {
        let response = request.send().await?;
        let status = response.status();
        debug!(status = status.as_u16(), url = %response.url(), "backend response");

        if status.is_success() {
            Ok(response)
        } else {
            let body = response.text().await.unwrap_or_default();
            Err(BackendError::Status {
                status: status.as_u16(),
                body,
            })
        }
    }

    async fn read_value(response: Response) -> BackendResult<Value> {
        let bytes = response.bytes().await?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    async fn read_one<T: DeserializeOwned>(response: Response) -> BackendResult<T> {
        let value = Self::read_value(response).await?;
        Ok(serde_json::from_value(value)?)
    }

    async fn read_list<T: DeserializeOwned>(
        response: Response,
        what: &str,
    ) -> BackendResult<Vec<T>> {
        let value = Self::read_value(response).await?;
        if !value.is_array() {
            return Err(BackendError::MalformedResponse(format!(
                "expected a list of {}, got {}",
                what,
                json_kind(&value)
            )));
        }
        Ok(serde_json::from_value(value)?)
    }
}

/// Decode calendar entries one at a time, dropping the ones that fail.
fn decode_events(entries: Vec<Value>) -> Vec<CalendarEvent> {
    let total = entries.len();
    let mut events = Vec::with_capacity(total);

    for entry in entries {
        let kind = entry
            .get("type")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();
        let id = entry.get("id").cloned().unwrap_or(Value::Null);

        match serde_json::from_value::<CalendarEvent>(entry) {
            Ok(event) => events.push(event),
            Err(err) => {
                warn!(
                    event = "events.entry_skipped",
                    id = %id,
                    kind = %kind,
                    mission = kind == MISSION_EVENT_TYPE,
                    error = %err,
                    "unreadable calendar entry"
                );
            }
        }
    }

    if events.len() < total {
        debug!(kept = events.len(), total, "calendar entries decoded");
    }
    events
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "a list",
        Value::Object(_) => "an object",
    }
}

fn agent_not_found(id: AgentId) -> impl FnOnce(BackendError) -> BackendError {
    move |err| match err {
        BackendError::Status { status, .. } if status == StatusCode::NOT_FOUND.as_u16() => {
            BackendError::AgentNotFound { agent_id: id }
        }
        other => other,
    }
}

#[async_trait]
impl AgentBackend for HttpBackend {
    async fn list_agents(&self) -> BackendResult<Vec<Agent>> {
        let response = self.send(self.client.get(self.config.url("agents"))).await?;
        Self::read_list(response, "agents").await
    }

    async fn update_agent(&self, id: AgentId, patch: &AgentPatch) -> BackendResult<Agent> {
        let response = self
            .send(self.client.patch(self.agent_url(id)).json(patch))
            .await
            .map_err(agent_not_found(id))?;
        Self::read_one(response).await
    }

    async fn delete_agent(&self, id: AgentId) -> BackendResult<()> {
        self.send(self.client.delete(self.agent_url(id)))
            .await
            .map_err(agent_not_found(id))?;
        Ok(())
    }

    async fn assign_agent(&self, id: AgentId, mission_id: EventId) -> BackendResult<Agent> {
        let url = self.config.url(&format!("agents/{}/assign", id));
        let response = self
            .send(self.client.post(url).json(&AssignBody { mission_id }))
            .await
            .map_err(agent_not_found(id))?;
        Self::read_one(response).await
    }
}

#[async_trait]
impl EventSource for HttpBackend {
    async fn list_events(&self) -> BackendResult<Vec<CalendarEvent>> {
        let url = self.config.url(&self.config.events_path);
        let response = self.send(self.client.get(url)).await?;
        let entries: Vec<Value> = Self::read_list(response, "events").await?;
        Ok(decode_events(entries))
    }

    async fn update_event(
        &self,
        id: EventId,
        update: &EventUpdate,
    ) -> BackendResult<CalendarEvent> {
        let response = self
            .send(self.client.put(self.event_url(id)).json(update))
            .await
            .map_err(|err| match err {
                BackendError::Status { status, .. } if status == StatusCode::NOT_FOUND.as_u16() => {
                    BackendError::EventNotFound { event_id: id }
                }
                other => other,
            })?;
        Self::read_one(response).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_new_rejects_invalid_config() {
        let err = HttpBackend::new(BackendConfig::new("not-a-url")).unwrap_err();
        assert!(matches!(err, BackendError::Config(_)));
    }

    #[test]
    fn test_resource_urls() {
        let backend = HttpBackend::new(
            BackendConfig::new("http://127.0.0.1:9/api").with_events_path("/calendar/events/"),
        )
        .unwrap();
        assert_eq!(backend.agent_url(7), "http://127.0.0.1:9/api/agents/7");
        assert_eq!(
            backend.event_url(42),
            "http://127.0.0.1:9/api/calendar/events/42"
        );
    }

    #[test]
    fn test_decode_events_skips_unreadable_entries() {
        let events = decode_events(vec![
            json!({ "id": 10, "type": "mission", "status": "active", "agents": [1, 2] }),
            json!({ "id": "gcal-abc", "type": "meeting" }),
            json!({ "id": 11, "type": "mission", "agents": "everyone" }),
        ]);

        assert_eq!(events.len(), 1);
        assert_eq!(events[0].id, 10);
        assert_eq!(events[0].agent_ids(), vec![1, 2]);
    }

    #[test]
    fn test_assign_body_is_camel_case() {
        let body = serde_json::to_value(AssignBody { mission_id: 42 }).unwrap();
        assert_eq!(body, json!({ "missionId": 42 }));
    }
}
