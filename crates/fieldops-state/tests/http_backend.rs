//! HttpBackend against a stub back-office server on an ephemeral port.

use axum::extract::Path;
use axum::http::StatusCode;
use axum::routing::{get, post, put};
use axum::{Json, Router};
use serde_json::{json, Value};

use fieldops_state::backend::{AgentBackend, EventSource};
use fieldops_state::{
    Agent, AgentPatch, AgentStatus, BackendConfig, BackendError, EventUpdate, HttpBackend,
};

fn stored_agent(id: u64) -> Agent {
    Agent::new(id, format!("Agent {}", id))
}

async fn list_agents() -> Json<Value> {
    Json(json!([
        { "id": 1, "name": "Agent 1", "status": "active", "currentMission": null },
        { "id": 2, "name": "Agent 2", "status": "on_mission", "currentMission": "Mission #7" }
    ]))
}

async fn patch_agent(
    Path(id): Path<u64>,
    Json(patch): Json<AgentPatch>,
) -> Result<Json<Agent>, StatusCode> {
    if id == 404 {
        return Err(StatusCode::NOT_FOUND);
    }
    let mut agent = stored_agent(id).with_mission("Old post");
    patch.apply_to(&mut agent);
    Ok(Json(agent))
}

async fn delete_agent(Path(id): Path<u64>) -> StatusCode {
    if id == 404 {
        StatusCode::NOT_FOUND
    } else {
        StatusCode::NO_CONTENT
    }
}

async fn assign_agent(Path(id): Path<u64>, Json(body): Json<Value>) -> Json<Agent> {
    let mission_id = body["missionId"].as_u64().unwrap_or_default();
    Json(
        stored_agent(id)
            .with_status(AgentStatus::OnMission)
            .with_mission(format!("Convoy {}", mission_id)),
    )
}

async fn list_events() -> Json<Value> {
    Json(json!([
        { "id": 10, "type": "mission", "title": "Escort", "status": "active", "agents": [1, 2] },
        {
            "id": 11,
            "type": "mission",
            "title": "Patrol",
            "status": "in_progress",
            "participants": ["3"]
        },
        { "id": 12, "type": "meeting", "title": "Briefing", "start": "2026-03-02T08:00:00Z" }
    ]))
}

async fn shared_calendar() -> Json<Value> {
    Json(json!([
        { "id": 10, "type": "mission", "status": "active", "agents": [1, 2] },
        { "id": "gcal-abc", "type": "meeting", "title": "Sync with vendor" },
        { "id": 14, "type": "training", "participants": [{ "name": "HR" }, "4"] },
        { "id": 15, "type": "mission", "status": "active", "agents": "all hands" }
    ]))
}

async fn update_event(Path(id): Path<u64>, Json(update): Json<EventUpdate>) -> Json<Value> {
    Json(json!({
        "id": id,
        "type": "mission",
        "title": "Escort",
        "status": update.status,
        "agents": update.agents
    }))
}

async fn wrapped_list() -> Json<Value> {
    Json(json!({ "data": [] }))
}

async fn server_error() -> (StatusCode, &'static str) {
    (StatusCode::INTERNAL_SERVER_ERROR, "database down")
}

async fn serve(app: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind listener");
    let addr = listener.local_addr().expect("local addr");
    tokio::spawn(async move { axum::serve(listener, app).await.expect("serve app") });
    format!("http://{}/api", addr)
}

async fn healthy_backend() -> HttpBackend {
    let app = Router::new()
        .route("/api/agents", get(list_agents))
        .route("/api/agents/:id", axum::routing::patch(patch_agent).delete(delete_agent))
        .route("/api/agents/:id/assign", post(assign_agent))
        .route("/api/calendar/events", get(list_events))
        .route("/api/calendar/events/:id", put(update_event));
    let base = serve(app).await;
    HttpBackend::new(BackendConfig::new(&base)).expect("backend")
}

#[tokio::test]
async fn http_lists_agents() {
    let backend = healthy_backend().await;
    let agents = backend.list_agents().await.unwrap();

    assert_eq!(agents.len(), 2);
    assert_eq!(agents[1].status, AgentStatus::OnMission);
    assert_eq!(agents[1].current_mission.as_deref(), Some("Mission #7"));
}

#[tokio::test]
async fn http_patch_sends_null_mission() {
    let backend = healthy_backend().await;
    let agent = backend.update_agent(3, &AgentPatch::released()).await.unwrap();

    assert_eq!(agent.id, 3);
    assert_eq!(agent.status, AgentStatus::Active);
    assert!(agent.current_mission.is_none());
}

#[tokio::test]
async fn http_not_found_maps_to_agent_not_found() {
    let backend = healthy_backend().await;

    let err = backend
        .update_agent(404, &AgentPatch::status(AgentStatus::Inactive))
        .await
        .unwrap_err();
    assert!(matches!(err, BackendError::AgentNotFound { agent_id: 404 }));

    let err = backend.delete_agent(404).await.unwrap_err();
    assert!(matches!(err, BackendError::AgentNotFound { agent_id: 404 }));
}

#[tokio::test]
async fn http_delete_accepts_no_content() {
    let backend = healthy_backend().await;
    backend.delete_agent(5).await.unwrap();
}

#[tokio::test]
async fn http_assign_posts_mission_id() {
    let backend = healthy_backend().await;
    let agent = backend.assign_agent(4, 42).await.unwrap();

    assert_eq!(agent.status, AgentStatus::OnMission);
    assert_eq!(agent.current_mission.as_deref(), Some("Convoy 42"));
}

#[tokio::test]
async fn http_lists_events_and_normalizes_participants() {
    let backend = healthy_backend().await;
    let events = backend.list_events().await.unwrap();

    assert_eq!(events.len(), 3);
    assert_eq!(events[0].agent_ids(), vec![1, 2]);
    assert_eq!(events[1].agent_ids(), vec![3]);
    assert!(!events[2].is_mission());
    assert!(events[2].start.is_some());
}

#[tokio::test]
async fn http_foreign_calendar_entries_do_not_sink_the_list() {
    let app = Router::new().route("/api/calendar/events", get(shared_calendar));
    let base = serve(app).await;
    let backend = HttpBackend::new(BackendConfig::new(&base)).unwrap();

    let events = backend.list_events().await.unwrap();
    let ids: Vec<u64> = events.iter().map(|e| e.id).collect();
    assert_eq!(ids, vec![10, 14]);

    assert!(events[0].is_mission());
    assert_eq!(events[0].agent_ids(), vec![1, 2]);
    assert!(!events[1].is_mission());
    assert_eq!(events[1].agent_ids(), vec![4]);
}

#[tokio::test]
async fn http_update_event_round_trips() {
    let backend = healthy_backend().await;
    let event = backend
        .update_event(10, &EventUpdate::completed())
        .await
        .unwrap();

    assert_eq!(event.id, 10);
    assert_eq!(event.status.as_deref(), Some("completed"));
    assert!(event.agent_ids().is_empty());
}

#[tokio::test]
async fn http_object_instead_of_list_is_malformed() {
    let app = Router::new()
        .route("/api/agents", get(wrapped_list))
        .route("/api/calendar/events", get(wrapped_list));
    let base = serve(app).await;
    let backend = HttpBackend::new(BackendConfig::new(&base)).unwrap();

    let err = backend.list_agents().await.unwrap_err();
    assert!(matches!(err, BackendError::MalformedResponse(ref msg) if msg.contains("an object")));

    let err = backend.list_events().await.unwrap_err();
    assert!(matches!(err, BackendError::MalformedResponse(_)));
}

#[tokio::test]
async fn http_server_error_carries_status_and_body() {
    let app = Router::new().route("/api/agents", get(server_error));
    let base = serve(app).await;
    let backend = HttpBackend::new(BackendConfig::new(&base)).unwrap();

    match backend.list_agents().await.unwrap_err() {
        BackendError::Status { status, body } => {
            assert_eq!(status, 500);
            assert_eq!(body, "database down");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn http_unreachable_is_transport_error() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let backend = HttpBackend::new(
        BackendConfig::new(&format!("http://{}/api", addr)).with_timeout_secs(2),
    )
    .unwrap();
    let err = backend.list_agents().await.unwrap_err();
    assert!(matches!(err, BackendError::Transport(_)));
}
