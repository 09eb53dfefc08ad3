//! Mission board loading, reconciliation hand-off and ending missions.

use std::sync::Arc;

use fieldops_core::{AgentDirectory, FieldOpsError, MissionBoard, MissionStatus};
use fieldops_state::fakes::{AgentCall, EventCall, Failure, MemoryAgentBackend, MemoryEventSource};
use fieldops_state::{Agent, AgentPatch, AgentStatus, CalendarEvent, EventUpdate, Participant};

type Directory = AgentDirectory<Arc<MemoryAgentBackend>, Arc<MemoryEventSource>>;

fn roster() -> Vec<Agent> {
    vec![
        Agent::new(5, "T. Nakamura"),
        Agent::new(6, "L. Osei"),
        Agent::new(7, "C. Varga")
            .with_status(AgentStatus::OnMission)
            .with_mission("Mission #1"),
    ]
}

fn calendar() -> Vec<CalendarEvent> {
    let mut patrol = CalendarEvent::new(2, "mission", "Harbour patrol");
    patrol.status = Some("in_progress".to_string());
    patrol.participants = Some(vec![Participant::Text("6".to_string())]);

    vec![
        CalendarEvent::mission(1, "Convoy escort", "active", vec![5]),
        patrol,
        CalendarEvent::mission(3, "Site audit", "planned", vec![7]),
        CalendarEvent::new(4, "training", "First aid refresher"),
    ]
}

fn setup() -> (
    Directory,
    MissionBoard<Arc<MemoryEventSource>>,
    Arc<MemoryAgentBackend>,
    Arc<MemoryEventSource>,
) {
    let backend = Arc::new(MemoryAgentBackend::with_agents(roster()));
    let source = Arc::new(MemoryEventSource::with_events(calendar()));
    let directory = AgentDirectory::with_agents(backend.clone(), source.clone(), roster());
    let board = MissionBoard::new(source.clone());
    (directory, board, backend, source)
}

#[tokio::test]
async fn load_projects_missions_and_reconciles_directory() {
    let (mut directory, mut board, backend, _) = setup();

    assert!(board.load(&mut directory).await);
    assert!(board.error().is_none());
    assert_eq!(board.missions().len(), 3);

    // in_progress counts as running, participants are normalized
    assert!(directory.get(5).unwrap().is_on_mission());
    assert!(directory.get(6).unwrap().is_on_mission());
    // agent 7 is only on a planned mission
    let seven = directory.get(7).unwrap();
    assert_eq!(seven.status, AgentStatus::Active);
    assert!(seven.current_mission.is_none());

    // reconciliation never talks to the agent backend
    assert_eq!(backend.call_count(), 0);
}

#[tokio::test]
async fn load_groups_for_display() {
    let (mut directory, mut board, _, _) = setup();
    board.load(&mut directory).await;

    let groups = board.groups();
    assert_eq!(groups.running.len(), 2);
    assert_eq!(groups.upcoming.len(), 1);
    assert!(groups.finished.is_empty());
}

#[tokio::test]
async fn load_failure_keeps_missions_and_directory() {
    let (mut directory, mut board, _, source) = setup();
    board.load(&mut directory).await;
    let agents_before = directory.agents().to_vec();

    source.set_offline(true);
    assert!(!board.load(&mut directory).await);

    assert_eq!(board.missions().len(), 3);
    assert!(board.error().unwrap().starts_with("Could not load missions"));
    assert_eq!(directory.agents(), agents_before.as_slice());
}

#[tokio::test]
async fn malformed_load_empties_board_with_message() {
    let (mut directory, mut board, _, source) = setup();
    board.load(&mut directory).await;

    source.set_failure(Some(Failure::Malformed));
    assert!(!board.load(&mut directory).await);

    assert!(board.missions().is_empty());
    assert!(board.error().unwrap().contains("Unexpected response"));
}

#[tokio::test]
async fn end_mission_detaches_agents_then_updates_event_once() {
    let backend = Arc::new(MemoryAgentBackend::with_agents(vec![
        Agent::new(5, "T. Nakamura"),
        Agent::new(6, "L. Osei"),
    ]));
    let source = Arc::new(MemoryEventSource::with_events(vec![CalendarEvent::mission(
        11,
        "VIP close protection",
        "active",
        vec![5, 6],
    )]));
    let mut directory = AgentDirectory::new(backend.clone(), source.clone());
    let mut board = MissionBoard::new(source.clone());

    directory.refresh().await;
    board.load(&mut directory).await;
    assert!(directory.get(5).unwrap().is_on_mission());

    let mission = board.end_mission(11, &mut directory).await.unwrap();
    assert_eq!(mission.status, MissionStatus::Completed);
    assert!(mission.agent_ids.is_empty());

    let detaches: Vec<_> = backend
        .calls()
        .into_iter()
        .filter(|c| matches!(c, AgentCall::Update(..)))
        .collect();
    assert_eq!(
        detaches,
        vec![
            AgentCall::Update(5, AgentPatch::released()),
            AgentCall::Update(6, AgentPatch::released()),
        ]
    );
    assert_eq!(source.updates(), vec![(11, EventUpdate::completed())]);

    for id in [5, 6] {
        let agent = directory.get(id).unwrap();
        assert_eq!(agent.status, AgentStatus::Active);
        assert!(agent.current_mission.is_none());
    }

    // a reload sees the completed mission and keeps everyone off duty
    board.load(&mut directory).await;
    assert!(board.active_agent_ids().is_empty());
    assert!(directory.agents().iter().all(|a| !a.is_on_mission()));
}

#[tokio::test]
async fn end_mission_issues_event_update_last() {
    let (mut directory, mut board, _, source) = setup();
    board.load(&mut directory).await;

    board.end_mission(1, &mut directory).await.unwrap();

    let calls = source.calls();
    assert_eq!(calls.last(), Some(&EventCall::Update(1, EventUpdate::completed())));
    assert!(!directory.get(5).unwrap().is_on_mission());
}

#[tokio::test]
async fn end_mission_completes_locally_when_calendar_fails() {
    let (mut directory, mut board, backend, source) = setup();
    board.load(&mut directory).await;

    backend.set_offline(true);
    source.set_offline(true);
    let mission = board.end_mission(2, &mut directory).await.unwrap();

    assert_eq!(mission.status, MissionStatus::Completed);
    assert_eq!(source.updates().len(), 1);
    // detach fell back to a local patch
    assert_eq!(directory.get(6).unwrap().status, AgentStatus::Active);
}

#[tokio::test]
async fn end_unknown_mission_is_an_error() {
    let (mut directory, mut board, backend, source) = setup();
    board.load(&mut directory).await;

    let err = board.end_mission(4, &mut directory).await.unwrap_err();
    assert!(matches!(err, FieldOpsError::MissionNotFound(4)));
    assert_eq!(backend.call_count(), 0);
    assert!(source.updates().is_empty());
}
