//! FieldOps Core Library
//!
//! Agent directory, mission board and the status reconciliation that ties
//! them together. Backend access goes through the traits re-exported from
//! `fieldops-state`.

pub mod directory;
pub mod domain;
pub mod metrics;
pub mod missions;
pub mod obs;
pub mod reconcile;
pub mod telemetry;

pub use directory::AgentDirectory;

pub use domain::{mission_label, FieldOpsError, Mission, MissionStatus, Result};

pub use missions::{project_missions, MissionBoard, MissionGroups};

pub use reconcile::{
    pending_changes, reconcile, reconcile_agent, ActiveAgentIds, ACTIVE_MISSION_LABEL,
};

pub use fieldops_state::{
    Agent, AgentBackend, AgentId, AgentPatch, AgentStatus, BackendConfig, BackendError,
    CalendarEvent, EventId, EventSource, EventUpdate, HttpBackend,
};

pub use metrics::METRICS;
pub use obs::SessionSpan;
pub use telemetry::{init_tracing, LogFormat};

/// FieldOps version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
