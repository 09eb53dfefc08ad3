//! Domain models for FieldOps.
//!
//! Canonical definitions for the entities the core reasons about:
//! - `Mission`: Projection of a calendar event of type `mission`
//! - `MissionStatus`: Parsed form of the event's free-form status
//! - `FieldOpsError`: Errors surfaced to callers of the core

pub mod error;
pub mod mission;

// Re-export main types and errors
pub use error::{FieldOpsError, Result};
pub use mission::{mission_label, Mission, MissionStatus};
