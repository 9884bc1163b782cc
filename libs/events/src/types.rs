//! Event type definitions for admission outcomes.

use bmset_id::HostRef;
use serde::{Deserialize, Serialize};

use crate::EventEnvelope;

// =============================================================================
// Event Type Constants
// =============================================================================

/// All event type names as constants.
pub mod event_types {
    pub const SET_CREATE_ADMITTED: &str = "baremetal_set.create_admitted";
    pub const SET_UPDATE_ADMITTED: &str = "baremetal_set.update_admitted";
    pub const SET_DELETE_OBSERVED: &str = "baremetal_set.delete_observed";
    pub const SET_REJECTED: &str = "baremetal_set.rejected";
}

// =============================================================================
// Enums
// =============================================================================

/// The kind of change under admission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Operation {
    Create,
    Update,
    Delete,
}

impl std::fmt::Display for Operation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Operation::Create => write!(f, "create"),
            Operation::Update => write!(f, "update"),
            Operation::Delete => write!(f, "delete"),
        }
    }
}

/// Direction of a count change relative to the bound host count.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScaleDirection {
    Unchanged,
    Up,
    Down,
}

impl std::fmt::Display for ScaleDirection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ScaleDirection::Unchanged => write!(f, "unchanged"),
            ScaleDirection::Up => write!(f, "up"),
            ScaleDirection::Down => write!(f, "down"),
        }
    }
}

// =============================================================================
// Payloads
// =============================================================================

/// Payload for every admission outcome event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdmissionOutcomePayload {
    pub operation: Operation,
    pub admitted: bool,
    /// Number of hosts bound before the change.
    pub bound_count: u32,
    /// Requested host count.
    pub desired_count: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub direction: Option<ScaleDirection>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub selected_hosts: Vec<HostRef>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub selection_fingerprint: Option<String>,
    /// Machine-readable rejection reason.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// An admission event as delivered to event sinks.
pub type AdmissionEvent = EventEnvelope<AdmissionOutcomePayload>;

impl AdmissionOutcomePayload {
    /// The event type this payload is published under.
    pub fn event_type(&self) -> &'static str {
        match (self.admitted, self.operation) {
            (false, _) => event_types::SET_REJECTED,
            (true, Operation::Create) => event_types::SET_CREATE_ADMITTED,
            (true, Operation::Update) => event_types::SET_UPDATE_ADMITTED,
            (true, Operation::Delete) => event_types::SET_DELETE_OBSERVED,
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
