//! Admission event sinks.
//!
//! Sinks are fire-and-forget: `emit` cannot fail from the caller's point of
//! view and never influences the decision being reported.

use std::sync::Mutex;

use bmset_events::AdmissionEvent;
use tracing::{info, warn};

/// Destination for admission events.
pub trait EventSink: Send + Sync {
    fn emit(&self, event: AdmissionEvent);
}

/// Writes every event as a structured log record under `bmset::events`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl EventSink for TracingSink {
    fn emit(&self, event: AdmissionEvent) {
        match event.to_json() {
            Ok(json) => info!(
                target: "bmset::events",
                event_type = %event.event_type,
                subject = %event.subject,
                request_id = %event.request_id,
                event = %json,
                "Admission event"
            ),
            Err(e) => warn!(
                target: "bmset::events",
                event_type = %event.event_type,
                error = %e,
                "Failed to encode admission event"
            ),
        }
    }
}

/// Keeps events in memory; for tests.
#[derive(Debug, Default)]
pub struct MemorySink {
    events: Mutex<Vec<AdmissionEvent>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of all events emitted so far.
    pub fn events(&self) -> Vec<AdmissionEvent> {
        self.events
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }
}

impl EventSink for MemorySink {
    fn emit(&self, event: AdmissionEvent) {
        self.events
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(event);
    }
}
