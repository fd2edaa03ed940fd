//! Diagnostics sink for fetch, confirmation and decode failures.

use std::sync::Mutex;

use chrono::{DateTime, Utc};
use fileselect_types::ParameterId;
use tracing::warn;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DiagnosticKind {
    ListFetchFailed,
    MaterializeFailed,
    DeserializeFailed,
}

/// One failure worth recording for later diagnosis.
#[derive(Clone, Debug)]
pub struct DiagnosticEvent {
    pub kind: DiagnosticKind,
    pub parameter_id: ParameterId,
    pub message: String,
    pub at: DateTime<Utc>,
}

impl DiagnosticEvent {
    pub fn new(kind: DiagnosticKind, parameter_id: ParameterId, message: impl Into<String>) -> Self {
        Self {
            kind,
            parameter_id,
            message: message.into(),
            at: Utc::now(),
        }
    }
}

pub trait ObservabilitySink: Send + Sync {
    fn report(&self, event: &DiagnosticEvent);
}

/// Default sink: forwards every event to `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl ObservabilitySink for TracingSink {
    fn report(&self, event: &DiagnosticEvent) {
        warn!(
            kind = ?event.kind,
            parameter_id = %event.parameter_id,
            at = %event.at.to_rfc3339(),
            "{}",
            event.message
        );
    }
}

/// Sink that keeps events in memory, used by front-ends that surface a
/// diagnostics list and by tests.
#[derive(Debug, Default)]
pub struct MemorySink {
    events: Mutex<Vec<DiagnosticEvent>>,
}

impl MemorySink {
    pub fn events(&self) -> Vec<DiagnosticEvent> {
        self.events.lock().expect("sink lock").clone()
    }

    pub fn count(&self, kind: DiagnosticKind) -> usize {
        self.events.lock().expect("sink lock").iter().filter(|event| event.kind == kind).count()
    }

    pub fn len(&self) -> usize {
        self.events.lock().expect("sink lock").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl ObservabilitySink for MemorySink {
    fn report(&self, event: &DiagnosticEvent) {
        self.events.lock().expect("sink lock").push(event.clone());
    }
}
