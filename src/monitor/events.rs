use serde::Serialize;
use tokio::sync::broadcast;

use crate::models::{Sample, SessionPhase, StatusLabel};

use super::state::SessionReport;

const EVENT_CAPACITY: usize = 256;

/// What a dashboard subscribes to.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "event", rename_all = "camelCase")]
pub enum ControllerEvent {
    #[serde(rename_all = "camelCase")]
    StateChanged {
        phase: SessionPhase,
        status_label: StatusLabel,
        current_level: f64,
    },
    #[serde(rename_all = "camelCase")]
    SampleRecorded {
        sample: Sample,
        status_label: StatusLabel,
        sample_count: usize,
    },
    Alert { level: f64 },
    TickFailed { reason: String },
    SessionSummarized { report: SessionReport },
}

#[derive(Clone)]
pub struct EventBus {
    tx: broadcast::Sender<ControllerEvent>,
}

impl EventBus {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(EVENT_CAPACITY);
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ControllerEvent> {
        self.tx.subscribe()
    }

    /// Fire and forget; having no listener is fine.
    pub fn emit(&self, event: ControllerEvent) {
        let _ = self.tx.send(event);
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}
