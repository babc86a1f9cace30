use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::FocusError;
use crate::models::{AttentionState, Sample, SessionPhase, StatusLabel};
use crate::session::SessionRecorder;

pub const INSUFFICIENT_DATA_TEXT: &str = "Not enough data was collected for a summary.";
pub const SUMMARY_UNAVAILABLE_TEXT: &str = "An error occurred while generating the summary.";

/// Sessions with fewer samples than this are not sent to the summarizer.
pub const MIN_SAMPLES_FOR_SUMMARY: usize = 2;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum SummaryOutcome {
    Generated { text: String },
    InsufficientData,
    Unavailable { reason: String },
}

impl SummaryOutcome {
    /// What the dashboard shows.
    pub fn text(&self) -> &str {
        match self {
            SummaryOutcome::Generated { text } => text,
            SummaryOutcome::InsufficientData => INSUFFICIENT_DATA_TEXT,
            SummaryOutcome::Unavailable { .. } => SUMMARY_UNAVAILABLE_TEXT,
        }
    }
}

/// Result of `end()`. A failed summary still ends the session; the failure rides along.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SessionReport {
    pub session_id: String,
    pub started_at: DateTime<Utc>,
    pub ended_at: DateTime<Utc>,
    pub samples: Vec<Sample>,
    pub summary: SummaryOutcome,
}

impl SessionReport {
    pub fn summary_text(&self) -> &str {
        self.summary.text()
    }

    pub fn error(&self) -> Option<FocusError> {
        match &self.summary {
            SummaryOutcome::Unavailable { reason } => {
                Some(FocusError::SummarizationFailure(reason.clone()))
            }
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DashboardSnapshot {
    pub phase: SessionPhase,
    pub session_id: Option<String>,
    pub current_level: f64,
    pub previous_level: f64,
    pub status_label: StatusLabel,
    pub status_text: String,
    pub samples: Vec<Sample>,
    pub summary: Option<String>,
    pub sound_alerts_enabled: bool,
}

/// Everything the controller mutates, guarded by one lock.
#[derive(Debug)]
pub struct ControllerState {
    pub phase: SessionPhase,
    /// Bumped on every start and end; ticks carry the value they started under.
    pub generation: u64,
    pub session_id: Option<String>,
    pub started_at: Option<DateTime<Utc>>,
    pub attention: AttentionState,
    pub recorder: SessionRecorder,
    pub summary: Option<SummaryOutcome>,
    pub sound_alerts_enabled: bool,
}

impl ControllerState {
    pub fn new(initial_level: f64, sound_alerts_enabled: bool) -> Self {
        Self {
            phase: SessionPhase::Idle,
            generation: 0,
            session_id: None,
            started_at: None,
            attention: AttentionState::starting_at(initial_level),
            recorder: SessionRecorder::new(),
            summary: None,
            sound_alerts_enabled,
        }
    }

    /// Idle -> Active. Returns the generation the new session runs under.
    pub fn begin_session(
        &mut self,
        session_id: String,
        initial_level: f64,
        started_at: DateTime<Utc>,
    ) -> u64 {
        self.generation += 1;
        self.phase = SessionPhase::Active;
        self.session_id = Some(session_id);
        self.started_at = Some(started_at);
        self.attention = AttentionState::starting_at(initial_level);
        self.recorder.reset();
        self.summary = None;
        self.generation
    }

    /// Undo `begin_session` after the camera refused to open.
    pub fn abort_start(&mut self) {
        self.generation += 1;
        self.phase = SessionPhase::Idle;
        self.session_id = None;
        self.started_at = None;
    }

    /// Active -> Summarizing. The session is frozen from here on.
    pub fn begin_summarizing(&mut self) {
        self.generation += 1;
        self.phase = SessionPhase::Summarizing;
    }

    /// Summarizing -> Idle, keeping the samples and summary for display.
    pub fn finish(&mut self, summary: Option<SummaryOutcome>) {
        self.phase = SessionPhase::Idle;
        self.summary = summary;
    }

    /// Whether a tick started under `generation` may still write.
    pub fn accepts(&self, generation: u64) -> bool {
        self.phase == SessionPhase::Active && self.generation == generation
    }

    /// Append a sample and shift levels. The flag is true on a falling-edge crossing.
    pub fn record(&mut self, level: f64, at: DateTime<Utc>) -> (Sample, bool) {
        let sample = Sample::new(level, at);
        self.recorder.append(sample.clone());
        let crossed = self.attention.record(sample.attention_level);
        (sample, crossed)
    }

    pub fn status_label(&self) -> StatusLabel {
        self.attention.label(self.phase)
    }

    pub fn snapshot(&self) -> DashboardSnapshot {
        let status_label = self.status_label();
        DashboardSnapshot {
            phase: self.phase,
            session_id: self.session_id.clone(),
            current_level: self.attention.current_level,
            previous_level: self.attention.previous_level,
            status_label,
            status_text: status_label.text().to_string(),
            samples: self.recorder.all().to_vec(),
            summary: self.summary.as_ref().map(|s| s.text().to_string()),
            sound_alerts_enabled: self.sound_alerts_enabled,
        }
    }
}
