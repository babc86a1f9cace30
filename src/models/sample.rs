use chrono::{DateTime, Local, Utc};
use serde::{Deserialize, Serialize};

/// One scored frame. `timestamp` is the wall-clock label shown on the chart
/// and sent to the summarizer; `recorded_at` is the machine-readable instant.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Sample {
    pub timestamp: String,
    pub attention_level: f64,
    pub recorded_at: DateTime<Utc>,
}

impl Sample {
    pub fn new(attention_level: f64, recorded_at: DateTime<Utc>) -> Self {
        let timestamp = recorded_at
            .with_timezone(&Local)
            .format("%H:%M:%S")
            .to_string();
        Self::with_label(timestamp, attention_level, recorded_at)
    }

    pub fn with_label(
        timestamp: impl Into<String>,
        attention_level: f64,
        recorded_at: DateTime<Utc>,
    ) -> Self {
        Self {
            timestamp: timestamp.into(),
            attention_level: clamp_level(attention_level),
            recorded_at,
        }
    }
}

fn clamp_level(level: f64) -> f64 {
    if level.is_nan() {
        0.0
    } else {
        level.clamp(0.0, 100.0)
    }
}
