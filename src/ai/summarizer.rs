use std::sync::Arc;

use async_trait::async_trait;
use log::debug;

use crate::error::FocusError;
use crate::models::{StatusLabel, DISTRACTED_BELOW};

use super::client::{text_part, GeminiClient};
use super::prompts::{build_summary_prompt, summary_schema};
use super::types::{AttentionDataPoint, SummaryRequest, SummaryResponse};

/// Turns a finished session's attention series into prose.
#[async_trait]
pub trait SessionSummarizer: Send + Sync {
    async fn summarize(&self, request: &SummaryRequest) -> Result<String, FocusError>;
}

pub struct GeminiSummarizer {
    client: Arc<GeminiClient>,
}

impl GeminiSummarizer {
    pub fn new(client: Arc<GeminiClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl SessionSummarizer for GeminiSummarizer {
    async fn summarize(&self, request: &SummaryRequest) -> Result<String, FocusError> {
        let prompt = build_summary_prompt(request);
        debug!(
            "Requesting summary of {} points from {}",
            request.attention_data.len(),
            self.client.model()
        );

        let output = self
            .client
            .generate_json(vec![text_part(prompt)], summary_schema())
            .await
            .map_err(|err| FocusError::SummarizationFailure(format!("{err:#}")))?;

        let response: SummaryResponse = serde_json::from_value(output).map_err(|err| {
            FocusError::SummarizationFailure(format!("response does not match summary schema: {err}"))
        })?;

        let summary = response.summary.trim().to_string();
        if summary.is_empty() {
            return Err(FocusError::SummarizationFailure(
                "model returned an empty summary".into(),
            ));
        }
        Ok(summary)
    }
}

/// Offline summary computed from the series itself.
#[derive(Debug, Default, Clone, Copy)]
pub struct LocalSummarizer;

#[async_trait]
impl SessionSummarizer for LocalSummarizer {
    async fn summarize(&self, request: &SummaryRequest) -> Result<String, FocusError> {
        describe_series(&request.attention_data).ok_or_else(|| {
            FocusError::SummarizationFailure("no attention data to summarize".into())
        })
    }
}

fn describe_series(points: &[AttentionDataPoint]) -> Option<String> {
    let first = points.first()?;
    let last = points.last()?;

    let count = points.len() as f64;
    let mean = points.iter().map(|p| p.attention_level).sum::<f64>() / count;
    let peak = points
        .iter()
        .max_by(|a, b| a.attention_level.total_cmp(&b.attention_level))?;
    let low = points
        .iter()
        .min_by(|a, b| a.attention_level.total_cmp(&b.attention_level))?;

    let share = |label: StatusLabel| {
        let n = points
            .iter()
            .filter(|p| StatusLabel::for_level(p.attention_level) == label)
            .count();
        n as f64 * 100.0 / count
    };

    let mut summary = format!(
        "Session from {} to {} with {} readings. Average attention was {:.0} ({}). \
Focused {:.0}% of the time, attentive {:.0}%, distracted {:.0}%. \
Peak focus {:.0} at {}; lowest point {:.0} at {}.",
        first.timestamp,
        last.timestamp,
        points.len(),
        mean,
        StatusLabel::for_level(mean).text().to_lowercase(),
        share(StatusLabel::Focused),
        share(StatusLabel::Attentive),
        share(StatusLabel::Distracted),
        peak.attention_level,
        peak.timestamp,
        low.attention_level,
        low.timestamp,
    );

    if let Some((start, end, len)) = longest_distracted_run(points) {
        if len > 1 {
            summary.push_str(&format!(
                " The longest distracted stretch ran from {start} to {end} ({len} readings)."
            ));
        }
    } else {
        summary.push_str(" Attention never dropped into the distracted range.");
    }

    Some(summary)
}

fn longest_distracted_run(points: &[AttentionDataPoint]) -> Option<(&str, &str, usize)> {
    let mut best: Option<(usize, usize)> = None;
    let mut run_start: Option<usize> = None;

    for (idx, point) in points.iter().enumerate() {
        if point.attention_level < DISTRACTED_BELOW {
            let start = *run_start.get_or_insert(idx);
            let len = idx - start + 1;
            if best.map_or(true, |(_, best_len)| len > best_len) {
                best = Some((start, len));
            }
        } else {
            run_start = None;
        }
    }

    best.map(|(start, len)| {
        (
            points[start].timestamp.as_str(),
            points[start + len - 1].timestamp.as_str(),
            len,
        )
    })
}
