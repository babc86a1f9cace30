use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use log::debug;
use rand::{rngs::StdRng, Rng, SeedableRng};

use crate::error::FocusError;
use crate::sensing::EncodedFrame;

use super::client::{image_part, text_part, GeminiClient};
use super::prompts::{face_detection_schema, DETECT_FACES_PROMPT};
use super::types::FaceDetection;

/// Estimates how attentive the people in a frame are.
#[async_trait]
pub trait AttentionScorer: Send + Sync {
    async fn score(&self, frame: &EncodedFrame) -> Result<FaceDetection, FocusError>;
}

pub struct GeminiScorer {
    client: Arc<GeminiClient>,
}

impl GeminiScorer {
    pub fn new(client: Arc<GeminiClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl AttentionScorer for GeminiScorer {
    async fn score(&self, frame: &EncodedFrame) -> Result<FaceDetection, FocusError> {
        if frame.is_empty() {
            debug!("Empty frame, skipping model call");
            return Ok(FaceDetection::none());
        }

        let parts = vec![text_part(DETECT_FACES_PROMPT), image_part(frame)];
        let output = self
            .client
            .generate_json(parts, face_detection_schema())
            .await
            .map_err(|err| FocusError::ScoringFailure(format!("{err:#}")))?;

        let detection: FaceDetection = serde_json::from_value(output).map_err(|err| {
            FocusError::ScoringFailure(format!("response does not match face schema: {err}"))
        })?;
        detection.validate().map_err(FocusError::ScoringFailure)?;

        debug!(
            "Model {} saw {} face(s)",
            self.client.model(),
            detection.faces.len()
        );
        Ok(detection)
    }
}

/// Offline stand-in that reports one face with a uniformly random level.
pub struct SimulatedScorer {
    rng: Mutex<StdRng>,
}

impl SimulatedScorer {
    pub fn new() -> Self {
        Self {
            rng: Mutex::new(StdRng::from_entropy()),
        }
    }

    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }
}

impl Default for SimulatedScorer {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl AttentionScorer for SimulatedScorer {
    async fn score(&self, frame: &EncodedFrame) -> Result<FaceDetection, FocusError> {
        if frame.is_empty() {
            return Ok(FaceDetection::none());
        }
        let level = self
            .rng
            .lock()
            .map_err(|_| FocusError::ScoringFailure("simulated scorer poisoned".into()))?
            .gen_range(0.0..=100.0);
        Ok(FaceDetection::single(level))
    }
}
