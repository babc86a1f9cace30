use serde::{Deserialize, Serialize};

use crate::models::Sample;

/// One face found in a frame by the vision model.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DetectedFace {
    pub attention_level: f64,
}

/// Structured scoring output. An empty `faces` list means nobody is in frame.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct FaceDetection {
    pub faces: Vec<DetectedFace>,
}

impl FaceDetection {
    pub fn none() -> Self {
        Self::default()
    }

    pub fn single(attention_level: f64) -> Self {
        Self {
            faces: vec![DetectedFace { attention_level }],
        }
    }

    /// Level used for the session: the first face only, 0 when no face was seen.
    pub fn primary_level(&self) -> f64 {
        self.faces
            .first()
            .map(|face| face.attention_level)
            .unwrap_or(0.0)
    }

    /// Reject anything outside the 0-100 contract.
    pub fn validate(&self) -> Result<(), String> {
        for (idx, face) in self.faces.iter().enumerate() {
            let level = face.attention_level;
            if !level.is_finite() || !(0.0..=100.0).contains(&level) {
                return Err(format!("face {idx} has attention level {level} outside 0-100"));
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AttentionDataPoint {
    pub timestamp: String,
    pub attention_level: f64,
}

impl From<&Sample> for AttentionDataPoint {
    fn from(sample: &Sample) -> Self {
        Self {
            timestamp: sample.timestamp.clone(),
            attention_level: sample.attention_level,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SummaryRequest {
    pub attention_data: Vec<AttentionDataPoint>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub study_session_details: Option<String>,
}

impl SummaryRequest {
    pub fn from_samples(samples: &[Sample], details: Option<String>) -> Self {
        Self {
            attention_data: samples.iter().map(AttentionDataPoint::from).collect(),
            study_session_details: details.filter(|d| !d.trim().is_empty()),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SummaryResponse {
    pub summary: String,
}
