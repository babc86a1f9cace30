//! Prompt templates and response schemas for the two model calls.

use serde_json::{json, Value};

use super::types::SummaryRequest;

pub const DETECT_FACES_PROMPT: &str = "You are an expert in computer vision and psychology. \
Your task is to analyze an image from a webcam feed and detect human faces.

For each face you detect, you must estimate the person's attention level on a scale from 0 to 100.
- 100 means the person is fully focused and looking directly at the screen.
- 50 means the person is attentive but might be slightly looking away.
- 0 means the person is not paying attention, is looking away, or is not present.

If no face is detected, return an empty array for the 'faces' field.

Analyze the following image:";

/// Gemini `responseSchema` for [`super::types::FaceDetection`].
pub fn face_detection_schema() -> Value {
    json!({
        "type": "OBJECT",
        "properties": {
            "faces": {
                "type": "ARRAY",
                "description": "An array of detected faces.",
                "items": {
                    "type": "OBJECT",
                    "properties": {
                        "attentionLevel": {
                            "type": "NUMBER",
                            "description": "An estimation of the attention level of the person (0-100), where 100 is fully focused."
                        }
                    },
                    "required": ["attentionLevel"]
                }
            }
        },
        "required": ["faces"]
    })
}

/// Gemini `responseSchema` for [`super::types::SummaryResponse`].
pub fn summary_schema() -> Value {
    json!({
        "type": "OBJECT",
        "properties": {
            "summary": {
                "type": "STRING",
                "description": "A summary of the study session, highlighting periods of high and low attention."
            }
        },
        "required": ["summary"]
    })
}

pub fn build_summary_prompt(request: &SummaryRequest) -> String {
    let mut prompt = String::from(
        "You are an AI assistant that summarizes study sessions based on attention data.\n\n\
The user wants a summary of their study session, highlighting periods of high and low attention, \
so they can identify patterns and improve their focus.\n\n\
Here are the details of the study session:\n",
    );

    if let Some(details) = &request.study_session_details {
        prompt.push_str(&format!("Study Session Details: {details}\n"));
    }

    prompt.push_str("\nAttention Data:\n");
    for point in &request.attention_data {
        prompt.push_str(&format!(
            "- Timestamp: {}, Attention Level: {}\n",
            point.timestamp,
            format_level(point.attention_level)
        ));
    }

    prompt.push_str(
        "\nPlease provide a concise summary of the session, focusing on the key trends in \
attention levels and any significant periods of high or low focus.",
    );
    prompt
}

fn format_level(level: f64) -> String {
    if level.fract() == 0.0 {
        format!("{level:.0}")
    } else {
        format!("{level:.1}")
    }
}
