//! Vision and language model collaborators: frame scoring and session summaries.

pub mod client;
pub mod prompts;
pub mod scorer;
pub mod summarizer;
pub mod types;

pub use client::GeminiClient;
pub use scorer::{AttentionScorer, GeminiScorer, SimulatedScorer};
pub use summarizer::{GeminiSummarizer, LocalSummarizer, SessionSummarizer};
pub use types::{AttentionDataPoint, DetectedFace, FaceDetection, SummaryRequest};
