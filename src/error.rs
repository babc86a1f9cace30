use thiserror::Error;

use crate::models::SessionPhase;

#[derive(Debug, Clone, Error)]
pub enum FocusError {
    /// Camera permission refused or no capture device present. Aborts `start`.
    #[error("camera unavailable: {0}")]
    DeviceUnavailable(String),

    /// The scoring call failed for one tick. The polling loop keeps going.
    #[error("attention scoring failed: {0}")]
    ScoringFailure(String),

    #[error("session summary failed: {0}")]
    SummarizationFailure(String),

    #[error("cannot {command} while session is {phase:?}")]
    InvalidTransition {
        command: &'static str,
        phase: SessionPhase,
    },

    #[error("config error: {0}")]
    Config(String),
}

impl From<FocusError> for String {
    fn from(err: FocusError) -> Self {
        err.to_string()
    }
}
