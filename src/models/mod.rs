mod attention;
mod sample;

pub use attention::{
    is_falling_edge, AttentionState, SessionPhase, StatusLabel, DISTRACTED_BELOW, FOCUSED_FROM,
};
pub use sample::Sample;
