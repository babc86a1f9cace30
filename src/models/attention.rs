use serde::{Deserialize, Serialize};

/// Levels strictly below this are "Distracted", and crossing below it raises the alert.
pub const DISTRACTED_BELOW: f64 = 40.0;
/// Levels at or above this are "Focused".
pub const FOCUSED_FROM: f64 = 75.0;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub enum SessionPhase {
    #[default]
    Idle,
    Active,
    Summarizing,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum StatusLabel {
    Idle,
    Distracted,
    Attentive,
    Focused,
    Ended,
}

impl StatusLabel {
    pub fn for_level(level: f64) -> Self {
        if level < DISTRACTED_BELOW {
            StatusLabel::Distracted
        } else if level < FOCUSED_FROM {
            StatusLabel::Attentive
        } else {
            StatusLabel::Focused
        }
    }

    /// Label for the dashboard. Only an active session looks at the level;
    /// a stale level from a finished session never leaks into the idle label.
    pub fn derive(phase: SessionPhase, level: f64) -> Self {
        match phase {
            SessionPhase::Idle => StatusLabel::Idle,
            SessionPhase::Active => StatusLabel::for_level(level),
            SessionPhase::Summarizing => StatusLabel::Ended,
        }
    }

    pub fn text(&self) -> &'static str {
        match self {
            StatusLabel::Idle => "Ready to focus?",
            StatusLabel::Distracted => "Distracted",
            StatusLabel::Attentive => "Attentive",
            StatusLabel::Focused => "Focused",
            StatusLabel::Ended => "Session Ended",
        }
    }
}

/// Transition from at-or-above the distracted threshold to below it.
pub fn is_falling_edge(previous: f64, current: f64) -> bool {
    previous >= DISTRACTED_BELOW && current < DISTRACTED_BELOW
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AttentionState {
    pub current_level: f64,
    pub previous_level: f64,
}

impl AttentionState {
    pub fn starting_at(level: f64) -> Self {
        Self {
            current_level: level,
            previous_level: level,
        }
    }

    /// Shift the new level in. Returns true when this sample is a falling-edge crossing.
    pub fn record(&mut self, level: f64) -> bool {
        self.previous_level = self.current_level;
        self.current_level = level;
        is_falling_edge(self.previous_level, self.current_level)
    }

    pub fn label(&self, phase: SessionPhase) -> StatusLabel {
        StatusLabel::derive(phase, self.current_level)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn thresholds_at_boundaries() {
        assert_eq!(StatusLabel::for_level(0.0), StatusLabel::Distracted);
        assert_eq!(StatusLabel::for_level(39.99), StatusLabel::Distracted);
        assert_eq!(StatusLabel::for_level(40.0), StatusLabel::Attentive);
        assert_eq!(StatusLabel::for_level(74.99), StatusLabel::Attentive);
        assert_eq!(StatusLabel::for_level(75.0), StatusLabel::Focused);
        assert_eq!(StatusLabel::for_level(100.0), StatusLabel::Focused);
    }

    #[test]
    fn every_valid_level_gets_an_active_label() {
        for step in 0..=10_000 {
            let level = step as f64 / 100.0;
            let label = StatusLabel::derive(SessionPhase::Active, level);
            assert!(matches!(
                label,
                StatusLabel::Distracted | StatusLabel::Attentive | StatusLabel::Focused
            ));
        }
    }

    #[test]
    fn idle_ignores_stale_level() {
        assert_eq!(StatusLabel::derive(SessionPhase::Idle, 12.0), StatusLabel::Idle);
        assert_eq!(StatusLabel::derive(SessionPhase::Idle, 90.0), StatusLabel::Idle);
        assert_eq!(StatusLabel::Idle.text(), "Ready to focus?");
        assert_eq!(
            StatusLabel::derive(SessionPhase::Summarizing, 90.0),
            StatusLabel::Ended
        );
    }

    #[test]
    fn alert_fires_once_per_crossing() {
        let mut state = AttentionState::starting_at(50.0);
        let fired: Vec<bool> = [30.0, 20.0, 10.0, 45.0, 39.0, 39.5, 80.0, 40.0, 0.0]
            .into_iter()
            .map(|level| state.record(level))
            .collect();
        assert_eq!(
            fired,
            vec![true, false, false, false, true, false, false, false, true]
        );
    }

    #[test]
    fn record_shifts_previous() {
        let mut state = AttentionState::starting_at(50.0);
        state.record(70.0);
        assert_eq!(state.previous_level, 50.0);
        assert_eq!(state.current_level, 70.0);
        assert_eq!(state.label(SessionPhase::Active), StatusLabel::Attentive);
    }

    #[test]
    fn falling_edge_needs_previous_at_threshold() {
        assert!(is_falling_edge(40.0, 39.99));
        assert!(!is_falling_edge(39.99, 10.0));
        assert!(!is_falling_edge(60.0, 40.0));
    }
}
