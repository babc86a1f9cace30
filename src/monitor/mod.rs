pub mod controller;
pub mod events;
pub mod state;


pub use controller::{AttentionController, ControllerConfig, TickOutcome};
pub use events::ControllerEvent;
pub use state::{
    DashboardSnapshot, SessionReport, SummaryOutcome, INSUFFICIENT_DATA_TEXT,
    SUMMARY_UNAVAILABLE_TEXT,
};
