//! Logger setup and per-module switchable logging macros.
//!
//! A module opts in by defining the switch and importing the macros
//! (they're exported at the crate root):
//! ```ignore
//! const ENABLE_LOGS: bool = true;
//! use crate::{log_info, log_warn};
//! ```
//! Flip the const to `false` to mute a chatty module (the polling loop logs
//! every tick) without touching the global `RUST_LOG` filter.

use log::LevelFilter;

/// Initialise `env_logger` once at Info, or Debug with `FOCUSFLOW_DEBUG=1`.
pub fn init_logging() {
    let debug_mode = std::env::var("FOCUSFLOW_DEBUG")
        .map(|value| value == "1" || value.eq_ignore_ascii_case("true"))
        .unwrap_or(false);

    let default_level = if debug_mode {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };

    // A second init (tests, embedding apps) keeps the first logger.
    let _ = env_logger::Builder::from_default_env()
        .filter_level(default_level)
        .try_init();
}

#[doc(hidden)]
#[macro_export]
macro_rules! __switchable_log {
    ($level:ident, $($arg:tt)*) => {
        if ENABLE_LOGS {
            log::$level!($($arg)*);
        }
    };
}

/// `log::debug!` gated on the calling module's `ENABLE_LOGS`.
#[macro_export]
macro_rules! log_debug {
    ($($arg:tt)*) => { $crate::__switchable_log!(debug, $($arg)*) };
}

/// `log::info!` gated on the calling module's `ENABLE_LOGS`.
#[macro_export]
macro_rules! log_info {
    ($($arg:tt)*) => { $crate::__switchable_log!(info, $($arg)*) };
}

/// `log::warn!` gated on the calling module's `ENABLE_LOGS`.
#[macro_export]
macro_rules! log_warn {
    ($($arg:tt)*) => { $crate::__switchable_log!(warn, $($arg)*) };
}
