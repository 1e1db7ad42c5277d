//! Logging setup
//!
//! Library code only emits `tracing` events; embedders that have no
//! subscriber of their own can install one from the `[general]` config.

use crate::config::schema::GeneralConfig;
use crate::error::{FragkeyError, FragkeyResult};
use tracing_subscriber::EnvFilter;

/// Filter directive for the fragkey target, e.g. `fragkey=debug`
pub fn filter_directive(config: &GeneralConfig) -> String {
    let level = match config.log_level.to_ascii_lowercase().as_str() {
        level @ ("error" | "warn" | "info" | "debug" | "trace" | "off") => level.to_string(),
        _ => "warn".to_string(),
    };
    format!("fragkey={}", level)
}

/// Install a global fmt subscriber; fails if one is already installed
pub fn init(config: &GeneralConfig) -> FragkeyResult<()> {
    let filter = EnvFilter::new(filter_directive(config));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false);

    let result = if config.log_format.eq_ignore_ascii_case("json") {
        builder.json().try_init()
    } else {
        builder.without_time().try_init()
    };

    result.map_err(|e| FragkeyError::Internal(format!("installing log subscriber: {}", e)))
}
