//! Telemetry module
//!
//! Structured logging and metrics

mod logging;
mod metrics;

pub use logging::{init_logging, LogFormat};
pub use metrics::{record_blocked_trade, set_allocation_gauge, set_gauge, GaugeMetric};

use crate::config::TelemetryConfig;

/// Initialize all telemetry subsystems
pub fn init_telemetry(config: &TelemetryConfig) -> anyhow::Result<()> {
    init_logging(&config.log_level, config.log_format)
}
