//! Configuration types for risk-alloc

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::Deserialize;

use crate::allocation::AllocationMethod;
use crate::risk::{RiskLimits, RiskProfile, SizingMethod};
use crate::telemetry::LogFormat;

/// Root configuration structure
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub risk: RiskConfig,
    /// Default sizing method for the `size` command
    #[serde(default)]
    pub sizing: SizingMethod,
    #[serde(default)]
    pub allocation: AllocationConfig,
    #[serde(default)]
    pub telemetry: TelemetryConfig,
}

/// Portfolio risk configuration
#[derive(Debug, Clone, Deserialize)]
pub struct RiskConfig {
    /// Named limit preset
    #[serde(default)]
    pub profile: RiskProfile,

    /// Equity the manager starts from
    #[serde(default = "default_initial_equity")]
    pub initial_equity: Decimal,

    /// Explicit limits; replace the profile when present
    #[serde(default)]
    pub limits: Option<RiskLimits>,
}

fn default_initial_equity() -> Decimal {
    dec!(100000)
}

impl Default for RiskConfig {
    fn default() -> Self {
        Self {
            profile: RiskProfile::Default,
            initial_equity: default_initial_equity(),
            limits: None,
        }
    }
}

impl RiskConfig {
    /// Limits in force: the explicit table if given, otherwise the profile
    pub fn effective_limits(&self) -> RiskLimits {
        self.limits
            .clone()
            .unwrap_or_else(|| RiskLimits::for_profile(self.profile))
    }
}

/// Dynamic allocation configuration
#[derive(Debug, Clone, Deserialize)]
pub struct AllocationConfig {
    #[serde(default)]
    pub method: AllocationMethod,

    /// Window the performance statistics cover (days)
    #[serde(default = "default_lookback_days")]
    pub lookback_days: u32,

    /// Floor for funded strategies
    #[serde(default)]
    pub min_allocation: Option<Decimal>,

    /// Ceiling for every strategy
    #[serde(default)]
    pub max_allocation: Option<Decimal>,

    /// Minimum drift before rebalancing
    #[serde(default = "default_rebalance_threshold")]
    pub rebalance_threshold: Decimal,

    /// Share of the gap to the target closed per cycle
    #[serde(default = "default_adaptation_speed")]
    pub adaptation_speed: Decimal,

    /// Kelly multiplier for adaptive Kelly weighting
    #[serde(default = "default_kelly_fraction")]
    pub kelly_fraction: Decimal,

    /// Cap on each strategy's Kelly weight
    #[serde(default = "default_max_position_fraction")]
    pub max_position_fraction: Decimal,
}

fn default_lookback_days() -> u32 {
    30
}
fn default_rebalance_threshold() -> Decimal {
    dec!(0.02)
}
fn default_adaptation_speed() -> Decimal {
    dec!(0.3)
}
fn default_kelly_fraction() -> Decimal {
    dec!(0.25)
}
fn default_max_position_fraction() -> Decimal {
    dec!(1)
}

impl Default for AllocationConfig {
    fn default() -> Self {
        Self {
            method: AllocationMethod::EqualWeight,
            lookback_days: default_lookback_days(),
            min_allocation: None,
            max_allocation: None,
            rebalance_threshold: default_rebalance_threshold(),
            adaptation_speed: default_adaptation_speed(),
            kelly_fraction: default_kelly_fraction(),
            max_position_fraction: default_max_position_fraction(),
        }
    }
}

/// Telemetry configuration
#[derive(Debug, Clone, Deserialize)]
pub struct TelemetryConfig {
    #[serde(default = "default_log_level")]
    pub log_level: String,
    #[serde(default)]
    pub log_format: LogFormat,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            log_format: LogFormat::Pretty,
        }
    }
}

impl Config {
    /// Load configuration from a TOML file
    pub fn load(path: impl AsRef<std::path::Path>) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::risk::{CorrelationPolicy, PositionCapScope};
    use std::io::Write;

    #[test]
    fn test_config_deserialize() {
        let toml = r#"
            [risk]
            profile = "aggressive"
            initial_equity = 250000

            [sizing]
            method = "kelly"
            win_rate = 0.55
            avg_win = 150
            avg_loss = 100
            kelly_fraction = 0.25
            max_position_fraction = 0.20

            [allocation]
            method = "sharpe_weighted"
            lookback_days = 60
            adaptation_speed = 0.5

            [telemetry]
            log_level = "debug"
            log_format = "json"
        "#;

        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.risk.profile, RiskProfile::Aggressive);
        assert_eq!(config.risk.initial_equity, dec!(250000));
        assert_eq!(config.risk.effective_limits(), RiskLimits::aggressive());
        assert_eq!(config.sizing.mode_name(), "kelly");
        assert_eq!(config.allocation.method, AllocationMethod::SharpeWeighted);
        assert_eq!(config.allocation.lookback_days, 60);
        assert_eq!(config.allocation.rebalance_threshold, dec!(0.02));
        assert_eq!(config.telemetry.log_format, LogFormat::Json);
    }

    #[test]
    fn test_empty_config_uses_defaults() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.risk.effective_limits(), RiskLimits::default());
        assert_eq!(config.sizing, SizingMethod::default());
        assert_eq!(config.allocation.method, AllocationMethod::EqualWeight);
        assert_eq!(config.allocation.adaptation_speed, dec!(0.3));
        assert_eq!(config.telemetry.log_level, "info");
    }

    #[test]
    fn test_explicit_limits_override_profile() {
        let toml = r#"
            [risk]
            profile = "conservative"

            [risk.limits]
            max_portfolio_drawdown_pct = 0.12
            max_daily_loss = 0
            max_concurrent_positions = 4
            max_correlation = 0.6
            min_cash_reserve = 15000
            max_leverage = 1.2
            position_cap_scope = "per_strategy"
            correlation_policy = "block"
        "#;

        let config: Config = toml::from_str(toml).unwrap();
        let limits = config.risk.effective_limits();
        assert_eq!(limits.max_portfolio_drawdown_pct, dec!(0.12));
        assert_eq!(limits.max_daily_loss, dec!(0));
        assert_eq!(limits.position_cap_scope, PositionCapScope::PerStrategy);
        assert_eq!(limits.correlation_policy, CorrelationPolicy::Block);
    }

    #[test]
    fn test_unknown_sizing_method_rejected() {
        let toml = r#"
            [sizing]
            method = "martingale"
        "#;
        assert!(toml::from_str::<Config>(toml).is_err());
    }

    #[test]
    fn test_config_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
            [allocation]
            method = "risk_parity"
            min_allocation = 0.05
            max_allocation = 0.5
            "#
        )
        .unwrap();

        let config = Config::load(file.path()).unwrap();
        assert_eq!(config.allocation.method, AllocationMethod::RiskParity);
        assert_eq!(config.allocation.min_allocation, Some(dec!(0.05)));
        assert_eq!(config.allocation.max_allocation, Some(dec!(0.5)));
    }

    #[test]
    fn test_config_example_parses() {
        let config: Config = toml::from_str(include_str!("../config.toml.example")).unwrap();
        assert_eq!(config.risk.effective_limits(), RiskLimits::default());
        assert_eq!(config.sizing, SizingMethod::default());
    }

    #[test]
    fn test_config_load_nonexistent() {
        let result = Config::load("/nonexistent/path/config.toml");
        assert!(result.is_err());
    }
}
