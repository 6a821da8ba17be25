//! Status command implementation

use clap::Args;
use rust_decimal::Decimal;
use serde::Deserialize;
use std::collections::{BTreeMap, BTreeSet};
use std::path::PathBuf;

use super::allocate::read_json;
use super::OutputFormat;
use crate::config::Config;
use crate::risk::{PortfolioRiskManager, RiskLimits};

#[derive(Args, Debug)]
pub struct StatusArgs {
    /// JSON portfolio snapshot to evaluate; a fresh portfolio when omitted
    #[arg(long)]
    pub snapshot: Option<PathBuf>,

    /// Only show the admission decision for this strategy
    #[arg(long)]
    pub strategy: Option<String>,

    /// Output format
    #[arg(long, value_enum, default_value_t = OutputFormat::Table)]
    pub format: OutputFormat,
}

/// Portfolio observations replayed into a manager
#[derive(Debug, Clone, Deserialize)]
pub struct PortfolioInput {
    pub equity: Decimal,
    #[serde(default)]
    pub peak_equity: Option<Decimal>,
    #[serde(default)]
    pub daily_start_equity: Option<Decimal>,
    #[serde(default)]
    pub positions_value: Decimal,
    #[serde(default)]
    pub positions: BTreeMap<String, u32>,
    #[serde(default)]
    pub allocations: BTreeMap<String, Decimal>,
    #[serde(default)]
    pub correlation: Option<Decimal>,
}

impl PortfolioInput {
    /// Build a manager whose state matches these observations
    pub fn replay(&self, limits: RiskLimits) -> anyhow::Result<PortfolioRiskManager> {
        let start = self.daily_start_equity.unwrap_or(self.equity);
        let manager = PortfolioRiskManager::new(limits, start);
        if let Some(peak) = self.peak_equity {
            manager.update_equity(peak);
        }
        manager.update_equity(self.equity);
        manager.update_positions_value(self.positions_value);

        if !self.allocations.is_empty() {
            manager.apply_allocations(&self.allocations)?;
        }
        for (strategy_id, count) in &self.positions {
            manager.update_positions(strategy_id, *count);
        }
        if let Some(correlation) = self.correlation {
            manager.update_correlation(correlation);
        }
        Ok(manager)
    }
}

impl StatusArgs {
    pub async fn execute(&self, config: &Config) -> anyhow::Result<()> {
        let limits = config.risk.effective_limits();
        let manager = match &self.snapshot {
            Some(path) => read_json::<PortfolioInput>(path).await?.replay(limits)?,
            None => PortfolioRiskManager::new(limits, config.risk.initial_equity),
        };

        let status = manager.risk_status();
        let strategies: BTreeSet<String> = match &self.strategy {
            Some(strategy_id) => [strategy_id.clone()].into(),
            None => {
                let summary = manager.portfolio_summary();
                summary
                    .position_counts
                    .into_keys()
                    .chain(summary.allocations.into_iter().map(|a| a.strategy_id))
                    .collect()
            }
        };
        let decisions: BTreeMap<String, _> = strategies
            .iter()
            .map(|id| (id.clone(), manager.can_trade(id)))
            .collect();

        match self.format {
            OutputFormat::Json => {
                let output = serde_json::json!({
                    "status": status,
                    "decisions": decisions,
                    "summary": manager.portfolio_summary(),
                    "metrics": manager.portfolio_metrics(),
                });
                println!("{}", serde_json::to_string_pretty(&output)?);
            }
            OutputFormat::Table => {
                println!("Risk Status:     {}", status.level);
                println!("  {}", status.message);
                for warning in &status.warnings {
                    println!("  - {}", warning);
                }
                for (strategy_id, decision) in &decisions {
                    match &decision.reason {
                        None => println!("  {:<20} ALLOWED", strategy_id),
                        Some(reason) => println!("  {:<20} BLOCKED ({})", strategy_id, reason),
                    }
                }
                println!(
                    "{}",
                    manager.portfolio_summary().format_table(manager.limits())
                );
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::risk::RiskLevel;
    use rust_decimal_macros::dec;

    #[test]
    fn test_replay_snapshot() {
        let input: PortfolioInput = serde_json::from_str(
            r#"{
                "equity": 84000,
                "peak_equity": 100000,
                "positions_value": 20000,
                "positions": {"trend": 2, "mean_rev": 1},
                "allocations": {"trend": 0.6, "mean_rev": 0.4}
            }"#,
        )
        .unwrap();

        let manager = input.replay(RiskLimits::default()).unwrap();
        let summary = manager.portfolio_summary();
        assert_eq!(summary.peak_equity, dec!(100000));
        assert_eq!(summary.drawdown_pct, dec!(0.16));
        assert_eq!(summary.open_positions, 3);
        assert_eq!(manager.risk_status().level, RiskLevel::Violated);
        assert!(!manager.can_trade("trend").allowed);
    }

    #[test]
    fn test_replay_rejects_overallocation() {
        let input: PortfolioInput = serde_json::from_str(
            r#"{"equity": 100000, "allocations": {"a": 0.7, "b": 0.5}}"#,
        )
        .unwrap();
        assert!(input.replay(RiskLimits::default()).is_err());
    }
}
