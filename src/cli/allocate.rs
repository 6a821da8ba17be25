//! Allocate command implementation

use anyhow::Context;
use clap::Args;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use super::OutputFormat;
use crate::allocation::{AllocationMethod, Allocations, DynamicAllocator, PerformanceStats};
use crate::config::Config;
use crate::risk::PortfolioRiskManager;

#[derive(Args, Debug)]
pub struct AllocateArgs {
    /// JSON file mapping strategy id to performance statistics
    #[arg(long)]
    pub stats: PathBuf,

    /// JSON file mapping strategy id to its current capital fraction
    #[arg(long)]
    pub current: Option<PathBuf>,

    /// Override the configured allocation method
    #[arg(long)]
    pub method: Option<AllocationMethod>,

    /// Output format
    #[arg(long, value_enum, default_value_t = OutputFormat::Table)]
    pub format: OutputFormat,
}

impl AllocateArgs {
    pub async fn execute(&self, config: &Config) -> anyhow::Result<()> {
        let stats: BTreeMap<String, PerformanceStats> = read_json(&self.stats).await?;
        let strategy_ids: Vec<String> = stats.keys().cloned().collect();

        let manager =
            PortfolioRiskManager::new(config.risk.effective_limits(), config.risk.initial_equity);
        match &self.current {
            Some(path) => {
                let current: Allocations = read_json(path).await?;
                manager.apply_allocations(&current)?;
            }
            None => {
                for strategy_id in &strategy_ids {
                    manager.register_strategy(strategy_id);
                }
            }
        }

        let mut allocator = DynamicAllocator::from_config(&config.allocation);
        if let Some(method) = self.method {
            allocator.method = method;
        }

        tracing::info!(
            method = %allocator.method,
            strategies = strategy_ids.len(),
            "Running allocation cycle"
        );
        let report = allocator.rebalance(&manager, &stats, &strategy_ids)?;

        match self.format {
            OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&report)?),
            OutputFormat::Table => {
                println!("{}", report.format_table());
                println!("{:<20} {:>14}", "Strategy", "Capital");
                for strategy_id in manager.allocations().keys() {
                    println!(
                        "{:<20} {:>14.2}",
                        strategy_id,
                        manager.strategy_capital(strategy_id)
                    );
                }
            }
        }
        Ok(())
    }
}

pub(crate) async fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> anyhow::Result<T> {
    let content = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read {}", path.display()))?;
    serde_json::from_str(&content).with_context(|| format!("Invalid JSON in {}", path.display()))
}
