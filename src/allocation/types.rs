//! Allocation types

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use crate::risk::{RiskError, SizingError};

/// Allocation errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AllocationError {
    /// Nothing to allocate to
    #[error("No active strategies")]
    NoStrategies,
    /// Adaptation speed outside (0, 1]
    #[error("Adaptation speed must be within (0, 1], got {0}")]
    InvalidAdaptationSpeed(Decimal),
    /// Kelly weighting failed on a strategy's statistics
    #[error("Strategy {strategy_id}: {source}")]
    Sizing {
        strategy_id: String,
        #[source]
        source: SizingError,
    },
    /// Allocation write rejected by the risk manager
    #[error(transparent)]
    Risk(#[from] RiskError),
}

/// Weighting method for distributing capital across strategies
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AllocationMethod {
    /// Same share for every strategy
    #[default]
    EqualWeight,
    /// Proportional to positive total return
    PerformanceWeighted,
    /// Proportional to positive Sharpe ratio
    SharpeWeighted,
    /// Proportional to inverse volatility
    RiskParity,
    /// Proportional to clamped fractional Kelly
    AdaptiveKelly,
}

impl AllocationMethod {
    pub const ALL: [AllocationMethod; 5] = [
        AllocationMethod::EqualWeight,
        AllocationMethod::PerformanceWeighted,
        AllocationMethod::SharpeWeighted,
        AllocationMethod::RiskParity,
        AllocationMethod::AdaptiveKelly,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            AllocationMethod::EqualWeight => "equal_weight",
            AllocationMethod::PerformanceWeighted => "performance_weighted",
            AllocationMethod::SharpeWeighted => "sharpe_weighted",
            AllocationMethod::RiskParity => "risk_parity",
            AllocationMethod::AdaptiveKelly => "adaptive_kelly",
        }
    }
}

impl fmt::Display for AllocationMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AllocationMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|method| method.as_str() == s)
            .ok_or_else(|| format!("unknown allocation method: {s}"))
    }
}

/// Per-strategy statistics over the lookback window
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PerformanceStats {
    pub win_rate: Decimal,
    /// Average winning trade, positive
    pub avg_win: Decimal,
    /// Average losing trade as a positive magnitude
    pub avg_loss: Decimal,
    pub sharpe_ratio: Decimal,
    pub volatility: Decimal,
    /// May be negative
    pub total_return: Decimal,
}

/// Source of per-strategy performance statistics
pub trait PerformanceProvider {
    /// Statistics for a strategy, or `None` when unavailable
    fn stats(&self, strategy_id: &str) -> Option<PerformanceStats>;
}

impl PerformanceProvider for HashMap<String, PerformanceStats> {
    fn stats(&self, strategy_id: &str) -> Option<PerformanceStats> {
        self.get(strategy_id).copied()
    }
}

impl PerformanceProvider for BTreeMap<String, PerformanceStats> {
    fn stats(&self, strategy_id: &str) -> Option<PerformanceStats> {
        self.get(strategy_id).copied()
    }
}

/// Metric used to rank strategies
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RankMetric {
    #[default]
    Sharpe,
    Return,
    WinRate,
}

impl RankMetric {
    pub(crate) fn score(&self, stats: &PerformanceStats) -> Decimal {
        match self {
            RankMetric::Sharpe => stats.sharpe_ratio,
            RankMetric::Return => stats.total_return,
            RankMetric::WinRate => stats.win_rate,
        }
    }
}
