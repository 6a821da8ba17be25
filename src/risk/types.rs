//! Risk management types

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Position sizing errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SizingError {
    /// Non-positive account value or entry price, missing risk reference,
    /// or an unusable Kelly input
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    /// Risk per unit is zero or negative
    #[error("Zero risk distance: risk per unit is {0}")]
    ZeroRiskDistance(Decimal),
}

/// Portfolio risk manager errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RiskError {
    /// Allocation write would commit more than the whole portfolio
    #[error("Total allocation {0} exceeds 100% of capital")]
    AllocationExceedsCapital(Decimal),
    /// A single fraction outside [0, 1]
    #[error("Allocation {fraction} for strategy {strategy_id} is outside [0, 1]")]
    InvalidAllocation {
        strategy_id: String,
        fraction: Decimal,
    },
}

/// Observable risk level, recomputed on every query
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RiskLevel {
    Ok,
    Warning,
    Violated,
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RiskLevel::Ok => write!(f, "OK"),
            RiskLevel::Warning => write!(f, "WARNING"),
            RiskLevel::Violated => write!(f, "VIOLATED"),
        }
    }
}

/// Hard limit that blocked a trade, with the values that tripped it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "check", rename_all = "snake_case")]
pub enum BlockReason {
    /// Drawdown from peak above the portfolio limit (global halt)
    Drawdown { drawdown_pct: Decimal, limit: Decimal },
    /// Loss since the session start at or above the daily limit (global halt)
    DailyLoss { loss: Decimal, limit: Decimal },
    /// Concurrent position cap reached (new entries only)
    ConcurrentPositions { open_positions: u32, limit: u32 },
    /// Cross-strategy correlation above limit, only when escalation is enabled
    Correlation { correlation: Decimal, limit: Decimal },
}

impl BlockReason {
    /// Configuration key of the limit that was hit
    pub fn limit_name(&self) -> &'static str {
        match self {
            BlockReason::Drawdown { .. } => "max_portfolio_drawdown_pct",
            BlockReason::DailyLoss { .. } => "max_daily_loss",
            BlockReason::ConcurrentPositions { .. } => "max_concurrent_positions",
            BlockReason::Correlation { .. } => "max_correlation",
        }
    }

    /// Amount by which the observed value is past the limit
    pub fn margin(&self) -> Decimal {
        match self {
            BlockReason::Drawdown {
                drawdown_pct,
                limit,
            } => drawdown_pct - limit,
            BlockReason::DailyLoss { loss, limit } => loss - limit,
            BlockReason::ConcurrentPositions {
                open_positions,
                limit,
            } => Decimal::from(*open_positions) - Decimal::from(*limit),
            BlockReason::Correlation { correlation, limit } => correlation - limit,
        }
    }

    /// Whether the block applies to every strategy rather than only new entries
    pub fn is_global_halt(&self) -> bool {
        matches!(
            self,
            BlockReason::Drawdown { .. } | BlockReason::DailyLoss { .. }
        )
    }
}

impl fmt::Display for BlockReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BlockReason::Drawdown {
                drawdown_pct,
                limit,
            } => write!(
                f,
                "drawdown limit exceeded: drawdown {:.2}% vs limit {:.2}% (over by {:.2}%)",
                drawdown_pct * dec!(100),
                limit * dec!(100),
                self.margin() * dec!(100)
            ),
            BlockReason::DailyLoss { loss, limit } => write!(
                f,
                "daily loss limit exceeded: loss {:.2} vs limit {:.2} (over by {:.2})",
                loss,
                limit,
                self.margin()
            ),
            BlockReason::ConcurrentPositions {
                open_positions,
                limit,
            } => write!(
                f,
                "concurrent position limit reached: {} open vs limit {} (over by {})",
                open_positions,
                limit,
                self.margin()
            ),
            BlockReason::Correlation { correlation, limit } => write!(
                f,
                "correlation limit exceeded: correlation {:.4} vs limit {:.4} (over by {:.4})",
                correlation,
                limit,
                self.margin()
            ),
        }
    }
}

/// Advisory condition that raises the status to WARNING without halting
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "warning", rename_all = "snake_case")]
pub enum RiskWarning {
    DrawdownNearLimit { drawdown_pct: Decimal, limit: Decimal },
    DailyLossNearLimit { loss: Decimal, limit: Decimal },
    PositionsNearLimit { open_positions: u32, limit: u32 },
    LeverageAboveLimit { leverage: Decimal, limit: Decimal },
    CashBelowReserve { cash: Decimal, reserve: Decimal },
    CorrelationAboveLimit { correlation: Decimal, limit: Decimal },
}

impl fmt::Display for RiskWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RiskWarning::DrawdownNearLimit {
                drawdown_pct,
                limit,
            } => write!(
                f,
                "drawdown near limit ({:.2}% of {:.2}%)",
                drawdown_pct * dec!(100),
                limit * dec!(100)
            ),
            RiskWarning::DailyLossNearLimit { loss, limit } => {
                write!(f, "daily loss near limit ({:.2} of {:.2})", loss, limit)
            }
            RiskWarning::PositionsNearLimit {
                open_positions,
                limit,
            } => write!(f, "position count high ({} of {})", open_positions, limit),
            RiskWarning::LeverageAboveLimit { leverage, limit } => {
                write!(f, "leverage {:.2}x above {:.2}x", leverage, limit)
            }
            RiskWarning::CashBelowReserve { cash, reserve } => {
                write!(f, "cash {:.2} below reserve {:.2}", cash, reserve)
            }
            RiskWarning::CorrelationAboveLimit { correlation, limit } => write!(
                f,
                "strategy correlation {:.4} above {:.4}",
                correlation, limit
            ),
        }
    }
}

/// Result of a risk status query
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RiskStatus {
    pub level: RiskLevel,
    pub message: String,
    /// First failing hard check, if any
    pub violation: Option<BlockReason>,
    /// Advisory conditions currently active
    pub warnings: Vec<RiskWarning>,
}

impl RiskStatus {
    pub(crate) fn evaluate(violation: Option<BlockReason>, warnings: Vec<RiskWarning>) -> Self {
        let (level, message) = match (&violation, warnings.is_empty()) {
            (Some(reason), _) => (RiskLevel::Violated, reason.to_string()),
            (None, false) => (
                RiskLevel::Warning,
                warnings
                    .iter()
                    .map(ToString::to_string)
                    .collect::<Vec<_>>()
                    .join("; "),
            ),
            (None, true) => (
                RiskLevel::Ok,
                "all limits within normal range".to_string(),
            ),
        };
        Self {
            level,
            message,
            violation,
            warnings,
        }
    }
}

/// Admission decision for a proposed trade
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TradeDecision {
    pub allowed: bool,
    pub reason: Option<BlockReason>,
}

impl TradeDecision {
    pub fn allow() -> Self {
        Self {
            allowed: true,
            reason: None,
        }
    }

    pub fn block(reason: BlockReason) -> Self {
        Self {
            allowed: false,
            reason: Some(reason),
        }
    }
}
