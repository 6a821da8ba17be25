//! Portfolio state and limit evaluation
//!
//! Everything here is plain data plus pure evaluation. Synchronization lives
//! in [`PortfolioRiskManager`](super::PortfolioRiskManager).

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::limits::{CorrelationPolicy, PositionCapScope, RiskLimits};
use super::types::{BlockReason, RiskLevel, RiskStatus, RiskWarning};

/// Fraction of a limit at which a warning is raised
const WARNING_THRESHOLD: Decimal = dec!(0.8);

/// Capital share assigned to one strategy
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StrategyAllocation {
    pub strategy_id: String,
    /// Fraction of total capital in [0, 1]
    pub fraction: Decimal,
    pub active: bool,
}

/// Mutable portfolio risk state
#[derive(Debug, Clone)]
pub struct PortfolioState {
    pub current_equity: Decimal,
    pub peak_equity: Decimal,
    pub daily_start_equity: Decimal,
    /// Aggregate mark-to-market of open positions
    pub positions_value: Decimal,
    pub position_counts: BTreeMap<String, u32>,
    pub allocations: BTreeMap<String, StrategyAllocation>,
    /// Latest maximum pairwise correlation between strategies
    pub correlation: Option<Decimal>,
    pub last_update: DateTime<Utc>,
    /// Level observed on the previous evaluation, used to log transitions
    pub(crate) last_level: RiskLevel,
}

impl PortfolioState {
    pub fn new(initial_equity: Decimal) -> Self {
        Self {
            current_equity: initial_equity,
            peak_equity: initial_equity,
            daily_start_equity: initial_equity,
            positions_value: Decimal::ZERO,
            position_counts: BTreeMap::new(),
            allocations: BTreeMap::new(),
            correlation: None,
            last_update: Utc::now(),
            last_level: RiskLevel::Ok,
        }
    }

    /// Record new equity, raising the peak if exceeded
    pub fn update_equity(&mut self, new_equity: Decimal) {
        self.current_equity = new_equity;
        if new_equity > self.peak_equity {
            self.peak_equity = new_equity;
        }
        self.last_update = Utc::now();
    }

    /// Drawdown from peak as a fraction
    pub fn drawdown_pct(&self) -> Decimal {
        if self.peak_equity <= Decimal::ZERO {
            return Decimal::ZERO;
        }
        (self.peak_equity - self.current_equity) / self.peak_equity
    }

    /// Equity change since the session start
    pub fn daily_pnl(&self) -> Decimal {
        self.current_equity - self.daily_start_equity
    }

    /// Loss since the session start (negative when up on the day)
    pub fn daily_loss(&self) -> Decimal {
        self.daily_start_equity - self.current_equity
    }

    pub fn implied_cash(&self) -> Decimal {
        self.current_equity - self.positions_value
    }

    pub fn leverage(&self) -> Decimal {
        if self.current_equity <= Decimal::ZERO {
            return Decimal::ZERO;
        }
        self.positions_value / self.current_equity
    }

    /// Open positions across strategies, saturating at `u32::MAX`
    pub fn total_positions(&self) -> u32 {
        self.position_counts
            .values()
            .fold(0u32, |total, count| total.saturating_add(*count))
    }

    pub fn positions_for(&self, strategy_id: &str) -> u32 {
        self.position_counts.get(strategy_id).copied().unwrap_or(0)
    }

    /// Sum of active allocation fractions
    pub fn active_allocation_total(&self) -> Decimal {
        self.allocations
            .values()
            .filter(|a| a.active)
            .map(|a| a.fraction)
            .sum()
    }

    /// Rescale active fractions to sum to one; no-op when nothing is allocated
    pub(crate) fn normalize_active_allocations(&mut self) {
        let total = self.active_allocation_total();
        if total <= Decimal::ZERO {
            return;
        }
        for allocation in self.allocations.values_mut().filter(|a| a.active) {
            allocation.fraction /= total;
        }
    }

    /// First failing hard check, in priority order
    ///
    /// With no strategy the position cap is evaluated as if for a strategy
    /// holding no positions.
    pub fn hard_violation(&self, limits: &RiskLimits, strategy_id: Option<&str>) -> Option<BlockReason> {
        let drawdown_pct = self.drawdown_pct();
        if drawdown_pct > limits.max_portfolio_drawdown_pct {
            return Some(BlockReason::Drawdown {
                drawdown_pct,
                limit: limits.max_portfolio_drawdown_pct,
            });
        }

        let loss = self.daily_loss();
        if limits.max_daily_loss > Decimal::ZERO && loss >= limits.max_daily_loss {
            return Some(BlockReason::DailyLoss {
                loss,
                limit: limits.max_daily_loss,
            });
        }

        if let Some(reason) = self.position_cap_violation(limits, strategy_id) {
            return Some(reason);
        }

        if limits.correlation_policy == CorrelationPolicy::Block {
            if let Some(correlation) = self.correlation {
                if correlation > limits.max_correlation {
                    return Some(BlockReason::Correlation {
                        correlation,
                        limit: limits.max_correlation,
                    });
                }
            }
        }

        None
    }

    fn position_cap_violation(
        &self,
        limits: &RiskLimits,
        strategy_id: Option<&str>,
    ) -> Option<BlockReason> {
        let limit = limits.max_concurrent_positions;
        match limits.position_cap_scope {
            PositionCapScope::Portfolio => {
                let held = strategy_id.map(|id| self.positions_for(id)).unwrap_or(0);
                let open_positions = self.total_positions();
                (open_positions >= limit && held == 0).then_some(BlockReason::ConcurrentPositions {
                    open_positions,
                    limit,
                })
            }
            PositionCapScope::PerStrategy => {
                let open_positions = self.positions_for(strategy_id?);
                (open_positions >= limit).then_some(BlockReason::ConcurrentPositions {
                    open_positions,
                    limit,
                })
            }
        }
    }

    /// Advisory conditions
    pub fn warnings(&self, limits: &RiskLimits) -> Vec<RiskWarning> {
        let mut warnings = Vec::new();

        let drawdown_pct = self.drawdown_pct();
        if drawdown_pct > limits.max_portfolio_drawdown_pct * WARNING_THRESHOLD {
            warnings.push(RiskWarning::DrawdownNearLimit {
                drawdown_pct,
                limit: limits.max_portfolio_drawdown_pct,
            });
        }

        let loss = self.daily_loss();
        if limits.max_daily_loss > Decimal::ZERO && loss > limits.max_daily_loss * WARNING_THRESHOLD {
            warnings.push(RiskWarning::DailyLossNearLimit {
                loss,
                limit: limits.max_daily_loss,
            });
        }

        let open_positions = match limits.position_cap_scope {
            PositionCapScope::Portfolio => self.total_positions(),
            PositionCapScope::PerStrategy => {
                self.position_counts.values().copied().max().unwrap_or(0)
            }
        };
        if Decimal::from(open_positions)
            > Decimal::from(limits.max_concurrent_positions) * WARNING_THRESHOLD
        {
            warnings.push(RiskWarning::PositionsNearLimit {
                open_positions,
                limit: limits.max_concurrent_positions,
            });
        }

        let leverage = self.leverage();
        if leverage > limits.max_leverage {
            warnings.push(RiskWarning::LeverageAboveLimit {
                leverage,
                limit: limits.max_leverage,
            });
        }

        let cash = self.implied_cash();
        if cash < limits.min_cash_reserve {
            warnings.push(RiskWarning::CashBelowReserve {
                cash,
                reserve: limits.min_cash_reserve,
            });
        }

        if let Some(correlation) = self.correlation {
            if correlation > limits.max_correlation {
                warnings.push(RiskWarning::CorrelationAboveLimit {
                    correlation,
                    limit: limits.max_correlation,
                });
            }
        }

        warnings
    }

    /// Portfolio-wide status
    pub fn status(&self, limits: &RiskLimits) -> RiskStatus {
        RiskStatus::evaluate(self.hard_violation(limits, None), self.warnings(limits))
    }

    pub fn snapshot(&self) -> PortfolioSnapshot {
        PortfolioSnapshot {
            current_equity: self.current_equity,
            peak_equity: self.peak_equity,
            daily_start_equity: self.daily_start_equity,
            positions_value: self.positions_value,
            implied_cash: self.implied_cash(),
            drawdown_pct: self.drawdown_pct(),
            daily_pnl: self.daily_pnl(),
            leverage: self.leverage(),
            open_positions: self.total_positions(),
            position_counts: self.position_counts.clone(),
            allocations: self.allocations.values().cloned().collect(),
            correlation: self.correlation,
            last_update: self.last_update,
        }
    }
}

/// Point-in-time copy of the portfolio state for reporting
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PortfolioSnapshot {
    pub current_equity: Decimal,
    pub peak_equity: Decimal,
    pub daily_start_equity: Decimal,
    pub positions_value: Decimal,
    pub implied_cash: Decimal,
    pub drawdown_pct: Decimal,
    pub daily_pnl: Decimal,
    pub leverage: Decimal,
    pub open_positions: u32,
    pub position_counts: BTreeMap<String, u32>,
    pub allocations: Vec<StrategyAllocation>,
    pub correlation: Option<Decimal>,
    pub last_update: DateTime<Utc>,
}

impl PortfolioSnapshot {
    /// Format as table for CLI output
    pub fn format_table(&self, limits: &RiskLimits) -> String {
        let mut table = format!(
            r#"
══════════════════════════════════════════════════════
               PORTFOLIO SUMMARY
══════════════════════════════════════════════════════
Total Equity:     {:.2}
Implied Cash:     {:.2}
Position Value:   {:.2}
Peak Equity:      {:.2}
Drawdown:         {:.2}%
Daily P&L:        {:+.2}
Open Positions:   {}
Leverage:         {:.2}x
Last Update:      {}
───────────────────────────────────────────────────────
RISK LIMITS
Max Drawdown:     {:.1}%
Max Daily Loss:   {:.2}
Max Positions:    {}
Max Leverage:     {:.2}x
Min Cash:         {:.2}
───────────────────────────────────────────────────────
ALLOCATIONS
"#,
            self.current_equity,
            self.implied_cash,
            self.positions_value,
            self.peak_equity,
            self.drawdown_pct * dec!(100),
            self.daily_pnl,
            self.open_positions,
            self.leverage,
            self.last_update.format("%Y-%m-%d %H:%M:%S"),
            limits.max_portfolio_drawdown_pct * dec!(100),
            limits.max_daily_loss,
            limits.max_concurrent_positions,
            limits.max_leverage,
            limits.min_cash_reserve,
        );

        for allocation in &self.allocations {
            let status = if allocation.active { "ACTIVE" } else { "INACTIVE" };
            let positions = self
                .position_counts
                .get(&allocation.strategy_id)
                .copied()
                .unwrap_or(0);
            table.push_str(&format!(
                "{:<20} {:>6.1}% {:>12.2}  Pos: {:>2}  [{}]\n",
                allocation.strategy_id,
                allocation.fraction * dec!(100),
                self.current_equity * allocation.fraction,
                positions,
                status,
            ));
        }
        table.push_str("══════════════════════════════════════════════════════\n");
        table
    }
}

/// Aggregate utilization figures
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PortfolioMetrics {
    pub drawdown_pct: Decimal,
    pub daily_return_pct: Decimal,
    pub position_utilization_pct: Decimal,
    pub cash_utilization_pct: Decimal,
    pub leverage: Decimal,
    pub active_strategies: usize,
}

impl PortfolioMetrics {
    pub(crate) fn from_state(state: &PortfolioState, limits: &RiskLimits) -> Self {
        let daily_return_pct = if state.daily_start_equity > Decimal::ZERO {
            state.daily_pnl() / state.daily_start_equity
        } else {
            Decimal::ZERO
        };
        let position_utilization_pct = if limits.max_concurrent_positions > 0 {
            Decimal::from(state.total_positions()) / Decimal::from(limits.max_concurrent_positions)
        } else {
            Decimal::ZERO
        };
        let cash_utilization_pct = if state.current_equity > Decimal::ZERO {
            state.positions_value / state.current_equity
        } else {
            Decimal::ZERO
        };

        Self {
            drawdown_pct: state.drawdown_pct(),
            daily_return_pct,
            position_utilization_pct,
            cash_utilization_pct,
            leverage: state.leverage(),
            active_strategies: state.allocations.values().filter(|a| a.active).count(),
        }
    }
}
