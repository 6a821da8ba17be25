//! Portfolio risk manager
//!
//! Owns the single [`PortfolioState`] behind one mutex. Every read and write
//! takes the lock for the whole operation, and every critical section is
//! bounded by the number of strategies. Readers get copies, never references
//! into the internal maps.

use parking_lot::Mutex;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::collections::BTreeMap;

use super::limits::RiskLimits;
use super::state::{PortfolioMetrics, PortfolioSnapshot, PortfolioState, StrategyAllocation};
use super::types::{RiskError, RiskLevel, RiskStatus, TradeDecision};
use crate::telemetry::{self, GaugeMetric};

/// Tolerance on the allocation total
const ALLOCATION_EPSILON: Decimal = dec!(0.000001);

/// Shared portfolio risk state and limit checks
pub struct PortfolioRiskManager {
    limits: RiskLimits,
    state: Mutex<PortfolioState>,
}

impl PortfolioRiskManager {
    /// Create a manager starting at `initial_equity`
    pub fn new(limits: RiskLimits, initial_equity: Decimal) -> Self {
        tracing::info!(
            initial_equity = %initial_equity,
            max_drawdown_pct = %limits.max_portfolio_drawdown_pct,
            max_daily_loss = %limits.max_daily_loss,
            max_positions = limits.max_concurrent_positions,
            "Portfolio risk manager created"
        );
        Self {
            limits,
            state: Mutex::new(PortfolioState::new(initial_equity)),
        }
    }

    pub fn limits(&self) -> &RiskLimits {
        &self.limits
    }

    /// Record post-settlement account equity
    pub fn update_equity(&self, new_equity: Decimal) {
        let mut state = self.state.lock();
        state.update_equity(new_equity);

        telemetry::set_gauge(GaugeMetric::Equity, to_f64(state.current_equity));
        telemetry::set_gauge(GaugeMetric::DrawdownPct, to_f64(state.drawdown_pct()));
        telemetry::set_gauge(GaugeMetric::DailyPnl, to_f64(state.daily_pnl()));
        self.observe(&mut state);
    }

    /// Record the open position count for a strategy
    pub fn update_positions(&self, strategy_id: &str, count: u32) {
        let mut state = self.state.lock();
        let previous = state.position_counts.insert(strategy_id.to_string(), count);
        let total = state.total_positions();

        if previous != Some(count) {
            tracing::debug!(
                strategy_id,
                previous = previous.unwrap_or(0),
                count,
                total,
                "Strategy positions updated"
            );
        }
        telemetry::set_gauge(GaugeMetric::OpenPositions, f64::from(total));
        self.observe(&mut state);
    }

    /// Record the aggregate mark-to-market of open positions
    pub fn update_positions_value(&self, positions_value: Decimal) {
        let mut state = self.state.lock();
        state.positions_value = positions_value;
        telemetry::set_gauge(GaugeMetric::Leverage, to_f64(state.leverage()));
        self.observe(&mut state);
    }

    /// Record the latest maximum pairwise strategy correlation
    pub fn update_correlation(&self, correlation: Decimal) {
        let mut state = self.state.lock();
        state.correlation = Some(correlation);
        self.observe(&mut state);
    }

    /// Start a new trading session from the current equity
    pub fn reset_daily_tracking(&self) {
        let mut state = self.state.lock();
        state.daily_start_equity = state.current_equity;
        tracing::info!(
            daily_start_equity = %state.daily_start_equity,
            "Daily tracking reset"
        );
        telemetry::set_gauge(GaugeMetric::DailyPnl, 0.0);
        self.observe(&mut state);
    }

    /// Decide whether `strategy_id` may open a new trade
    pub fn can_trade(&self, strategy_id: &str) -> TradeDecision {
        let mut state = self.state.lock();
        self.observe(&mut state);

        match state.hard_violation(&self.limits, Some(strategy_id)) {
            Some(reason) => {
                tracing::warn!(
                    strategy_id,
                    limit = reason.limit_name(),
                    margin = %reason.margin(),
                    "Trade blocked: {}",
                    reason
                );
                telemetry::record_blocked_trade(reason.limit_name());
                TradeDecision::block(reason)
            }
            None => TradeDecision::allow(),
        }
    }

    /// Current portfolio-wide risk status
    pub fn risk_status(&self) -> RiskStatus {
        let mut state = self.state.lock();
        self.observe(&mut state)
    }

    /// Copy of the current portfolio state
    pub fn portfolio_summary(&self) -> PortfolioSnapshot {
        self.state.lock().snapshot()
    }

    /// Utilization figures for dashboards
    pub fn portfolio_metrics(&self) -> PortfolioMetrics {
        PortfolioMetrics::from_state(&self.state.lock(), &self.limits)
    }

    /// Add a strategy to the allocation table with no capital yet
    pub fn register_strategy(&self, strategy_id: &str) {
        let mut state = self.state.lock();
        let entry = state
            .allocations
            .entry(strategy_id.to_string())
            .or_insert_with(|| StrategyAllocation {
                strategy_id: strategy_id.to_string(),
                fraction: Decimal::ZERO,
                active: true,
            });
        entry.active = true;
        tracing::info!(strategy_id, "Strategy registered");
    }

    /// Zero and deactivate a strategy, spreading its share over the rest
    pub fn deactivate_strategy(&self, strategy_id: &str) {
        let mut state = self.state.lock();
        let Some(allocation) = state.allocations.get_mut(strategy_id) else {
            return;
        };
        let released = allocation.fraction;
        allocation.fraction = Decimal::ZERO;
        allocation.active = false;
        state.normalize_active_allocations();

        telemetry::set_allocation_gauge(strategy_id, 0.0);
        tracing::info!(strategy_id, released = %released, "Strategy deactivated");
    }

    /// Active allocation fractions by strategy
    pub fn allocations(&self) -> BTreeMap<String, Decimal> {
        self.state
            .lock()
            .allocations
            .values()
            .filter(|a| a.active)
            .map(|a| (a.strategy_id.clone(), a.fraction))
            .collect()
    }

    /// Full allocation table including inactive strategies
    pub fn allocation_table(&self) -> Vec<StrategyAllocation> {
        self.state.lock().allocations.values().cloned().collect()
    }

    /// Capital currently assigned to a strategy
    pub fn strategy_capital(&self, strategy_id: &str) -> Decimal {
        let state = self.state.lock();
        state
            .allocations
            .get(strategy_id)
            .filter(|a| a.active)
            .map(|a| state.current_equity * a.fraction)
            .unwrap_or(Decimal::ZERO)
    }

    /// Replace the allocation table
    ///
    /// Strategies in `allocations` become active with the given fraction;
    /// every other known strategy is zeroed and deactivated.
    pub fn apply_allocations(&self, allocations: &BTreeMap<String, Decimal>) -> Result<(), RiskError> {
        if let Some((strategy_id, fraction)) = allocations
            .iter()
            .find(|(_, f)| **f < Decimal::ZERO || **f > Decimal::ONE)
        {
            return Err(RiskError::InvalidAllocation {
                strategy_id: strategy_id.clone(),
                fraction: *fraction,
            });
        }
        let total: Decimal = allocations.values().copied().sum();
        if total > Decimal::ONE + ALLOCATION_EPSILON {
            return Err(RiskError::AllocationExceedsCapital(total));
        }

        let mut state = self.state.lock();
        for allocation in state.allocations.values_mut() {
            if !allocations.contains_key(&allocation.strategy_id) {
                allocation.fraction = Decimal::ZERO;
                allocation.active = false;
            }
        }
        for (strategy_id, fraction) in allocations {
            state.allocations.insert(
                strategy_id.clone(),
                StrategyAllocation {
                    strategy_id: strategy_id.clone(),
                    fraction: *fraction,
                    active: true,
                },
            );
            telemetry::set_allocation_gauge(strategy_id, to_f64(*fraction));
        }

        tracing::info!(strategies = allocations.len(), total = %total, "Allocations applied");
        Ok(())
    }

    /// Evaluate portfolio status and log transitions into and out of VIOLATED
    fn observe(&self, state: &mut PortfolioState) -> RiskStatus {
        let status = state.status(&self.limits);
        if status.level != state.last_level {
            match status.level {
                RiskLevel::Violated => tracing::warn!(
                    previous = %state.last_level,
                    current_equity = %state.current_equity,
                    peak_equity = %state.peak_equity,
                    daily_start_equity = %state.daily_start_equity,
                    drawdown_pct = %state.drawdown_pct(),
                    open_positions = state.total_positions(),
                    "Risk limit violated: {}",
                    status.message
                ),
                level => tracing::info!(
                    previous = %state.last_level,
                    current = %level,
                    "Risk status changed: {}",
                    status.message
                ),
            }
            state.last_level = status.level;
        }
        status
    }
}

fn to_f64(value: Decimal) -> f64 {
    value.to_f64().unwrap_or_default()
}
