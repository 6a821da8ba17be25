//! Dynamic capital allocation across strategies

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::collections::{BTreeMap, BTreeSet};

use super::report::{generate_allocation_report, AllocationReport};
use super::types::{AllocationError, AllocationMethod, PerformanceProvider, RankMetric};
use crate::config::AllocationConfig;
use crate::risk::{effective_fraction, kelly_fraction, PortfolioRiskManager};

/// Strategy id to capital fraction
pub type Allocations = BTreeMap<String, Decimal>;

/// Parameters for the adaptive Kelly method
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KellyWeighting {
    /// Fraction of full Kelly (0.25 = quarter Kelly)
    pub multiplier: Decimal,
    /// Upper clamp on each strategy's Kelly weight
    pub max_position_fraction: Decimal,
}

impl Default for KellyWeighting {
    fn default() -> Self {
        Self {
            multiplier: dec!(0.25),
            max_position_fraction: dec!(1),
        }
    }
}

/// Compute normalized target fractions for `strategy_ids`
///
/// Strategies without statistics weigh zero for every method except equal
/// weight. When no strategy has a positive weight the result falls back to
/// equal weight.
pub fn calculate_allocations<P: PerformanceProvider + ?Sized>(
    provider: &P,
    strategy_ids: &[String],
    method: AllocationMethod,
    kelly: &KellyWeighting,
) -> Result<Allocations, AllocationError> {
    let strategies = unique_ids(strategy_ids);
    if strategies.is_empty() {
        return Err(AllocationError::NoStrategies);
    }

    let mut weights = BTreeMap::new();
    for strategy_id in &strategies {
        let weight = match (method, provider.stats(strategy_id)) {
            (AllocationMethod::EqualWeight, _) => Decimal::ONE,
            (_, None) => Decimal::ZERO,
            (AllocationMethod::PerformanceWeighted, Some(stats)) => stats.total_return,
            (AllocationMethod::SharpeWeighted, Some(stats)) => stats.sharpe_ratio,
            (AllocationMethod::RiskParity, Some(stats)) if stats.volatility > Decimal::ZERO => {
                Decimal::ONE.checked_div(stats.volatility).unwrap_or(Decimal::MAX)
            }
            (AllocationMethod::RiskParity, Some(_)) => Decimal::ZERO,
            (AllocationMethod::AdaptiveKelly, Some(stats)) => {
                let raw = kelly_fraction(stats.win_rate, stats.avg_win, stats.avg_loss).map_err(
                    |source| AllocationError::Sizing {
                        strategy_id: strategy_id.to_string(),
                        source,
                    },
                )?;
                effective_fraction(raw, kelly.multiplier, kelly.max_position_fraction)
            }
        };
        weights.insert(strategy_id.to_string(), weight.max(Decimal::ZERO));
    }

    let (weights, total) = match checked_total(&weights) {
        Some(total) => (weights, total),
        None => {
            let rescaled = rescale_to_max(weights);
            let total = checked_total(&rescaled).unwrap_or(Decimal::ZERO);
            (rescaled, total)
        }
    };
    if total <= Decimal::ZERO {
        tracing::debug!(%method, "No positive weights, falling back to equal weight");
        return Ok(equal_weight(&strategies));
    }

    Ok(weights
        .into_iter()
        .map(|(strategy_id, weight)| (strategy_id, weight / total))
        .collect())
}

/// True when any strategy's fraction moves by at least `threshold`
pub fn should_rebalance(old: &Allocations, new: &Allocations, threshold: Decimal) -> bool {
    max_drift(old, new) >= threshold
}

/// Move `old` toward `new` by `adaptation_speed`, renormalized to one
///
/// Only strategies in `new` are carried forward; anything else is dropped.
pub fn blend_allocations(
    old: &Allocations,
    new: &Allocations,
    adaptation_speed: Decimal,
) -> Result<Allocations, AllocationError> {
    if adaptation_speed <= Decimal::ZERO || adaptation_speed > Decimal::ONE {
        return Err(AllocationError::InvalidAdaptationSpeed(adaptation_speed));
    }

    let blended = new
        .iter()
        .map(|(strategy_id, &to)| {
            let from = fraction_of(old, strategy_id);
            (strategy_id.clone(), from + adaptation_speed * (to - from))
        })
        .collect();
    Ok(normalize(blended))
}

/// Order strategies by a performance metric, best first
///
/// Strategies without statistics are left out.
pub fn rank_strategies<P: PerformanceProvider + ?Sized>(
    provider: &P,
    strategy_ids: &[String],
    metric: RankMetric,
) -> Vec<String> {
    let mut scored: Vec<(String, Decimal)> = strategy_ids
        .iter()
        .filter_map(|id| provider.stats(id).map(|stats| (id.clone(), metric.score(&stats))))
        .collect();
    scored.sort_by(|a, b| b.1.cmp(&a.1));
    scored.into_iter().map(|(id, _)| id).collect()
}

/// Largest absolute fraction change between two allocation maps
pub(crate) fn max_drift(old: &Allocations, new: &Allocations) -> Decimal {
    union_keys(old, new)
        .into_iter()
        .map(|id| (fraction_of(new, id) - fraction_of(old, id)).abs())
        .max()
        .unwrap_or(Decimal::ZERO)
}

pub(crate) fn union_keys<'a>(old: &'a Allocations, new: &'a Allocations) -> BTreeSet<&'a str> {
    old.keys().chain(new.keys()).map(String::as_str).collect()
}

pub(crate) fn fraction_of(allocations: &Allocations, strategy_id: &str) -> Decimal {
    allocations.get(strategy_id).copied().unwrap_or(Decimal::ZERO)
}

/// Sum of weights, `None` on overflow
fn checked_total(weights: &Allocations) -> Option<Decimal> {
    weights
        .values()
        .try_fold(Decimal::ZERO, |total, weight| total.checked_add(*weight))
}

/// Divide every weight by the largest so the sum is bounded by the count
fn rescale_to_max(weights: Allocations) -> Allocations {
    let max = weights.values().copied().max().unwrap_or(Decimal::ZERO);
    if max <= Decimal::ZERO {
        return weights;
    }
    weights
        .into_iter()
        .map(|(strategy_id, weight)| (strategy_id, weight / max))
        .collect()
}

fn normalize(allocations: Allocations) -> Allocations {
    let total: Decimal = allocations.values().copied().sum();
    if total <= Decimal::ZERO {
        return allocations;
    }
    allocations
        .into_iter()
        .map(|(strategy_id, fraction)| (strategy_id, fraction / total))
        .collect()
}

fn equal_weight(strategies: &BTreeSet<&str>) -> Allocations {
    let share = Decimal::ONE / Decimal::from(strategies.len());
    strategies
        .iter()
        .map(|strategy_id| (strategy_id.to_string(), share))
        .collect()
}

fn unique_ids(strategy_ids: &[String]) -> BTreeSet<&str> {
    strategy_ids.iter().map(String::as_str).collect()
}

/// Periodic allocator: computes targets and transitions the portfolio toward them
#[derive(Debug, Clone)]
pub struct DynamicAllocator {
    pub method: AllocationMethod,
    /// Window the supplied statistics are expected to cover
    pub lookback_days: u32,
    /// Floor for strategies that receive any capital
    pub min_allocation: Option<Decimal>,
    /// Ceiling for every strategy
    pub max_allocation: Option<Decimal>,
    /// Minimum drift before a rebalance is applied
    pub rebalance_threshold: Decimal,
    /// Share of the gap closed per rebalance, in (0, 1]
    pub adaptation_speed: Decimal,
    pub kelly: KellyWeighting,
}

impl DynamicAllocator {
    /// Create an allocator with default cadence parameters
    pub fn new(method: AllocationMethod) -> Self {
        Self {
            method,
            lookback_days: 30,
            min_allocation: None,
            max_allocation: None,
            rebalance_threshold: dec!(0.02),
            adaptation_speed: dec!(0.3),
            kelly: KellyWeighting::default(),
        }
    }

    /// Create from AllocationConfig
    pub fn from_config(config: &AllocationConfig) -> Self {
        Self {
            method: config.method,
            lookback_days: config.lookback_days,
            min_allocation: config.min_allocation,
            max_allocation: config.max_allocation,
            rebalance_threshold: config.rebalance_threshold,
            adaptation_speed: config.adaptation_speed,
            kelly: KellyWeighting {
                multiplier: config.kelly_fraction,
                max_position_fraction: config.max_position_fraction,
            },
        }
    }

    pub fn with_bounds(mut self, min_allocation: Decimal, max_allocation: Decimal) -> Self {
        self.min_allocation = Some(min_allocation);
        self.max_allocation = Some(max_allocation);
        self
    }

    pub fn with_rebalance_threshold(mut self, threshold: Decimal) -> Self {
        self.rebalance_threshold = threshold;
        self
    }

    pub fn with_adaptation_speed(mut self, adaptation_speed: Decimal) -> Self {
        self.adaptation_speed = adaptation_speed;
        self
    }

    /// Target allocations under this allocator's method and bounds
    pub fn calculate<P: PerformanceProvider + ?Sized>(
        &self,
        provider: &P,
        strategy_ids: &[String],
    ) -> Result<Allocations, AllocationError> {
        let target = calculate_allocations(provider, strategy_ids, self.method, &self.kelly)?;
        Ok(self.apply_bounds(target))
    }

    /// One full cycle: compute, decide, blend, write, report
    ///
    /// The allocation write is the only step that takes the manager's lock.
    pub fn rebalance<P: PerformanceProvider + ?Sized>(
        &self,
        manager: &PortfolioRiskManager,
        provider: &P,
        strategy_ids: &[String],
    ) -> Result<AllocationReport, AllocationError> {
        let current = manager.allocations();
        let target = self.calculate(provider, strategy_ids)?;
        let rebalanced = should_rebalance(&current, &target, self.rebalance_threshold);
        let proposed = blend_allocations(&current, &target, self.adaptation_speed)?;

        if rebalanced {
            manager.apply_allocations(&proposed)?;
        }

        let report = generate_allocation_report(self.method, &current, &proposed, rebalanced);
        tracing::info!(
            method = %self.method,
            lookback_days = self.lookback_days,
            strategies = proposed.len(),
            max_drift = %max_drift(&current, &target),
            total_change = %report.total_change,
            rebalanced,
            "Allocation cycle complete"
        );
        Ok(report)
    }

    fn apply_bounds(&self, allocations: Allocations) -> Allocations {
        if self.min_allocation.is_none() && self.max_allocation.is_none() {
            return allocations;
        }
        let bounded = allocations
            .into_iter()
            .map(|(strategy_id, mut fraction)| {
                if let Some(min) = self.min_allocation {
                    if fraction > Decimal::ZERO {
                        fraction = fraction.max(min);
                    }
                }
                if let Some(max) = self.max_allocation {
                    fraction = fraction.min(max);
                }
                (strategy_id, fraction)
            })
            .collect();
        normalize(bounded)
    }
}
