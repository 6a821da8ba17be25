//! Allocation cycles against a live risk manager

use risk_alloc::allocation::{
    calculate_allocations, rank_strategies, AllocationMethod, DynamicAllocator, KellyWeighting,
    PerformanceStats, RankMetric,
};
use risk_alloc::risk::{PortfolioRiskManager, RiskLimits};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::collections::BTreeMap;

fn provider() -> BTreeMap<String, PerformanceStats> {
    let entry = |id: &str, sharpe: Decimal, volatility: Decimal, total_return: Decimal| {
        (
            id.to_string(),
            PerformanceStats {
                win_rate: dec!(0.55),
                avg_win: dec!(150),
                avg_loss: dec!(100),
                sharpe_ratio: sharpe,
                volatility,
                total_return,
            },
        )
    };
    [
        entry("trend", dec!(1.0), dec!(0.10), dec!(0.10)),
        entry("mean_rev", dec!(2.0), dec!(0.20), dec!(0.30)),
        entry("breakout", dec!(-0.5), dec!(0.40), dec!(-0.05)),
    ]
    .into()
}

fn ids() -> Vec<String> {
    vec!["trend".to_string(), "mean_rev".to_string(), "breakout".to_string()]
}

#[test]
fn test_gradual_convergence_to_target() {
    let manager = PortfolioRiskManager::new(RiskLimits::default(), dec!(100000));
    let current: BTreeMap<String, Decimal> = [
        ("trend".to_string(), dec!(0.4)),
        ("mean_rev".to_string(), dec!(0.3)),
        ("breakout".to_string(), dec!(0.3)),
    ]
    .into();
    manager.apply_allocations(&current).unwrap();

    let allocator = DynamicAllocator::new(AllocationMethod::SharpeWeighted);
    let first = allocator.rebalance(&manager, &provider(), &ids()).unwrap();
    assert!(first.rebalanced);

    // Target: trend 1/3, mean_rev 2/3, breakout 0. 30% of the gap per cycle
    let after = manager.allocations();
    assert!((after["breakout"] - dec!(0.21)).abs() < dec!(0.000001));
    assert!(after["mean_rev"] > dec!(0.3) && after["mean_rev"] < dec!(0.6667));

    let mut cycles = 1;
    while allocator.rebalance(&manager, &provider(), &ids()).unwrap().rebalanced {
        cycles += 1;
        assert!(cycles < 50);
    }
    let settled = manager.allocations();
    assert!(settled["breakout"] < dec!(0.02));
    assert!((settled.values().copied().sum::<Decimal>() - dec!(1)).abs() < dec!(0.000001));
}

#[test]
fn test_small_drift_not_applied() {
    let manager = PortfolioRiskManager::new(RiskLimits::default(), dec!(100000));
    let current: BTreeMap<String, Decimal> = [
        ("trend".to_string(), dec!(0.34)),
        ("mean_rev".to_string(), dec!(0.33)),
        ("breakout".to_string(), dec!(0.33)),
    ]
    .into();
    manager.apply_allocations(&current).unwrap();

    let report = DynamicAllocator::new(AllocationMethod::EqualWeight)
        .rebalance(&manager, &provider(), &ids())
        .unwrap();
    assert!(!report.rebalanced);
    assert_eq!(manager.allocations(), current);
}

#[test]
fn test_bounds_and_capital() {
    let manager = PortfolioRiskManager::new(RiskLimits::default(), dec!(200000));
    let allocator = DynamicAllocator::new(AllocationMethod::RiskParity)
        .with_bounds(dec!(0.10), dec!(0.50))
        .with_adaptation_speed(dec!(1));
    allocator.rebalance(&manager, &provider(), &ids()).unwrap();

    let allocations = manager.allocations();
    assert_eq!(allocations.len(), 3);
    assert!(allocations.values().all(|f| *f > dec!(0)));
    let capital: Decimal = ids().iter().map(|id| manager.strategy_capital(id)).sum();
    assert!((capital - dec!(200000)).abs() < dec!(0.01));
}

#[test]
fn test_deactivated_strategy_drops_out() {
    let manager = PortfolioRiskManager::new(RiskLimits::default(), dec!(100000));
    let allocator =
        DynamicAllocator::new(AllocationMethod::EqualWeight).with_adaptation_speed(dec!(1));
    allocator.rebalance(&manager, &provider(), &ids()).unwrap();

    manager.deactivate_strategy("breakout");
    let allocations = manager.allocations();
    assert_eq!(allocations.len(), 2);
    assert!((allocations["trend"] - dec!(0.5)).abs() < dec!(0.000001));
    assert_eq!(manager.strategy_capital("breakout"), dec!(0));
}

#[test]
fn test_kelly_weights_and_ranking() {
    let weights = calculate_allocations(
        &provider(),
        &ids(),
        AllocationMethod::AdaptiveKelly,
        &KellyWeighting::default(),
    )
    .unwrap();
    // Identical win statistics weigh equally
    assert!((weights["trend"] - weights["breakout"]).abs() < dec!(0.000001));

    let ranked = rank_strategies(&provider(), &ids(), RankMetric::Sharpe);
    assert_eq!(ranked, vec!["mean_rev", "trend", "breakout"]);
}
