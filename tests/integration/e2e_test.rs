//! End-to-end integration tests

use risk_alloc::allocation::{AllocationMethod, DynamicAllocator, PerformanceStats};
use risk_alloc::config::Config;
use risk_alloc::risk::{
    BlockReason, PortfolioRiskManager, RiskLevel, SizingMethod, SizingRequest,
};
use rust_decimal_macros::dec;
use std::collections::HashMap;

#[test]
fn test_config_example_loads() {
    let config = Config::load(concat!(env!("CARGO_MANIFEST_DIR"), "/config.toml.example")).unwrap();
    assert_eq!(config.risk.initial_equity, dec!(100000));
    assert_eq!(config.allocation.method, AllocationMethod::EqualWeight);
}

#[test]
fn test_size_then_admit_trade() {
    let config = Config::default();
    let manager =
        PortfolioRiskManager::new(config.risk.effective_limits(), config.risk.initial_equity);
    manager.register_strategy("spy_trend");

    let request = SizingRequest::new(dec!(100000), dec!(475.50)).with_stop(dec!(470.00));
    let quantity = config.sizing.size(&request).unwrap();
    assert_eq!(quantity, 42);

    let decision = manager.can_trade("spy_trend");
    assert!(decision.allowed);
    manager.update_positions("spy_trend", 1);
    manager.update_positions_value(dec!(475.50) * rust_decimal::Decimal::from(quantity));

    let summary = manager.portfolio_summary();
    assert_eq!(summary.open_positions, 1);
    assert_eq!(summary.positions_value, dec!(19971.00));
}

#[test]
fn test_trading_day_lifecycle() {
    let manager = PortfolioRiskManager::new(Default::default(), dec!(100000));
    for id in ["trend", "mean_rev", "breakout"] {
        manager.register_strategy(id);
    }

    // Allocate, trade, lose money, hit the daily limit
    let stats: HashMap<String, PerformanceStats> = HashMap::new();
    let allocator = DynamicAllocator::new(AllocationMethod::EqualWeight).with_adaptation_speed(dec!(1));
    let ids = vec!["trend".to_string(), "mean_rev".to_string(), "breakout".to_string()];
    let report = allocator.rebalance(&manager, &stats, &ids).unwrap();
    assert!(report.rebalanced);
    assert_eq!(manager.allocations().len(), 3);

    manager.update_equity(dec!(98500));
    assert_eq!(manager.risk_status().level, RiskLevel::Ok);

    manager.update_equity(dec!(97000));
    let decision = manager.can_trade("trend");
    assert!(!decision.allowed);
    assert!(matches!(decision.reason, Some(BlockReason::DailyLoss { .. })));

    // Next session starts from the current equity
    manager.reset_daily_tracking();
    assert!(manager.can_trade("trend").allowed);
    assert_eq!(manager.portfolio_summary().daily_pnl, dec!(0));
}

#[test]
fn test_kelly_sizing_from_config() {
    let toml = r#"
        [sizing]
        method = "kelly"
        win_rate = 0.55
        avg_win = 150
        avg_loss = 100
        kelly_fraction = 0.25
        max_position_fraction = 0.20
    "#;
    let config: Config = toml::from_str(toml).unwrap();
    assert!(matches!(config.sizing, SizingMethod::Kelly { .. }));

    // Kelly = (0.55 * 2.5 - 1) / 1.5 = 0.25, quarter Kelly = 6.25%
    let request = SizingRequest::new(dec!(100000), dec!(100));
    assert_eq!(config.sizing.size(&request).unwrap(), 62);
}
