//! Concurrent access to the shared portfolio risk manager

use risk_alloc::allocation::{AllocationMethod, DynamicAllocator, PerformanceStats};
use risk_alloc::risk::{PortfolioRiskManager, RiskLimits};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::collections::HashMap;
use std::sync::Arc;

fn stats(sharpe: Decimal, volatility: Decimal) -> PerformanceStats {
    PerformanceStats {
        win_rate: dec!(0.55),
        avg_win: dec!(120),
        avg_loss: dec!(100),
        sharpe_ratio: sharpe,
        volatility,
        total_return: dec!(0.08),
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_strategies_and_allocator() {
    let manager = Arc::new(PortfolioRiskManager::new(
        RiskLimits::default(),
        dec!(100000),
    ));
    let strategy_ids: Vec<String> = (0..4).map(|i| format!("strategy_{i}")).collect();
    for id in &strategy_ids {
        manager.register_strategy(id);
    }

    let mut handles = Vec::new();
    for (i, id) in strategy_ids.iter().cloned().enumerate() {
        let manager = Arc::clone(&manager);
        handles.push(tokio::spawn(async move {
            for step in 0..200u32 {
                let _ = manager.can_trade(&id);
                manager.update_positions(&id, step % 2);
                manager.update_equity(dec!(100000) + Decimal::from(i as u32 * 10 + step % 7));
                let summary = manager.portfolio_summary();
                assert!(summary.peak_equity >= summary.current_equity);
                tokio::task::yield_now().await;
            }
        }));
    }

    let allocator_manager = Arc::clone(&manager);
    let ids = strategy_ids.clone();
    handles.push(tokio::spawn(async move {
        let provider: HashMap<String, PerformanceStats> = ids
            .iter()
            .enumerate()
            .map(|(i, id)| {
                let sharpe = Decimal::from(i as u32 + 1);
                (id.clone(), stats(sharpe, dec!(0.1) * sharpe))
            })
            .collect();
        let allocator = DynamicAllocator::new(AllocationMethod::SharpeWeighted);
        for _ in 0..50 {
            allocator
                .rebalance(&allocator_manager, &provider, &ids)
                .unwrap();
            let total: Decimal = allocator_manager.allocations().values().copied().sum();
            assert!(total <= dec!(1.000001));
            tokio::task::yield_now().await;
        }
    }));

    for handle in handles {
        handle.await.unwrap();
    }

    let summary = manager.portfolio_summary();
    assert!(summary.open_positions <= 4);
    let total: Decimal = manager.allocations().values().copied().sum();
    assert!((total - dec!(1)).abs() < dec!(0.000001));
    assert!(manager.allocations()["strategy_3"] > manager.allocations()["strategy_0"]);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_position_cap_holds_under_contention() {
    let manager = Arc::new(PortfolioRiskManager::new(
        RiskLimits::conservative(),
        dec!(100000),
    ));
    manager.update_positions("a", 1);
    manager.update_positions("b", 2);

    // The cap of three is reached; strategies without positions are blocked
    let handles: Vec<_> = (0..8)
        .map(|i| {
            let manager = Arc::clone(&manager);
            tokio::spawn(async move {
                let strategy_id = format!("new_{}", i % 3);
                manager.can_trade(&strategy_id)
            })
        })
        .collect();

    for handle in handles {
        let decision = handle.await.unwrap();
        assert!(!decision.allowed);
    }
    assert!(manager.can_trade("a").allowed);
}
