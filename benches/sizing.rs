//! Benchmarks for position sizing and allocation

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use risk_alloc::allocation::{
    calculate_allocations, AllocationMethod, KellyWeighting, PerformanceStats,
};
use risk_alloc::risk::{PortfolioRiskManager, RiskLimits, SizingMethod, SizingRequest};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::collections::BTreeMap;

fn benchmark_percent_risk(c: &mut Criterion) {
    let method = SizingMethod::default();
    let request = SizingRequest::new(dec!(100000), dec!(475.50)).with_stop(dec!(470.00));

    c.bench_function("percent_risk_size", |b| {
        b.iter(|| method.size(black_box(&request)))
    });
}

fn benchmark_kelly(c: &mut Criterion) {
    let method = SizingMethod::Kelly {
        win_rate: dec!(0.55),
        avg_win: dec!(150),
        avg_loss: dec!(100),
        kelly_fraction: dec!(0.25),
        max_position_fraction: dec!(0.20),
    };
    let request = SizingRequest::new(dec!(100000), dec!(100));

    c.bench_function("kelly_size", |b| b.iter(|| method.size(black_box(&request))));
}

fn benchmark_can_trade(c: &mut Criterion) {
    let manager = PortfolioRiskManager::new(RiskLimits::default(), dec!(100000));
    for i in 0..10 {
        manager.update_positions(&format!("strategy_{i}"), 0);
    }

    c.bench_function("can_trade", |b| {
        b.iter(|| manager.can_trade(black_box("strategy_3")))
    });
}

fn benchmark_sharpe_allocation(c: &mut Criterion) {
    let ids: Vec<String> = (0..20).map(|i| format!("strategy_{i}")).collect();
    let provider: BTreeMap<String, PerformanceStats> = ids
        .iter()
        .enumerate()
        .map(|(i, id)| {
            let sharpe = Decimal::from(i as u32 + 1) / dec!(10);
            (
                id.clone(),
                PerformanceStats {
                    win_rate: dec!(0.55),
                    avg_win: dec!(120),
                    avg_loss: dec!(100),
                    sharpe_ratio: sharpe,
                    volatility: dec!(0.15),
                    total_return: sharpe / dec!(5),
                },
            )
        })
        .collect();
    let kelly = KellyWeighting::default();

    c.bench_function("sharpe_allocation_20", |b| {
        b.iter(|| {
            calculate_allocations(
                black_box(&provider),
                &ids,
                AllocationMethod::SharpeWeighted,
                &kelly,
            )
        })
    });
}

criterion_group!(
    benches,
    benchmark_percent_risk,
    benchmark_kelly,
    benchmark_can_trade,
    benchmark_sharpe_allocation
);
criterion_main!(benches);
