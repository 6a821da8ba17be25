//! Risk and allocation metrics
//!
//! Published through the `metrics` facade; without an installed recorder
//! every call is a no-op.

/// Gauge metric types
#[derive(Debug, Clone, Copy)]
pub enum GaugeMetric {
    /// Current equity
    Equity,
    /// Current drawdown from peak
    DrawdownPct,
    /// P&L since session start
    DailyPnl,
    /// Open position count across strategies
    OpenPositions,
    /// Position value to equity ratio
    Leverage,
}

impl GaugeMetric {
    fn name(self) -> &'static str {
        match self {
            GaugeMetric::Equity => "riskalloc_equity",
            GaugeMetric::DrawdownPct => "riskalloc_drawdown_pct",
            GaugeMetric::DailyPnl => "riskalloc_daily_pnl",
            GaugeMetric::OpenPositions => "riskalloc_open_positions",
            GaugeMetric::Leverage => "riskalloc_leverage",
        }
    }
}

/// Set a gauge value
pub fn set_gauge(metric: GaugeMetric, value: f64) {
    metrics::gauge!(metric.name()).set(value);
}

/// Set the capital fraction gauge for one strategy
pub fn set_allocation_gauge(strategy_id: &str, fraction: f64) {
    metrics::gauge!("riskalloc_allocation_fraction", "strategy" => strategy_id.to_string())
        .set(fraction);
}

/// Count a trade rejected by a hard limit
pub fn record_blocked_trade(limit: &'static str) {
    metrics::counter!("riskalloc_blocked_trades_total", "limit" => limit).increment(1);
}
