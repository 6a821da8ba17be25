//! Risk management module
//!
//! Position sizing, portfolio limits, and the shared portfolio risk state

mod correlation;
mod kelly;
mod limits;
mod manager;
mod sizing;
mod state;
mod types;

pub use correlation::{correlation, correlation_matrix, max_pairwise_correlation, CorrelationMatrix};
pub use kelly::{effective_fraction, kelly_fraction};
pub use limits::{CorrelationPolicy, PositionCapScope, RiskLimits, RiskProfile};
pub use manager::PortfolioRiskManager;
pub use sizing::{
    compare_methods, fixed_dollar_risk, fixed_fractional, kelly, percent_risk,
    volatility_adjusted, SizingMethod, SizingRequest,
};
pub use state::{PortfolioMetrics, PortfolioSnapshot, PortfolioState, StrategyAllocation};
pub use types::{
    BlockReason, RiskError, RiskLevel, RiskStatus, RiskWarning, SizingError, TradeDecision,
};
