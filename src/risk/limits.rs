//! Portfolio risk limits and risk profiles

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

/// How the concurrent position cap is counted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PositionCapScope {
    /// Sum of open positions across all strategies
    #[default]
    Portfolio,
    /// Each strategy's own open positions
    PerStrategy,
}

/// What a correlation breach does
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CorrelationPolicy {
    /// Raise a warning only
    #[default]
    Advisory,
    /// Block new trades while correlation is above the limit
    Block,
}

/// Portfolio-wide risk limits
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RiskLimits {
    /// Maximum drawdown from peak as a fraction before halting all trading
    pub max_portfolio_drawdown_pct: Decimal,
    /// Maximum loss since session start in base currency (zero disables)
    pub max_daily_loss: Decimal,
    /// Maximum concurrent open positions
    pub max_concurrent_positions: u32,
    /// Maximum cross-strategy correlation
    pub max_correlation: Decimal,
    /// Minimum implied cash to keep
    pub min_cash_reserve: Decimal,
    /// Maximum position value to equity ratio
    pub max_leverage: Decimal,
    #[serde(default)]
    pub position_cap_scope: PositionCapScope,
    #[serde(default)]
    pub correlation_policy: CorrelationPolicy,
}

impl RiskLimits {
    /// Conservative defaults for a ~$100k account
    pub fn default_profile() -> Self {
        Self {
            max_portfolio_drawdown_pct: dec!(0.15),
            max_daily_loss: dec!(3000),
            max_concurrent_positions: 5,
            max_correlation: dec!(0.7),
            min_cash_reserve: dec!(10000),
            max_leverage: dec!(1.5),
            position_cap_scope: PositionCapScope::Portfolio,
            correlation_policy: CorrelationPolicy::Advisory,
        }
    }

    /// Wider limits for experienced operators
    pub fn aggressive() -> Self {
        Self {
            max_portfolio_drawdown_pct: dec!(0.25),
            max_daily_loss: dec!(5000),
            max_concurrent_positions: 10,
            max_correlation: dec!(0.8),
            min_cash_reserve: dec!(5000),
            max_leverage: dec!(2.0),
            ..Self::default_profile()
        }
    }

    /// Tight limits, no leverage
    pub fn conservative() -> Self {
        Self {
            max_portfolio_drawdown_pct: dec!(0.10),
            max_daily_loss: dec!(2000),
            max_concurrent_positions: 3,
            max_correlation: dec!(0.5),
            min_cash_reserve: dec!(20000),
            max_leverage: dec!(1.0),
            ..Self::default_profile()
        }
    }

    /// Resolve a named profile
    pub fn for_profile(profile: RiskProfile) -> Self {
        match profile {
            RiskProfile::Default => Self::default_profile(),
            RiskProfile::Aggressive => Self::aggressive(),
            RiskProfile::Conservative => Self::conservative(),
        }
    }

    pub fn with_position_cap_scope(mut self, scope: PositionCapScope) -> Self {
        self.position_cap_scope = scope;
        self
    }

    pub fn with_correlation_policy(mut self, policy: CorrelationPolicy) -> Self {
        self.correlation_policy = policy;
        self
    }
}

impl Default for RiskLimits {
    fn default() -> Self {
        Self::default_profile()
    }
}

/// Named limit presets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskProfile {
    #[default]
    Default,
    Aggressive,
    Conservative,
}
