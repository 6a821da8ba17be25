//! Position sizing implementations
//!
//! Five sizing methods share one contract: a positive account value and entry
//! price go in, a whole number of units comes out. Results round down, and a
//! quantity of zero is a valid answer meaning "do not trade at this size".

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::kelly::{effective_fraction, kelly_fraction};
use super::SizingError;

/// Inputs for a single sizing call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SizingRequest {
    /// Current account value in base currency
    pub account_value: Decimal,
    /// Proposed entry price per unit
    pub entry_price: Decimal,
    /// Protective stop price (fixed dollar and percent risk)
    pub stop_price: Option<Decimal>,
    /// Volatility reference such as ATR (volatility adjusted)
    pub volatility: Option<Decimal>,
}

impl SizingRequest {
    /// Request without a risk reference
    pub fn new(account_value: Decimal, entry_price: Decimal) -> Self {
        Self {
            account_value,
            entry_price,
            stop_price: None,
            volatility: None,
        }
    }

    pub fn with_stop(mut self, stop_price: Decimal) -> Self {
        self.stop_price = Some(stop_price);
        self
    }

    pub fn with_volatility(mut self, volatility: Decimal) -> Self {
        self.volatility = Some(volatility);
        self
    }

    fn validate(&self) -> Result<(), SizingError> {
        if self.account_value <= Decimal::ZERO {
            return Err(SizingError::InvalidInput(format!(
                "account value must be positive, got {}",
                self.account_value
            )));
        }
        if self.entry_price <= Decimal::ZERO {
            return Err(SizingError::InvalidInput(format!(
                "entry price must be positive, got {}",
                self.entry_price
            )));
        }
        Ok(())
    }

    fn stop_distance(&self) -> Result<Decimal, SizingError> {
        let stop = self.stop_price.ok_or_else(|| {
            SizingError::InvalidInput("stop price required for this sizing method".to_string())
        })?;
        if stop <= Decimal::ZERO {
            return Err(SizingError::InvalidInput(format!(
                "stop price must be positive, got {stop}"
            )));
        }
        Ok((self.entry_price - stop).abs())
    }
}

/// Closed set of sizing policies
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "method", rename_all = "snake_case")]
pub enum SizingMethod {
    /// Risk a fixed currency amount per trade
    FixedDollarRisk { risk_amount: Decimal },
    /// Risk a fraction of the account, capped by position value
    PercentRisk {
        risk_fraction: Decimal,
        max_position_fraction: Decimal,
    },
    /// Fractional Kelly from historical win statistics
    Kelly {
        win_rate: Decimal,
        avg_win: Decimal,
        avg_loss: Decimal,
        kelly_fraction: Decimal,
        max_position_fraction: Decimal,
    },
    /// Fixed fraction of the account by value; stop distance is ignored
    FixedFractional { fraction: Decimal },
    /// Percent risk with the stop distance taken from a volatility reference
    VolatilityAdjusted {
        risk_fraction: Decimal,
        atr_multiplier: Decimal,
        max_position_fraction: Decimal,
    },
}

impl Default for SizingMethod {
    fn default() -> Self {
        SizingMethod::PercentRisk {
            risk_fraction: dec!(0.01),
            max_position_fraction: dec!(0.20),
        }
    }
}

impl SizingMethod {
    /// Calculate the quantity for a request
    pub fn size(&self, request: &SizingRequest) -> Result<u64, SizingError> {
        let quantity = match *self {
            SizingMethod::FixedDollarRisk { risk_amount } => {
                fixed_dollar_risk(request, risk_amount)
            }
            SizingMethod::PercentRisk {
                risk_fraction,
                max_position_fraction,
            } => percent_risk(request, risk_fraction, max_position_fraction),
            SizingMethod::Kelly {
                win_rate,
                avg_win,
                avg_loss,
                kelly_fraction,
                max_position_fraction,
            } => kelly(
                request,
                win_rate,
                avg_win,
                avg_loss,
                kelly_fraction,
                max_position_fraction,
            ),
            SizingMethod::FixedFractional { fraction } => fixed_fractional(request, fraction),
            SizingMethod::VolatilityAdjusted {
                risk_fraction,
                atr_multiplier,
                max_position_fraction,
            } => volatility_adjusted(
                request,
                risk_fraction,
                atr_multiplier,
                max_position_fraction,
            ),
        }?;

        tracing::debug!(
            method = self.mode_name(),
            account_value = %request.account_value,
            entry_price = %request.entry_price,
            quantity,
            "Sized position"
        );
        Ok(quantity)
    }

    /// Short method identifier
    pub fn mode_name(&self) -> &'static str {
        match self {
            SizingMethod::FixedDollarRisk { .. } => "fixed_dollar_risk",
            SizingMethod::PercentRisk { .. } => "percent_risk",
            SizingMethod::Kelly { .. } => "kelly",
            SizingMethod::FixedFractional { .. } => "fixed_fractional",
            SizingMethod::VolatilityAdjusted { .. } => "volatility_adjusted",
        }
    }

    /// Human readable description including parameters
    pub fn describe(&self) -> String {
        match self {
            SizingMethod::FixedDollarRisk { risk_amount } => {
                format!("FixedDollarRisk(${:.2})", risk_amount)
            }
            SizingMethod::PercentRisk {
                risk_fraction,
                max_position_fraction,
            } => format!(
                "PercentRisk({:.2}%, max {:.0}%)",
                risk_fraction * dec!(100),
                max_position_fraction * dec!(100)
            ),
            SizingMethod::Kelly { kelly_fraction, .. } => {
                format!("Kelly({:.0}% of Kelly)", kelly_fraction * dec!(100))
            }
            SizingMethod::FixedFractional { fraction } => {
                format!("FixedFractional({:.1}%)", fraction * dec!(100))
            }
            SizingMethod::VolatilityAdjusted {
                risk_fraction,
                atr_multiplier,
                ..
            } => format!(
                "VolatilityAdjusted(risk {:.2}%, ATR x{:.1})",
                risk_fraction * dec!(100),
                atr_multiplier
            ),
        }
    }
}

/// Size `risk_amount / |entry - stop|` units
pub fn fixed_dollar_risk(request: &SizingRequest, risk_amount: Decimal) -> Result<u64, SizingError> {
    request.validate()?;
    let risk_per_unit = request.stop_distance()?;
    units_for_risk(risk_amount, Decimal::ONE, risk_per_unit)
}

/// Risk a fraction of the account, then cap the position value
pub fn percent_risk(
    request: &SizingRequest,
    risk_fraction: Decimal,
    max_position_fraction: Decimal,
) -> Result<u64, SizingError> {
    request.validate()?;
    let risk_per_unit = request.stop_distance()?;
    let quantity = units_for_risk(request.account_value, risk_fraction, risk_per_unit)?;
    Ok(cap_position(request, quantity, max_position_fraction))
}

/// Fractional Kelly sizing; a negative edge sizes to zero
pub fn kelly(
    request: &SizingRequest,
    win_rate: Decimal,
    avg_win: Decimal,
    avg_loss: Decimal,
    multiplier: Decimal,
    max_position_fraction: Decimal,
) -> Result<u64, SizingError> {
    request.validate()?;
    let raw = kelly_fraction(win_rate, avg_win, avg_loss)?;
    let fraction = effective_fraction(raw, multiplier, max_position_fraction);
    Ok(scaled_units(request.account_value, fraction, request.entry_price))
}

/// Allocate a fixed fraction of the account by value
pub fn fixed_fractional(request: &SizingRequest, fraction: Decimal) -> Result<u64, SizingError> {
    request.validate()?;
    Ok(scaled_units(request.account_value, fraction, request.entry_price))
}

/// Percent risk with `atr_multiplier * volatility` as the risk per unit
pub fn volatility_adjusted(
    request: &SizingRequest,
    risk_fraction: Decimal,
    atr_multiplier: Decimal,
    max_position_fraction: Decimal,
) -> Result<u64, SizingError> {
    request.validate()?;
    let volatility = request.volatility.ok_or_else(|| {
        SizingError::InvalidInput("volatility reference required for this sizing method".to_string())
    })?;
    let risk_per_unit = atr_multiplier.checked_mul(volatility).ok_or_else(|| {
        SizingError::InvalidInput(format!(
            "risk per unit out of range: {atr_multiplier} x {volatility}"
        ))
    })?;
    let quantity = units_for_risk(request.account_value, risk_fraction, risk_per_unit)?;
    Ok(cap_position(request, quantity, max_position_fraction))
}

/// Run several methods against one request; failures are reported as zero
pub fn compare_methods(request: &SizingRequest, methods: &[SizingMethod]) -> BTreeMap<String, u64> {
    methods
        .iter()
        .map(|method| (method.describe(), method.size(request).unwrap_or(0)))
        .collect()
}

/// Units affordable when each costs `risk_per_unit` out of `amount * fraction`
fn units_for_risk(
    amount: Decimal,
    fraction: Decimal,
    risk_per_unit: Decimal,
) -> Result<u64, SizingError> {
    if risk_per_unit <= Decimal::ZERO {
        return Err(SizingError::ZeroRiskDistance(risk_per_unit));
    }
    Ok(scaled_units(amount, fraction, risk_per_unit))
}

fn cap_position(request: &SizingRequest, quantity: u64, max_position_fraction: Decimal) -> u64 {
    let max_units = scaled_units(
        request.account_value,
        max_position_fraction,
        request.entry_price,
    );
    quantity.min(max_units)
}

/// `floor(amount * fraction / per_unit)`, saturating at `u64::MAX`
///
/// `per_unit` must be positive.
fn scaled_units(amount: Decimal, fraction: Decimal, per_unit: Decimal) -> u64 {
    if amount <= Decimal::ZERO || fraction <= Decimal::ZERO {
        return 0;
    }
    amount
        .checked_mul(fraction)
        .and_then(|budget| budget.checked_div(per_unit))
        .map_or(u64::MAX, whole_units)
}

fn whole_units(value: Decimal) -> u64 {
    value.floor().max(Decimal::ZERO).to_u64().unwrap_or(u64::MAX)
}
