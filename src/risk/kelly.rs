//! Kelly criterion
//!
//! Shared by the Kelly position sizer and the adaptive Kelly allocation method.

use super::SizingError;
use rust_decimal::Decimal;

/// Raw Kelly fraction for a strategy with the given win rate and payoff
///
/// - Payoff ratio: b = avg_win / avg_loss
/// - Kelly fraction: f* = (p * (b + 1) - 1) / b
///
/// A negative result means the strategy has no edge. When `avg_win` is zero
/// there is nothing to win and the fraction is reported as zero.
pub fn kelly_fraction(
    win_rate: Decimal,
    avg_win: Decimal,
    avg_loss: Decimal,
) -> Result<Decimal, SizingError> {
    if avg_loss <= Decimal::ZERO {
        return Err(SizingError::InvalidInput(format!(
            "average loss must be positive, got {avg_loss}"
        )));
    }
    if win_rate < Decimal::ZERO || win_rate > Decimal::ONE {
        return Err(SizingError::InvalidInput(format!(
            "win rate must be within [0, 1], got {win_rate}"
        )));
    }

    if avg_win <= Decimal::ZERO {
        return Ok(Decimal::ZERO);
    }
    // An unrepresentable payoff is treated as unbounded, where f* tends to p
    let Some(payoff) = avg_win.checked_div(avg_loss) else {
        return Ok(win_rate);
    };
    if payoff <= Decimal::ZERO {
        return Ok(Decimal::ZERO);
    }

    // Same as (p * (b + 1) - 1) / b without the p * b term
    Ok(win_rate - (Decimal::ONE - win_rate) / payoff)
}

/// Scale a raw Kelly fraction and clamp it into [0, cap]
pub fn effective_fraction(raw: Decimal, multiplier: Decimal, cap: Decimal) -> Decimal {
    let scaled = raw.checked_mul(multiplier).unwrap_or_else(|| {
        if raw.is_sign_negative() == multiplier.is_sign_negative() {
            cap
        } else {
            Decimal::ZERO
        }
    });
    scaled.min(cap).max(Decimal::ZERO)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_kelly_calculation() {
        // b = 2, f = (0.6 * 3 - 1) / 2 = 0.4
        let f = kelly_fraction(dec!(0.6), dec!(200), dec!(100)).unwrap();
        assert_eq!(f, dec!(0.4));

        // Quarter Kelly = 0.10, capped at 5%
        assert_eq!(effective_fraction(f, dec!(0.25), dec!(0.05)), dec!(0.05));
        assert_eq!(effective_fraction(f, dec!(0.25), dec!(0.20)), dec!(0.10));
    }

    #[test]
    fn test_kelly_no_edge() {
        let f = kelly_fraction(dec!(0.5), dec!(100), dec!(100)).unwrap();
        assert_eq!(f, dec!(0));
        assert_eq!(effective_fraction(f, dec!(1), dec!(0.2)), dec!(0));
    }

    #[test]
    fn test_kelly_negative_edge_clamps_to_zero() {
        let f = kelly_fraction(dec!(0.3), dec!(100), dec!(100)).unwrap();
        assert!(f < dec!(0));
        assert_eq!(effective_fraction(f, dec!(0.5), dec!(0.2)), dec!(0));
    }

    #[test]
    fn test_kelly_rejects_non_positive_loss() {
        assert!(matches!(
            kelly_fraction(dec!(0.6), dec!(100), dec!(0)),
            Err(SizingError::InvalidInput(_))
        ));
        assert!(matches!(
            kelly_fraction(dec!(0.6), dec!(100), dec!(-5)),
            Err(SizingError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_kelly_rejects_win_rate_out_of_range() {
        assert!(kelly_fraction(dec!(1.2), dec!(100), dec!(50)).is_err());
    }

    #[test]
    fn test_kelly_extreme_payoff_does_not_overflow() {
        let huge = Decimal::MAX;
        let tiny = Decimal::new(1, 28);
        assert_eq!(kelly_fraction(dec!(0.6), huge, tiny).unwrap(), dec!(0.6));
        let f = kelly_fraction(dec!(0.1), dec!(0.000001), dec!(1000000)).unwrap();
        assert!(f < dec!(0));
        assert_eq!(effective_fraction(f, dec!(1000), dec!(0.2)), dec!(0));
        assert_eq!(effective_fraction(huge, huge, dec!(0.2)), dec!(0.2));
        assert_eq!(effective_fraction(Decimal::MIN, huge, dec!(0.2)), dec!(0));
    }

    #[test]
    fn test_kelly_zero_payoff() {
        assert_eq!(
            kelly_fraction(dec!(0.9), dec!(0), dec!(50)).unwrap(),
            dec!(0)
        );
    }
}
