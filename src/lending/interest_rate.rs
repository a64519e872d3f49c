//! Interest Rate Curve - Variable rate model based on utilization
//!
//! Jump-rate model shared by the ledger and every vault registered in it:
//! - Base rate: rate at zero utilization
//! - Multiplier: slope below the kink
//! - Kink: utilization breakpoint
//! - Jump multiplier: slope above the kink
//!
//! The curve is evaluated in one place so the ledger's view of a vault's rate
//! and the vault's own debt accrual can never diverge.

use odra::prelude::*;
use odra::casper_types::U256;
use super::errors::LendingError;
use crate::math::{Bps, SafeMath, Wad, BPS, MILLIS_PER_YEAR};

/// Upper bound for any single rate parameter (1000% per year)
pub const MAX_RATE_BPS: u32 = 100_000;

/// Per-vault interest rate curve, all values in basis points per year
#[odra::odra_type]
pub struct RateCurve {
    /// Rate at zero utilization
    pub base_rate: u32,
    /// Slope below the kink
    pub multiplier: u32,
    /// Slope above the kink
    pub jump_multiplier: u32,
    /// Utilization breakpoint (0..=10000)
    pub kink: u32,
}

impl RateCurve {
    pub fn new(base_rate: u32, multiplier: u32, jump_multiplier: u32, kink: u32) -> Self {
        Self {
            base_rate,
            multiplier,
            jump_multiplier,
            kink,
        }
    }

    /// Rejects curves with an out-of-range kink or absurd slopes
    pub fn validate(&self) -> Result<(), LendingError> {
        if self.kink > BPS {
            return Err(LendingError::InvalidParameters);
        }
        if self.base_rate > MAX_RATE_BPS
            || self.multiplier > MAX_RATE_BPS
            || self.jump_multiplier > MAX_RATE_BPS
        {
            return Err(LendingError::InvalidParameters);
        }
        Ok(())
    }

    /// Annual borrow rate (WAD) at the given utilization (WAD)
    ///
    /// - `u < kink`:  `base + multiplier * u`
    /// - `u >= kink`: `base + multiplier * kink + jump * (u - kink)`
    pub fn borrow_rate(&self, utilization: U256) -> Result<U256, LendingError> {
        let kink = Bps::to_wad(self.kink);
        if utilization < kink {
            self.lower_segment(utilization)
        } else {
            self.upper_segment(utilization)
        }
    }

    fn lower_segment(&self, utilization: U256) -> Result<U256, LendingError> {
        let slope = Wad::mul(Bps::to_wad(self.multiplier), utilization)?;
        SafeMath::add(Bps::to_wad(self.base_rate), slope)
    }

    fn upper_segment(&self, utilization: U256) -> Result<U256, LendingError> {
        let kink = Bps::to_wad(self.kink);
        let at_kink = self.lower_segment(kink)?;
        let excess = SafeMath::sub(utilization, kink)?;
        let jump = Wad::mul(Bps::to_wad(self.jump_multiplier), excess)?;
        SafeMath::add(at_kink, jump)
    }
}

/// Utilization = total_borrowed / total_deposits (WAD), 0 without deposits
pub fn utilization(total_borrowed: U256, total_deposits: U256) -> Result<U256, LendingError> {
    Wad::ratio(total_borrowed, total_deposits)
}

/// Simple interest on `principal` at `rate` (WAD per year) over `elapsed` ms
///
/// interest = principal * rate * elapsed / (1e18 * MILLIS_PER_YEAR)
pub fn accrued_interest(principal: U256, rate: U256, elapsed: u64) -> Result<U256, LendingError> {
    let (interest, _) = accrued_interest_with_carry(principal, rate, elapsed, U256::zero())?;
    Ok(interest)
}

/// Same as `accrued_interest`, plus `carry` left over from earlier periods
///
/// Returns whole units of interest and the sub-unit remainder (in
/// `1e18 * MILLIS_PER_YEAR` fractions) to carry into the next period, so
/// frequent accruals charge as much as a single long one.
pub fn accrued_interest_with_carry(
    principal: U256,
    rate: U256,
    elapsed: u64,
    carry: U256,
) -> Result<(U256, U256), LendingError> {
    let accrued = SafeMath::mul(SafeMath::mul(principal, rate)?, U256::from(elapsed))?;
    let numerator = SafeMath::add(accrued, carry)?;
    let denominator = SafeMath::mul(Wad::one(), U256::from(MILLIS_PER_YEAR))?;
    let interest = SafeMath::div(numerator, denominator)?;
    Ok((interest, numerator % denominator))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::WAD_PER_BPS;

    fn default_curve() -> RateCurve {
        RateCurve::new(1000, 2000, 5000, 8000)
    }

    fn bps(value: u32) -> U256 {
        U256::from(value) * U256::from(WAD_PER_BPS)
    }

    #[test]
    fn test_utilization_calculation() {
        assert_eq!(utilization(U256::from(500), U256::from(1000)).unwrap(), bps(5000));
        assert_eq!(utilization(U256::from(500), U256::zero()).unwrap(), U256::zero());
    }

    #[test]
    fn test_borrow_rate_below_kink() {
        let curve = default_curve();
        assert_eq!(curve.borrow_rate(U256::zero()).unwrap(), bps(1000));
        // 10% + 20% * 50% = 20%
        assert_eq!(curve.borrow_rate(bps(5000)).unwrap(), bps(2000));
    }

    #[test]
    fn test_borrow_rate_above_kink() {
        let curve = default_curve();
        // 10% + 20% * 80% + 50% * 10% = 31%
        assert_eq!(curve.borrow_rate(bps(9000)).unwrap(), bps(3100));
        // 10% + 16% + 50% * 20% = 36%
        assert_eq!(curve.borrow_rate(bps(10_000)).unwrap(), bps(3600));
    }

    #[test]
    fn test_curve_continuous_at_kink() {
        let curves = [
            default_curve(),
            RateCurve::new(0, 0, 0, 0),
            RateCurve::new(250, 400, 30_000, 1),
            RateCurve::new(1000, 2000, 5000, 10_000),
            RateCurve::new(MAX_RATE_BPS, MAX_RATE_BPS, MAX_RATE_BPS, 4321),
        ];
        for curve in curves.iter() {
            let kink = bps(curve.kink);
            assert_eq!(curve.lower_segment(kink).unwrap(), curve.upper_segment(kink).unwrap());
            if !kink.is_zero() {
                let below = curve.borrow_rate(kink - U256::one()).unwrap();
                let at = curve.borrow_rate(kink).unwrap();
                assert!(below <= at);
                assert!(at - below <= bps(curve.multiplier) / U256::from(crate::math::WAD) + U256::one());
            }
        }
    }

    #[test]
    fn test_validate_rejects_out_of_range() {
        assert!(default_curve().validate().is_ok());
        assert!(matches!(
            RateCurve::new(1000, 2000, 5000, 10_001).validate(),
            Err(LendingError::InvalidParameters)
        ));
        assert!(matches!(
            RateCurve::new(MAX_RATE_BPS + 1, 0, 0, 0).validate(),
            Err(LendingError::InvalidParameters)
        ));
    }

    #[test]
    fn test_one_year_simple_interest() {
        let interest = accrued_interest(U256::from(100), bps(1000), MILLIS_PER_YEAR).unwrap();
        assert_eq!(interest, U256::from(10));
        let half = accrued_interest(U256::from(1_000_000), bps(1000), MILLIS_PER_YEAR / 2).unwrap();
        assert_eq!(half, U256::from(50_000));
        assert_eq!(accrued_interest(U256::zero(), bps(1000), 10).unwrap(), U256::zero());
    }

    #[test]
    fn test_carry_accumulates_fractions() {
        let step = MILLIS_PER_YEAR / 20;
        // half a unit per step
        let (interest, carry) =
            accrued_interest_with_carry(U256::from(100), bps(1000), step, U256::zero()).unwrap();
        assert_eq!(interest, U256::zero());
        assert!(!carry.is_zero());
        let (interest, carry) = accrued_interest_with_carry(U256::from(100), bps(1000), step, carry).unwrap();
        assert_eq!(interest, U256::one());
        assert!(carry.is_zero());
    }
}
