//! Fixed-point utilities for the lending protocol
//! Checked U256 arithmetic plus basis-point and WAD helpers. Every helper fails
//! closed instead of wrapping.
use odra::casper_types::U256;
use crate::lending::errors::LendingError;

/// Basis points denominator (10000 = 100%)
pub const BPS: u32 = 10_000;

/// WAD scale (1e18 = 1.0)
pub const WAD: u128 = 1_000_000_000_000_000_000;

/// WAD value of one basis point (1e18 / 1e4)
pub const WAD_PER_BPS: u128 = 100_000_000_000_000;

/// Block time is reported in milliseconds
pub const MILLIS_PER_YEAR: u64 = 365 * 24 * 60 * 60 * 1000;

/// Safe math operations for U256
pub struct SafeMath;

impl SafeMath {
    /// Safe addition with overflow check
    pub fn add(a: U256, b: U256) -> Result<U256, LendingError> {
        a.checked_add(b).ok_or(LendingError::ArithmeticOverflow)
    }

    /// Safe subtraction with underflow check
    pub fn sub(a: U256, b: U256) -> Result<U256, LendingError> {
        a.checked_sub(b).ok_or(LendingError::ArithmeticOverflow)
    }

    /// Safe multiplication with overflow check
    pub fn mul(a: U256, b: U256) -> Result<U256, LendingError> {
        a.checked_mul(b).ok_or(LendingError::ArithmeticOverflow)
    }

    /// Safe division with zero check
    pub fn div(a: U256, b: U256) -> Result<U256, LendingError> {
        if b.is_zero() {
            return Err(LendingError::DivisionByZero);
        }
        Ok(a / b)
    }

    /// `a * b / denominator`, rounded down
    pub fn mul_div(a: U256, b: U256, denominator: U256) -> Result<U256, LendingError> {
        Self::div(Self::mul(a, b)?, denominator)
    }

    /// Returns the minimum of two U256 values
    pub fn min(a: U256, b: U256) -> U256 {
        if a < b { a } else { b }
    }
}

/// Basis-point helpers
pub struct Bps;

impl Bps {
    /// `amount * bps / 10000`, rounded down
    pub fn apply(amount: U256, bps: u32) -> Result<U256, LendingError> {
        SafeMath::mul_div(amount, U256::from(bps), U256::from(BPS))
    }

    /// `amount * (10000 - bps) / 10000`, the floor left after a haircut
    pub fn haircut(amount: U256, bps: u32) -> Result<U256, LendingError> {
        let keep = BPS.checked_sub(bps).ok_or(LendingError::InvalidParameters)?;
        Self::apply(amount, keep)
    }

    /// Converts a basis-point value into WAD precision
    pub fn to_wad(bps: u32) -> U256 {
        U256::from(bps) * U256::from(WAD_PER_BPS)
    }

    /// `part / whole` expressed in basis points, 0 when `whole` is 0
    pub fn ratio(part: U256, whole: U256) -> Result<U256, LendingError> {
        if whole.is_zero() {
            return Ok(U256::zero());
        }
        SafeMath::mul_div(part, U256::from(BPS), whole)
    }
}

/// WAD helpers
pub struct Wad;

impl Wad {
    /// One in WAD precision
    pub fn one() -> U256 {
        U256::from(WAD)
    }

    /// `a * b / 1e18`
    pub fn mul(a: U256, b: U256) -> Result<U256, LendingError> {
        SafeMath::mul_div(a, b, Self::one())
    }

    /// `part / whole` in WAD, 0 when `whole` is 0
    pub fn ratio(part: U256, whole: U256) -> Result<U256, LendingError> {
        if whole.is_zero() {
            return Ok(U256::zero());
        }
        SafeMath::mul_div(part, Self::one(), whole)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_checked_ops_fail_closed() {
        assert!(matches!(
            SafeMath::add(U256::MAX, U256::one()),
            Err(LendingError::ArithmeticOverflow)
        ));
        assert!(matches!(
            SafeMath::sub(U256::zero(), U256::one()),
            Err(LendingError::ArithmeticOverflow)
        ));
        assert!(matches!(
            SafeMath::mul(U256::MAX, U256::from(2)),
            Err(LendingError::ArithmeticOverflow)
        ));
        assert!(matches!(
            SafeMath::div(U256::one(), U256::zero()),
            Err(LendingError::DivisionByZero)
        ));
    }

    #[test]
    fn test_bps_haircut() {
        // 200 with 1% slippage keeps 198
        let floor = Bps::haircut(U256::from(200), 100).unwrap();
        assert_eq!(floor, U256::from(198));
        // 70% of 198 rounds down to 138
        assert_eq!(Bps::apply(floor, 7000).unwrap(), U256::from(138));
        assert!(matches!(
            Bps::haircut(U256::from(200), 10_001),
            Err(LendingError::InvalidParameters)
        ));
    }

    #[test]
    fn test_ratios() {
        assert_eq!(Bps::ratio(U256::from(600), U256::from(1000)).unwrap(), U256::from(6000));
        assert_eq!(Bps::ratio(U256::from(600), U256::zero()).unwrap(), U256::zero());
        assert_eq!(
            Wad::ratio(U256::from(1), U256::from(2)).unwrap(),
            U256::from(WAD / 2)
        );
        assert_eq!(Bps::to_wad(BPS), Wad::one());
    }
}
