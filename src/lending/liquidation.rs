//! Liquidation waterfall - how the proceeds of a collateral sale are split
//!
//! Proceeds settle the position in a fixed order:
//! 1. accrued interest
//! 2. borrowed principal (any shortfall is written off on the ledger)
//! 3. liquidation penalty, capped by what is left, split vault / protocol / lenders
//! 4. the remainder goes back to the borrower
//!
//! Unpaid interest was never booked on the ledger, so only a principal
//! shortfall needs reconciling.

use odra::prelude::*;
use odra::casper_types::U256;
use super::errors::LendingError;
use crate::math::{Bps, SafeMath, BPS};

/// How the liquidation penalty is divided, in basis points of the penalty
#[odra::odra_type]
pub struct LiquidationShares {
    pub vault_bps: u32,
    pub protocol_bps: u32,
    pub lender_bps: u32,
}

impl LiquidationShares {
    pub fn new(vault_bps: u32, protocol_bps: u32, lender_bps: u32) -> Self {
        Self {
            vault_bps,
            protocol_bps,
            lender_bps,
        }
    }

    /// Shares must add up to exactly 100%
    pub fn validate(&self) -> Result<(), LendingError> {
        let total = self
            .vault_bps
            .checked_add(self.protocol_bps)
            .and_then(|sum| sum.checked_add(self.lender_bps))
            .ok_or(LendingError::InvalidParameters)?;
        if total != BPS {
            return Err(LendingError::InvalidParameters);
        }
        Ok(())
    }
}

/// Settlement of a single liquidation
#[odra::odra_type]
pub struct LiquidationPlan {
    /// Base asset realized by the swap
    pub proceeds: U256,
    pub interest_paid: U256,
    pub principal_paid: U256,
    /// Principal the proceeds could not cover
    pub shortfall: U256,
    pub penalty: U256,
    pub vault_fee: U256,
    pub protocol_fee: U256,
    /// Lender share of the penalty, carries the rounding remainder
    pub lender_fee: U256,
    pub borrower_refund: U256,
}

impl LiquidationPlan {
    /// Splits `proceeds` against the position's debt
    pub fn compute(
        proceeds: U256,
        accrued_interest: U256,
        principal: U256,
        penalty_bps: u32,
        shares: &LiquidationShares,
    ) -> Result<Self, LendingError> {
        let interest_paid = SafeMath::min(proceeds, accrued_interest);
        let remaining = SafeMath::sub(proceeds, interest_paid)?;

        let principal_paid = SafeMath::min(remaining, principal);
        let shortfall = SafeMath::sub(principal, principal_paid)?;
        let surplus = SafeMath::sub(remaining, principal_paid)?;

        let penalty = SafeMath::min(surplus, Bps::apply(proceeds, penalty_bps)?);
        let vault_fee = Bps::apply(penalty, shares.vault_bps)?;
        let protocol_fee = Bps::apply(penalty, shares.protocol_bps)?;
        let lender_fee = SafeMath::sub(penalty, SafeMath::add(vault_fee, protocol_fee)?)?;
        let borrower_refund = SafeMath::sub(surplus, penalty)?;

        Ok(Self {
            proceeds,
            interest_paid,
            principal_paid,
            shortfall,
            penalty,
            vault_fee,
            protocol_fee,
            lender_fee,
            borrower_refund,
        })
    }

    /// Total debt the sale settled
    pub fn debt_repaid(&self) -> U256 {
        self.interest_paid + self.principal_paid
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn shares() -> LiquidationShares {
        LiquidationShares::new(4000, 2000, 4000)
    }

    fn u(value: u64) -> U256 {
        U256::from(value)
    }

    fn accounted(plan: &LiquidationPlan) -> U256 {
        plan.interest_paid + plan.principal_paid + plan.penalty + plan.borrower_refund
    }

    #[test]
    fn test_surplus_pays_penalty_and_refund() {
        // 1000 proceeds, 50 interest, 700 principal, 5% penalty
        let plan = LiquidationPlan::compute(u(1000), u(50), u(700), 500, &shares()).unwrap();
        assert_eq!(plan.interest_paid, u(50));
        assert_eq!(plan.principal_paid, u(700));
        assert_eq!(plan.shortfall, U256::zero());
        assert_eq!(plan.penalty, u(50));
        assert_eq!(plan.vault_fee, u(20));
        assert_eq!(plan.protocol_fee, u(10));
        assert_eq!(plan.lender_fee, u(20));
        assert_eq!(plan.borrower_refund, u(200));
        assert_eq!(accounted(&plan), plan.proceeds);
        assert_eq!(plan.debt_repaid(), u(750));
    }

    #[test]
    fn test_penalty_capped_by_surplus() {
        let plan = LiquidationPlan::compute(u(760), u(50), u(700), 500, &shares()).unwrap();
        assert_eq!(plan.penalty, u(10));
        assert_eq!(plan.borrower_refund, U256::zero());
        assert_eq!(accounted(&plan), plan.proceeds);
    }

    #[test]
    fn test_shortfall_after_interest() {
        let plan = LiquidationPlan::compute(u(600), u(50), u(700), 500, &shares()).unwrap();
        assert_eq!(plan.interest_paid, u(50));
        assert_eq!(plan.principal_paid, u(550));
        assert_eq!(plan.shortfall, u(150));
        assert_eq!(plan.penalty, U256::zero());
        assert_eq!(plan.borrower_refund, U256::zero());
    }

    #[test]
    fn test_proceeds_below_interest() {
        let plan = LiquidationPlan::compute(u(30), u(50), u(700), 500, &shares()).unwrap();
        assert_eq!(plan.interest_paid, u(30));
        assert_eq!(plan.principal_paid, U256::zero());
        assert_eq!(plan.shortfall, u(700));
    }

    #[test]
    fn test_rounding_remainder_goes_to_lenders() {
        // penalty of 7 splits 2 / 1 / 4
        let plan = LiquidationPlan::compute(u(140), U256::zero(), u(100), 500, &shares()).unwrap();
        assert_eq!(plan.penalty, u(7));
        assert_eq!(plan.vault_fee, u(2));
        assert_eq!(plan.protocol_fee, u(1));
        assert_eq!(plan.lender_fee, u(4));
        assert_eq!(plan.borrower_refund, u(33));
    }

    #[test]
    fn test_share_validation() {
        assert!(shares().validate().is_ok());
        assert!(matches!(
            LiquidationShares::new(4000, 2000, 3000).validate(),
            Err(LendingError::InvalidParameters)
        ));
        assert!(matches!(
            LiquidationShares::new(u32::MAX, 2, 0).validate(),
            Err(LendingError::InvalidParameters)
        ));
    }
}
