//! Swap venue used to sell seized collateral
//!
//! Vaults only depend on the `SwapVenue` interface. `OracleSwapVenue` fills
//! swaps from its own inventory at the oracle value minus a configurable
//! haircut, which makes slippage scenarios reproducible locally.

use odra::prelude::*;
use odra::casper_types::U256;
use odra::ContractRef;
use super::errors::LendingError;
use super::events::ConfigUpdated;
use super::price_oracle::CollateralOracleContractRef;
use crate::math::{Bps, BPS};
use crate::token::Cep18TokenContractRef;

/// Interface consumed by collateral vaults
#[odra::external_contract]
pub trait SwapVenue {
    /// Sells `amount_in` of `asset_in` pulled from the caller, pays `asset_out` to the caller
    fn swap(
        &mut self,
        asset_in: Address,
        asset_out: Address,
        amount_in: U256,
        min_amount_out: U256,
    ) -> U256;
}

/// Oracle-priced swap venue
#[odra::module]
pub struct OracleSwapVenue {
    /// Oracle pricing `asset_in` in `asset_out` units
    oracle: Var<Address>,
    /// Discount applied to the oracle value
    haircut_bps: Var<u32>,
    /// When off, fills below `min_amount_out` go through
    enforce_min_out: Var<bool>,
    admin: Var<Address>,
}

#[odra::module]
impl OracleSwapVenue {
    pub fn init(&mut self, oracle: Address, haircut_bps: u32) {
        if haircut_bps > BPS {
            self.env().revert(LendingError::InvalidParameters);
        }
        self.oracle.set(oracle);
        self.haircut_bps.set(haircut_bps);
        self.enforce_min_out.set(true);
        self.admin.set(self.env().caller());
    }

    pub fn swap(
        &mut self,
        asset_in: Address,
        asset_out: Address,
        amount_in: U256,
        min_amount_out: U256,
    ) -> U256 {
        if amount_in.is_zero() {
            self.env().revert(LendingError::InvalidParameters);
        }
        let amount_out = self.quote(asset_in, amount_in);
        if self.enforce_min_out.get_or_default() && amount_out < min_amount_out {
            self.env().revert(LendingError::SlippageExceeded);
        }

        let caller = self.env().caller();
        let venue = self.env().self_address();
        Cep18TokenContractRef::new(self.env(), asset_in).transfer_from(caller, venue, amount_in);
        Cep18TokenContractRef::new(self.env(), asset_out).transfer(caller, amount_out);
        amount_out
    }

    /// Fill size for `amount_in` at the current oracle price
    pub fn quote(&self, asset_in: Address, amount_in: U256) -> U256 {
        let oracle = self.oracle.get_or_revert_with(LendingError::NotConfigured);
        let value = CollateralOracleContractRef::new(self.env(), oracle).valuate(asset_in, amount_in);
        Bps::haircut(value, self.haircut_bps.get_or_default()).unwrap_or_revert(&self.env())
    }

    pub fn set_haircut_bps(&mut self, haircut_bps: u32) {
        self.only_admin();
        if haircut_bps > BPS {
            self.env().revert(LendingError::InvalidParameters);
        }
        self.haircut_bps.set(haircut_bps);
        self.env().emit_event(ConfigUpdated {
            parameter: String::from("haircut_bps"),
        });
    }

    pub fn set_enforce_min_out(&mut self, enforce: bool) {
        self.only_admin();
        self.enforce_min_out.set(enforce);
    }

    pub fn haircut_bps(&self) -> u32 {
        self.haircut_bps.get_or_default()
    }

    fn only_admin(&self) {
        let admin = self.admin.get_or_revert_with(LendingError::Unauthorized);
        if self.env().caller() != admin {
            self.env().revert(LendingError::Unauthorized);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lending::price_oracle::{PriceOracle, PriceOracleInitArgs};
    use crate::math::WAD;
    use crate::token::{FaucetToken, FaucetTokenHostRef, FaucetTokenInitArgs};
    use odra::host::{Deployer, HostEnv};

    struct Setup {
        env: HostEnv,
        venue: OracleSwapVenueHostRef,
        collateral: FaucetTokenHostRef,
        base: FaucetTokenHostRef,
    }

    fn token(env: &HostEnv, symbol: &str) -> FaucetTokenHostRef {
        FaucetToken::deploy(
            env,
            FaucetTokenInitArgs {
                name: String::from(symbol),
                symbol: String::from(symbol),
                decimals: 6,
            },
        )
    }

    fn setup(haircut_bps: u32) -> Setup {
        let env = odra_test::env();
        let base = token(&env, "USDC");
        let collateral = token(&env, "WETH");
        let mut oracle = PriceOracle::deploy(&env, PriceOracleInitArgs { max_staleness: u64::MAX });
        oracle.set_price(collateral.address(), U256::from(2 * WAD));
        let venue = OracleSwapVenue::deploy(
            &env,
            OracleSwapVenueInitArgs {
                oracle: oracle.address(),
                haircut_bps,
            },
        );
        let mut base = base;
        base.mint(venue.address(), U256::from(1_000_000));
        Setup {
            env,
            venue,
            collateral,
            base,
        }
    }

    #[test]
    fn test_swap_at_oracle_value_minus_haircut() {
        let Setup { env, mut venue, mut collateral, base } = setup(100);
        let seller = env.get_account(1);
        collateral.mint(seller, U256::from(100));

        env.set_caller(seller);
        collateral.approve(venue.address(), U256::from(100));
        let out = venue.swap(collateral.address(), base.address(), U256::from(100), U256::from(198));
        assert_eq!(out, U256::from(198));
        assert_eq!(base.balance_of(seller), U256::from(198));
        assert_eq!(collateral.balance_of(venue.address()), U256::from(100));
    }

    #[test]
    fn test_min_out_enforced_unless_disabled() {
        let Setup { env, mut venue, mut collateral, base } = setup(500);
        let seller = env.get_account(1);
        collateral.mint(seller, U256::from(100));

        env.set_caller(seller);
        collateral.approve(venue.address(), U256::from(100));
        assert_eq!(
            venue.try_swap(collateral.address(), base.address(), U256::from(100), U256::from(198)),
            Err(LendingError::SlippageExceeded.into())
        );

        env.set_caller(env.get_account(0));
        venue.set_enforce_min_out(false);
        env.set_caller(seller);
        let out = venue.swap(collateral.address(), base.address(), U256::from(100), U256::from(198));
        assert_eq!(out, U256::from(190));
    }
}
