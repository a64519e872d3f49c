//! Price Oracle - Provides collateral valuations in base asset units
//!
//! Vaults only depend on the `CollateralOracle` interface. `PriceOracle` is
//! the admin-fed implementation used by local deployments and tests.

use odra::prelude::*;
use odra::casper_types::U256;
use super::errors::LendingError;
use super::events::PriceUpdated;
use crate::math::{SafeMath, Wad};

/// Valuation interface consumed by collateral vaults
#[odra::external_contract]
pub trait CollateralOracle {
    /// Value of `amount` of `asset`, in base asset units
    fn valuate(&self, asset: Address, amount: U256) -> U256;
}

/// Price feed data for an asset
#[odra::odra_type]
pub struct PriceFeed {
    /// Asset address
    pub asset: Address,
    /// Base asset units per asset unit (scaled by 1e18)
    /// Example: 1 collateral unit = 2 base units means price = 2 * 1e18
    pub price: U256,
    /// Timestamp of last update
    pub last_update: u64,
    /// Whether the feed is active
    pub is_active: bool,
}

/// Price Oracle contract
#[odra::module]
pub struct PriceOracle {
    /// Price feeds for each asset
    price_feeds: Mapping<Address, PriceFeed>,

    /// Admin address
    admin: Var<Address>,

    /// Maximum price staleness (in milliseconds)
    max_staleness: Var<u64>,
}

#[odra::module]
impl PriceOracle {
    /// Initialize the price oracle
    pub fn init(&mut self, max_staleness: u64) {
        let caller = self.env().caller();
        self.admin.set(caller);
        self.max_staleness.set(max_staleness);
    }

    /// Set price for an asset (admin only)
    ///
    /// # Arguments
    /// * `asset` - Asset address
    /// * `price` - Base asset units per asset unit (scaled by 1e18)
    pub fn set_price(&mut self, asset: Address, price: U256) {
        self.only_admin();

        if price.is_zero() {
            self.env().revert(LendingError::InvalidPrice);
        }

        let timestamp = self.env().get_block_time();
        let feed = PriceFeed {
            asset,
            price,
            last_update: timestamp,
            is_active: true,
        };

        self.price_feeds.set(&asset, feed);
        self.env().emit_event(PriceUpdated {
            asset,
            price,
            timestamp,
        });
    }

    /// Get price for an asset, rejects disabled and stale feeds
    pub fn get_price(&self, asset: Address) -> U256 {
        let feed = self.feed(asset);

        if !feed.is_active {
            self.env().revert(LendingError::PriceFeedNotAvailable);
        }

        let current_time = self.env().get_block_time();
        let max_staleness = self.max_staleness.get_or_default();

        if current_time.saturating_sub(feed.last_update) > max_staleness {
            self.env().revert(LendingError::InvalidPrice);
        }

        feed.price
    }

    /// Value of `amount` of `asset` in base asset units
    pub fn valuate(&self, asset: Address, amount: U256) -> U256 {
        let price = self.get_price(asset);
        Wad::mul(amount, price).unwrap_or_revert(&self.env())
    }

    /// Amount of `asset` worth `value` base asset units
    pub fn get_asset_amount(&self, asset: Address, value: U256) -> U256 {
        let price = self.get_price(asset);
        SafeMath::mul_div(value, Wad::one(), price).unwrap_or_revert(&self.env())
    }

    pub fn get_feed(&self, asset: Address) -> Option<PriceFeed> {
        self.price_feeds.get(&asset)
    }

    /// Disable a price feed (admin only)
    pub fn disable_feed(&mut self, asset: Address) {
        self.set_feed_active(asset, false);
    }

    /// Enable a price feed (admin only)
    pub fn enable_feed(&mut self, asset: Address) {
        self.set_feed_active(asset, true);
    }

    /// Update max staleness period (admin only)
    pub fn set_max_staleness(&mut self, millis: u64) {
        self.only_admin();
        self.max_staleness.set(millis);
    }

    pub fn get_max_staleness(&self) -> u64 {
        self.max_staleness.get_or_default()
    }

    /// Get admin address
    pub fn get_admin(&self) -> Address {
        self.admin.get_or_revert_with(LendingError::Unauthorized)
    }

    fn set_feed_active(&mut self, asset: Address, active: bool) {
        self.only_admin();
        let mut feed = self.feed(asset);
        feed.is_active = active;
        self.price_feeds.set(&asset, feed);
    }

    fn feed(&self, asset: Address) -> PriceFeed {
        self.price_feeds
            .get(&asset)
            .unwrap_or_revert_with(&self.env(), LendingError::PriceFeedNotAvailable)
    }

    /// Check if caller is admin
    fn only_admin(&self) {
        let caller = self.env().caller();
        if caller != self.get_admin() {
            self.env().revert(LendingError::Unauthorized);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::WAD;
    use odra::host::{Deployer, HostEnv};

    const HOUR: u64 = 3_600_000;

    fn setup() -> (HostEnv, PriceOracleHostRef, Address) {
        let env = odra_test::env();
        let oracle = PriceOracle::deploy(&env, PriceOracleInitArgs { max_staleness: HOUR });
        let asset = env.get_account(5);
        (env, oracle, asset)
    }

    #[test]
    fn test_set_and_get_price() {
        let (_, mut oracle, asset) = setup();
        oracle.set_price(asset, U256::from(2 * WAD));
        assert_eq!(oracle.get_price(asset), U256::from(2 * WAD));
        assert_eq!(
            oracle.try_set_price(asset, U256::zero()),
            Err(LendingError::InvalidPrice.into())
        );
    }

    #[test]
    fn test_asset_value_calculation() {
        let (_, mut oracle, asset) = setup();
        oracle.set_price(asset, U256::from(2 * WAD));
        assert_eq!(oracle.valuate(asset, U256::from(100)), U256::from(200));
        assert_eq!(oracle.get_asset_amount(asset, U256::from(200)), U256::from(100));
    }

    #[test]
    fn test_stale_price_rejection() {
        let (env, mut oracle, asset) = setup();
        oracle.set_price(asset, U256::from(WAD));
        env.advance_block_time(HOUR + 1);
        assert_eq!(oracle.try_get_price(asset), Err(LendingError::InvalidPrice.into()));
    }

    #[test]
    fn test_disabled_and_missing_feeds() {
        let (env, mut oracle, asset) = setup();
        assert_eq!(
            oracle.try_get_price(asset),
            Err(LendingError::PriceFeedNotAvailable.into())
        );
        oracle.set_price(asset, U256::from(WAD));
        oracle.disable_feed(asset);
        assert_eq!(
            oracle.try_valuate(asset, U256::one()),
            Err(LendingError::PriceFeedNotAvailable.into())
        );

        env.set_caller(env.get_account(1));
        assert_eq!(oracle.try_enable_feed(asset), Err(LendingError::Unauthorized.into()));
    }
}
