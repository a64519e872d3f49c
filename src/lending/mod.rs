//! Unified-liquidity lending protocol
//!
//! One `LiquidityLedger` pools base asset from lenders, who hold
//! `ExchangeRateToken` receipts that appreciate as interest is paid.
//! Any number of `CollateralVault`s, each for one collateral asset and with
//! its own risk parameters, borrow from the same pool for their borrowers.
//!
//! Every contract stores `STORAGE_VERSION` at init. A new release that
//! changes a stored record bumps the version and ships alongside a migration
//! that rewrites the old records; contracts never reinterpret records of a
//! different version.

pub mod access;
pub mod errors;
pub mod events;
pub mod interest_rate;
pub mod ledger;
pub mod liquidation;
pub mod pre_launch;
pub mod price_oracle;
pub mod receipt_token;
pub mod swap_venue;
pub mod vault;


pub use access::AdminConfig;
pub use errors::LendingError;
pub use events::*;
pub use interest_rate::RateCurve;
pub use ledger::LiquidityLedger;
pub use liquidation::{LiquidationPlan, LiquidationShares};
pub use price_oracle::PriceOracle;
pub use receipt_token::ExchangeRateToken;
pub use swap_venue::OracleSwapVenue;
pub use vault::CollateralVault;

/// Layout version of every record stored by the lending contracts
pub const STORAGE_VERSION: u32 = 1;
