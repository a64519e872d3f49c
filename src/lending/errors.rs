//! Error types for the lending protocol

use odra::prelude::*;

/// Errors that can occur in the ledger, the receipt token and the vaults.
///
/// Every failure reverts the whole call, so a caller only ever observes one
/// of these codes and no partial state.
#[odra::odra_error]
pub enum LendingError {
    // Liquidity Errors
    /// Shared pool cannot fund the requested borrow
    InsufficientLiquidity = 1,
    /// Ledger cannot pay out the redeemed amount
    InsufficientUnderlying = 2,
    /// Withdrawal would push utilization above the configured ceiling
    UtilizationCeilingExceeded = 3,

    // Position Errors
    /// Borrow would exceed the loan-to-value limit
    ExceedsMaxLTV = 4,
    /// Not enough collateral posted for the operation
    InsufficientCollateral = 5,
    /// Borrower has no active position
    NoActivePosition = 6,

    // Liquidation Errors
    /// Position is above the liquidation threshold
    NotLiquidatable = 7,
    /// Swap proceeds fell below the slippage floor
    SlippageExceeded = 8,
    /// Liquidations are paused on this vault
    LiquidationsPaused = 9,

    // Configuration Errors
    /// Parameters out of range or inconsistent
    InvalidParameters = 10,
    /// Vault or ledger already registered
    AlreadyRegistered = 11,
    /// Vault is not registered in the ledger
    VaultNotRegistered = 12,
    /// Contract reference not configured yet
    NotConfigured = 13,

    // Launch Errors
    /// Protocol already launched
    AlreadyLaunched = 14,
    /// Launch time not reached or protocol not launched yet
    TooEarly = 15,
    /// Pre-launch withdrawal larger than the queued amount
    InsufficientQueuedAmount = 16,

    // Access Control Errors
    /// Operation paused
    Paused = 17,
    /// Emergency mode is active
    EmergencyMode = 18,
    /// Caller is not authorized
    Unauthorized = 19,
    /// Reentrant call
    Locked = 20,

    // Balance Errors
    /// Receipt balance too low
    InsufficientBalance = 21,

    // Price Errors
    /// Price feed not available or disabled
    PriceFeedNotAvailable = 22,
    /// Price is zero or stale
    InvalidPrice = 23,

    // Math Errors
    /// Checked arithmetic overflowed or underflowed
    ArithmeticOverflow = 24,
    /// Division by zero
    DivisionByZero = 25,
}
