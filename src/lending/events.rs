//! Events for the Lending Protocol

use odra::prelude::*;
use odra::casper_types::U256;

// ============================================================================
// Deposit/Withdrawal Events
// ============================================================================

/// Event emitted when base asset is deposited into the ledger
#[odra::event]
pub struct Deposited {
    /// Address that deposited
    pub user: Address,
    /// Amount of base asset deposited
    pub amount: U256,
    /// Receipt shares minted
    pub shares: U256,
    pub timestamp: u64,
}

/// Event emitted when receipt shares are redeemed through the ledger
#[odra::event]
pub struct Withdrawn {
    /// Address that withdrew
    pub user: Address,
    /// Base asset paid out after the redemption fee
    pub amount: U256,
    /// Receipt shares burned
    pub shares: U256,
    /// Redemption fee kept by the protocol
    pub fee: U256,
    pub timestamp: u64,
}

// ============================================================================
// Exchange Rate Events
// ============================================================================

/// Event emitted when lender yield raises the exchange rate
#[odra::event]
pub struct YieldAccrued {
    pub amount: U256,
    /// Exchange rate after accrual (WAD)
    pub exchange_rate: U256,
}

/// Event emitted when receipt shares are burned for base asset
#[odra::event]
pub struct Redeemed {
    pub owner: Address,
    pub shares: U256,
    pub gross: U256,
    pub fee: U256,
    pub net: U256,
}

/// Event emitted when a bad-debt shortfall is socialized across lenders
#[odra::event]
pub struct LossAbsorbed {
    pub amount: U256,
    pub exchange_rate: U256,
}

// ============================================================================
// Ledger Events
// ============================================================================

#[odra::event]
pub struct VaultRegistered {
    pub vault: Address,
    pub lender_share_bps: u32,
    pub vault_fee_bps: u32,
    pub protocol_fee_bps: u32,
}

#[odra::event]
pub struct VaultStatusUpdated {
    pub vault: Address,
    pub active: bool,
}

/// Event emitted when a vault draws liquidity for a borrower
#[odra::event]
pub struct LiquidityBorrowed {
    pub vault: Address,
    pub recipient: Address,
    pub amount: U256,
    pub total_borrowed: U256,
}

/// Event emitted when a vault returns principal
#[odra::event]
pub struct LiquidityRepaid {
    pub vault: Address,
    pub amount: U256,
    pub total_borrowed: U256,
}

/// Event emitted when interest collected by a vault is split
#[odra::event]
pub struct InterestSettled {
    pub vault: Address,
    pub interest: U256,
    pub lender_share: U256,
    pub vault_fee: U256,
    pub protocol_fee: U256,
}

/// Event emitted when a liquidation shortfall is reconciled
#[odra::event]
pub struct ShortfallWrittenOff {
    pub vault: Address,
    pub amount: U256,
    /// Part covered by the protocol reserve
    pub from_reserve: U256,
    /// Part taken out of lender deposits
    pub socialized: U256,
}

#[odra::event]
pub struct VaultFeesClaimed {
    pub vault: Address,
    pub recipient: Address,
    pub amount: U256,
}

#[odra::event]
pub struct ProtocolFeesWithdrawn {
    pub recipient: Address,
    pub amount: U256,
}

// ============================================================================
// Pre-launch Events
// ============================================================================

#[odra::event]
pub struct PreLaunchDeposited {
    pub depositor: Address,
    pub amount: U256,
    /// Depositor's queued total after this deposit
    pub queued: U256,
}

#[odra::event]
pub struct PreLaunchWithdrawn {
    pub depositor: Address,
    pub amount: U256,
    pub queued: U256,
}

#[odra::event]
pub struct LaunchActivated {
    pub timestamp: u64,
}

#[odra::event]
pub struct PreLaunchProcessed {
    pub depositor: Address,
    pub amount: U256,
    pub shares: U256,
    /// Returned instead of converted
    pub refunded: U256,
}

// ============================================================================
// Vault Events
// ============================================================================

/// Event emitted when a borrower opens or extends a position
#[odra::event]
pub struct Borrowed {
    pub borrower: Address,
    /// Collateral posted with this borrow
    pub collateral_amount: U256,
    pub amount: U256,
    /// Debt after the borrow
    pub total_debt: U256,
    pub timestamp: u64,
}

#[odra::event]
pub struct Repaid {
    pub borrower: Address,
    pub amount: U256,
    pub interest: U256,
    pub principal: U256,
    /// Position cleared and collateral returned
    pub closed: bool,
}

#[odra::event]
pub struct CollateralAdded {
    pub borrower: Address,
    pub amount: U256,
}

#[odra::event]
pub struct CollateralWithdrawn {
    pub borrower: Address,
    pub amount: U256,
}

/// Event emitted when a position is liquidated
#[odra::event]
pub struct Liquidated {
    pub borrower: Address,
    pub liquidator: Address,
    pub collateral_sold: U256,
    pub proceeds: U256,
    pub debt_repaid: U256,
    pub shortfall: U256,
    pub penalty: U256,
    pub borrower_refund: U256,
}

// ============================================================================
// Oracle Events
// ============================================================================

#[odra::event]
pub struct PriceUpdated {
    pub asset: Address,
    pub price: U256,
    pub timestamp: u64,
}

// ============================================================================
// Admin Events
// ============================================================================

/// Event emitted when an owner-gated parameter changes
#[odra::event]
pub struct ConfigUpdated {
    pub parameter: String,
}

#[odra::event]
pub struct PauseFlagsUpdated {
    pub borrowing_paused: bool,
    pub liquidations_paused: bool,
    pub emergency_mode: bool,
}

#[odra::event]
pub struct OwnershipTransferred {
    pub previous_owner: Address,
    pub new_owner: Address,
}
