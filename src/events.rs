//! Event definitions shared by the CEP-18 token implementations
use odra::prelude::*;
use odra::casper_types::U256;

/// Event emitted on token transfers, mints and burns
#[odra::event]
pub struct Transfer {
    /// Sender address
    pub from: Address,
    /// Recipient address
    pub to: Address,
    /// Amount transferred
    pub value: U256,
}

/// Event emitted when an allowance is set
#[odra::event]
pub struct Approval {
    /// Token owner
    pub owner: Address,
    /// Approved spender
    pub spender: Address,
    /// Approved amount
    pub value: U256,
}
