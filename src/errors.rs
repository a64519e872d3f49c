//! Error definitions for the CEP-18 faucet token
use odra::prelude::*;

/// Custom errors for the faucet token contract
#[odra::odra_error]
pub enum TokenError {
    /// Insufficient allowance for transfer
    InsufficientAllowance = 100,

    /// Insufficient balance for operation
    InsufficientBalance = 101,

    /// Supply overflow
    Overflow = 102,
}
