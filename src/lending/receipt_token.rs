//! Exchange Rate Token - interest-bearing receipt for ledger deposits
//!
//! A CEP-18 token whose units redeem for a growing amount of base asset:
//! `exchange_rate = total_underlying * 1e18 / total_supply`.
//!
//! The token only does the accounting. Base asset is custodied by the
//! liquidity ledger, which is the only address allowed to mint, burn or move
//! `total_underlying`. Lender yield raises the rate; nothing but a
//! redemption's rounding or a socialized bad-debt loss ever lowers it.

use odra::prelude::*;
use odra::casper_types::U256;
use super::errors::LendingError;
use super::events::*;
use crate::math::{Bps, SafeMath, Wad};
use crate::token::Cep18Core;

/// Redemption fee ceiling (5%)
pub const MAX_REDEMPTION_FEE_BPS: u32 = 500;

/// Receipt token decimals, same as the base asset
pub const RECEIPT_DECIMALS: u8 = 6;

/// Split of a redemption into what the holder gets and what the protocol keeps
#[odra::odra_type]
pub struct RedemptionQuote {
    /// Underlying value of the shares
    pub gross: U256,
    pub fee: U256,
    /// Paid out to the holder
    pub net: U256,
}

/// Shares minted for `amount` of base asset, genesis rate 1.0 on empty supply
///
/// Once a socialized loss has wiped out all underlying, the remaining supply
/// is worthless. The next deposit mints `amount * (supply + 1)` so that all
/// earlier holders together can redeem less than one unit of it.
pub fn shares_for_deposit(
    amount: U256,
    total_supply: U256,
    total_underlying: U256,
) -> Result<U256, LendingError> {
    if total_supply.is_zero() {
        return Ok(amount);
    }
    if total_underlying.is_zero() {
        return SafeMath::mul(amount, SafeMath::add(total_supply, U256::one())?);
    }
    SafeMath::mul_div(amount, total_supply, total_underlying)
}

/// Base asset backing `shares`, rounded down
pub fn underlying_for_shares(
    shares: U256,
    total_supply: U256,
    total_underlying: U256,
) -> Result<U256, LendingError> {
    if total_supply.is_zero() {
        return Ok(U256::zero());
    }
    SafeMath::mul_div(shares, total_underlying, total_supply)
}

/// Exchange rate in WAD, 1e18 while nothing is minted
pub fn exchange_rate(total_underlying: U256, total_supply: U256) -> Result<U256, LendingError> {
    if total_supply.is_zero() {
        return Ok(Wad::one());
    }
    Wad::ratio(total_underlying, total_supply)
}

/// Exchange Rate Token contract
#[odra::module]
pub struct ExchangeRateToken {
    /// Receipt balances and allowances
    token: SubModule<Cep18Core>,
    /// Admin address
    owner: Var<Address>,
    /// Liquidity ledger allowed to mint, burn and accrue
    ledger: Var<Address>,
    /// Base asset backing the supply
    total_underlying: Var<U256>,
    /// Protocol reserve (redemption fees, interest fees) held by the ledger
    protocol_held_balance: Var<U256>,
    /// Lifetime redemption fees
    total_redemption_fees: Var<U256>,
    redemption_fee_bps: Var<u32>,
    storage_version: Var<u32>,
}

#[odra::module]
impl ExchangeRateToken {
    /// Initialize the receipt token, the ledger is wired in afterwards
    pub fn init(&mut self, name: String, symbol: String, redemption_fee_bps: u32) {
        if redemption_fee_bps > MAX_REDEMPTION_FEE_BPS {
            self.env().revert(LendingError::InvalidParameters);
        }
        self.token.init(name, symbol, RECEIPT_DECIMALS);
        self.owner.set(self.env().caller());
        self.total_underlying.set(U256::zero());
        self.protocol_held_balance.set(U256::zero());
        self.total_redemption_fees.set(U256::zero());
        self.redemption_fee_bps.set(redemption_fee_bps);
        self.storage_version.set(super::STORAGE_VERSION);
    }

    // ========================================================================
    // Ledger-only accounting
    // ========================================================================

    /// Mint receipt shares for a deposit of `amount` base asset
    pub fn deposit(&mut self, receiver: Address, amount: U256) -> U256 {
        self.only_ledger();
        if amount.is_zero() {
            self.env().revert(LendingError::InvalidParameters);
        }

        let shares = shares_for_deposit(amount, self.total_supply(), self.total_underlying())
            .unwrap_or_revert(&self.env());
        if shares.is_zero() {
            self.env().revert(LendingError::InvalidParameters);
        }

        let underlying = SafeMath::add(self.total_underlying(), amount).unwrap_or_revert(&self.env());
        self.total_underlying.set(underlying);
        self.token.mint(receiver, shares);
        shares
    }

    /// Burn `shares` of `owner` and book the redemption fee
    pub fn withdraw(&mut self, owner: Address, shares: U256) -> RedemptionQuote {
        self.only_ledger();
        if shares.is_zero() {
            self.env().revert(LendingError::InvalidParameters);
        }
        if self.balance_of(owner) < shares {
            self.env().revert(LendingError::InsufficientBalance);
        }

        let quote = self.quote_withdraw(shares);
        let underlying = SafeMath::sub(self.total_underlying(), quote.gross).unwrap_or_revert(&self.env());
        self.total_underlying.set(underlying);
        self.add_protocol_held(quote.fee);
        let fees = SafeMath::add(self.total_redemption_fees(), quote.fee).unwrap_or_revert(&self.env());
        self.total_redemption_fees.set(fees);
        self.token.burn(owner, shares);

        self.env().emit_event(Redeemed {
            owner,
            shares,
            gross: quote.gross,
            fee: quote.fee,
            net: quote.net,
        });
        quote
    }

    /// Lender yield, raises the exchange rate
    pub fn accrue_yield(&mut self, amount: U256) {
        self.only_ledger();
        if amount.is_zero() {
            return;
        }
        let underlying = SafeMath::add(self.total_underlying(), amount).unwrap_or_revert(&self.env());
        self.total_underlying.set(underlying);
        self.env().emit_event(YieldAccrued {
            amount,
            exchange_rate: self.exchange_rate(),
        });
    }

    pub fn credit_protocol_fees(&mut self, amount: U256) {
        self.only_ledger();
        self.add_protocol_held(amount);
    }

    pub fn debit_protocol_fees(&mut self, amount: U256) {
        self.only_ledger();
        let held = self.protocol_held_balance();
        if amount > held {
            self.env().revert(LendingError::InsufficientBalance);
        }
        self.protocol_held_balance.set(held - amount);
    }

    /// Socializes a bad-debt loss the protocol reserve could not cover
    pub fn absorb_loss(&mut self, amount: U256) {
        self.only_ledger();
        if amount.is_zero() {
            return;
        }
        let underlying = self.total_underlying();
        if amount > underlying {
            self.env().revert(LendingError::InsufficientUnderlying);
        }
        self.total_underlying.set(underlying - amount);
        self.env().emit_event(LossAbsorbed {
            amount,
            exchange_rate: self.exchange_rate(),
        });
    }

    // ========================================================================
    // Exchange rate views
    // ========================================================================

    /// Base asset per receipt unit (WAD)
    pub fn exchange_rate(&self) -> U256 {
        exchange_rate(self.total_underlying(), self.total_supply()).unwrap_or_revert(&self.env())
    }

    pub fn to_underlying(&self, shares: U256) -> U256 {
        underlying_for_shares(shares, self.total_supply(), self.total_underlying())
            .unwrap_or_revert(&self.env())
    }

    pub fn to_shares(&self, amount: U256) -> U256 {
        shares_for_deposit(amount, self.total_supply(), self.total_underlying())
            .unwrap_or_revert(&self.env())
    }

    /// Preview of a redemption at the current rate and fee
    pub fn quote_withdraw(&self, shares: U256) -> RedemptionQuote {
        if shares > self.total_supply() {
            self.env().revert(LendingError::InsufficientBalance);
        }
        let gross = self.to_underlying(shares);
        let fee = Bps::apply(gross, self.redemption_fee_bps()).unwrap_or_revert(&self.env());
        RedemptionQuote {
            gross,
            fee,
            net: gross - fee,
        }
    }

    pub fn total_underlying(&self) -> U256 {
        self.total_underlying.get_or_default()
    }

    pub fn protocol_held_balance(&self) -> U256 {
        self.protocol_held_balance.get_or_default()
    }

    pub fn total_redemption_fees(&self) -> U256 {
        self.total_redemption_fees.get_or_default()
    }

    pub fn redemption_fee_bps(&self) -> u32 {
        self.redemption_fee_bps.get_or_default()
    }

    pub fn get_ledger(&self) -> Option<Address> {
        self.ledger.get()
    }

    pub fn get_owner(&self) -> Address {
        self.owner.get_or_revert_with(LendingError::NotConfigured)
    }

    pub fn storage_version(&self) -> u32 {
        self.storage_version.get_or_default()
    }

    // ========================================================================
    // CEP-18
    // ========================================================================

    pub fn name(&self) -> String {
        self.token.name()
    }

    pub fn symbol(&self) -> String {
        self.token.symbol()
    }

    pub fn decimals(&self) -> u8 {
        self.token.decimals()
    }

    pub fn total_supply(&self) -> U256 {
        self.token.total_supply()
    }

    pub fn balance_of(&self, owner: Address) -> U256 {
        self.token.balance_of(owner)
    }

    pub fn allowance(&self, owner: Address, spender: Address) -> U256 {
        self.token.allowance(owner, spender)
    }

    pub fn transfer(&mut self, to: Address, amount: U256) -> bool {
        self.token.transfer(to, amount)
    }

    pub fn approve(&mut self, spender: Address, amount: U256) -> bool {
        self.token.approve(spender, amount)
    }

    pub fn transfer_from(&mut self, from: Address, to: Address, amount: U256) -> bool {
        self.token.transfer_from(from, to, amount)
    }

    // ========================================================================
    // Admin
    // ========================================================================

    /// Wires the ledger in, can only happen once
    pub fn set_ledger(&mut self, ledger: Address) {
        self.only_owner();
        if self.ledger.get().is_some() {
            self.env().revert(LendingError::AlreadyRegistered);
        }
        self.ledger.set(ledger);
        self.env().emit_event(ConfigUpdated {
            parameter: String::from("ledger"),
        });
    }

    pub fn set_redemption_fee_bps(&mut self, bps: u32) {
        self.only_owner();
        if bps > MAX_REDEMPTION_FEE_BPS {
            self.env().revert(LendingError::InvalidParameters);
        }
        self.redemption_fee_bps.set(bps);
        self.env().emit_event(ConfigUpdated {
            parameter: String::from("redemption_fee_bps"),
        });
    }

    pub fn transfer_ownership(&mut self, new_owner: Address) {
        self.only_owner();
        let previous_owner = self.get_owner();
        self.owner.set(new_owner);
        self.env().emit_event(OwnershipTransferred {
            previous_owner,
            new_owner,
        });
    }

    fn add_protocol_held(&mut self, amount: U256) {
        let held = SafeMath::add(self.protocol_held_balance(), amount).unwrap_or_revert(&self.env());
        self.protocol_held_balance.set(held);
    }

    fn only_ledger(&self) {
        let ledger = self.ledger.get_or_revert_with(LendingError::NotConfigured);
        if self.env().caller() != ledger {
            self.env().revert(LendingError::Unauthorized);
        }
    }

    fn only_owner(&self) {
        if self.env().caller() != self.get_owner() {
            self.env().revert(LendingError::Unauthorized);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use odra::host::{Deployer, HostEnv};

    fn u(value: u64) -> U256 {
        U256::from(value)
    }

    /// Account 9 stands in for the ledger
    fn setup(fee_bps: u32) -> (HostEnv, ExchangeRateTokenHostRef, Address) {
        let env = odra_test::env();
        let mut token = ExchangeRateToken::deploy(
            &env,
            ExchangeRateTokenInitArgs {
                name: String::from("Lending Receipt"),
                symbol: String::from("lRCPT"),
                redemption_fee_bps: fee_bps,
            },
        );
        let ledger = env.get_account(9);
        token.set_ledger(ledger);
        (env, token, ledger)
    }

    #[test]
    fn test_share_math() {
        assert_eq!(shares_for_deposit(u(500), U256::zero(), U256::zero()).unwrap(), u(500));
        assert_eq!(shares_for_deposit(u(110), u(100), u(110)).unwrap(), u(100));
        assert_eq!(shares_for_deposit(u(10), u(100), U256::zero()).unwrap(), u(1010));
        assert_eq!(underlying_for_shares(u(50), u(100), u(110)).unwrap(), u(55));
        assert_eq!(exchange_rate(U256::zero(), U256::zero()).unwrap(), Wad::one());
    }

    #[test]
    fn test_genesis_deposit_mints_one_to_one() {
        let (env, mut token, ledger) = setup(0);
        let user = env.get_account(1);
        env.set_caller(ledger);
        let shares = token.deposit(user, u(1_000_000));
        assert_eq!(shares, u(1_000_000));
        assert_eq!(token.balance_of(user), u(1_000_000));
        assert_eq!(token.exchange_rate(), Wad::one());
        assert_eq!(token.decimals(), RECEIPT_DECIMALS);
    }

    #[test]
    fn test_only_ledger_mutates() {
        let (env, mut token, _) = setup(0);
        let user = env.get_account(1);
        env.set_caller(user);
        assert_eq!(token.try_deposit(user, u(100)), Err(LendingError::Unauthorized.into()));
        assert_eq!(token.try_accrue_yield(u(100)), Err(LendingError::Unauthorized.into()));
    }

    #[test]
    fn test_set_ledger_once() {
        let (env, mut token, _) = setup(0);
        env.set_caller(env.get_account(0));
        assert_eq!(
            token.try_set_ledger(env.get_account(2)),
            Err(LendingError::AlreadyRegistered.into())
        );
    }

    #[test]
    fn test_yield_raises_rate_and_later_deposits_get_fewer_shares() {
        let (env, mut token, ledger) = setup(0);
        let (alice, bob) = (env.get_account(1), env.get_account(2));
        env.set_caller(ledger);
        token.deposit(alice, u(1000));
        let before = token.exchange_rate();
        token.accrue_yield(u(100));
        assert!(token.exchange_rate() > before);

        let shares = token.deposit(bob, u(110));
        assert_eq!(shares, u(100));
        assert_eq!(token.to_underlying(u(1000)), u(1100));
    }

    #[test]
    fn test_redemption_fee_goes_to_protocol() {
        let (env, mut token, ledger) = setup(100);
        let alice = env.get_account(1);
        env.set_caller(ledger);
        token.deposit(alice, u(10_000));

        let quote = token.withdraw(alice, u(10_000));
        assert_eq!(quote.gross, u(10_000));
        assert_eq!(quote.fee, u(100));
        assert_eq!(quote.net, u(9_900));
        assert_eq!(token.protocol_held_balance(), u(100));
        assert_eq!(token.total_redemption_fees(), u(100));
        assert_eq!(token.total_underlying(), U256::zero());
        assert_eq!(token.total_supply(), U256::zero());
    }

    #[test]
    fn test_withdraw_more_than_balance_fails() {
        let (env, mut token, ledger) = setup(0);
        let alice = env.get_account(1);
        env.set_caller(ledger);
        token.deposit(alice, u(100));
        assert_eq!(
            token.try_withdraw(alice, u(101)),
            Err(LendingError::InsufficientBalance.into())
        );
    }

    #[test]
    fn test_fee_ceiling() {
        let (env, mut token, _) = setup(0);
        env.set_caller(env.get_account(0));
        assert_eq!(
            token.try_set_redemption_fee_bps(MAX_REDEMPTION_FEE_BPS + 1),
            Err(LendingError::InvalidParameters.into())
        );
        token.set_redemption_fee_bps(MAX_REDEMPTION_FEE_BPS);
        assert_eq!(token.redemption_fee_bps(), MAX_REDEMPTION_FEE_BPS);
    }

    #[test]
    fn test_absorb_loss_lowers_rate() {
        let (env, mut token, ledger) = setup(0);
        env.set_caller(ledger);
        token.deposit(env.get_account(1), u(1000));
        token.absorb_loss(u(100));
        assert_eq!(token.to_underlying(u(1000)), u(900));
    }

    #[test]
    fn test_deposit_after_total_loss_restarts_the_rate() {
        let (env, mut token, ledger) = setup(0);
        let (alice, bob) = (env.get_account(1), env.get_account(2));
        env.set_caller(ledger);
        token.deposit(alice, u(1000));
        token.absorb_loss(u(1000));
        assert_eq!(token.exchange_rate(), U256::zero());

        let shares = token.deposit(bob, u(500));
        assert_eq!(shares, u(500_500));
        assert_eq!(token.total_underlying(), u(500));
        // alice's old receipts are worth less than one unit
        assert_eq!(token.to_underlying(u(1000)), U256::zero());
        // 500500 * 500 / 501500
        assert_eq!(token.to_underlying(shares), u(499));
    }
}
