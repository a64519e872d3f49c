//! CEP-18 token building blocks
//!
//! `Cep18Core` holds balances and allowances and is embedded as a submodule by
//! every token contract in the crate. `FaucetToken` is the open-mint token used
//! as base asset and collateral in local deployments and tests.
use odra::prelude::*;
use odra::casper_types::U256;
use crate::events::{Transfer, Approval};
use crate::errors::TokenError;

/// CEP-18 balances, allowances and metadata
#[odra::module]
pub struct Cep18Core {
    name: Var<String>,
    symbol: Var<String>,
    decimals: Var<u8>,
    total_supply: Var<U256>,
    balances: Mapping<Address, U256>,
    /// (owner, spender) -> remaining allowance
    allowances: Mapping<(Address, Address), U256>,
}

#[odra::module]
impl Cep18Core {
    pub fn init(&mut self, name: String, symbol: String, decimals: u8) {
        self.name.set(name);
        self.symbol.set(symbol);
        self.decimals.set(decimals);
        self.total_supply.set(U256::zero());
    }

    pub fn name(&self) -> String {
        self.name.get_or_default()
    }

    pub fn symbol(&self) -> String {
        self.symbol.get_or_default()
    }

    pub fn decimals(&self) -> u8 {
        self.decimals.get_or_default()
    }

    pub fn total_supply(&self) -> U256 {
        self.total_supply.get_or_default()
    }

    pub fn balance_of(&self, owner: Address) -> U256 {
        self.balances.get(&owner).unwrap_or_default()
    }

    pub fn allowance(&self, owner: Address, spender: Address) -> U256 {
        self.allowances.get(&(owner, spender)).unwrap_or_default()
    }

    pub fn transfer(&mut self, to: Address, amount: U256) -> bool {
        let sender = self.env().caller();
        self.move_balance(sender, to, amount);
        true
    }

    pub fn approve(&mut self, spender: Address, amount: U256) -> bool {
        let owner = self.env().caller();
        self.set_allowance(owner, spender, amount);
        true
    }

    /// Moves `amount` of `from`'s tokens using the caller's allowance
    pub fn transfer_from(&mut self, from: Address, to: Address, amount: U256) -> bool {
        let spender = self.env().caller();
        let remaining = self
            .allowance(from, spender)
            .checked_sub(amount)
            .unwrap_or_revert_with(&self.env(), TokenError::InsufficientAllowance);
        self.set_allowance(from, spender, remaining);
        self.move_balance(from, to, amount);
        true
    }

    /// Access control is up to the embedding contract
    pub fn mint(&mut self, to: Address, amount: U256) {
        let supply = self
            .total_supply()
            .checked_add(amount)
            .unwrap_or_revert_with(&self.env(), TokenError::Overflow);
        self.total_supply.set(supply);
        self.credit(to, amount);
        let issuer = self.env().self_address();
        self.env().emit_event(Transfer {
            from: issuer,
            to,
            value: amount,
        });
    }

    /// Access control is up to the embedding contract
    pub fn burn(&mut self, from: Address, amount: U256) {
        self.debit(from, amount);
        // supply always covers a balance
        let supply = self.total_supply() - amount;
        self.total_supply.set(supply);
        let issuer = self.env().self_address();
        self.env().emit_event(Transfer {
            from,
            to: issuer,
            value: amount,
        });
    }

    fn move_balance(&mut self, from: Address, to: Address, amount: U256) {
        self.debit(from, amount);
        self.credit(to, amount);
        self.env().emit_event(Transfer {
            from,
            to,
            value: amount,
        });
    }

    fn debit(&mut self, owner: Address, amount: U256) {
        let balance = self
            .balance_of(owner)
            .checked_sub(amount)
            .unwrap_or_revert_with(&self.env(), TokenError::InsufficientBalance);
        self.balances.set(&owner, balance);
    }

    fn credit(&mut self, owner: Address, amount: U256) {
        let balance = self
            .balance_of(owner)
            .checked_add(amount)
            .unwrap_or_revert_with(&self.env(), TokenError::Overflow);
        self.balances.set(&owner, balance);
    }

    fn set_allowance(&mut self, owner: Address, spender: Address, amount: U256) {
        self.allowances.set(&(owner, spender), amount);
        self.env().emit_event(Approval {
            owner,
            spender,
            value: amount,
        });
    }
}

/// Open-mint CEP-18 token
#[odra::module]
pub struct FaucetToken {
    token: SubModule<Cep18Core>,
}

#[odra::module]
impl FaucetToken {
    pub fn init(&mut self, name: String, symbol: String, decimals: u8) {
        self.token.init(name, symbol, decimals);
    }

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

    /// Anyone may mint, this token only exists for local deployments
    pub fn mint(&mut self, to: Address, amount: U256) {
        self.token.mint(to, amount);
    }

    /// Burns the caller's own tokens
    pub fn burn(&mut self, amount: U256) {
        let caller = self.env().caller();
        self.token.burn(caller, amount);
    }
}

/// Any CEP-18 token the lending contracts move: base asset, collateral
#[odra::external_contract]
pub trait Cep18Token {
    fn balance_of(&self, owner: Address) -> U256;
    fn allowance(&self, owner: Address, spender: Address) -> U256;
    fn transfer(&mut self, to: Address, amount: U256) -> bool;
    fn transfer_from(&mut self, from: Address, to: Address, amount: U256) -> bool;
    fn approve(&mut self, spender: Address, amount: U256) -> bool;
}

#[cfg(test)]
mod tests {
    use super::*;
    use odra::host::{Deployer, HostEnv};

    fn setup() -> (HostEnv, FaucetTokenHostRef) {
        let env = odra_test::env();
        let init_args = FaucetTokenInitArgs {
            name: String::from("USD Coin"),
            symbol: String::from("USDC"),
            decimals: 6,
        };
        let token = FaucetToken::deploy(&env, init_args);
        (env, token)
    }

    #[test]
    fn test_init() {
        let (_, token) = setup();
        assert_eq!(token.name(), "USD Coin");
        assert_eq!(token.symbol(), "USDC");
        assert_eq!(token.decimals(), 6);
        assert_eq!(token.total_supply(), U256::zero());
    }

    #[test]
    fn test_mint_and_burn() {
        let (env, mut token) = setup();
        let user = env.get_account(1);
        let amount = U256::from(1000);

        token.mint(user, amount);
        assert_eq!(token.balance_of(user), amount);
        assert_eq!(token.total_supply(), amount);

        env.set_caller(user);
        token.burn(amount);
        assert_eq!(token.balance_of(user), U256::zero());
        assert_eq!(token.total_supply(), U256::zero());
    }

    #[test]
    fn test_transfer() {
        let (env, mut token) = setup();
        let user1 = env.get_account(0);
        let user2 = env.get_account(1);
        let amount = U256::from(1000);

        token.mint(user1, amount);

        env.set_caller(user1);
        token.transfer(user2, U256::from(500));

        assert_eq!(token.balance_of(user1), U256::from(500));
        assert_eq!(token.balance_of(user2), U256::from(500));
    }

    #[test]
    fn test_transfer_from_requires_allowance() {
        let (env, mut token) = setup();
        let owner = env.get_account(0);
        let spender = env.get_account(1);
        token.mint(owner, U256::from(1000));

        env.set_caller(spender);
        assert_eq!(
            token.try_transfer_from(owner, spender, U256::from(100)),
            Err(TokenError::InsufficientAllowance.into())
        );

        env.set_caller(owner);
        token.approve(spender, U256::from(100));
        env.set_caller(spender);
        token.transfer_from(owner, spender, U256::from(100));
        assert_eq!(token.balance_of(spender), U256::from(100));
        assert_eq!(token.allowance(owner, spender), U256::zero());
    }
}
