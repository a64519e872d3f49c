//! Collateral Vault - borrowing against a single collateral asset
//!
//! Borrowers post collateral and draw base asset from the shared liquidity
//! ledger. Debt grows by simple interest on principal at the ledger's rate
//! for this vault, recomputed on every touch:
//!
//! `debt = principal + accrued + principal * rate * elapsed / (1e18 * MILLIS_PER_YEAR)`
//!
//! Positions whose debt exceeds the liquidation threshold of their collateral
//! value are sold through the swap venue; proceeds settle the debt through
//! the waterfall in `liquidation`.

use odra::prelude::*;
use odra::casper_types::U256;
use odra::ContractRef;
use super::access::AdminConfig;
use super::errors::LendingError;
use super::events::*;
use super::interest_rate;
use super::ledger::LiquidityLedgerContractRef;
use super::liquidation::{LiquidationPlan, LiquidationShares};
use super::price_oracle::CollateralOracleContractRef;
use super::swap_venue::SwapVenueContractRef;
use crate::math::{Bps, SafeMath, BPS};
use crate::token::Cep18TokenContractRef;

/// Positions reported per keeper check
pub const DEFAULT_KEEPER_BATCH: u32 = 10;

/// Risk parameters and fee routing of a vault
#[odra::odra_type]
pub struct VaultConfig {
    /// Maximum debt to discounted collateral value
    pub max_ltv_bps: u32,
    /// Debt to collateral value above which a position is liquidatable
    pub liquidation_threshold_bps: u32,
    /// Penalty on liquidation proceeds
    pub liquidation_penalty_bps: u32,
    /// Tolerated loss between oracle value and realized sale
    pub slippage_bps: u32,
    pub liquidation_vault_share_bps: u32,
    pub liquidation_protocol_share_bps: u32,
    pub liquidation_lender_share_bps: u32,
    pub vault_fee_recipient: Address,
    pub protocol_fee_recipient: Address,
}

impl VaultConfig {
    pub fn validate(&self) -> Result<(), LendingError> {
        if self.max_ltv_bps > self.liquidation_threshold_bps
            || self.liquidation_threshold_bps > BPS
            || self.liquidation_penalty_bps > BPS
            || self.slippage_bps >= BPS
        {
            return Err(LendingError::InvalidParameters);
        }
        self.liquidation_shares().validate()
    }

    pub fn liquidation_shares(&self) -> LiquidationShares {
        LiquidationShares::new(
            self.liquidation_vault_share_bps,
            self.liquidation_protocol_share_bps,
            self.liquidation_lender_share_bps,
        )
    }

    /// Collateral value after the slippage haircut
    pub fn min_collateral_value(&self, collateral_value: U256) -> Result<U256, LendingError> {
        Bps::haircut(collateral_value, self.slippage_bps)
    }

    /// Largest total debt `collateral_value` supports
    pub fn max_debt(&self, collateral_value: U256) -> Result<U256, LendingError> {
        Bps::apply(self.min_collateral_value(collateral_value)?, self.max_ltv_bps)
    }

    /// `debt * 10000 > collateral_value * liquidation_threshold_bps`
    pub fn is_liquidatable(&self, debt: U256, collateral_value: U256) -> Result<bool, LendingError> {
        let scaled_debt = SafeMath::mul(debt, U256::from(BPS))?;
        let scaled_limit = SafeMath::mul(collateral_value, U256::from(self.liquidation_threshold_bps))?;
        Ok(scaled_debt > scaled_limit)
    }
}

/// A borrower's position
#[odra::odra_type]
pub struct Position {
    pub collateral_amount: U256,
    pub borrowed_principal: U256,
    /// Interest folded in at the last touch
    pub accrued_interest: U256,
    /// Sub-unit interest not yet folded in
    pub interest_carry: U256,
    pub last_accrual_time: u64,
    pub is_active: bool,
}

impl Position {
    pub fn empty(now: u64) -> Self {
        Self {
            collateral_amount: U256::zero(),
            borrowed_principal: U256::zero(),
            accrued_interest: U256::zero(),
            interest_carry: U256::zero(),
            last_accrual_time: now,
            is_active: false,
        }
    }

    pub fn debt(&self) -> Result<U256, LendingError> {
        SafeMath::add(self.borrowed_principal, self.accrued_interest)
    }

    /// Folds interest since the last touch at `rate` (WAD per year), keeping
    /// the sub-unit remainder for the next touch
    pub fn accrue(&mut self, rate: U256, now: u64) -> Result<(), LendingError> {
        let elapsed = now.saturating_sub(self.last_accrual_time);
        let (interest, carry) = interest_rate::accrued_interest_with_carry(
            self.borrowed_principal,
            rate,
            elapsed,
            self.interest_carry,
        )?;
        self.accrued_interest = SafeMath::add(self.accrued_interest, interest)?;
        self.interest_carry = carry;
        self.last_accrual_time = now;
        Ok(())
    }
}

/// Keeper view of pending liquidations
#[odra::odra_type]
pub struct LiquidationCheck {
    pub can_exec: bool,
    pub borrowers: Vec<Address>,
}

/// Collateral Vault contract
#[odra::module]
pub struct CollateralVault {
    ledger: Var<Address>,
    oracle: Var<Address>,
    swap_venue: Var<Address>,
    base_asset: Var<Address>,
    collateral_asset: Var<Address>,

    config: Var<VaultConfig>,
    admin: Var<AdminConfig>,

    positions: Mapping<Address, Position>,
    /// Borrowers in first-borrow order
    borrower_list: Mapping<u32, Address>,
    borrower_count: Var<u32>,
    is_listed: Mapping<Address, bool>,

    /// Lifetime liquidation proceeds
    total_liquidated_value: Var<U256>,
    /// Reentrancy lock
    locked: Var<bool>,
    storage_version: Var<u32>,
}

#[odra::module]
impl CollateralVault {
    /// Initialize the vault, fee recipients default to the deployer
    pub fn init(
        &mut self,
        ledger: Address,
        oracle: Address,
        swap_venue: Address,
        base_asset: Address,
        collateral_asset: Address,
        max_ltv_bps: u32,
        liquidation_threshold_bps: u32,
        liquidation_penalty_bps: u32,
        slippage_bps: u32,
        liquidation_vault_share_bps: u32,
        liquidation_protocol_share_bps: u32,
        liquidation_lender_share_bps: u32,
    ) {
        let deployer = self.env().caller();
        let config = VaultConfig {
            max_ltv_bps,
            liquidation_threshold_bps,
            liquidation_penalty_bps,
            slippage_bps,
            liquidation_vault_share_bps,
            liquidation_protocol_share_bps,
            liquidation_lender_share_bps,
            vault_fee_recipient: deployer,
            protocol_fee_recipient: deployer,
        };
        config.validate().unwrap_or_revert(&self.env());

        self.ledger.set(ledger);
        self.oracle.set(oracle);
        self.swap_venue.set(swap_venue);
        self.base_asset.set(base_asset);
        self.collateral_asset.set(collateral_asset);
        self.config.set(config);
        self.admin.set(AdminConfig::new(deployer));
        self.borrower_count.set(0);
        self.total_liquidated_value.set(U256::zero());
        self.locked.set(false);
        self.storage_version.set(super::STORAGE_VERSION);
    }

    // ========================================================================
    // Borrower Operations
    // ========================================================================

    /// Post `collateral_amount` and borrow `borrow_amount` of base asset
    pub fn borrow(&mut self, collateral_amount: U256, borrow_amount: U256) {
        self.lock();
        self.admin().ensure_borrowing_allowed().unwrap_or_revert(&self.env());
        if borrow_amount.is_zero() {
            self.env().revert(LendingError::InvalidParameters);
        }

        let borrower = self.env().caller();
        let now = self.env().get_block_time();
        let mut position = self.accrued_position(borrower, now);
        position.collateral_amount =
            SafeMath::add(position.collateral_amount, collateral_amount).unwrap_or_revert(&self.env());
        if position.collateral_amount.is_zero() {
            self.env().revert(LendingError::InsufficientCollateral);
        }

        let collateral_value = self.get_collateral_value(position.collateral_amount);
        let max_debt = self.config().max_debt(collateral_value).unwrap_or_revert(&self.env());
        let new_debt = SafeMath::add(position.debt().unwrap_or_revert(&self.env()), borrow_amount)
            .unwrap_or_revert(&self.env());
        if new_debt > max_debt {
            self.env().revert(LendingError::ExceedsMaxLTV);
        }

        position.borrowed_principal =
            SafeMath::add(position.borrowed_principal, borrow_amount).unwrap_or_revert(&self.env());
        position.is_active = true;
        self.positions.set(&borrower, position);
        self.list_borrower(borrower);

        if !collateral_amount.is_zero() {
            let vault = self.env().self_address();
            self.collateral_token().transfer_from(borrower, vault, collateral_amount);
        }
        self.ledger_ref().borrow(borrower, borrow_amount);

        self.env().emit_event(Borrowed {
            borrower,
            collateral_amount,
            amount: borrow_amount,
            total_debt: new_debt,
            timestamp: now,
        });
        self.unlock();
    }

    /// Repay up to `amount`, interest first; returns what was actually paid
    ///
    /// The borrower approves this vault for the base asset, payment goes
    /// straight into the ledger. Paying the full debt closes the position and
    /// returns all collateral.
    pub fn repay(&mut self, amount: U256) -> U256 {
        self.lock();
        if amount.is_zero() {
            self.env().revert(LendingError::InvalidParameters);
        }
        let borrower = self.env().caller();
        let now = self.env().get_block_time();
        let mut position = self.active_position(borrower, now);

        let debt = position.debt().unwrap_or_revert(&self.env());
        let paid = SafeMath::min(amount, debt);
        let interest_paid = SafeMath::min(paid, position.accrued_interest);
        let principal_paid = paid - interest_paid;
        position.accrued_interest -= interest_paid;
        position.borrowed_principal -= principal_paid;

        let closed = paid == debt;
        let released = if closed { position.collateral_amount } else { U256::zero() };
        if closed {
            position = Position::empty(now);
        }
        self.positions.set(&borrower, position);

        let ledger = self.get_ledger();
        self.base_token().transfer_from(borrower, ledger, paid);
        let mut ledger = self.ledger_ref();
        if !principal_paid.is_zero() {
            ledger.repay(principal_paid);
        }
        if !interest_paid.is_zero() {
            ledger.settle_interest(interest_paid);
        }
        if !released.is_zero() {
            self.collateral_token().transfer(borrower, released);
        }

        self.env().emit_event(Repaid {
            borrower,
            amount: paid,
            interest: interest_paid,
            principal: principal_paid,
            closed,
        });
        self.unlock();
        paid
    }

    /// Top up the collateral of an open position
    pub fn add_collateral(&mut self, amount: U256) {
        self.lock();
        self.admin().ensure_not_emergency().unwrap_or_revert(&self.env());
        if amount.is_zero() {
            self.env().revert(LendingError::InvalidParameters);
        }
        let borrower = self.env().caller();
        let now = self.env().get_block_time();
        let mut position = self.active_position(borrower, now);
        position.collateral_amount =
            SafeMath::add(position.collateral_amount, amount).unwrap_or_revert(&self.env());
        self.positions.set(&borrower, position);

        let vault = self.env().self_address();
        self.collateral_token().transfer_from(borrower, vault, amount);
        self.env().emit_event(CollateralAdded { borrower, amount });
        self.unlock();
    }

    /// Take collateral back while the rest still supports the debt
    pub fn withdraw_collateral(&mut self, amount: U256) {
        self.lock();
        if amount.is_zero() {
            self.env().revert(LendingError::InvalidParameters);
        }
        let borrower = self.env().caller();
        let now = self.env().get_block_time();
        let mut position = self.active_position(borrower, now);
        if amount > position.collateral_amount {
            self.env().revert(LendingError::InsufficientCollateral);
        }

        position.collateral_amount -= amount;
        let debt = position.debt().unwrap_or_revert(&self.env());
        let remaining_value = if position.collateral_amount.is_zero() {
            U256::zero()
        } else {
            self.get_collateral_value(position.collateral_amount)
        };
        let max_debt = self.config().max_debt(remaining_value).unwrap_or_revert(&self.env());
        if debt > max_debt {
            self.env().revert(LendingError::ExceedsMaxLTV);
        }
        self.positions.set(&borrower, position);

        self.collateral_token().transfer(borrower, amount);
        self.env().emit_event(CollateralWithdrawn { borrower, amount });
        self.unlock();
    }

    // ========================================================================
    // Liquidation
    // ========================================================================

    /// Liquidate a position above the liquidation threshold
    pub fn liquidate(&mut self, borrower: Address) -> LiquidationPlan {
        self.lock();
        self.admin().ensure_liquidations_allowed().unwrap_or_revert(&self.env());
        let now = self.env().get_block_time();
        if !self.check_liquidatable(borrower, now) {
            self.env().revert(LendingError::NotLiquidatable);
        }
        let plan = self.liquidate_position(borrower, now);
        self.unlock();
        plan
    }

    /// Liquidate every listed position that is still liquidatable
    ///
    /// Entries that are inactive or healthy are skipped. A failing oracle,
    /// swap or slippage check reverts the whole batch. Returns the number of
    /// positions liquidated.
    pub fn liquidate_multiple(&mut self, borrowers: Vec<Address>) -> u32 {
        self.lock();
        self.admin().ensure_liquidations_allowed().unwrap_or_revert(&self.env());
        let now = self.env().get_block_time();
        let mut liquidated = 0u32;
        for borrower in borrowers {
            if self.check_liquidatable(borrower, now) {
                self.liquidate_position(borrower, now);
                liquidated += 1;
            }
        }
        self.unlock();
        liquidated
    }

    pub fn is_liquidatable(&self, borrower: Address) -> bool {
        self.check_liquidatable(borrower, self.env().get_block_time())
    }

    /// First liquidatable borrower in insertion order
    pub fn get_first_liquidatable_position(&self) -> Option<Address> {
        self.get_liquidatable_positions(1).into_iter().next()
    }

    /// Up to `limit` liquidatable borrowers in insertion order
    pub fn get_liquidatable_positions(&self, limit: u32) -> Vec<Address> {
        let now = self.env().get_block_time();
        let mut found = Vec::new();
        let count = self.borrower_count.get_or_default();
        for index in 0..count {
            if found.len() as u32 >= limit {
                break;
            }
            if let Some(borrower) = self.borrower_list.get(&index) {
                if self.check_liquidatable(borrower, now) {
                    found.push(borrower);
                }
            }
        }
        found
    }

    pub fn checker(&self) -> LiquidationCheck {
        self.keeper_check(DEFAULT_KEEPER_BATCH)
    }

    pub fn checker_single(&self) -> LiquidationCheck {
        self.keeper_check(1)
    }

    pub fn get_liquidatable_count(&self) -> u32 {
        self.get_liquidatable_positions(u32::MAX).len() as u32
    }

    pub fn liquidations_needed(&self) -> bool {
        self.get_first_liquidatable_position().is_some()
    }

    // ========================================================================
    // View Functions
    // ========================================================================

    pub fn get_position(&self, borrower: Address) -> Option<Position> {
        self.positions.get(&borrower)
    }

    /// Principal plus interest as of now
    pub fn get_current_debt(&self, borrower: Address) -> U256 {
        let now = self.env().get_block_time();
        match self.positions.get(&borrower) {
            Some(position) if position.is_active => {
                let position = self.accrue(position, now);
                position.debt().unwrap_or_revert(&self.env())
            }
            _ => U256::zero(),
        }
    }

    /// Oracle value of `amount` collateral in base asset units
    pub fn get_collateral_value(&self, amount: U256) -> U256 {
        let oracle = self.oracle.get_or_revert_with(LendingError::NotConfigured);
        CollateralOracleContractRef::new(self.env(), oracle).valuate(self.get_collateral_asset(), amount)
    }

    /// Additional base asset `borrower` could draw against posted collateral
    pub fn get_max_borrow(&self, borrower: Address) -> U256 {
        let position = match self.positions.get(&borrower) {
            Some(position) if position.is_active => position,
            _ => return U256::zero(),
        };
        let value = self.get_collateral_value(position.collateral_amount);
        let max_debt = self.config().max_debt(value).unwrap_or_revert(&self.env());
        max_debt.saturating_sub(self.get_current_debt(borrower))
    }

    /// Annual rate (WAD) the ledger charges this vault right now
    pub fn get_borrow_rate(&self) -> U256 {
        self.ledger_ref().get_borrow_rate(self.env().self_address())
    }

    pub fn get_config(&self) -> VaultConfig {
        self.config()
    }

    pub fn get_admin_config(&self) -> AdminConfig {
        self.admin()
    }

    pub fn total_liquidated_value(&self) -> U256 {
        self.total_liquidated_value.get_or_default()
    }

    pub fn get_borrower_count(&self) -> u32 {
        self.borrower_count.get_or_default()
    }

    pub fn get_ledger(&self) -> Address {
        self.ledger.get_or_revert_with(LendingError::NotConfigured)
    }

    pub fn get_collateral_asset(&self) -> Address {
        self.collateral_asset.get_or_revert_with(LendingError::NotConfigured)
    }

    pub fn get_base_asset(&self) -> Address {
        self.base_asset.get_or_revert_with(LendingError::NotConfigured)
    }

    pub fn storage_version(&self) -> u32 {
        self.storage_version.get_or_default()
    }

    // ========================================================================
    // Admin Functions
    // ========================================================================

    pub fn set_slippage_bps(&mut self, slippage_bps: u32) {
        self.only_owner();
        let mut config = self.config();
        config.slippage_bps = slippage_bps;
        self.store_config(config, "slippage_bps");
    }

    pub fn set_risk_params(
        &mut self,
        max_ltv_bps: u32,
        liquidation_threshold_bps: u32,
        liquidation_penalty_bps: u32,
    ) {
        self.only_owner();
        let mut config = self.config();
        config.max_ltv_bps = max_ltv_bps;
        config.liquidation_threshold_bps = liquidation_threshold_bps;
        config.liquidation_penalty_bps = liquidation_penalty_bps;
        self.store_config(config, "risk_params");
    }

    pub fn set_liquidation_shares(&mut self, vault_bps: u32, protocol_bps: u32, lender_bps: u32) {
        self.only_owner();
        let mut config = self.config();
        config.liquidation_vault_share_bps = vault_bps;
        config.liquidation_protocol_share_bps = protocol_bps;
        config.liquidation_lender_share_bps = lender_bps;
        self.store_config(config, "liquidation_shares");
    }

    pub fn set_vault_fee_recipient(&mut self, recipient: Address) {
        self.only_owner();
        let mut config = self.config();
        config.vault_fee_recipient = recipient;
        self.store_config(config, "vault_fee_recipient");
    }

    pub fn set_protocol_fee_recipient(&mut self, recipient: Address) {
        self.only_owner();
        let mut config = self.config();
        config.protocol_fee_recipient = recipient;
        self.store_config(config, "protocol_fee_recipient");
    }

    pub fn set_borrowing_paused(&mut self, paused: bool) {
        self.only_owner();
        let mut admin = self.admin();
        admin.borrowing_paused = paused;
        self.store_flags(admin);
    }

    pub fn set_liquidations_paused(&mut self, paused: bool) {
        self.only_owner();
        let mut admin = self.admin();
        admin.liquidations_paused = paused;
        self.store_flags(admin);
    }

    /// Blocks borrowing, liquidations and collateral top-ups
    pub fn set_emergency_mode(&mut self, enabled: bool) {
        self.only_owner();
        let mut admin = self.admin();
        admin.emergency_mode = enabled;
        self.store_flags(admin);
    }

    /// Claims this vault's fee credits on the ledger for the vault fee recipient
    pub fn collect_vault_fees(&mut self) -> U256 {
        let recipient = self.config().vault_fee_recipient;
        self.ledger_ref().claim_vault_fees(recipient)
    }

    pub fn transfer_ownership(&mut self, new_owner: Address) {
        self.only_owner();
        let mut admin = self.admin();
        let previous_owner = admin.owner;
        admin.owner = new_owner;
        self.admin.set(admin);
        self.env().emit_event(OwnershipTransferred {
            previous_owner,
            new_owner,
        });
    }

    // ========================================================================
    // Internal Functions
    // ========================================================================

    /// Sells the collateral of an eligible position and settles its debt
    fn liquidate_position(&mut self, borrower: Address, now: u64) -> LiquidationPlan {
        let position = self.active_position(borrower, now);
        let config = self.config();
        let collateral_value = self.get_collateral_value(position.collateral_amount);
        let min_out = config.min_collateral_value(collateral_value).unwrap_or_revert(&self.env());

        self.positions.set(&borrower, Position::empty(now));

        let proceeds = self.sell_collateral(position.collateral_amount, min_out);
        let plan = LiquidationPlan::compute(
            proceeds,
            position.accrued_interest,
            position.borrowed_principal,
            config.liquidation_penalty_bps,
            &config.liquidation_shares(),
        )
        .unwrap_or_revert(&self.env());
        self.distribute(borrower, &config, &plan);

        let total = SafeMath::add(self.total_liquidated_value(), proceeds).unwrap_or_revert(&self.env());
        self.total_liquidated_value.set(total);

        self.env().emit_event(Liquidated {
            borrower,
            liquidator: self.env().caller(),
            collateral_sold: position.collateral_amount,
            proceeds,
            debt_repaid: plan.debt_repaid(),
            shortfall: plan.shortfall,
            penalty: plan.penalty,
            borrower_refund: plan.borrower_refund,
        });
        plan
    }

    /// Swaps collateral for base asset, returns the realized proceeds
    fn sell_collateral(&mut self, amount: U256, min_out: U256) -> U256 {
        let vault = self.env().self_address();
        let venue = self.swap_venue.get_or_revert_with(LendingError::NotConfigured);
        let base = self.base_token();
        let balance_before = base.balance_of(vault);

        self.collateral_token().approve(venue, amount);
        SwapVenueContractRef::new(self.env(), venue).swap(
            self.get_collateral_asset(),
            self.get_base_asset(),
            amount,
            min_out,
        );

        let proceeds = base.balance_of(vault).saturating_sub(balance_before);
        if proceeds < min_out {
            self.env().revert(LendingError::SlippageExceeded);
        }
        proceeds
    }

    fn distribute(&mut self, borrower: Address, config: &VaultConfig, plan: &LiquidationPlan) {
        let mut base = self.base_token();
        let to_ledger = SafeMath::add(plan.debt_repaid(), plan.lender_fee).unwrap_or_revert(&self.env());
        if !to_ledger.is_zero() {
            base.transfer(self.get_ledger(), to_ledger);
        }

        let mut ledger = self.ledger_ref();
        if !plan.principal_paid.is_zero() {
            ledger.repay(plan.principal_paid);
        }
        if !plan.interest_paid.is_zero() {
            ledger.settle_interest(plan.interest_paid);
        }
        if !plan.lender_fee.is_zero() {
            ledger.accrue_lender_yield(plan.lender_fee);
        }
        if !plan.shortfall.is_zero() {
            ledger.write_off(plan.shortfall);
        }

        if !plan.vault_fee.is_zero() {
            base.transfer(config.vault_fee_recipient, plan.vault_fee);
        }
        if !plan.protocol_fee.is_zero() {
            base.transfer(config.protocol_fee_recipient, plan.protocol_fee);
        }
        if !plan.borrower_refund.is_zero() {
            base.transfer(borrower, plan.borrower_refund);
        }
    }

    /// Active, indebted and above the liquidation threshold
    fn check_liquidatable(&self, borrower: Address, now: u64) -> bool {
        let position = match self.positions.get(&borrower) {
            Some(position) if position.is_active => self.accrue(position, now),
            _ => return false,
        };
        let debt = position.debt().unwrap_or_revert(&self.env());
        if debt.is_zero() {
            return false;
        }
        let value = self.get_collateral_value(position.collateral_amount);
        self.config()
            .is_liquidatable(debt, value)
            .unwrap_or_revert(&self.env())
    }

    fn keeper_check(&self, limit: u32) -> LiquidationCheck {
        let borrowers = self.get_liquidatable_positions(limit);
        LiquidationCheck {
            can_exec: !borrowers.is_empty(),
            borrowers,
        }
    }

    /// The borrower's position with interest folded to `now`, empty if none
    fn accrued_position(&self, borrower: Address, now: u64) -> Position {
        match self.positions.get(&borrower) {
            Some(position) if position.is_active => self.accrue(position, now),
            _ => Position::empty(now),
        }
    }

    fn active_position(&self, borrower: Address, now: u64) -> Position {
        match self.positions.get(&borrower) {
            Some(position) if position.is_active => self.accrue(position, now),
            _ => self.env().revert(LendingError::NoActivePosition),
        }
    }

    fn accrue(&self, mut position: Position, now: u64) -> Position {
        let rate = self.get_borrow_rate();
        position.accrue(rate, now).unwrap_or_revert(&self.env());
        position
    }

    fn list_borrower(&mut self, borrower: Address) {
        if self.is_listed.get(&borrower).unwrap_or(false) {
            return;
        }
        let count = self.borrower_count.get_or_default();
        self.borrower_list.set(&count, borrower);
        self.borrower_count.set(count + 1);
        self.is_listed.set(&borrower, true);
    }

    fn store_config(&mut self, config: VaultConfig, parameter: &str) {
        config.validate().unwrap_or_revert(&self.env());
        self.config.set(config);
        self.env().emit_event(ConfigUpdated {
            parameter: String::from(parameter),
        });
    }

    fn store_flags(&mut self, admin: AdminConfig) {
        self.env().emit_event(PauseFlagsUpdated {
            borrowing_paused: admin.borrowing_paused,
            liquidations_paused: admin.liquidations_paused,
            emergency_mode: admin.emergency_mode,
        });
        self.admin.set(admin);
    }

    fn config(&self) -> VaultConfig {
        self.config.get_or_revert_with(LendingError::NotConfigured)
    }

    fn admin(&self) -> AdminConfig {
        self.admin.get_or_revert_with(LendingError::NotConfigured)
    }

    fn only_owner(&self) {
        self.admin()
            .ensure_owner(self.env().caller())
            .unwrap_or_revert(&self.env());
    }

    fn ledger_ref(&self) -> LiquidityLedgerContractRef {
        LiquidityLedgerContractRef::new(self.env(), self.get_ledger())
    }

    fn base_token(&self) -> Cep18TokenContractRef {
        Cep18TokenContractRef::new(self.env(), self.get_base_asset())
    }

    fn collateral_token(&self) -> Cep18TokenContractRef {
        Cep18TokenContractRef::new(self.env(), self.get_collateral_asset())
    }

    fn lock(&mut self) {
        if self.locked.get_or_default() {
            self.env().revert(LendingError::Locked);
        }
        self.locked.set(true);
    }

    fn unlock(&mut self) {
        self.locked.set(false);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::{MILLIS_PER_YEAR, WAD_PER_BPS};

    fn config() -> VaultConfig {
        let recipient = odra_test::env().get_account(0);
        VaultConfig {
            max_ltv_bps: 7000,
            liquidation_threshold_bps: 7500,
            liquidation_penalty_bps: 500,
            slippage_bps: 100,
            liquidation_vault_share_bps: 4000,
            liquidation_protocol_share_bps: 2000,
            liquidation_lender_share_bps: 4000,
            vault_fee_recipient: recipient,
            protocol_fee_recipient: recipient,
        }
    }

    #[test]
    fn test_max_debt_after_slippage() {
        let config = config();
        assert_eq!(config.min_collateral_value(U256::from(200)).unwrap(), U256::from(198));
        assert_eq!(config.max_debt(U256::from(200)).unwrap(), U256::from(138));
    }

    #[test]
    fn test_liquidation_threshold_is_strict() {
        let config = config();
        // 75% of 200 is exactly 150
        assert!(!config.is_liquidatable(U256::from(150), U256::from(200)).unwrap());
        assert!(config.is_liquidatable(U256::from(151), U256::from(200)).unwrap());
    }

    #[test]
    fn test_config_validation() {
        assert!(config().validate().is_ok());

        let mut bad = config();
        bad.max_ltv_bps = 8000;
        assert!(matches!(bad.validate(), Err(LendingError::InvalidParameters)));

        let mut bad = config();
        bad.slippage_bps = BPS;
        assert!(matches!(bad.validate(), Err(LendingError::InvalidParameters)));

        let mut bad = config();
        bad.liquidation_lender_share_bps = 3000;
        assert!(matches!(bad.validate(), Err(LendingError::InvalidParameters)));
    }

    #[test]
    fn test_position_accrues_simple_interest() {
        let mut position = Position::empty(0);
        position.borrowed_principal = U256::from(100);
        position.is_active = true;
        let rate = U256::from(1000u64) * U256::from(WAD_PER_BPS);

        position.accrue(rate, MILLIS_PER_YEAR).unwrap();
        assert_eq!(position.accrued_interest, U256::from(10));
        assert_eq!(position.debt().unwrap(), U256::from(110));
        assert_eq!(position.last_accrual_time, MILLIS_PER_YEAR);

        // accrual is on principal only
        position.accrue(rate, 2 * MILLIS_PER_YEAR).unwrap();
        assert_eq!(position.debt().unwrap(), U256::from(120));
    }

    #[test]
    fn test_frequent_touches_charge_full_interest() {
        let mut position = Position::empty(0);
        position.borrowed_principal = U256::from(100);
        position.is_active = true;
        let rate = U256::from(1000u64) * U256::from(WAD_PER_BPS);

        // half a unit of interest per touch
        let step = MILLIS_PER_YEAR / 20;
        for touch in 1..=20u64 {
            position.accrue(rate, touch * step).unwrap();
        }
        assert_eq!(position.accrued_interest, U256::from(10));
        assert_eq!(position.debt().unwrap(), U256::from(110));
    }
}
