//! Liquidity Ledger - single pool of base asset shared by every vault
//!
//! Lenders deposit base asset and receive exchange-rate receipts. Registered
//! collateral vaults draw from the pool on behalf of their borrowers, return
//! principal and hand back the interest they collect, which is split between
//! lenders, the vault and the protocol reserve.
//!
//! Before launch deposits wait in a queue and are converted into receipts at
//! the rate current when they are processed.
//!
//! Base asset held by the ledger always equals
//! `total_deposits - total_borrowed + protocol reserve + vault fee credits
//! + queued pre-launch deposits`.

use odra::prelude::*;
use odra::casper_types::U256;
use odra::ContractRef;
use super::access::AdminConfig;
use super::errors::LendingError;
use super::events::*;
use super::interest_rate::{self, RateCurve};
use super::pre_launch::{LaunchStatus, PreLaunchEntry};
use super::receipt_token::ExchangeRateTokenContractRef;
use crate::math::{Bps, SafeMath, BPS};
use crate::token::Cep18TokenContractRef;

/// A vault's slice of the pool and the terms it borrows on
#[odra::odra_type]
pub struct VaultRecord {
    /// Principal currently drawn by the vault
    pub borrowed_amount: U256,
    pub rate_curve: RateCurve,
    /// Interest split, sums to 10000
    pub lender_share_bps: u32,
    pub vault_fee_bps: u32,
    pub protocol_fee_bps: u32,
    /// Inactive vaults cannot draw new liquidity
    pub active: bool,
}

/// Interest split between lenders, the vault and the protocol reserve
#[odra::odra_type]
pub struct InterestSplit {
    pub lender_share: U256,
    pub vault_fee: U256,
    pub protocol_fee: U256,
}

/// Shares of an interest payment must cover it exactly
pub fn validate_fee_split(
    lender_share_bps: u32,
    vault_fee_bps: u32,
    protocol_fee_bps: u32,
) -> Result<(), LendingError> {
    let total = lender_share_bps
        .checked_add(vault_fee_bps)
        .and_then(|sum| sum.checked_add(protocol_fee_bps))
        .ok_or(LendingError::InvalidParameters)?;
    if total != BPS {
        return Err(LendingError::InvalidParameters);
    }
    Ok(())
}

impl VaultRecord {
    /// Fees round down, lenders receive the remainder
    pub fn split_interest(&self, interest: U256) -> Result<InterestSplit, LendingError> {
        let vault_fee = Bps::apply(interest, self.vault_fee_bps)?;
        let protocol_fee = Bps::apply(interest, self.protocol_fee_bps)?;
        let lender_share = SafeMath::sub(interest, SafeMath::add(vault_fee, protocol_fee)?)?;
        Ok(InterestSplit {
            lender_share,
            vault_fee,
            protocol_fee,
        })
    }
}

/// `borrowed / deposits` must stay within `ceiling_bps` after a withdrawal
pub fn within_utilization_ceiling(
    borrowed: U256,
    deposits: U256,
    ceiling_bps: u32,
) -> Result<bool, LendingError> {
    if borrowed.is_zero() {
        return Ok(true);
    }
    let scaled_borrowed = SafeMath::mul(borrowed, U256::from(BPS))?;
    let scaled_ceiling = SafeMath::mul(deposits, U256::from(ceiling_bps))?;
    Ok(scaled_borrowed <= scaled_ceiling)
}

/// Liquidity Ledger contract
#[odra::module]
pub struct LiquidityLedger {
    /// Base asset token
    base_asset: Var<Address>,
    /// Exchange-rate receipt token
    receipt_token: Var<Address>,

    /// Base asset owed to lenders, mirrors the receipt token's underlying
    total_deposits: Var<U256>,
    /// Principal drawn by all vaults
    total_borrowed: Var<U256>,

    /// Registered vaults
    vaults: Mapping<Address, VaultRecord>,
    /// Registration order
    vault_list: Mapping<u32, Address>,
    vault_count: Var<u32>,
    /// Vault fees owed to each vault
    vault_fee_credits: Mapping<Address, U256>,

    /// Pre-launch queue, in arrival order
    pre_launch_queue: Mapping<u32, Address>,
    pre_launch_count: Var<u32>,
    pre_launch_entries: Mapping<Address, PreLaunchEntry>,
    /// First queue index that may still be unprocessed
    next_unprocessed: Var<u32>,
    pending_pre_launch_total: Var<U256>,
    launch_timestamp: Var<u64>,
    launched: Var<bool>,

    /// Utilization a withdrawal may leave the pool at
    max_utilization_on_withdraw_bps: Var<u32>,
    admin: Var<AdminConfig>,
    /// Reentrancy lock
    locked: Var<bool>,
    storage_version: Var<u32>,
}

#[odra::module]
impl LiquidityLedger {
    /// Initialize the ledger
    ///
    /// # Arguments
    /// * `base_asset` - CEP-18 token lent out
    /// * `receipt_token` - ExchangeRateToken whose ledger is this contract
    /// * `launch_timestamp` - earliest `activate_launch` time, 0 launches immediately
    /// * `max_utilization_on_withdraw_bps` - withdrawal utilization ceiling
    pub fn init(
        &mut self,
        base_asset: Address,
        receipt_token: Address,
        launch_timestamp: u64,
        max_utilization_on_withdraw_bps: u32,
    ) {
        if max_utilization_on_withdraw_bps > BPS {
            self.env().revert(LendingError::InvalidParameters);
        }
        self.base_asset.set(base_asset);
        self.receipt_token.set(receipt_token);
        self.total_deposits.set(U256::zero());
        self.total_borrowed.set(U256::zero());
        self.vault_count.set(0);
        self.pre_launch_count.set(0);
        self.next_unprocessed.set(0);
        self.pending_pre_launch_total.set(U256::zero());
        self.launch_timestamp.set(launch_timestamp);
        self.launched.set(launch_timestamp == 0);
        self.max_utilization_on_withdraw_bps.set(max_utilization_on_withdraw_bps);
        self.admin.set(AdminConfig::new(self.env().caller()));
        self.locked.set(false);
        self.storage_version.set(super::STORAGE_VERSION);
    }

    // ========================================================================
    // Lender Operations
    // ========================================================================

    /// Deposit base asset and receive receipt shares at the current rate
    pub fn deposit(&mut self, amount: U256) -> U256 {
        self.lock();
        if !self.launched.get_or_default() {
            self.env().revert(LendingError::TooEarly);
        }
        self.admin().ensure_borrowing_allowed().unwrap_or_revert(&self.env());
        if amount.is_zero() {
            self.env().revert(LendingError::InvalidParameters);
        }

        let caller = self.env().caller();
        self.pull_base_asset(caller, amount);
        let shares = self.mint_receipts(caller, amount);

        self.env().emit_event(Deposited {
            user: caller,
            amount,
            shares,
            timestamp: self.env().get_block_time(),
        });
        self.unlock();
        shares
    }

    /// Redeem receipt shares, returns the base asset paid out
    pub fn withdraw(&mut self, shares: U256) -> U256 {
        self.lock();
        let caller = self.env().caller();
        let mut receipt = self.receipt();
        let quote = receipt.quote_withdraw(shares);

        let total_deposits = self.total_deposits();
        let total_borrowed = self.total_borrowed();
        if quote.gross > self.get_available_liquidity() {
            self.env().revert(LendingError::InsufficientUnderlying);
        }
        let remaining_deposits = total_deposits - quote.gross;
        let within = within_utilization_ceiling(
            total_borrowed,
            remaining_deposits,
            self.max_utilization_on_withdraw_bps(),
        )
        .unwrap_or_revert(&self.env());
        if !within {
            self.env().revert(LendingError::UtilizationCeilingExceeded);
        }

        let quote = receipt.withdraw(caller, shares);
        self.total_deposits.set(remaining_deposits);
        self.base_token().transfer(caller, quote.net);

        self.env().emit_event(Withdrawn {
            user: caller,
            amount: quote.net,
            shares,
            fee: quote.fee,
            timestamp: self.env().get_block_time(),
        });
        self.unlock();
        quote.net
    }

    // ========================================================================
    // Vault Registry
    // ========================================================================

    /// Register a collateral vault (owner only)
    pub fn register_vault(
        &mut self,
        vault: Address,
        base_rate: u32,
        multiplier: u32,
        jump_multiplier: u32,
        kink: u32,
        lender_share_bps: u32,
        vault_fee_bps: u32,
        protocol_fee_bps: u32,
    ) {
        self.only_owner();
        if self.vaults.get(&vault).is_some() {
            self.env().revert(LendingError::AlreadyRegistered);
        }
        let rate_curve = RateCurve::new(base_rate, multiplier, jump_multiplier, kink);
        rate_curve.validate().unwrap_or_revert(&self.env());
        validate_fee_split(lender_share_bps, vault_fee_bps, protocol_fee_bps)
            .unwrap_or_revert(&self.env());

        self.vaults.set(
            &vault,
            VaultRecord {
                borrowed_amount: U256::zero(),
                rate_curve,
                lender_share_bps,
                vault_fee_bps,
                protocol_fee_bps,
                active: true,
            },
        );
        let count = self.vault_count.get_or_default();
        self.vault_list.set(&count, vault);
        self.vault_count.set(count + 1);

        self.env().emit_event(VaultRegistered {
            vault,
            lender_share_bps,
            vault_fee_bps,
            protocol_fee_bps,
        });
    }

    pub fn set_vault_active(&mut self, vault: Address, active: bool) {
        self.only_owner();
        let mut record = self.vault_record(vault);
        record.active = active;
        self.vaults.set(&vault, record);
        self.env().emit_event(VaultStatusUpdated { vault, active });
    }

    pub fn update_rate_curve(
        &mut self,
        vault: Address,
        base_rate: u32,
        multiplier: u32,
        jump_multiplier: u32,
        kink: u32,
    ) {
        self.only_owner();
        let mut record = self.vault_record(vault);
        let rate_curve = RateCurve::new(base_rate, multiplier, jump_multiplier, kink);
        rate_curve.validate().unwrap_or_revert(&self.env());
        record.rate_curve = rate_curve;
        self.vaults.set(&vault, record);
        self.env().emit_event(ConfigUpdated {
            parameter: String::from("rate_curve"),
        });
    }

    pub fn update_fee_split(
        &mut self,
        vault: Address,
        lender_share_bps: u32,
        vault_fee_bps: u32,
        protocol_fee_bps: u32,
    ) {
        self.only_owner();
        let mut record = self.vault_record(vault);
        validate_fee_split(lender_share_bps, vault_fee_bps, protocol_fee_bps)
            .unwrap_or_revert(&self.env());
        record.lender_share_bps = lender_share_bps;
        record.vault_fee_bps = vault_fee_bps;
        record.protocol_fee_bps = protocol_fee_bps;
        self.vaults.set(&vault, record);
        self.env().emit_event(ConfigUpdated {
            parameter: String::from("fee_split"),
        });
    }

    // ========================================================================
    // Vault Operations
    // ========================================================================

    /// Draw liquidity for a borrower of the calling vault
    pub fn borrow(&mut self, recipient: Address, amount: U256) {
        self.lock();
        let (vault, mut record) = self.calling_vault();
        if !record.active {
            self.env().revert(LendingError::Paused);
        }
        self.admin().ensure_borrowing_allowed().unwrap_or_revert(&self.env());
        if amount.is_zero() {
            self.env().revert(LendingError::InvalidParameters);
        }
        if amount > self.get_available_liquidity() {
            self.env().revert(LendingError::InsufficientLiquidity);
        }

        record.borrowed_amount = SafeMath::add(record.borrowed_amount, amount).unwrap_or_revert(&self.env());
        self.vaults.set(&vault, record);
        let total_borrowed = SafeMath::add(self.total_borrowed(), amount).unwrap_or_revert(&self.env());
        self.total_borrowed.set(total_borrowed);

        self.base_token().transfer(recipient, amount);

        self.env().emit_event(LiquidityBorrowed {
            vault,
            recipient,
            amount,
            total_borrowed,
        });
        self.unlock();
    }

    /// Book principal the calling vault has already moved into the ledger
    pub fn repay(&mut self, amount: U256) {
        let (vault, mut record) = self.calling_vault();
        let total_borrowed = self.reduce_borrowed(&mut record, amount);
        self.vaults.set(&vault, record);
        self.env().emit_event(LiquidityRepaid {
            vault,
            amount,
            total_borrowed,
        });
    }

    /// Split interest the calling vault has already moved into the ledger
    pub fn settle_interest(&mut self, interest_amount: U256) {
        let (vault, record) = self.calling_vault();
        if interest_amount.is_zero() {
            return;
        }
        let split = record.split_interest(interest_amount).unwrap_or_revert(&self.env());

        let credits = SafeMath::add(self.get_vault_fee_credits(vault), split.vault_fee)
            .unwrap_or_revert(&self.env());
        self.vault_fee_credits.set(&vault, credits);
        if !split.protocol_fee.is_zero() {
            self.receipt().credit_protocol_fees(split.protocol_fee);
        }
        self.add_lender_yield(split.lender_share);

        self.env().emit_event(InterestSettled {
            vault,
            interest: interest_amount,
            lender_share: split.lender_share,
            vault_fee: split.vault_fee,
            protocol_fee: split.protocol_fee,
        });
    }

    /// Lender-only income, already moved into the ledger by the calling vault
    pub fn accrue_lender_yield(&mut self, amount: U256) {
        self.calling_vault();
        self.add_lender_yield(amount);
    }

    /// Reconcile principal a liquidation could not recover
    ///
    /// The protocol reserve absorbs the loss first; whatever it cannot cover
    /// lowers lender deposits and with them the exchange rate.
    pub fn write_off(&mut self, amount: U256) {
        let (vault, mut record) = self.calling_vault();
        if amount.is_zero() {
            return;
        }
        self.reduce_borrowed(&mut record, amount);
        self.vaults.set(&vault, record);

        let mut receipt = self.receipt();
        let from_reserve = SafeMath::min(amount, receipt.protocol_held_balance());
        if !from_reserve.is_zero() {
            receipt.debit_protocol_fees(from_reserve);
        }
        let socialized = amount - from_reserve;
        if !socialized.is_zero() {
            let deposits = SafeMath::sub(self.total_deposits(), socialized).unwrap_or_revert(&self.env());
            self.total_deposits.set(deposits);
            receipt.absorb_loss(socialized);
        }

        self.env().emit_event(ShortfallWrittenOff {
            vault,
            amount,
            from_reserve,
            socialized,
        });
    }

    /// Pay out the calling vault's accumulated fee credits
    pub fn claim_vault_fees(&mut self, recipient: Address) -> U256 {
        self.lock();
        let (vault, _) = self.calling_vault();
        let amount = self.get_vault_fee_credits(vault);
        if !amount.is_zero() {
            self.vault_fee_credits.set(&vault, U256::zero());
            self.base_token().transfer(recipient, amount);
            self.env().emit_event(VaultFeesClaimed {
                vault,
                recipient,
                amount,
            });
        }
        self.unlock();
        amount
    }

    /// Withdraw from the protocol reserve (owner only)
    pub fn withdraw_protocol_fees(&mut self, recipient: Address, amount: U256) {
        self.only_owner();
        self.lock();
        self.receipt().debit_protocol_fees(amount);
        self.base_token().transfer(recipient, amount);
        self.env().emit_event(ProtocolFeesWithdrawn { recipient, amount });
        self.unlock();
    }

    // ========================================================================
    // Pre-launch Queue
    // ========================================================================

    /// Queue base asset for conversion at launch
    pub fn pre_launch_deposit(&mut self, amount: U256) {
        self.lock();
        if self.launched.get_or_default() {
            self.env().revert(LendingError::AlreadyLaunched);
        }
        self.admin().ensure_borrowing_allowed().unwrap_or_revert(&self.env());
        if amount.is_zero() {
            self.env().revert(LendingError::InvalidParameters);
        }

        let depositor = self.env().caller();
        self.pull_base_asset(depositor, amount);

        let entry = match self.pre_launch_entries.get(&depositor) {
            Some(mut entry) => {
                entry.amount = SafeMath::add(entry.amount, amount).unwrap_or_revert(&self.env());
                entry
            }
            None => {
                let count = self.pre_launch_count.get_or_default();
                self.pre_launch_queue.set(&count, depositor);
                self.pre_launch_count.set(count + 1);
                PreLaunchEntry {
                    depositor,
                    amount,
                    processed: false,
                }
            }
        };
        let queued = entry.amount;
        self.pre_launch_entries.set(&depositor, entry);
        let pending = SafeMath::add(self.get_total_pre_launch_deposits(), amount)
            .unwrap_or_revert(&self.env());
        self.pending_pre_launch_total.set(pending);

        self.env().emit_event(PreLaunchDeposited {
            depositor,
            amount,
            queued,
        });
        self.unlock();
    }

    /// Take queued base asset back before launch
    pub fn pre_launch_withdraw(&mut self, amount: U256) {
        self.lock();
        if self.launched.get_or_default() {
            self.env().revert(LendingError::AlreadyLaunched);
        }
        let depositor = self.env().caller();
        let mut entry = self
            .pre_launch_entries
            .get(&depositor)
            .unwrap_or_revert_with(&self.env(), LendingError::InsufficientQueuedAmount);
        if amount.is_zero() || amount > entry.amount {
            self.env().revert(LendingError::InsufficientQueuedAmount);
        }

        entry.amount -= amount;
        let queued = entry.amount;
        self.pre_launch_entries.set(&depositor, entry);
        let pending = SafeMath::sub(self.get_total_pre_launch_deposits(), amount)
            .unwrap_or_revert(&self.env());
        self.pending_pre_launch_total.set(pending);
        self.base_token().transfer(depositor, amount);

        self.env().emit_event(PreLaunchWithdrawn {
            depositor,
            amount,
            queued,
        });
        self.unlock();
    }

    /// Open the pool once the launch time has passed, callable by anyone
    pub fn activate_launch(&mut self) {
        if self.launched.get_or_default() {
            self.env().revert(LendingError::AlreadyLaunched);
        }
        let now = self.env().get_block_time();
        if now < self.launch_timestamp.get_or_default() {
            self.env().revert(LendingError::TooEarly);
        }
        self.launched.set(true);
        self.env().emit_event(LaunchActivated { timestamp: now });
    }

    /// Convert up to `max_entries` queued deposits into receipts
    ///
    /// Entries are walked in arrival order from a persistent cursor and each
    /// is converted at most once, so repeated calls only pick up what is left.
    /// An entry worth less than one share at the current rate is refunded.
    /// Returns the number of entries handled by this call.
    pub fn process_pre_launch_deposits(&mut self, max_entries: u32) -> u32 {
        self.lock();
        if !self.launched.get_or_default() {
            self.env().revert(LendingError::TooEarly);
        }

        let start = self.next_unprocessed.get_or_default();
        let count = self.pre_launch_count.get_or_default();
        let end = start.saturating_add(max_entries).min(count);

        for index in start..end {
            let depositor = self
                .pre_launch_queue
                .get(&index)
                .unwrap_or_revert_with(&self.env(), LendingError::NotConfigured);
            let mut entry = self
                .pre_launch_entries
                .get(&depositor)
                .unwrap_or_revert_with(&self.env(), LendingError::NotConfigured);
            if entry.processed {
                continue;
            }

            let amount = entry.amount;
            entry.processed = true;
            self.pre_launch_entries.set(&depositor, entry);

            let mut shares = U256::zero();
            let mut refunded = U256::zero();
            if !amount.is_zero() {
                let pending = SafeMath::sub(self.get_total_pre_launch_deposits(), amount)
                    .unwrap_or_revert(&self.env());
                self.pending_pre_launch_total.set(pending);
                // too small to mint a share at the current rate
                if self.receipt().to_shares(amount).is_zero() {
                    refunded = amount;
                    self.base_token().transfer(depositor, amount);
                } else {
                    shares = self.mint_receipts(depositor, amount);
                }
            }

            self.env().emit_event(PreLaunchProcessed {
                depositor,
                amount,
                shares,
                refunded,
            });
        }

        self.next_unprocessed.set(end);
        self.unlock();
        end - start
    }

    // ========================================================================
    // View Functions
    // ========================================================================

    /// Annual borrow rate (WAD) of `vault` at the current utilization
    pub fn get_borrow_rate(&self, vault: Address) -> U256 {
        let record = self.vault_record(vault);
        record
            .rate_curve
            .borrow_rate(self.get_utilization())
            .unwrap_or_revert(&self.env())
    }

    /// total_borrowed / total_deposits (WAD)
    pub fn get_utilization(&self) -> U256 {
        interest_rate::utilization(self.total_borrowed(), self.total_deposits())
            .unwrap_or_revert(&self.env())
    }

    pub fn get_available_liquidity(&self) -> U256 {
        self.total_deposits().saturating_sub(self.total_borrowed())
    }

    pub fn total_deposits(&self) -> U256 {
        self.total_deposits.get_or_default()
    }

    pub fn total_borrowed(&self) -> U256 {
        self.total_borrowed.get_or_default()
    }

    pub fn get_vault_record(&self, vault: Address) -> Option<VaultRecord> {
        self.vaults.get(&vault)
    }

    pub fn get_vault_borrowed(&self, vault: Address) -> U256 {
        self.vaults
            .get(&vault)
            .map(|record| record.borrowed_amount)
            .unwrap_or_default()
    }

    pub fn get_vault_fee_credits(&self, vault: Address) -> U256 {
        self.vault_fee_credits.get(&vault).unwrap_or_default()
    }

    /// Active vaults in registration order
    pub fn get_active_vaults(&self) -> Vec<Address> {
        let count = self.vault_count.get_or_default();
        let mut active = Vec::new();
        for index in 0..count {
            if let Some(vault) = self.vault_list.get(&index) {
                if self.vaults.get(&vault).map(|record| record.active).unwrap_or(false) {
                    active.push(vault);
                }
            }
        }
        active
    }

    pub fn get_vault_count(&self) -> u32 {
        self.vault_count.get_or_default()
    }

    pub fn get_launch_status(&self) -> LaunchStatus {
        LaunchStatus::at(
            self.launched.get_or_default(),
            self.launch_timestamp.get_or_default(),
            self.env().get_block_time(),
        )
    }

    pub fn is_launched(&self) -> bool {
        self.launched.get_or_default()
    }

    /// Queued base asset not yet converted into receipts
    pub fn get_total_pre_launch_deposits(&self) -> U256 {
        self.pending_pre_launch_total.get_or_default()
    }

    pub fn get_pre_launch_depositor_count(&self) -> u32 {
        self.pre_launch_count.get_or_default()
    }

    pub fn get_pre_launch_deposit(&self, depositor: Address) -> Option<PreLaunchEntry> {
        self.pre_launch_entries.get(&depositor)
    }

    /// Entries still waiting for processing, in queue order
    pub fn get_unprocessed_pre_launch_deposits(&self) -> Vec<PreLaunchEntry> {
        let count = self.pre_launch_count.get_or_default();
        let mut pending = Vec::new();
        for index in self.next_unprocessed.get_or_default()..count {
            let entry = self
                .pre_launch_queue
                .get(&index)
                .and_then(|depositor| self.pre_launch_entries.get(&depositor));
            if let Some(entry) = entry {
                if !entry.processed {
                    pending.push(entry);
                }
            }
        }
        pending
    }

    pub fn max_utilization_on_withdraw_bps(&self) -> u32 {
        self.max_utilization_on_withdraw_bps.get_or_default()
    }

    pub fn get_base_asset(&self) -> Address {
        self.base_asset.get_or_revert_with(LendingError::NotConfigured)
    }

    pub fn get_receipt_token(&self) -> Address {
        self.receipt_token.get_or_revert_with(LendingError::NotConfigured)
    }

    pub fn get_admin_config(&self) -> AdminConfig {
        self.admin()
    }

    pub fn storage_version(&self) -> u32 {
        self.storage_version.get_or_default()
    }

    // ========================================================================
    // Admin Functions
    // ========================================================================

    pub fn set_max_utilization_on_withdraw(&mut self, bps: u32) {
        self.only_owner();
        if bps > BPS {
            self.env().revert(LendingError::InvalidParameters);
        }
        self.max_utilization_on_withdraw_bps.set(bps);
        self.env().emit_event(ConfigUpdated {
            parameter: String::from("max_utilization_on_withdraw_bps"),
        });
    }

    /// Stops deposits and new borrows; withdrawals and repayments keep working
    pub fn pause(&mut self) {
        self.set_paused(true);
    }

    pub fn unpause(&mut self) {
        self.set_paused(false);
    }

    /// Independent of `pause`; while set, deposits and vault borrows revert
    /// with `EmergencyMode`
    pub fn set_emergency_mode(&mut self, enabled: bool) {
        self.only_owner();
        let mut admin = self.admin();
        admin.emergency_mode = enabled;
        self.store_flags(admin);
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

    fn set_paused(&mut self, paused: bool) {
        self.only_owner();
        let mut admin = self.admin();
        admin.borrowing_paused = paused;
        self.store_flags(admin);
    }

    fn store_flags(&mut self, admin: AdminConfig) {
        self.env().emit_event(PauseFlagsUpdated {
            borrowing_paused: admin.borrowing_paused,
            liquidations_paused: admin.liquidations_paused,
            emergency_mode: admin.emergency_mode,
        });
        self.admin.set(admin);
    }

    /// Adds `amount` already held by the ledger to deposits and mints for it
    fn mint_receipts(&mut self, receiver: Address, amount: U256) -> U256 {
        let deposits = SafeMath::add(self.total_deposits(), amount).unwrap_or_revert(&self.env());
        self.total_deposits.set(deposits);
        self.receipt().deposit(receiver, amount)
    }

    fn add_lender_yield(&mut self, amount: U256) {
        if amount.is_zero() {
            return;
        }
        let deposits = SafeMath::add(self.total_deposits(), amount).unwrap_or_revert(&self.env());
        self.total_deposits.set(deposits);
        self.receipt().accrue_yield(amount);
    }

    /// Lowers the vault's and the pool's borrowed principal, returns the new pool total
    fn reduce_borrowed(&mut self, record: &mut VaultRecord, amount: U256) -> U256 {
        if amount > record.borrowed_amount {
            self.env().revert(LendingError::InvalidParameters);
        }
        record.borrowed_amount -= amount;
        let total_borrowed = SafeMath::sub(self.total_borrowed(), amount).unwrap_or_revert(&self.env());
        self.total_borrowed.set(total_borrowed);
        total_borrowed
    }

    fn pull_base_asset(&mut self, from: Address, amount: U256) {
        let ledger = self.env().self_address();
        self.base_token().transfer_from(from, ledger, amount);
    }

    fn calling_vault(&self) -> (Address, VaultRecord) {
        let caller = self.env().caller();
        let record = self
            .vaults
            .get(&caller)
            .unwrap_or_revert_with(&self.env(), LendingError::Unauthorized);
        (caller, record)
    }

    fn vault_record(&self, vault: Address) -> VaultRecord {
        self.vaults
            .get(&vault)
            .unwrap_or_revert_with(&self.env(), LendingError::VaultNotRegistered)
    }

    fn base_token(&self) -> Cep18TokenContractRef {
        Cep18TokenContractRef::new(self.env(), self.get_base_asset())
    }

    fn receipt(&self) -> ExchangeRateTokenContractRef {
        ExchangeRateTokenContractRef::new(self.env(), self.get_receipt_token())
    }

    fn admin(&self) -> AdminConfig {
        self.admin.get_or_revert_with(LendingError::NotConfigured)
    }

    fn only_owner(&self) {
        self.admin()
            .ensure_owner(self.env().caller())
            .unwrap_or_revert(&self.env());
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

    fn record(lender: u32, vault: u32, protocol: u32) -> VaultRecord {
        VaultRecord {
            borrowed_amount: U256::zero(),
            rate_curve: RateCurve::new(1000, 2000, 5000, 8000),
            lender_share_bps: lender,
            vault_fee_bps: vault,
            protocol_fee_bps: protocol,
            active: true,
        }
    }

    #[test]
    fn test_interest_split_remainder_to_lenders() {
        let split = record(7000, 1000, 2000).split_interest(U256::from(10)).unwrap();
        assert_eq!(split.vault_fee, U256::from(1));
        assert_eq!(split.protocol_fee, U256::from(2));
        assert_eq!(split.lender_share, U256::from(7));

        // 1000 bps of 19 rounds down to 1, 2000 bps to 3
        let split = record(7000, 1000, 2000).split_interest(U256::from(19)).unwrap();
        assert_eq!(split.vault_fee, U256::from(1));
        assert_eq!(split.protocol_fee, U256::from(3));
        assert_eq!(split.lender_share, U256::from(15));
    }

    #[test]
    fn test_fee_split_validation() {
        assert!(validate_fee_split(7000, 1000, 2000).is_ok());
        assert!(matches!(
            validate_fee_split(7000, 1000, 1000),
            Err(LendingError::InvalidParameters)
        ));
        assert!(matches!(
            validate_fee_split(u32::MAX, 1, 0),
            Err(LendingError::InvalidParameters)
        ));
    }

    #[test]
    fn test_utilization_ceiling() {
        let u = |value: u64| U256::from(value);
        assert!(within_utilization_ceiling(U256::zero(), U256::zero(), 0).unwrap());
        assert!(within_utilization_ceiling(u(900), u(1000), 9000).unwrap());
        assert!(!within_utilization_ceiling(u(901), u(1000), 9000).unwrap());
        assert!(!within_utilization_ceiling(u(1), U256::zero(), 10_000).unwrap());
    }
}
