//! Points Ledger Contract
//!
//! Deposit-and-points-accrual ledger on Casper Network.
//! - Users deposit whitelisted CEP-18 assets and accrue points while deposited
//! - 1 normalized unit (1e18) deposited earns 1 point (1e18) per hour
//! - The owner schedules a one-time exit; from then on deposits stop,
//!   accrual stops and the claim manager withdraws and claims on behalf of users
//!
//! ## Units
//! - Asset amounts: native asset precision (U256)
//! - Points and rates: wad (U256), 18 decimals
//! - Timestamps: seconds (block time is milliseconds, divided by 1000)

use odra::prelude::*;
use odra::casper_types::U256;
use odra::ContractRef;
use alloc::vec::Vec;

use crate::asset::DepositAssetContractRef;
use crate::phase::Phase;
use crate::points::{normalize, UserAccount};
use crate::whitelist::{null_address, Whitelist};

/// Block time is reported in milliseconds
const MILLIS_PER_SECOND: u64 = 1_000;

// ==========================================
// Events
// ==========================================

pub mod events {
    use odra::prelude::*;
    use odra::casper_types::U256;
    use alloc::vec::Vec;

    #[odra::event]
    pub struct AssetWhitelisted {
        pub asset: Address,
    }

    #[odra::event]
    pub struct Deposited {
        pub user: Address,
        pub asset: Address,
        pub amount: U256,
    }

    #[odra::event]
    pub struct Withdrawn {
        pub user: Address,
        pub asset: Address,
        pub amount: U256,
    }

    /// Amounts are aligned with `assets`, zero where the user held nothing
    #[odra::event]
    pub struct AssetsWithdrawnOnBehalf {
        pub user: Address,
        pub manager: Address,
        pub assets: Vec<Address>,
        pub amounts: Vec<U256>,
    }

    #[odra::event]
    pub struct PointsClaimed {
        pub user: Address,
        pub manager: Address,
        pub claimed: U256,
    }

    #[odra::event]
    pub struct ExitScheduled {
        pub exit_start_time: u64,
    }

    #[odra::event]
    pub struct ClaimManagerSet {
        pub old_manager: Option<Address>,
        pub new_manager: Address,
    }

    #[odra::event]
    pub struct WithdrawalsToggled {
        pub enabled: bool,
    }

    #[odra::event]
    pub struct OwnershipTransferred {
        pub previous_owner: Option<Address>,
        pub new_owner: Address,
    }

    #[odra::event]
    pub struct Paused {
        pub by: Address,
    }

    #[odra::event]
    pub struct Unpaused {
        pub by: Address,
    }
}

// ==========================================
// Types
// ==========================================

/// Account snapshot returned by get_user_info
#[odra::odra_type]
pub struct UserInfo {
    pub accrual_rate: U256,
    /// 0 if the account was never settled
    pub last_settled: u64,
    pub settled_points: U256,
}

// ==========================================
// Errors
// ==========================================

#[odra::odra_error]
pub enum LedgerError {
    ZeroAmount = 1,
    InvalidAsset = 2,
    InvalidAddress = 3,
    AssetNotWhitelisted = 4,
    InsufficientBalance = 5,
    Unauthorized = 6,
    ClaimManagerNotSet = 7,
    NotClaimManager = 8,
    DepositPeriodEnded = 9,
    ExitNotStarted = 10,
    AlreadyScheduled = 11,
    CannotBeRetroactive = 12,
    WithdrawalsDisabled = 13,
    WithdrawalPeriodEnded = 14,
    ContractPaused = 15,
    ContractNotPaused = 16,
    ReentrantCall = 17,
    Overflow = 18,
}

// ==========================================
// Contract
// ==========================================

#[odra::module(
    events = [
        events::AssetWhitelisted,
        events::Deposited,
        events::Withdrawn,
        events::AssetsWithdrawnOnBehalf,
        events::PointsClaimed,
        events::ExitScheduled,
        events::ClaimManagerSet,
        events::WithdrawalsToggled,
        events::OwnershipTransferred,
        events::Paused,
        events::Unpaused
    ],
    errors = LedgerError
)]
pub struct PointsLedger {
    // Eligible assets
    whitelist: SubModule<Whitelist>,

    // Per-user state
    accounts: Mapping<Address, UserAccount>,
    balances: Mapping<(Address, Address), U256>, // (user, asset) -> native units

    // Global state
    total_deposited: Mapping<Address, U256>, // asset -> units in custody
    exit_start_time: Var<u64>,               // seconds, set once
    claim_manager: Var<Address>,

    // Admin
    owner: Var<Address>,
    paused: Var<bool>,
    withdrawals_enabled: Var<bool>,
    busy: Var<bool>,
}

#[odra::module]
impl PointsLedger {
    // ==========================================
    // Initialization
    // ==========================================

    /// Initialize the ledger with its initial whitelist.
    /// Reverts with InvalidAsset if any entry is the null address.
    pub fn init(&mut self, whitelisted_assets: Vec<Address>) {
        self.owner.set(self.env().caller());
        self.paused.set(false);
        self.withdrawals_enabled.set(false);
        self.busy.set(false);
        for asset in whitelisted_assets {
            self.whitelist_asset(asset);
        }
    }

    // ==========================================
    // User Functions
    // ==========================================

    /// Deposit `amount` of a whitelisted asset.
    /// Requires a prior CEP-18 approve of the ledger for `amount`.
    pub fn deposit(&mut self, asset: Address, amount: U256) {
        self.require_not_paused();
        self.enter();

        if amount.is_zero() {
            self.env().revert(LedgerError::ZeroAmount);
        }
        if !self.whitelist.contains(asset) {
            self.env().revert(LedgerError::AssetNotWhitelisted);
        }
        let now = self.now();
        if !self.phase_at(now).accepts_deposits() {
            self.env().revert(LedgerError::DepositPeriodEnded);
        }

        let user = self.env().caller();
        let decimals = self.asset_decimals(asset);

        // Settle before the rate changes
        let mut account = self.settled_account(user, now);
        let old_balance = self.balance_of(user, asset);
        let new_balance = old_balance
            .checked_add(amount)
            .unwrap_or_else(|| self.env().revert(LedgerError::Overflow));
        self.rebase(&mut account, old_balance, new_balance, decimals);

        self.accounts.set(&user, account);
        self.balances.set(&(user, asset), new_balance);
        let total = self
            .total_deposited
            .get(&asset)
            .unwrap_or_default()
            .checked_add(amount)
            .unwrap_or_else(|| self.env().revert(LedgerError::Overflow));
        self.total_deposited.set(&asset, total);

        // Pull funds into custody
        let mut token = DepositAssetContractRef::new(self.env(), asset);
        token.transfer_from(user, self.env().self_address(), amount);

        self.leave();
        self.env().emit_event(events::Deposited { user, asset, amount });
    }

    /// Self-service withdrawal, only while enabled by the owner and
    /// before the exit period starts.
    pub fn withdraw(&mut self, asset: Address, amount: U256) {
        self.require_not_paused();
        self.enter();

        if amount.is_zero() {
            self.env().revert(LedgerError::ZeroAmount);
        }
        if !self.whitelist.contains(asset) {
            self.env().revert(LedgerError::AssetNotWhitelisted);
        }
        let user = self.env().caller();
        let old_balance = self.balance_of(user, asset);
        if old_balance < amount {
            self.env().revert(LedgerError::InsufficientBalance);
        }
        if !self.withdrawals_enabled.get_or_default() {
            self.env().revert(LedgerError::WithdrawalsDisabled);
        }
        let now = self.now();
        if self.phase_at(now).exit_active() {
            self.env().revert(LedgerError::WithdrawalPeriodEnded);
        }

        let decimals = self.asset_decimals(asset);

        let mut account = self.settled_account(user, now);
        let new_balance = old_balance - amount;
        self.rebase(&mut account, old_balance, new_balance, decimals);

        self.accounts.set(&user, account);
        self.balances.set(&(user, asset), new_balance);
        self.release_custody(asset, amount);

        // State is final before paying out
        let mut token = DepositAssetContractRef::new(self.env(), asset);
        token.transfer(user, amount);

        self.leave();
        self.env().emit_event(events::Withdrawn { user, asset, amount });
    }

    // ==========================================
    // Claim Manager Functions
    // ==========================================

    /// Withdraw every asset `user` holds to the claim manager.
    /// Returns the withdrawn amounts aligned with `get_all_whitelisted()`.
    pub fn withdraw_all_on_behalf(&mut self, user: Address) -> Vec<U256> {
        self.require_not_paused();
        self.enter();

        if user == null_address() {
            self.env().revert(LedgerError::InvalidAddress);
        }
        let manager = self.require_claim_manager();
        let now = self.now();
        if !self.phase_at(now).exit_active() {
            self.env().revert(LedgerError::ExitNotStarted);
        }

        // Keep what accrued up to the cutoff before the rate goes away
        let mut account = self.settled_account(user, now);

        let assets = self.whitelist.all();
        let mut amounts = Vec::with_capacity(assets.len());
        for asset in assets.iter() {
            let balance = self.balance_of(user, *asset);
            if !balance.is_zero() {
                self.balances.set(&(user, *asset), U256::zero());
                self.release_custody(*asset, balance);
            }
            amounts.push(balance);
        }

        // No balance left, so nothing contributes to the rate
        account.accrual_rate = U256::zero();
        self.accounts.set(&user, account);

        for (asset, amount) in assets.iter().zip(amounts.iter()) {
            if !amount.is_zero() {
                let mut token = DepositAssetContractRef::new(self.env(), *asset);
                token.transfer(manager, *amount);
            }
        }

        self.leave();
        self.env().emit_event(events::AssetsWithdrawnOnBehalf {
            user,
            manager,
            assets,
            amounts: amounts.clone(),
        });
        amounts
    }

    /// Finalize the points of `user`. Accrual stops permanently.
    pub fn claim_points(&mut self, user: Address) -> U256 {
        self.require_not_paused();
        self.enter();

        if user == null_address() {
            self.env().revert(LedgerError::InvalidAddress);
        }
        let manager = self.require_claim_manager();
        let now = self.now();
        if !self.phase_at(now).exit_active() {
            self.env().revert(LedgerError::ExitNotStarted);
        }

        let mut account = self.settled_account(user, now);
        let claimed = account.take_points();
        self.accounts.set(&user, account);

        self.leave();
        self.env().emit_event(events::PointsClaimed {
            user,
            manager,
            claimed,
        });
        claimed
    }

    // ==========================================
    // View Functions
    // ==========================================

    /// Get (accrual_rate, last_settled, settled_points) for user
    pub fn get_user_info(&self, user: Address) -> UserInfo {
        let account = self.accounts.get(&user).unwrap_or_default();
        UserInfo {
            accrual_rate: account.accrual_rate,
            last_settled: account.last_settled.unwrap_or_default(),
            settled_points: account.settled_points,
        }
    }

    /// Settled points plus what accrued since (read-only calculation)
    pub fn preview_points(&self, user: Address) -> U256 {
        let account = self.accounts.get(&user).unwrap_or_default();
        account
            .preview(self.now(), self.exit_start_time.get())
            .unwrap_or_else(|| self.env().revert(LedgerError::Overflow))
    }

    /// Deposited amount of one asset, native precision
    pub fn get_balance(&self, user: Address, asset: Address) -> U256 {
        self.balance_of(user, asset)
    }

    /// Every whitelisted asset in insertion order (duplicates included)
    pub fn get_all_whitelisted(&self) -> Vec<Address> {
        self.whitelist.all()
    }

    pub fn is_whitelisted(&self, asset: Address) -> bool {
        self.whitelist.contains(asset)
    }

    /// Units of `asset` currently held in custody for all users
    pub fn total_deposited(&self, asset: Address) -> U256 {
        self.total_deposited.get(&asset).unwrap_or_default()
    }

    /// Exit start in seconds, None if not scheduled
    pub fn exit_start_time(&self) -> Option<u64> {
        self.exit_start_time.get()
    }

    /// 0 = accepting, 1 = exit scheduled, 2 = exited
    pub fn current_phase(&self) -> u8 {
        self.phase_at(self.now()).as_u8()
    }

    pub fn claim_manager(&self) -> Option<Address> {
        self.claim_manager.get()
    }

    pub fn owner(&self) -> Option<Address> {
        self.owner.get()
    }

    pub fn is_paused(&self) -> bool {
        self.paused.get_or_default()
    }

    pub fn withdrawals_enabled(&self) -> bool {
        self.withdrawals_enabled.get_or_default()
    }

    // ==========================================
    // Admin Functions
    // ==========================================

    /// Whitelist an asset (owner only). Adding twice appends twice.
    pub fn add_whitelisted_token(&mut self, asset: Address) {
        if asset == null_address() {
            self.env().revert(LedgerError::InvalidAsset);
        }
        self.require_owner();
        self.whitelist_asset(asset);
    }

    /// Set the claim manager (owner only), may be changed later
    pub fn set_claim_manager(&mut self, manager: Address) {
        if manager == null_address() {
            self.env().revert(LedgerError::InvalidAddress);
        }
        self.require_owner();
        let old_manager = self.claim_manager.get();
        self.claim_manager.set(manager);
        self.env().emit_event(events::ClaimManagerSet {
            old_manager,
            new_manager: manager,
        });
    }

    /// Schedule the exit period start in seconds (owner only, once)
    pub fn schedule_exit(&mut self, timestamp: u64) {
        self.require_owner();
        if self.exit_start_time.get().is_some() {
            self.env().revert(LedgerError::AlreadyScheduled);
        }
        if timestamp < self.now() {
            self.env().revert(LedgerError::CannotBeRetroactive);
        }
        self.exit_start_time.set(timestamp);
        self.env().emit_event(events::ExitScheduled {
            exit_start_time: timestamp,
        });
    }

    /// Enable or disable self-service withdrawals (owner only)
    pub fn set_withdrawals_enabled(&mut self, enabled: bool) {
        self.require_owner();
        self.withdrawals_enabled.set(enabled);
        self.env().emit_event(events::WithdrawalsToggled { enabled });
    }

    /// Hand the owner role to another address (owner only)
    pub fn transfer_ownership(&mut self, new_owner: Address) {
        if new_owner == null_address() {
            self.env().revert(LedgerError::InvalidAddress);
        }
        self.require_owner();
        let previous_owner = self.owner.get();
        self.owner.set(new_owner);
        self.env().emit_event(events::OwnershipTransferred {
            previous_owner,
            new_owner,
        });
    }

    /// Pause contract (owner only)
    pub fn pause(&mut self) {
        self.require_owner();
        if self.paused.get_or_default() {
            self.env().revert(LedgerError::ContractPaused);
        }
        self.paused.set(true);
        self.env().emit_event(events::Paused {
            by: self.env().caller(),
        });
    }

    /// Unpause contract (owner only)
    pub fn unpause(&mut self) {
        self.require_owner();
        if !self.paused.get_or_default() {
            self.env().revert(LedgerError::ContractNotPaused);
        }
        self.paused.set(false);
        self.env().emit_event(events::Unpaused {
            by: self.env().caller(),
        });
    }

    // ==========================================
    // Internal Functions
    // ==========================================

    fn require_not_paused(&self) {
        if self.paused.get_or_default() {
            self.env().revert(LedgerError::ContractPaused);
        }
    }

    fn require_owner(&self) {
        if self.owner.get() != Some(self.env().caller()) {
            self.env().revert(LedgerError::Unauthorized);
        }
    }

    /// Returns the claim manager if it is the caller
    fn require_claim_manager(&self) -> Address {
        match self.claim_manager.get() {
            None => self.env().revert(LedgerError::ClaimManagerNotSet),
            Some(manager) if manager != self.env().caller() => {
                self.env().revert(LedgerError::NotClaimManager)
            }
            Some(manager) => manager,
        }
    }

    /// Reentrancy latch. A revert rolls it back together with everything else.
    fn enter(&mut self) {
        if self.busy.get_or_default() {
            self.env().revert(LedgerError::ReentrantCall);
        }
        self.busy.set(true);
    }

    fn leave(&mut self) {
        self.busy.set(false);
    }

    /// Record the asset and, on its first add, its decimals
    fn whitelist_asset(&mut self, asset: Address) {
        if asset == null_address() {
            self.env().revert(LedgerError::InvalidAsset);
        }
        let decimals = match self.whitelist.decimals(asset) {
            Some(decimals) => decimals,
            None => DepositAssetContractRef::new(self.env(), asset).decimals(),
        };
        self.whitelist.add(asset, decimals);
        self.env().emit_event(events::AssetWhitelisted { asset });
    }

    fn asset_decimals(&self, asset: Address) -> u8 {
        self.whitelist
            .decimals(asset)
            .unwrap_or_else(|| self.env().revert(LedgerError::AssetNotWhitelisted))
    }

    /// Custody total can never drop below what users hold
    fn release_custody(&mut self, asset: Address, amount: U256) {
        let total = self
            .total_deposited
            .get(&asset)
            .unwrap_or_default()
            .checked_sub(amount)
            .unwrap_or_else(|| self.env().revert(LedgerError::Overflow));
        self.total_deposited.set(&asset, total);
    }

    fn now(&self) -> u64 {
        self.env().get_block_time() / MILLIS_PER_SECOND
    }

    fn phase_at(&self, now: u64) -> Phase {
        Phase::at(self.exit_start_time.get(), now)
    }

    fn balance_of(&self, user: Address, asset: Address) -> U256 {
        self.balances.get(&(user, asset)).unwrap_or_default()
    }

    /// Load the account and credit everything accrued up to `now`
    fn settled_account(&self, user: Address, now: u64) -> UserAccount {
        let mut account = self.accounts.get(&user).unwrap_or_default();
        account
            .settle(now, self.exit_start_time.get())
            .unwrap_or_else(|| self.env().revert(LedgerError::Overflow));
        account
    }

    /// Swap the asset's old normalized contribution for the new one
    fn rebase(&self, account: &mut UserAccount, old_balance: U256, new_balance: U256, decimals: u8) {
        let old_contribution = normalize(old_balance, decimals)
            .unwrap_or_else(|| self.env().revert(LedgerError::Overflow));
        let new_contribution = normalize(new_balance, decimals)
            .unwrap_or_else(|| self.env().revert(LedgerError::Overflow));
        account
            .rebase_rate(old_contribution, new_contribution)
            .unwrap_or_else(|| self.env().revert(LedgerError::Overflow));
    }
}
