//! Steroids Lock Ledger Contract
//!
//! Locks liquidity pool shares (the deposit token) for a minimum duration and
//! mints a wrapped balance worth their reference-asset content.
//! - `stake`: deposit tokens go to the vault, wrapped tokens are minted to the receiver
//! - `unstake`: unlocked deposits are released, wrapped tokens burned at the live rate
//! - `adjust_balance_of`: reprices an account's locks and mints/burns the drift
//!
//! ## Units
//! - Deposit and wrapped amounts: smallest token units (U256)
//! - Lock start and duration: seconds; Odra block time is converted from milliseconds
//!
//! ## Atomicity
//! Lock table changes are computed on a staged copy (see `engine`) and stored
//! before any token call. A failing token call reverts the whole deploy.

use alloc::vec::Vec;
use odra::casper_types::U256;
use odra::prelude::*;
use odra::ContractRef;

use crate::converter::{self, ExchangeRate, RateSource};
use crate::engine::{self, Adjustment, LockPolicy, StakeRequest};
use crate::errors::SteroidsError;
use crate::external::{
    CapabilityCheckContractRef, DepositTokenServiceContractRef, RateOracleContractRef,
    VaultGatewayContractRef, WrappedTokenServiceContractRef,
};
use crate::lock_table::{Lock, LockTable, MAX_LOCKS_CEILING};
use crate::permissions::Action;

/// Odra block time is expressed in milliseconds
const MILLIS_PER_SECOND: u64 = 1_000;

// ==========================================
// Events
// ==========================================

pub mod events {
    use odra::casper_types::U256;
    use odra::prelude::*;

    #[odra::event]
    pub struct Staked {
        pub depositor: Address,
        pub receiver: Address,
        pub deposit_amount: U256,
        pub wrapped_amount: U256,
        pub lock_start: u64,
        pub duration: u64,
    }

    #[odra::event]
    pub struct Unstaked {
        pub receiver: Address,
        pub deposit_amount: U256,
        pub wrapped_amount: U256,
    }

    /// `amount` is the reconciled wrapped total, `delta` the minted (or burned) difference
    #[odra::event]
    pub struct StakedLockAdjusted {
        pub owner: Address,
        pub amount: U256,
        pub delta: U256,
        pub minted: bool,
    }

    #[odra::event]
    pub struct MinLockTimeChanged {
        pub min_lock_time: u64,
    }

    #[odra::event]
    pub struct MaxLocksChanged {
        pub max_locks: u32,
    }

    #[odra::event]
    pub struct VaultChanged {
        pub vault: Address,
    }
}

impl RateSource for RateOracleContractRef {
    fn current_reserve(&self) -> U256 {
        self.reserve()
    }

    fn current_total_supply(&self) -> U256 {
        self.total_supply()
    }
}

// ==========================================
// Contract
// ==========================================

#[odra::module(
    events = [
        events::Staked,
        events::Unstaked,
        events::StakedLockAdjusted,
        events::MinLockTimeChanged,
        events::MaxLocksChanged,
        events::VaultChanged
    ],
    errors = SteroidsError
)]
pub struct Steroids {
    // Collaborators
    wrapped_token: Var<Address>,
    vault: Var<Address>,
    deposit_token: Var<Address>,
    permissions: Var<Address>,

    // Lock policy
    min_lock_time: Var<u64>,
    max_locks: Var<u32>,

    // Per-account lock slots
    locks: Mapping<Address, LockTable>,
}

#[odra::module]
impl Steroids {
    // ==========================================
    // Initialization
    // ==========================================

    /// `deposit_token` is both the staked token and the rate oracle (its pool).
    pub fn init(
        &mut self,
        wrapped_token: Address,
        vault: Address,
        deposit_token: Address,
        permissions: Address,
        min_lock_time: u64,
        max_locks: u32,
    ) {
        for address in [wrapped_token, vault, deposit_token, permissions] {
            self.require_contract(&address);
        }
        self.require_max_locks_in_range(max_locks);

        self.wrapped_token.set(wrapped_token);
        self.vault.set(vault);
        self.deposit_token.set(deposit_token);
        self.permissions.set(permissions);
        self.min_lock_time.set(min_lock_time);
        self.max_locks.set(max_locks);
    }

    // ==========================================
    // User Functions
    // ==========================================

    /// Lock `amount` deposit tokens of the caller for `duration` seconds and
    /// mint the wrapped equivalent to `receiver`. The lock belongs to `receiver`.
    pub fn stake(&mut self, amount: U256, duration: u64, receiver: Address) {
        let depositor = self.env().caller();
        let deposit_token_address = self.configured(&self.deposit_token);
        let mut deposit_token =
            DepositTokenServiceContractRef::new(self.env().clone(), deposit_token_address);

        let request = StakeRequest {
            amount,
            duration,
            allowance: deposit_token.allowance(depositor, self.env().self_address()),
            now: self.now(),
        };
        let policy = self.policy();
        let oracle = self.rate_oracle();

        let mut table = self.locks.get(&receiver).unwrap_or_default();
        let receipt = self.ensure(engine::stake(&mut table, &request, &policy, &oracle));
        self.locks.set(&receiver, table);

        let vault_address = self.configured(&self.vault);
        deposit_token.transfer_from(depositor, vault_address, amount);
        VaultGatewayContractRef::new(self.env().clone(), vault_address)
            .deposit(deposit_token_address, amount);
        self.wrapped_token_ref().mint(receiver, receipt.wrapped_amount());

        self.env().emit_event(events::Staked {
            depositor,
            receiver,
            deposit_amount: amount,
            wrapped_amount: receipt.wrapped_amount(),
            lock_start: receipt.lock.lock_start,
            duration,
        });
    }

    /// Release `amount` deposit tokens from the caller's unlocked locks and
    /// burn their wrapped value at the current rate.
    pub fn unstake(&mut self, amount: U256) {
        let caller = self.env().caller();
        let oracle = self.rate_oracle();

        let mut table = self.locks.get(&caller).unwrap_or_default();
        let receipt = self.ensure(engine::unstake(&mut table, amount, self.now(), &oracle));
        self.locks.set(&caller, table);

        let deposit_token_address = self.configured(&self.deposit_token);
        let vault_address = self.configured(&self.vault);
        VaultGatewayContractRef::new(self.env().clone(), vault_address).withdraw(
            deposit_token_address,
            receipt.deposit_amount,
            caller,
        );
        self.wrapped_token_ref().burn(caller, receipt.wrapped_amount);

        self.env().emit_event(events::Unstaked {
            receiver: caller,
            deposit_amount: receipt.deposit_amount,
            wrapped_amount: receipt.wrapped_amount,
        });
    }

    // ==========================================
    // Privileged Functions
    // ==========================================

    /// Reprice all of `owner`'s locks at the current rate and mint or burn the difference
    pub fn adjust_balance_of(&mut self, owner: Address) {
        self.require_capability(Action::AdjustBalance);
        let oracle = self.rate_oracle();

        let mut table = self.locks.get(&owner).unwrap_or_default();
        let receipt = self.ensure(engine::rebase(&mut table, &oracle));
        self.locks.set(&owner, table);

        match receipt.adjustment {
            Adjustment::Mint(amount) => self.wrapped_token_ref().mint(owner, amount),
            Adjustment::Burn(amount) => self.wrapped_token_ref().burn(owner, amount),
            Adjustment::Unchanged => {}
        }

        self.env().emit_event(events::StakedLockAdjusted {
            owner,
            amount: receipt.reconciled,
            delta: receipt.adjustment.amount(),
            minted: matches!(receipt.adjustment, Adjustment::Mint(_)),
        });
    }

    pub fn change_min_lock_time(&mut self, min_lock_time: u64) {
        self.require_capability(Action::ChangeLockTime);
        self.min_lock_time.set(min_lock_time);
        self.env()
            .emit_event(events::MinLockTimeChanged { min_lock_time });
    }

    /// New limit applies to future stakes; existing locks are kept.
    pub fn change_max_locks(&mut self, max_locks: u32) {
        self.require_capability(Action::ChangeMaxLocks);
        self.require_max_locks_in_range(max_locks);
        self.max_locks.set(max_locks);
        self.env().emit_event(events::MaxLocksChanged { max_locks });
    }

    pub fn change_vault(&mut self, vault: Address) {
        self.require_capability(Action::ChangeVault);
        self.require_contract(&vault);
        self.vault.set(vault);
        self.env().emit_event(events::VaultChanged { vault });
    }

    // ==========================================
    // View Functions
    // ==========================================

    /// Lock slots of `account` in slot order; `None` marks an empty slot.
    ///
    /// The table grows on demand, so the result is as long as the highest slot
    /// ever used by `account` (empty for a new account), never longer than the
    /// largest `max_locks` in force while it staked.
    pub fn get_locks(&self, account: Address) -> Vec<Option<Lock>> {
        self.locks
            .get(&account)
            .map(|table| table.slots().to_vec())
            .unwrap_or_default()
    }

    /// Deposit tokens locked by `account`, matured or not
    pub fn staked_amount_of(&self, account: Address) -> U256 {
        self.table_of(account).staked_amount()
    }

    /// Deposit tokens `account` could unstake right now
    pub fn unlocked_amount_of(&self, account: Address) -> U256 {
        self.table_of(account).unlocked_amount(self.now())
    }

    pub fn locked_amount_of(&self, account: Address) -> U256 {
        self.table_of(account).locked_amount(self.now())
    }

    /// Wrapped tokens recorded against `account`'s locks
    pub fn wrapped_amount_of(&self, account: Address) -> U256 {
        self.table_of(account).wrapped_amount()
    }

    /// Wrapped tokens a stake of `amount` would mint at the current rate
    pub fn preview_wrapped(&self, amount: U256) -> U256 {
        let rate = ExchangeRate::capture(&self.rate_oracle());
        self.ensure(converter::to_wrapped(&rate, amount))
    }

    pub fn min_lock_time(&self) -> u64 {
        self.min_lock_time.get_or_default()
    }

    pub fn max_locks(&self) -> u32 {
        self.max_locks.get_or_default()
    }

    pub fn max_locks_ceiling(&self) -> u32 {
        MAX_LOCKS_CEILING
    }

    pub fn wrapped_token(&self) -> Option<Address> {
        self.wrapped_token.get()
    }

    pub fn vault(&self) -> Option<Address> {
        self.vault.get()
    }

    pub fn deposit_token(&self) -> Option<Address> {
        self.deposit_token.get()
    }

    pub fn permissions(&self) -> Option<Address> {
        self.permissions.get()
    }
}

// ==========================================
// Internal Functions
// ==========================================

impl Steroids {
    fn ensure<T>(&self, result: Result<T, SteroidsError>) -> T {
        match result {
            Ok(value) => value,
            Err(error) => self.env().revert(error),
        }
    }

    fn configured(&self, reference: &Var<Address>) -> Address {
        match reference.get() {
            Some(address) => address,
            None => self.env().revert(SteroidsError::NotConfigured),
        }
    }

    fn now(&self) -> u64 {
        self.env().get_block_time() / MILLIS_PER_SECOND
    }

    fn policy(&self) -> LockPolicy {
        LockPolicy {
            min_lock_time: self.min_lock_time.get_or_default(),
            max_locks: self.max_locks.get_or_default(),
        }
    }

    fn table_of(&self, account: Address) -> LockTable {
        self.locks.get(&account).unwrap_or_default()
    }

    fn rate_oracle(&self) -> RateOracleContractRef {
        RateOracleContractRef::new(self.env().clone(), self.configured(&self.deposit_token))
    }

    fn wrapped_token_ref(&self) -> WrappedTokenServiceContractRef {
        WrappedTokenServiceContractRef::new(
            self.env().clone(),
            self.configured(&self.wrapped_token),
        )
    }

    fn require_capability(&self, action: Action) {
        let caller = self.env().caller();
        let permissions = CapabilityCheckContractRef::new(
            self.env().clone(),
            self.configured(&self.permissions),
        );
        if !permissions.authorize(caller, action) {
            self.env().revert(SteroidsError::Unauthorized);
        }
    }

    fn require_contract(&self, address: &Address) {
        if address.as_contract_package_hash().is_none() {
            self.env().revert(SteroidsError::AddressNotContract);
        }
    }

    fn require_max_locks_in_range(&self, max_locks: u32) {
        if max_locks == 0 {
            self.env().revert(SteroidsError::MaxLocksTooLow);
        }
        if max_locks > MAX_LOCKS_CEILING {
            self.env().revert(SteroidsError::MaxLocksTooHigh);
        }
    }
}
