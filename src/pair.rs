//! Liquidity pair
//!
//! Minimal constant-reserve pool: its CEP-18 shares are the deposit token staked
//! in the ledger, and `reserve / total_supply` is the rate the ledger converts at.
//! Only the reference-asset side of the pool is tracked.

use alloc::string::String;
use odra::casper_types::U256;
use odra::prelude::*;
use odra_modules::cep18::events::{
    Burn, DecreaseAllowance, IncreaseAllowance, Mint, SetAllowance, Transfer, TransferFrom,
};
use odra_modules::cep18_token::Cep18;

pub mod events {
    use odra::casper_types::U256;
    use odra::prelude::*;

    #[odra::event]
    pub struct LiquidityAdded {
        pub to: Address,
        pub reserve_amount: U256,
        pub shares: U256,
    }

    #[odra::event]
    pub struct LiquidityRemoved {
        pub provider: Address,
        pub shares: U256,
        pub reserve_amount: U256,
    }

    #[odra::event]
    pub struct ReserveSynced {
        pub reserve: U256,
    }
}

#[odra::odra_error]
pub enum PairError {
    InsufficientLiquidityMinted = 61001,
    InsufficientLiquidityBurned = 61002,
    Unauthorized = 61003,
}

#[odra::module(
    events = [
        Mint,
        Burn,
        SetAllowance,
        IncreaseAllowance,
        DecreaseAllowance,
        Transfer,
        TransferFrom,
        events::LiquidityAdded,
        events::LiquidityRemoved,
        events::ReserveSynced
    ],
    errors = PairError
)]
pub struct LiquidityPair {
    token: SubModule<Cep18>,
    reserve: Var<U256>,
    owner: Var<Address>,
}

#[odra::module]
impl LiquidityPair {
    pub fn init(&mut self, symbol: String, name: String) {
        self.token.init(symbol, name, 18u8, U256::zero());
        self.reserve.set(U256::zero());
        self.owner.set(self.env().caller());
    }

    /// Reference asset held by the pool
    pub fn reserve(&self) -> U256 {
        self.reserve.get_or_default()
    }

    pub fn total_supply(&self) -> U256 {
        self.token.total_supply()
    }

    /// Add `reserve_amount` of the reference asset and mint shares to `to`.
    /// The first provider gets one share per reserve unit, later ones get
    /// shares in proportion to the current reserve.
    pub fn add_liquidity(&mut self, to: Address, reserve_amount: U256) {
        let reserve = self.reserve.get_or_default();
        let supply = self.token.total_supply();
        let shares = if supply.is_zero() || reserve.is_zero() {
            reserve_amount
        } else {
            reserve_amount * supply / reserve
        };
        if shares.is_zero() {
            self.env().revert(PairError::InsufficientLiquidityMinted);
        }

        self.reserve.set(reserve + reserve_amount);
        self.token.raw_mint(&to, &shares);
        self.env().emit_event(events::LiquidityAdded {
            to,
            reserve_amount,
            shares,
        });
    }

    /// Burn the caller's `shares` and release the matching part of the reserve
    pub fn remove_liquidity(&mut self, shares: U256) {
        let provider = self.env().caller();
        let reserve = self.reserve.get_or_default();
        let supply = self.token.total_supply();
        if shares.is_zero() || supply.is_zero() || self.token.balance_of(&provider) < shares {
            self.env().revert(PairError::InsufficientLiquidityBurned);
        }

        let reserve_amount = shares * reserve / supply;
        self.token.raw_burn(&provider, &shares);
        self.reserve.set(reserve - reserve_amount);
        self.env().emit_event(events::LiquidityRemoved {
            provider,
            shares,
            reserve_amount,
        });
    }

    /// Record a reserve that moved outside of liquidity provision (swaps, fees).
    /// Owner only.
    pub fn sync(&mut self, reserve: U256) {
        if self.owner.get() != Some(self.env().caller()) {
            self.env().revert(PairError::Unauthorized);
        }
        self.reserve.set(reserve);
        self.env().emit_event(events::ReserveSynced { reserve });
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

    pub fn balance_of(&self, owner: Address) -> U256 {
        self.token.balance_of(&owner)
    }

    pub fn allowance(&self, owner: Address, spender: Address) -> U256 {
        self.token.allowance(&owner, &spender)
    }

    pub fn transfer(&mut self, recipient: Address, amount: U256) {
        self.token.transfer(&recipient, &amount);
    }

    pub fn approve(&mut self, spender: Address, amount: U256) {
        self.token.approve(&spender, &amount);
    }

    pub fn increase_allowance(&mut self, spender: Address, amount: U256) {
        self.token.increase_allowance(&spender, &amount);
    }

    pub fn decrease_allowance(&mut self, spender: Address, amount: U256) {
        self.token.decrease_allowance(&spender, &amount);
    }

    pub fn transfer_from(&mut self, owner: Address, recipient: Address, amount: U256) {
        self.token.transfer_from(&owner, &recipient, &amount);
    }
}
