//! Interfaces of the contracts the ledger calls into
//!
//! The ledger only knows these entry points. Any contract exposing them under
//! the same names and argument names can be plugged in at `init` or through
//! `change_vault`.

use odra::casper_types::U256;
use odra::prelude::*;

use crate::permissions::Action;

/// Fungible token locked by stakers (a liquidity pool share)
#[odra::external_contract]
pub trait DepositTokenService {
    fn transfer(&mut self, recipient: Address, amount: U256);
    fn transfer_from(&mut self, owner: Address, recipient: Address, amount: U256);
    fn balance_of(&self, owner: Address) -> U256;
    fn allowance(&self, owner: Address, spender: Address) -> U256;
}

/// Token minted against locked deposits
#[odra::external_contract]
pub trait WrappedTokenService {
    fn mint(&mut self, to: Address, amount: U256);
    fn burn(&mut self, from: Address, amount: U256);
    fn balance_of(&self, owner: Address) -> U256;
}

/// Custodian of the locked deposit tokens
#[odra::external_contract]
pub trait VaultGateway {
    fn deposit(&mut self, token: Address, amount: U256);
    fn withdraw(&mut self, token: Address, amount: U256, to: Address);
}

/// Pool backing the deposit token; `reserve / total_supply` is the conversion rate
#[odra::external_contract]
pub trait RateOracle {
    fn reserve(&self) -> U256;
    fn total_supply(&self) -> U256;
}

#[odra::external_contract]
pub trait CapabilityCheck {
    fn authorize(&self, caller: Address, action: Action) -> bool;
}
