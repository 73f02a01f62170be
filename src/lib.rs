//! Steroids x Casper: Time-Locked Liquidity Staking (Odra)
//!
//! Lock liquidity pool shares and receive a wrapped balance tracking their
//! reference-asset value.
//! - Steroids: lock ledger (stake / unstake / rebase) over per-account slot tables
//! - WrappedToken: CEP-18 token mintable only by the ledger
//! - LiquidityPair: pool share token doubling as the rate oracle
//! - Vault: custodian of the locked shares
//! - Permissions: capability registry for privileged ledger calls

#![cfg_attr(target_arch = "wasm32", no_std)]

extern crate alloc;

pub mod converter;
pub mod engine;
pub mod errors;
pub mod external;
pub mod lock_table;
pub mod pair;
pub mod permissions;
pub mod steroids;
pub mod tokens;
pub mod vault;
