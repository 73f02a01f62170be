//! Build contract binary for Odra WASM generation
//!
//! This binary is compiled to WASM and contains the contract entry points.

#![cfg_attr(target_arch = "wasm32", no_std)]
#![cfg_attr(target_arch = "wasm32", no_main)]

#[cfg(target_arch = "wasm32")]
extern crate odra_casper_wasm_env;

#[cfg(target_arch = "wasm32")]
use steroids_casper::pair::LiquidityPair;
#[cfg(target_arch = "wasm32")]
use steroids_casper::permissions::Permissions;
#[cfg(target_arch = "wasm32")]
use steroids_casper::steroids::Steroids;
#[cfg(target_arch = "wasm32")]
use steroids_casper::tokens::WrappedToken;
#[cfg(target_arch = "wasm32")]
use steroids_casper::vault::Vault;
#[cfg(target_arch = "wasm32")]
use odra_casper_wasm_env as _;

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    panic!("steroids_casper_build_contract is intended to be built for wasm32-unknown-unknown only");
}
