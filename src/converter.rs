//! Deposit token to wrapped token conversion
//!
//! `wrapped = floor(amount * reserve / total_supply)`, where `reserve` and
//! `total_supply` describe the liquidity pool backing the deposit token.
//! Rounding is always down.

use odra::casper_types::U256;

use crate::errors::SteroidsError;

/// Source of the live conversion rate.
///
/// Implementations must answer from current state on every call; callers never
/// cache the values across conversions.
pub trait RateSource {
    /// Reference asset reserve held by the pool
    fn current_reserve(&self) -> U256;
    /// Total supply of pool shares (the deposit token)
    fn current_total_supply(&self) -> U256;
}

/// Point-in-time rate, used by `preview_wrapped` and for fixed rates in tests
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExchangeRate {
    pub reserve: U256,
    pub total_supply: U256,
}

impl ExchangeRate {
    pub fn new(reserve: U256, total_supply: U256) -> Self {
        Self {
            reserve,
            total_supply,
        }
    }

    /// Snapshot another source
    pub fn capture<R: RateSource + ?Sized>(source: &R) -> Self {
        Self::new(source.current_reserve(), source.current_total_supply())
    }
}

impl RateSource for ExchangeRate {
    fn current_reserve(&self) -> U256 {
        self.reserve
    }

    fn current_total_supply(&self) -> U256 {
        self.total_supply
    }
}

/// Convert `amount` deposit tokens into wrapped tokens at the source's current rate.
pub fn to_wrapped<R: RateSource + ?Sized>(source: &R, amount: U256) -> Result<U256, SteroidsError> {
    let total_supply = source.current_total_supply();
    if total_supply.is_zero() {
        return Err(SteroidsError::OracleNotInitialized);
    }
    let reserve = source.current_reserve();
    let scaled = amount
        .checked_mul(reserve)
        .ok_or(SteroidsError::ArithmeticOverflow)?;
    Ok(scaled / total_supply)
}
