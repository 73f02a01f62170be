//! Ledger errors
//!
//! Every failure aborts the whole operation. Codes are stable and shared by the
//! pure ledger modules and the `Steroids` contract.

use odra::prelude::*;

/// Errors raised by the lock ledger
#[odra::odra_error]
pub enum SteroidsError {
    // Stake or unstake of zero tokens
    AmountTooLow = 1,
    // Requested lock duration is below the configured minimum
    LockTimeTooLow = 2,
    // Deposit token allowance to the ledger does not cover the stake
    TokensNotApproved = 3,
    // No empty slot and the table already holds `max_locks` locks
    ImpossibleToInsert = 4,
    // Unlocked locks cannot supply the requested unstake amount
    NotEnoughUnwrappableTokens = 5,
    MaxLocksTooHigh = 6,
    MaxLocksTooLow = 7,
    AddressNotContract = 8,
    Unauthorized = 9,
    // A lock's recorded wrapped amount is smaller than the burn it must cover.
    // The account has to be rebased before retrying.
    WrappedAmountOutOfSync = 10,
    // The rate oracle reports a zero total supply
    OracleNotInitialized = 11,
    ArithmeticOverflow = 12,
    SlotNotOccupied = 13,
    NotConfigured = 14,
}
