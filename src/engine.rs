//! Stake, unstake and rebase over one account's lock table.
//!
//! The functions here never touch tokens. They validate, mutate the table they
//! are handed (all-or-nothing, see [`LockTable::transact`]) and return a receipt
//! describing the token movements the caller has to perform.

use alloc::vec::Vec;
use odra::casper_types::U256;

use crate::converter::{to_wrapped, RateSource};
use crate::errors::SteroidsError;
use crate::lock_table::{Consumed, Lock, LockTable};

/// Ledger-wide limits applied to stakes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LockPolicy {
    pub min_lock_time: u64,
    pub max_locks: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StakeRequest {
    pub amount: U256,
    pub duration: u64,
    /// Deposit token allowance granted by the depositor to the ledger
    pub allowance: U256,
    pub now: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StakeReceipt {
    pub slot: usize,
    pub lock: Lock,
}

impl StakeReceipt {
    /// Wrapped tokens to mint to the receiver
    pub fn wrapped_amount(&self) -> U256 {
        self.lock.wrapped_amount
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnstakeReceipt {
    /// Deposit tokens to release from the vault
    pub deposit_amount: U256,
    /// Wrapped tokens to burn from the caller
    pub wrapped_amount: U256,
    pub consumed: Vec<Consumed>,
}

/// Wrapped token movement produced by a rebase
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Adjustment {
    Unchanged,
    Mint(U256),
    Burn(U256),
}

impl Adjustment {
    pub fn amount(&self) -> U256 {
        match self {
            Adjustment::Unchanged => U256::zero(),
            Adjustment::Mint(amount) | Adjustment::Burn(amount) => *amount,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RebaseReceipt {
    /// Sum of recorded wrapped amounts before the rebase
    pub prior: U256,
    /// Sum of wrapped amounts at the current rate
    pub reconciled: U256,
    pub adjustment: Adjustment,
    /// Drained slots freed by the rebase
    pub reclaimed: usize,
}

/// Record a new lock for the stake's receiver.
///
/// Checks run in a fixed order: amount, duration, allowance. The wrapped amount
/// is priced once and used both for the stored lock and for the mint.
pub fn stake<R: RateSource + ?Sized>(
    table: &mut LockTable,
    request: &StakeRequest,
    policy: &LockPolicy,
    rate: &R,
) -> Result<StakeReceipt, SteroidsError> {
    if request.amount.is_zero() {
        return Err(SteroidsError::AmountTooLow);
    }
    if request.duration < policy.min_lock_time {
        return Err(SteroidsError::LockTimeTooLow);
    }
    if request.allowance < request.amount {
        return Err(SteroidsError::TokensNotApproved);
    }

    let wrapped_amount = to_wrapped(rate, request.amount)?;
    let lock = Lock::new(request.now, request.duration, request.amount, wrapped_amount);
    let slot = table.insert(lock.clone(), policy.max_locks)?;

    Ok(StakeReceipt { slot, lock })
}

/// Draw `amount` deposit tokens from the table's unlocked locks.
///
/// Every drawn chunk is priced at the current rate, not at the rate recorded
/// when the lock was created.
pub fn unstake<R: RateSource + ?Sized>(
    table: &mut LockTable,
    amount: U256,
    now: u64,
    rate: &R,
) -> Result<UnstakeReceipt, SteroidsError> {
    if amount.is_zero() {
        return Err(SteroidsError::AmountTooLow);
    }

    let consumed = table.consume(amount, now, |chunk| to_wrapped(rate, chunk))?;
    let wrapped_amount = consumed.iter().try_fold(U256::zero(), |total, part| {
        total
            .checked_add(part.wrapped_amount)
            .ok_or(SteroidsError::ArithmeticOverflow)
    })?;

    Ok(UnstakeReceipt {
        deposit_amount: amount,
        wrapped_amount,
        consumed,
    })
}

/// Reprice every occupied lock at the current rate.
///
/// All recorded wrapped amounts are rewritten, including the ones that already
/// match, and the difference between the old and new totals is returned as a
/// mint or a burn.
pub fn rebase<R: RateSource + ?Sized>(
    table: &mut LockTable,
    rate: &R,
) -> Result<RebaseReceipt, SteroidsError> {
    table.transact(|table| {
        let targets: Vec<(usize, U256, U256)> = table
            .occupied()
            .map(|(slot, lock)| (slot, lock.deposit_amount, lock.wrapped_amount))
            .collect();

        let mut prior = U256::zero();
        let mut reconciled = U256::zero();
        for (slot, deposit_amount, recorded) in targets {
            let correct = to_wrapped(rate, deposit_amount)?;
            prior = prior
                .checked_add(recorded)
                .ok_or(SteroidsError::ArithmeticOverflow)?;
            reconciled = reconciled
                .checked_add(correct)
                .ok_or(SteroidsError::ArithmeticOverflow)?;
            table.rewrite(slot, correct)?;
        }
        let reclaimed = table.reclaim_drained();

        let adjustment = if reconciled > prior {
            Adjustment::Mint(reconciled - prior)
        } else if reconciled < prior {
            Adjustment::Burn(prior - reconciled)
        } else {
            Adjustment::Unchanged
        };

        Ok(RebaseReceipt {
            prior,
            reconciled,
            adjustment,
            reclaimed,
        })
    })
}
