//! Per-account lock table
//!
//! An ordered sequence of slots. A slot is either empty (`None`) or holds a
//! [`Lock`]. Insertion is first-fit and consumption scans from slot 0, so slot
//! order is part of the ledger's observable behaviour.

use alloc::vec::Vec;
use odra::casper_types::U256;
use odra::prelude::*;

use crate::errors::SteroidsError;

/// Hard upper bound for the configurable `max_locks`
pub const MAX_LOCKS_CEILING: u32 = 20;

/// Deposit tokens bound to a maturity time
#[odra::odra_type]
#[derive(Default)]
pub struct Lock {
    /// Seconds since epoch at stake time
    pub lock_start: u64,
    /// Seconds the deposit stays locked
    pub duration: u64,
    /// Deposit token units still held by this lock
    pub deposit_amount: U256,
    /// Wrapped token units recorded at the last stake, unstake or rebase
    pub wrapped_amount: U256,
}

impl Lock {
    pub fn new(lock_start: u64, duration: u64, deposit_amount: U256, wrapped_amount: U256) -> Self {
        Self {
            lock_start,
            duration,
            deposit_amount,
            wrapped_amount,
        }
    }

    pub fn unlock_time(&self) -> u64 {
        self.lock_start.saturating_add(self.duration)
    }

    /// Unlocked strictly after `lock_start + duration`
    pub fn is_unlocked(&self, now: u64) -> bool {
        self.unlock_time() < now
    }

    /// Both amounts reached zero
    pub fn is_drained(&self) -> bool {
        self.deposit_amount.is_zero() && self.wrapped_amount.is_zero()
    }
}

/// A portion of one lock drawn by an unstake
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Consumed {
    pub slot: usize,
    pub deposit_amount: U256,
    pub wrapped_amount: U256,
}

/// Lock slots of a single account
#[odra::odra_type]
#[derive(Default)]
pub struct LockTable {
    slots: Vec<Option<Lock>>,
}

impl LockTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// All slots in order, `None` marking an empty one
    pub fn slots(&self) -> &[Option<Lock>] {
        &self.slots
    }

    pub fn get(&self, slot: usize) -> Option<&Lock> {
        self.slots.get(slot).and_then(Option::as_ref)
    }

    /// Occupied slots with their indices, in slot order
    pub fn occupied(&self) -> impl Iterator<Item = (usize, &Lock)> + '_ {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(index, slot)| slot.as_ref().map(|lock| (index, lock)))
    }

    pub fn occupied_count(&self) -> usize {
        self.slots.iter().filter(|slot| slot.is_some()).count()
    }

    /// Run `apply` against a copy of the table and keep the copy only if it succeeds.
    pub fn transact<T, F>(&mut self, apply: F) -> Result<T, SteroidsError>
    where
        F: FnOnce(&mut LockTable) -> Result<T, SteroidsError>,
    {
        let mut staged = self.clone();
        let outcome = apply(&mut staged)?;
        *self = staged;
        Ok(outcome)
    }

    /// Place `lock` in the first empty slot, or append it while fewer than
    /// `max_locks` slots are occupied. Returns the slot index.
    pub fn insert(&mut self, lock: Lock, max_locks: u32) -> Result<usize, SteroidsError> {
        if let Some(index) = self.slots.iter().position(Option::is_none) {
            self.slots[index] = Some(lock);
            return Ok(index);
        }
        if self.occupied_count() >= max_locks as usize {
            return Err(SteroidsError::ImpossibleToInsert);
        }
        self.slots.push(Some(lock));
        Ok(self.slots.len() - 1)
    }

    /// Draw `amount` deposit tokens from unlocked slots in slot order.
    ///
    /// `wrapped_for` prices each drawn chunk; the result is subtracted from the
    /// slot's recorded wrapped amount. Slots whose amounts both reach zero are
    /// emptied. Either the full amount is drawn or the table is left untouched.
    pub fn consume<F>(
        &mut self,
        amount: U256,
        now: u64,
        mut wrapped_for: F,
    ) -> Result<Vec<Consumed>, SteroidsError>
    where
        F: FnMut(U256) -> Result<U256, SteroidsError>,
    {
        if self.unlocked_amount(now) < amount {
            return Err(SteroidsError::NotEnoughUnwrappableTokens);
        }

        self.transact(|table| {
            let mut remaining = amount;
            let mut consumed = Vec::new();

            for (index, slot) in table.slots.iter_mut().enumerate() {
                if remaining.is_zero() {
                    break;
                }
                let Some(lock) = slot else {
                    continue;
                };
                if !lock.is_unlocked(now) || lock.deposit_amount.is_zero() {
                    continue;
                }

                let chunk = remaining.min(lock.deposit_amount);
                let wrapped = wrapped_for(chunk)?;
                lock.deposit_amount -= chunk;
                lock.wrapped_amount = lock
                    .wrapped_amount
                    .checked_sub(wrapped)
                    .ok_or(SteroidsError::WrappedAmountOutOfSync)?;
                remaining -= chunk;

                let drained = lock.is_drained();
                if drained {
                    *slot = None;
                }
                consumed.push(Consumed {
                    slot: index,
                    deposit_amount: chunk,
                    wrapped_amount: wrapped,
                });
            }

            if !remaining.is_zero() {
                return Err(SteroidsError::NotEnoughUnwrappableTokens);
            }
            Ok(consumed)
        })
    }

    /// Replace the recorded wrapped amount of an occupied slot
    pub fn rewrite(&mut self, slot: usize, wrapped_amount: U256) -> Result<(), SteroidsError> {
        let lock = self
            .slots
            .get_mut(slot)
            .and_then(Option::as_mut)
            .ok_or(SteroidsError::SlotNotOccupied)?;
        lock.wrapped_amount = wrapped_amount;
        Ok(())
    }

    /// Empty every occupied slot whose amounts are both zero. Returns how many were freed.
    pub fn reclaim_drained(&mut self) -> usize {
        let mut reclaimed = 0;
        for slot in self.slots.iter_mut() {
            if slot.as_ref().is_some_and(Lock::is_drained) {
                *slot = None;
                reclaimed += 1;
            }
        }
        reclaimed
    }

    /// Deposit tokens held by all occupied slots
    pub fn staked_amount(&self) -> U256 {
        self.sum_deposits(|_| true)
    }

    /// Deposit tokens that an unstake at `now` could draw
    pub fn unlocked_amount(&self, now: u64) -> U256 {
        self.sum_deposits(|lock| lock.is_unlocked(now))
    }

    pub fn locked_amount(&self, now: u64) -> U256 {
        self.sum_deposits(|lock| !lock.is_unlocked(now))
    }

    /// Wrapped tokens recorded across occupied slots
    pub fn wrapped_amount(&self) -> U256 {
        self.occupied()
            .fold(U256::zero(), |total, (_, lock)| total.saturating_add(lock.wrapped_amount))
    }

    fn sum_deposits<P: Fn(&Lock) -> bool>(&self, include: P) -> U256 {
        self.occupied()
            .filter(|(_, lock)| include(lock))
            .fold(U256::zero(), |total, (_, lock)| total.saturating_add(lock.deposit_amount))
    }
}
