//! Ledger Engine Tests
//!
//! Stake, unstake and rebase against fixed exchange rates.

use odra::casper_types::U256;
use proptest::prelude::*;

use steroids_casper::converter::{to_wrapped, ExchangeRate, RateSource};
use steroids_casper::engine::{self, Adjustment, LockPolicy, StakeRequest};
use steroids_casper::errors::SteroidsError;
use steroids_casper::lock_table::{Lock, LockTable};

const WEEK: u64 = 7 * 24 * 60 * 60;
const START: u64 = 1_700_000_000;

fn u(value: u64) -> U256 {
    U256::from(value)
}

fn ok<T>(result: Result<T, SteroidsError>) -> T {
    match result {
        Ok(value) => value,
        Err(_) => panic!("unexpected ledger error"),
    }
}

fn policy() -> LockPolicy {
    LockPolicy {
        min_lock_time: WEEK,
        max_locks: 20,
    }
}

fn request(amount: u64, duration: u64) -> StakeRequest {
    StakeRequest {
        amount: u(amount),
        duration,
        allowance: u(amount),
        now: START,
    }
}

/// 2 reserve units per pool share
fn double_rate() -> ExchangeRate {
    ExchangeRate::new(u(2_000), u(1_000))
}

// ==========================================
// Conversion
// ==========================================

#[test]
fn test_to_wrapped_rounds_down() {
    let rate = ExchangeRate::new(u(10), u(3));

    assert_eq!(ok(to_wrapped(&rate, u(1))), u(3));
    assert_eq!(ok(to_wrapped(&rate, u(2))), u(6));
    assert_eq!(ok(to_wrapped(&rate, U256::zero())), U256::zero());
}

#[test]
fn test_to_wrapped_requires_supply() {
    let rate = ExchangeRate::new(u(10), U256::zero());
    assert!(matches!(
        to_wrapped(&rate, u(1)),
        Err(SteroidsError::OracleNotInitialized)
    ));
}

#[test]
fn test_to_wrapped_overflow_is_reported() {
    let rate = ExchangeRate::new(U256::MAX, u(1));
    assert!(matches!(
        to_wrapped(&rate, u(2)),
        Err(SteroidsError::ArithmeticOverflow)
    ));
}

#[test]
fn test_capture_snapshots_source() {
    let rate = ExchangeRate::capture(&double_rate());
    assert_eq!(rate.current_reserve(), u(2_000));
    assert_eq!(rate.current_total_supply(), u(1_000));
}

// ==========================================
// Stake
// ==========================================

#[test]
fn test_stake_records_lock_and_prices_wrapped() {
    let mut table = LockTable::new();

    let receipt = ok(engine::stake(&mut table, &request(50, WEEK), &policy(), &double_rate()));

    assert_eq!(receipt.slot, 0);
    assert_eq!(receipt.wrapped_amount(), u(100));
    assert_eq!(
        table.get(0),
        Some(&Lock::new(START, WEEK, u(50), u(100)))
    );
}

#[test]
fn test_stake_checks_amount_first() {
    let mut table = LockTable::new();
    let request = StakeRequest {
        amount: U256::zero(),
        duration: 0,
        allowance: U256::zero(),
        now: START,
    };

    assert!(matches!(
        engine::stake(&mut table, &request, &policy(), &double_rate()),
        Err(SteroidsError::AmountTooLow)
    ));
}

#[test]
fn test_stake_checks_duration_before_allowance() {
    let mut table = LockTable::new();
    let request = StakeRequest {
        amount: u(10),
        duration: WEEK - 1,
        allowance: U256::zero(),
        now: START,
    };

    assert!(matches!(
        engine::stake(&mut table, &request, &policy(), &double_rate()),
        Err(SteroidsError::LockTimeTooLow)
    ));
}

#[test]
fn test_stake_without_allowance_is_rejected() {
    let mut table = LockTable::new();
    let mut request = request(10, WEEK);
    request.allowance = u(9);

    assert!(matches!(
        engine::stake(&mut table, &request, &policy(), &double_rate()),
        Err(SteroidsError::TokensNotApproved)
    ));
    assert_eq!(table.occupied_count(), 0);
}

#[test]
fn test_stake_with_empty_pool_is_rejected() {
    let mut table = LockTable::new();
    let empty = ExchangeRate::new(U256::zero(), U256::zero());

    assert!(matches!(
        engine::stake(&mut table, &request(10, WEEK), &policy(), &empty),
        Err(SteroidsError::OracleNotInitialized)
    ));
    assert_eq!(table.occupied_count(), 0);
}

#[test]
fn test_stake_beyond_max_locks_is_rejected() {
    let mut table = LockTable::new();
    let policy = LockPolicy {
        min_lock_time: WEEK,
        max_locks: 2,
    };
    ok(engine::stake(&mut table, &request(1, WEEK), &policy, &double_rate()));
    ok(engine::stake(&mut table, &request(1, WEEK), &policy, &double_rate()));

    assert!(matches!(
        engine::stake(&mut table, &request(1, WEEK), &policy, &double_rate()),
        Err(SteroidsError::ImpossibleToInsert)
    ));
}

// ==========================================
// Unstake
// ==========================================

#[test]
fn test_unstake_zero_is_rejected() {
    let mut table = LockTable::new();
    assert!(matches!(
        engine::unstake(&mut table, U256::zero(), START, &double_rate()),
        Err(SteroidsError::AmountTooLow)
    ));
}

#[test]
fn test_unstake_prices_at_current_rate() {
    let mut table = LockTable::new();
    ok(engine::stake(&mut table, &request(100, WEEK), &policy(), &double_rate()));

    // Pool reserve halves while the lock matures
    let halved = ExchangeRate::new(u(1_000), u(1_000));
    let receipt = ok(engine::unstake(&mut table, u(40), START + WEEK + 1, &halved));

    assert_eq!(receipt.deposit_amount, u(40));
    assert_eq!(receipt.wrapped_amount, u(40));
    let lock = table.get(0).expect("partially drawn lock stays");
    assert_eq!(lock.deposit_amount, u(60));
    assert_eq!(lock.wrapped_amount, u(160));
}

#[test]
fn test_unstake_across_locks_sums_wrapped() {
    let mut table = LockTable::new();
    ok(engine::stake(&mut table, &request(10, WEEK), &policy(), &double_rate()));
    ok(engine::stake(&mut table, &request(200, WEEK), &policy(), &double_rate()));

    let receipt = ok(engine::unstake(&mut table, u(160), START + WEEK + 1, &double_rate()));

    assert_eq!(receipt.consumed.len(), 2);
    assert_eq!(receipt.wrapped_amount, u(320));
    assert!(table.get(0).is_none());
    assert_eq!(table.staked_amount(), u(50));
    assert_eq!(table.wrapped_amount(), u(100));
}

#[test]
fn test_unstake_after_rate_rise_needs_rebase() {
    let mut table = LockTable::new();
    ok(engine::stake(&mut table, &request(100, WEEK), &policy(), &double_rate()));
    let before = table.clone();

    let tripled = ExchangeRate::new(u(3_000), u(1_000));
    let now = START + WEEK + 1;
    assert!(matches!(
        engine::unstake(&mut table, u(100), now, &tripled),
        Err(SteroidsError::WrappedAmountOutOfSync)
    ));
    assert_eq!(table, before);

    ok(engine::rebase(&mut table, &tripled));
    let receipt = ok(engine::unstake(&mut table, u(100), now, &tripled));
    assert_eq!(receipt.wrapped_amount, u(300));
    assert_eq!(table.occupied_count(), 0);
}

#[test]
fn test_unstake_locked_tokens_is_rejected() {
    let mut table = LockTable::new();
    ok(engine::stake(&mut table, &request(100, WEEK), &policy(), &double_rate()));

    assert!(matches!(
        engine::unstake(&mut table, u(1), START + WEEK, &double_rate()),
        Err(SteroidsError::NotEnoughUnwrappableTokens)
    ));
}

// ==========================================
// Rebase
// ==========================================

#[test]
fn test_rebase_mints_when_rate_rises() {
    let mut table = LockTable::new();
    ok(engine::stake(&mut table, &request(100, WEEK), &policy(), &double_rate()));
    ok(engine::stake(&mut table, &request(50, 2 * WEEK), &policy(), &double_rate()));

    let tripled = ExchangeRate::new(u(3_000), u(1_000));
    let receipt = ok(engine::rebase(&mut table, &tripled));

    assert_eq!(receipt.prior, u(300));
    assert_eq!(receipt.reconciled, u(450));
    assert_eq!(receipt.adjustment, Adjustment::Mint(u(150)));
    assert_eq!(table.wrapped_amount(), u(450));
}

#[test]
fn test_rebase_burns_when_rate_falls() {
    let mut table = LockTable::new();
    ok(engine::stake(&mut table, &request(100, WEEK), &policy(), &double_rate()));

    let halved = ExchangeRate::new(u(1_000), u(1_000));
    let receipt = ok(engine::rebase(&mut table, &halved));

    assert_eq!(receipt.adjustment, Adjustment::Burn(u(100)));
    assert_eq!(receipt.adjustment.amount(), u(100));
    assert_eq!(table.get(0).map(|lock| lock.wrapped_amount), Some(u(100)));
}

#[test]
fn test_rebase_is_idempotent() {
    let mut table = LockTable::new();
    ok(engine::stake(&mut table, &request(77, WEEK), &policy(), &double_rate()));
    let rate = ExchangeRate::new(u(7), u(3));

    ok(engine::rebase(&mut table, &rate));
    let after_first = table.clone();
    let receipt = ok(engine::rebase(&mut table, &rate));

    assert_eq!(receipt.adjustment, Adjustment::Unchanged);
    assert_eq!(receipt.adjustment.amount(), U256::zero());
    assert_eq!(table, after_first);
}

#[test]
fn test_rebase_reclaims_dust_slots() {
    let mut table = LockTable::new();
    ok(engine::stake(&mut table, &request(100, WEEK), &policy(), &double_rate()));
    // Rate drop leaves wrapped dust behind once the deposit is gone
    let halved = ExchangeRate::new(u(1_000), u(1_000));
    ok(engine::unstake(&mut table, u(100), START + WEEK + 1, &halved));
    assert_eq!(table.occupied_count(), 1);

    let receipt = ok(engine::rebase(&mut table, &halved));

    assert_eq!(receipt.reclaimed, 1);
    assert_eq!(receipt.adjustment, Adjustment::Burn(u(100)));
    assert_eq!(table.occupied_count(), 0);
}

#[test]
fn test_rebase_of_empty_table_is_unchanged() {
    let mut table = LockTable::new();
    let receipt = ok(engine::rebase(&mut table, &double_rate()));

    assert_eq!(receipt.prior, U256::zero());
    assert_eq!(receipt.reconciled, U256::zero());
    assert_eq!(receipt.adjustment, Adjustment::Unchanged);
}

#[test]
fn test_rebase_failure_leaves_table_unchanged() {
    let mut table = LockTable::new();
    ok(engine::stake(&mut table, &request(100, WEEK), &policy(), &double_rate()));
    let before = table.clone();

    let drained_pool = ExchangeRate::new(u(5), U256::zero());
    assert!(matches!(
        engine::rebase(&mut table, &drained_pool),
        Err(SteroidsError::OracleNotInitialized)
    ));
    assert_eq!(table, before);
}

// ==========================================
// Properties
// ==========================================

proptest! {
    #[test]
    fn prop_to_wrapped_never_exceeds_exact_value(
        amount in 0u64..1_000_000_000,
        reserve in 0u64..1_000_000_000,
        supply in 1u64..1_000_000_000,
    ) {
        let rate = ExchangeRate::new(u(reserve), u(supply));
        let wrapped = ok(to_wrapped(&rate, u(amount)));

        let exact = u(amount) * u(reserve);
        prop_assert!(wrapped * u(supply) <= exact);
        prop_assert!(exact < (wrapped + U256::one()) * u(supply));
    }

    #[test]
    fn prop_unstake_conserves_deposits(
        deposits in proptest::collection::vec(1u64..10_000, 1..20),
        fraction in 0u64..=100,
    ) {
        let mut table = LockTable::new();
        for deposit in &deposits {
            ok(engine::stake(&mut table, &request(*deposit, WEEK), &policy(), &double_rate()));
        }
        let total: u64 = deposits.iter().sum();
        let amount = (total * fraction / 100).max(1);

        let receipt = ok(engine::unstake(&mut table, u(amount), START + WEEK + 1, &double_rate()));

        prop_assert_eq!(receipt.deposit_amount, u(amount));
        prop_assert_eq!(table.staked_amount() + u(amount), u(total));
        prop_assert_eq!(
            receipt.consumed.iter().fold(U256::zero(), |sum, part| sum + part.deposit_amount),
            u(amount)
        );
        // 2:1 rate prices every chunk exactly
        prop_assert_eq!(table.wrapped_amount(), table.staked_amount() * u(2));
    }

    #[test]
    fn prop_wrapped_supply_matches_locks_at_any_fixed_rate(
        reserve in 1u64..100,
        supply in 1u64..100,
        steps in proptest::collection::vec((any::<bool>(), 1u64..5_000), 1..60),
    ) {
        let rate = ExchangeRate::new(u(reserve), u(supply));
        let now = START + WEEK + 1;
        let mut table = LockTable::new();
        let mut minted = U256::zero();
        let mut burned = U256::zero();

        for (is_stake, value) in steps {
            if is_stake {
                match engine::stake(&mut table, &request(value, WEEK), &policy(), &rate) {
                    Ok(receipt) => minted += receipt.wrapped_amount(),
                    // Slots held by wrapped remainders can fill the table
                    Err(SteroidsError::ImpossibleToInsert) => {}
                    Err(_) => prop_assert!(false, "stake of {} failed", value),
                }
            } else {
                let unlocked = table.unlocked_amount(now);
                if unlocked.is_zero() {
                    continue;
                }
                let amount = u(value).min(unlocked);
                match engine::unstake(&mut table, amount, now, &rate) {
                    Ok(receipt) => burned += receipt.wrapped_amount,
                    Err(_) => prop_assert!(false, "unstake of {} failed", amount),
                }
            }
            prop_assert_eq!(minted - burned, table.wrapped_amount());
        }
    }
}

#[test]
fn test_partial_unstakes_at_half_rate_leave_wrapped_remainder() {
    let half = ExchangeRate::new(u(1), u(2));
    let mut table = LockTable::new();
    let receipt = ok(engine::stake(&mut table, &request(3, WEEK), &policy(), &half));
    assert_eq!(receipt.wrapped_amount(), u(1));

    let now = START + WEEK + 1;
    for _ in 0..3 {
        let receipt = ok(engine::unstake(&mut table, u(1), now, &half));
        assert_eq!(receipt.wrapped_amount, U256::zero());
    }

    let lock = table.get(0).expect("remainder keeps the slot");
    assert!(lock.deposit_amount.is_zero());
    assert_eq!(lock.wrapped_amount, u(1));
    assert!(matches!(
        engine::unstake(&mut table, u(1), now, &half),
        Err(SteroidsError::NotEnoughUnwrappableTokens)
    ));

    let receipt = ok(engine::rebase(&mut table, &half));
    assert_eq!(receipt.adjustment, Adjustment::Burn(u(1)));
    assert_eq!(receipt.reclaimed, 1);
}
