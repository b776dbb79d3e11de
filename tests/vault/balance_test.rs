// Balance Tests
// Tests for planning deposits and transfers between accounts

use offer_ledger::identity::{AccountId, Keypair};
use offer_ledger::ledger::Amount;
use offer_ledger::vault::{BalanceError, BalanceUpdate, Balances};

fn account() -> AccountId {
    Keypair::generate().account_id()
}

fn units(n: u128) -> Amount {
    Amount::from_base_units(n)
}

fn balances_with(entries: &[(AccountId, u128)]) -> Balances {
    Balances::from_updates(entries.iter().map(|(account, balance)| BalanceUpdate {
        account: *account,
        balance: units(*balance),
    }))
}

// ============================================================================
// QUERIES
// ============================================================================

/// Test: Unknown account has zero
#[test]
fn test_unknown_account_has_zero() {
    let balances = Balances::new();
    assert_eq!(balances.balance_of(&account()), Amount::ZERO);
    assert_eq!(balances.account_count(), 0);
}

/// Test: can_afford compares against the current balance
#[test]
fn test_can_afford() {
    let alice = account();
    let balances = balances_with(&[(alice, 100)]);

    assert!(balances.can_afford(&alice, units(100)));
    assert!(!balances.can_afford(&alice, units(101)));
}

/// Test: Total sums every balance
#[test]
fn test_total() {
    let balances = balances_with(&[(account(), 100), (account(), 250)]);
    assert_eq!(balances.total(), Some(units(350)));
}

/// Test: Total is None when the sum overflows
#[test]
fn test_total_overflow_is_none() {
    let balances = balances_with(&[(account(), u128::MAX), (account(), 1)]);
    assert_eq!(balances.total(), None);
}

// ============================================================================
// DEPOSITS
// ============================================================================

/// Test: Planning a deposit computes the new balance without applying it
#[test]
fn test_plan_deposit() {
    let alice = account();
    let balances = balances_with(&[(alice, 10)]);

    let update = balances.plan_deposit(&alice, units(5)).unwrap();

    assert_eq!(update, BalanceUpdate { account: alice, balance: units(15) });
    assert_eq!(balances.balance_of(&alice), units(10));
}

/// Test: Plan deposit rejects zero
#[test]
fn test_plan_deposit_rejects_zero() {
    let balances = Balances::new();
    assert_eq!(
        balances.plan_deposit(&account(), Amount::ZERO),
        Err(BalanceError::InvalidAmount)
    );
}

/// Test: Plan deposit rejects overflow
#[test]
fn test_plan_deposit_rejects_overflow() {
    let alice = account();
    let balances = balances_with(&[(alice, u128::MAX)]);
    assert_eq!(
        balances.plan_deposit(&alice, units(1)),
        Err(BalanceError::BalanceOverflow)
    );
}

// ============================================================================
// TRANSFERS
// ============================================================================

/// Test: Planning a transfer moves the amount from sender to receiver
#[test]
fn test_plan_transfer_moves_amount() {
    let alice = account();
    let bob = account();
    let balances = balances_with(&[(alice, 100), (bob, 5)]);

    let updates = balances.plan_transfer(&alice, &bob, units(40), units(40)).unwrap();

    assert_eq!(
        updates,
        vec![
            BalanceUpdate { account: alice, balance: units(60) },
            BalanceUpdate { account: bob, balance: units(45) },
        ]
    );
}

/// Test: Planning a transfer beyond the balance is InsufficientBalance
#[test]
fn test_plan_transfer_insufficient() {
    let alice = account();
    let bob = account();
    let balances = balances_with(&[(alice, 30)]);

    assert_eq!(
        balances.plan_transfer(&alice, &bob, units(40), units(40)),
        Err(BalanceError::InsufficientBalance {
            available: units(30),
            required: units(40)
        })
    );
}

/// Test: Holding more than is moved: only `amount` leaves the sender
#[test]
fn test_plan_transfer_with_larger_hold() {
    let alice = account();
    let bob = account();
    let balances = balances_with(&[(alice, 100)]);

    let updates = balances.plan_transfer(&alice, &bob, units(40), units(70)).unwrap();

    assert_eq!(updates[0].balance, units(60));
    assert_eq!(updates[1].balance, units(40));
}

/// Test: A transfer to self leaves the balance unchanged
#[test]
fn test_plan_transfer_to_self_is_noop() {
    let alice = account();
    let balances = balances_with(&[(alice, 100)]);

    let updates = balances.plan_transfer(&alice, &alice, units(40), units(40)).unwrap();

    assert_eq!(updates, vec![BalanceUpdate { account: alice, balance: units(100) }]);
}

/// Test: A transfer that would overflow the receiver is rejected
#[test]
fn test_plan_transfer_overflow_on_credit() {
    let alice = account();
    let bob = account();
    let balances = balances_with(&[(alice, 10), (bob, u128::MAX)]);

    assert_eq!(
        balances.plan_transfer(&alice, &bob, units(1), units(1)),
        Err(BalanceError::BalanceOverflow)
    );
}

/// Test: Transfer conserves total
#[test]
fn test_transfer_conserves_total() {
    let alice = account();
    let bob = account();
    let balances = balances_with(&[(alice, 100), (bob, 50)]);

    let updates = balances.plan_transfer(&alice, &bob, units(33), units(33)).unwrap();
    let after = balances_with(
        &updates
            .iter()
            .map(|u| (u.account, u.balance.base_units()))
            .collect::<Vec<_>>(),
    );

    assert_eq!(after.total(), balances.total());
}
