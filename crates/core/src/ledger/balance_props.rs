//! Property-based tests for balance arithmetic.
//!
//! - Conservation: transfers never create or destroy money
//! - Non-negativity: no accepted operation drives a balance below zero
//! - Lock ordering: pair locking is total and symmetric

use proptest::prelude::*;
use rust_decimal::Decimal;
use uuid::Uuid;

use super::balance::{
    apply_deposit, apply_transfer, apply_withdrawal, lock_order,
};
use super::error::LedgerError;

/// Strategy to generate non-negative balances (0.00 to 10,000,000.00).
fn balance_strategy() -> impl Strategy<Value = Decimal> {
    (0i64..1_000_000_000i64).prop_map(|cents| Decimal::new(cents, 2))
}

/// Strategy to generate positive amounts (0.01 to 10,000,000.00).
fn amount_strategy() -> impl Strategy<Value = Decimal> {
    (1i64..1_000_000_000i64).prop_map(|cents| Decimal::new(cents, 2))
}

/// Strategy to generate uuids from raw bytes so ordering edge cases appear.
fn uuid_strategy() -> impl Strategy<Value = Uuid> {
    any::<[u8; 16]>().prop_map(Uuid::from_bytes)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    #[test]
    fn prop_transfer_conserves_money(
        sender in balance_strategy(),
        recipient in balance_strategy(),
        amount in amount_strategy(),
    ) {
        match apply_transfer(sender, recipient, amount) {
            Ok((new_sender, new_recipient)) => {
                prop_assert_eq!(new_sender + new_recipient, sender + recipient);
            }
            Err(LedgerError::InsufficientFunds { .. }) => {
                prop_assert!(sender < amount);
            }
            Err(e) => prop_assert!(false, "unexpected error: {e}"),
        }
    }

    #[test]
    fn prop_no_operation_goes_negative(
        balance in balance_strategy(),
        amount in amount_strategy(),
    ) {
        if let Ok(new_balance) = apply_deposit(balance, amount) {
            prop_assert!(new_balance >= Decimal::ZERO);
        }
        if let Ok(new_balance) = apply_withdrawal(balance, amount) {
            prop_assert!(new_balance >= Decimal::ZERO);
        }
        if let Ok((new_sender, new_recipient)) = apply_transfer(balance, balance, amount) {
            prop_assert!(new_sender >= Decimal::ZERO);
            prop_assert!(new_recipient >= Decimal::ZERO);
        }
    }

    #[test]
    fn prop_withdrawal_accepted_iff_covered(
        balance in balance_strategy(),
        amount in amount_strategy(),
    ) {
        let result = apply_withdrawal(balance, amount);
        if balance >= amount {
            prop_assert_eq!(result, Ok(balance - amount));
        } else {
            prop_assert_eq!(
                result,
                Err(LedgerError::InsufficientFunds {
                    available: balance,
                    requested: amount,
                })
            );
        }
    }

    #[test]
    fn prop_non_positive_amounts_rejected_everywhere(
        balance in balance_strategy(),
        raw in -1_000_000_000i64..=0i64,
    ) {
        let amount = Decimal::new(raw, 2);
        prop_assert_eq!(
            apply_deposit(balance, amount),
            Err(LedgerError::InvalidAmount(amount))
        );
        prop_assert_eq!(
            apply_withdrawal(balance, amount),
            Err(LedgerError::InvalidAmount(amount))
        );
        prop_assert_eq!(
            apply_transfer(balance, balance, amount),
            Err(LedgerError::InvalidAmount(amount))
        );
    }

    #[test]
    fn prop_lock_order_total_and_symmetric(
        a in uuid_strategy(),
        b in uuid_strategy(),
    ) {
        let (first, second) = lock_order(a, b);
        prop_assert!(first <= second);
        prop_assert_eq!(lock_order(a, b), lock_order(b, a));
        // The pair is preserved, only the order may change.
        prop_assert!(
            (first == a && second == b) || (first == b && second == a)
        );
    }

    #[test]
    fn prop_deposit_then_withdrawal_round_trips(
        balance in balance_strategy(),
        amount in amount_strategy(),
    ) {
        let after_deposit = apply_deposit(balance, amount).unwrap();
        let after_withdrawal = apply_withdrawal(after_deposit, amount).unwrap();
        prop_assert_eq!(after_withdrawal, balance);
    }
}
