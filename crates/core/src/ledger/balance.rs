//! Balance arithmetic for ledger operations.
//!
//! Every mutation follows the same shape: validate the amount, check the
//! preconditions against the balances handed in, and return the new
//! balances. Callers are responsible for reading and writing those
//! balances under an exclusive lock so that check and mutation form a
//! single atomic step.

use rust_decimal::Decimal;
use uuid::Uuid;

use super::error::LedgerError;

/// Validates that an operation amount is strictly positive.
///
/// # Errors
///
/// Returns `LedgerError::InvalidAmount` for zero or negative amounts.
pub fn validate_amount(amount: Decimal) -> Result<(), LedgerError> {
    if amount <= Decimal::ZERO {
        return Err(LedgerError::InvalidAmount(amount));
    }
    Ok(())
}

/// Rejects transfers where sender and recipient are the same account.
///
/// # Errors
///
/// Returns `LedgerError::SelfTransfer` when both ids are equal.
pub fn validate_counterparty(
    sender_account: Uuid,
    recipient_account: Uuid,
) -> Result<(), LedgerError> {
    if sender_account == recipient_account {
        return Err(LedgerError::SelfTransfer);
    }
    Ok(())
}

/// Applies a deposit and returns the new balance.
///
/// # Errors
///
/// Returns `LedgerError::InvalidAmount` for non-positive amounts.
pub fn apply_deposit(balance: Decimal, amount: Decimal) -> Result<Decimal, LedgerError> {
    validate_amount(amount)?;
    Ok(balance + amount)
}

/// Applies a withdrawal and returns the new balance.
///
/// The sufficient-funds check and the subtraction happen together so a
/// balance can never go negative through this path.
///
/// # Errors
///
/// Returns `LedgerError::InvalidAmount` for non-positive amounts.
/// Returns `LedgerError::InsufficientFunds` when the balance is too low.
pub fn apply_withdrawal(balance: Decimal, amount: Decimal) -> Result<Decimal, LedgerError> {
    validate_amount(amount)?;
    if balance < amount {
        return Err(LedgerError::InsufficientFunds {
            available: balance,
            requested: amount,
        });
    }
    Ok(balance - amount)
}

/// Applies a transfer and returns `(new_sender_balance, new_recipient_balance)`.
///
/// The same amount leaves one side and arrives at the other, so the sum of
/// both balances is unchanged.
///
/// # Errors
///
/// Returns `LedgerError::InvalidAmount` for non-positive amounts.
/// Returns `LedgerError::InsufficientFunds` when the sender balance is too low.
pub fn apply_transfer(
    sender_balance: Decimal,
    recipient_balance: Decimal,
    amount: Decimal,
) -> Result<(Decimal, Decimal), LedgerError> {
    let new_sender = apply_withdrawal(sender_balance, amount)?;
    let new_recipient = recipient_balance + amount;
    Ok((new_sender, new_recipient))
}

/// Returns the two account ids in the order their rows must be locked.
///
/// Two-account operations always lock ascending by id, regardless of which
/// side money flows from. Two opposing transfers between the same pair
/// therefore request locks in the same order and cannot deadlock.
#[must_use]
pub fn lock_order(a: Uuid, b: Uuid) -> (Uuid, Uuid) {
    if a <= b { (a, b) } else { (b, a) }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_validate_amount() {
        assert!(validate_amount(dec!(0.01)).is_ok());
        assert!(validate_amount(dec!(100)).is_ok());
        assert_eq!(
            validate_amount(dec!(0)),
            Err(LedgerError::InvalidAmount(dec!(0)))
        );
        assert_eq!(
            validate_amount(dec!(-5)),
            Err(LedgerError::InvalidAmount(dec!(-5)))
        );
    }

    #[test]
    fn test_apply_deposit() {
        assert_eq!(apply_deposit(dec!(100), dec!(50)), Ok(dec!(150)));
        assert_eq!(apply_deposit(dec!(0), dec!(0.01)), Ok(dec!(0.01)));
        assert!(apply_deposit(dec!(100), dec!(0)).is_err());
    }

    #[test]
    fn test_apply_withdrawal() {
        assert_eq!(apply_withdrawal(dec!(150), dec!(50)), Ok(dec!(100)));
        // Draining the account exactly is allowed.
        assert_eq!(apply_withdrawal(dec!(150), dec!(150)), Ok(dec!(0)));
        assert_eq!(
            apply_withdrawal(dec!(150), dec!(200)),
            Err(LedgerError::InsufficientFunds {
                available: dec!(150),
                requested: dec!(200),
            })
        );
        assert!(apply_withdrawal(dec!(150), dec!(-1)).is_err());
    }

    #[test]
    fn test_apply_transfer() {
        assert_eq!(
            apply_transfer(dec!(150), dec!(0), dec!(100)),
            Ok((dec!(50), dec!(100)))
        );
        assert_eq!(
            apply_transfer(dec!(150), dec!(0), dec!(200)),
            Err(LedgerError::InsufficientFunds {
                available: dec!(150),
                requested: dec!(200),
            })
        );
        assert!(apply_transfer(dec!(150), dec!(0), dec!(0)).is_err());
    }

    #[test]
    fn test_validate_counterparty() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        assert!(validate_counterparty(a, b).is_ok());
        assert_eq!(validate_counterparty(a, a), Err(LedgerError::SelfTransfer));
    }

    #[test]
    fn test_lock_order_is_ascending() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        let (first, second) = lock_order(a, b);
        assert!(first <= second);
        assert_eq!(lock_order(a, b), lock_order(b, a));
    }

    #[test]
    fn test_worked_scenario() {
        // Account starts at 100.
        let balance = dec!(100);

        // Deposit 50 -> 150.
        let balance = apply_deposit(balance, dec!(50)).unwrap();
        assert_eq!(balance, dec!(150));

        // Withdraw 200 -> rejected, balance unchanged.
        assert!(matches!(
            apply_withdrawal(balance, dec!(200)),
            Err(LedgerError::InsufficientFunds { .. })
        ));
        assert_eq!(balance, dec!(150));

        // Transfer 100 to bob (balance 0) -> 50 / 100.
        let (sender, bob) = apply_transfer(balance, dec!(0), dec!(100)).unwrap();
        assert_eq!(sender, dec!(50));
        assert_eq!(bob, dec!(100));
    }
}
