//! Ledger error types for validation and balance errors.

use rust_decimal::Decimal;
use thiserror::Error;

use ironbank_shared::AppError;

/// Errors that can occur while applying a ledger operation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LedgerError {
    /// Operation amount must be strictly positive.
    #[error("Amount must be positive, got {0}")]
    InvalidAmount(Decimal),

    /// Balance does not cover the requested amount.
    #[error("Insufficient funds: balance {available} is less than {requested}")]
    InsufficientFunds {
        /// The balance at the time of the check.
        available: Decimal,
        /// The amount the operation asked for.
        requested: Decimal,
    },

    /// Sender and recipient resolve to the same account.
    #[error("Cannot transfer to the same account")]
    SelfTransfer,
}

impl LedgerError {
    /// Returns the error code for API responses.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::InvalidAmount(_) => "INVALID_AMOUNT",
            Self::InsufficientFunds { .. } => "INSUFFICIENT_FUNDS",
            Self::SelfTransfer => "SELF_TRANSFER",
        }
    }
}

impl From<LedgerError> for AppError {
    fn from(err: LedgerError) -> Self {
        match err {
            LedgerError::InvalidAmount(_) => Self::InvalidAmount(err.to_string()),
            LedgerError::InsufficientFunds { .. } => Self::InsufficientFunds(err.to_string()),
            LedgerError::SelfTransfer => Self::Validation(err.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_error_codes() {
        assert_eq!(
            LedgerError::InvalidAmount(dec!(-1)).error_code(),
            "INVALID_AMOUNT"
        );
        assert_eq!(
            LedgerError::InsufficientFunds {
                available: dec!(10),
                requested: dec!(20),
            }
            .error_code(),
            "INSUFFICIENT_FUNDS"
        );
        assert_eq!(LedgerError::SelfTransfer.error_code(), "SELF_TRANSFER");
    }

    #[test]
    fn test_error_display() {
        let err = LedgerError::InsufficientFunds {
            available: dec!(150.00),
            requested: dec!(200.00),
        };
        assert_eq!(
            err.to_string(),
            "Insufficient funds: balance 150.00 is less than 200.00"
        );
    }

    #[test]
    fn test_app_error_mapping() {
        let app: AppError = LedgerError::InvalidAmount(dec!(0)).into();
        assert_eq!(app.status_code(), 400);

        let app: AppError = LedgerError::InsufficientFunds {
            available: dec!(1),
            requested: dec!(2),
        }
        .into();
        assert_eq!(app.status_code(), 422);

        let app: AppError = LedgerError::SelfTransfer.into();
        assert_eq!(app.status_code(), 400);
    }
}
