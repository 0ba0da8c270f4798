//! Balance-mutation rules for the ledger.
//!
//! This module implements the core ledger functionality:
//! - Amount validation shared by every operation
//! - Balance arithmetic for deposits, withdrawals, and transfers
//! - Deadlock-free lock ordering for two-account operations
//! - Error types for ledger operations
//!
//! Everything here is pure: the database layer feeds in current balances
//! and persists whatever comes back, inside its own transaction scope.

pub mod balance;
pub mod error;

#[cfg(test)]
mod balance_props;

pub use balance::{
    apply_deposit, apply_transfer, apply_withdrawal, lock_order, validate_amount,
    validate_counterparty,
};
pub use error::LedgerError;
