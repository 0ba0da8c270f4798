//! Ledger repository: balance mutations and transaction history.
//!
//! Every mutation runs as `validate -> lock -> mutate -> append` inside a
//! single database transaction. Account rows are locked with
//! `SELECT ... FOR UPDATE NOWAIT`, so the precondition check and the
//! balance write are one atomic step with respect to every other operation
//! on the same account, and a contended row surfaces as `Busy` instead of
//! an unbounded wait.
//!
//! Two-account transfers lock both rows in ascending account-id order.
//! History reads see either both sides of a transfer or neither, because
//! both rows are appended in the same transaction.

use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::sea_query::{LockBehavior, LockType};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DatabaseTransaction, DbErr, EntityTrait,
    QueryFilter, QueryOrder, QuerySelect, Set, TransactionTrait,
};
use tracing::error;
use uuid::Uuid;

use ironbank_core::ledger::{self, LedgerError};
use ironbank_shared::AppError;

use crate::entities::{accounts, sea_orm_active_enums::TransactionKind, transactions, users};

/// Error types for ledger operations.
#[derive(Debug, thiserror::Error)]
pub enum LedgerOpError {
    /// A business rule rejected the operation.
    #[error(transparent)]
    Ledger(#[from] LedgerError),

    /// Account not found.
    #[error("Account not found: {0}")]
    AccountNotFound(Uuid),

    /// No user exists with the recipient username.
    #[error("Recipient not found: {0}")]
    RecipientNotFound(String),

    /// The recipient user exists but has no account.
    #[error("Recipient account not found: {0}")]
    RecipientAccountNotFound(String),

    /// The account row is locked by a concurrent operation.
    #[error("Account {0} is busy, please retry")]
    Busy(Uuid),

    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
}

impl From<LedgerOpError> for AppError {
    fn from(err: LedgerOpError) -> Self {
        match err {
            LedgerOpError::Ledger(e) => e.into(),
            e @ (LedgerOpError::AccountNotFound(_)
            | LedgerOpError::RecipientNotFound(_)
            | LedgerOpError::RecipientAccountNotFound(_)) => Self::NotFound(e.to_string()),
            e @ LedgerOpError::Busy(_) => Self::Busy(e.to_string()),
            e @ LedgerOpError::Database(_) => Self::Database(e.to_string()),
        }
    }
}

/// Result of a single-account mutation.
#[derive(Debug, Clone)]
pub struct MutationOutcome {
    /// The account row after the mutation.
    pub account: accounts::Model,
    /// The transaction record appended for this mutation.
    pub transaction: transactions::Model,
}

/// Result of a transfer.
#[derive(Debug, Clone)]
pub struct TransferOutcome {
    /// The sender account row after the transfer.
    pub sender_account: accounts::Model,
    /// The record appended to the sender account.
    pub transfer_out: transactions::Model,
    /// The record appended to the recipient account.
    pub transfer_in: transactions::Model,
}

/// Ledger repository for balance mutations and history reads.
#[derive(Debug, Clone)]
pub struct LedgerRepository {
    db: DatabaseConnection,
}

impl LedgerRepository {
    /// Creates a new ledger repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Deposits `amount` into the account and appends a `deposit` record.
    ///
    /// # Errors
    ///
    /// Returns `LedgerOpError::Ledger` for non-positive amounts,
    /// `AccountNotFound`, `Busy`, or `Database`.
    pub async fn deposit(
        &self,
        account_id: Uuid,
        amount: Decimal,
    ) -> Result<MutationOutcome, LedgerOpError> {
        ledger::validate_amount(amount)?;

        let txn = self.db.begin().await?;
        let result = Self::deposit_in_txn(&txn, account_id, amount).await;
        finish(txn, result).await
    }

    async fn deposit_in_txn(
        txn: &DatabaseTransaction,
        account_id: Uuid,
        amount: Decimal,
    ) -> Result<MutationOutcome, LedgerOpError> {
        let account = lock_account(txn, account_id)
            .await?
            .ok_or(LedgerOpError::AccountNotFound(account_id))?;

        let new_balance = ledger::apply_deposit(account.balance, amount)?;
        let account = write_balance(txn, account, new_balance).await?;
        let transaction = append_record(
            txn,
            account_id,
            TransactionKind::Deposit,
            amount,
            format!("Deposit of {amount}"),
        )
        .await?;

        Ok(MutationOutcome {
            account,
            transaction,
        })
    }

    /// Withdraws `amount` from the account and appends a `withdraw` record.
    ///
    /// The sufficient-funds check runs on the locked row, so no concurrent
    /// operation can slip between the check and the decrement.
    ///
    /// # Errors
    ///
    /// Returns `LedgerOpError::Ledger` for non-positive amounts or
    /// insufficient funds, `AccountNotFound`, `Busy`, or `Database`.
    pub async fn withdraw(
        &self,
        account_id: Uuid,
        amount: Decimal,
    ) -> Result<MutationOutcome, LedgerOpError> {
        ledger::validate_amount(amount)?;

        let txn = self.db.begin().await?;
        let result = Self::withdraw_in_txn(&txn, account_id, amount).await;
        finish(txn, result).await
    }

    async fn withdraw_in_txn(
        txn: &DatabaseTransaction,
        account_id: Uuid,
        amount: Decimal,
    ) -> Result<MutationOutcome, LedgerOpError> {
        let account = lock_account(txn, account_id)
            .await?
            .ok_or(LedgerOpError::AccountNotFound(account_id))?;

        let new_balance = ledger::apply_withdrawal(account.balance, amount)?;
        let account = write_balance(txn, account, new_balance).await?;
        let transaction = append_record(
            txn,
            account_id,
            TransactionKind::Withdraw,
            amount,
            format!("Withdrawal of {amount}"),
        )
        .await?;

        Ok(MutationOutcome {
            account,
            transaction,
        })
    }

    /// Moves `amount` from the sender account to the account owned by
    /// `recipient_username`, appending one record on each side.
    ///
    /// Preconditions are evaluated in a fixed order, first failure wins:
    /// positive amount, sender exists, sender balance covers the amount,
    /// recipient user exists, recipient account exists. Both balance
    /// writes and both record appends commit together or not at all.
    ///
    /// # Errors
    ///
    /// Returns `LedgerOpError::Ledger` for non-positive amounts,
    /// insufficient funds, or self-transfer; `AccountNotFound`,
    /// `RecipientNotFound`, `RecipientAccountNotFound`, `Busy`, or
    /// `Database`.
    pub async fn transfer(
        &self,
        sender_account_id: Uuid,
        recipient_username: &str,
        amount: Decimal,
    ) -> Result<TransferOutcome, LedgerOpError> {
        ledger::validate_amount(amount)?;

        let txn = self.db.begin().await?;
        let result =
            Self::transfer_in_txn(&txn, sender_account_id, recipient_username, amount).await;
        finish(txn, result).await
    }

    async fn transfer_in_txn(
        txn: &DatabaseTransaction,
        sender_account_id: Uuid,
        recipient_username: &str,
        amount: Decimal,
    ) -> Result<TransferOutcome, LedgerOpError> {
        // Resolve the recipient before taking any locks so the lock order
        // is known up front.
        let recipient_user = users::Entity::find()
            .filter(users::Column::Username.eq(recipient_username))
            .one(txn)
            .await?;
        let recipient_account = match &recipient_user {
            Some(user) => {
                accounts::Entity::find()
                    .filter(accounts::Column::UserId.eq(user.id))
                    .one(txn)
                    .await?
            }
            None => None,
        };

        let Some(recipient_account) = recipient_account else {
            // The transfer cannot proceed, but the sender-side checks still
            // come first. Holding a single lock cannot form a cycle with
            // the ordered pair acquisition below.
            let sender = lock_account(txn, sender_account_id)
                .await?
                .ok_or(LedgerOpError::AccountNotFound(sender_account_id))?;
            ledger::apply_withdrawal(sender.balance, amount)?;

            return Err(if recipient_user.is_none() {
                LedgerOpError::RecipientNotFound(recipient_username.to_string())
            } else {
                LedgerOpError::RecipientAccountNotFound(recipient_username.to_string())
            });
        };

        // Locking the same row twice would succeed (the transaction already
        // holds it) and then double-apply, so self-transfers are rejected
        // before any lock is taken.
        ledger::validate_counterparty(sender_account_id, recipient_account.id)?;

        let (first, second) = ledger::lock_order(sender_account_id, recipient_account.id);
        let first_row = lock_account(txn, first).await?;
        let second_row = lock_account(txn, second).await?;
        let (sender_row, recipient_row) = if first == sender_account_id {
            (first_row, second_row)
        } else {
            (second_row, first_row)
        };

        let sender = sender_row.ok_or(LedgerOpError::AccountNotFound(sender_account_id))?;
        let recipient = recipient_row
            .ok_or_else(|| LedgerOpError::RecipientAccountNotFound(recipient_username.to_string()))?;

        let (sender_balance, recipient_balance) =
            ledger::apply_transfer(sender.balance, recipient.balance, amount)?;

        let sender_username = users::Entity::find_by_id(sender.user_id)
            .one(txn)
            .await?
            .map_or_else(|| "unknown".to_string(), |u| u.username);

        let recipient_id = recipient.id;
        let sender_account = write_balance(txn, sender, sender_balance).await?;
        write_balance(txn, recipient, recipient_balance).await?;

        let transfer_out = append_record(
            txn,
            sender_account.id,
            TransactionKind::TransferOut,
            amount,
            format!("Transferred {amount} to {recipient_username}"),
        )
        .await?;
        let transfer_in = append_record(
            txn,
            recipient_id,
            TransactionKind::TransferIn,
            amount,
            format!("Received {amount} from {sender_username}"),
        )
        .await?;

        Ok(TransferOutcome {
            sender_account,
            transfer_out,
            transfer_in,
        })
    }

    /// Lists an account's transaction records, newest first.
    ///
    /// The id is a tiebreak for records sharing a commit timestamp, so two
    /// reads with no intervening writes return identical sequences.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn list_transactions(
        &self,
        account_id: Uuid,
    ) -> Result<Vec<transactions::Model>, DbErr> {
        transactions::Entity::find()
            .filter(transactions::Column::AccountId.eq(account_id))
            .order_by_desc(transactions::Column::CreatedAt)
            .order_by_desc(transactions::Column::Id)
            .all(&self.db)
            .await
    }
}

/// Commits on success, rolls back on failure, preserving the original error.
async fn finish<T>(
    txn: DatabaseTransaction,
    result: Result<T, LedgerOpError>,
) -> Result<T, LedgerOpError> {
    match result {
        Ok(value) => {
            txn.commit().await?;
            Ok(value)
        }
        Err(err) => {
            if let Err(rollback_err) = txn.rollback().await {
                error!(error = %rollback_err, "Failed to roll back ledger transaction");
            }
            Err(err)
        }
    }
}

/// Selects an account row `FOR UPDATE NOWAIT`.
async fn lock_account(
    txn: &DatabaseTransaction,
    account_id: Uuid,
) -> Result<Option<accounts::Model>, LedgerOpError> {
    accounts::Entity::find_by_id(account_id)
        .lock_with_behavior(LockType::Update, LockBehavior::Nowait)
        .one(txn)
        .await
        .map_err(|e| {
            if is_lock_unavailable(&e) {
                LedgerOpError::Busy(account_id)
            } else {
                LedgerOpError::Database(e)
            }
        })
}

/// Returns true for Postgres `55P03` (lock_not_available), which NOWAIT
/// raises instead of blocking.
fn is_lock_unavailable(err: &DbErr) -> bool {
    let msg = err.to_string();
    msg.contains("55P03") || msg.contains("could not obtain lock")
}

/// Persists a new balance on a locked account row.
async fn write_balance(
    txn: &DatabaseTransaction,
    account: accounts::Model,
    new_balance: Decimal,
) -> Result<accounts::Model, DbErr> {
    let mut active: accounts::ActiveModel = account.into();
    active.balance = Set(new_balance);
    active.updated_at = Set(Utc::now().into());
    active.update(txn).await
}

/// Appends an immutable transaction record.
async fn append_record(
    txn: &DatabaseTransaction,
    account_id: Uuid,
    kind: TransactionKind,
    amount: Decimal,
    description: String,
) -> Result<transactions::Model, DbErr> {
    transactions::ActiveModel {
        id: Set(Uuid::new_v4()),
        account_id: Set(account_id),
        kind: Set(kind),
        amount: Set(amount),
        description: Set(description),
        created_at: Set(Utc::now().into()),
    }
    .insert(txn)
    .await
}
