//! Ledger routes: balance, deposit, withdraw, transfer, history.
//!
//! The caller's account id comes from the access token, never from the
//! request body, so a caller can only ever move money out of their own
//! account.

use axum::{
    Json, Router,
    extract::State,
    routing::{get, post},
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::ApiError;
use crate::{AppState, middleware::AuthUser};
use ironbank_db::entities::transactions;
use ironbank_db::repositories::{AccountRepository, LedgerRepository};
use ironbank_shared::AppError;

/// Creates the ledger routes (requires auth middleware to be applied externally).
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/balance", get(get_balance))
        .route("/deposit", post(deposit))
        .route("/withdraw", post(withdraw))
        .route("/transfer", post(transfer))
        .route("/transactions", get(list_transactions))
}

/// Request body for deposits and withdrawals.
#[derive(Debug, Deserialize)]
pub struct AmountRequest {
    /// The amount to move. Must be positive.
    pub amount: Decimal,
}

/// Request body for transfers.
#[derive(Debug, Deserialize)]
pub struct TransferRequest {
    /// Username of the recipient.
    pub recipient: String,
    /// The amount to move. Must be positive.
    pub amount: Decimal,
}

/// Response for the balance endpoint.
#[derive(Debug, Serialize)]
pub struct BalanceResponse {
    /// Current balance.
    pub balance: String,
}

/// Response for a successful mutation.
#[derive(Debug, Serialize)]
pub struct MutationResponse {
    /// Human-readable summary.
    pub message: String,
    /// Balance after the mutation.
    pub balance: String,
}

/// A single history entry.
#[derive(Debug, Serialize)]
pub struct TransactionResponse {
    /// What happened.
    pub kind: &'static str,
    /// The amount moved.
    pub amount: String,
    /// Human-readable description.
    pub description: String,
    /// Commit timestamp.
    pub timestamp: String,
}

/// Response for the history endpoint.
#[derive(Debug, Serialize)]
pub struct TransactionListResponse {
    /// History entries, newest first.
    pub transactions: Vec<TransactionResponse>,
}

/// GET /balance - Current balance of the caller's account.
async fn get_balance(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<Json<BalanceResponse>, ApiError> {
    let account_repo = AccountRepository::new((*state.db).clone());

    let account = account_repo
        .find_by_id(auth.account_id())
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Account not found: {}", auth.account_id())))?;

    Ok(Json(BalanceResponse {
        balance: account.balance.to_string(),
    }))
}

/// POST /deposit - Add funds to the caller's account.
async fn deposit(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(payload): Json<AmountRequest>,
) -> Result<Json<MutationResponse>, ApiError> {
    let ledger = LedgerRepository::new((*state.db).clone());

    let outcome = ledger.deposit(auth.account_id(), payload.amount).await?;
    info!(
        account_id = %auth.account_id(),
        amount = %payload.amount,
        "Deposit completed"
    );

    Ok(Json(MutationResponse {
        message: format!("Deposited {}", payload.amount),
        balance: outcome.account.balance.to_string(),
    }))
}

/// POST /withdraw - Remove funds from the caller's account.
async fn withdraw(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(payload): Json<AmountRequest>,
) -> Result<Json<MutationResponse>, ApiError> {
    let ledger = LedgerRepository::new((*state.db).clone());

    let outcome = ledger.withdraw(auth.account_id(), payload.amount).await?;
    info!(
        account_id = %auth.account_id(),
        amount = %payload.amount,
        "Withdrawal completed"
    );

    Ok(Json(MutationResponse {
        message: format!("Withdrew {}", payload.amount),
        balance: outcome.account.balance.to_string(),
    }))
}

/// POST /transfer - Move funds to another user's account.
async fn transfer(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(payload): Json<TransferRequest>,
) -> Result<Json<MutationResponse>, ApiError> {
    let recipient = payload.recipient.trim();
    if recipient.is_empty() {
        return Err(AppError::Validation("Invalid fields: recipient".to_string()).into());
    }

    let ledger = LedgerRepository::new((*state.db).clone());

    let outcome = ledger
        .transfer(auth.account_id(), recipient, payload.amount)
        .await?;
    info!(
        account_id = %auth.account_id(),
        recipient = %recipient,
        amount = %payload.amount,
        "Transfer completed"
    );

    Ok(Json(MutationResponse {
        message: format!("Transferred {} to {recipient}", payload.amount),
        balance: outcome.sender_account.balance.to_string(),
    }))
}

/// GET /transactions - The caller's history, newest first.
async fn list_transactions(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<Json<TransactionListResponse>, ApiError> {
    let ledger = LedgerRepository::new((*state.db).clone());

    let records = ledger.list_transactions(auth.account_id()).await?;

    Ok(Json(TransactionListResponse {
        transactions: records.into_iter().map(to_response).collect(),
    }))
}

fn to_response(record: transactions::Model) -> TransactionResponse {
    TransactionResponse {
        kind: record.kind.as_str(),
        amount: record.amount.to_string(),
        description: record.description,
        timestamp: record.created_at.to_rfc3339(),
    }
}
