//! Active enums backing Postgres enum types.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// The kind of a ledger transaction record.
///
/// A transfer produces one `TransferOut` row on the sender account and one
/// `TransferIn` row on the recipient account.
#[derive(Debug, Clone, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "transaction_kind")]
#[serde(rename_all = "snake_case")]
pub enum TransactionKind {
    /// Money entering an account from outside the ledger.
    #[sea_orm(string_value = "deposit")]
    Deposit,
    /// Money leaving an account to outside the ledger.
    #[sea_orm(string_value = "withdraw")]
    Withdraw,
    /// The sender side of a transfer.
    #[sea_orm(string_value = "transfer_out")]
    TransferOut,
    /// The recipient side of a transfer.
    #[sea_orm(string_value = "transfer_in")]
    TransferIn,
}

impl TransactionKind {
    /// Returns the wire representation used in API responses.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Deposit => "deposit",
            Self::Withdraw => "withdraw",
            Self::TransferOut => "transfer_out",
            Self::TransferIn => "transfer_in",
        }
    }
}

impl std::fmt::Display for TransactionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
