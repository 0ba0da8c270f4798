//! Repository abstractions for data access.
//!
//! Repositories provide a clean interface for database operations,
//! hiding the `SeaORM` implementation details from the rest of the application.

pub mod account;
pub mod ledger;
pub mod user;

pub use account::AccountRepository;
pub use ledger::{LedgerOpError, LedgerRepository, MutationOutcome, TransferOutcome};
pub use user::{UserRepoError, UserRepository};
