use std::error::Error as StdError;

use crate::models::{identifier::AccountId, entry::LedgerEntry, AccountKind, Amount};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("storage unavailable at {path}: {source}")]
    Unavailable {
        path: String,
        #[source]
        source: Box<dyn StdError + Send + Sync>,
    },
    #[error("invalid account identifier {id:?}: {reason}")]
    InvalidIdentifier { id: String, reason: String },
    #[error("account not found: {0}")]
    AccountNotFound(String),
    #[error("{amount} is not a valid {kind} amount")]
    AmountKindMismatch { kind: AccountKind, amount: Amount },
    #[error("{amount} is not a finite {kind} amount")]
    NonFiniteAmount { kind: AccountKind, amount: f64 },
    #[error("invalid date {value:?}: {reason}")]
    InvalidDate { value: String, reason: String },
    #[error(transparent)]
    Backend(Box<dyn StdError + Send + Sync>),
}

impl StorageError {
    pub fn backend(e: impl StdError + Send + Sync + 'static) -> Self {
        StorageError::Backend(Box::new(e))
    }
}

/// Balance tables plus per-account ledgers.
///
/// Implementations own their storage handle exclusively. Every method goes
/// straight to storage; nothing is cached between calls.
pub trait StorageBackend {
    /// Creates the balance table for `kind` if it does not exist yet.
    fn ensure_balance_table(&mut self, kind: AccountKind) -> Result<(), StorageError>;

    /// Creates the ledger for `account` if it does not exist yet.
    fn ensure_ledger(&mut self, kind: AccountKind, account: &AccountId) -> Result<(), StorageError>;

    fn account_exists(&self, kind: AccountKind, account_id: &str) -> Result<bool, StorageError>;

    fn insert_account(&mut self, kind: AccountKind, account: &AccountId, initial: Amount) -> Result<(), StorageError>;

    fn get_balance(&self, kind: AccountKind, account_id: &str) -> Result<Option<Amount>, StorageError>;

    /// Appends a ledger entry without touching the balance.
    fn append_entry(&mut self, kind: AccountKind, account: &AccountId, entry: &LedgerEntry) -> Result<(), StorageError>;

    /// Adds `entry.amount` to the balance and appends `entry`, atomically.
    fn apply_delta(&mut self, kind: AccountKind, account: &AccountId, entry: &LedgerEntry) -> Result<(), StorageError>;

    /// The account's ledger in insertion order.
    fn get_entries(&self, kind: AccountKind, account: &AccountId) -> Result<Vec<LedgerEntry>, StorageError>;

    /// Releases the storage handle.
    fn close(self) -> Result<(), StorageError>
    where
        Self: Sized;
}
