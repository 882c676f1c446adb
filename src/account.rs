//! Typed account handles.
//!
//! An `Account` is bound to one storage handle and one account id. Opening it
//! guarantees the balance row and the ledger table exist; from then on every
//! mutation updates the balance and appends to the ledger together.

use std::marker::PhantomData;

use tally_core::{
    AccountId, AccountKind, Category, Current, Investment, LedgerEntry, StorageBackend, StorageError,
};
use tally_sqlite::SqliteStorage;
use time::Date;

pub struct Account<K: Category, B: StorageBackend = SqliteStorage> {
    backend: B,
    id: AccountId,
    _kind: PhantomData<K>,
}

pub type CurrentAccount<B = SqliteStorage> = Account<Current, B>;
pub type InvestmentAccount<B = SqliteStorage> = Account<Investment, B>;

impl<K: Category> Account<K, SqliteStorage> {
    /// Opens the SQLite file at `path` and loads `account_id`, creating it
    /// with `initial` if it has no balance row yet.
    pub fn open(path: &str, account_id: &str, initial: K::Amount) -> Result<Self, StorageError> {
        // reject bad ids before a file gets created for them
        AccountId::parse(account_id)?;
        Self::with_backend(SqliteStorage::open(path)?, account_id, initial)
    }
}

impl<K: Category, B: StorageBackend> Account<K, B> {
    pub fn with_backend(mut backend: B, account_id: &str, initial: K::Amount) -> Result<Self, StorageError> {
        let id = AccountId::parse(account_id)?;
        backend.ensure_balance_table(K::KIND)?;
        backend.ensure_ledger(K::KIND, &id)?;

        let mut account = Self {
            backend,
            id,
            _kind: PhantomData,
        };
        account.create_or_load(initial)?;
        Ok(account)
    }

    /// Inserts the balance row with `initial` unless one already exists.
    /// An existing row is never overwritten. Returns whether a row was created.
    pub fn create_or_load(&mut self, initial: K::Amount) -> Result<bool, StorageError> {
        if self.backend.account_exists(K::KIND, self.id.as_str())? {
            tracing::debug!(account = %self.id, "account loaded");
            return Ok(false);
        }
        self.backend.insert_account(K::KIND, &self.id, initial.into())?;
        Ok(true)
    }

    pub fn id(&self) -> &AccountId {
        &self.id
    }

    pub fn kind(&self) -> AccountKind {
        K::KIND
    }

    /// Balance of any account in this account's category, `None` if it has no row.
    pub fn current_balance(&self, account_id: &str) -> Result<Option<K::Amount>, StorageError> {
        self.backend
            .get_balance(K::KIND, account_id)?
            .map(K::from_amount)
            .transpose()
    }

    pub fn balance(&self) -> Result<K::Amount, StorageError> {
        self.current_balance(self.id.as_str())?
            .ok_or_else(|| StorageError::AccountNotFound(self.id.to_string()))
    }

    /// Ledger entries in the order they were recorded.
    pub fn entries(&self) -> Result<Vec<LedgerEntry>, StorageError> {
        self.backend.get_entries(K::KIND, &self.id)
    }

    pub fn close(self) -> Result<(), StorageError> {
        tracing::debug!(account = %self.id, "account closed");
        self.backend.close()
    }

    fn record_entry(&mut self, entry: LedgerEntry) -> Result<(), StorageError> {
        self.backend.append_entry(K::KIND, &self.id, &entry)
    }

    fn apply_entry(&mut self, entry: LedgerEntry) -> Result<(), StorageError> {
        self.backend.apply_delta(K::KIND, &self.id, &entry)
    }
}

impl<B: StorageBackend> Account<Current, B> {
    /// Adds `amount` (negative to withdraw) and records it under today's date.
    pub fn apply_delta(&mut self, amount: f64, reason: Option<&str>) -> Result<(), StorageError> {
        self.apply_delta_on(LedgerEntry::today(), amount, reason)
    }

    pub fn apply_delta_on(&mut self, date: Date, amount: f64, reason: Option<&str>) -> Result<(), StorageError> {
        self.apply_entry(LedgerEntry::new(date, amount).with_reason(reason))
    }

    /// Appends a ledger entry without changing the balance.
    pub fn record(&mut self, date: Date, delta: f64, reason: Option<&str>) -> Result<(), StorageError> {
        self.record_entry(LedgerEntry::new(date, delta).with_reason(reason))
    }
}

impl<B: StorageBackend> Account<Investment, B> {
    /// Changes the held quantity by `amount` and records it under today's date.
    pub fn apply_delta(&mut self, amount: i64) -> Result<(), StorageError> {
        self.apply_delta_on(LedgerEntry::today(), amount)
    }

    pub fn apply_delta_on(&mut self, date: Date, amount: i64) -> Result<(), StorageError> {
        self.apply_entry(LedgerEntry::new(date, amount))
    }

    /// Appends a ledger entry without changing the holding.
    pub fn record(&mut self, date: Date, delta: i64) -> Result<(), StorageError> {
        self.record_entry(LedgerEntry::new(date, delta))
    }
}
