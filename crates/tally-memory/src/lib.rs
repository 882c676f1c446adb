//! In-memory storage backend for Tally.
//!
//! Mirrors the SQLite backend's semantics without touching disk. Nothing
//! survives `close`.

use std::collections::BTreeMap;

use tally_core::{AccountId, AccountKind, Amount, LedgerEntry, StorageBackend, StorageError};

/// Rows are keyed by lowercased account id, like the NOCASE column in SQLite.
#[derive(Default)]
struct BalanceTable {
    rows: BTreeMap<String, Amount>,
}

struct Ledger {
    account: AccountId,
    kind: AccountKind,
    entries: Vec<LedgerEntry>,
}

/// Ledgers are keyed by lowercased id, matching SQLite's table-name rules.
#[derive(Default)]
pub struct InMemoryStorage {
    tables: BTreeMap<AccountKind, BalanceTable>,
    ledgers: BTreeMap<String, Ledger>,
}

fn row_key(account_id: &str) -> String {
    account_id.to_ascii_lowercase()
}

fn ledger_key(account: &AccountId) -> String {
    row_key(account.as_str())
}

fn missing_table(name: &str) -> StorageError {
    StorageError::Backend(format!("no such table: {}", name).into())
}

impl InMemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    fn table(&self, kind: AccountKind) -> Result<&BalanceTable, StorageError> {
        self.tables
            .get(&kind)
            .ok_or_else(|| missing_table(kind.balance_table()))
    }

    fn ledger_mut(&mut self, account: &AccountId) -> Result<&mut Vec<LedgerEntry>, StorageError> {
        self.ledgers
            .get_mut(&ledger_key(account))
            .map(|ledger| &mut ledger.entries)
            .ok_or_else(|| missing_table(account.as_str()))
    }
}

/// Investment ledgers have nowhere to keep a reason.
fn stored_entry(kind: AccountKind, entry: &LedgerEntry) -> LedgerEntry {
    match kind {
        AccountKind::Current => entry.clone(),
        AccountKind::Investment => LedgerEntry {
            reason: None,
            ..entry.clone()
        },
    }
}

impl StorageBackend for InMemoryStorage {
    fn ensure_balance_table(&mut self, kind: AccountKind) -> Result<(), StorageError> {
        self.tables.entry(kind).or_default();
        Ok(())
    }

    fn ensure_ledger(&mut self, kind: AccountKind, account: &AccountId) -> Result<(), StorageError> {
        let key = ledger_key(account);
        if let Some(ledger) = self.ledgers.get(&key) {
            if ledger.account != *account {
                return Err(account.conflict(format!(
                    "ledger table {:?} already exists",
                    ledger.account.as_str()
                )));
            }
            if ledger.kind != kind {
                return Err(account.conflict(format!("ledger table is not a {} ledger", kind)));
            }
            return Ok(());
        }
        self.ledgers.insert(
            key,
            Ledger {
                account: account.clone(),
                kind,
                entries: Vec::new(),
            },
        );
        Ok(())
    }

    fn account_exists(&self, kind: AccountKind, account_id: &str) -> Result<bool, StorageError> {
        Ok(self.table(kind)?.rows.contains_key(&row_key(account_id)))
    }

    fn insert_account(&mut self, kind: AccountKind, account: &AccountId, initial: Amount) -> Result<(), StorageError> {
        kind.check(&initial)?;
        let table = self
            .tables
            .get_mut(&kind)
            .ok_or_else(|| missing_table(kind.balance_table()))?;
        let key = row_key(account.as_str());
        if table.rows.contains_key(&key) {
            return Err(StorageError::Backend(
                format!("UNIQUE constraint failed: {}.account", kind.balance_table()).into(),
            ));
        }
        table.rows.insert(key, initial);
        tracing::info!(account = %account, kind = %kind, initial = %initial, "account created");
        Ok(())
    }

    fn get_balance(&self, kind: AccountKind, account_id: &str) -> Result<Option<Amount>, StorageError> {
        Ok(self.table(kind)?.rows.get(&row_key(account_id)).copied())
    }

    fn append_entry(&mut self, kind: AccountKind, account: &AccountId, entry: &LedgerEntry) -> Result<(), StorageError> {
        kind.check(&entry.amount)?;
        self.ledger_mut(account)?.push(stored_entry(kind, entry));
        Ok(())
    }

    fn apply_delta(&mut self, kind: AccountKind, account: &AccountId, entry: &LedgerEntry) -> Result<(), StorageError> {
        kind.check(&entry.amount)?;

        // validate everything before mutating so a failure leaves no trace
        let current = self
            .table(kind)?
            .rows
            .get(&row_key(account.as_str()))
            .copied()
            .ok_or_else(|| StorageError::AccountNotFound(account.to_string()))?;
        if !self.ledgers.contains_key(&ledger_key(account)) {
            return Err(missing_table(account.as_str()));
        }
        let updated = current.checked_add(&entry.amount).ok_or_else(|| {
            StorageError::Backend(format!("{} overflows {} balance {}", entry.amount, kind, current).into())
        })?;

        if let Some(table) = self.tables.get_mut(&kind) {
            table.rows.insert(row_key(account.as_str()), updated);
        }
        self.ledger_mut(account)?.push(stored_entry(kind, entry));
        tracing::debug!(account = %account, amount = %entry.amount, "in-memory delta applied");
        Ok(())
    }

    fn get_entries(&self, _kind: AccountKind, account: &AccountId) -> Result<Vec<LedgerEntry>, StorageError> {
        self.ledgers
            .get(&ledger_key(account))
            .map(|ledger| ledger.entries.clone())
            .ok_or_else(|| missing_table(account.as_str()))
    }

    fn close(self) -> Result<(), StorageError> {
        Ok(())
    }
}
