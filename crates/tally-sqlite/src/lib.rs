//! SQLite storage backend for Tally.
//!
//! One file holds the `CurrentAsset` and `InvestmentAsset` balance tables and
//! one ledger table per account.

pub mod ledger;

use rusqlite::{params, types::Value, Connection, OptionalExtension};
use tally_core::{AccountId, AccountKind, Amount, LedgerEntry, StorageBackend, StorageError};

pub use ledger::LedgerStore;

pub struct SqliteStorage {
    conn: Connection,
    path: String,
}

impl SqliteStorage {
    /// Opens (or creates) the database at `path`. `":memory:"` opens a private in-memory database.
    pub fn open(path: &str) -> Result<Self, StorageError> {
        let unavailable = |e: rusqlite::Error| StorageError::Unavailable {
            path: path.to_string(),
            source: Box::new(e),
        };

        let conn = if path == ":memory:" {
            Connection::open_in_memory()
        } else {
            Connection::open(path)
        }
        .map_err(unavailable)?;

        conn.execute_batch("PRAGMA journal_mode=WAL;")
            .map_err(unavailable)?;

        tracing::debug!(path, "SQLite storage opened");
        Ok(Self {
            conn,
            path: path.to_string(),
        })
    }

    pub fn path(&self) -> &str {
        &self.path
    }
}

impl StorageBackend for SqliteStorage {
    fn ensure_balance_table(&mut self, kind: AccountKind) -> Result<(), StorageError> {
        let table = kind.balance_table();
        let column = match kind {
            AccountKind::Current => "deposit REAL",
            AccountKind::Investment => "deposit INTEGER CHECK (typeof(deposit) = 'integer')",
        };
        self.conn
            .execute_batch(&format!(
                "
                CREATE TABLE IF NOT EXISTS \"{table}\" (
                    account TEXT NOT NULL COLLATE NOCASE,
                    {column}
                );

                CREATE UNIQUE INDEX IF NOT EXISTS \"idx_{table}_account\"
                    ON \"{table}\"(account);
                "
            ))
            .map_err(StorageError::backend)?;
        Ok(())
    }

    fn ensure_ledger(&mut self, kind: AccountKind, account: &AccountId) -> Result<(), StorageError> {
        LedgerStore::new(kind, account.clone()).ensure_schema(&self.conn)
    }

    fn account_exists(&self, kind: AccountKind, account_id: &str) -> Result<bool, StorageError> {
        let exists: bool = self
            .conn
            .query_row(
                &format!(
                    "SELECT COUNT(*) > 0 FROM \"{}\" WHERE account = ?1",
                    kind.balance_table()
                ),
                params![account_id],
                |row| row.get(0),
            )
            .map_err(StorageError::backend)?;
        Ok(exists)
    }

    fn insert_account(&mut self, kind: AccountKind, account: &AccountId, initial: Amount) -> Result<(), StorageError> {
        kind.check(&initial)?;
        self.conn
            .execute(
                &format!(
                    "INSERT INTO \"{}\" (account, deposit) VALUES (?1, ?2)",
                    kind.balance_table()
                ),
                params![account.as_str(), ledger::to_sql_value(&initial)],
            )
            .map_err(StorageError::backend)?;
        tracing::info!(account = %account, kind = %kind, initial = %initial, "account created");
        Ok(())
    }

    fn get_balance(&self, kind: AccountKind, account_id: &str) -> Result<Option<Amount>, StorageError> {
        let value: Option<Value> = self
            .conn
            .query_row(
                &format!(
                    "SELECT deposit FROM \"{}\" WHERE account = ?1",
                    kind.balance_table()
                ),
                params![account_id],
                |row| row.get(0),
            )
            .optional()
            .map_err(StorageError::backend)?;
        value.map(|v| ledger::from_sql_value(kind, v)).transpose()
    }

    fn append_entry(&mut self, kind: AccountKind, account: &AccountId, entry: &LedgerEntry) -> Result<(), StorageError> {
        LedgerStore::new(kind, account.clone()).append(&self.conn, entry)
    }

    fn apply_delta(&mut self, kind: AccountKind, account: &AccountId, entry: &LedgerEntry) -> Result<(), StorageError> {
        kind.check(&entry.amount)?;
        let store = LedgerStore::new(kind, account.clone());

        // dropping `tx` on any early return rolls both statements back
        let tx = self.conn.transaction().map_err(StorageError::backend)?;
        let updated = tx
            .execute(
                &format!(
                    "UPDATE \"{}\" SET deposit = deposit + ?1 WHERE account = ?2",
                    kind.balance_table()
                ),
                params![ledger::to_sql_value(&entry.amount), account.as_str()],
            )
            .map_err(StorageError::backend)?;
        if updated == 0 {
            return Err(StorageError::AccountNotFound(account.to_string()));
        }
        store.append(&tx, entry)?;
        tx.commit().map_err(StorageError::backend)?;

        tracing::debug!(account = %account, amount = %entry.amount, "SQLite delta committed");
        Ok(())
    }

    fn get_entries(&self, kind: AccountKind, account: &AccountId) -> Result<Vec<LedgerEntry>, StorageError> {
        LedgerStore::new(kind, account.clone()).entries(&self.conn)
    }

    fn close(self) -> Result<(), StorageError> {
        let path = self.path;
        self.conn
            .close()
            .map_err(|(_, e)| StorageError::backend(e))?;
        tracing::debug!(path = %path, "SQLite storage closed");
        Ok(())
    }
}
