//! Per-account ledger tables.
//!
//! Each account keeps its history in a table named after the account id.
//! Rows are only ever inserted; reads return them in `rowid` order.

use rusqlite::{params, types::Value, Connection, OptionalExtension};
use tally_core::{format_date, parse_date, AccountId, AccountKind, Amount, LedgerEntry, StorageError};

pub struct LedgerStore {
    kind: AccountKind,
    account: AccountId,
}

impl LedgerStore {
    pub fn new(kind: AccountKind, account: AccountId) -> Self {
        Self { kind, account }
    }

    fn expected_columns(&self) -> &'static [&'static str] {
        match self.kind {
            AccountKind::Current => &["date", "deposit", "use"],
            AccountKind::Investment => &["date", "deposit"],
        }
    }

    /// Table names are case-insensitive, so an existing table may belong to
    /// an id spelled differently or to an account of the other kind.
    fn check_existing(&self, conn: &Connection) -> Result<(), StorageError> {
        let existing: Option<String> = conn
            .query_row(
                "SELECT name FROM sqlite_master WHERE type = 'table' AND name = ?1 COLLATE NOCASE",
                params![self.account.as_str()],
                |row| row.get(0),
            )
            .optional()
            .map_err(StorageError::backend)?;
        let name = match existing {
            Some(name) => name,
            None => return Ok(()),
        };
        if name != self.account.as_str() {
            return Err(self
                .account
                .conflict(format!("ledger table {:?} already exists", name)));
        }

        let columns: Vec<String> = conn
            .prepare("SELECT name FROM pragma_table_info(?1)")
            .map_err(StorageError::backend)?
            .query_map(params![name], |row| row.get(0))
            .map_err(StorageError::backend)?
            .collect::<Result<_, _>>()
            .map_err(StorageError::backend)?;
        if !columns.iter().map(String::as_str).eq(self.expected_columns().iter().copied()) {
            return Err(self
                .account
                .conflict(format!("ledger table is not a {} ledger", self.kind)));
        }
        Ok(())
    }

    pub fn ensure_schema(&self, conn: &Connection) -> Result<(), StorageError> {
        self.check_existing(conn)?;
        let sql = match self.kind {
            AccountKind::Current => format!(
                "CREATE TABLE IF NOT EXISTS {} (
                    date TEXT NOT NULL,
                    deposit REAL,
                    use TEXT
                )",
                self.account.quoted()
            ),
            AccountKind::Investment => format!(
                "CREATE TABLE IF NOT EXISTS {} (
                    date TEXT NOT NULL,
                    deposit INTEGER NOT NULL CHECK (typeof(deposit) = 'integer')
                )",
                self.account.quoted()
            ),
        };
        conn.execute_batch(&sql).map_err(StorageError::backend)?;
        tracing::debug!(account = %self.account, kind = %self.kind, "ledger table ensured");
        Ok(())
    }

    /// Inserts one entry. Runs on whatever connection or transaction it is handed.
    pub fn append(&self, conn: &Connection, entry: &LedgerEntry) -> Result<(), StorageError> {
        self.kind.check(&entry.amount)?;
        let date = format_date(entry.date);
        let inserted = match self.kind {
            AccountKind::Current => conn.execute(
                &format!(
                    "INSERT INTO {} (date, deposit, use) VALUES (?1, ?2, ?3)",
                    self.account.quoted()
                ),
                params![date, to_sql_value(&entry.amount), entry.reason.as_deref()],
            ),
            AccountKind::Investment => conn.execute(
                &format!(
                    "INSERT INTO {} (date, deposit) VALUES (?1, ?2)",
                    self.account.quoted()
                ),
                params![date, to_sql_value(&entry.amount)],
            ),
        };
        inserted.map_err(StorageError::backend)?;
        tracing::debug!(account = %self.account, amount = %entry.amount, date = %date, "ledger entry appended");
        Ok(())
    }

    pub fn entries(&self, conn: &Connection) -> Result<Vec<LedgerEntry>, StorageError> {
        let sql = match self.kind {
            AccountKind::Current => format!(
                "SELECT date, deposit, use FROM {} ORDER BY rowid",
                self.account.quoted()
            ),
            AccountKind::Investment => format!(
                "SELECT date, deposit, NULL FROM {} ORDER BY rowid",
                self.account.quoted()
            ),
        };
        let mut stmt = conn.prepare(&sql).map_err(StorageError::backend)?;
        let rows: Vec<(String, Value, Option<String>)> = stmt
            .query_map([], |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)))
            .map_err(StorageError::backend)?
            .collect::<Result<Vec<_>, _>>()
            .map_err(StorageError::backend)?;

        rows.into_iter()
            .map(|(date, amount, reason)| {
                Ok(LedgerEntry {
                    date: parse_date(&date)?,
                    amount: from_sql_value(self.kind, amount)?,
                    reason: reason.map(|r| r.into()),
                })
            })
            .collect()
    }
}

pub(crate) fn to_sql_value(amount: &Amount) -> Value {
    match amount {
        Amount::Real(r) => Value::Real(*r),
        Amount::Whole(w) => Value::Integer(*w),
    }
}

pub(crate) fn from_sql_value(kind: AccountKind, value: Value) -> Result<Amount, StorageError> {
    match (kind, value) {
        (AccountKind::Current, Value::Real(r)) => Ok(Amount::Real(r)),
        (AccountKind::Current, Value::Integer(i)) => Ok(Amount::Real(i as f64)),
        (AccountKind::Investment, Value::Integer(i)) => Ok(Amount::Whole(i)),
        (kind, Value::Real(r)) => Err(StorageError::AmountKindMismatch {
            kind,
            amount: Amount::Real(r),
        }),
        (_, other) => Err(StorageError::backend(rusqlite::Error::InvalidColumnType(
            1,
            "deposit".to_string(),
            other.data_type(),
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::{Date, Month};

    fn day(d: u8) -> Date {
        Date::from_calendar_date(2024, Month::April, d).unwrap()
    }

    #[test]
    fn test_ensure_schema_is_idempotent() {
        let conn = Connection::open_in_memory().unwrap();
        let store = LedgerStore::new(AccountKind::Current, AccountId::parse("cash").unwrap());
        store.ensure_schema(&conn).unwrap();
        store.append(&conn, &LedgerEntry::new(day(4), 5.0)).unwrap();
        store.ensure_schema(&conn).unwrap();
        assert_eq!(store.entries(&conn).unwrap().len(), 1);
    }

    #[test]
    fn test_current_entries_keep_reason_and_order() {
        let conn = Connection::open_in_memory().unwrap();
        let store = LedgerStore::new(AccountKind::Current, AccountId::parse("cash").unwrap());
        store.ensure_schema(&conn).unwrap();
        store
            .append(&conn, &LedgerEntry::new(day(5), -20.0).with_reason(Some("meal")))
            .unwrap();
        store.append(&conn, &LedgerEntry::new(day(4), 12.5)).unwrap();

        let entries = store.entries(&conn).unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].date, day(5));
        assert_eq!(entries[0].amount, Amount::Real(-20.0));
        assert_eq!(entries[0].reason.as_deref(), Some("meal"));
        // insertion order, not date order
        assert_eq!(entries[1].date, day(4));
        assert_eq!(entries[1].reason, None);
    }

    #[test]
    fn test_investment_ledger_has_no_reason_column() {
        let conn = Connection::open_in_memory().unwrap();
        let store = LedgerStore::new(AccountKind::Investment, AccountId::parse("stock_X").unwrap());
        store.ensure_schema(&conn).unwrap();
        store
            .append(&conn, &LedgerEntry::new(day(5), 4000i64).with_reason(Some("ignored")))
            .unwrap();

        let columns: Vec<String> = conn
            .prepare("SELECT name FROM pragma_table_info('stock_X')")
            .unwrap()
            .query_map([], |row| row.get(0))
            .unwrap()
            .collect::<Result<_, _>>()
            .unwrap();
        assert_eq!(columns, vec!["date".to_string(), "deposit".to_string()]);

        let entries = store.entries(&conn).unwrap();
        assert_eq!(entries, vec![LedgerEntry::new(day(5), 4000i64)]);
    }

    #[test]
    fn test_ensure_schema_rejects_other_kinds_table() {
        let conn = Connection::open_in_memory().unwrap();
        LedgerStore::new(AccountKind::Current, AccountId::parse("fund").unwrap())
            .ensure_schema(&conn)
            .unwrap();

        let err = LedgerStore::new(AccountKind::Investment, AccountId::parse("fund").unwrap())
            .ensure_schema(&conn)
            .unwrap_err();
        assert!(matches!(err, StorageError::InvalidIdentifier { ref id, .. } if id == "fund"));
    }

    #[test]
    fn test_ensure_schema_rejects_case_variant() {
        let conn = Connection::open_in_memory().unwrap();
        LedgerStore::new(AccountKind::Current, AccountId::parse("cash").unwrap())
            .ensure_schema(&conn)
            .unwrap();

        let err = LedgerStore::new(AccountKind::Current, AccountId::parse("Cash").unwrap())
            .ensure_schema(&conn)
            .unwrap_err();
        assert!(matches!(err, StorageError::InvalidIdentifier { ref id, .. } if id == "Cash"));
    }

    #[test]
    fn test_investment_ledger_rejects_fractional_rows() {
        let conn = Connection::open_in_memory().unwrap();
        let store = LedgerStore::new(AccountKind::Investment, AccountId::parse("fund_A").unwrap());
        store.ensure_schema(&conn).unwrap();

        let err = store.append(&conn, &LedgerEntry::new(day(5), 1.5)).unwrap_err();
        assert!(matches!(err, StorageError::AmountKindMismatch { .. }));

        // bypassing the typed API still hits the CHECK constraint
        let raw = conn.execute("INSERT INTO fund_A (date, deposit) VALUES ('2024-04-05', 1.5)", []);
        assert!(matches!(
            raw,
            Err(rusqlite::Error::SqliteFailure(e, _)) if e.code == rusqlite::ErrorCode::ConstraintViolation
        ));
    }
}
