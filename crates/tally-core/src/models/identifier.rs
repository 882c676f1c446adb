use std::{fmt::Display, str::FromStr, sync::Arc};

use super::AccountKind;
use crate::storage::StorageError;

pub const MAX_ID_LEN: usize = 64;

/// Every keyword SQLite reserves (https://www.sqlite.org/lang_keywords.html).
const SQLITE_KEYWORDS: &[&str] = &[
    "ABORT", "ACTION", "ADD", "AFTER", "ALL", "ALTER", "ALWAYS", "ANALYZE", "AND", "AS",
    "ASC", "ATTACH", "AUTOINCREMENT", "BEFORE", "BEGIN", "BETWEEN", "BY", "CASCADE",
    "CASE", "CAST", "CHECK", "COLLATE", "COLUMN", "COMMIT", "CONFLICT", "CONSTRAINT",
    "CREATE", "CROSS", "CURRENT", "CURRENT_DATE", "CURRENT_TIME", "CURRENT_TIMESTAMP",
    "DATABASE", "DEFAULT", "DEFERRABLE", "DEFERRED", "DELETE", "DESC", "DETACH",
    "DISTINCT", "DO", "DROP", "EACH", "ELSE", "END", "ESCAPE", "EXCEPT", "EXCLUDE",
    "EXCLUSIVE", "EXISTS", "EXPLAIN", "FAIL", "FILTER", "FIRST", "FOLLOWING", "FOR",
    "FOREIGN", "FROM", "FULL", "GENERATED", "GLOB", "GROUP", "GROUPS", "HAVING", "IF",
    "IGNORE", "IMMEDIATE", "IN", "INDEX", "INDEXED", "INITIALLY", "INNER", "INSERT",
    "INSTEAD", "INTERSECT", "INTO", "IS", "ISNULL", "JOIN", "KEY", "LAST", "LEFT",
    "LIKE", "LIMIT", "MATCH", "MATERIALIZED", "NATURAL", "NO", "NOT", "NOTHING",
    "NOTNULL", "NULL", "NULLS", "OF", "OFFSET", "ON", "OR", "ORDER", "OTHERS", "OUTER",
    "OVER", "PARTITION", "PLAN", "PRAGMA", "PRECEDING", "PRIMARY", "QUERY", "RAISE",
    "RANGE", "RECURSIVE", "REFERENCES", "REGEXP", "REINDEX", "RELEASE", "RENAME",
    "REPLACE", "RESTRICT", "RETURNING", "RIGHT", "ROLLBACK", "ROW", "ROWS", "SAVEPOINT",
    "SELECT", "SET", "TABLE", "TEMP", "TEMPORARY", "THEN", "TIES", "TO", "TRANSACTION",
    "TRIGGER", "UNBOUNDED", "UNION", "UNIQUE", "UPDATE", "USING", "VACUUM", "VALUES",
    "VIEW", "VIRTUAL", "WHEN", "WHERE", "WINDOW", "WITH", "WITHOUT",
];

/// An account identifier that is safe to use as a table name.
///
/// Ledger tables are named after the account, so the identifier is
/// restricted to `[A-Za-z_][A-Za-z0-9_]*`, must not be an SQLite keyword,
/// and must not shadow a balance table or SQLite's internal `sqlite_` tables.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AccountId(Arc<str>);

impl AccountId {
    pub fn parse(id: &str) -> Result<Self, StorageError> {
        let invalid = |reason: &str| StorageError::InvalidIdentifier {
            id: id.to_string(),
            reason: reason.to_string(),
        };

        let first = id.chars().next().ok_or_else(|| invalid("identifier is empty"))?;
        if id.len() > MAX_ID_LEN {
            return Err(invalid("identifier is longer than 64 characters"));
        }
        if !(first.is_ascii_alphabetic() || first == '_') {
            return Err(invalid("identifier must start with a letter or underscore"));
        }
        if !id.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
            return Err(invalid("identifier may only contain ASCII letters, digits and underscores"));
        }
        if id.to_ascii_lowercase().starts_with("sqlite_") {
            return Err(invalid("the sqlite_ prefix is reserved"));
        }
        if SQLITE_KEYWORDS.iter().any(|kw| kw.eq_ignore_ascii_case(id)) {
            return Err(invalid("identifier is an SQL keyword"));
        }
        if AccountKind::ALL
            .iter()
            .any(|kind| kind.balance_table().eq_ignore_ascii_case(id))
        {
            return Err(invalid("identifier collides with a balance table"));
        }

        Ok(Self(Arc::from(id)))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Error for an id whose table name is already taken by another account.
    pub fn conflict(&self, reason: impl Into<String>) -> StorageError {
        StorageError::InvalidIdentifier {
            id: self.0.to_string(),
            reason: reason.into(),
        }
    }

    /// Double-quoted form for schema and DML statements.
    pub fn quoted(&self) -> String {
        format!("\"{}\"", self.0)
    }
}

impl FromStr for AccountId {
    type Err = StorageError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl Display for AccountId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for AccountId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
