//! Tally: balances for cash, card and wallet accounts plus investment
//! holdings, each with an append-only ledger, stored in SQLite.

pub mod account;
pub mod config;
pub mod demo;

pub use account::{Account, CurrentAccount, InvestmentAccount};
pub use tally_core::{
    format_date, AccountId, AccountKind, Amount, Category, Current, Investment, LedgerEntry, StorageBackend,
    StorageError,
};
pub use tally_memory::InMemoryStorage;
pub use tally_sqlite::SqliteStorage;
