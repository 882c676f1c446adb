//! Core types and traits for Tally storage backends.
//!
//! This crate provides the `StorageBackend` trait and all associated types,
//! enabling pluggable storage implementations in separate crates.

pub mod models;
pub mod storage;

// Re-export key types at crate root for convenience
pub use models::{AccountKind, Amount, Category, Current, Investment};
pub use models::entry::{format_date, parse_date, LedgerEntry};
pub use models::identifier::AccountId;
pub use storage::{StorageBackend, StorageError};
