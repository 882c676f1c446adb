use std::fmt::{self, Display};

use serde::{Deserialize, Serialize};

use crate::storage::StorageError;

pub mod entry;
pub mod identifier;

/// The closed set of account categories. Each one owns a balance table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccountKind {
    /// Cash-like lines: wallets, bank cards, cash on hand.
    Current,
    /// Holdings counted in whole units: stocks, funds.
    Investment,
}

impl AccountKind {
    pub const ALL: [AccountKind; 2] = [AccountKind::Current, AccountKind::Investment];

    pub fn balance_table(&self) -> &'static str {
        match self {
            AccountKind::Current => "CurrentAsset",
            AccountKind::Investment => "InvestmentAsset",
        }
    }

    /// Whether `amount` has the representation this kind stores.
    pub fn accepts(&self, amount: &Amount) -> bool {
        matches!(
            (self, amount),
            (AccountKind::Current, Amount::Real(_)) | (AccountKind::Investment, Amount::Whole(_))
        )
    }

    pub fn check(&self, amount: &Amount) -> Result<(), StorageError> {
        if !self.accepts(amount) {
            return Err(StorageError::AmountKindMismatch {
                kind: *self,
                amount: *amount,
            });
        }
        // SQLite stores NaN as NULL, which would poison the balance row
        if let Amount::Real(r) = amount {
            if !r.is_finite() {
                return Err(StorageError::NonFiniteAmount {
                    kind: *self,
                    amount: *r,
                });
            }
        }
        Ok(())
    }

    pub fn zero(&self) -> Amount {
        match self {
            AccountKind::Current => Amount::Real(0.0),
            AccountKind::Investment => Amount::Whole(0),
        }
    }
}

impl Display for AccountKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AccountKind::Current => write!(f, "current"),
            AccountKind::Investment => write!(f, "investment"),
        }
    }
}

/// A balance or delta as it crosses the storage boundary.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Amount {
    Real(f64),
    Whole(i64),
}

impl Amount {
    pub fn as_f64(&self) -> f64 {
        match self {
            Amount::Real(r) => *r,
            Amount::Whole(w) => *w as f64,
        }
    }

    pub fn checked_add(&self, other: &Amount) -> Option<Amount> {
        match (self, other) {
            (Amount::Real(a), Amount::Real(b)) => Some(Amount::Real(a + b)),
            (Amount::Whole(a), Amount::Whole(b)) => a.checked_add(*b).map(Amount::Whole),
            _ => None,
        }
    }
}

impl From<f64> for Amount {
    fn from(value: f64) -> Self {
        Amount::Real(value)
    }
}

impl From<i64> for Amount {
    fn from(value: i64) -> Self {
        Amount::Whole(value)
    }
}

impl Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Amount::Real(r) => write!(f, "{}", r),
            Amount::Whole(w) => write!(f, "{}", w),
        }
    }
}

mod private {
    pub trait Sealed {}
    impl Sealed for super::Current {}
    impl Sealed for super::Investment {}
}

/// Compile-time marker for an account category.
pub trait Category: private::Sealed {
    const KIND: AccountKind;
    type Amount: Copy + PartialEq + fmt::Debug + Display + Into<Amount>;

    fn from_amount(amount: Amount) -> Result<Self::Amount, StorageError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Current;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Investment;

impl Category for Current {
    const KIND: AccountKind = AccountKind::Current;
    type Amount = f64;

    fn from_amount(amount: Amount) -> Result<f64, StorageError> {
        // REAL columns may hand back integral values stored by older files
        Ok(amount.as_f64())
    }
}

impl Category for Investment {
    const KIND: AccountKind = AccountKind::Investment;
    type Amount = i64;

    fn from_amount(amount: Amount) -> Result<i64, StorageError> {
        match amount {
            Amount::Whole(w) => Ok(w),
            Amount::Real(_) => Err(StorageError::AmountKindMismatch {
                kind: AccountKind::Investment,
                amount,
            }),
        }
    }
}
