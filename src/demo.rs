//! The scripted walk-through run by the `tally` binary.

use prettytable::{row, Table};
use tally_core::{parse_date, AccountKind, Amount, Category, Current, Investment, LedgerEntry, StorageError};

use crate::{
    account::{CurrentAccount, InvestmentAccount},
    config::{Config, DeltaConfig, SeedAccount},
};

enum DemoAccount {
    Current(CurrentAccount),
    Investment(InvestmentAccount),
}

impl DemoAccount {
    fn open(path: &str, seed: &SeedAccount) -> Result<Self, StorageError> {
        let initial: Amount = seed.initial.into();
        Ok(match seed.kind {
            AccountKind::Current => {
                DemoAccount::Current(CurrentAccount::open(path, &seed.id, Current::from_amount(initial)?)?)
            }
            AccountKind::Investment => DemoAccount::Investment(InvestmentAccount::open(
                path,
                &seed.id,
                Investment::from_amount(initial)?,
            )?),
        })
    }

    fn id(&self) -> &str {
        match self {
            DemoAccount::Current(a) => a.id().as_str(),
            DemoAccount::Investment(a) => a.id().as_str(),
        }
    }

    fn apply(&mut self, delta: &DeltaConfig) -> Result<(), StorageError> {
        let date = match delta.date {
            Some(ref d) => parse_date(d)?,
            None => LedgerEntry::today(),
        };
        let amount: Amount = delta.amount.into();
        match self {
            DemoAccount::Current(a) => {
                a.apply_delta_on(date, Current::from_amount(amount)?, delta.reason.as_deref())
            }
            DemoAccount::Investment(a) => a.apply_delta_on(date, Investment::from_amount(amount)?),
        }
    }

    fn summary(&self) -> Result<BalanceRow, StorageError> {
        let (kind, balance, entries) = match self {
            DemoAccount::Current(a) => (a.kind(), Amount::Real(a.balance()?), a.entries()?.len()),
            DemoAccount::Investment(a) => (a.kind(), Amount::Whole(a.balance()?), a.entries()?.len()),
        };
        Ok(BalanceRow {
            account: self.id().to_string(),
            kind,
            balance,
            entries,
        })
    }

    fn close(self) -> Result<(), StorageError> {
        match self {
            DemoAccount::Current(a) => a.close(),
            DemoAccount::Investment(a) => a.close(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct BalanceRow {
    pub account: String,
    pub kind: AccountKind,
    pub balance: Amount,
    pub entries: usize,
}

/// Seeds the configured accounts, applies the configured deltas and returns
/// the resulting balances in seed order.
pub fn run(config: &Config) -> Result<Vec<BalanceRow>, StorageError> {
    let path = config.storage.path.as_str();
    let mut accounts = config
        .demo
        .accounts
        .iter()
        .map(|seed| DemoAccount::open(path, seed))
        .collect::<Result<Vec<_>, _>>()?;

    for delta in &config.demo.deltas {
        let account = accounts
            .iter_mut()
            .find(|a| a.id() == delta.account)
            .ok_or_else(|| StorageError::AccountNotFound(delta.account.clone()))?;
        account.apply(delta)?;
        tracing::info!(account = %delta.account, amount = ?delta.amount, "delta applied");
    }

    let rows = accounts
        .iter()
        .map(DemoAccount::summary)
        .collect::<Result<Vec<_>, _>>()?;

    for account in accounts {
        account.close()?;
    }
    Ok(rows)
}

pub fn render(rows: &[BalanceRow]) -> Table {
    let mut table = Table::new();
    table.add_row(row!["Account", "Kind", "Balance", "Entries"]);
    for r in rows {
        table.add_row(row![r.account, r.kind, r.balance, r.entries]);
    }
    table
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AmountValue;

    fn memory_config() -> Config {
        let mut config = Config::default();
        config.storage.path = ":memory:".to_string();
        config
    }

    #[test]
    fn test_render_has_header_and_rows() {
        let rows = vec![BalanceRow {
            account: "cash".to_string(),
            kind: AccountKind::Current,
            balance: Amount::Real(180.0),
            entries: 1,
        }];
        let rendered = render(&rows).to_string();
        assert!(rendered.contains("Account"));
        assert!(rendered.contains("cash"));
        assert!(rendered.contains("180"));
    }

    #[test]
    fn test_delta_for_unknown_account_fails() {
        let mut config = memory_config();
        config.demo.deltas.push(DeltaConfig {
            account: "nobody".to_string(),
            amount: AmountValue::Real(1.0),
            reason: None,
            date: None,
        });
        assert!(matches!(run(&config), Err(StorageError::AccountNotFound(ref id)) if id == "nobody"));
    }

    #[test]
    fn test_fractional_investment_seed_fails() {
        let mut config = memory_config();
        config.demo.accounts = vec![SeedAccount {
            id: "fund_A".to_string(),
            kind: AccountKind::Investment,
            initial: AmountValue::Real(1.5),
        }];
        config.demo.deltas.clear();
        assert!(matches!(run(&config), Err(StorageError::AmountKindMismatch { .. })));
    }
}
