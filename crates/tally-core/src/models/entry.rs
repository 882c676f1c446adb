use std::sync::Arc;

use time::{format_description::FormatItem, macros::format_description, Date, OffsetDateTime};

use super::Amount;
use crate::storage::StorageError;

const DATE_FORMAT: &[FormatItem<'static>] = format_description!("[year]-[month]-[day]");

/// One immutable audit record of a balance change.
#[derive(Debug, Clone, PartialEq)]
pub struct LedgerEntry {
    pub date: Date,
    pub amount: Amount,
    /// Free text for Current entries. Investment ledgers have no reason column.
    pub reason: Option<Arc<str>>,
}

impl LedgerEntry {
    pub fn new(date: Date, amount: impl Into<Amount>) -> Self {
        Self {
            date,
            amount: amount.into(),
            reason: None,
        }
    }

    pub fn with_reason(mut self, reason: Option<&str>) -> Self {
        self.reason = reason.map(Arc::from);
        self
    }

    /// The recording day on the local calendar. Falls back to UTC when the
    /// local offset cannot be determined.
    pub fn today() -> Date {
        OffsetDateTime::now_local()
            .unwrap_or_else(|_| OffsetDateTime::now_utc())
            .date()
    }
}

pub fn format_date(date: Date) -> String {
    // the format only has numeric components, which cannot fail to render
    date.format(DATE_FORMAT)
        .unwrap_or_else(|_| format!("{:04}-{:02}-{:02}", date.year(), date.month() as u8, date.day()))
}

pub fn parse_date(s: &str) -> Result<Date, StorageError> {
    Date::parse(s, DATE_FORMAT).map_err(|e| StorageError::InvalidDate {
        value: s.to_string(),
        reason: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::Month;

    #[test]
    fn test_date_text_encoding() {
        let date = Date::from_calendar_date(2024, Month::April, 5).unwrap();
        assert_eq!(format_date(date), "2024-04-05");
        assert_eq!(parse_date("2024-04-05").unwrap(), date);
    }

    #[test]
    fn test_parse_date_rejects_garbage() {
        assert!(matches!(
            parse_date("05/04/2024"),
            Err(StorageError::InvalidDate { .. })
        ));
    }

    #[test]
    fn test_today_is_within_a_day_of_utc() {
        let utc = OffsetDateTime::now_utc().date();
        let today = LedgerEntry::today();
        let gap = (today - utc).whole_days().abs();
        assert!(gap <= 1, "local day {} too far from UTC day {}", today, utc);
    }

    #[test]
    fn test_entry_builder() {
        let date = Date::from_calendar_date(2024, Month::April, 5).unwrap();
        let entry = LedgerEntry::new(date, -20.0).with_reason(Some("meal"));
        assert_eq!(entry.amount, Amount::Real(-20.0));
        assert_eq!(entry.reason.as_deref(), Some("meal"));

        let holding = LedgerEntry::new(date, 4000i64);
        assert_eq!(holding.amount, Amount::Whole(4000));
        assert!(holding.reason.is_none());
    }
}
