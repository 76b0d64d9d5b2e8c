use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::settings::{Amount, Settings};
use crate::core::errors::{Result, SavingsError};

pub const CURRENT_SCHEMA_VERSION: u8 = 1;

/// Per-day deposit record plus the singleton settings it is measured against.
///
/// Every mutator validates first and only then touches state, so a rejected call
/// leaves the ledger exactly as it was.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Ledger {
    pub id: Uuid,
    pub settings: Settings,
    #[serde(default)]
    pub entries: BTreeMap<NaiveDate, Amount>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default = "Ledger::schema_version_default")]
    pub schema_version: u8,
}

impl Ledger {
    /// Creates an empty ledger with `target` and no start date.
    pub fn new(target: Amount) -> Result<Self> {
        Settings::validate_target(target)?;
        let now = Utc::now();
        Ok(Self {
            id: Uuid::new_v4(),
            settings: Settings::new(target),
            entries: BTreeMap::new(),
            created_at: now,
            updated_at: now,
            schema_version: CURRENT_SCHEMA_VERSION,
        })
    }

    pub fn set_target(&mut self, amount: Amount) -> Result<()> {
        Settings::validate_target(amount)?;
        self.settings.target = amount;
        self.touch();
        Ok(())
    }

    /// Replaces the start date. A date after the earliest recorded deposit is rejected,
    /// since the plan would otherwise start after money was already saved.
    pub fn set_start_date(&mut self, date: NaiveDate) -> Result<()> {
        if let Some(earliest) = self.earliest_entry_date() {
            if date > earliest {
                return Err(SavingsError::Validation(format!(
                    "start date {} is after the first recorded deposit on {}",
                    date, earliest
                )));
            }
        }
        self.settings.start_date = Some(date);
        self.touch();
        Ok(())
    }

    pub fn set_local_rate(&mut self, rate: f64) -> Result<()> {
        if !rate.is_finite() || rate <= 0.0 {
            return Err(SavingsError::Validation(format!(
                "exchange rate must be a positive number, got {}",
                rate
            )));
        }
        self.settings.local_rate = Some(rate);
        self.touch();
        Ok(())
    }

    /// Adds `amount` to the entry for `date` and returns the new value for that date.
    ///
    /// The start date never lies after the earliest entry: a deposit dated before it is
    /// rejected, and the first deposit anchors the start date on the earliest entry.
    pub fn record_deposit(&mut self, date: NaiveDate, amount: Amount) -> Result<Amount> {
        self.ensure_not_before_start(date)?;
        let current = self.entries.get(&date).copied().unwrap_or(0);
        let updated = current.checked_add(amount).ok_or_else(|| {
            SavingsError::Validation(format!("deposit of {} on {} overflows", amount, date))
        })?;
        self.entries.insert(date, updated);
        if self.settings.start_date.is_none() {
            self.settings.start_date = self.earliest_entry_date();
        }
        self.touch();
        Ok(updated)
    }

    /// Overwrites the entry for `date`. Never anchors the start date.
    pub fn set_entry_exact(&mut self, date: NaiveDate, amount: Amount) -> Result<()> {
        self.ensure_not_before_start(date)?;
        self.entries.insert(date, amount);
        self.touch();
        Ok(())
    }

    fn ensure_not_before_start(&self, date: NaiveDate) -> Result<()> {
        match self.settings.start_date {
            Some(start) if date < start => Err(SavingsError::Validation(format!(
                "{} is before the start date {}; run `set-start {}` first",
                date, start, date
            ))),
            _ => Ok(()),
        }
    }

    pub fn entry_on(&self, date: NaiveDate) -> Option<Amount> {
        self.entries.get(&date).copied()
    }

    pub fn total_saved(&self) -> Amount {
        self.entries
            .values()
            .fold(0, |acc: Amount, amount| acc.saturating_add(*amount))
    }

    pub fn remaining(&self) -> Amount {
        self.settings.target.saturating_sub(self.total_saved())
    }

    /// Entries within `[start, end]`, ascending by date. An inverted range is empty.
    pub fn entries_in_range(&self, start: NaiveDate, end: NaiveDate) -> Vec<(NaiveDate, Amount)> {
        if start > end {
            return Vec::new();
        }
        self.entries
            .range(start..=end)
            .map(|(date, amount)| (*date, *amount))
            .collect()
    }

    pub fn earliest_entry_date(&self) -> Option<NaiveDate> {
        self.entries.keys().next().copied()
    }

    pub fn entry_count(&self) -> usize {
        self.entries.len()
    }

    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }

    pub fn schema_version_default() -> u8 {
        CURRENT_SCHEMA_VERSION
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn deposits_on_same_date_accumulate() {
        let mut ledger = Ledger::new(100_000).unwrap();
        let day = date(2025, 10, 1);
        assert_eq!(ledger.record_deposit(day, 40_000).unwrap(), 40_000);
        assert_eq!(ledger.record_deposit(day, 40_000).unwrap(), 80_000);
        assert_eq!(ledger.entry_on(day), Some(80_000));
        assert_eq!(ledger.entry_count(), 1);
    }

    #[test]
    fn first_deposit_anchors_start_date() {
        let mut ledger = Ledger::new(1000).unwrap();
        assert!(ledger.settings.start_date.is_none());
        ledger.record_deposit(date(2025, 10, 3), 10).unwrap();
        assert_eq!(ledger.settings.start_date, Some(date(2025, 10, 3)));
    }

    #[test]
    fn back_dated_deposit_before_start_is_rejected() {
        let mut ledger = Ledger::new(1000).unwrap();
        ledger.record_deposit(date(2025, 10, 6), 10).unwrap();

        let err = ledger.record_deposit(date(2025, 10, 1), 5).unwrap_err();
        assert!(err.is_validation());
        assert!(err.to_string().contains("set-start 2025-10-01"));
        assert!(ledger.set_entry_exact(date(2025, 10, 1), 5).is_err());
        assert_eq!(ledger.total_saved(), 10);

        ledger.set_start_date(date(2025, 10, 6)).unwrap();
        ledger.set_start_date(date(2025, 10, 1)).unwrap();
        ledger.record_deposit(date(2025, 10, 1), 5).unwrap();
        assert_eq!(ledger.total_saved(), 15);
        assert_eq!(ledger.earliest_entry_date(), ledger.settings.start_date);
    }

    #[test]
    fn exact_entry_does_not_anchor_start_date() {
        let mut ledger = Ledger::new(1000).unwrap();
        ledger.set_entry_exact(date(2025, 10, 3), 25).unwrap();
        assert!(ledger.settings.start_date.is_none());
        ledger.set_entry_exact(date(2025, 10, 3), 5).unwrap();
        assert_eq!(ledger.total_saved(), 5);
    }

    #[test]
    fn first_deposit_anchors_on_earlier_exact_entry() {
        let mut ledger = Ledger::new(1000).unwrap();
        ledger.set_entry_exact(date(2025, 10, 2), 25).unwrap();
        ledger.record_deposit(date(2025, 10, 7), 5).unwrap();
        assert_eq!(ledger.settings.start_date, Some(date(2025, 10, 2)));
    }

    #[test]
    fn remaining_never_goes_negative() {
        let mut ledger = Ledger::new(1000).unwrap();
        ledger.record_deposit(date(2025, 10, 1), 990).unwrap();
        assert_eq!(ledger.remaining(), 10);
        ledger.record_deposit(date(2025, 10, 2), 500).unwrap();
        assert_eq!(ledger.total_saved(), 1490);
        assert_eq!(ledger.remaining(), 0);
    }

    #[test]
    fn non_positive_target_is_rejected() {
        assert!(Ledger::new(0).is_err());
        let mut ledger = Ledger::new(10).unwrap();
        let err = ledger.set_target(0).unwrap_err();
        assert!(err.is_validation());
        assert_eq!(ledger.settings.target, 10);
    }

    #[test]
    fn start_date_after_first_deposit_is_rejected() {
        let mut ledger = Ledger::new(1000).unwrap();
        ledger.record_deposit(date(2025, 10, 5), 10).unwrap();
        assert!(ledger.set_start_date(date(2025, 10, 6)).is_err());
        ledger.set_start_date(date(2025, 10, 1)).unwrap();
        assert_eq!(ledger.settings.start_date, Some(date(2025, 10, 1)));
    }

    #[test]
    fn local_rate_must_be_positive() {
        let mut ledger = Ledger::new(1000).unwrap();
        assert!(ledger.set_local_rate(0.0).is_err());
        assert!(ledger.set_local_rate(f64::NAN).is_err());
        ledger.set_local_rate(12_500.0).unwrap();
        assert_eq!(ledger.settings.local_rate, Some(12_500.0));
    }

    #[test]
    fn range_query_is_ordered_and_inclusive() {
        let mut ledger = Ledger::new(1000).unwrap();
        ledger.set_start_date(date(2025, 10, 1)).unwrap();
        ledger.record_deposit(date(2025, 10, 9), 3).unwrap();
        ledger.record_deposit(date(2025, 10, 1), 1).unwrap();
        ledger.record_deposit(date(2025, 10, 5), 2).unwrap();
        ledger.record_deposit(date(2025, 11, 1), 4).unwrap();
        let rows = ledger.entries_in_range(date(2025, 10, 1), date(2025, 10, 9));
        assert_eq!(
            rows,
            vec![
                (date(2025, 10, 1), 1),
                (date(2025, 10, 5), 2),
                (date(2025, 10, 9), 3)
            ]
        );
        assert!(ledger
            .entries_in_range(date(2025, 10, 9), date(2025, 10, 1))
            .is_empty());
    }

    #[test]
    fn serializes_entries_keyed_by_iso_date() {
        let mut ledger = Ledger::new(1000).unwrap();
        ledger.record_deposit(date(2025, 10, 1), 10).unwrap();
        let json = serde_json::to_value(&ledger).unwrap();
        assert_eq!(json["entries"]["2025-10-01"], 10);
        let back: Ledger = serde_json::from_value(json).unwrap();
        assert_eq!(back.entry_on(date(2025, 10, 1)), Some(10));
    }
}
