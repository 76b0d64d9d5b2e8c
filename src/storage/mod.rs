pub mod json_backend;
pub mod memory;

use std::path::PathBuf;

use chrono::{DateTime, NaiveDate, Utc};

use crate::{
    core::errors::Result,
    ledger::{Amount, Ledger, Settings},
};

/// Describes a rotated copy of a ledger file.
#[derive(Debug, Clone)]
pub struct BackupInfo {
    pub id: String,
    pub created_at: Option<DateTime<Utc>>,
    pub path: PathBuf,
}

/// Abstraction over persistence backends holding a single ledger.
///
/// Backends only provide a read snapshot and an all-or-nothing `commit`; every
/// operation below stages its change on a copy of the snapshot and commits the copy.
/// A failed commit must leave the snapshot untouched.
pub trait LedgerStore: Send {
    fn snapshot(&self) -> &Ledger;

    fn commit(&mut self, next: Ledger) -> Result<()>;

    /// Short label for logs and status output.
    fn describe(&self) -> String;

    fn list_backups(&self) -> Result<Vec<BackupInfo>> {
        Ok(Vec::new())
    }

    fn settings(&self) -> Settings {
        self.snapshot().settings.clone()
    }

    fn set_target(&mut self, amount: Amount) -> Result<()> {
        let mut next = self.snapshot().clone();
        next.set_target(amount)?;
        self.commit(next)
    }

    fn set_start_date(&mut self, date: NaiveDate) -> Result<()> {
        let mut next = self.snapshot().clone();
        next.set_start_date(date)?;
        self.commit(next)
    }

    fn set_local_rate(&mut self, rate: f64) -> Result<()> {
        let mut next = self.snapshot().clone();
        next.set_local_rate(rate)?;
        self.commit(next)
    }

    /// Accumulates `amount` onto `date` and returns the resulting amount for that date.
    fn record_deposit(&mut self, date: NaiveDate, amount: Amount) -> Result<Amount> {
        let mut next = self.snapshot().clone();
        let value = next.record_deposit(date, amount)?;
        self.commit(next)?;
        Ok(value)
    }

    fn set_entry_exact(&mut self, date: NaiveDate, amount: Amount) -> Result<()> {
        let mut next = self.snapshot().clone();
        next.set_entry_exact(date, amount)?;
        self.commit(next)
    }

    fn total_saved(&self) -> Amount {
        self.snapshot().total_saved()
    }

    fn entries_in_range(&self, start: NaiveDate, end: NaiveDate) -> Vec<(NaiveDate, Amount)> {
        self.snapshot().entries_in_range(start, end)
    }
}

pub use json_backend::JsonLedgerStore;
pub use memory::MemoryLedgerStore;
