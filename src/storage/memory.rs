use crate::{
    core::errors::Result,
    ledger::{Amount, Ledger},
};

use super::LedgerStore;

/// Transient store; the ledger lives only as long as the process.
#[derive(Debug, Clone)]
pub struct MemoryLedgerStore {
    ledger: Ledger,
}

impl MemoryLedgerStore {
    pub fn new(target: Amount) -> Result<Self> {
        Ok(Self {
            ledger: Ledger::new(target)?,
        })
    }

    pub fn from_ledger(ledger: Ledger) -> Self {
        Self { ledger }
    }
}

impl LedgerStore for MemoryLedgerStore {
    fn snapshot(&self) -> &Ledger {
        &self.ledger
    }

    fn commit(&mut self, next: Ledger) -> Result<()> {
        self.ledger = next;
        Ok(())
    }

    fn describe(&self) -> String {
        "in-memory ledger".into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn total_matches_sum_of_deposits() {
        let mut store = MemoryLedgerStore::new(1000).unwrap();
        let deposits = [(1, 10), (2, 25), (1, 5), (9, 0), (2, 60)];
        let mut expected = 0;
        for (day, amount) in deposits {
            let date = NaiveDate::from_ymd_opt(2025, 10, day).unwrap();
            store.record_deposit(date, amount).unwrap();
            expected += amount;
            assert_eq!(
                store.snapshot().remaining(),
                1000u64.saturating_sub(expected)
            );
        }
        assert_eq!(store.total_saved(), expected);
    }

    #[test]
    fn rejected_update_keeps_previous_state() {
        let mut store = MemoryLedgerStore::new(1000).unwrap();
        assert!(store.set_target(0).is_err());
        assert_eq!(store.settings().target, 1000);
    }
}
