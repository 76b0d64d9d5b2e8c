//! Day-by-day savings schedules.

use chrono::{Datelike, NaiveDate, Weekday};
use serde::Serialize;

use super::savings_service::SavingsService;
use crate::{
    core::errors::{Result, SavingsError},
    ledger::{Amount, Ledger},
};

pub const DEFAULT_HORIZON_DAYS: u32 = 365;
/// Longest plan that will be generated; every row is materialised in memory.
pub const MAX_HORIZON_DAYS: u32 = 3650;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlanRow {
    pub date: NaiveDate,
    pub weekday: Weekday,
    pub planned_amount: Amount,
    pub actual_amount: Amount,
    pub fulfilled: bool,
}

/// A flat schedule: one planned figure for every working day between `start` and `end`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SavingsPlan {
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub remaining: Amount,
    pub working_days: u32,
    pub daily_amount: Amount,
    pub rows: Vec<PlanRow>,
}

impl SavingsPlan {
    pub fn fulfilled_days(&self) -> usize {
        self.rows.iter().filter(|row| row.fulfilled).count()
    }

    pub fn planned_total(&self) -> Amount {
        self.rows
            .iter()
            .fold(0, |acc: Amount, row| acc.saturating_add(row.planned_amount))
    }

    pub fn actual_total(&self) -> Amount {
        self.rows
            .iter()
            .fold(0, |acc: Amount, row| acc.saturating_add(row.actual_amount))
    }
}

pub struct PlanService;

impl PlanService {
    /// Builds the schedule from `start` (or the ledger's start date) through
    /// `start + horizon_days`, both inclusive, skipping Sundays.
    ///
    /// The planned amount is computed once from the remaining balance at generation
    /// time and the number of working days in the whole range.
    pub fn generate(
        ledger: &Ledger,
        start: Option<NaiveDate>,
        horizon_days: u32,
    ) -> Result<SavingsPlan> {
        if horizon_days > MAX_HORIZON_DAYS {
            return Err(SavingsError::Validation(format!(
                "plan horizon of {} days exceeds the maximum of {} days",
                horizon_days, MAX_HORIZON_DAYS
            )));
        }
        let start = start.or(ledger.settings.start_date).ok_or_else(|| {
            SavingsError::PlanUnavailable(
                "no start date yet; record a deposit or set a start date first".into(),
            )
        })?;
        let end = SavingsService::horizon_end(start, horizon_days);
        let remaining = ledger.remaining();
        let working_days = SavingsService::remaining_working_days(start, end);
        let daily_amount = SavingsService::recommended_daily_amount(remaining, working_days);

        let rows: Vec<PlanRow> = start
            .iter_days()
            .take_while(|date| *date <= end)
            .filter(|date| SavingsService::is_working_day(*date))
            .map(|date| {
                let actual_amount = ledger.entry_on(date).unwrap_or(0);
                PlanRow {
                    date,
                    weekday: date.weekday(),
                    planned_amount: daily_amount,
                    actual_amount,
                    fulfilled: actual_amount > 0,
                }
            })
            .collect();

        tracing::debug!(
            %start,
            %end,
            working_days,
            daily_amount,
            "savings plan generated"
        );

        Ok(SavingsPlan {
            start,
            end,
            remaining,
            working_days,
            daily_amount,
            rows,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn plan_requires_a_start_date() {
        let ledger = Ledger::new(1000).unwrap();
        let err = PlanService::generate(&ledger, None, DEFAULT_HORIZON_DAYS).unwrap_err();
        assert!(matches!(err, SavingsError::PlanUnavailable(_)));
    }

    #[test]
    fn explicit_start_overrides_missing_setting() {
        let ledger = Ledger::new(600).unwrap();
        let plan = PlanService::generate(&ledger, Some(date(2025, 10, 6)), 6).unwrap();
        assert_eq!(plan.rows.len(), 6);
        assert_eq!(plan.working_days, 6);
        assert_eq!(plan.daily_amount, 100);
        assert!(plan.rows.iter().all(|row| row.weekday != Weekday::Sun));
    }

    #[test]
    fn plan_marks_fulfilled_days() {
        let mut ledger = Ledger::new(1000).unwrap();
        let start = date(2025, 10, 6);
        ledger.record_deposit(start, 40).unwrap();
        ledger.record_deposit(date(2025, 10, 8), 20).unwrap();
        // Sunday deposits are kept in the ledger but never appear in the plan.
        ledger.record_deposit(date(2025, 10, 12), 5).unwrap();

        let plan = PlanService::generate(&ledger, None, 13).unwrap();
        assert_eq!(plan.start, start);
        assert_eq!(plan.end, date(2025, 10, 19));
        assert_eq!(plan.remaining, 935);
        assert_eq!(plan.working_days, 12);
        assert_eq!(plan.daily_amount, 77);
        assert_eq!(plan.fulfilled_days(), 2);
        assert_eq!(plan.actual_total(), 60);
        assert_eq!(plan.planned_total(), 77 * 12);
        assert_eq!(plan.rows.first().map(|row| row.actual_amount), Some(40));
    }

    #[test]
    fn default_horizon_is_inclusive() {
        let mut ledger = Ledger::new(1000).unwrap();
        ledger.set_start_date(date(2025, 1, 1)).unwrap();
        let plan = PlanService::generate(&ledger, None, DEFAULT_HORIZON_DAYS).unwrap();
        assert_eq!(plan.end, date(2026, 1, 1));
        assert_eq!(plan.rows.len() as u32, plan.working_days);
        assert_eq!(plan.rows.last().map(|row| row.date), Some(date(2026, 1, 1)));
    }

    #[test]
    fn horizon_beyond_the_maximum_is_rejected() {
        let mut ledger = Ledger::new(1000).unwrap();
        ledger.record_deposit(date(2025, 10, 6), 10).unwrap();
        let err = PlanService::generate(&ledger, None, MAX_HORIZON_DAYS + 1).unwrap_err();
        assert!(err.is_validation());
        assert!(PlanService::generate(&ledger, None, u32::MAX).is_err());
        let longest = PlanService::generate(&ledger, None, MAX_HORIZON_DAYS).unwrap();
        assert_eq!(longest.end, date(2035, 10, 4));
    }

}
