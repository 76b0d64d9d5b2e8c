//! Totals, remaining balance, and per-day recommendations derived from a ledger snapshot.

use chrono::{Datelike, Duration, NaiveDate, Weekday};
use serde::Serialize;

use crate::ledger::{Amount, Ledger, YearMonth};

/// Point-in-time view of the ledger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SavingsStatus {
    pub as_of: NaiveDate,
    pub target: Amount,
    pub total: Amount,
    pub remaining: Amount,
    pub today_saved: Amount,
    pub start_date: Option<NaiveDate>,
}

impl SavingsStatus {
    pub fn is_complete(&self) -> bool {
        self.remaining == 0
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DailyRecommendation {
    pub remaining: Amount,
    pub working_days: u32,
    pub daily_amount: Amount,
    pub horizon_end: NaiveDate,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MonthlyReport {
    pub month: YearMonth,
    pub entries: Vec<(NaiveDate, Amount)>,
    pub total: Amount,
}

impl MonthlyReport {
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

pub struct SavingsService;

impl SavingsService {
    pub fn status(ledger: &Ledger, today: NaiveDate) -> SavingsStatus {
        SavingsStatus {
            as_of: today,
            target: ledger.settings.target,
            total: ledger.total_saved(),
            remaining: ledger.remaining(),
            today_saved: ledger.entry_on(today).unwrap_or(0),
            start_date: ledger.settings.start_date,
        }
    }

    pub fn is_working_day(date: NaiveDate) -> bool {
        date.weekday() != Weekday::Sun
    }

    /// Days in `[as_of, end]` that are not Sundays. Zero when `end < as_of`.
    pub fn remaining_working_days(as_of: NaiveDate, end: NaiveDate) -> u32 {
        if end < as_of {
            return 0;
        }
        let span = (end - as_of).num_days() + 1;
        let full_weeks = span / 7;
        let tail = (0..span % 7)
            .filter_map(|offset| as_of.checked_add_signed(Duration::days(full_weeks * 7 + offset)))
            .filter(|date| Self::is_working_day(*date))
            .count() as i64;
        u32::try_from(full_weeks * 6 + tail).unwrap_or(u32::MAX)
    }

    /// Floor of `remaining / working_days`; the whole remainder when no working days are left.
    pub fn recommended_daily_amount(remaining: Amount, working_days: u32) -> Amount {
        if working_days == 0 {
            remaining
        } else {
            remaining / Amount::from(working_days)
        }
    }

    /// `start + horizon_days`, saturating at the last representable date.
    pub fn horizon_end(start: NaiveDate, horizon_days: u32) -> NaiveDate {
        start
            .checked_add_signed(Duration::days(i64::from(horizon_days)))
            .unwrap_or(NaiveDate::MAX)
    }

    /// Recommendation from `today` to the plan horizon. The horizon is anchored on the
    /// start date when known, otherwise on `today`.
    pub fn daily_recommendation(
        ledger: &Ledger,
        today: NaiveDate,
        horizon_days: u32,
    ) -> DailyRecommendation {
        let anchor = ledger.settings.start_date.unwrap_or(today);
        let horizon_end = Self::horizon_end(anchor, horizon_days);
        let remaining = ledger.remaining();
        let working_days = Self::remaining_working_days(today, horizon_end);
        DailyRecommendation {
            remaining,
            working_days,
            daily_amount: Self::recommended_daily_amount(remaining, working_days),
            horizon_end,
        }
    }

    /// Entries within `month`, ascending. An empty month is a valid report.
    pub fn monthly_report(ledger: &Ledger, month: YearMonth) -> MonthlyReport {
        let entries = ledger.entries_in_range(month.first_day(), month.last_day());
        let total = entries
            .iter()
            .fold(0, |acc: Amount, (_, amount)| acc.saturating_add(*amount));
        MonthlyReport {
            month,
            entries,
            total,
        }
    }
}
