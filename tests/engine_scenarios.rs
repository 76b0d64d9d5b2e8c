mod common;

use chrono::{Datelike, Duration, Weekday};
use common::date;
use savings_core::{
    core::{errors::SavingsError, services::PlanService, services::SavingsService},
    ledger::YearMonth,
    storage::{LedgerStore, MemoryLedgerStore},
};

#[test]
fn first_deposit_reflects_in_status() {
    let mut store = MemoryLedgerStore::new(1000).unwrap();
    let day_one = date(2025, 10, 1);
    store.record_deposit(day_one, 10).unwrap();

    let status = SavingsService::status(store.snapshot(), day_one);
    assert_eq!(status.total, 10);
    assert_eq!(status.remaining, 990);
    assert_eq!(status.today_saved, 10);
    assert_eq!(status.start_date, Some(day_one));
}

#[test]
fn same_day_deposits_accumulate() {
    let mut store = MemoryLedgerStore::new(1_000_000).unwrap();
    let day = date(2025, 10, 6);
    store.record_deposit(day, 40_000).unwrap();
    let day_total = store.record_deposit(day, 40_000).unwrap();

    assert_eq!(day_total, 80_000);
    assert_eq!(store.snapshot().entry_on(day), Some(80_000));
    assert_eq!(store.total_saved(), 80_000);
}

#[test]
fn remaining_never_goes_negative() {
    let mut store = MemoryLedgerStore::new(100).unwrap();
    for (target, deposit) in [(100, 30), (50, 40), (10, 0), (500, 1)] {
        store.set_target(target).unwrap();
        store.record_deposit(date(2025, 1, 2), deposit).unwrap();
        let ledger = store.snapshot();
        assert_eq!(
            ledger.remaining(),
            ledger.settings.target.saturating_sub(ledger.total_saved())
        );
    }
    store.set_target(1).unwrap();
    assert_eq!(store.snapshot().remaining(), 0);
}

#[test]
fn any_week_has_six_working_days() {
    let monday = date(2025, 10, 6);
    for offset in 0..7 {
        let start = monday + Duration::days(offset);
        let end = start + Duration::days(6);
        assert_eq!(SavingsService::remaining_working_days(start, end), 6);
        assert!(start
            .iter_days()
            .take_while(|day| *day <= end)
            .filter(|day| day.weekday() == Weekday::Sun)
            .all(|sunday| !SavingsService::is_working_day(sunday)));
    }
}

#[test]
fn recommended_amount_edge_cases() {
    assert_eq!(SavingsService::recommended_daily_amount(0, 30), 0);
    assert_eq!(SavingsService::recommended_daily_amount(100, 0), 100);
    assert_eq!(SavingsService::recommended_daily_amount(100, 3), 33);
}

#[test]
fn plan_without_start_date_is_unavailable() {
    let store = MemoryLedgerStore::new(1000).unwrap();
    let err = PlanService::generate(store.snapshot(), None, 365).unwrap_err();
    assert!(matches!(err, SavingsError::PlanUnavailable(_)));
}

#[test]
fn plan_marks_fulfilled_days_and_skips_sundays() {
    let mut store = MemoryLedgerStore::new(1200).unwrap();
    let monday = date(2025, 10, 6);
    store.record_deposit(monday, 100).unwrap();

    let plan = PlanService::generate(store.snapshot(), None, 13).unwrap();
    assert_eq!(plan.start, monday);
    assert_eq!(plan.working_days, 12);
    assert_eq!(plan.rows.len(), 12);
    assert_eq!(plan.daily_amount, 1100 / 12);
    assert!(plan.rows.iter().all(|row| row.weekday != Weekday::Sun));
    assert!(plan.rows[0].fulfilled);
    assert_eq!(plan.rows[0].actual_amount, 100);
    assert_eq!(plan.fulfilled_days(), 1);
}

#[test]
fn empty_month_is_a_valid_report() {
    let mut store = MemoryLedgerStore::new(1000).unwrap();
    store.record_deposit(date(2025, 9, 30), 25).unwrap();
    store.record_deposit(date(2025, 11, 1), 25).unwrap();

    let report =
        SavingsService::monthly_report(store.snapshot(), "2025-10".parse::<YearMonth>().unwrap());
    assert!(report.is_empty());
    assert_eq!(report.total, 0);
}

#[test]
fn monthly_report_is_ordered_and_bounded() {
    let mut store = MemoryLedgerStore::new(1000).unwrap();
    store.set_start_date(date(2025, 10, 1)).unwrap();
    for (day, amount) in [(31, 5), (1, 10), (15, 20)] {
        store.record_deposit(date(2025, 10, day), amount).unwrap();
    }
    store.record_deposit(date(2025, 11, 1), 99).unwrap();

    let report = SavingsService::monthly_report(store.snapshot(), YearMonth::new(2025, 10).unwrap());
    let days: Vec<u32> = report.entries.iter().map(|(date, _)| date.day()).collect();
    assert_eq!(days, vec![1, 15, 31]);
    assert_eq!(report.total, 35);
}

#[test]
fn invalid_inputs_are_validation_errors() {
    let mut store = MemoryLedgerStore::new(1000).unwrap();
    assert!(store.set_target(0).unwrap_err().is_validation());
    assert!(store.set_local_rate(0.0).unwrap_err().is_validation());
    assert!(store.set_local_rate(f64::NAN).unwrap_err().is_validation());
    assert!(MemoryLedgerStore::new(0).is_err());
}
