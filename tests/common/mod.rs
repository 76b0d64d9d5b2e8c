#![allow(dead_code)]

use chrono::NaiveDate;
use savings_core::{
    cli::{CliMode, Response, ShellContext},
    config::Config,
    core::time::FixedClock,
    currency::{CurrencyCode, RateError, RateProvider, RateSource},
    storage::MemoryLedgerStore,
};

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

/// Rate source that always fails, standing in for an unreachable endpoint.
pub struct DownSource(pub &'static str);

impl RateSource for DownSource {
    fn name(&self) -> &str {
        self.0
    }

    fn fetch(&self, _base: &CurrencyCode, _quote: &CurrencyCode) -> Result<f64, RateError> {
        Err(RateError::Transport {
            source_name: self.0.into(),
            message: "connection refused".into(),
        })
    }
}

/// Rate source answering with a fixed rate.
pub struct FixedSource(pub &'static str, pub f64);

impl RateSource for FixedSource {
    fn name(&self) -> &str {
        self.0
    }

    fn fetch(&self, _base: &CurrencyCode, _quote: &CurrencyCode) -> Result<f64, RateError> {
        Ok(self.1)
    }
}

pub fn offline_rates() -> RateProvider {
    RateProvider::new(CurrencyCode::new("USD"), CurrencyCode::new("UZS"))
        .with_source(DownSource("primary"))
        .with_source(DownSource("secondary"))
}

/// Script-mode shell over an in-memory ledger, pinned to `today`.
pub fn shell(target: u64, today: NaiveDate) -> ShellContext {
    shell_with_rates(target, today, offline_rates())
}

pub fn shell_with_rates(target: u64, today: NaiveDate, rates: RateProvider) -> ShellContext {
    ShellContext::new(
        CliMode::Script,
        Config::default(),
        Box::new(MemoryLedgerStore::new(target).expect("memory store")),
        rates,
        Box::new(FixedClock::new(today)),
    )
}

pub fn reply(ctx: &mut ShellContext, line: &str) -> String {
    match ctx.handle_line(line) {
        Response::Reply(text) => text,
        other => panic!("expected reply for `{}`, got {:?}", line, other),
    }
}

pub fn error(ctx: &mut ShellContext, line: &str) -> (String, Option<String>) {
    match ctx.handle_line(line) {
        Response::Error { message, hint } => (message, hint),
        other => panic!("expected error for `{}`, got {:?}", line, other),
    }
}
