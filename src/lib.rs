#![doc(test(attr(deny(warnings))))]

//! Savings Core keeps a per-day savings ledger against a single target and
//! derives totals, recommended daily deposits, monthly reports, and savings
//! plans from it. A thin command shell sits on top for interactive use.

pub mod cli;
pub mod config;
pub mod core;
pub mod currency;
pub mod ledger;
pub mod storage;
pub mod utils;

use std::sync::Once;

static INIT_TRACING: Once = Once::new();

/// Initializes global tracing and emits a startup info log.
pub fn init() {
    INIT_TRACING.call_once(|| {
        utils::init_tracing();
        tracing::info!("Savings Core tracing initialized.");
    });
}
