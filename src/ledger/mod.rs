//! Ledger domain models and their mutation rules.

#[allow(clippy::module_inception)]
pub mod ledger;
pub mod period;
pub mod settings;

pub use ledger::{Ledger, CURRENT_SCHEMA_VERSION};
pub use period::YearMonth;
pub use settings::{Amount, Settings};
