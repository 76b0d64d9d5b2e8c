use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::core::errors::{Result, SavingsError};

/// Whole units of the base currency.
pub type Amount = u64;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    pub target: Amount,
    #[serde(default)]
    pub start_date: Option<NaiveDate>,
    /// Quote currency per unit of base currency, used only when every remote source fails.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub local_rate: Option<f64>,
}

impl Settings {
    pub fn new(target: Amount) -> Self {
        Self {
            target,
            start_date: None,
            local_rate: None,
        }
    }

    pub fn validate_target(target: Amount) -> Result<()> {
        if target == 0 {
            return Err(SavingsError::validation("target must be greater than zero"));
        }
        Ok(())
    }
}
