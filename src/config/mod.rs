use serde::{Deserialize, Serialize};
use std::{
    fs::{self, File},
    io::Write,
    path::{Path, PathBuf},
    time::Duration,
};

use crate::{
    core::{
        errors::SavingsError,
        utils::{ensure_dir, PathResolver},
    },
    core::services::{DEFAULT_HORIZON_DAYS, MAX_HORIZON_DAYS},
    currency::{CurrencyCode, RateSourceConfig},
    ledger::Amount,
};

const TMP_SUFFIX: &str = "tmp";
const MAX_TIMEOUT_SECS: u64 = 10;

/// User preferences for the savings shell. Missing fields fall back to defaults.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub ledger_name: String,
    /// Target written into a ledger the first time it is created.
    pub default_target: Amount,
    /// Amount used by `add` when no amount is given.
    pub default_deposit: Amount,
    pub base_currency: String,
    pub quote_currency: String,
    pub rate_sources: Vec<RateSourceConfig>,
    pub request_timeout_secs: u64,
    pub plan_horizon_days: u32,
    /// Upper bound for `plan <horizon_days>`; never above [`MAX_HORIZON_DAYS`].
    pub max_plan_horizon_days: u32,
    pub backup_retention: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data_dir: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            ledger_name: "savings".into(),
            default_target: 1000,
            default_deposit: 10,
            base_currency: "USD".into(),
            quote_currency: "UZS".into(),
            rate_sources: RateSourceConfig::defaults(),
            request_timeout_secs: MAX_TIMEOUT_SECS,
            plan_horizon_days: DEFAULT_HORIZON_DAYS,
            max_plan_horizon_days: MAX_HORIZON_DAYS,
            backup_retention: 5,
            data_dir: None,
        }
    }
}

impl Config {
    pub fn base_currency(&self) -> CurrencyCode {
        CurrencyCode::new(&self.base_currency)
    }

    pub fn quote_currency(&self) -> CurrencyCode {
        CurrencyCode::new(&self.quote_currency)
    }

    /// Clamped to 1..=10 seconds.
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs.clamp(1, MAX_TIMEOUT_SECS))
    }

    pub fn resolve_data_dir(&self) -> PathBuf {
        PathResolver::resolve_base(self.data_dir.clone())
    }

    pub fn validate(&self) -> Result<(), SavingsError> {
        if self.default_target == 0 {
            return Err(SavingsError::Config(
                "default_target must be greater than zero".into(),
            ));
        }
        if self.ledger_name.trim().is_empty() {
            return Err(SavingsError::Config("ledger_name must not be empty".into()));
        }
        if self.base_currency.trim().is_empty() || self.quote_currency.trim().is_empty() {
            return Err(SavingsError::Config(
                "base_currency and quote_currency must be set".into(),
            ));
        }
        if self.max_plan_horizon_days == 0 || self.max_plan_horizon_days > MAX_HORIZON_DAYS {
            return Err(SavingsError::Config(format!(
                "max_plan_horizon_days must be between 1 and {}",
                MAX_HORIZON_DAYS
            )));
        }
        if self.plan_horizon_days == 0 || self.plan_horizon_days > self.max_plan_horizon_days {
            return Err(SavingsError::Config(format!(
                "plan_horizon_days must be between 1 and {}",
                self.max_plan_horizon_days
            )));
        }
        Ok(())
    }
}

/// Loads and saves [`Config`] as JSON.
#[derive(Debug, Clone)]
pub struct ConfigManager {
    path: PathBuf,
}

impl ConfigManager {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    /// Uses `<base>/config.json`.
    pub fn with_base_dir(base: &Path) -> Result<Self, SavingsError> {
        ensure_dir(base)?;
        Ok(Self::new(PathResolver::config_file_in(base)))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn load(&self) -> Result<Config, SavingsError> {
        let config = if self.path.exists() {
            let data = fs::read_to_string(&self.path)?;
            serde_json::from_str(&data).map_err(|err| {
                SavingsError::Config(format!("{}: {}", self.path.display(), err))
            })?
        } else {
            Config::default()
        };
        config.validate()?;
        Ok(config)
    }

    pub fn save(&self, config: &Config) -> Result<(), SavingsError> {
        config.validate()?;
        if let Some(parent) = self.path.parent() {
            ensure_dir(parent)?;
        }
        let json = serde_json::to_string_pretty(config)?;
        let tmp = tmp_path(&self.path);
        write_atomic(&tmp, &json)?;
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

fn tmp_path(path: &Path) -> PathBuf {
    let mut tmp = path.to_path_buf();
    let ext = match path.extension().and_then(|ext| ext.to_str()) {
        Some(existing) => format!("{}.{}", existing, TMP_SUFFIX),
        None => TMP_SUFFIX.to_string(),
    };
    tmp.set_extension(ext);
    tmp
}

fn write_atomic(path: &Path, data: &str) -> Result<(), SavingsError> {
    let mut file = File::create(path)?;
    file.write_all(data.as_bytes())?;
    file.flush()?;
    Ok(())
}
