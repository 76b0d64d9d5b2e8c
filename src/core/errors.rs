use std::result::Result as StdResult;

use thiserror::Error;

/// Unified error type for ledger, engine, and storage layers.
#[derive(Error, Debug)]
pub enum SavingsError {
    #[error("Invalid input: {0}")]
    Validation(String),
    #[error("Persistence error: {0}")]
    Persistence(String),
    #[error("Plan unavailable: {0}")]
    PlanUnavailable(String),
    #[error("Configuration error: {0}")]
    Config(String),
}

pub type Result<T> = StdResult<T, SavingsError>;

impl SavingsError {
    pub fn validation(message: impl Into<String>) -> Self {
        SavingsError::Validation(message.into())
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, SavingsError::Validation(_))
    }
}

impl From<std::io::Error> for SavingsError {
    fn from(err: std::io::Error) -> Self {
        SavingsError::Persistence(err.to_string())
    }
}

impl From<serde_json::Error> for SavingsError {
    fn from(err: serde_json::Error) -> Self {
        SavingsError::Persistence(err.to_string())
    }
}

/// Errors raised by the interactive shell itself, outside any single command.
#[derive(Error, Debug)]
pub enum CliError {
    #[error(transparent)]
    Core(#[from] SavingsError),
    #[error("Readline error: {0}")]
    Readline(#[from] rustyline::error::ReadlineError),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
