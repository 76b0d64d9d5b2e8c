//! Command dispatch and the boundary where every failure becomes user-facing text.

use chrono::NaiveDate;
use thiserror::Error;

use crate::{
    config::Config,
    core::{errors::SavingsError, time::Clock},
    currency::{format_amount, CurrencyCode, RateProvider},
    ledger::Amount,
    storage::LedgerStore,
};

use super::{commands, registry::CommandRegistry};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CliMode {
    Interactive,
    Script,
}

#[derive(Debug, Error)]
pub enum CommandError {
    #[error("{0}")]
    InvalidArguments(String),
    #[error("Unknown command `{0}`.")]
    UnknownCommand(String),
    #[error(transparent)]
    Core(#[from] SavingsError),
    #[error("exit requested")]
    ExitRequested,
}

pub type CommandResult = Result<String, CommandError>;

/// What the shell should show after one input line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Response {
    Reply(String),
    Error {
        message: String,
        hint: Option<String>,
    },
    Nothing,
    Exit,
}

pub struct ShellContext {
    pub mode: CliMode,
    pub registry: CommandRegistry,
    pub config: Config,
    store: Box<dyn LedgerStore>,
    rates: RateProvider,
    clock: Box<dyn Clock>,
    pub running: bool,
}

impl ShellContext {
    pub fn new(
        mode: CliMode,
        config: Config,
        store: Box<dyn LedgerStore>,
        rates: RateProvider,
        clock: Box<dyn Clock>,
    ) -> Self {
        let mut registry = CommandRegistry::new();
        commands::register_all(&mut registry);
        Self {
            mode,
            registry,
            config,
            store,
            rates,
            clock,
            running: true,
        }
    }

    pub fn store(&self) -> &dyn LedgerStore {
        self.store.as_ref()
    }

    pub(crate) fn store_mut(&mut self) -> &mut dyn LedgerStore {
        self.store.as_mut()
    }

    pub fn rates(&self) -> &RateProvider {
        &self.rates
    }

    pub fn today(&self) -> NaiveDate {
        self.clock.today()
    }

    pub fn base_currency(&self) -> CurrencyCode {
        self.config.base_currency()
    }

    pub fn money(&self, amount: Amount) -> String {
        format_amount(amount, &self.base_currency())
    }

    pub fn command_names(&self) -> Vec<&'static str> {
        self.registry.names().collect()
    }

    pub fn prompt(&self) -> String {
        "savings> ".into()
    }

    /// Parses and runs one line. Never panics and never lets an error escape.
    pub fn handle_line(&mut self, line: &str) -> Response {
        let tokens = match shell_words::split(line) {
            Ok(tokens) => tokens,
            Err(err) => {
                return Response::Error {
                    message: err.to_string(),
                    hint: None,
                }
            }
        };
        let Some(raw) = tokens.first() else {
            return Response::Nothing;
        };

        let command = raw.to_lowercase();
        let args: Vec<&str> = tokens.iter().skip(1).map(String::as_str).collect();

        match self.dispatch(&command, &args) {
            Ok(reply) => Response::Reply(reply),
            Err(CommandError::ExitRequested) => {
                self.running = false;
                Response::Exit
            }
            Err(err) => self.describe_error(&command, err),
        }
    }

    pub fn dispatch(&mut self, command: &str, args: &[&str]) -> CommandResult {
        let handler = self
            .registry
            .handler(command)
            .ok_or_else(|| CommandError::UnknownCommand(command.to_string()))?;
        tracing::debug!(command, args = ?args, "dispatching command");
        handler(self, args)
    }

    fn describe_error(&self, command: &str, err: CommandError) -> Response {
        let usage_hint = || {
            self.registry
                .usage(command)
                .map(|usage| format!("usage: {}", usage))
        };
        match err {
            CommandError::UnknownCommand(name) => Response::Error {
                message: format!("Unknown command `{}`.", name),
                hint: Some(self.registry.suggest(&name).map_or_else(
                    || "Type `help` to see available commands.".to_string(),
                    |best| format!("Did you mean `{}`?", best),
                )),
            },
            CommandError::InvalidArguments(message) => Response::Error {
                message,
                hint: usage_hint(),
            },
            CommandError::Core(SavingsError::Validation(message)) => Response::Error {
                message,
                hint: usage_hint(),
            },
            CommandError::Core(SavingsError::Persistence(message)) => {
                tracing::error!(command, error = %message, "ledger write failed");
                Response::Error {
                    message: format!("Operation failed: {}", message),
                    hint: Some("Nothing was recorded; try again.".into()),
                }
            }
            CommandError::Core(err @ SavingsError::PlanUnavailable(_)) => Response::Error {
                message: err.to_string(),
                hint: Some("Use `add <amount>` or `set-start <YYYY-MM-DD>`.".into()),
            },
            CommandError::Core(err) => Response::Error {
                message: err.to_string(),
                hint: None,
            },
            CommandError::ExitRequested => Response::Exit,
        }
    }
}
