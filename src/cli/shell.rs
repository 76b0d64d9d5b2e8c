use std::{
    borrow::Cow,
    io::{self, BufRead},
};

use rustyline::{
    completion::{Completer, Pair},
    error::ReadlineError,
    highlight::Highlighter,
    hint::Hinter,
    history::DefaultHistory,
    validate::{ValidationContext, ValidationResult, Validator},
    Cmd, Context as ReadlineContext, Editor, Helper, KeyEvent,
};

use crate::{
    config::{Config, ConfigManager},
    core::{errors::CliError, time::SystemClock, utils::PathResolver},
    currency::RateProvider,
    storage::{JsonLedgerStore, LedgerStore, MemoryLedgerStore},
};

use super::{
    output::{self, OutputPreferences},
    shell_context::{CliMode, Response, ShellContext},
};

pub const SCRIPT_ENV: &str = "SAVINGS_CORE_CLI_SCRIPT";

/// Starts the shell. With `memory` set nothing is written to disk.
pub fn run_cli(memory: bool) -> Result<(), CliError> {
    let mode = if std::env::var_os(SCRIPT_ENV).is_some() {
        CliMode::Script
    } else {
        CliMode::Interactive
    };
    output::set_preferences(OutputPreferences {
        plain: mode == CliMode::Script || std::env::var_os("NO_COLOR").is_some(),
    });

    let config = ConfigManager::with_base_dir(&PathResolver::base_dir())?.load()?;
    let store = open_store(&config, memory)?;
    tracing::info!(store = %store.describe(), ?mode, "savings shell starting");

    let rates = RateProvider::from_config(&config);
    let mut context = ShellContext::new(mode, config, store, rates, Box::new(SystemClock));

    match mode {
        CliMode::Interactive => run_interactive(&mut context),
        CliMode::Script => run_script(&mut context),
    }
}

fn open_store(config: &Config, memory: bool) -> Result<Box<dyn LedgerStore>, CliError> {
    if memory {
        return Ok(Box::new(MemoryLedgerStore::new(config.default_target)?));
    }
    let store = JsonLedgerStore::open(
        &config.resolve_data_dir(),
        &config.ledger_name,
        config.default_target,
        Some(config.backup_retention),
    )?;
    Ok(Box::new(store))
}

fn run_interactive(context: &mut ShellContext) -> Result<(), CliError> {
    let mut editor = Editor::<CommandHelper, DefaultHistory>::new()?;
    editor.set_helper(Some(CommandHelper::new(context.command_names())));
    editor.bind_sequence(KeyEvent::from('?'), Cmd::Complete);

    output::section("Savings");
    output::hint("Type `help` to list commands, `exit` to leave.");

    while context.running {
        match editor.readline(&context.prompt()) {
            Ok(line) => {
                let trimmed = line.trim();
                if trimmed.is_empty() {
                    continue;
                }
                editor.add_history_entry(trimmed).ok();
                if render(context.handle_line(trimmed)) {
                    break;
                }
            }
            Err(ReadlineError::Interrupted) => {
                output::warning("Interrupted. Press Ctrl-D or type `exit` to leave.");
            }
            Err(ReadlineError::Eof) => {
                output::info("Exiting shell.");
                break;
            }
            Err(err) => return Err(err.into()),
        }
    }
    Ok(())
}

fn run_script(context: &mut ShellContext) -> Result<(), CliError> {
    let stdin = io::stdin();
    for line in stdin.lock().lines() {
        if !context.running {
            break;
        }
        let line = line?;
        if render(context.handle_line(&line)) {
            break;
        }
    }
    Ok(())
}

/// Prints a response; returns `true` when the shell should stop.
fn render(response: Response) -> bool {
    match response {
        Response::Reply(text) => {
            output::info(text);
            false
        }
        Response::Error { message, hint } => {
            output::error(message);
            if let Some(hint) = hint {
                output::hint(hint);
            }
            false
        }
        Response::Nothing => false,
        Response::Exit => true,
    }
}

struct CommandHelper {
    commands: Vec<String>,
}

impl CommandHelper {
    fn new(names: Vec<&'static str>) -> Self {
        let mut commands: Vec<String> = names
            .into_iter()
            .map(|name| name.to_ascii_lowercase())
            .collect();
        commands.sort();
        commands.dedup();
        Self { commands }
    }
}

impl Helper for CommandHelper {}

impl Completer for CommandHelper {
    type Candidate = Pair;

    fn complete(
        &self,
        line: &str,
        pos: usize,
        _ctx: &ReadlineContext<'_>,
    ) -> rustyline::Result<(usize, Vec<Pair>)> {
        let prefix = &line[..pos];
        let start = prefix
            .rfind(char::is_whitespace)
            .map(|idx| idx + 1)
            .unwrap_or(0);

        // Only the first word is completed.
        if start > 0 && !prefix[..start].trim().is_empty() {
            return Ok((start, Vec::new()));
        }

        let needle = prefix[start..].to_ascii_lowercase();
        let candidates = self
            .commands
            .iter()
            .filter(|name| name.starts_with(&needle))
            .map(|name| Pair {
                display: name.clone(),
                replacement: name.clone(),
            })
            .collect();
        Ok((start, candidates))
    }
}

impl Hinter for CommandHelper {
    type Hint = String;
}

impl Highlighter for CommandHelper {
    fn highlight<'l>(&self, line: &'l str, _pos: usize) -> Cow<'l, str> {
        Cow::Borrowed(line)
    }
}

impl Validator for CommandHelper {
    fn validate(&self, _ctx: &mut ValidationContext) -> rustyline::Result<ValidationResult> {
        Ok(ValidationResult::Valid(None))
    }
}
