pub mod commands;
pub mod output;
pub mod registry;
mod shell;
pub mod shell_context;

pub use shell::{run_cli, SCRIPT_ENV};
pub use shell_context::{CliMode, CommandError, CommandResult, Response, ShellContext};
