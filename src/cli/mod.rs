//! Interactive shell over a [`LedgerSession`](crate::session::LedgerSession).

pub mod commands;
pub mod context;
pub mod formatters;
pub mod output;
pub mod registry;
mod shell;

pub use context::{CliError, CliMode, CommandError, LoopControl, ShellContext};
pub use shell::run_cli;
