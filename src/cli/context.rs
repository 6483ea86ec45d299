use std::{io, sync::Arc};

use dialoguer::{theme::ColorfulTheme, Confirm};
use rustyline::error::ReadlineError;
use thiserror::Error;

use crate::{
    cli::{commands, formatters::Formatters, output, registry::CommandRegistry},
    config::{Config, ConfigManager},
    errors::LedgerError,
    ledger::{Category, SnapshotReport},
    session::{LedgerSession, LocalIdentity, SessionContext, SessionNotice},
    storage::{JsonRecordStore, PersistenceProvider},
};

pub use crate::errors::CliError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CliMode {
    Interactive,
    Script,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopControl {
    Continue,
    Exit,
}

#[derive(Debug, Error)]
pub enum CommandError {
    #[error("No user signed in. Use `login <user>` first.")]
    NotSignedIn,
    #[error("{0}")]
    InvalidArguments(String),
    #[error("{0}")]
    Message(String),
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error(transparent)]
    Core(#[from] LedgerError),
    #[error(transparent)]
    Dialoguer(#[from] dialoguer::Error),
    #[error("exit requested")]
    ExitRequested,
}

pub type CommandResult = Result<(), CommandError>;

impl From<ReadlineError> for CliError {
    fn from(err: ReadlineError) -> Self {
        CliError::Command(err.to_string())
    }
}

impl From<dialoguer::Error> for CliError {
    fn from(err: dialoguer::Error) -> Self {
        CliError::Input(err.to_string())
    }
}

/// Everything a command handler can reach: the session, the identity it signs in
/// through, and display preferences.
pub struct ShellContext {
    pub mode: CliMode,
    pub(crate) registry: CommandRegistry,
    pub(crate) session: LedgerSession,
    pub(crate) identity: Arc<LocalIdentity>,
    pub(crate) config: Config,
    pub(crate) formatters: Formatters,
    /// Category the next `add` will use; `toggle` flips it.
    pub(crate) draft_category: Category,
    pub(crate) theme: ColorfulTheme,
    pub running: bool,
    pub last_command: Option<String>,
}

impl ShellContext {
    /// Builds a context backed by the JSON store under the configured data directory.
    pub fn new(mode: CliMode) -> Result<Self, CliError> {
        let manager = ConfigManager::new()?;
        let config = manager.load()?;
        let store = JsonRecordStore::new(manager.data_root(&config))?;
        Self::with_store(mode, config, Arc::new(store))
    }

    pub fn with_store(
        mode: CliMode,
        config: Config,
        store: Arc<dyn PersistenceProvider>,
    ) -> Result<Self, CliError> {
        let identity = Arc::new(LocalIdentity::new());
        let session = LedgerSession::new(SessionContext::new(identity.clone(), store))?;

        let mut registry = CommandRegistry::new();
        commands::register_all(&mut registry);

        Ok(Self {
            mode,
            registry,
            session,
            identity,
            formatters: Formatters::new(&config),
            draft_category: config.default_category,
            config,
            theme: ColorfulTheme::default(),
            running: true,
            last_command: None,
        })
    }

    pub fn command_names(&self) -> Vec<&'static str> {
        self.registry.names().collect()
    }

    pub fn prompt(&self) -> String {
        match self.session.user() {
            Some(user) => format!(
                "ledger({user}|{}|{})> ",
                self.session.ledger().filter(),
                self.draft_category
            ),
            None => "ledger> ".to_string(),
        }
    }

    pub(crate) fn dispatch(
        &mut self,
        command: &str,
        raw: &str,
        args: &[&str],
    ) -> Result<LoopControl, CommandError> {
        let Some(handler) = self.registry.handler(command) else {
            self.suggest_command(raw);
            return Ok(LoopControl::Continue);
        };
        let outcome = handler(self, args);
        // Session transitions and pushes land between commands.
        self.sync_session();
        match outcome {
            Ok(()) => Ok(LoopControl::Continue),
            Err(CommandError::ExitRequested) => Ok(LoopControl::Exit),
            Err(err) => Err(err),
        }
    }

    #[cfg(test)]
    pub(crate) fn process_line(&mut self, line: &str) -> Result<LoopControl, CommandError> {
        let tokens = match crate::cli::shell::parse_command_line(line) {
            Ok(tokens) => tokens,
            Err(err) => {
                output::warning(err);
                return Ok(LoopControl::Continue);
            }
        };
        let Some(raw) = tokens.first() else {
            return Ok(LoopControl::Continue);
        };
        let args: Vec<&str> = tokens.iter().skip(1).map(String::as_str).collect();
        self.dispatch(&raw.to_lowercase(), raw, &args)
    }

    /// Drains pending session events and reports them.
    pub(crate) fn sync_session(&mut self) {
        for notice in self.session.process_events() {
            self.report_notice(&notice);
        }
    }

    pub(crate) fn require_user(&self) -> Result<(), CommandError> {
        if self.session.user().is_some() {
            Ok(())
        } else {
            Err(CommandError::NotSignedIn)
        }
    }

    pub(crate) fn report_notice(&self, notice: &SessionNotice) {
        match notice {
            SessionNotice::Started { user } => output::success(format!("Signed in as {user}.")),
            SessionNotice::Ended { user } => output::info(format!("Signed out {user}.")),
            SessionNotice::SnapshotApplied { report, .. } => self.report_snapshot(report),
            SessionNotice::SnapshotFailed { reason, .. } => {
                output::warning(format!("Could not load records: {reason}"));
                output::hint("Showing the last loaded records. Use `sync` to retry.");
            }
            SessionNotice::WriteFailed { reason, .. } => {
                output::warning(format!("Change kept locally but not saved: {reason}"));
            }
        }
    }

    fn report_snapshot(&self, report: &SnapshotReport) {
        output::info(format!("Loaded {} record(s).", report.loaded));
        for (old, new) in &report.reassigned {
            output::warning(format!("Duplicate record id {old} renumbered to {new}."));
        }
        if report.normalized_amounts > 0 {
            output::warning(format!(
                "{} stored amount(s) were invalid and reset to 0.",
                report.normalized_amounts
            ));
        }
    }

    pub(crate) fn suggest_command(&self, input: &str) {
        output::warning(format!(
            "Unknown command `{}`. Type `help` to see available commands.",
            input
        ));
        if let Some(best) = self.registry.suggest(input) {
            output::info(format!("Suggestion: `{}`?", best));
        }
    }

    pub(crate) fn confirm_exit(&self) -> Result<bool, CliError> {
        if self.mode == CliMode::Script {
            return Ok(true);
        }
        let confirmed = Confirm::with_theme(&self.theme)
            .with_prompt("Exit shell?")
            .default(true)
            .interact()?;
        Ok(confirmed)
    }

    pub(crate) fn report_error(&self, err: CommandError) -> Result<(), CliError> {
        match err {
            CommandError::ExitRequested => Ok(()),
            CommandError::InvalidArguments(message) => {
                output::error(message);
                output::hint("Use `help <command>` for usage details.");
                Ok(())
            }
            CommandError::NotSignedIn => {
                output::error("No user signed in.");
                output::hint("Try `login alice` to get started.");
                Ok(())
            }
            other => {
                output::error(other);
                Ok(())
            }
        }
    }
}
