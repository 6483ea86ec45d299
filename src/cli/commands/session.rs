use crate::cli::context::{CommandError, CommandResult, ShellContext};
use crate::cli::output;
use crate::cli::registry::CommandEntry;

pub(crate) fn definitions() -> Vec<CommandEntry> {
    vec![
        CommandEntry::new(
            "login",
            "Sign in and load that user's records",
            "login <user>",
            cmd_login,
        ),
        CommandEntry::new("logout", "Sign out and clear the ledger", "logout", cmd_logout),
        CommandEntry::new(
            "sync",
            "Apply pending updates and reload from storage",
            "sync",
            cmd_sync,
        ),
    ]
}

fn cmd_login(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let user = match args {
        [user] if !user.trim().is_empty() => user.trim(),
        _ => return Err(CommandError::InvalidArguments("usage: login <user>".into())),
    };
    context.identity.sign_in(user)?;
    Ok(())
}

fn cmd_logout(context: &mut ShellContext, _args: &[&str]) -> CommandResult {
    if context.session.user().is_none() {
        output::info("Nobody is signed in.");
        return Ok(());
    }
    context.identity.sign_out()?;
    Ok(())
}

fn cmd_sync(context: &mut ShellContext, _args: &[&str]) -> CommandResult {
    context.require_user()?;
    context.sync_session();
    if let Some(notice) = context.session.reload() {
        context.report_notice(&notice);
    }
    Ok(())
}
