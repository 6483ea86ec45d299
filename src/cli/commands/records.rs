use crate::cli::context::{CommandError, CommandResult, ShellContext};
use crate::cli::output;
use crate::cli::registry::CommandEntry;
use crate::ledger::{CategoryFilter, RecordDraft, RecordId};

pub(crate) fn definitions() -> Vec<CommandEntry> {
    vec![
        CommandEntry::new(
            "add",
            "Add a record dated today using the draft category",
            "add <amount> [source...]",
            cmd_add,
        ),
        CommandEntry::new(
            "toggle",
            "Switch the draft category between Income and Spent",
            "toggle",
            cmd_toggle,
        ),
        CommandEntry::new("delete", "Delete a record by id", "delete <id>", cmd_delete),
        CommandEntry::new(
            "filter",
            "Choose which records `list` shows",
            "filter <all|income|spent>",
            cmd_filter,
        ),
        CommandEntry::new("list", "Show records, newest first", "list", cmd_list),
        CommandEntry::new("totals", "Show net, spent and saved", "totals", cmd_totals),
    ]
}

fn cmd_add(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    context.require_user()?;
    let Some((amount, source)) = args.split_first() else {
        return Err(CommandError::InvalidArguments(
            "usage: add <amount> [source...]".into(),
        ));
    };
    let draft = RecordDraft::new(*amount)
        .source(source.join(" "))
        .category(context.draft_category);
    let record = context.session.add(draft);
    output::success(format!(
        "Added #{} {} {}.",
        record.id,
        record.category,
        context.formatters.amount(record.amount)
    ));
    if record.amount == 0.0 {
        output::hint(format!("`{amount}` is not a positive number; stored as 0."));
    }
    Ok(())
}

fn cmd_toggle(context: &mut ShellContext, _args: &[&str]) -> CommandResult {
    context.draft_category = context.draft_category.toggled();
    output::info(format!("New records will be {}.", context.draft_category));
    Ok(())
}

fn cmd_delete(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    context.require_user()?;
    let id = match args {
        [raw] => raw.parse::<RecordId>().map_err(|_| {
            CommandError::InvalidArguments(format!("`{raw}` is not a record id"))
        })?,
        _ => return Err(CommandError::InvalidArguments("usage: delete <id>".into())),
    };
    match context.session.delete(id) {
        Some(record) => output::success(format!(
            "Deleted #{} ({}).",
            record.id,
            context.formatters.amount(record.amount)
        )),
        None => output::info(format!("No record #{id}; nothing changed.")),
    }
    Ok(())
}

fn cmd_filter(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let filter = match args {
        [] => {
            output::info(format!("Showing {}.", context.session.ledger().filter()));
            return Ok(());
        }
        [raw] => CategoryFilter::parse(raw).ok_or_else(|| {
            CommandError::InvalidArguments(format!(
                "unknown filter `{raw}`; expected all, income or spent"
            ))
        })?,
        _ => {
            return Err(CommandError::InvalidArguments(
                "usage: filter <all|income|spent>".into(),
            ))
        }
    };
    context.session.set_filter(filter);
    output::info(format!("Showing {}.", filter));
    Ok(())
}

fn cmd_list(context: &mut ShellContext, _args: &[&str]) -> CommandResult {
    context.require_user()?;
    let view = context.session.current_view();
    output::section(format!(
        "Records ({}, {})",
        context.session.ledger().filter(),
        view.len()
    ));
    if view.is_empty() {
        output::info("No records.");
        return Ok(());
    }
    for record in view {
        output::line(context.formatters.record(record));
    }
    Ok(())
}

fn cmd_totals(context: &mut ShellContext, _args: &[&str]) -> CommandResult {
    context.require_user()?;
    let totals = context.session.totals();
    output::section("Totals");
    for line in context.formatters.totals(&totals) {
        output::line(line);
    }
    Ok(())
}
