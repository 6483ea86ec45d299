mod common;

use assert_cmd::Command;
use common::temp_root;
use predicates::str::contains;

fn cli(home: &std::path::Path) -> Command {
    let mut cmd = Command::cargo_bin("finance_ledger_cli").unwrap();
    cmd.env("FINANCE_LEDGER_CLI_SCRIPT", "1")
        .env("FINANCE_LEDGER_HOME", home)
        .env("NO_COLOR", "1");
    cmd
}

#[test]
fn script_mode_runs_basic_flow() {
    let home = temp_root();
    let input = "login alice\nadd 50 Paycheck\ntoggle\nadd 20 Coffee\ndelete 0\ntotals\nlist\nexit\n";

    cli(&home)
        .write_stdin(input)
        .assert()
        .success()
        .stdout(contains("Signed in as alice"))
        .stdout(contains("Added #1 Spent $20.00"))
        .stdout(contains("Net balance:  -$20.00"))
        .stdout(contains("Coffee"));

    let json = std::fs::read_to_string(home.join("users").join("alice.json")).unwrap();
    assert!(json.contains("\"Coffee\""));
    assert!(!json.contains("\"Paycheck\""));
}

#[test]
fn records_are_reloaded_in_a_later_run() {
    let home = temp_root();
    cli(&home)
        .write_stdin("login bob\nadd 12.5 Lunch\nexit\n")
        .assert()
        .success();

    cli(&home)
        .write_stdin("login bob\nlist\nadd 1\nexit\n")
        .assert()
        .success()
        .stdout(contains("Loaded 1 record(s)"))
        .stdout(contains("Lunch"))
        .stdout(contains("Added #1 Income $1.00"));
}

#[test]
fn unknown_commands_get_a_suggestion() {
    let home = temp_root();
    cli(&home)
        .write_stdin("totls\nexit\n")
        .assert()
        .success()
        .stdout(contains("Unknown command `totls`"))
        .stdout(contains("Suggestion: `totals`?"));
}

#[test]
fn commands_before_login_are_rejected_gracefully() {
    let home = temp_root();
    cli(&home)
        .write_stdin("list\nhelp\nexit\n")
        .assert()
        .success()
        .stdout(contains("No user signed in."))
        .stdout(contains("Available commands"));
}

#[test]
fn config_file_changes_rendering() {
    let home = temp_root();
    std::fs::write(
        home.join("config.json"),
        r#"{"currency_symbol":"€","date_style":"iso","default_category":"Spent"}"#,
    )
    .unwrap();

    cli(&home)
        .write_stdin("login erin\nadd 3 Tea\ntotals\nexit\n")
        .assert()
        .success()
        .stdout(contains("Added #0 Spent €3.00"))
        .stdout(contains("Total spent:  €3.00"));
}
