//! Integration tests for the `supportdesk` binary

use std::sync::Arc;

use assert_cmd::Command;
use predicates::prelude::*;
use supportdesk::data::{AppStateStore, Ticket, TicketPriority, TicketStatus, TicketStore};
use tempfile::TempDir;

fn supportdesk(dir: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("supportdesk").unwrap();
    cmd.arg("--data-dir").arg(dir.path());
    cmd
}

fn seed_tickets(dir: &TempDir) {
    let storage = AppStateStore::open(dir.path().join("supportdesk.db")).unwrap();
    let mut store = TicketStore::load(Arc::new(storage));
    store.insert(Ticket {
        status: TicketStatus::Closed,
        ..Ticket::open(
            "TKT-2024-0039",
            "Email sync stopped working on mobile",
            TicketPriority::Low,
            "My Outlook app on iPhone stopped syncing emails since yesterday.",
            None,
        )
    });
    store.insert(Ticket::open(
        "TKT-2024-0042",
        "Screen flickering after Windows update",
        TicketPriority::High,
        "My laptop screen keeps flickering after the latest Windows update.",
        Some("Dana".into()),
    ));
}

#[test]
fn test_tickets_on_empty_data_dir() {
    let dir = TempDir::new().unwrap();
    supportdesk(&dir)
        .arg("tickets")
        .assert()
        .success()
        .stdout(predicate::str::contains("No tickets found."));

    assert!(dir.path().join("config.toml").exists());
    assert!(dir.path().join("logs").is_dir());
}

#[test]
fn test_tickets_lists_and_filters() {
    let dir = TempDir::new().unwrap();
    seed_tickets(&dir);

    supportdesk(&dir)
        .arg("tickets")
        .assert()
        .success()
        .stdout(predicate::str::contains("TKT-2024-0042"))
        .stdout(predicate::str::contains("TKT-2024-0039"));

    supportdesk(&dir)
        .args(["tickets", "--status", "closed"])
        .assert()
        .success()
        .stdout(predicate::str::contains("TKT-2024-0039"))
        .stdout(predicate::str::contains("TKT-2024-0042").not());

    supportdesk(&dir)
        .args(["tickets", "--query", "WINDOWS"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Screen flickering"))
        .stdout(predicate::str::contains("Email sync").not());
}

#[test]
fn test_rejects_unknown_status() {
    let dir = TempDir::new().unwrap();
    supportdesk(&dir)
        .args(["tickets", "--status", "pending"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("unknown status filter"));
}

#[test]
fn test_chat_quits_on_command() {
    let dir = TempDir::new().unwrap();
    supportdesk(&dir)
        .arg("chat")
        .write_stdin("/name Dana\n/quit\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("Hello, Dana."));
}
