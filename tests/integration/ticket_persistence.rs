//! Integration tests for durable state: tickets and the display name in SQLite

use std::sync::Arc;

use supportdesk::agent::mock::MockBackend;
use supportdesk::data::{
    AppStateStore, StateStore, StatusFilter, Ticket, TicketPriority, TicketStore,
    TICKETS_KEY,
};
use supportdesk::session::Session;
use tempfile::TempDir;

use super::common::{auto_escalated, Harness};

fn sqlite_store(dir: &TempDir) -> Arc<dyn StateStore> {
    Arc::new(AppStateStore::open(dir.path().join("supportdesk.db")).expect("open database"))
}

#[test]
fn test_ticket_collection_round_trips_through_sqlite() {
    let dir = TempDir::new().unwrap();
    let mut store = TicketStore::load(sqlite_store(&dir));
    store.insert(Ticket::open(
        "TKT-1",
        "VPN drops",
        TicketPriority::High,
        "VPN disconnects every hour",
        Some("Dana".into()),
    ));
    store.insert(Ticket::open(
        "TKT-2",
        "Printer jam",
        TicketPriority::Low,
        "Printer on floor 3",
        None,
    ));

    // A fresh connection sees the same collection, newest first.
    let reloaded = TicketStore::load(sqlite_store(&dir));
    assert_eq!(reloaded.tickets(), store.tickets());
    assert_eq!(reloaded.tickets()[0].ticket_id, "TKT-2");
    let all: Vec<_> = reloaded
        .filter(StatusFilter::All, "")
        .into_iter()
        .cloned()
        .collect();
    assert_eq!(all, reloaded.tickets().to_vec());
}

#[test]
fn test_corrupt_ticket_data_loads_empty() {
    let dir = TempDir::new().unwrap();
    let storage = sqlite_store(&dir);
    storage.set(TICKETS_KEY, "[{\"ticketId\": 42").unwrap();

    let mut store = TicketStore::load(storage.clone());
    assert!(store.is_empty());

    // The store stays usable and overwrites the bad record.
    store.insert(Ticket::open("TKT-3", "Email", TicketPriority::Medium, "q", None));
    assert_eq!(TicketStore::load(storage).len(), 1);
}

#[test]
fn test_display_name_survives_restart() {
    let dir = TempDir::new().unwrap();
    let mut first = Session::start(sqlite_store(&dir));
    assert!(!first.name_confirmed());
    first.set_display_name("Dana");

    let mut second = Session::start(sqlite_store(&dir));
    assert_eq!(second.display_name(), Some("Dana"));
    assert_ne!(first.context().session_id, second.context().session_id);

    second.clear_display_name();
    assert!(!Session::start(sqlite_store(&dir)).name_confirmed());
}

#[tokio::test]
async fn test_auto_escalated_ticket_is_persisted_and_sample_data_is_not() {
    let dir = TempDir::new().unwrap();
    let storage = sqlite_store(&dir);
    let backend = MockBackend::new().with_reply(auto_escalated("TKT-77", Some("Badge reader"), true));
    let mut h = Harness::with_storage(backend, storage.clone(), Some("Dana"));

    h.conversation.set_sample_data(true);
    assert_eq!(h.conversation.tickets().len(), 3);

    h.send("My badge does not open the 2nd floor door");
    h.settle().await;
    assert!(h.conversation.tickets().get("TKT-77").is_some());

    h.conversation.set_sample_data(false);
    let restored: Vec<_> = h
        .conversation
        .tickets()
        .tickets()
        .iter()
        .map(|t| t.ticket_id.clone())
        .collect();
    assert_eq!(restored, vec!["TKT-77".to_string()]);
    assert_eq!(TicketStore::load(storage).len(), 1);
}
