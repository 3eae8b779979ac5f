//! Ticket store: the durable, filterable ticket collection

use std::collections::HashSet;
use std::sync::Arc;

use super::app_state::{StateStore, StorageError, TICKETS_KEY};
use super::models::{StatusFilter, Ticket};

/// Ticket collection, newest first.
///
/// Every insertion is written through to the backing [`StateStore`] when one
/// is attached. Write failures are logged and swallowed; the in-memory
/// collection is always updated first.
pub struct TicketStore {
    tickets: Vec<Ticket>,
    storage: Option<Arc<dyn StateStore>>,
}

impl TicketStore {
    /// Load the persisted collection. Missing or corrupt data yields an empty store.
    pub fn load(storage: Arc<dyn StateStore>) -> Self {
        let tickets = match read_tickets(storage.as_ref()) {
            Ok(tickets) => tickets,
            Err(e) => {
                tracing::warn!(error = %e, "Failed to load stored tickets, starting empty");
                Vec::new()
            }
        };
        Self {
            tickets,
            storage: Some(storage),
        }
    }

    /// A store that is never persisted (used for sample data).
    pub fn detached(tickets: Vec<Ticket>) -> Self {
        Self {
            tickets: dedup_by_ticket_id(tickets),
            storage: None,
        }
    }

    pub fn tickets(&self) -> &[Ticket] {
        &self.tickets
    }

    pub fn len(&self) -> usize {
        self.tickets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tickets.is_empty()
    }

    pub fn is_persistent(&self) -> bool {
        self.storage.is_some()
    }

    pub fn get(&self, ticket_id: &str) -> Option<&Ticket> {
        self.tickets.iter().find(|t| t.ticket_id == ticket_id)
    }

    /// Prepend a ticket. Returns false (and changes nothing) if its ticket id
    /// is already present.
    pub fn insert(&mut self, ticket: Ticket) -> bool {
        if self.get(&ticket.ticket_id).is_some() {
            tracing::debug!(ticket_id = %ticket.ticket_id, "Ticket already recorded");
            return false;
        }
        tracing::info!(ticket_id = %ticket.ticket_id, priority = %ticket.priority, "Ticket recorded");
        self.tickets.insert(0, ticket);
        self.persist();
        true
    }

    /// Tickets matching the status filter and, if `query` is not blank, whose
    /// subject, question, or ticket id contains it (case-insensitive).
    pub fn filter(&self, status: StatusFilter, query: &str) -> Vec<&Ticket> {
        let needle = query.trim().to_lowercase();
        self.tickets
            .iter()
            .filter(|t| status.matches(t.status))
            .filter(|t| needle.is_empty() || t.matches_query(&needle))
            .collect()
    }

    fn persist(&self) {
        let Some(storage) = &self.storage else {
            return;
        };
        let result = serde_json::to_string(&self.tickets)
            .map_err(StorageError::from)
            .and_then(|json| storage.set(TICKETS_KEY, &json));
        if let Err(e) = result {
            tracing::warn!(error = %e, "Failed to persist tickets");
        }
    }
}

fn read_tickets(storage: &dyn StateStore) -> Result<Vec<Ticket>, StorageError> {
    match storage.get(TICKETS_KEY)? {
        Some(json) => Ok(dedup_by_ticket_id(serde_json::from_str(&json)?)),
        None => Ok(Vec::new()),
    }
}

fn dedup_by_ticket_id(tickets: Vec<Ticket>) -> Vec<Ticket> {
    let mut seen = HashSet::new();
    tickets
        .into_iter()
        .filter(|t| seen.insert(t.ticket_id.clone()))
        .collect()
}
