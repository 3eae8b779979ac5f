//! Data persistence layer
//!
//! SQLite-backed key-value state plus the ticket collection kept in it.

mod app_state;
mod migrations;
mod models;
mod ticket;

pub use app_state::{
    AppStateStore, MemoryStateStore, StateStore, StorageError, TICKETS_KEY, USER_NAME_KEY,
};
pub use models::{StatusFilter, Ticket, TicketPriority, TicketStatus};
pub use ticket::TicketStore;
