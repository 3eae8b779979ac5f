pub mod agent;
pub mod chat;
pub mod cli;
pub mod config;
pub mod data;
pub mod runtime;
pub mod session;
pub mod util;

pub use agent::{
    normalize, AgentBackend, AgentError, HttpBackend, InvokeRequest, InvokeResult,
    NormalizedAgentResult,
};
pub use chat::{AppEvent, Conversation, Effect, Notification};
pub use config::Config;
pub use data::{AppStateStore, StateStore, Ticket, TicketStore};
pub use runtime::Runtime;
pub use session::{Session, SessionContext};
