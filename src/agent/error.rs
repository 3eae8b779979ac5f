use thiserror::Error;

/// Failures of the backend call itself (as opposed to a reply that reports failure).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AgentError {
    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Backend returned HTTP {status}: {body}")]
    Http { status: u16, body: String },

    #[error("Failed to decode backend reply: {0}")]
    Decode(String),

    #[error("Event stream closed")]
    Closed,
}

impl From<reqwest::Error> for AgentError {
    fn from(err: reqwest::Error) -> Self {
        AgentError::Transport(err.to_string())
    }
}
