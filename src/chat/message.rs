use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::agent::NormalizedAgentResult;

/// Stable identifier for one message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MessageId(pub Uuid);

impl MessageId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for MessageId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for MessageId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Chat speaker role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Agent,
}

/// One entry of the conversation timeline. Never edited after it is appended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub id: MessageId,
    pub role: Role,
    pub content: String,
    pub timestamp: DateTime<Utc>,
    pub metadata: Option<NormalizedAgentResult>,
    pub is_error: bool,
}

impl Message {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            id: MessageId::new(),
            role: Role::User,
            content: content.into(),
            timestamp: Utc::now(),
            metadata: None,
            is_error: false,
        }
    }

    /// Agent reply whose content is the normalized answer.
    pub fn agent(result: NormalizedAgentResult) -> Self {
        Self {
            id: MessageId::new(),
            role: Role::Agent,
            content: result.answer.clone(),
            timestamp: Utc::now(),
            metadata: Some(result),
            is_error: false,
        }
    }

    /// Error-flagged agent message.
    pub fn error(content: impl Into<String>) -> Self {
        Self {
            id: MessageId::new(),
            role: Role::Agent,
            content: content.into(),
            timestamp: Utc::now(),
            metadata: None,
            is_error: true,
        }
    }

    pub fn is_agent(&self) -> bool {
        self.role == Role::Agent
    }

    pub fn is_escalated(&self) -> bool {
        self.metadata.as_ref().is_some_and(|m| m.escalated)
    }

    /// Escalation is offered on non-error agent messages not already escalated.
    pub fn can_escalate(&self) -> bool {
        self.is_agent() && !self.is_error && !self.is_escalated()
    }

    /// The backend explicitly asked for this reply to be escalated.
    pub fn escalation_emphasized(&self) -> bool {
        self.can_escalate() && self.metadata.as_ref().is_some_and(|m| m.requires_escalation)
    }
}

/// Per-message helpfulness mark.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Feedback {
    Up,
    Down,
    #[default]
    None,
}

impl Feedback {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "up" | "+" | "yes" => Some(Feedback::Up),
            "down" | "-" | "no" => Some(Feedback::Down),
            "none" | "clear" => Some(Feedback::None),
            _ => None,
        }
    }
}

/// First `max_chars` characters of `text`.
pub(crate) fn truncate_chars(text: &str, max_chars: usize) -> String {
    text.chars().take(max_chars).collect()
}
