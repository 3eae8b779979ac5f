//! Data models for support tickets

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Ticket lifecycle state (owned by the backend; the client only records it)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TicketStatus {
    Open,
    Closed,
}

impl TicketStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TicketStatus::Open => "Open",
            TicketStatus::Closed => "Closed",
        }
    }
}

impl std::fmt::Display for TicketStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum TicketPriority {
    Low,
    #[default]
    Medium,
    High,
}

impl TicketPriority {
    pub fn as_str(&self) -> &'static str {
        match self {
            TicketPriority::Low => "Low",
            TicketPriority::Medium => "Medium",
            TicketPriority::High => "High",
        }
    }

    /// Parse from string; anything unrecognised is medium
    pub fn parse(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "low" => TicketPriority::Low,
            "high" => TicketPriority::High,
            _ => TicketPriority::Medium,
        }
    }
}

impl std::fmt::Display for TicketPriority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Status filter for the ticket list
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StatusFilter {
    #[default]
    All,
    Open,
    Closed,
}

impl StatusFilter {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "all" => Some(StatusFilter::All),
            "open" => Some(StatusFilter::Open),
            "closed" => Some(StatusFilter::Closed),
            _ => None,
        }
    }

    pub fn matches(&self, status: TicketStatus) -> bool {
        match self {
            StatusFilter::All => true,
            StatusFilter::Open => status == TicketStatus::Open,
            StatusFilter::Closed => status == TicketStatus::Closed,
        }
    }
}

impl std::str::FromStr for StatusFilter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| format!("unknown status filter '{s}' (all, open, closed)"))
    }
}

/// A support ticket created by an escalation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Ticket {
    /// Local identity
    pub id: Uuid,
    /// Backend-assigned ticket reference (display key, unique in the store)
    pub ticket_id: String,
    pub subject: String,
    pub status: TicketStatus,
    pub priority: TicketPriority,
    /// The question that led to the escalation
    pub question: String,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reported_by: Option<String>,
}

impl Ticket {
    /// Create a new open ticket
    pub fn open(
        ticket_id: impl Into<String>,
        subject: impl Into<String>,
        priority: TicketPriority,
        question: impl Into<String>,
        reported_by: Option<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            ticket_id: ticket_id.into(),
            subject: subject.into(),
            status: TicketStatus::Open,
            priority,
            question: question.into(),
            created_at: Utc::now(),
            reported_by,
        }
    }

    /// Case-insensitive substring match on subject, question, or ticket id.
    /// `needle` must already be lowercase.
    pub(crate) fn matches_query(&self, needle: &str) -> bool {
        self.subject.to_lowercase().contains(needle)
            || self.question.to_lowercase().contains(needle)
            || self.ticket_id.to_lowercase().contains(needle)
    }
}
