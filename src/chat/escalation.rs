//! Escalation workflow: turn an agent reply into a tracked ticket.
//!
//! ```text
//! Idle ──open──▶ FormOpen ──submit──▶ Submitting ──▶ Resolved | Failed
//!                   │ ▲                    │
//!                cancel└── open (other msg) └── timeout ──▶ Idle
//! ```
//!
//! `Resolved` and `Failed` behave like `Idle`: no message is "in form".

use chrono::{DateTime, Utc};

use super::event::RequestId;
use super::message::{truncate_chars, Message, MessageId};
use super::notification::Notification;
use super::timeline::NETWORK_ERROR_MESSAGE;
use crate::agent::{normalize_escalation, AgentError, InvokeResult};
use crate::data::{Ticket, TicketPriority};

/// Shown when an escalation reply reports failure without a message.
pub const ESCALATION_FAILURE_FALLBACK: &str = "Escalation failed. Please try again.";

/// Details collected by the escalation form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EscalationRequest {
    pub original_question: String,
    pub subject: String,
    pub priority: TicketPriority,
    pub reporter_name: String,
    pub notes: String,
}

impl EscalationRequest {
    /// The message sent to the backend for this escalation.
    pub fn directive(&self) -> String {
        let notes = if self.notes.trim().is_empty() {
            "None"
        } else {
            self.notes.as_str()
        };
        format!(
            "ESCALATE: Please create a support ticket and send notification email. \
             User Name: {}. Priority: {}. Subject: {}. Additional Notes: {}. Original question: {}",
            self.reporter_name, self.priority, self.subject, notes, self.original_question
        )
    }

    fn is_complete(&self) -> bool {
        !self.subject.trim().is_empty() && !self.reporter_name.trim().is_empty()
    }

    fn trimmed(&self) -> Self {
        Self {
            original_question: self.original_question.clone(),
            subject: self.subject.trim().to_string(),
            priority: self.priority,
            reporter_name: self.reporter_name.trim().to_string(),
            notes: self.notes.trim().to_string(),
        }
    }
}

/// Editable form field, for line-oriented front ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormField {
    Subject,
    Name,
    Priority,
    Notes,
}

impl FormField {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "subject" => Some(FormField::Subject),
            "name" => Some(FormField::Name),
            "priority" => Some(FormField::Priority),
            "notes" => Some(FormField::Notes),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum EscalationState {
    #[default]
    Idle,
    FormOpen {
        message_id: MessageId,
        draft: EscalationRequest,
    },
    Submitting {
        message_id: MessageId,
        request_id: RequestId,
    },
    Resolved {
        ticket_id: String,
    },
    Failed,
}

impl EscalationState {
    /// No form is open and nothing is being submitted.
    pub fn is_idle(&self) -> bool {
        matches!(
            self,
            EscalationState::Idle | EscalationState::Resolved { .. } | EscalationState::Failed
        )
    }
}

/// Everything a finished escalation writes back.
#[derive(Debug)]
pub struct EscalationOutcome {
    pub message: Message,
    pub ticket: Option<Ticket>,
    pub notification: Notification,
}

#[derive(Debug, Default)]
pub struct EscalationWorkflow {
    state: EscalationState,
}

impl EscalationWorkflow {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &EscalationState {
        &self.state
    }

    pub fn is_submitting(&self) -> bool {
        matches!(self.state, EscalationState::Submitting { .. })
    }

    /// The message the form is open on or being submitted for.
    pub fn target(&self) -> Option<MessageId> {
        match &self.state {
            EscalationState::FormOpen { message_id, .. }
            | EscalationState::Submitting { message_id, .. } => Some(*message_id),
            _ => None,
        }
    }

    pub fn form(&self) -> Option<&EscalationRequest> {
        match &self.state {
            EscalationState::FormOpen { draft, .. } => Some(draft),
            _ => None,
        }
    }

    pub fn form_mut(&mut self) -> Option<&mut EscalationRequest> {
        match &mut self.state {
            EscalationState::FormOpen { draft, .. } => Some(draft),
            _ => None,
        }
    }

    /// Open the form on `message`, closing any other open form.
    ///
    /// Refused for messages that cannot be escalated and while a submission
    /// is outstanding.
    pub fn open(
        &mut self,
        message: &Message,
        original_question: &str,
        default_name: Option<&str>,
        subject_max_chars: usize,
    ) -> bool {
        if !message.can_escalate() || self.is_submitting() {
            return false;
        }
        let draft = EscalationRequest {
            original_question: original_question.to_string(),
            subject: truncate_chars(&message.content, subject_max_chars),
            priority: TicketPriority::Medium,
            reporter_name: default_name.unwrap_or_default().to_string(),
            notes: String::new(),
        };
        tracing::debug!(message_id = %message.id, "Escalation form opened");
        self.state = EscalationState::FormOpen {
            message_id: message.id,
            draft,
        };
        true
    }

    /// Update one field of the open form.
    pub fn set_field(&mut self, field: FormField, value: &str) -> bool {
        let Some(draft) = self.form_mut() else {
            return false;
        };
        match field {
            FormField::Subject => draft.subject = value.to_string(),
            FormField::Name => draft.reporter_name = value.to_string(),
            FormField::Priority => draft.priority = TicketPriority::parse(value),
            FormField::Notes => draft.notes = value.to_string(),
        }
        true
    }

    pub fn cancel(&mut self) {
        if matches!(self.state, EscalationState::FormOpen { .. }) {
            self.state = EscalationState::Idle;
        }
    }

    /// Validate the open form and move to `Submitting`.
    ///
    /// Returns the request to send, or `None` if no form is open or a
    /// mandatory field (subject, reporter name) is blank.
    pub fn submit(&mut self, request_id: RequestId) -> Option<EscalationRequest> {
        let EscalationState::FormOpen { message_id, draft } = &self.state else {
            return None;
        };
        if !draft.is_complete() {
            tracing::debug!("Escalation form incomplete, not submitting");
            return None;
        }
        let message_id = *message_id;
        let request = draft.trimmed();
        tracing::info!(
            request_id = %request_id,
            priority = %request.priority,
            "Submitting escalation"
        );
        self.state = EscalationState::Submitting {
            message_id,
            request_id,
        };
        Some(request)
    }

    /// Reconcile a finished escalation call.
    ///
    /// The outcome is built even if the workflow has moved on (timeout); the
    /// state only changes when `request_id` is still the one submitting.
    pub fn complete(
        &mut self,
        request_id: RequestId,
        request: &EscalationRequest,
        outcome: Result<InvokeResult, AgentError>,
        now: DateTime<Utc>,
    ) -> EscalationOutcome {
        let (result, next_state) = match outcome {
            Ok(envelope) if envelope.success => {
                let normalized =
                    normalize_escalation(envelope.response.as_ref(), &request.subject, || {
                        synthesize_ticket_id(now)
                    });
                let ticket_id = normalized.ticket_id.clone().unwrap_or_default();
                let subject = normalized
                    .ticket_subject
                    .clone()
                    .unwrap_or_else(|| request.subject.clone());
                let notification = Notification::ticket_created(&ticket_id, normalized.email_sent);
                let ticket = Ticket::open(
                    ticket_id.clone(),
                    subject,
                    request.priority,
                    request.original_question.clone(),
                    Some(request.reporter_name.clone()),
                );
                tracing::info!(request_id = %request_id, ticket_id = %ticket_id, "Escalation resolved");
                (
                    EscalationOutcome {
                        message: Message::agent(normalized),
                        ticket: Some(ticket),
                        notification,
                    },
                    EscalationState::Resolved { ticket_id },
                )
            }
            Ok(envelope) => {
                let explanation = envelope
                    .response_message()
                    .unwrap_or(ESCALATION_FAILURE_FALLBACK)
                    .to_string();
                tracing::warn!(request_id = %request_id, error = %explanation, "Escalation reported failure");
                (
                    EscalationOutcome {
                        message: Message::error(explanation),
                        ticket: None,
                        notification: Notification::error("Failed to escalate. Please try again."),
                    },
                    EscalationState::Failed,
                )
            }
            Err(e) => {
                tracing::warn!(request_id = %request_id, error = %e, "Escalation call failed");
                (
                    EscalationOutcome {
                        message: Message::error(NETWORK_ERROR_MESSAGE),
                        ticket: None,
                        notification: Notification::error(
                            "Network error during escalation. Please try again.",
                        ),
                    },
                    EscalationState::Failed,
                )
            }
        };

        if self.is_submitting_request(request_id) {
            self.state = next_state;
        }
        result
    }

    /// Return to `Idle` if `request_id` is still submitting.
    pub fn expire(&mut self, request_id: RequestId) -> bool {
        if !self.is_submitting_request(request_id) {
            return false;
        }
        tracing::warn!(request_id = %request_id, "Escalation timed out");
        self.state = EscalationState::Idle;
        true
    }

    /// Drop any in-progress submission. An open form is left alone.
    pub fn force_reset(&mut self) -> Option<RequestId> {
        match self.state {
            EscalationState::Submitting { request_id, .. } => {
                self.state = EscalationState::Idle;
                Some(request_id)
            }
            _ => None,
        }
    }

    fn is_submitting_request(&self, id: RequestId) -> bool {
        matches!(self.state, EscalationState::Submitting { request_id, .. } if request_id == id)
    }
}

/// Client-side ticket reference for replies that carry none.
pub fn synthesize_ticket_id(now: DateTime<Utc>) -> String {
    format!("TKT-{:06}", now.timestamp_millis().rem_euclid(1_000_000))
}
