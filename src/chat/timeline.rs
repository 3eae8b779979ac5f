//! Conversation timeline: the ordered message log and the in-flight send.
//!
//! The timeline is the only owner of the message log. Messages are appended
//! and never edited; the single deletion path is [`Timeline::retry`], which
//! drops an error message and puts the text that triggered it back into the
//! input. That text is recorded when the error is appended, since a late
//! failure can land after newer user turns.

use std::collections::HashMap;

use super::event::RequestId;
use super::message::{truncate_chars, Feedback, Message, MessageId, Role};
use super::notification::Notification;
use crate::agent::{normalize, AgentError, InvokeResult};
use crate::data::{Ticket, TicketPriority};

/// Shown when the backend reports failure without explaining why.
pub const SEND_FAILURE_FALLBACK: &str = "Something went wrong. Please try again.";

/// Shown when a backend call fails outright.
pub const NETWORK_ERROR_MESSAGE: &str =
    "A network error occurred. Please check your connection and try again.";

/// A send accepted by the timeline, ready to go to the backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutgoingTurn {
    /// The user's text as typed (trimmed)
    pub question: String,
    /// The text sent to the backend, prefixed with the reporter's name
    pub message: String,
}

/// What a completed send produced besides the appended message.
#[derive(Debug, Default)]
pub struct SendOutcome {
    pub ticket: Option<Ticket>,
    pub notification: Option<Notification>,
}

#[derive(Debug, Default)]
pub struct Timeline {
    messages: Vec<Message>,
    feedback: HashMap<MessageId, Feedback>,
    /// Text that produced each error message, restored by retry
    retry_text: HashMap<MessageId, String>,
    input: String,
    in_flight: Option<RequestId>,
    active_agent: Option<String>,
}

impl Timeline {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn get(&self, id: MessageId) -> Option<&Message> {
        self.messages.iter().find(|m| m.id == id)
    }

    pub fn input(&self) -> &str {
        &self.input
    }

    pub fn set_input(&mut self, text: impl Into<String>) {
        self.input = text.into();
    }

    pub fn is_in_flight(&self) -> bool {
        self.in_flight.is_some()
    }

    pub fn in_flight(&self) -> Option<RequestId> {
        self.in_flight
    }

    pub fn active_agent(&self) -> Option<&str> {
        self.active_agent.as_deref()
    }

    /// Accept the current input as a new user turn.
    ///
    /// Returns `None` (and changes nothing) when the input is blank, a send is
    /// already in flight, or no display name has been confirmed.
    pub fn send_message(
        &mut self,
        display_name: Option<&str>,
        request_id: RequestId,
        agent_id: &str,
    ) -> Option<OutgoingTurn> {
        let question = self.input.trim().to_string();
        if question.is_empty() || self.in_flight.is_some() {
            return None;
        }
        let name = display_name?;

        self.messages.push(Message::user(question.clone()));
        self.input.clear();
        self.in_flight = Some(request_id);
        self.active_agent = Some(agent_id.to_string());

        Some(OutgoingTurn {
            message: format!("User: {name}. {question}"),
            question,
        })
    }

    /// Reconcile a finished send into the log.
    ///
    /// The reply is appended even if the request is no longer current (after a
    /// stop or a timeout); progress indicators are only cleared for the
    /// current request.
    pub fn complete_send(
        &mut self,
        request_id: RequestId,
        question: &str,
        reporter: Option<&str>,
        outcome: Result<InvokeResult, AgentError>,
        subject_max_chars: usize,
    ) -> SendOutcome {
        let mut result = SendOutcome::default();

        match outcome {
            Ok(envelope) if envelope.success => {
                let normalized = normalize(envelope.response.as_ref());
                if normalized.escalated {
                    if let Some(ticket_id) = normalized.ticket_id.clone() {
                        let subject = normalized
                            .ticket_subject
                            .clone()
                            .unwrap_or_else(|| truncate_chars(question, subject_max_chars));
                        result.notification = Some(Notification::ticket_created(
                            &ticket_id,
                            normalized.email_sent,
                        ));
                        result.ticket = Some(Ticket::open(
                            ticket_id,
                            subject,
                            TicketPriority::Medium,
                            question,
                            reporter.map(str::to_string),
                        ));
                    }
                }
                tracing::debug!(
                    request_id = %request_id,
                    source = ?normalized.source,
                    escalated = normalized.escalated,
                    "Agent reply appended"
                );
                self.messages.push(Message::agent(normalized));
            }
            Ok(envelope) => {
                let explanation = envelope
                    .failure_message()
                    .unwrap_or(SEND_FAILURE_FALLBACK)
                    .to_string();
                tracing::warn!(request_id = %request_id, error = %explanation, "Backend reported failure");
                self.push_error(Message::error(explanation), question);
            }
            Err(e) => {
                tracing::warn!(request_id = %request_id, error = %e, "Backend call failed");
                self.push_error(Message::error(NETWORK_ERROR_MESSAGE), question);
            }
        }

        if self.in_flight == Some(request_id) {
            self.in_flight = None;
            self.active_agent = None;
        }
        result
    }

    /// Clear progress state for `request_id` if it is still current.
    pub fn expire(&mut self, request_id: RequestId) -> bool {
        if self.in_flight != Some(request_id) {
            return false;
        }
        self.in_flight = None;
        self.active_agent = None;
        true
    }

    /// Abandon waiting on the current send. The backend call is not cancelled.
    pub fn stop(&mut self) -> Option<RequestId> {
        self.active_agent = None;
        self.in_flight.take()
    }

    /// Drop an error message and restore the user text that triggered it.
    ///
    /// Returns the restored text, or `None` if `id` is not an error message.
    pub fn retry(&mut self, id: MessageId) -> Option<String> {
        let index = self.messages.iter().position(|m| m.id == id && m.is_error)?;
        let restored = self.retry_text.remove(&id).or_else(|| {
            self.messages[..index]
                .iter()
                .rev()
                .find(|m| m.role == Role::User)
                .map(|m| m.content.clone())
        });
        self.messages.remove(index);
        self.feedback.remove(&id);
        if let Some(text) = &restored {
            self.input = text.clone();
        }
        restored
    }

    /// Most recent error message, if any.
    pub fn last_error(&self) -> Option<MessageId> {
        self.messages.iter().rev().find(|m| m.is_error).map(|m| m.id)
    }

    /// Nearest user message before `id`.
    pub fn preceding_user_message(&self, id: MessageId) -> Option<&Message> {
        let index = self.messages.iter().position(|m| m.id == id)?;
        self.messages[..index].iter().rev().find(|m| m.role == Role::User)
    }

    /// Mark an agent message as helpful or not. `Feedback::None` clears the mark.
    pub fn set_feedback(&mut self, id: MessageId, feedback: Feedback) -> bool {
        if !self.get(id).is_some_and(Message::is_agent) {
            return false;
        }
        match feedback {
            Feedback::None => self.feedback.remove(&id),
            mark => self.feedback.insert(id, mark),
        };
        true
    }

    pub fn feedback(&self, id: MessageId) -> Feedback {
        self.feedback.get(&id).copied().unwrap_or_default()
    }

    pub(crate) fn push(&mut self, message: Message) {
        self.messages.push(message);
    }

    /// Append an error message that retry should answer with `source`.
    pub(crate) fn push_error(&mut self, message: Message, source: &str) {
        self.retry_text.insert(message.id, source.to_string());
        self.messages.push(message);
    }

    /// Swap the whole log (sample data on/off). Feedback and retry state is dropped.
    pub(crate) fn replace(&mut self, messages: Vec<Message>) {
        self.messages = messages;
        self.feedback.clear();
        self.retry_text.clear();
    }
}
