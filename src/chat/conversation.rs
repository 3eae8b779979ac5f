//! The conversation reducer.
//!
//! [`Conversation`] owns the session, the timeline, the escalation workflow
//! and the ticket store. User actions and [`AppEvent`]s are applied one at a
//! time through `&mut self`; anything that has to happen outside (backend
//! calls, timers, notifications) is returned as an [`Effect`] for the runtime
//! to execute.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use tokio_util::sync::CancellationToken;

use super::demo;
use super::effect::Effect;
use super::escalation::{EscalationRequest, EscalationWorkflow, FormField};
use super::event::{AppEvent, RequestId};
use super::message::{Feedback, Message, MessageId};
use super::notification::Notification;
use super::timeline::Timeline;
use crate::agent::{AgentError, InvokeRequest, InvokeResult, COORDINATOR_AGENT_ID};
use crate::data::{StateStore, StatusFilter, Ticket, TicketStore};
use crate::session::Session;

/// Knobs the reducer needs from configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatSettings {
    /// Routing target for every backend call
    pub agent_id: String,
    /// Length of auto-generated ticket subjects
    pub subject_max_chars: usize,
}

impl Default for ChatSettings {
    fn default() -> Self {
        Self {
            agent_id: COORDINATOR_AGENT_ID.to_string(),
            subject_max_chars: 80,
        }
    }
}

#[derive(Debug)]
enum PendingKind {
    Send {
        question: String,
        reporter: Option<String>,
    },
    Escalate {
        request: EscalationRequest,
    },
}

/// A backend call that has not completed yet.
#[derive(Debug)]
struct PendingRequest {
    kind: PendingKind,
    guard: CancellationToken,
}

pub struct Conversation {
    session: Session,
    timeline: Timeline,
    escalation: EscalationWorkflow,
    tickets: TicketStore,
    /// Sample tickets shown instead of `tickets` while demo data is on
    sample_tickets: Option<TicketStore>,
    storage: Arc<dyn StateStore>,
    settings: ChatSettings,
    pending: HashMap<RequestId, PendingRequest>,
    next_request: u64,
}

impl Conversation {
    pub fn new(session: Session, storage: Arc<dyn StateStore>, settings: ChatSettings) -> Self {
        Self {
            session,
            timeline: Timeline::new(),
            escalation: EscalationWorkflow::new(),
            tickets: TicketStore::load(storage.clone()),
            sample_tickets: None,
            storage,
            settings,
            pending: HashMap::new(),
            next_request: 0,
        }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn timeline(&self) -> &Timeline {
        &self.timeline
    }

    pub fn escalation(&self) -> &EscalationWorkflow {
        &self.escalation
    }

    pub fn settings(&self) -> &ChatSettings {
        &self.settings
    }

    /// The tickets currently shown (sample tickets while demo data is on).
    pub fn tickets(&self) -> &TicketStore {
        self.sample_tickets.as_ref().unwrap_or(&self.tickets)
    }

    pub fn filter_tickets(&self, status: StatusFilter, query: &str) -> Vec<&Ticket> {
        self.tickets().filter(status, query)
    }

    pub fn sample_data(&self) -> bool {
        self.sample_tickets.is_some()
    }

    /// Agent to show as working, if any call is outstanding.
    pub fn active_agent(&self) -> Option<&str> {
        self.timeline.active_agent().or_else(|| {
            self.escalation
                .is_submitting()
                .then_some(self.settings.agent_id.as_str())
        })
    }

    pub fn is_busy(&self) -> bool {
        self.timeline.is_in_flight() || self.escalation.is_submitting()
    }

    pub fn can_escalate(&self, id: MessageId) -> bool {
        self.timeline.get(id).is_some_and(Message::can_escalate)
    }

    pub fn escalation_emphasized(&self, id: MessageId) -> bool {
        self.timeline
            .get(id)
            .is_some_and(Message::escalation_emphasized)
    }

    pub fn set_display_name(&mut self, name: &str) -> bool {
        self.session.set_display_name(name)
    }

    pub fn clear_display_name(&mut self) {
        self.session.clear_display_name();
    }

    pub fn set_input(&mut self, text: impl Into<String>) {
        self.timeline.set_input(text);
    }

    /// Send the current input. Returns no effects if the send is refused.
    pub fn send_message(&mut self) -> Vec<Effect> {
        let request_id = self.peek_request_id();
        let Some(turn) = self.timeline.send_message(
            self.session.display_name(),
            request_id,
            &self.settings.agent_id,
        ) else {
            return Vec::new();
        };
        self.next_request += 1;

        tracing::info!(request_id = %request_id, "Sending message");
        let request = InvokeRequest::new(
            turn.message,
            self.settings.agent_id.clone(),
            self.session.context(),
        );
        self.dispatch(
            request_id,
            request,
            PendingKind::Send {
                question: turn.question,
                reporter: self.session.display_name().map(str::to_string),
            },
        )
    }

    /// Replace the input with `text` and send it.
    pub fn send(&mut self, text: &str) -> Vec<Effect> {
        self.set_input(text);
        self.send_message()
    }

    /// Stop waiting on the current send and any escalation being submitted.
    /// The backend calls keep running and their results are still appended
    /// when they arrive.
    pub fn stop(&mut self) -> bool {
        let stopped: Vec<RequestId> = self
            .timeline
            .stop()
            .into_iter()
            .chain(self.escalation.force_reset())
            .collect();
        for request_id in &stopped {
            tracing::info!(request_id = %request_id, "Stopped waiting for reply");
            self.disarm(*request_id);
        }
        !stopped.is_empty()
    }

    /// Drop an error message and put its triggering text back in the input.
    pub fn retry(&mut self, id: MessageId) -> Option<String> {
        self.timeline.retry(id)
    }

    pub fn set_feedback(&mut self, id: MessageId, feedback: Feedback) -> bool {
        self.timeline.set_feedback(id, feedback)
    }

    /// Open the escalation form on an agent message.
    pub fn open_escalation(&mut self, id: MessageId) -> bool {
        let Some(message) = self.timeline.get(id) else {
            return false;
        };
        let question = self
            .timeline
            .preceding_user_message(id)
            .unwrap_or(message)
            .content
            .clone();
        self.escalation.open(
            message,
            &question,
            self.session.display_name(),
            self.settings.subject_max_chars,
        )
    }

    pub fn set_escalation_field(&mut self, field: FormField, value: &str) -> bool {
        self.escalation.set_field(field, value)
    }

    pub fn cancel_escalation(&mut self) {
        self.escalation.cancel();
    }

    /// Submit the open escalation form. Returns no effects if it is refused.
    pub fn submit_escalation(&mut self) -> Vec<Effect> {
        let request_id = self.peek_request_id();
        let Some(request) = self.escalation.submit(request_id) else {
            return Vec::new();
        };
        self.next_request += 1;

        let invoke = InvokeRequest::new(
            request.directive(),
            self.settings.agent_id.clone(),
            self.session.context(),
        );
        self.dispatch(request_id, invoke, PendingKind::Escalate { request })
    }

    /// Switch demo data on or off.
    ///
    /// Turning it on swaps in a sample conversation and sample tickets;
    /// turning it off clears the conversation and reloads stored tickets.
    pub fn set_sample_data(&mut self, enabled: bool) {
        if enabled == self.sample_data() {
            return;
        }
        self.escalation.cancel();
        if enabled {
            self.timeline.replace(demo::sample_messages());
            self.sample_tickets = Some(TicketStore::detached(demo::sample_tickets()));
        } else {
            self.timeline.replace(Vec::new());
            self.sample_tickets = None;
            self.tickets = TicketStore::load(self.storage.clone());
        }
        tracing::debug!(enabled, "Sample data toggled");
    }

    /// Apply an event from the runtime.
    pub fn handle_event(&mut self, event: AppEvent) -> Vec<Effect> {
        match event {
            AppEvent::BackendCompleted {
                request_id,
                outcome,
            } => self.reconcile(request_id, outcome),
            AppEvent::TimedOut { request_id } => self.time_out(request_id),
            AppEvent::Activity(_) => Vec::new(),
        }
    }

    fn reconcile(
        &mut self,
        request_id: RequestId,
        outcome: Result<InvokeResult, AgentError>,
    ) -> Vec<Effect> {
        let Some(pending) = self.pending.remove(&request_id) else {
            tracing::debug!(request_id = %request_id, "Ignoring completion for unknown request");
            return Vec::new();
        };
        pending.guard.cancel();

        let (ticket, notification) = match pending.kind {
            PendingKind::Send { question, reporter } => {
                let outcome = self.timeline.complete_send(
                    request_id,
                    &question,
                    reporter.as_deref(),
                    outcome,
                    self.settings.subject_max_chars,
                );
                (outcome.ticket, outcome.notification)
            }
            PendingKind::Escalate { request } => {
                let outcome = self
                    .escalation
                    .complete(request_id, &request, outcome, Utc::now());
                if outcome.message.is_error {
                    self.timeline
                        .push_error(outcome.message, &request.original_question);
                } else {
                    self.timeline.push(outcome.message);
                }
                (outcome.ticket, Some(outcome.notification))
            }
        };

        let notification = match ticket {
            Some(ticket) => {
                let ticket_id = ticket.ticket_id.clone();
                if self.record_ticket(ticket) {
                    notification
                } else {
                    Some(Notification::ticket_already_recorded(&ticket_id))
                }
            }
            None => notification,
        };
        notification.map(Effect::Notify).into_iter().collect()
    }

    fn time_out(&mut self, request_id: RequestId) -> Vec<Effect> {
        if self.timeline.expire(request_id) {
            tracing::warn!(request_id = %request_id, "Request timed out");
            if let Some(escalation_id) = self.escalation.force_reset() {
                self.disarm(escalation_id);
            }
            return vec![Effect::Notify(Notification::timed_out())];
        }
        if self.escalation.expire(request_id) {
            return vec![Effect::Notify(Notification::timed_out())];
        }
        tracing::debug!(request_id = %request_id, "Ignoring stale timeout");
        Vec::new()
    }

    /// Persist a new ticket; mirror it into the sample view if that is shown.
    /// Returns `false` if the ticket id is already in the visible store.
    fn record_ticket(&mut self, ticket: Ticket) -> bool {
        match &mut self.sample_tickets {
            Some(sample) => {
                let shown = sample.insert(ticket.clone());
                self.tickets.insert(ticket);
                shown
            }
            None => self.tickets.insert(ticket),
        }
    }

    /// Cancel the timer of a request that is no longer being waited on.
    fn disarm(&self, request_id: RequestId) {
        if let Some(pending) = self.pending.get(&request_id) {
            pending.guard.cancel();
        }
    }

    fn peek_request_id(&self) -> RequestId {
        RequestId(self.next_request + 1)
    }

    fn dispatch(
        &mut self,
        request_id: RequestId,
        request: InvokeRequest,
        kind: PendingKind,
    ) -> Vec<Effect> {
        let guard = CancellationToken::new();
        self.pending.insert(
            request_id,
            PendingRequest {
                kind,
                guard: guard.clone(),
            },
        );
        vec![
            Effect::Invoke {
                request_id,
                request,
            },
            Effect::ArmTimeout { request_id, guard },
        ]
    }
}
