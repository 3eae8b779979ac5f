//! Shared test utilities for supportdesk
//!
//! [`Harness`] wires a [`Conversation`] to a [`Runtime`] backed by a
//! [`MockBackend`], so tests drive the same event loop the chat front end
//! runs.

#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use supportdesk::agent::mock::{MockBackend, MockReply};
use supportdesk::agent::{AgentResponse, StructuredReply};
use supportdesk::chat::{AppEvent, ChatSettings, Conversation, Effect, Message, Notification};
use supportdesk::data::{MemoryStateStore, StateStore};
use supportdesk::runtime::Runtime;
use supportdesk::session::{Session, SessionContext};
use tokio::sync::mpsc;

pub const TEST_SESSION_ID: &str = "session_1700000000000_abc1234";
pub const TEST_USER_ID: &str = "user_1700000000000_xyz9876";
pub const TEST_TIMEOUT: Duration = Duration::from_secs(120);

pub struct Harness {
    pub conversation: Conversation,
    pub runtime: Runtime,
    pub events: mpsc::UnboundedReceiver<AppEvent>,
    pub backend: MockBackend,
    pub storage: Arc<dyn StateStore>,
    pub notifications: Vec<Notification>,
}

impl Harness {
    /// Named user, in-memory storage.
    pub fn new(backend: MockBackend) -> Self {
        Self::with_storage(backend, Arc::new(MemoryStateStore::new()), Some("Dana"))
    }

    pub fn with_storage(
        backend: MockBackend,
        storage: Arc<dyn StateStore>,
        display_name: Option<&str>,
    ) -> Self {
        let mut session = Session::with_context(
            SessionContext::new(TEST_SESSION_ID, TEST_USER_ID),
            storage.clone(),
        );
        if let Some(name) = display_name {
            session.set_display_name(name);
        }
        let conversation = Conversation::new(session, storage.clone(), ChatSettings::default());
        let (runtime, events) = Runtime::new(Arc::new(backend.clone()), TEST_TIMEOUT);
        Self {
            conversation,
            runtime,
            events,
            backend,
            storage,
            notifications: Vec::new(),
        }
    }

    pub fn apply(&mut self, effects: Vec<Effect>) {
        let notes = self.runtime.execute(effects);
        self.notifications.extend(notes);
    }

    pub fn send(&mut self, text: &str) -> bool {
        let effects = self.conversation.send(text);
        let accepted = !effects.is_empty();
        self.apply(effects);
        accepted
    }

    pub fn submit_escalation(&mut self) -> bool {
        let effects = self.conversation.submit_escalation();
        let accepted = !effects.is_empty();
        self.apply(effects);
        accepted
    }

    /// Wait for the next runtime event and feed it to the conversation.
    pub async fn step(&mut self) -> AppEvent {
        let event = self.events.recv().await.expect("event channel closed");
        let effects = self.conversation.handle_event(event.clone());
        self.apply(effects);
        event
    }

    /// Process events until nothing is in progress.
    pub async fn settle(&mut self) {
        while self.conversation.is_busy() {
            self.step().await;
        }
    }

    pub fn messages(&self) -> &[Message] {
        self.conversation.timeline().messages()
    }

    pub fn last_message(&self) -> &Message {
        self.messages().last().expect("timeline is empty")
    }
}

/// Structured reply carrying only an answer.
pub fn answer(text: &str) -> MockReply {
    MockReply::success(AgentResponse::structured(StructuredReply {
        answer: Some(text.to_string()),
        source: Some("knowledge_base".to_string()),
        confidence: Some("high".to_string()),
        ..StructuredReply::default()
    }))
}

/// Reply declaring that the backend escalated on its own.
pub fn auto_escalated(ticket_id: &str, subject: Option<&str>, email_sent: bool) -> MockReply {
    MockReply::success(AgentResponse::structured(StructuredReply {
        answer: Some("I have escalated your issue to IT support.".to_string()),
        source: Some("escalation".to_string()),
        escalated: true,
        ticket_id: Some(ticket_id.to_string()),
        ticket_subject: subject.map(str::to_string),
        email_sent,
        ..StructuredReply::default()
    }))
}
