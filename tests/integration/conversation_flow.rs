//! Integration tests for ordinary conversation turns
//!
//! Flow: Conversation -> Runtime -> MockBackend -> AppEvent -> timeline/ticket store

use std::time::Duration;

use supportdesk::agent::mock::{MockBackend, MockReply};
use supportdesk::agent::{AnswerSource, Confidence, COORDINATOR_AGENT_ID};
use supportdesk::chat::timeline::{NETWORK_ERROR_MESSAGE, SEND_FAILURE_FALLBACK};
use supportdesk::chat::{Feedback, NotificationKind, Role};
use supportdesk::data::{StatusFilter, TicketPriority, TicketStatus};

use super::common::{answer, auto_escalated, Harness, TEST_SESSION_ID, TEST_USER_ID};

#[tokio::test]
async fn test_send_appends_normalized_reply() {
    let backend = MockBackend::new().with_reply(answer("Open the VPN portal and click Forgot Password."));
    let mut h = Harness::new(backend);

    assert!(h.send("How do I reset my VPN password?"));
    assert!(h.conversation.is_busy());
    h.settle().await;

    let requests = h.backend.captured_requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].message, "User: Dana. How do I reset my VPN password?");
    assert_eq!(requests[0].agent_id, COORDINATOR_AGENT_ID);
    assert_eq!(requests[0].session_id, TEST_SESSION_ID);
    assert_eq!(requests[0].user_id, TEST_USER_ID);

    assert_eq!(h.messages().len(), 2);
    assert_eq!(h.messages()[0].role, Role::User);
    assert_eq!(h.messages()[0].content, "How do I reset my VPN password?");
    let reply = h.last_message();
    assert_eq!(reply.content, "Open the VPN portal and click Forgot Password.");
    let meta = reply.metadata.as_ref().unwrap();
    assert_eq!(meta.source, AnswerSource::KnowledgeBase);
    assert_eq!(meta.confidence, Confidence::High);
    assert!(h.conversation.active_agent().is_none());
    assert!(h.notifications.is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_back_to_back_send_is_rejected() {
    let backend = MockBackend::new()
        .with_reply(answer("first answer").after(Duration::from_secs(5)))
        .with_reply(answer("unused"));
    let mut h = Harness::new(backend);

    assert!(h.send("first question"));
    assert!(!h.send("second question"));
    h.settle().await;

    assert_eq!(h.backend.call_count(), 1);
    let contents: Vec<_> = h.messages().iter().map(|m| m.content.as_str()).collect();
    assert_eq!(contents, vec!["first question", "first answer"]);
}

#[tokio::test]
async fn test_send_requires_confirmed_name() {
    let mut h = Harness::with_storage(
        MockBackend::new().with_reply(answer("hi")),
        std::sync::Arc::new(supportdesk::data::MemoryStateStore::new()),
        None,
    );
    assert!(!h.send("hello"));
    assert_eq!(h.backend.call_count(), 0);
    assert!(h.messages().is_empty());

    assert!(h.conversation.set_display_name("Sam"));
    assert!(h.send("hello"));
    h.settle().await;
    assert_eq!(h.backend.captured_requests()[0].message, "User: Sam. hello");
}

#[tokio::test]
async fn test_auto_escalation_creates_ticket() {
    let backend = MockBackend::new().with_reply(auto_escalated("TKT-4411", None, true));
    let mut h = Harness::new(backend);

    h.send("My laptop screen keeps flickering after the latest Windows update.");
    h.settle().await;

    let tickets = h.conversation.filter_tickets(StatusFilter::All, "");
    assert_eq!(tickets.len(), 1);
    let ticket = tickets[0];
    assert_eq!(ticket.ticket_id, "TKT-4411");
    assert_eq!(ticket.status, TicketStatus::Open);
    assert_eq!(ticket.priority, TicketPriority::Medium);
    assert_eq!(ticket.reported_by.as_deref(), Some("Dana"));
    assert_eq!(
        ticket.subject,
        "My laptop screen keeps flickering after the latest Windows update."
    );

    assert_eq!(h.notifications.len(), 1);
    assert_eq!(h.notifications[0].kind, NotificationKind::Success);
    assert_eq!(
        h.notifications[0].message,
        "Ticket #TKT-4411 created and notification sent to admin."
    );
    assert!(!h.conversation.can_escalate(h.last_message().id));
}

#[tokio::test]
async fn test_failures_surface_as_error_messages() {
    let backend = MockBackend::new()
        .with_reply(MockReply::reported_failure(None, None))
        .with_reply(MockReply::reported_failure(Some("Daily quota exceeded"), Some("429")))
        .with_reply(MockReply::transport_failure());
    let mut h = Harness::new(backend);

    for question in ["one", "two", "three"] {
        assert!(h.send(question));
        h.settle().await;
    }

    let errors: Vec<_> = h
        .messages()
        .iter()
        .filter(|m| m.is_error)
        .map(|m| m.content.as_str())
        .collect();
    assert_eq!(
        errors,
        vec![SEND_FAILURE_FALLBACK, "Daily quota exceeded", NETWORK_ERROR_MESSAGE]
    );
    assert!(h.conversation.tickets().is_empty());
    assert!(h.messages().iter().all(|m| !m.can_escalate()));
}

#[tokio::test]
async fn test_retry_restores_question_and_resends() {
    let backend = MockBackend::new()
        .with_reply(MockReply::transport_failure())
        .with_reply(answer("Try the printer troubleshooter."));
    let mut h = Harness::new(backend);

    h.send("Printer on floor 3 is offline");
    h.settle().await;
    let error_id = h.last_message().id;

    assert_eq!(
        h.conversation.retry(error_id).as_deref(),
        Some("Printer on floor 3 is offline")
    );
    assert_eq!(h.conversation.timeline().input(), "Printer on floor 3 is offline");
    assert!(h.messages().iter().all(|m| m.id != error_id));

    let effects = h.conversation.send_message();
    h.apply(effects);
    h.settle().await;

    assert_eq!(h.backend.call_count(), 2);
    assert_eq!(h.last_message().content, "Try the printer troubleshooter.");
    let user_turns = h.messages().iter().filter(|m| m.role == Role::User).count();
    assert_eq!(user_turns, 2);
}

#[tokio::test(start_paused = true)]
async fn test_stop_then_late_reply_is_still_appended() {
    let backend = MockBackend::new()
        .with_reply(answer("slow answer").after(Duration::from_secs(30)))
        .with_reply(answer("fast answer").after(Duration::from_secs(60)));
    let mut h = Harness::new(backend);

    h.send("slow question");
    assert!(h.conversation.stop());
    assert!(!h.conversation.is_busy());

    // A new send is allowed right away.
    assert!(h.send("next question"));

    h.step().await;
    assert_eq!(h.last_message().content, "slow answer");
    assert!(h.conversation.timeline().is_in_flight());

    h.settle().await;
    assert_eq!(h.last_message().content, "fast answer");
    assert!(h.notifications.is_empty());
}

#[tokio::test]
async fn test_feedback_marks_agent_messages() {
    let mut h = Harness::new(MockBackend::new().with_reply(answer("Reboot the router.")));
    h.send("Wifi is down");
    h.settle().await;

    let user_id = h.messages()[0].id;
    let agent_id = h.messages()[1].id;
    assert!(!h.conversation.set_feedback(user_id, Feedback::Up));
    assert!(h.conversation.set_feedback(agent_id, Feedback::Up));
    assert_eq!(h.conversation.timeline().feedback(agent_id), Feedback::Up);
}
