//! Integration tests for the escalation workflow
//!
//! Flow: agent reply -> open form -> submit -> MockBackend -> ticket + notification

use supportdesk::agent::mock::{MockBackend, MockReply};
use supportdesk::agent::{AgentResponse, AnswerSource, StructuredReply};
use supportdesk::chat::escalation::ESCALATION_FAILURE_FALLBACK;
use supportdesk::chat::{EscalationState, FormField, MessageId, NotificationKind};
use supportdesk::data::{StatusFilter, TicketPriority, TicketStatus};

use super::common::{answer, Harness};

/// Run one ordinary turn and return the agent reply's id.
async fn answered(h: &mut Harness, question: &str) -> MessageId {
    assert!(h.send(question));
    h.settle().await;
    h.last_message().id
}

fn ticket_reply(ticket_id: &str, subject: &str, email_sent: bool) -> MockReply {
    MockReply::success(AgentResponse::structured(StructuredReply {
        answer: Some(format!("Ticket {ticket_id} has been created.")),
        ticket_id: Some(ticket_id.to_string()),
        ticket_subject: Some(subject.to_string()),
        email_sent,
        ..StructuredReply::default()
    }))
}

#[tokio::test]
async fn test_escalation_creates_exactly_one_ticket() {
    let backend = MockBackend::new()
        .with_reply(answer("Try reinstalling the display driver."))
        .with_reply(ticket_reply("T1", "S", true));
    let mut h = Harness::new(backend);
    let target = answered(&mut h, "Screen flickers after update").await;

    assert!(h.conversation.open_escalation(target));
    h.conversation.set_escalation_field(FormField::Priority, "High");
    h.conversation.set_escalation_field(FormField::Notes, "Started Monday");
    assert!(h.submit_escalation());
    assert!(h.conversation.is_busy());
    h.settle().await;

    let directive = &h.backend.captured_requests()[1].message;
    assert_eq!(
        directive,
        "ESCALATE: Please create a support ticket and send notification email. \
         User Name: Dana. Priority: High. Subject: Try reinstalling the display driver.. \
         Additional Notes: Started Monday. Original question: Screen flickers after update"
    );

    let tickets = h.conversation.filter_tickets(StatusFilter::All, "");
    assert_eq!(tickets.len(), 1);
    assert_eq!(tickets[0].ticket_id, "T1");
    assert_eq!(tickets[0].subject, "S");
    assert_eq!(tickets[0].status, TicketStatus::Open);
    assert_eq!(tickets[0].priority, TicketPriority::High);
    assert_eq!(tickets[0].reported_by.as_deref(), Some("Dana"));
    assert_eq!(tickets[0].question, "Screen flickers after update");

    let notification = h.notifications.last().unwrap();
    assert_eq!(notification.kind, NotificationKind::Success);
    assert!(notification.message.contains("T1"));
    assert!(notification.message.contains("notification sent to admin"));

    let reply = h.last_message();
    let meta = reply.metadata.as_ref().unwrap();
    assert_eq!(meta.source, AnswerSource::Escalation);
    assert!(meta.escalated);
    assert!(h.conversation.escalation().state().is_idle());
    assert!(matches!(
        h.conversation.escalation().state(),
        EscalationState::Resolved { ticket_id } if ticket_id == "T1"
    ));
}

#[tokio::test]
async fn test_empty_reporter_name_never_calls_backend() {
    let backend = MockBackend::new().with_reply(answer("Have you tried turning it off and on?"));
    let mut h = Harness::new(backend);
    let target = answered(&mut h, "Monitor is blank").await;

    assert!(h.conversation.open_escalation(target));
    h.conversation.set_escalation_field(FormField::Name, "   ");
    assert!(!h.submit_escalation());

    h.conversation.set_escalation_field(FormField::Name, "Dana");
    h.conversation.set_escalation_field(FormField::Subject, "");
    assert!(!h.submit_escalation());

    assert_eq!(h.backend.call_count(), 1);
    assert!(h.conversation.tickets().is_empty());
    assert!(h.conversation.escalation().form().is_some());
}

#[tokio::test]
async fn test_reporter_name_comes_from_form() {
    let backend = MockBackend::new()
        .with_reply(answer("Check the cable."))
        .with_reply(ticket_reply("T7", "Docking station", false));
    let mut h = Harness::new(backend);
    let target = answered(&mut h, "Dock not detected").await;

    h.conversation.open_escalation(target);
    h.conversation.set_escalation_field(FormField::Name, "Alex on behalf of Dana");
    h.submit_escalation();
    h.settle().await;

    let ticket = h.conversation.tickets().get("T7").unwrap();
    assert_eq!(ticket.reported_by.as_deref(), Some("Alex on behalf of Dana"));
    assert_eq!(h.notifications.last().unwrap().message, "Ticket #T7 created.");
}

#[tokio::test]
async fn test_degraded_reply_still_yields_ticket_reference() {
    let backend = MockBackend::new()
        .with_reply(answer("Restart the service."))
        .with_reply(MockReply::success(AgentResponse::default()));
    let mut h = Harness::new(backend);
    let target = answered(&mut h, "Outlook crashes").await;

    h.conversation.open_escalation(target);
    h.conversation.set_escalation_field(FormField::Subject, "Outlook crash on start");
    h.submit_escalation();
    h.settle().await;

    let tickets = h.conversation.tickets().tickets();
    assert_eq!(tickets.len(), 1);
    assert!(tickets[0].ticket_id.starts_with("TKT-"));
    assert_eq!(tickets[0].ticket_id.len(), "TKT-".len() + 6);
    assert_eq!(tickets[0].subject, "Outlook crash on start");
    assert_eq!(h.last_message().content, "Your issue has been escalated.");
}

#[tokio::test]
async fn test_failed_escalation_returns_to_idle() {
    let backend = MockBackend::new()
        .with_reply(answer("Clear the browser cache."))
        .with_reply(MockReply::reported_failure(None, Some("ticket service down")))
        .with_reply(MockReply::transport_failure());
    let mut h = Harness::new(backend);
    let target = answered(&mut h, "Intranet will not load").await;

    h.conversation.open_escalation(target);
    h.submit_escalation();
    h.settle().await;

    assert!(h.last_message().is_error);
    assert_eq!(h.last_message().content, ESCALATION_FAILURE_FALLBACK);
    assert_eq!(
        h.notifications.last().unwrap().message,
        "Failed to escalate. Please try again."
    );
    assert!(h.conversation.escalation().state().is_idle());

    // The form can be reopened on the same message.
    assert!(h.conversation.open_escalation(target));
    h.submit_escalation();
    h.settle().await;

    assert_eq!(
        h.notifications.last().unwrap().message,
        "Network error during escalation. Please try again."
    );
    assert_eq!(h.notifications.last().unwrap().kind, NotificationKind::Error);
    assert!(h.conversation.tickets().is_empty());
}

#[tokio::test]
async fn test_opening_a_new_form_closes_the_previous_one() {
    let backend = MockBackend::new()
        .with_reply(answer("first"))
        .with_reply(answer("second"));
    let mut h = Harness::new(backend);
    let first = answered(&mut h, "q1").await;
    let second = answered(&mut h, "q2").await;

    assert!(h.conversation.open_escalation(first));
    assert!(h.conversation.open_escalation(second));
    assert_eq!(h.conversation.escalation().target(), Some(second));
    assert_eq!(h.conversation.escalation().form().unwrap().original_question, "q2");

    h.conversation.cancel_escalation();
    assert!(h.conversation.escalation().state().is_idle());
}
