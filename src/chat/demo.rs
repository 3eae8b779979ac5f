//! Sample conversation and tickets for demonstrations. Never persisted.

use chrono::{Duration, Utc};

use super::message::Message;
use crate::agent::{AnswerSource, Confidence, NormalizedAgentResult};
use crate::data::{Ticket, TicketPriority, TicketStatus};

fn ago(message: Message, seconds: i64) -> Message {
    Message {
        timestamp: Utc::now() - Duration::seconds(seconds),
        ..message
    }
}

fn reply(answer: &str, source: AnswerSource, confidence: Confidence) -> NormalizedAgentResult {
    NormalizedAgentResult {
        answer: answer.to_string(),
        source,
        confidence,
        ..NormalizedAgentResult::default()
    }
}

pub fn sample_messages() -> Vec<Message> {
    vec![
        ago(Message::user("How do I reset my VPN password?"), 300),
        ago(
            Message::agent(reply(
                "To reset your VPN password, follow these steps:\n\n\
                 1. Open the **Company VPN Portal** at vpn.company.com\n\
                 2. Click **Forgot Password** on the login page\n\
                 3. Enter your employee email address\n\
                 4. Check your email for the reset link (usually arrives within 2 minutes)\n\
                 5. Create a new password following the policy: minimum 12 characters, \
                 1 uppercase, 1 number, 1 special character\n\n\
                 If you still have issues, I can escalate this to IT support.",
                AnswerSource::KnowledgeBase,
                Confidence::High,
            )),
            290,
        ),
        ago(
            Message::user("My laptop screen keeps flickering after the latest Windows update."),
            200,
        ),
        ago(
            Message::agent(NormalizedAgentResult {
                requires_escalation: true,
                ..reply(
                    "Screen flickering after a Windows update can be caused by incompatible \
                     display drivers. Here are some troubleshooting steps:\n\n\
                     - **Boot into Safe Mode** and check if the issue persists\n\
                     - Try rolling back the display driver via Device Manager\n\
                     - Run `sfc /scannow` in an elevated Command Prompt\n\n\
                     However, since this could indicate a hardware compatibility issue, I \
                     recommend escalating this to our hardware support team for further diagnosis.",
                    AnswerSource::Combined,
                    Confidence::Medium,
                )
            }),
            190,
        ),
        ago(Message::user("Please escalate the screen flickering issue."), 150),
        ago(
            Message::agent(NormalizedAgentResult {
                escalated: true,
                ticket_id: Some("TKT-2024-0042".into()),
                ticket_subject: Some("Screen flickering after Windows update".into()),
                email_sent: true,
                ..reply(
                    "I have escalated your issue. A support ticket has been created and the IT \
                     hardware team has been notified via email. You should receive a response \
                     within 4 business hours.",
                    AnswerSource::Escalation,
                    Confidence::High,
                )
            }),
            145,
        ),
    ]
}

fn sample_ticket(
    ticket_id: &str,
    subject: &str,
    status: TicketStatus,
    priority: TicketPriority,
    question: &str,
    seconds_ago: i64,
) -> Ticket {
    Ticket {
        status,
        created_at: Utc::now() - Duration::seconds(seconds_ago),
        ..Ticket::open(ticket_id, subject, priority, question, None)
    }
}

/// Newest first, like the store.
pub fn sample_tickets() -> Vec<Ticket> {
    vec![
        sample_ticket(
            "TKT-2024-0042",
            "Screen flickering after Windows update",
            TicketStatus::Open,
            TicketPriority::High,
            "My laptop screen keeps flickering after the latest Windows update.",
            145,
        ),
        sample_ticket(
            "TKT-2024-0041",
            "Unable to access shared drive on new laptop",
            TicketStatus::Open,
            TicketPriority::Medium,
            "I got a new laptop and cannot access the department shared drive.",
            86_400,
        ),
        sample_ticket(
            "TKT-2024-0039",
            "Email sync stopped working on mobile",
            TicketStatus::Closed,
            TicketPriority::Low,
            "My Outlook app on iPhone stopped syncing emails since yesterday.",
            172_800,
        ),
    ]
}
