/// Severity of a transient notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationKind {
    Success,
    Error,
    Info,
}

/// A transient, dismissible notice for the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub kind: NotificationKind,
    pub message: String,
}

impl Notification {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            kind: NotificationKind::Success,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            kind: NotificationKind::Error,
            message: message.into(),
        }
    }

    pub fn info(message: impl Into<String>) -> Self {
        Self {
            kind: NotificationKind::Info,
            message: message.into(),
        }
    }

    pub fn ticket_created(ticket_id: &str, email_sent: bool) -> Self {
        let email = if email_sent {
            " and notification sent to admin"
        } else {
            ""
        };
        Self::success(format!("Ticket #{ticket_id} created{email}."))
    }

    /// A reply named a ticket that is already in the store.
    pub fn ticket_already_recorded(ticket_id: &str) -> Self {
        Self::info(format!("Ticket #{ticket_id} is already on record."))
    }

    pub fn timed_out() -> Self {
        Self::error("Request timed out. Please try again.")
    }
}
