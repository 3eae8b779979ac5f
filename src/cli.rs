//! Line-oriented front end: the interactive chat loop and ticket listing.

use std::io::Write;

use anyhow::Result;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;

use crate::agent::{roster, ActivityEvent, AnswerSource};
use crate::chat::{
    AppEvent, Conversation, Feedback, FormField, Message, MessageId, Notification,
    NotificationKind,
};
use crate::data::{StatusFilter, Ticket};
use crate::runtime::Runtime;

pub const HELP: &str = "\
Type a message and press Enter to send it. An empty line sends restored input.
  /name <name>                      confirm your display name
  /signout                          forget your display name
  /escalate [n]                     open the escalation form on message n
  /field subject|name|priority|notes <value>
  /submit                           submit the escalation form
  /cancel                           close the escalation form
  /retry [n]                        discard error message n and restore its question
  /stop                             stop waiting for the current reply
  /feedback <n> up|down|none        rate agent message n
  /tickets [all|open|closed] [query]
  /sample on|off                    show or hide sample data
  /help
  /quit";

/// One parsed input line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Say(String),
    SendInput,
    Name(String),
    SignOut,
    Escalate(Option<usize>),
    Field(FormField, String),
    Submit,
    Cancel,
    Retry(Option<usize>),
    Stop,
    Feedback(usize, Feedback),
    Tickets {
        status: StatusFilter,
        query: String,
    },
    Sample(bool),
    Help,
    Quit,
    Invalid(String),
}

/// Parse one line of user input.
pub fn parse_command(line: &str) -> Command {
    let line = line.trim();
    if line.is_empty() {
        return Command::SendInput;
    }
    let Some(rest) = line.strip_prefix('/') else {
        return Command::Say(line.to_string());
    };
    let (name, args) = match rest.split_once(char::is_whitespace) {
        Some((name, args)) => (name, args.trim()),
        None => (rest, ""),
    };

    match name.to_lowercase().as_str() {
        "name" if !args.is_empty() => Command::Name(args.to_string()),
        "name" => Command::Invalid("usage: /name <your name>".to_string()),
        "signout" | "logout" => Command::SignOut,
        "escalate" => match parse_index(args) {
            Ok(index) => Command::Escalate(index),
            Err(msg) => Command::Invalid(msg),
        },
        "field" => {
            let (field, value) = args.split_once(char::is_whitespace).unwrap_or((args, ""));
            match FormField::parse(field) {
                Some(field) => Command::Field(field, value.trim().to_string()),
                None => Command::Invalid(format!("unknown field '{field}'")),
            }
        }
        "submit" => Command::Submit,
        "cancel" => Command::Cancel,
        "retry" => match parse_index(args) {
            Ok(index) => Command::Retry(index),
            Err(msg) => Command::Invalid(msg),
        },
        "stop" => Command::Stop,
        "feedback" => {
            let mut parts = args.split_whitespace();
            let index = parts.next().and_then(|n| n.parse::<usize>().ok());
            let mark = parts.next().and_then(Feedback::parse);
            match (index, mark) {
                (Some(index), Some(mark)) => Command::Feedback(index, mark),
                _ => Command::Invalid("usage: /feedback <n> up|down|none".to_string()),
            }
        }
        "tickets" => {
            let (first, remainder) = args.split_once(char::is_whitespace).unwrap_or((args, ""));
            match StatusFilter::parse(first) {
                Some(status) => Command::Tickets {
                    status,
                    query: remainder.trim().to_string(),
                },
                None => Command::Tickets {
                    status: StatusFilter::All,
                    query: args.to_string(),
                },
            }
        }
        "sample" => match args.to_lowercase().as_str() {
            "on" => Command::Sample(true),
            "off" => Command::Sample(false),
            _ => Command::Invalid("usage: /sample on|off".to_string()),
        },
        "help" | "?" => Command::Help,
        "quit" | "exit" | "q" => Command::Quit,
        _ => Command::Invalid(format!("unknown command '/{name}' (try /help)")),
    }
}

fn parse_index(args: &str) -> Result<Option<usize>, String> {
    if args.is_empty() {
        return Ok(None);
    }
    args.parse::<usize>()
        .map(Some)
        .map_err(|_| format!("'{args}' is not a message number"))
}

pub fn format_message(number: usize, message: &Message, feedback: Feedback) -> String {
    if message.is_error {
        return format!("[{number}] error: {}", message.content);
    }
    if !message.is_agent() {
        return format!("[{number}] you: {}", message.content);
    }

    let mut tags = Vec::new();
    if let Some(meta) = &message.metadata {
        if meta.source != AnswerSource::Unspecified {
            tags.push(meta.source.display_name().to_string());
        }
        tags.push(meta.confidence.display_name().to_string());
        if meta.escalated {
            if let Some(ticket_id) = &meta.ticket_id {
                tags.push(format!("ticket {ticket_id}"));
            }
            if meta.email_sent {
                tags.push("admin notified".to_string());
            }
        }
    }
    match feedback {
        Feedback::Up => tags.push("helpful".to_string()),
        Feedback::Down => tags.push("not helpful".to_string()),
        Feedback::None => {}
    }

    let mut out = format!("[{number}] agent ({}): {}", tags.join(", "), message.content);
    if message.escalation_emphasized() {
        out.push_str(&format!("\n    escalation recommended: /escalate {number}"));
    }
    out
}

pub fn format_ticket(ticket: &Ticket) -> String {
    let reporter = ticket.reported_by.as_deref().unwrap_or("-");
    format!(
        "{:<16} {:<7} {:<7} {}  ({} by {})",
        ticket.ticket_id,
        ticket.status.as_str(),
        ticket.priority.as_str(),
        ticket.subject,
        ticket.created_at.format("%Y-%m-%d %H:%M"),
        reporter
    )
}

fn format_notification(notification: &Notification) -> String {
    let label = match notification.kind {
        NotificationKind::Success => "ok",
        NotificationKind::Error => "error",
        NotificationKind::Info => "info",
    };
    format!("** [{label}] {}", notification.message)
}

/// Print a ticket listing for `status`/`query`.
pub fn print_tickets(tickets: &[&Ticket]) {
    if tickets.is_empty() {
        println!("No tickets found.");
        return;
    }
    for ticket in tickets {
        println!("{}", format_ticket(ticket));
    }
}

/// Interactive chat loop.
pub struct ChatRepl {
    conversation: Conversation,
    runtime: Runtime,
    events: mpsc::UnboundedReceiver<AppEvent>,
    printed: usize,
}

impl ChatRepl {
    pub fn new(
        conversation: Conversation,
        runtime: Runtime,
        events: mpsc::UnboundedReceiver<AppEvent>,
    ) -> Self {
        Self {
            conversation,
            runtime,
            events,
            printed: 0,
        }
    }

    pub async fn run(mut self) -> Result<()> {
        println!("Support chat. Type /help for commands.");
        match self.conversation.session().display_name() {
            Some(name) => println!("Welcome back, {name}."),
            None => println!("Please tell us your name first: /name <your name>"),
        }

        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        loop {
            self.prompt()?;
            tokio::select! {
                line = lines.next_line() => {
                    let Some(line) = line? else { break };
                    if !self.handle_command(parse_command(&line)) {
                        break;
                    }
                }
                Some(event) = self.events.recv() => self.handle_event(event),
            }
            self.flush_messages();
        }
        Ok(())
    }

    fn prompt(&self) -> Result<()> {
        let waiting = self
            .conversation
            .active_agent()
            .map(|id| format!("[{} is working, /stop to stop waiting] ", roster::display_name(id)))
            .unwrap_or_default();
        print!("{waiting}> ");
        std::io::stdout().flush()?;
        Ok(())
    }

    fn handle_event(&mut self, event: AppEvent) {
        if let AppEvent::Activity(activity) = &event {
            match activity {
                ActivityEvent::Progress(progress) => {
                    let agent = progress
                        .agent_id
                        .as_deref()
                        .map(roster::display_name)
                        .unwrap_or("agent");
                    if let Some(message) = &progress.message {
                        println!("\n  .. {agent}: {message}");
                    }
                }
                ActivityEvent::Connected => tracing::debug!("Activity stream connected"),
                ActivityEvent::Disconnected { reason } => {
                    tracing::debug!(reason = ?reason, "Activity stream disconnected")
                }
            }
        }
        let effects = self.conversation.handle_event(event);
        self.execute(effects);
    }

    fn execute(&mut self, effects: Vec<crate::chat::Effect>) {
        for notification in self.runtime.execute(effects) {
            println!("{}", format_notification(&notification));
        }
    }

    /// Apply a command. Returns false when the loop should end.
    fn handle_command(&mut self, command: Command) -> bool {
        match command {
            Command::Say(text) => {
                if !self.conversation.session().name_confirmed() {
                    println!("Please set your name first: /name <your name>");
                } else if self.conversation.timeline().is_in_flight() {
                    println!("Still waiting for the previous reply (/stop to stop waiting).");
                } else {
                    let effects = self.conversation.send(&text);
                    self.execute(effects);
                }
            }
            Command::SendInput => {
                if !self.conversation.timeline().input().is_empty() {
                    let effects = self.conversation.send_message();
                    self.execute(effects);
                }
            }
            Command::Name(name) => {
                if self.conversation.set_display_name(&name) {
                    println!("Hello, {}.", name.trim());
                }
            }
            Command::SignOut => {
                self.conversation.clear_display_name();
                println!("Name cleared. Set it again with /name <your name>.");
            }
            Command::Escalate(number) => {
                let target = match number {
                    Some(n) => self.message_at(n),
                    None => self.last_escalatable(),
                };
                match target {
                    Some(id) if self.conversation.open_escalation(id) => self.print_form(),
                    _ => println!("That message cannot be escalated."),
                }
            }
            Command::Field(field, value) => {
                if self.conversation.set_escalation_field(field, &value) {
                    self.print_form();
                } else {
                    println!("No escalation form is open.");
                }
            }
            Command::Submit => {
                let effects = self.conversation.submit_escalation();
                if effects.is_empty() {
                    println!("Subject and name are required.");
                } else {
                    println!("Creating ticket...");
                }
                self.execute(effects);
            }
            Command::Cancel => self.conversation.cancel_escalation(),
            Command::Retry(number) => {
                let target = match number {
                    Some(n) => self.message_at(n),
                    None => self.conversation.timeline().last_error(),
                };
                match target.and_then(|id| self.conversation.retry(id)) {
                    Some(text) => {
                        self.printed = self.conversation.timeline().messages().len();
                        println!("Restored: {text}\n(press Enter to send it again)");
                    }
                    None => println!("Nothing to retry."),
                }
            }
            Command::Stop => {
                if self.conversation.stop() {
                    println!("Stopped waiting. A late reply will still show up here.");
                } else {
                    println!("Nothing to stop.");
                }
            }
            Command::Feedback(number, mark) => {
                let applied = self
                    .message_at(number)
                    .is_some_and(|id| self.conversation.set_feedback(id, mark));
                if !applied {
                    println!("Feedback applies to agent messages only.");
                }
            }
            Command::Tickets { status, query } => {
                print_tickets(&self.conversation.filter_tickets(status, &query));
            }
            Command::Sample(enabled) => {
                self.conversation.set_sample_data(enabled);
                self.printed = 0;
            }
            Command::Help => println!("{HELP}"),
            Command::Quit => return false,
            Command::Invalid(msg) => println!("{msg}"),
        }
        true
    }

    fn message_at(&self, number: usize) -> Option<MessageId> {
        let index = number.checked_sub(1)?;
        self.conversation
            .timeline()
            .messages()
            .get(index)
            .map(|m| m.id)
    }

    fn last_escalatable(&self) -> Option<MessageId> {
        self.conversation
            .timeline()
            .messages()
            .iter()
            .rev()
            .find(|m| m.can_escalate())
            .map(|m| m.id)
    }

    fn print_form(&self) {
        if let Some(form) = self.conversation.escalation().form() {
            println!("Escalation form (/field to edit, /submit, /cancel):");
            println!("  subject:  {}", form.subject);
            println!("  name:     {}", form.reporter_name);
            println!("  priority: {}", form.priority);
            println!("  notes:    {}", form.notes);
        }
    }

    fn flush_messages(&mut self) {
        let timeline = self.conversation.timeline();
        let messages = timeline.messages();
        if self.printed > messages.len() {
            self.printed = messages.len();
        }
        for (index, message) in messages.iter().enumerate().skip(self.printed) {
            if message.is_agent() || self.printed == 0 {
                println!("{}", format_message(index + 1, message, timeline.feedback(message.id)));
            }
        }
        self.printed = messages.len();
    }
}
