//! Agent-activity stream.
//!
//! A server-pushed feed of connection state and progress events keyed by the
//! session id. The chat core never reacts to it; events are handed to the
//! presentation layer as they arrive.

use futures::StreamExt;
use reqwest::Client;
use reqwest_eventsource::{Event, RequestBuilderExt};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::mpsc;

use crate::agent::error::AgentError;

#[derive(Debug, Clone, PartialEq)]
pub enum ActivityEvent {
    Connected,
    Disconnected { reason: Option<String> },
    Progress(ProgressEvent),
}

/// One progress update. Unknown payloads keep their raw text in `message`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProgressEvent {
    #[serde(default)]
    pub agent_id: Option<String>,
    #[serde(default, alias = "type", alias = "event_type")]
    pub kind: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

impl ProgressEvent {
    pub fn parse(data: &str) -> Self {
        match serde_json::from_str::<Value>(data) {
            Ok(value @ Value::Object(_)) => {
                serde_json::from_value(value).unwrap_or_else(|_| Self::raw(data))
            }
            _ => Self::raw(data),
        }
    }

    fn raw(data: &str) -> Self {
        Self {
            message: Some(data.to_string()),
            ..Self::default()
        }
    }
}

/// Subscribe to the activity feed for `session_id`.
///
/// The stream runs on a background task until the server closes it or the
/// receiver is dropped.
pub fn subscribe(
    client: &Client,
    url: &str,
    session_id: &str,
) -> Result<mpsc::UnboundedReceiver<ActivityEvent>, AgentError> {
    let mut events = client
        .get(url)
        .query(&[("session_id", session_id)])
        .eventsource()
        .map_err(|err| AgentError::Transport(err.to_string()))?;

    let (tx, rx) = mpsc::unbounded_channel();
    tokio::spawn(async move {
        while let Some(event) = events.next().await {
            let forwarded = match event {
                Ok(Event::Open) => ActivityEvent::Connected,
                Ok(Event::Message(msg)) => ActivityEvent::Progress(ProgressEvent::parse(&msg.data)),
                Err(err) => {
                    tracing::debug!(error = %err, "Activity stream ended");
                    let _ = tx.send(ActivityEvent::Disconnected {
                        reason: Some(err.to_string()),
                    });
                    events.close();
                    break;
                }
            };
            if tx.send(forwarded).is_err() {
                events.close();
                break;
            }
        }
    });

    Ok(rx)
}
