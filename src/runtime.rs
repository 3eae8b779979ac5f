//! Effect executor.
//!
//! The [`Runtime`] runs what the conversation reducer asks for: backend calls
//! and stuck-request timers are spawned on tokio and report back as
//! [`AppEvent`]s on an unbounded channel; notifications are handed back to
//! the caller for display.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;

use crate::agent::{ActivityEvent, AgentBackend};
use crate::chat::{AppEvent, Effect, Notification};

pub struct Runtime {
    backend: Arc<dyn AgentBackend>,
    request_timeout: Duration,
    event_tx: mpsc::UnboundedSender<AppEvent>,
}

impl Runtime {
    pub fn new(
        backend: Arc<dyn AgentBackend>,
        request_timeout: Duration,
    ) -> (Self, mpsc::UnboundedReceiver<AppEvent>) {
        let (event_tx, event_rx) = mpsc::unbounded_channel();
        (
            Self {
                backend,
                request_timeout,
                event_tx,
            },
            event_rx,
        )
    }

    pub fn event_sender(&self) -> mpsc::UnboundedSender<AppEvent> {
        self.event_tx.clone()
    }

    /// Execute effects, returning the notifications among them.
    pub fn execute(&self, effects: Vec<Effect>) -> Vec<Notification> {
        let mut notifications = Vec::new();
        for effect in effects {
            match effect {
                Effect::Invoke {
                    request_id,
                    request,
                } => {
                    let backend = self.backend.clone();
                    let event_tx = self.event_tx.clone();
                    tokio::spawn(async move {
                        tracing::debug!(request_id = %request_id, "Backend call started");
                        let outcome = backend.invoke(request).await;
                        tracing::debug!(
                            request_id = %request_id,
                            ok = outcome.is_ok(),
                            "Backend call finished"
                        );
                        let _ = event_tx.send(AppEvent::BackendCompleted {
                            request_id,
                            outcome,
                        });
                    });
                }
                Effect::ArmTimeout { request_id, guard } => {
                    let event_tx = self.event_tx.clone();
                    let timeout = self.request_timeout;
                    tokio::spawn(async move {
                        tokio::select! {
                            _ = guard.cancelled() => {}
                            _ = tokio::time::sleep(timeout) => {
                                let _ = event_tx.send(AppEvent::TimedOut { request_id });
                            }
                        }
                    });
                }
                Effect::Notify(notification) => notifications.push(notification),
            }
        }
        notifications
    }

    /// Forward an activity feed into the event channel.
    pub fn forward_activity(&self, mut activity: mpsc::UnboundedReceiver<ActivityEvent>) {
        let event_tx = self.event_tx.clone();
        tokio::spawn(async move {
            while let Some(event) = activity.recv().await {
                if event_tx.send(AppEvent::Activity(event)).is_err() {
                    break;
                }
            }
        });
    }
}
