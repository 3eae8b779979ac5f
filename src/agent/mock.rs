//! Mock backend for deterministic testing
//!
//! Implements [`AgentBackend`] by replaying scripted replies instead of making
//! network calls, and captures every request for later verification.
//!
//! # Example
//! ```no_run
//! use supportdesk::agent::mock::{MockBackend, MockReply};
//! use supportdesk::agent::response::{AgentResponse, StructuredReply};
//!
//! let backend = MockBackend::new().with_reply(MockReply::success(
//!     AgentResponse::structured(StructuredReply {
//!         answer: Some("Try restarting the VPN client.".into()),
//!         ..StructuredReply::default()
//!     }),
//! ));
//! ```

use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::agent::backend::{AgentBackend, InvokeRequest};
use crate::agent::error::AgentError;
use crate::agent::response::{AgentResponse, InvokeResult};

/// One scripted reply.
#[derive(Debug, Clone)]
pub struct MockReply {
    pub outcome: Result<InvokeResult, AgentError>,
    /// How long the call takes to complete
    pub delay: Duration,
}

impl MockReply {
    pub fn success(response: AgentResponse) -> Self {
        Self::envelope(InvokeResult::ok(response))
    }

    pub fn envelope(result: InvokeResult) -> Self {
        Self {
            outcome: Ok(result),
            delay: Duration::ZERO,
        }
    }

    /// Call completes but the envelope reports failure.
    pub fn reported_failure(message: Option<&str>, error: Option<&str>) -> Self {
        Self::envelope(InvokeResult {
            success: false,
            response: message.map(|m| AgentResponse {
                message: Some(m.to_string()),
                result: None,
            }),
            error: error.map(str::to_string),
        })
    }

    /// The call itself fails.
    pub fn transport_failure() -> Self {
        Self {
            outcome: Err(AgentError::Transport("connection refused".into())),
            delay: Duration::ZERO,
        }
    }

    pub fn after(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }
}

/// Mock backend for testing
#[derive(Clone, Default)]
pub struct MockBackend {
    replies: Arc<Mutex<VecDeque<MockReply>>>,
    captured: Arc<Mutex<Vec<InvokeRequest>>>,
}

impl MockBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a reply (replies are consumed in order)
    pub fn with_reply(self, reply: MockReply) -> Self {
        self.push_reply(reply);
        self
    }

    pub fn push_reply(&self, reply: MockReply) {
        self.replies.lock().push_back(reply);
    }

    /// All requests received so far
    pub fn captured_requests(&self) -> Vec<InvokeRequest> {
        self.captured.lock().clone()
    }

    pub fn call_count(&self) -> usize {
        self.captured.lock().len()
    }
}

#[async_trait]
impl AgentBackend for MockBackend {
    async fn invoke(&self, request: InvokeRequest) -> Result<InvokeResult, AgentError> {
        self.captured.lock().push(request);
        let reply = self.replies.lock().pop_front();
        let Some(reply) = reply else {
            return Err(AgentError::Transport("no scripted reply".into()));
        };
        if !reply.delay.is_zero() {
            tokio::time::sleep(reply.delay).await;
        }
        reply.outcome
    }
}
