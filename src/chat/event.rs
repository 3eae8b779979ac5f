use crate::agent::{ActivityEvent, AgentError, InvokeResult};

/// Correlates a backend call with its completion and its stuck-request timer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RequestId(pub u64);

impl std::fmt::Display for RequestId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "req-{}", self.0)
    }
}

/// Application-level events fed back into the conversation
#[derive(Debug, Clone)]
pub enum AppEvent {
    /// A backend call finished (successfully or not)
    BackendCompleted {
        request_id: RequestId,
        outcome: Result<InvokeResult, AgentError>,
    },

    /// The stuck-request timer for a call elapsed
    TimedOut { request_id: RequestId },

    /// Agent activity pushed by the backend, display only
    Activity(ActivityEvent),
}
