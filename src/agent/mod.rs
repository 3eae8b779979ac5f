pub mod activity;
pub mod backend;
pub mod error;
pub mod http;
pub mod mock;
pub mod response;
pub mod roster;

pub use activity::{ActivityEvent, ProgressEvent};
pub use backend::{AgentBackend, InvokeRequest};
pub use error::AgentError;
pub use http::HttpBackend;
pub use response::{
    normalize, normalize_escalation, AgentResponse, AnswerSource, Confidence, InvokeResult,
    NormalizedAgentResult, ReplyPayload, StructuredReply,
};
pub use roster::{AgentInfo, COORDINATOR_AGENT_ID};
