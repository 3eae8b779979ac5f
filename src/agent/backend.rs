use async_trait::async_trait;
use serde::Serialize;

use crate::agent::error::AgentError;
use crate::agent::response::InvokeResult;
use crate::session::SessionContext;

/// Body of one backend call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InvokeRequest {
    pub message: String,
    pub agent_id: String,
    pub session_id: String,
    pub user_id: String,
}

impl InvokeRequest {
    pub fn new(message: impl Into<String>, agent_id: impl Into<String>, context: &SessionContext) -> Self {
        Self {
            message: message.into(),
            agent_id: agent_id.into(),
            session_id: context.session_id.clone(),
            user_id: context.user_id.clone(),
        }
    }
}

/// The request/response contract of the reasoning backend.
///
/// `Ok` means the call completed, even if the envelope reports failure;
/// `Err` means the call itself failed.
#[async_trait]
pub trait AgentBackend: Send + Sync {
    async fn invoke(&self, request: InvokeRequest) -> Result<InvokeResult, AgentError>;
}
