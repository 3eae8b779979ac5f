use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;

use crate::agent::backend::{AgentBackend, InvokeRequest};
use crate::agent::error::AgentError;
use crate::agent::response::InvokeResult;

/// Backend reached over HTTP: one JSON POST per call.
#[derive(Clone)]
pub struct HttpBackend {
    endpoint: String,
    client: Client,
}

impl HttpBackend {
    /// Share `client` with the activity stream so both reuse one pool.
    pub fn with_client(endpoint: impl Into<String>, client: Client) -> Self {
        Self {
            endpoint: endpoint.into(),
            client,
        }
    }
}

#[async_trait]
impl AgentBackend for HttpBackend {
    async fn invoke(&self, request: InvokeRequest) -> Result<InvokeResult, AgentError> {
        tracing::debug!(
            endpoint = %self.endpoint,
            agent_id = %request.agent_id,
            session_id = %request.session_id,
            "Invoking backend"
        );

        let response = self.client.post(&self.endpoint).json(&request).send().await?;
        let status = response.status();
        let text = response.text().await?;

        // Failure envelopes often come with a non-2xx status; prefer the body when it parses.
        match serde_json::from_str::<Value>(&text) {
            Ok(value) => Ok(InvokeResult::from(value)),
            Err(_) if !status.is_success() => Err(AgentError::Http {
                status: status.as_u16(),
                body: text,
            }),
            Err(err) => Err(AgentError::Decode(format!("{err} - {text}"))),
        }
    }
}
