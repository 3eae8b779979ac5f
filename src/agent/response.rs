//! Backend reply types and the reply normalizer.
//!
//! The backend's reply schema varies with the sub-agent that produced it, so
//! the raw envelope is decoded from `serde_json::Value` into a small sum type
//! and then mapped into a fixed [`NormalizedAgentResult`]. Both steps are
//! total: any JSON value yields a result, missing information falls back to
//! safe defaults.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Answer used when no candidate location carries any text.
pub const FALLBACK_ANSWER: &str =
    "Response received. Please try rephrasing if the answer seems incomplete.";

/// Answer used for an escalation reply that carries no text.
pub const ESCALATION_FALLBACK_ANSWER: &str = "Your issue has been escalated.";

/// Envelope returned by the backend call.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InvokeResult {
    pub success: bool,
    pub response: Option<AgentResponse>,
    pub error: Option<String>,
}

impl InvokeResult {
    /// Successful envelope with the given response body.
    pub fn ok(response: AgentResponse) -> Self {
        Self {
            success: true,
            response: Some(response),
            error: None,
        }
    }

    /// Failed envelope carrying an error string.
    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            success: false,
            response: None,
            error: Some(error.into()),
        }
    }

    /// `response.message`, if the backend supplied one.
    pub fn response_message(&self) -> Option<&str> {
        self.response.as_ref().and_then(|r| r.message.as_deref())
    }

    /// Best human-readable explanation of a reported failure.
    pub fn failure_message(&self) -> Option<&str> {
        self.response_message().or(self.error.as_deref())
    }
}

impl From<Value> for InvokeResult {
    fn from(value: Value) -> Self {
        let Value::Object(mut map) = value else {
            return Self::default();
        };
        Self {
            success: map.get("success") == Some(&Value::Bool(true)),
            response: map.remove("response").and_then(AgentResponse::from_value),
            error: map.remove("error").and_then(non_empty_text),
        }
    }
}

/// The `response` member of the envelope.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AgentResponse {
    pub message: Option<String>,
    pub result: Option<ReplyPayload>,
}

impl AgentResponse {
    fn from_value(value: Value) -> Option<Self> {
        let Value::Object(mut map) = value else {
            return None;
        };
        Some(Self {
            message: map.remove("message").and_then(non_empty_text),
            result: map.remove("result").map(ReplyPayload::from),
        })
    }

    /// Response whose result is a structured reply.
    pub fn structured(reply: StructuredReply) -> Self {
        Self {
            message: None,
            result: Some(ReplyPayload::Structured(reply)),
        }
    }

    /// Response whose result is plain text.
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            message: None,
            result: Some(ReplyPayload::Text(text.into())),
        }
    }

    fn structured_reply(&self) -> Option<&StructuredReply> {
        match &self.result {
            Some(ReplyPayload::Structured(reply)) => Some(reply),
            _ => None,
        }
    }
}

/// The known shapes of `response.result`.
#[derive(Debug, Clone, PartialEq)]
pub enum ReplyPayload {
    /// A plain string result.
    Text(String),
    /// An object carrying some of the known reply fields.
    Structured(StructuredReply),
    /// Anything else (numbers, arrays, booleans, null).
    Opaque(Value),
}

impl From<Value> for ReplyPayload {
    fn from(value: Value) -> Self {
        match value {
            Value::String(text) => ReplyPayload::Text(text),
            Value::Object(map) => ReplyPayload::Structured(StructuredReply::from_map(map)),
            other => ReplyPayload::Opaque(other),
        }
    }
}

/// Known fields of an object-shaped reply.
///
/// Text fields are `Some` only for non-empty strings. Flags are true only for
/// the literal JSON `true`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StructuredReply {
    pub answer: Option<String>,
    pub source: Option<String>,
    pub escalated: bool,
    pub ticket_id: Option<String>,
    pub ticket_subject: Option<String>,
    pub email_sent: bool,
    pub confidence: Option<String>,
    pub requires_escalation: bool,
    pub text: Option<String>,
    pub response: Option<String>,
    pub message: Option<String>,
}

impl StructuredReply {
    fn from_map(mut map: Map<String, Value>) -> Self {
        let mut take_text = |key: &str| map.remove(key).and_then(non_empty_text);
        let answer = take_text("answer");
        let source = take_text("source");
        let ticket_id = take_text("ticket_id");
        let ticket_subject = take_text("ticket_subject");
        let confidence = take_text("confidence");
        let text = take_text("text");
        let response = take_text("response");
        let message = take_text("message");
        Self {
            answer,
            source,
            escalated: is_literal_true(&map, "escalated"),
            ticket_id,
            ticket_subject,
            email_sent: is_literal_true(&map, "email_sent"),
            confidence,
            requires_escalation: is_literal_true(&map, "requires_escalation"),
            text,
            response,
            message,
        }
    }
}

fn non_empty_text(value: Value) -> Option<String> {
    match value {
        Value::String(s) if !s.is_empty() => Some(s),
        _ => None,
    }
}

fn is_literal_true(map: &Map<String, Value>, key: &str) -> bool {
    map.get(key) == Some(&Value::Bool(true))
}

/// Where an answer came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnswerSource {
    KnowledgeBase,
    WebSearch,
    Escalation,
    Combined,
    Unspecified,
}

impl AnswerSource {
    /// Parse a backend source tag; absent means knowledge base, unknown means unspecified.
    pub fn parse(raw: Option<&str>) -> Self {
        let Some(raw) = raw else {
            return AnswerSource::KnowledgeBase;
        };
        match raw.trim().to_lowercase().as_str() {
            "knowledge_base" => AnswerSource::KnowledgeBase,
            "web_search" => AnswerSource::WebSearch,
            "escalation" => AnswerSource::Escalation,
            "combined" => AnswerSource::Combined,
            _ => AnswerSource::Unspecified,
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            AnswerSource::KnowledgeBase => "Knowledge Base",
            AnswerSource::WebSearch => "Web Search",
            AnswerSource::Escalation => "Escalation",
            AnswerSource::Combined => "Combined",
            AnswerSource::Unspecified => "",
        }
    }
}

/// Backend's confidence in an answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Confidence {
    High,
    #[default]
    Medium,
    Low,
}

impl Confidence {
    /// Case-insensitive parse; anything unrecognised is medium.
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_lowercase().as_str() {
            "high" => Confidence::High,
            "low" => Confidence::Low,
            _ => Confidence::Medium,
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Confidence::High => "High Confidence",
            Confidence::Medium => "Medium Confidence",
            Confidence::Low => "Low Confidence",
        }
    }
}

/// Fixed-shape view of a backend reply.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NormalizedAgentResult {
    pub answer: String,
    pub source: AnswerSource,
    pub escalated: bool,
    pub ticket_id: Option<String>,
    pub ticket_subject: Option<String>,
    pub email_sent: bool,
    pub confidence: Confidence,
    pub requires_escalation: bool,
}

impl Default for NormalizedAgentResult {
    fn default() -> Self {
        Self {
            answer: FALLBACK_ANSWER.to_string(),
            source: AnswerSource::KnowledgeBase,
            escalated: false,
            ticket_id: None,
            ticket_subject: None,
            email_sent: false,
            confidence: Confidence::Medium,
            requires_escalation: false,
        }
    }
}

/// First non-empty answer text, in fixed priority order.
fn extract_answer(response: &AgentResponse) -> Option<String> {
    let reply = response.structured_reply();
    reply
        .and_then(|r| r.answer.clone())
        .or_else(|| response.message.clone())
        .or_else(|| match &response.result {
            Some(ReplyPayload::Text(text)) if !text.is_empty() => Some(text.clone()),
            _ => None,
        })
        .or_else(|| reply.and_then(|r| r.text.clone()))
        .or_else(|| reply.and_then(|r| r.response.clone()))
        .or_else(|| reply.and_then(|r| r.message.clone()))
}

/// Normalize the reply of an ordinary turn. Never fails.
pub fn normalize(response: Option<&AgentResponse>) -> NormalizedAgentResult {
    let Some(response) = response else {
        return NormalizedAgentResult::default();
    };
    let answer = extract_answer(response).unwrap_or_else(|| FALLBACK_ANSWER.to_string());

    match response.structured_reply() {
        Some(reply) => NormalizedAgentResult {
            answer,
            source: AnswerSource::parse(reply.source.as_deref()),
            escalated: reply.escalated,
            ticket_id: reply.ticket_id.clone(),
            ticket_subject: reply.ticket_subject.clone(),
            email_sent: reply.email_sent,
            confidence: reply
                .confidence
                .as_deref()
                .map(Confidence::parse)
                .unwrap_or_default(),
            requires_escalation: reply.requires_escalation,
        },
        None => NormalizedAgentResult {
            answer,
            ..NormalizedAgentResult::default()
        },
    }
}

/// Normalize the reply of an escalation submission.
///
/// The result is always tagged as an escalation with a ticket reference: the
/// subject falls back to `subject` and the ticket id to `fallback_ticket_id`.
pub fn normalize_escalation(
    response: Option<&AgentResponse>,
    subject: &str,
    fallback_ticket_id: impl FnOnce() -> String,
) -> NormalizedAgentResult {
    let reply = response.and_then(|r| r.structured_reply());
    let answer = response
        .and_then(extract_answer)
        .unwrap_or_else(|| ESCALATION_FALLBACK_ANSWER.to_string());

    NormalizedAgentResult {
        answer,
        source: AnswerSource::Escalation,
        escalated: true,
        ticket_id: Some(
            reply
                .and_then(|r| r.ticket_id.clone())
                .unwrap_or_else(fallback_ticket_id),
        ),
        ticket_subject: Some(
            reply
                .and_then(|r| r.ticket_subject.clone())
                .unwrap_or_else(|| subject.to_string()),
        ),
        email_sent: reply.is_some_and(|r| r.email_sent),
        confidence: reply
            .and_then(|r| r.confidence.as_deref())
            .map(Confidence::parse)
            .unwrap_or(Confidence::High),
        requires_escalation: false,
    }
}
