//! Types for the approval flow.
//!
//! `ApprovalRequest` is what a pipeline step hands to the gate, and
//! `ApprovalDecision` is what always comes back, whether a human answered,
//! nobody answered, or the channel broke.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Errors raised while building an approval request.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RequestError {
    #[error("agent_id must not be empty")]
    EmptyAgentId,
    #[error("agent_name must not be empty")]
    EmptyAgentName,
}

/// A request for human approval of one pipeline step.
///
/// Fields are private so every request, built or deserialized, has a
/// non-empty agent id and name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawRequest")]
pub struct ApprovalRequest {
    /// Unique per logical agent
    agent_id: String,
    /// Display label for the agent
    agent_name: String,
    /// The action or question under review
    query: String,
    /// Whatever the reviewed step produced (structured or text)
    pre_result: serde_json::Value,
    /// Pipeline / run this request belongs to
    #[serde(skip_serializing_if = "Option::is_none")]
    pipe_id: Option<String>,
    /// Multi-turn context the request belongs to
    #[serde(skip_serializing_if = "Option::is_none")]
    conversation_id: Option<String>,
}

/// Unvalidated wire form of an `ApprovalRequest`.
#[derive(Deserialize)]
struct RawRequest {
    agent_id: String,
    agent_name: String,
    #[serde(default)]
    query: String,
    #[serde(default)]
    pre_result: serde_json::Value,
    #[serde(default)]
    pipe_id: Option<String>,
    #[serde(default)]
    conversation_id: Option<String>,
}

impl TryFrom<RawRequest> for ApprovalRequest {
    type Error = RequestError;

    fn try_from(raw: RawRequest) -> Result<Self, Self::Error> {
        let mut request =
            ApprovalRequest::new(raw.agent_id, raw.agent_name, raw.query, raw.pre_result)?;
        request.pipe_id = raw.pipe_id;
        request.conversation_id = raw.conversation_id;
        Ok(request)
    }
}

impl ApprovalRequest {
    pub fn new(
        agent_id: impl Into<String>,
        agent_name: impl Into<String>,
        query: impl Into<String>,
        pre_result: impl Into<serde_json::Value>,
    ) -> Result<Self, RequestError> {
        let agent_id = agent_id.into();
        let agent_name = agent_name.into();
        if agent_id.trim().is_empty() {
            return Err(RequestError::EmptyAgentId);
        }
        if agent_name.trim().is_empty() {
            return Err(RequestError::EmptyAgentName);
        }
        Ok(Self {
            agent_id,
            agent_name,
            query: query.into(),
            pre_result: pre_result.into(),
            pipe_id: None,
            conversation_id: None,
        })
    }

    pub fn with_pipe_id(mut self, pipe_id: impl Into<String>) -> Self {
        self.pipe_id = Some(pipe_id.into());
        self
    }

    pub fn with_conversation_id(mut self, conversation_id: impl Into<String>) -> Self {
        self.conversation_id = Some(conversation_id.into());
        self
    }

    pub fn agent_id(&self) -> &str {
        &self.agent_id
    }

    pub fn agent_name(&self) -> &str {
        &self.agent_name
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn pre_result(&self) -> &serde_json::Value {
        &self.pre_result
    }

    pub fn pipe_id(&self) -> Option<&str> {
        self.pipe_id.as_deref()
    }

    pub fn conversation_id(&self) -> Option<&str> {
        self.conversation_id.as_deref()
    }
}

/// Why a decision came out the way it did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DecisionReason {
    /// A human (or remote system) answered
    UserResponse,
    /// Nobody answered within the time budget
    Timeout,
    /// The channel failed before producing an answer
    ChannelError,
}

impl fmt::Display for DecisionReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DecisionReason::UserResponse => write!(f, "user_response"),
            DecisionReason::Timeout => write!(f, "timeout"),
            DecisionReason::ChannelError => write!(f, "channel_error"),
        }
    }
}

impl DecisionReason {
    /// Parse a reason from a string (used by CLI filters).
    pub fn from_str_loose(s: &str) -> Option<DecisionReason> {
        match s.to_lowercase().trim() {
            "user_response" | "user" | "human" | "response" => Some(DecisionReason::UserResponse),
            "timeout" | "timed_out" | "expired" => Some(DecisionReason::Timeout),
            "channel_error" | "error" | "channel" => Some(DecisionReason::ChannelError),
            _ => None,
        }
    }
}

/// The outcome of one approval. Fields are private so a timeout or
/// channel error can never be built with `approved = true`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ApprovalDecision {
    approved: bool,
    reason: DecisionReason,
}

impl ApprovalDecision {
    /// A decision that came from a human answer.
    pub fn user(approved: bool) -> Self {
        Self {
            approved,
            reason: DecisionReason::UserResponse,
        }
    }

    pub fn timeout() -> Self {
        Self {
            approved: false,
            reason: DecisionReason::Timeout,
        }
    }

    pub fn channel_error() -> Self {
        Self {
            approved: false,
            reason: DecisionReason::ChannelError,
        }
    }

    pub fn approved(&self) -> bool {
        self.approved
    }

    pub fn reason(&self) -> DecisionReason {
        self.reason
    }
}

impl fmt::Display for ApprovalDecision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let verdict = if self.approved { "approved" } else { "rejected" };
        write!(f, "{} ({})", verdict, self.reason)
    }
}
