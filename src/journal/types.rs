//! Types for the decision journal.
//!
//! Every decided pipeline item gets one entry: who asked, what was asked,
//! and how it was resolved. Skipped items are not journaled; they were
//! journaled by the run that decided them.

use crate::approval::types::{ApprovalDecision, ApprovalRequest, DecisionReason};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A single entry in the decision journal.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JournalEntry {
    /// When the decision was made
    pub timestamp: DateTime<Utc>,

    /// Run identifier (UUID, generated at `stepgate run` start)
    pub run_id: String,

    /// Pipeline item key
    pub item_key: String,

    pub agent_id: String,
    pub agent_name: String,

    /// The action or question that was reviewed
    pub query: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub pipe_id: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub conversation_id: Option<String>,

    /// Whether the item went through a channel at all
    pub required_approval: bool,

    pub approved: bool,
    pub reason: DecisionReason,
}

impl JournalEntry {
    pub fn new(
        run_id: &str,
        item_key: &str,
        request: &ApprovalRequest,
        required_approval: bool,
        decision: &ApprovalDecision,
    ) -> Self {
        Self {
            timestamp: Utc::now(),
            run_id: run_id.to_string(),
            item_key: item_key.to_string(),
            agent_id: request.agent_id().to_string(),
            agent_name: request.agent_name().to_string(),
            query: request.query().to_string(),
            pipe_id: request.pipe_id().map(str::to_string),
            conversation_id: request.conversation_id().map(str::to_string),
            required_approval,
            approved: decision.approved(),
            reason: decision.reason(),
        }
    }
}

/// Summary statistics for a run's journal.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RunSummary {
    pub run_id: String,
    pub total: usize,
    pub auto_approved: usize,
    pub approved: usize,
    pub rejected: usize,
    pub timed_out: usize,
    pub channel_errors: usize,
    pub start_time: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,
}

impl RunSummary {
    /// Format as a human-readable one-liner for terminal output.
    pub fn one_line(&self) -> String {
        format!(
            "{} decisions | {} approved | {} auto | {} rejected | {} timed out | {} channel errors",
            self.total,
            self.approved,
            self.auto_approved,
            self.rejected,
            self.timed_out,
            self.channel_errors
        )
    }
}

/// Filter criteria for querying the journal.
#[derive(Debug, Clone, Default)]
pub struct JournalFilter {
    pub reason: Option<DecisionReason>,
    pub approved: Option<bool>,
    pub agent_id: Option<String>,
    pub limit: Option<usize>,
}
