//! Core pipeline types.

use crate::approval::types::{ApprovalDecision, ApprovalRequest, DecisionReason};
use crate::config::FileSettings;
use std::fmt;

/// One step of a pipeline, identified by a stable key.
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineItem {
    /// Stable identity used by the resume record
    pub key: String,
    /// Whether a human must sign off before the step counts as decided
    pub requires_approval: bool,
    /// What the human would be shown
    pub request: ApprovalRequest,
}

impl PipelineItem {
    pub fn new(key: impl Into<String>, request: ApprovalRequest) -> Self {
        Self {
            key: key.into(),
            requires_approval: true,
            request,
        }
    }

    /// An item that is approved without asking anyone.
    pub fn auto(key: impl Into<String>, request: ApprovalRequest) -> Self {
        Self {
            requires_approval: false,
            ..Self::new(key, request)
        }
    }
}

/// What happened to an item during a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemOutcome {
    /// Already resolved by an earlier run; nobody was asked
    Skipped,
    Decided(ApprovalDecision),
}

impl ItemOutcome {
    pub fn decision(&self) -> Option<&ApprovalDecision> {
        match self {
            ItemOutcome::Skipped => None,
            ItemOutcome::Decided(decision) => Some(decision),
        }
    }

    pub fn is_skipped(&self) -> bool {
        matches!(self, ItemOutcome::Skipped)
    }
}

impl fmt::Display for ItemOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ItemOutcome::Skipped => write!(f, "skipped"),
            ItemOutcome::Decided(decision) => write!(f, "{}", decision),
        }
    }
}

/// A parsed pipeline file.
#[derive(Debug, Clone)]
pub struct Pipeline {
    /// Pipeline identifier, copied into every request as `pipe_id`
    pub name: Option<String>,
    pub conversation: Option<String>,
    pub settings: FileSettings,
    pub items: Vec<PipelineItem>,
}

/// Tally of a run's outcomes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunReport {
    pub skipped: usize,
    pub auto_approved: usize,
    pub approved: usize,
    pub rejected: usize,
    pub timed_out: usize,
    pub channel_errors: usize,
}

impl RunReport {
    pub fn from_outcomes(outcomes: &[(PipelineItem, ItemOutcome)]) -> Self {
        let mut report = RunReport::default();
        for (item, outcome) in outcomes {
            match outcome {
                ItemOutcome::Skipped => report.skipped += 1,
                ItemOutcome::Decided(decision) => match (decision.reason(), decision.approved()) {
                    (DecisionReason::UserResponse, true) if !item.requires_approval => {
                        report.auto_approved += 1
                    }
                    (DecisionReason::UserResponse, true) => report.approved += 1,
                    (DecisionReason::UserResponse, false) => report.rejected += 1,
                    (DecisionReason::Timeout, _) => report.timed_out += 1,
                    (DecisionReason::ChannelError, _) => report.channel_errors += 1,
                },
            }
        }
        report
    }

    pub fn decided(&self) -> usize {
        self.auto_approved + self.approved + self.rejected + self.timed_out + self.channel_errors
    }

    pub fn one_line(&self) -> String {
        format!(
            "{} decided | {} approved | {} auto | {} rejected | {} timed out | {} errors | {} skipped",
            self.decided(),
            self.approved,
            self.auto_approved,
            self.rejected,
            self.timed_out,
            self.channel_errors,
            self.skipped
        )
    }
}
