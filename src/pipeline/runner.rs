//! Pipeline runner: walks items in order and resolves each one once.
//!
//! For every item:
//! 1. Already in the run state? Report it as skipped, ask nobody.
//! 2. No approval needed? Approve it on the spot.
//! 3. Otherwise ask through the gate.
//! 4. Persist the key before moving on, whatever the outcome.

use crate::approval::types::ApprovalDecision;
use crate::approval::ApprovalChannel;
use crate::config::DEFAULT_TIMEOUT;
use crate::gate::ApprovalGate;
use crate::journal::{DecisionJournal, JournalEntry};
use crate::pipeline::types::{ItemOutcome, PipelineItem};
use crate::state::{RunState, StateError};
use std::sync::Arc;
use std::time::Duration;

/// Drives a pipeline through the approval gate.
pub struct PipelineRunner {
    gate: ApprovalGate,
    channel: Arc<dyn ApprovalChannel>,
    timeout: Duration,
    /// Run id and journal for the audit trail
    journal: Option<(String, DecisionJournal)>,
}

impl PipelineRunner {
    pub fn new(gate: ApprovalGate, channel: Arc<dyn ApprovalChannel>) -> Self {
        Self {
            gate,
            channel,
            timeout: DEFAULT_TIMEOUT,
            journal: None,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_journal(mut self, run_id: impl Into<String>, journal: DecisionJournal) -> Self {
        self.journal = Some((run_id.into(), journal));
        self
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Resolve every item in order.
    ///
    /// Rejections, timeouts and channel failures never stop the run. The
    /// only error is a failure to persist the run state, since carrying on
    /// would mean asking the same question again next time.
    pub async fn run(
        &mut self,
        items: &[PipelineItem],
        state: &mut RunState,
    ) -> Result<Vec<(PipelineItem, ItemOutcome)>, StateError> {
        let mut outcomes = Vec::with_capacity(items.len());

        for item in items {
            if state.contains(&item.key) {
                tracing::debug!(key = %item.key, "already resolved, skipping");
                outcomes.push((item.clone(), ItemOutcome::Skipped));
                continue;
            }

            let decision = if item.requires_approval {
                self.gate
                    .decide(item.request.clone(), self.channel.clone(), self.timeout)
                    .await
            } else {
                tracing::debug!(key = %item.key, "no approval required, auto-approving");
                ApprovalDecision::user(true)
            };

            tracing::info!(key = %item.key, %decision, "item resolved");
            state.mark_done(item.key.clone())?;
            self.record(item, &decision);

            outcomes.push((item.clone(), ItemOutcome::Decided(decision)));
        }

        Ok(outcomes)
    }

    /// Journal failures are logged, not fatal.
    fn record(&mut self, item: &PipelineItem, decision: &ApprovalDecision) {
        if let Some((run_id, journal)) = self.journal.as_mut() {
            let entry = JournalEntry::new(
                run_id,
                &item.key,
                &item.request,
                item.requires_approval,
                decision,
            );
            if let Err(e) = journal.record(&entry) {
                tracing::error!("Failed to write decision journal: {:#}", e);
            }
        }
    }
}
