//! `stepgate run`: walk a pipeline through the approval gate.
//!
//! 1. Parse the pipeline file and resolve settings
//! 2. Load the run state (resume record)
//! 3. Pick the approval channel
//! 4. Open the decision journal
//! 5. Resolve every item in order
//! 6. Print per-item results and a summary

use crate::approval::{ApprovalChannel, AutoApprove, AutoDeny, ConsoleChannel};
use crate::config::{ApprovalMode, CliOverrides, Settings};
use crate::gate::ApprovalGate;
use crate::journal::DecisionJournal;
use crate::pipeline::{parser, ItemOutcome, Pipeline, PipelineItem, PipelineRunner, RunReport};
use crate::state::RunState;
use anyhow::{Context, Result};
use colored::Colorize;
use std::path::PathBuf;
use std::sync::Arc;

/// Options for the `stepgate run` command.
#[derive(Debug)]
pub struct RunOptions {
    /// Path to the pipeline file
    pub pipeline_path: PathBuf,
    /// Settings given on the command line
    pub overrides: CliOverrides,
    /// Which channel answers approvals
    pub approval_mode: ApprovalMode,
    /// Write a decision journal under ~/.stepgate/logs
    pub journal: bool,
    /// Run ID override (default: auto-generated UUID)
    pub run_id: Option<String>,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            pipeline_path: PathBuf::from("pipeline.yaml"),
            overrides: CliOverrides::default(),
            approval_mode: ApprovalMode::default(),
            journal: true,
            run_id: None,
        }
    }
}

/// A parsed pipeline with its settings resolved, ready to run.
#[derive(Debug)]
pub struct RunPlan {
    pub options: RunOptions,
    pub pipeline: Pipeline,
    pub settings: Settings,
}

impl RunPlan {
    /// Parse the pipeline file once and merge its settings under the
    /// command-line overrides.
    pub fn resolve(options: RunOptions) -> Result<Self> {
        let pipeline = parser::parse_pipeline_file(&options.pipeline_path)?;
        let settings = Settings::merge(&pipeline.settings, &options.overrides);
        Ok(Self {
            options,
            pipeline,
            settings,
        })
    }
}

/// Run the `stepgate run` command.
pub async fn run_pipeline(plan: RunPlan) -> Result<()> {
    let RunPlan {
        options,
        pipeline,
        settings,
    } = plan;
    let run_id = options
        .run_id
        .clone()
        .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());

    println!();
    println!(
        "  {} stepgate v{}",
        "⛩".to_string().bold(),
        env!("CARGO_PKG_VERSION")
    );
    println!("  Run:      {}", short_id(&run_id).cyan());
    println!(
        "  Pipeline: {} ({} items)",
        pipeline.name.as_deref().unwrap_or("unnamed").cyan(),
        pipeline.items.len()
    );

    let mut state = RunState::load(&settings.state_file);
    println!(
        "  State:    {} ({} already resolved)",
        settings.state_file.display().to_string().dimmed(),
        state.len()
    );
    println!("  Timeout:  {:?} per approval", settings.timeout);

    let channel: Arc<dyn ApprovalChannel> = match options.approval_mode {
        ApprovalMode::AutoApprove => Arc::new(AutoApprove),
        ApprovalMode::AutoDeny => Arc::new(AutoDeny),
        ApprovalMode::Console => Arc::new(ConsoleChannel::stdin(settings.presentation)),
    };

    let mut runner = PipelineRunner::new(ApprovalGate::new(settings.presentation), channel)
        .with_timeout(settings.timeout);

    if options.journal {
        match DecisionJournal::new(&run_id) {
            Ok(journal) => {
                println!(
                    "  Journal:  {}",
                    journal.path().display().to_string().dimmed()
                );
                runner = runner.with_journal(run_id.clone(), journal);
            }
            Err(e) => {
                tracing::warn!("Decision journal disabled: {:#}", e);
            }
        }
    }
    println!();

    let outcomes = runner
        .run(&pipeline.items, &mut state)
        .await
        .context("Run stopped: the resume record could not be saved")?;

    print_outcomes(&outcomes);
    Ok(())
}

fn print_outcomes(outcomes: &[(PipelineItem, ItemOutcome)]) {
    println!();
    for (item, outcome) in outcomes {
        println!("  {} {}", outcome_marker(item, outcome), item.key.bold());
    }

    let report = RunReport::from_outcomes(outcomes);
    println!();
    println!(
        "  {} {}",
        "─".repeat(40).dimmed(),
        report.one_line().dimmed()
    );
    println!();
}

fn outcome_marker(item: &PipelineItem, outcome: &ItemOutcome) -> String {
    use crate::approval::DecisionReason;

    match outcome {
        ItemOutcome::Skipped => format!("{} {:<9}", "↷".dimmed(), "skipped".dimmed()),
        ItemOutcome::Decided(decision) => match (decision.reason(), decision.approved()) {
            (DecisionReason::UserResponse, true) if !item.requires_approval => {
                format!("{} {:<9}", "✓".blue(), "auto".blue())
            }
            (DecisionReason::UserResponse, true) => {
                format!("{} {:<9}", "✓".green(), "approved".green())
            }
            (DecisionReason::UserResponse, false) => {
                format!("{} {:<9}", "✗".red(), "rejected".red())
            }
            (DecisionReason::Timeout, _) => format!("{} {:<9}", "⏱".yellow(), "timeout".yellow()),
            (DecisionReason::ChannelError, _) => {
                format!("{} {:<9}", "!".magenta(), "error".magenta())
            }
        },
    }
}

fn short_id(run_id: &str) -> &str {
    run_id.get(..8).unwrap_or(run_id)
}
