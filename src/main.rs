//! stepgate: ask a human before an agent pipeline does something risky.
//!
//! Quick start:
//!   stepgate check pipeline.yaml    # validate the pipeline file
//!   stepgate run pipeline.yaml      # ask for approvals, resume where you left off
//!   stepgate status pipeline.yaml   # what's decided, what's pending
//!   stepgate log                    # what was decided and why
//!
//! For more info: stepgate --help

use clap::{Parser, Subcommand};
use colored::Colorize;
use std::path::PathBuf;
use stepgate::cli;
use stepgate::config::{ApprovalMode, CliOverrides, Presentation};

/// stepgate: human approval gate for agent pipelines.
///
/// Each pipeline item is decided once. Items that need sign-off are
/// put to a human with a timeout; decisions survive restarts so a re-run
/// never asks the same question twice.
#[derive(Parser)]
#[command(name = "stepgate", version, about = "Human approval gate for agent pipelines")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a pipeline, asking for approval where required
    Run {
        /// Pipeline file
        pipeline: PathBuf,

        /// Resume record (overrides settings.state_file)
        #[arg(long, env = "STEPGATE_STATE")]
        state: Option<PathBuf>,

        /// Seconds to wait for each approval
        #[arg(long, env = "STEPGATE_TIMEOUT")]
        timeout: Option<u64>,

        /// Who answers: console, auto-approve, auto-deny
        #[arg(long, default_value = "console", env = "STEPGATE_APPROVAL")]
        approval: String,

        /// Where prompts go: console or log
        #[arg(long, env = "STEPGATE_PRESENTATION")]
        presentation: Option<String>,

        /// Don't write a decision journal
        #[arg(long)]
        no_journal: bool,

        /// Use this run ID instead of a random one
        #[arg(long)]
        run_id: Option<String>,
    },

    /// Validate a pipeline file
    Check {
        /// Pipeline file
        pipeline: PathBuf,
    },

    /// Show which items are resolved and which are pending
    Status {
        /// Pipeline file
        pipeline: PathBuf,

        /// Resume record (overrides settings.state_file)
        #[arg(long, env = "STEPGATE_STATE")]
        state: Option<PathBuf>,
    },

    /// Browse the decision journal
    Log {
        /// Show a specific run
        #[arg(short, long)]
        run: Option<String>,

        /// Filter: user_response, timeout, channel_error
        #[arg(long)]
        reason: Option<String>,

        /// Max entries to show
        #[arg(short, long)]
        limit: Option<usize>,

        /// Show only the run summary
        #[arg(long)]
        summary: bool,

        /// List all recorded runs
        #[arg(long)]
        list: bool,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Run {
            pipeline,
            state,
            timeout,
            approval,
            presentation,
            no_journal,
            run_id,
        } => {
            let plan = build_run_options(
                pipeline,
                state,
                timeout,
                &approval,
                presentation,
                no_journal,
                run_id,
            )
            .and_then(cli::run::RunPlan::resolve);
            init_tracing(
                plan.as_ref()
                    .map_or(Presentation::Console, |p| p.settings.presentation),
            );
            match plan {
                Ok(plan) => cli::run::run_pipeline(plan).await,
                Err(e) => Err(e),
            }
        }

        Commands::Check { pipeline } => {
            init_tracing(Presentation::Console);
            cli::check::run_check(&pipeline)
        }

        Commands::Status { pipeline, state } => {
            init_tracing(Presentation::Console);
            cli::status::run_status(&pipeline, state)
        }

        Commands::Log {
            run,
            reason,
            limit,
            summary,
            list,
        } => {
            init_tracing(Presentation::Console);
            if list {
                cli::log::run_log_list()
            } else {
                cli::log::run_log(run.as_deref(), reason.as_deref(), limit, summary)
            }
        }
    };

    if let Err(e) = result {
        eprintln!();
        eprintln!("  {} {}", "✗".red().bold(), e);
        for cause in e.chain().skip(1) {
            eprintln!("  {} {}", "caused by:".dimmed(), cause);
        }
        eprintln!();
        std::process::exit(1);
    }
}

/// Structured prompts are info events; make sure they are visible.
fn init_tracing(presentation: Presentation) {
    let default_directive = match presentation {
        Presentation::Log => "stepgate=info",
        Presentation::Console => "stepgate=warn",
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_directive)),
        )
        .with_target(false)
        .without_time()
        .init();
}

fn build_run_options(
    pipeline: PathBuf,
    state: Option<PathBuf>,
    timeout: Option<u64>,
    approval: &str,
    presentation: Option<String>,
    no_journal: bool,
    run_id: Option<String>,
) -> anyhow::Result<cli::run::RunOptions> {
    let approval_mode = ApprovalMode::from_str_loose(approval).ok_or_else(|| {
        anyhow::anyhow!(
            "Unknown approval mode '{}' (expected console, auto-approve or auto-deny)",
            approval
        )
    })?;
    let presentation = presentation
        .map(|p| {
            Presentation::from_str_loose(&p).ok_or_else(|| {
                anyhow::anyhow!("Unknown presentation '{}' (expected console or log)", p)
            })
        })
        .transpose()?;

    Ok(cli::run::RunOptions {
        pipeline_path: pipeline,
        overrides: CliOverrides {
            timeout_secs: timeout,
            state_file: state,
            presentation,
        },
        approval_mode,
        journal: !no_journal,
        run_id,
    })
}
