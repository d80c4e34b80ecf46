//! `stepgate log`: browse the decision journal.
//!
//! Shows every decision of a run: who asked, what was asked, and whether
//! it was approved, rejected, timed out or hit a broken channel.

use crate::approval::DecisionReason;
use crate::journal::{JournalFilter, JournalReader};
use anyhow::{bail, Context, Result};
use colored::Colorize;

/// Run the `stepgate log` command.
pub fn run_log(
    run_id: Option<&str>,
    reason_filter: Option<&str>,
    limit: Option<usize>,
    summary_only: bool,
) -> Result<()> {
    let reader = JournalReader::new().context("Failed to initialize journal reader")?;

    let entries = if let Some(id) = run_id {
        reader
            .read_run(id)
            .with_context(|| format!("Failed to read run: {}", id))?
    } else {
        let entries = reader.read_latest_run()?;
        if entries.is_empty() {
            println!();
            println!("  {} No decision journals found.", "ℹ".blue());
            println!("  Run a pipeline first:");
            println!("    {}", "stepgate run pipeline.yaml".dimmed());
            println!();
            return Ok(());
        }
        entries
    };

    let reason = match reason_filter {
        Some(r) => match DecisionReason::from_str_loose(r) {
            Some(reason) => Some(reason),
            None => bail!(
                "Unknown reason '{}' (expected user_response, timeout or channel_error)",
                r
            ),
        },
        None => None,
    };

    let summary = JournalReader::summarize(&entries);

    if summary_only {
        println!();
        println!("  Run: {}", summary.run_id.cyan());
        println!();
        println!(
            "  {} total | {} approved | {} auto | {} rejected | {} timed out | {} errors",
            summary.total.to_string().bold(),
            summary.approved.to_string().green().bold(),
            summary.auto_approved.to_string().blue().bold(),
            summary.rejected.to_string().red().bold(),
            summary.timed_out.to_string().yellow().bold(),
            summary.channel_errors.to_string().magenta().bold(),
        );
        if let (Some(start), Some(end)) = (summary.start_time, summary.end_time) {
            let duration = end - start;
            println!("  Duration: {}", format_duration(duration.num_seconds()));
        }
        println!();
        return Ok(());
    }

    let filter = JournalFilter {
        reason,
        limit,
        ..Default::default()
    };
    let filtered = JournalReader::filter_entries(&entries, &filter);

    println!();
    println!("  Run: {}", summary.run_id.cyan());
    println!();
    for entry in &filtered {
        println!("  {}", JournalReader::format_entry(entry));
    }
    println!();
    println!(
        "  {} {}",
        "─".repeat(40).dimmed(),
        summary.one_line().dimmed()
    );
    println!();

    Ok(())
}

/// List recorded runs.
pub fn run_log_list() -> Result<()> {
    let reader = JournalReader::new()?;
    let runs = reader.list_runs()?;

    println!();
    if runs.is_empty() {
        println!("  {} No runs found.", "ℹ".blue());
        println!();
        return Ok(());
    }

    println!("  Recorded runs:");
    println!();
    for run in &runs {
        println!("  • {}", run);
    }
    println!();
    println!("  View a run: {}", "stepgate log --run <id>".dimmed());
    println!();

    Ok(())
}

fn format_duration(seconds: i64) -> String {
    if seconds < 60 {
        format!("{}s", seconds)
    } else if seconds < 3600 {
        format!("{}m {}s", seconds / 60, seconds % 60)
    } else {
        format!("{}h {}m", seconds / 3600, (seconds % 3600) / 60)
    }
}
