//! `stepgate check`: validate and lint a pipeline file.

use crate::pipeline::{linter, parser};
use anyhow::Result;
use colored::Colorize;
use std::path::Path;

/// Run the `stepgate check` command.
pub fn run_check(pipeline_path: &Path) -> Result<()> {
    let pipeline = parser::parse_pipeline_file(pipeline_path)?;

    println!();
    println!("  {} Pipeline is valid!", "✓".green().bold());
    println!(
        "  Name:  {}",
        pipeline.name.as_deref().unwrap_or("unnamed").cyan()
    );
    println!("  Items: {}", pipeline.items.len());
    println!();
    for (i, item) in pipeline.items.iter().enumerate() {
        let gate = if item.requires_approval {
            "approval".yellow()
        } else {
            "auto".blue()
        };
        println!(
            "  {}. {} [{}] {} — {}",
            i + 1,
            item.key.bold(),
            gate,
            item.request.agent_name(),
            item.request.query()
        );
    }

    let warnings = linter::lint_pipeline(&pipeline);
    println!();
    if warnings.is_empty() {
        println!("  {} No issues found.", "✓".green());
    } else {
        println!(
            "  {} {} {}:",
            "─".repeat(20).dimmed(),
            warnings.len(),
            if warnings.len() == 1 {
                "suggestion"
            } else {
                "suggestions"
            }
        );
        println!();
        for warning in &warnings {
            println!("{}", warning.display());
        }
    }
    println!();

    Ok(())
}
