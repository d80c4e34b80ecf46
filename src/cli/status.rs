//! `stepgate status`: which items of a pipeline are already resolved.

use crate::config::{CliOverrides, Settings};
use crate::pipeline::parser;
use crate::state::RunState;
use anyhow::Result;
use colored::Colorize;
use std::path::{Path, PathBuf};

/// Run the `stepgate status` command.
pub fn run_status(pipeline_path: &Path, state_file: Option<PathBuf>) -> Result<()> {
    let pipeline = parser::parse_pipeline_file(pipeline_path)?;
    let overrides = CliOverrides {
        state_file,
        ..Default::default()
    };
    let settings = Settings::merge(&pipeline.settings, &overrides);
    let state = RunState::load(&settings.state_file);

    println!();
    println!(
        "  Pipeline: {}",
        pipeline.name.as_deref().unwrap_or("unnamed").cyan()
    );
    println!(
        "  State:    {}",
        settings.state_file.display().to_string().dimmed()
    );
    println!();

    let mut pending = 0;
    for item in &pipeline.items {
        if state.contains(&item.key) {
            println!("  {} {}", "✓".green(), item.key);
        } else {
            pending += 1;
            println!("  {} {}", "·".dimmed(), item.key.bold());
        }
    }

    let resolved = pipeline.items.len() - pending;
    println!();
    if pending == 0 {
        println!(
            "  {} All {} items resolved — another run will ask nothing.",
            "✓".green().bold(),
            resolved
        );
    } else {
        println!(
            "  {} resolved | {} pending",
            resolved.to_string().green().bold(),
            pending.to_string().yellow().bold()
        );
    }
    println!();

    Ok(())
}
