//! Decision journal reader: filter, summarize and display runs.

use crate::approval::types::DecisionReason;
use crate::journal::types::*;
use anyhow::{Context, Result};
use colored::Colorize;
use std::fs;
use std::path::{Path, PathBuf};

/// Reads and queries journal files.
pub struct JournalReader {
    dir: PathBuf,
}

impl JournalReader {
    /// Create a reader over the default journal directory.
    pub fn new() -> Result<Self> {
        let dir = crate::journal::logger::DecisionJournal::journal_directory()?;
        Ok(Self { dir })
    }

    pub fn with_dir(dir: impl AsRef<Path>) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
        }
    }

    pub fn read_run(&self, run_id: &str) -> Result<Vec<JournalEntry>> {
        let path = self.dir.join(format!("{}.jsonl", run_id));
        self.read_file(&path)
    }

    fn read_file(&self, path: &Path) -> Result<Vec<JournalEntry>> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read journal: {}", path.display()))?;

        content
            .lines()
            .filter(|line| !line.trim().is_empty())
            .enumerate()
            .map(|(i, line)| {
                serde_json::from_str(line)
                    .with_context(|| format!("Failed to parse journal entry at line {}", i + 1))
            })
            .collect()
    }

    /// Entries of the most recently written run, empty if there is none.
    pub fn read_latest_run(&self) -> Result<Vec<JournalEntry>> {
        match self.journal_files()?.into_iter().next() {
            Some(path) => self.read_file(&path),
            None => Ok(Vec::new()),
        }
    }

    /// Journal files, most recently modified first.
    fn journal_files(&self) -> Result<Vec<PathBuf>> {
        if !self.dir.exists() {
            return Ok(Vec::new());
        }

        let mut files: Vec<PathBuf> = fs::read_dir(&self.dir)?
            .filter_map(|e| e.ok())
            .map(|e| e.path())
            .filter(|p| p.extension().is_some_and(|e| e == "jsonl"))
            .collect();

        files.sort_by(|a, b| {
            let a_time = fs::metadata(a).and_then(|m| m.modified()).ok();
            let b_time = fs::metadata(b).and_then(|m| m.modified()).ok();
            b_time.cmp(&a_time)
        });

        Ok(files)
    }

    /// All run ids, sorted.
    pub fn list_runs(&self) -> Result<Vec<String>> {
        let mut runs: Vec<String> = self
            .journal_files()?
            .iter()
            .filter_map(|p| p.file_stem().map(|s| s.to_string_lossy().to_string()))
            .collect();
        runs.sort();
        Ok(runs)
    }

    pub fn filter_entries(entries: &[JournalEntry], filter: &JournalFilter) -> Vec<JournalEntry> {
        entries
            .iter()
            .filter(|e| filter.reason.map_or(true, |r| e.reason == r))
            .filter(|e| filter.approved.map_or(true, |a| e.approved == a))
            .filter(|e| {
                filter
                    .agent_id
                    .as_ref()
                    .map_or(true, |id| &e.agent_id == id)
            })
            .take(filter.limit.unwrap_or(usize::MAX))
            .cloned()
            .collect()
    }

    pub fn summarize(entries: &[JournalEntry]) -> RunSummary {
        let mut summary = RunSummary::default();

        if let Some(first) = entries.first() {
            summary.run_id = first.run_id.clone();
            summary.start_time = Some(first.timestamp);
        }
        if let Some(last) = entries.last() {
            summary.end_time = Some(last.timestamp);
        }

        summary.total = entries.len();
        for entry in entries {
            match (entry.reason, entry.approved) {
                (DecisionReason::UserResponse, true) if !entry.required_approval => {
                    summary.auto_approved += 1
                }
                (DecisionReason::UserResponse, true) => summary.approved += 1,
                (DecisionReason::UserResponse, false) => summary.rejected += 1,
                (DecisionReason::Timeout, _) => summary.timed_out += 1,
                (DecisionReason::ChannelError, _) => summary.channel_errors += 1,
            }
        }

        summary
    }

    /// Pretty-print an entry for terminal display.
    pub fn format_entry(entry: &JournalEntry) -> String {
        let timestamp = entry.timestamp.format("%H:%M:%S").to_string();
        let verdict = match (entry.reason, entry.approved) {
            (DecisionReason::UserResponse, true) if !entry.required_approval => {
                "AUTO".blue().to_string()
            }
            (DecisionReason::UserResponse, true) => "APPROVED".green().to_string(),
            (DecisionReason::UserResponse, false) => "REJECTED".red().to_string(),
            (DecisionReason::Timeout, _) => "TIMEOUT".yellow().to_string(),
            (DecisionReason::ChannelError, _) => "ERROR".magenta().to_string(),
        };

        format!(
            "[{}] {} {} {} ({})",
            timestamp.dimmed(),
            verdict,
            entry.item_key.bold(),
            entry.query,
            entry.agent_name.dimmed()
        )
    }
}
