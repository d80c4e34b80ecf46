//! Decision journal writer: append-only JSONL files.
//!
//! Writes to `~/.stepgate/logs/{run_id}.jsonl`, one JSON object per line,
//! flushed after every write. The journal is an audit trail only; resume
//! decisions come from `RunState`.

use crate::journal::types::JournalEntry;
use anyhow::{Context, Result};
use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

/// Append-only writer for one run's decisions.
pub struct DecisionJournal {
    path: PathBuf,
    file: File,
    entry_count: usize,
}

impl DecisionJournal {
    /// Open the journal for a run in the default directory.
    pub fn new(run_id: &str) -> Result<Self> {
        let dir = Self::journal_directory()?;
        Self::with_path(dir.join(format!("{}.jsonl", run_id)))
    }

    /// Open a journal at a specific path.
    pub fn with_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create journal directory: {}", parent.display())
            })?;
        }
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .with_context(|| format!("Failed to open journal: {}", path.display()))?;

        Ok(Self {
            path,
            file,
            entry_count: 0,
        })
    }

    pub fn record(&mut self, entry: &JournalEntry) -> Result<()> {
        let json = serde_json::to_string(entry).context("Failed to serialize journal entry")?;
        writeln!(self.file, "{}", json).context("Failed to write journal entry")?;
        self.file.flush().context("Failed to flush journal")?;
        self.entry_count += 1;
        Ok(())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn entry_count(&self) -> usize {
        self.entry_count
    }

    /// Default journal directory (~/.stepgate/logs/).
    pub fn journal_directory() -> Result<PathBuf> {
        let home = dirs::home_dir().context("Could not determine home directory")?;
        Ok(home.join(".stepgate").join("logs"))
    }
}
