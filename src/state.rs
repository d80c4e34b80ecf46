//! Resume record: which pipeline items have already been decided.
//!
//! Stored as a JSON array of item keys. Loading never fails: a missing or
//! unreadable file starts an empty record. Saving rewrites the whole file
//! through a temporary sibling and a rename, and any failure is returned
//! to the caller.

use std::collections::BTreeSet;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StateError {
    #[error("Failed to save run state to {}: {source}", .path.display())]
    Save {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to serialize run state: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Set of resolved item keys, backed by a file.
#[derive(Debug, Clone)]
pub struct RunState {
    path: PathBuf,
    done: BTreeSet<String>,
}

impl RunState {
    /// Load the record at `path`. Missing or corrupt files yield an empty set.
    pub fn load(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref().to_path_buf();
        let done = match fs::read_to_string(&path) {
            Ok(content) => match serde_json::from_str::<Vec<String>>(&content) {
                Ok(keys) => keys.into_iter().collect(),
                Err(e) => {
                    tracing::warn!(
                        "Run state at {} is corrupt, starting fresh: {}",
                        path.display(),
                        e
                    );
                    BTreeSet::new()
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => BTreeSet::new(),
            Err(e) => {
                tracing::warn!(
                    "Run state at {} is unreadable, starting fresh: {}",
                    path.display(),
                    e
                );
                BTreeSet::new()
            }
        };

        tracing::debug!("Loaded {} resolved items from {}", done.len(), path.display());
        Self { path, done }
    }

    pub fn contains(&self, key: &str) -> bool {
        self.done.contains(key)
    }

    /// Record `key` as resolved and persist the full set.
    ///
    /// The key stays in memory even if the save fails.
    pub fn mark_done(&mut self, key: impl Into<String>) -> Result<(), StateError> {
        self.done.insert(key.into());
        self.save()
    }

    pub fn len(&self) -> usize {
        self.done.len()
    }

    pub fn is_empty(&self) -> bool {
        self.done.is_empty()
    }

    /// Resolved keys in sorted order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.done.iter().map(String::as_str)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn save(&self) -> Result<(), StateError> {
        let keys: Vec<&String> = self.done.iter().collect();
        let json = serde_json::to_string_pretty(&keys)?;
        write_atomic(&self.path, json.as_bytes()).map_err(|source| StateError::Save {
            path: self.path.clone(),
            source,
        })
    }
}

/// Write to `<path>.tmp`, sync, then rename over `path`.
fn write_atomic(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }

    let mut tmp_name = path.as_os_str().to_owned();
    tmp_name.push(".tmp");
    let tmp_path = PathBuf::from(tmp_name);

    let mut file = fs::File::create(&tmp_path)?;
    file.write_all(bytes)?;
    file.write_all(b"\n")?;
    file.sync_all()?;
    drop(file);

    fs::rename(&tmp_path, path)
}
