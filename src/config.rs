//! Run configuration.
//!
//! Settings come from three layers, lowest priority first: built-in
//! defaults, the `settings:` block of the pipeline file, and CLI flags
//! (which may themselves come from `STEPGATE_*` environment variables).

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

/// Default time budget for one approval.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

/// Default location of the resume record, relative to the working directory.
pub const DEFAULT_STATE_FILE: &str = ".stepgate/state.json";

/// Where approval prompts and gate notices are rendered.
///
/// Picked once at startup and handed to the gate and channels, so nothing
/// has to inspect the global logging setup at call time.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Presentation {
    /// Colored, human-readable output straight to the terminal
    #[default]
    Console,
    /// Structured `tracing` events for whatever subscriber is installed
    Log,
}

impl Presentation {
    pub fn from_str_loose(s: &str) -> Option<Presentation> {
        match s.to_lowercase().trim() {
            "console" | "terminal" | "tty" => Some(Presentation::Console),
            "log" | "logs" | "tracing" | "structured" => Some(Presentation::Log),
            _ => None,
        }
    }
}

impl fmt::Display for Presentation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Presentation::Console => write!(f, "console"),
            Presentation::Log => write!(f, "log"),
        }
    }
}

/// Which channel answers approval requests for a CLI run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ApprovalMode {
    /// Ask the human at the terminal
    #[default]
    Console,
    /// Approve everything (CI, dry runs)
    AutoApprove,
    /// Reject everything that needs approval (strict CI)
    AutoDeny,
}

impl ApprovalMode {
    pub fn from_str_loose(s: &str) -> Option<ApprovalMode> {
        match s.to_lowercase().trim() {
            "console" | "terminal" | "stdin" => Some(ApprovalMode::Console),
            "auto-approve" | "auto_approve" | "auto" | "approve" => Some(ApprovalMode::AutoApprove),
            "auto-deny" | "auto_deny" | "deny" => Some(ApprovalMode::AutoDeny),
            _ => None,
        }
    }
}

/// The `settings:` block of a pipeline file. Every field is optional.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FileSettings {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state_file: Option<PathBuf>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub presentation: Option<Presentation>,
}

/// Overrides given on the command line.
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub timeout_secs: Option<u64>,
    pub state_file: Option<PathBuf>,
    pub presentation: Option<Presentation>,
}

/// Fully resolved settings for a run.
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    /// Time budget for each approval
    pub timeout: Duration,
    /// Resume record location
    pub state_file: PathBuf,
    /// Prompt and notice rendering
    pub presentation: Presentation,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_TIMEOUT,
            state_file: PathBuf::from(DEFAULT_STATE_FILE),
            presentation: Presentation::default(),
        }
    }
}

impl Settings {
    /// Layer file settings and CLI overrides over the defaults.
    pub fn merge(file: &FileSettings, cli: &CliOverrides) -> Self {
        let defaults = Settings::default();
        let timeout = cli
            .timeout_secs
            .or(file.timeout_secs)
            .map(Duration::from_secs)
            .unwrap_or(defaults.timeout);
        let state_file = cli
            .state_file
            .clone()
            .or_else(|| file.state_file.clone())
            .unwrap_or(defaults.state_file);
        let presentation = cli
            .presentation
            .or(file.presentation)
            .unwrap_or(defaults.presentation);

        Self {
            timeout,
            state_file,
            presentation,
        }
    }
}
