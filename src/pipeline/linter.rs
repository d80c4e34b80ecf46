//! Pipeline linter: flags pipelines that parse but probably don't do what
//! their author meant.
//!
//! Run by `stepgate check`.

use crate::pipeline::types::*;
use colored::Colorize;
use std::collections::HashMap;

/// A lint warning about a pipeline.
#[derive(Debug)]
pub struct LintWarning {
    pub severity: Severity,
    pub message: String,
    pub suggestion: Option<String>,
}

#[derive(Debug)]
pub enum Severity {
    /// Likely a mistake
    Warning,
    /// Worth knowing
    Info,
}

impl LintWarning {
    fn warn(msg: impl Into<String>) -> Self {
        Self {
            severity: Severity::Warning,
            message: msg.into(),
            suggestion: None,
        }
    }

    fn warn_with_fix(msg: impl Into<String>, fix: impl Into<String>) -> Self {
        Self {
            severity: Severity::Warning,
            message: msg.into(),
            suggestion: Some(fix.into()),
        }
    }

    fn info(msg: impl Into<String>) -> Self {
        Self {
            severity: Severity::Info,
            message: msg.into(),
            suggestion: None,
        }
    }

    /// Format for terminal output.
    pub fn display(&self) -> String {
        let icon = match self.severity {
            Severity::Warning => "⚠".yellow().to_string(),
            Severity::Info => "ℹ".blue().to_string(),
        };
        let mut out = format!("  {} {}", icon, self.message);
        if let Some(ref suggestion) = self.suggestion {
            out.push_str(&format!("\n    {}: {}", "Fix".green(), suggestion));
        }
        out
    }
}

/// Lint a pipeline and return warnings.
pub fn lint_pipeline(pipeline: &Pipeline) -> Vec<LintWarning> {
    let mut warnings = Vec::new();

    check_any_gated(pipeline, &mut warnings);
    check_timeout(pipeline, &mut warnings);
    check_reviewable(pipeline, &mut warnings);
    check_agent_names(pipeline, &mut warnings);

    warnings
}

/// Check: does anything actually ask a human?
fn check_any_gated(pipeline: &Pipeline, warnings: &mut Vec<LintWarning>) {
    if !pipeline.items.iter().any(|item| item.requires_approval) {
        warnings.push(LintWarning::info(
            "No item requires approval — every item will be auto-approved",
        ));
    }
}

/// Check: is the timeout usable?
fn check_timeout(pipeline: &Pipeline, warnings: &mut Vec<LintWarning>) {
    if pipeline.settings.timeout_secs == Some(0) {
        warnings.push(LintWarning::warn_with_fix(
            "timeout_secs is 0 — every approval will time out and be rejected",
            "Remove timeout_secs to use the 60s default, or set a positive value",
        ));
    }
}

/// Check: will the reviewer have something to look at?
fn check_reviewable(pipeline: &Pipeline, warnings: &mut Vec<LintWarning>) {
    for item in pipeline.items.iter().filter(|i| i.requires_approval) {
        if item.request.query().trim().is_empty() {
            warnings.push(LintWarning::warn(format!(
                "Item '{}' requires approval but has no query — the reviewer won't know what they're approving",
                item.key
            )));
        }
        if item.request.pre_result().is_null() {
            warnings.push(LintWarning::info(format!(
                "Item '{}' requires approval but has no pre_result to review",
                item.key
            )));
        }
    }
}

/// Check: is each agent id shown under a single name?
fn check_agent_names(pipeline: &Pipeline, warnings: &mut Vec<LintWarning>) {
    let mut names: HashMap<&str, &str> = HashMap::new();
    for item in &pipeline.items {
        let id = item.request.agent_id();
        let name = item.request.agent_name();
        match names.get(id) {
            Some(existing) if *existing != name => {
                warnings.push(LintWarning::info(format!(
                    "Agent '{}' appears as both '{}' and '{}'",
                    id, existing, name
                )));
            }
            Some(_) => {}
            None => {
                names.insert(id, name);
            }
        }
    }
}
