//! YAML pipeline parser.
//!
//! Parses a pipeline file into a `Pipeline`: its items in order, plus an
//! optional `settings:` block.
//!
//! # Example pipeline file:
//! ```yaml
//! pipeline: nightly-refactor
//! conversation: conv-42
//! settings:
//!   timeout_secs: 120
//!   presentation: console
//! items:
//!   - key: plan
//!     agent_id: planner
//!     agent_name: Planner
//!     query: Draft a refactoring plan
//!     requires_approval: false
//!   - key: apply
//!     agent_id: coder
//!     agent_name: Coder
//!     query: Apply the patch to src/
//!     pre_result:
//!       files_changed: 3
//! ```

use crate::approval::types::ApprovalRequest;
use crate::config::FileSettings;
use crate::pipeline::types::{Pipeline, PipelineItem};
use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::collections::HashSet;
use std::path::Path;

/// Raw YAML representation before conversion to internal types.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawPipeline {
    #[serde(default)]
    pipeline: Option<String>,
    #[serde(default)]
    conversation: Option<String>,
    #[serde(default)]
    settings: FileSettings,
    #[serde(default)]
    items: Vec<RawItem>,
}

/// An item as it appears in the YAML file.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawItem {
    key: String,
    agent_id: String,
    agent_name: String,
    #[serde(default)]
    query: String,
    #[serde(default = "default_requires_approval")]
    requires_approval: bool,
    #[serde(default)]
    pre_result: serde_json::Value,
    /// Per-item override of the pipeline-wide conversation
    #[serde(default)]
    conversation: Option<String>,
}

fn default_requires_approval() -> bool {
    true
}

/// Parse a pipeline file from a path.
pub fn parse_pipeline_file(path: impl AsRef<Path>) -> Result<Pipeline> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read pipeline file: {}", path.display()))?;
    parse_pipeline_str(&content)
        .with_context(|| format!("Failed to parse pipeline file: {}", path.display()))
}

/// Parse a YAML pipeline string.
pub fn parse_pipeline_str(yaml: &str) -> Result<Pipeline> {
    let raw: RawPipeline =
        serde_yaml::from_str(yaml).context("Invalid YAML syntax in pipeline file")?;

    if raw.items.is_empty() {
        bail!("Pipeline must have at least one item");
    }

    let name = raw.pipeline.filter(|n| !n.trim().is_empty());
    let conversation = raw.conversation.filter(|c| !c.trim().is_empty());

    let mut seen = HashSet::new();
    let mut items = Vec::with_capacity(raw.items.len());
    for (i, raw_item) in raw.items.into_iter().enumerate() {
        if raw_item.key.trim().is_empty() {
            bail!("Item at position {} (0-indexed) has an empty key", i);
        }
        if !seen.insert(raw_item.key.clone()) {
            bail!(
                "Duplicate item key '{}' at position {} — keys must be unique so runs can resume",
                raw_item.key,
                i
            );
        }
        let item = convert_item(raw_item, name.as_deref(), conversation.as_deref())
            .with_context(|| format!("Invalid item at position {} (0-indexed)", i))?;
        items.push(item);
    }

    Ok(Pipeline {
        name,
        conversation,
        settings: raw.settings,
        items,
    })
}

fn convert_item(
    raw: RawItem,
    pipe_id: Option<&str>,
    conversation: Option<&str>,
) -> Result<PipelineItem> {
    let mut request = ApprovalRequest::new(raw.agent_id, raw.agent_name, raw.query, raw.pre_result)?;
    if let Some(pipe_id) = pipe_id {
        request = request.with_pipe_id(pipe_id);
    }
    if let Some(conversation) = raw.conversation.as_deref().or(conversation) {
        request = request.with_conversation_id(conversation);
    }

    Ok(PipelineItem {
        key: raw.key,
        requires_approval: raw.requires_approval,
        request,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Presentation;
    use serde_json::json;

    #[test]
    fn test_parse_basic_pipeline() {
        let yaml = r#"
items:
  - key: plan
    agent_id: planner
    agent_name: Planner
    query: Draft the plan
"#;
        let pipeline = parse_pipeline_str(yaml).unwrap();
        assert_eq!(pipeline.items.len(), 1);
        let item = &pipeline.items[0];
        assert_eq!(item.key, "plan");
        assert!(item.requires_approval);
        assert_eq!(item.request.pre_result(), &json!(null));
        assert!(item.request.pipe_id().is_none());
    }

    #[test]
    fn test_parse_full_pipeline() {
        let yaml = r#"
pipeline: nightly
conversation: conv-1
settings:
  timeout_secs: 5
  presentation: log
items:
  - key: plan
    agent_id: planner
    agent_name: Planner
    query: Draft the plan
    requires_approval: false
    pre_result: "just text"
  - key: apply
    agent_id: coder
    agent_name: Coder
    query: Apply it
    conversation: conv-2
    pre_result:
      files: [a.rs, b.rs]
"#;
        let pipeline = parse_pipeline_str(yaml).unwrap();
        assert_eq!(pipeline.name.as_deref(), Some("nightly"));
        assert_eq!(pipeline.settings.timeout_secs, Some(5));
        assert_eq!(pipeline.settings.presentation, Some(Presentation::Log));

        let plan = &pipeline.items[0];
        assert!(!plan.requires_approval);
        assert_eq!(plan.request.pre_result(), &json!("just text"));
        assert_eq!(plan.request.pipe_id(), Some("nightly"));
        assert_eq!(plan.request.conversation_id(), Some("conv-1"));

        let apply = &pipeline.items[1];
        assert_eq!(apply.request.pre_result(), &json!({"files": ["a.rs", "b.rs"]}));
        assert_eq!(apply.request.conversation_id(), Some("conv-2"));
    }

    #[test]
    fn test_reject_no_items() {
        assert!(parse_pipeline_str("pipeline: empty\n").is_err());
    }

    #[test]
    fn test_reject_duplicate_keys() {
        let yaml = r#"
items:
  - { key: a, agent_id: x, agent_name: X }
  - { key: a, agent_id: y, agent_name: Y }
"#;
        let err = parse_pipeline_str(yaml).unwrap_err();
        assert!(err.to_string().contains("Duplicate item key"));
    }

    #[test]
    fn test_reject_empty_agent() {
        let yaml = r#"
items:
  - { key: a, agent_id: "", agent_name: X }
"#;
        let err = parse_pipeline_str(yaml).unwrap_err();
        assert!(format!("{:#}", err).contains("agent_id must not be empty"));
    }

    #[test]
    fn test_reject_unknown_fields() {
        let yaml = r#"
items:
  - { key: a, agent_id: x, agent_name: X, approve: true }
"#;
        assert!(parse_pipeline_str(yaml).is_err());
    }
}
