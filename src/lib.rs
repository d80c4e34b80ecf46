//! stepgate: human approval gate and resumable run state for agent pipelines.
//!
//! This library exposes the gate, channels, run state and pipeline runner
//! for programmatic use and integration tests. The binary entrypoint is in
//! `main.rs`.

pub mod approval;
pub mod cli;
pub mod config;
pub mod gate;
pub mod journal;
pub mod pipeline;
pub mod state;

pub use approval::types::{ApprovalDecision, ApprovalRequest, DecisionReason};
pub use approval::ApprovalChannel;
pub use gate::ApprovalGate;
pub use pipeline::{ItemOutcome, PipelineItem, PipelineRunner};
pub use state::{RunState, StateError};
