pub mod auto;
pub mod console;
pub mod remote;
pub mod types;

use crate::approval::types::{ApprovalDecision, ApprovalRequest};
use async_trait::async_trait;
use thiserror::Error;

pub use auto::{AutoApprove, AutoDeny};
pub use console::ConsoleChannel;
pub use remote::{PendingApproval, RemoteChannel, RemoteInbox};
pub use types::{DecisionReason, RequestError};

/// Failures a channel can report instead of a decision.
#[derive(Debug, Error)]
pub enum ChannelError {
    #[error("console I/O failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("approval input closed before an answer arrived")]
    InputClosed,
    #[error("remote approver disconnected: {0}")]
    Disconnected(String),
}

/// A way of getting a yes/no answer from a human (or a remote system).
/// Implementations can be console-based, remote, auto-approve, etc.
///
/// Channels never enforce a timeout themselves; `ApprovalGate` does. A
/// channel may block its thread while waiting: the gate drives it on a
/// blocking-pool thread, never on the async executor.
#[async_trait]
pub trait ApprovalChannel: Send + Sync {
    async fn request_approval(
        &self,
        request: &ApprovalRequest,
    ) -> Result<ApprovalDecision, ChannelError>;
}
