//! Non-interactive channels for CI and tests.

use crate::approval::types::{ApprovalDecision, ApprovalRequest};
use crate::approval::{ApprovalChannel, ChannelError};
use async_trait::async_trait;

/// Approves everything without prompting.
pub struct AutoApprove;

#[async_trait]
impl ApprovalChannel for AutoApprove {
    async fn request_approval(
        &self,
        request: &ApprovalRequest,
    ) -> Result<ApprovalDecision, ChannelError> {
        tracing::debug!(agent_id = %request.agent_id(), "auto-approving");
        Ok(ApprovalDecision::user(true))
    }
}

/// Rejects everything that requires approval.
pub struct AutoDeny;

#[async_trait]
impl ApprovalChannel for AutoDeny {
    async fn request_approval(
        &self,
        request: &ApprovalRequest,
    ) -> Result<ApprovalDecision, ChannelError> {
        tracing::debug!(agent_id = %request.agent_id(), "auto-denying");
        Ok(ApprovalDecision::user(false))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::approval::DecisionReason;

    fn request() -> ApprovalRequest {
        ApprovalRequest::new("writer", "Writer", "Publish?", "draft").unwrap()
    }

    #[tokio::test]
    async fn test_auto_channels() {
        let yes = AutoApprove.request_approval(&request()).await.unwrap();
        assert!(yes.approved());
        assert_eq!(yes.reason(), DecisionReason::UserResponse);

        let no = AutoDeny.request_approval(&request()).await.unwrap();
        assert!(!no.approved());
        assert_eq!(no.reason(), DecisionReason::UserResponse);
    }
}
