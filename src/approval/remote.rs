//! Remote approval channel.
//!
//! Hands each request to whatever transport is draining the inbox (a chat
//! bot, a webhook relay, an HTTP endpoint) and suspends until that side
//! replies. The transport itself lives outside this crate.

use crate::approval::types::{ApprovalDecision, ApprovalRequest};
use crate::approval::{ApprovalChannel, ChannelError};
use async_trait::async_trait;
use tokio::sync::{mpsc, oneshot};

/// A request waiting for a remote answer.
#[derive(Debug)]
pub struct PendingApproval {
    pub request: ApprovalRequest,
    reply: oneshot::Sender<bool>,
}

impl PendingApproval {
    pub fn approve(self) {
        self.answer(true);
    }

    pub fn reject(self) {
        self.answer(false);
    }

    pub fn answer(self, approved: bool) {
        // The requester may already have timed out.
        if self.reply.send(approved).is_err() {
            tracing::debug!(
                agent_id = %self.request.agent_id(),
                "remote answer arrived after the request was abandoned"
            );
        }
    }
}

/// Receiving end for the transport.
pub type RemoteInbox = mpsc::Receiver<PendingApproval>;

/// Sending end, held by the gate.
#[derive(Clone)]
pub struct RemoteChannel {
    outbox: mpsc::Sender<PendingApproval>,
}

impl RemoteChannel {
    /// Create a channel and the inbox its transport should drain.
    pub fn new(buffer: usize) -> (RemoteChannel, RemoteInbox) {
        let (outbox, inbox) = mpsc::channel(buffer.max(1));
        (RemoteChannel { outbox }, inbox)
    }
}

#[async_trait]
impl ApprovalChannel for RemoteChannel {
    async fn request_approval(
        &self,
        request: &ApprovalRequest,
    ) -> Result<ApprovalDecision, ChannelError> {
        let (reply, answer) = oneshot::channel();

        self.outbox
            .send(PendingApproval {
                request: request.clone(),
                reply,
            })
            .await
            .map_err(|_| ChannelError::Disconnected("inbox closed".to_string()))?;

        let approved = answer
            .await
            .map_err(|_| ChannelError::Disconnected("request dropped without an answer".to_string()))?;

        Ok(ApprovalDecision::user(approved))
    }
}
