//! The approval gate: one request in, one decision out, always.
//!
//! The channel call runs on a blocking-pool thread and races a timer.
//! Whatever happens (an answer, silence, a broken channel) the caller gets
//! an `ApprovalDecision`, never an error.

use crate::approval::types::{ApprovalDecision, ApprovalRequest};
use crate::approval::ApprovalChannel;
use crate::config::Presentation;
use colored::Colorize;
use std::io::{self, Write};
use std::sync::Arc;
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::sync::oneshot;

pub use crate::config::DEFAULT_TIMEOUT;

/// Orchestrates a single approval under a time budget.
#[derive(Debug, Clone, Copy, Default)]
pub struct ApprovalGate {
    presentation: Presentation,
}

impl ApprovalGate {
    pub fn new(presentation: Presentation) -> Self {
        Self { presentation }
    }

    pub fn presentation(&self) -> Presentation {
        self.presentation
    }

    /// Ask `channel` about `request`, giving up after `timeout`.
    ///
    /// The channel future is driven on its own thread, so a channel that
    /// blocks cannot hold up the timer. On timeout the future is cancelled
    /// at its next await point; a channel stuck in a blocking call keeps
    /// its thread until the call returns, and its result goes nowhere.
    pub async fn decide(
        &self,
        request: ApprovalRequest,
        channel: Arc<dyn ApprovalChannel>,
        timeout: Duration,
    ) -> ApprovalDecision {
        let agent_id = request.agent_id().to_string();
        let (cancel, cancelled) = oneshot::channel::<()>();
        let handle = Handle::current();
        let mut task = tokio::task::spawn_blocking(move || {
            handle.block_on(async move {
                tokio::select! {
                    result = channel.request_approval(&request) => Some(result),
                    _ = cancelled => None,
                }
            })
        });

        tokio::select! {
            joined = &mut task => match joined {
                Ok(Some(Ok(decision))) => {
                    tracing::debug!(agent_id = %agent_id, %decision, "approval decided");
                    decision
                }
                Ok(Some(Err(e))) => {
                    self.notice_channel_error(&agent_id, &e.to_string());
                    ApprovalDecision::channel_error()
                }
                Ok(None) => {
                    self.notice_channel_error(&agent_id, "channel task was cancelled");
                    ApprovalDecision::channel_error()
                }
                Err(e) => {
                    self.notice_channel_error(&agent_id, &format!("channel task failed: {}", e));
                    ApprovalDecision::channel_error()
                }
            },
            _ = tokio::time::sleep(timeout) => {
                drop(cancel);
                self.notice_timeout(&agent_id, timeout);
                ApprovalDecision::timeout()
            }
        }
    }

    fn notice_timeout(&self, agent_id: &str, timeout: Duration) {
        match self.presentation {
            Presentation::Log => tracing::warn!(
                agent_id = %agent_id,
                timeout_secs = timeout.as_secs_f64(),
                "no approval response before timeout, treating as rejected"
            ),
            Presentation::Console => {
                let _ = write_timeout_notice(&mut io::stderr(), agent_id, timeout);
            }
        }
    }

    fn notice_channel_error(&self, agent_id: &str, error: &str) {
        match self.presentation {
            Presentation::Log => tracing::error!(
                agent_id = %agent_id,
                error = %error,
                "approval channel failed, treating as rejected"
            ),
            Presentation::Console => {
                let _ = write_channel_error_notice(&mut io::stderr(), agent_id, error);
            }
        }
    }
}

fn write_timeout_notice(out: &mut impl Write, agent_id: &str, timeout: Duration) -> io::Result<()> {
    writeln!(
        out,
        "\n  {} No response for {} within {:.0?}, treating as rejected",
        "⏱".yellow(),
        agent_id.bold(),
        timeout
    )
}

fn write_channel_error_notice(out: &mut impl Write, agent_id: &str, error: &str) -> io::Result<()> {
    writeln!(
        out,
        "\n  {} Approval channel failed for {}: {}",
        "✗".red(),
        agent_id.bold(),
        error
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::approval::{AutoApprove, AutoDeny, ChannelError, DecisionReason};
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::Mutex;
    use std::time::Instant;

    fn request() -> ApprovalRequest {
        ApprovalRequest::new("critic", "Critic", "Accept review?", json!("ok")).unwrap()
    }

    /// Never answers.
    struct Silent;

    #[async_trait]
    impl ApprovalChannel for Silent {
        async fn request_approval(
            &self,
            _request: &ApprovalRequest,
        ) -> Result<ApprovalDecision, ChannelError> {
            std::future::pending().await
        }
    }

    /// Always fails.
    struct Broken;

    #[async_trait]
    impl ApprovalChannel for Broken {
        async fn request_approval(
            &self,
            _request: &ApprovalRequest,
        ) -> Result<ApprovalDecision, ChannelError> {
            Err(ChannelError::InputClosed)
        }
    }

    /// Panics mid-request.
    struct Panicky;

    #[async_trait]
    impl ApprovalChannel for Panicky {
        async fn request_approval(
            &self,
            _request: &ApprovalRequest,
        ) -> Result<ApprovalDecision, ChannelError> {
            panic!("channel blew up")
        }
    }

    /// Blocks its thread instead of awaiting.
    struct Blocking;

    #[async_trait]
    impl ApprovalChannel for Blocking {
        async fn request_approval(
            &self,
            _request: &ApprovalRequest,
        ) -> Result<ApprovalDecision, ChannelError> {
            std::thread::sleep(Duration::from_secs(1));
            Ok(ApprovalDecision::user(true))
        }
    }

    /// Collects formatted log output.
    #[derive(Clone, Default)]
    struct Captured(Arc<Mutex<Vec<u8>>>);

    impl Write for Captured {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    impl Captured {
        fn text(&self) -> String {
            String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
        }
    }

    /// Run one decision with log output captured on this thread.
    async fn decide_captured(
        channel: Arc<dyn ApprovalChannel>,
        timeout: Duration,
    ) -> (ApprovalDecision, String) {
        let captured = Captured::default();
        let writer = captured.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(move || writer.clone())
            .with_ansi(false)
            .finish();
        let _guard = tracing::subscriber::set_default(subscriber);

        let decision = ApprovalGate::new(Presentation::Log)
            .decide(request(), channel, timeout)
            .await;
        (decision, captured.text())
    }

    const TIMEOUT_NOTICE: &str = "no approval response before timeout";
    const ERROR_NOTICE: &str = "approval channel failed";

    #[tokio::test]
    async fn test_decision_passes_through() {
        let gate = ApprovalGate::new(Presentation::Log);
        let yes = gate
            .decide(request(), Arc::new(AutoApprove), Duration::from_secs(5))
            .await;
        assert_eq!(yes, ApprovalDecision::user(true));

        let no = gate
            .decide(request(), Arc::new(AutoDeny), Duration::from_secs(5))
            .await;
        assert_eq!(no, ApprovalDecision::user(false));
    }

    #[tokio::test]
    async fn test_timeout_rejects_on_time() {
        let gate = ApprovalGate::new(Presentation::Log);
        let start = Instant::now();
        let decision = gate
            .decide(request(), Arc::new(Silent), Duration::from_millis(50))
            .await;
        let elapsed = start.elapsed();

        assert!(!decision.approved());
        assert_eq!(decision.reason(), DecisionReason::Timeout);
        assert!(elapsed >= Duration::from_millis(50));
        assert!(elapsed < Duration::from_secs(2));
    }

    #[tokio::test]
    async fn test_channel_error_rejects() {
        let gate = ApprovalGate::new(Presentation::Log);
        let decision = gate
            .decide(request(), Arc::new(Broken), Duration::from_secs(5))
            .await;
        assert_eq!(decision, ApprovalDecision::channel_error());
    }

    #[tokio::test]
    async fn test_channel_panic_rejects() {
        let gate = ApprovalGate::new(Presentation::Log);
        let decision = gate
            .decide(request(), Arc::new(Panicky), Duration::from_secs(5))
            .await;
        assert_eq!(decision.reason(), DecisionReason::ChannelError);
    }

    #[tokio::test]
    async fn test_blocking_channel_still_times_out() {
        let gate = ApprovalGate::new(Presentation::Log);
        let start = Instant::now();
        let decision = gate
            .decide(request(), Arc::new(Blocking), Duration::from_millis(50))
            .await;
        let elapsed = start.elapsed();

        assert_eq!(decision, ApprovalDecision::timeout());
        assert!(elapsed < Duration::from_millis(500), "took {:?}", elapsed);
    }

    #[tokio::test]
    async fn test_timeout_emits_one_notice() {
        let (decision, logs) = decide_captured(Arc::new(Silent), Duration::from_millis(50)).await;

        assert_eq!(decision, ApprovalDecision::timeout());
        assert_eq!(logs.matches(TIMEOUT_NOTICE).count(), 1);
        assert_eq!(logs.matches(ERROR_NOTICE).count(), 0);
        assert!(logs.contains("critic"));
    }

    #[tokio::test]
    async fn test_channel_error_emits_one_notice() {
        let (decision, logs) = decide_captured(Arc::new(Broken), Duration::from_secs(5)).await;

        assert_eq!(decision, ApprovalDecision::channel_error());
        assert_eq!(logs.matches(ERROR_NOTICE).count(), 1);
        assert_eq!(logs.matches(TIMEOUT_NOTICE).count(), 0);
        assert!(logs.contains("approval input closed"));
    }

    #[tokio::test]
    async fn test_user_decision_emits_no_notice() {
        let (approved, logs) = decide_captured(Arc::new(AutoApprove), Duration::from_secs(5)).await;
        assert!(approved.approved());
        assert!(!logs.contains("treating as rejected"));

        let (rejected, logs) = decide_captured(Arc::new(AutoDeny), Duration::from_secs(5)).await;
        assert_eq!(rejected, ApprovalDecision::user(false));
        assert!(!logs.contains("treating as rejected"));
    }

    #[test]
    fn test_console_notices_are_distinct() {
        let mut timeout = Vec::new();
        write_timeout_notice(&mut timeout, "critic", Duration::from_secs(60)).unwrap();
        let timeout = String::from_utf8(timeout).unwrap();

        let mut error = Vec::new();
        write_channel_error_notice(&mut error, "critic", "input closed").unwrap();
        let error = String::from_utf8(error).unwrap();

        assert!(timeout.contains("No response for"));
        assert!(timeout.contains("treating as rejected"));
        assert!(error.contains("Approval channel failed for"));
        assert!(error.contains("input closed"));
        assert_ne!(timeout, error);
        assert_eq!(timeout.trim().lines().count(), 1);
        assert_eq!(error.trim().lines().count(), 1);
    }
}
