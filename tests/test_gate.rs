//! Integration tests for the approval gate with real channels.

use std::io::Cursor;
use std::sync::Arc;
use std::time::{Duration, Instant};
use stepgate::approval::{ConsoleChannel, RemoteChannel};
use stepgate::config::Presentation;
use stepgate::{ApprovalDecision, ApprovalGate, ApprovalRequest, DecisionReason};
use tokio::sync::mpsc;

fn request() -> ApprovalRequest {
    ApprovalRequest::new("coder", "Coder", "Apply the patch?", "diff --git a/x b/x")
        .unwrap()
        .with_pipe_id("nightly")
}

fn gate() -> ApprovalGate {
    ApprovalGate::new(Presentation::Log)
}

#[tokio::test]
async fn test_console_answers_map_literally() {
    let cases = [
        ("y\n", true),
        ("Y \n", true),
        ("n\n", false),
        ("yes\n", false),
        ("\n", false),
        ("no way\n", false),
    ];
    for (input, expected) in cases {
        let channel = ConsoleChannel::from_reader(Presentation::Log, Cursor::new(input.to_string()));
        let decision = gate()
            .decide(request(), Arc::new(channel), Duration::from_secs(5))
            .await;
        assert_eq!(
            decision,
            ApprovalDecision::user(expected),
            "input {:?}",
            input
        );
    }
}

#[tokio::test]
async fn test_console_timeout_then_late_answer_is_discarded() {
    let (tx, rx) = mpsc::unbounded_channel();
    let channel = Arc::new(ConsoleChannel::from_receiver(Presentation::Log, rx));
    let gate = gate();

    let start = Instant::now();
    let first = gate
        .decide(request(), channel.clone(), Duration::from_millis(100))
        .await;
    assert_eq!(first, ApprovalDecision::timeout());
    assert!(start.elapsed() < Duration::from_secs(2));

    // Give the cancelled request a moment to unwind before answering.
    tokio::time::sleep(Duration::from_millis(20)).await;
    tx.send(Ok("y\n".to_string())).unwrap();
    tx.send(Ok("n\n".to_string())).unwrap();

    let second = gate
        .decide(request(), channel, Duration::from_secs(5))
        .await;
    assert_eq!(second, ApprovalDecision::user(false));
}

#[tokio::test]
async fn test_console_eof_is_channel_error() {
    let channel = ConsoleChannel::from_reader(Presentation::Log, Cursor::new(String::new()));
    let decision = gate()
        .decide(request(), Arc::new(channel), Duration::from_secs(5))
        .await;
    assert_eq!(decision.reason(), DecisionReason::ChannelError);
    assert!(!decision.approved());
}

#[tokio::test]
async fn test_remote_channel_through_gate() {
    let (channel, mut inbox) = RemoteChannel::new(8);
    tokio::spawn(async move {
        while let Some(pending) = inbox.recv().await {
            let ok = pending.request.query().contains("patch");
            pending.answer(ok);
        }
    });

    let decision = gate()
        .decide(request(), Arc::new(channel), Duration::from_secs(5))
        .await;
    assert_eq!(decision, ApprovalDecision::user(true));
}

#[tokio::test]
async fn test_slow_remote_times_out() {
    let (channel, mut inbox) = RemoteChannel::new(1);
    let holder = tokio::spawn(async move {
        // Hold the request without answering.
        let pending = inbox.recv().await;
        tokio::time::sleep(Duration::from_millis(500)).await;
        if let Some(pending) = pending {
            pending.approve();
        }
    });

    let decision = gate()
        .decide(request(), Arc::new(channel), Duration::from_millis(50))
        .await;
    assert_eq!(decision, ApprovalDecision::timeout());
    holder.await.unwrap();
}
