//! Console approval prompt.
//!
//! Renders what the agent wants to do, then waits for one line from the
//! human. Only an exact `y` (after trimming and lowercasing) approves.
//!
//! Reading a line is a blocking call that cannot be interrupted, so it
//! lives on a dedicated OS thread (the "line pump") that forwards every
//! line it reads over a channel. A request that is abandoned by the gate
//! while waiting still owns the next line that arrives; that line is
//! thrown away instead of answering a later prompt.

use crate::approval::types::{ApprovalDecision, ApprovalRequest};
use crate::approval::{ApprovalChannel, ChannelError};
use crate::config::Presentation;
use async_trait::async_trait;
use crossterm::{
    execute,
    style::{Color, Print, ResetColor, SetForegroundColor},
};
use std::io::{self, BufRead, Write};
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::{mpsc, Mutex};

/// Lines read from the human, or the error that stopped the pump.
pub type InputLine = io::Result<String>;

/// Console-based approval channel.
pub struct ConsoleChannel {
    presentation: Presentation,
    input: Mutex<mpsc::UnboundedReceiver<InputLine>>,
    /// Reads that were cancelled before their line arrived
    abandoned: AtomicUsize,
}

impl ConsoleChannel {
    /// Read answers from the process's stdin.
    pub fn stdin(presentation: Presentation) -> Self {
        Self::from_reader(presentation, io::BufReader::new(io::stdin()))
    }

    /// Read answers from any line-oriented source.
    pub fn from_reader<R>(presentation: Presentation, reader: R) -> Self
    where
        R: BufRead + Send + 'static,
    {
        Self::from_receiver(presentation, spawn_line_pump(reader))
    }

    /// Take answers from an already-running line source.
    pub fn from_receiver(
        presentation: Presentation,
        input: mpsc::UnboundedReceiver<InputLine>,
    ) -> Self {
        Self {
            presentation,
            input: Mutex::new(input),
            abandoned: AtomicUsize::new(0),
        }
    }

    /// Show the request on the configured sink.
    fn present(&self, request: &ApprovalRequest) -> io::Result<()> {
        let rendered = render_pre_result(request.pre_result());
        match self.presentation {
            Presentation::Log => {
                tracing::info!(
                    agent_id = %request.agent_id(),
                    agent_name = %request.agent_name(),
                    query = %request.query(),
                    pipe_id = request.pipe_id().unwrap_or("-"),
                    conversation_id = request.conversation_id().unwrap_or("-"),
                    pre_result = %rendered,
                    "approval requested, answer y to approve"
                );
                Ok(())
            }
            Presentation::Console => {
                let mut stdout = io::stdout();
                write_prompt(&mut stdout, request, &rendered)
            }
        }
    }

    /// Take the next line meant for this request, skipping lines owed to
    /// abandoned requests.
    async fn next_answer(
        &self,
        input: &mut mpsc::UnboundedReceiver<InputLine>,
    ) -> Result<String, ChannelError> {
        loop {
            match input.recv().await {
                None => return Err(ChannelError::InputClosed),
                Some(Err(e)) => return Err(ChannelError::Io(e)),
                Some(Ok(line)) => {
                    let owed = self
                        .abandoned
                        .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
                        .is_ok();
                    if owed {
                        tracing::debug!("discarding answer to an abandoned prompt");
                        continue;
                    }
                    return Ok(line);
                }
            }
        }
    }

    fn show_outcome(&self, approved: bool) {
        if self.presentation != Presentation::Console {
            return;
        }
        let mut stdout = io::stdout();
        let (color, text) = if approved {
            (Color::Green, "\n  ✓ Approved\n\n")
        } else {
            (Color::Red, "\n  ✗ Rejected\n\n")
        };
        let _ = execute!(stdout, SetForegroundColor(color), Print(text), ResetColor);
        let _ = stdout.flush();
    }
}

#[async_trait]
impl ApprovalChannel for ConsoleChannel {
    async fn request_approval(
        &self,
        request: &ApprovalRequest,
    ) -> Result<ApprovalDecision, ChannelError> {
        let mut input = self.input.lock().await;
        self.present(request)?;

        let read = OutstandingRead::arm(&self.abandoned);
        let answer = self.next_answer(&mut input).await;
        read.disarm();

        let approved = parse_answer(&answer?);
        self.show_outcome(approved);
        Ok(ApprovalDecision::user(approved))
    }
}

/// Marks a read as abandoned if its future is dropped mid-wait.
struct OutstandingRead<'a> {
    abandoned: &'a AtomicUsize,
    armed: bool,
}

impl<'a> OutstandingRead<'a> {
    fn arm(abandoned: &'a AtomicUsize) -> Self {
        Self {
            abandoned,
            armed: true,
        }
    }

    fn disarm(mut self) {
        self.armed = false;
    }
}

impl Drop for OutstandingRead<'_> {
    fn drop(&mut self) {
        if self.armed {
            self.abandoned.fetch_add(1, Ordering::SeqCst);
        }
    }
}

/// Start a thread that forwards lines from `reader` until EOF, an error,
/// or nobody is listening anymore.
pub fn spawn_line_pump<R>(mut reader: R) -> mpsc::UnboundedReceiver<InputLine>
where
    R: BufRead + Send + 'static,
{
    let (tx, rx) = mpsc::unbounded_channel();
    let spawned = std::thread::Builder::new()
        .name("stepgate-input".to_string())
        .spawn(move || loop {
            let mut line = String::new();
            match reader.read_line(&mut line) {
                Ok(0) => break,
                Ok(_) => {
                    if tx.send(Ok(line)).is_err() {
                        break;
                    }
                }
                Err(e) => {
                    let _ = tx.send(Err(e));
                    break;
                }
            }
        });
    if let Err(e) = spawned {
        tracing::error!("Failed to start input thread: {}", e);
    }
    rx
}

/// Map a raw answer to approve/reject. Only `y` approves.
pub fn parse_answer(raw: &str) -> bool {
    raw.trim().to_lowercase() == "y"
}

/// Best-effort rendering of a step's output. Never fails.
///
/// A string holding JSON is shown in its parsed, pretty-printed form; any
/// other string is shown as-is.
pub fn render_pre_result(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::String(raw) => match serde_json::from_str::<serde_json::Value>(raw) {
            Ok(parsed) => serde_json::to_string_pretty(&parsed).unwrap_or_else(|_| raw.clone()),
            Err(_) => raw.clone(),
        },
        other => serde_json::to_string_pretty(other).unwrap_or_else(|_| other.to_string()),
    }
}

/// Draw the approval block.
fn write_prompt(
    out: &mut impl Write,
    request: &ApprovalRequest,
    rendered: &str,
) -> io::Result<()> {
    execute!(
        out,
        Print("\n"),
        SetForegroundColor(Color::Yellow),
        Print("━━━━━━━━━━━━━━━━━━ APPROVAL REQUIRED ━━━━━━━━━━━━━━━━━━\n"),
        ResetColor,
        SetForegroundColor(Color::White),
        Print(format!(
            "  Agent:   {} ({})\n",
            request.agent_name(), request.agent_id()
        )),
        Print(format!("  Query:   {}\n", request.query())),
    )?;

    if let Some(pipe_id) = request.pipe_id() {
        execute!(out, Print(format!("  Pipe:    {}\n", pipe_id)))?;
    }
    if let Some(conversation_id) = request.conversation_id() {
        execute!(out, Print(format!("  Context: {}\n", conversation_id)))?;
    }

    execute!(out, Print("  Result:\n"))?;
    for line in rendered.lines() {
        execute!(
            out,
            SetForegroundColor(Color::DarkGrey),
            Print(format!("    {}\n", line)),
        )?;
    }

    execute!(
        out,
        SetForegroundColor(Color::Yellow),
        Print("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━\n"),
        SetForegroundColor(Color::Green),
        Print("  Approve? "),
        ResetColor,
        Print("[y/N] "),
    )?;
    out.flush()
}
