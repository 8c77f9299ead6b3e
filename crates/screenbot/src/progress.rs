//! Progress events streamed while a script runs

use serde::Serialize;
use std::fmt;
use tokio::sync::mpsc::UnboundedSender;

/// Everything the engine reports as it happens
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum ProgressEvent {
    InstructionStarted {
        line: usize,
        command: String,
    },
    AttemptFailed {
        line: usize,
        attempt: u32,
        retry_count: u32,
    },
    Retrying {
        line: usize,
        next_attempt: u32,
        retry_count: u32,
        delay_secs: f64,
    },
    InstructionSucceeded {
        line: usize,
        attempts: u32,
    },
    InstructionFailed {
        line: usize,
        command: String,
        attempts: u32,
    },
    AlternativeStarted {
        line: usize,
        command: String,
    },
    AlternativeSucceeded {
        line: usize,
    },
    AlternativeFailed {
        line: usize,
    },
    Jump {
        from_line: usize,
        to_line: usize,
    },
    JumpTargetMissing {
        line: usize,
        target: usize,
    },
    Aborted {
        reason: String,
    },
    Finished {
        attempted: usize,
        succeeded: usize,
    },
}

impl fmt::Display for ProgressEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProgressEvent::InstructionStarted { line, command } => {
                write!(f, "[{line}] Executing: {command}")
            }
            ProgressEvent::AttemptFailed {
                attempt,
                retry_count,
                ..
            } => write!(f, "  attempt {attempt}/{retry_count} failed"),
            ProgressEvent::Retrying {
                next_attempt,
                retry_count,
                delay_secs,
                ..
            } => write!(
                f,
                "  Retrying in {delay_secs}s... (attempt {next_attempt}/{retry_count})"
            ),
            ProgressEvent::InstructionSucceeded { attempts, .. } => {
                if *attempts > 1 {
                    write!(f, "  ✓ Succeeded on attempt {attempts}")
                } else {
                    write!(f, "  ✓ Succeeded")
                }
            }
            ProgressEvent::InstructionFailed {
                command, attempts, ..
            } => write!(f, "  ✗ Command failed after {attempts} attempts: {command}"),
            ProgressEvent::AlternativeStarted { command, .. } => {
                write!(f, "  Trying alternative command: {command}")
            }
            ProgressEvent::AlternativeSucceeded { .. } => {
                write!(f, "  ✓ Alternative command succeeded")
            }
            ProgressEvent::AlternativeFailed { .. } => {
                write!(f, "  ✗ Alternative command also failed")
            }
            ProgressEvent::Jump { to_line, .. } => {
                write!(f, "  ✓ Looping to line {to_line}")
            }
            ProgressEvent::JumpTargetMissing { target, .. } => write!(
                f,
                "  ✗ LOOP_IF_SUCCESS target line {target} not found, continuing"
            ),
            ProgressEvent::Aborted { reason } => write!(f, "  Stopped: {reason}"),
            ProgressEvent::Finished {
                attempted,
                succeeded,
            } => write!(
                f,
                "Execution complete: {succeeded}/{attempted} commands succeeded (including alternatives)"
            ),
        }
    }
}

/// Optional channel to a supervising front-end
#[derive(Debug, Clone, Default)]
pub(crate) struct ProgressSink {
    sender: Option<UnboundedSender<ProgressEvent>>,
}

impl ProgressSink {
    pub(crate) fn new(sender: Option<UnboundedSender<ProgressEvent>>) -> Self {
        Self { sender }
    }

    /// Receivers that went away are ignored
    pub(crate) fn emit(&self, event: ProgressEvent) {
        if let Some(sender) = &self.sender {
            let _ = sender.send(event);
        }
    }
}
