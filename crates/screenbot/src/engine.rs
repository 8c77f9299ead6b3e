//! Script execution engine
//!
//! Walks the instruction list with an explicit program counter. Each
//! instruction's command is attempted up to `retry_count` times; on success an
//! optional `LOOP_IF_SUCCESS` jump is taken, on failure the optional
//! `IF_FAIL_THEN` alternative is attempted and `STOP_ON_FAIL` may end the run.
//!
//! There is no implicit iteration cap: a backward jump on a command that keeps
//! succeeding loops until the cancellation token fires.

use crate::dispatcher::ActionDispatcher;
use crate::errors::{ProviderError, RunError};
use crate::progress::{ProgressEvent, ProgressSink};
use crate::provider::ScreenProvider;
use crate::script::{Instruction, Script};
use crate::utils::sleep_or_cancel;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc::UnboundedSender;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, instrument, warn};

pub const DEFAULT_RETRY_COUNT: u32 = 3;
pub const DEFAULT_RETRY_DELAY: Duration = Duration::from_millis(1500);

/// How often a command is attempted and how long to wait between attempts
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RetryPolicy {
    /// Total attempts per command, at least 1
    pub retry_count: u32,
    pub retry_delay: Duration,
}

impl RetryPolicy {
    pub fn new(retry_count: u32, retry_delay: Duration) -> Self {
        Self {
            retry_count: retry_count.max(1),
            retry_delay,
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_RETRY_COUNT, DEFAULT_RETRY_DELAY)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AbortKind {
    StopOnFail { line: usize },
    ProviderFailure { line: usize },
    Cancelled,
}

impl AbortKind {
    fn reason(&self) -> String {
        match self {
            AbortKind::StopOnFail { line } => {
                format!("STOP_ON_FAIL: command on line {line} failed")
            }
            AbortKind::ProviderFailure { line } => {
                format!("Provider failure on line {line}")
            }
            AbortKind::Cancelled => "Execution cancelled".to_string(),
        }
    }
}

/// Result of one script execution
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunSummary {
    /// Instruction visits; a jump back to an instruction counts again
    pub attempted_count: usize,
    /// Includes alternative-command successes
    pub succeeded_count: usize,
    pub aborted: bool,
    pub abort_reason: Option<String>,
    pub abort_kind: Option<AbortKind>,
    pub alternatives_used: usize,
    pub jumps_taken: usize,
    pub started_at: DateTime<Utc>,
    pub duration_ms: i64,
}

impl RunSummary {
    fn started(started_at: DateTime<Utc>) -> Self {
        Self {
            attempted_count: 0,
            succeeded_count: 0,
            aborted: false,
            abort_reason: None,
            abort_kind: None,
            alternatives_used: 0,
            jumps_taken: 0,
            started_at,
            duration_ms: 0,
        }
    }

    fn abort(&mut self, kind: AbortKind) {
        self.aborted = true;
        self.abort_reason = Some(kind.reason());
        self.abort_kind = Some(kind);
    }

    pub fn was_cancelled(&self) -> bool {
        self.abort_kind == Some(AbortKind::Cancelled)
    }
}

enum Attempt {
    Succeeded { attempts: u32 },
    Failed { attempts: u32 },
    Cancelled,
}

/// Executes parsed instructions against a provider.
///
/// Counters and the program counter live inside each `run` call, so one engine
/// can be reused for any number of sequential runs.
#[derive(Clone)]
pub struct ExecutionEngine {
    dispatcher: ActionDispatcher,
    policy: RetryPolicy,
    cancellation: CancellationToken,
    progress: ProgressSink,
}

impl ExecutionEngine {
    pub fn new(provider: Arc<dyn ScreenProvider>) -> Self {
        let cancellation = CancellationToken::new();
        Self {
            dispatcher: ActionDispatcher::new(provider).with_cancellation(cancellation.clone()),
            policy: RetryPolicy::default(),
            cancellation,
            progress: ProgressSink::default(),
        }
    }

    pub fn with_policy(mut self, policy: RetryPolicy) -> Self {
        self.policy = RetryPolicy::new(policy.retry_count, policy.retry_delay);
        self
    }

    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.dispatcher = self.dispatcher.with_cancellation(token.clone());
        self.cancellation = token;
        self
    }

    pub fn with_progress(mut self, sender: UnboundedSender<ProgressEvent>) -> Self {
        self.progress = ProgressSink::new(Some(sender));
        self
    }

    pub fn policy(&self) -> RetryPolicy {
        self.policy
    }

    pub fn cancellation_token(&self) -> &CancellationToken {
        &self.cancellation
    }

    pub fn dispatcher(&self) -> &ActionDispatcher {
        &self.dispatcher
    }

    /// Parse `text` and run it
    pub async fn run_text(&self, text: &str) -> Result<RunSummary, RunError> {
        let script = Script::parse(text);
        self.run(&script.instructions).await
    }

    #[instrument(skip(self, instructions), fields(instructions = instructions.len()))]
    pub async fn run(&self, instructions: &[Instruction]) -> Result<RunSummary, RunError> {
        let started_at = Utc::now();
        let mut summary = RunSummary::started(started_at);

        if instructions.is_empty() {
            warn!("No commands to execute");
        }

        let index_by_line: HashMap<usize, usize> = instructions
            .iter()
            .enumerate()
            .map(|(index, instr)| (instr.line_number, index))
            .collect();

        info!(
            "Retry settings: {} attempts, {}s delay",
            self.policy.retry_count,
            self.policy.retry_delay.as_secs_f64()
        );

        let mut pc = 0usize;
        while pc < instructions.len() {
            if self.cancellation.is_cancelled() {
                summary.abort(AbortKind::Cancelled);
                break;
            }

            let instr = &instructions[pc];
            let line = instr.line_number;
            summary.attempted_count += 1;
            info!(line, "[{}] Executing: {}", line, instr.command_text);
            self.progress.emit(ProgressEvent::InstructionStarted {
                line,
                command: instr.command_text.clone(),
            });

            let outcome = match self.attempt(line, &instr.command_text).await {
                Ok(outcome) => outcome,
                Err(source) => return Err(self.fail(summary, line, &instr.command_text, source)),
            };
            match outcome {
                Attempt::Cancelled => {
                    summary.abort(AbortKind::Cancelled);
                    break;
                }
                Attempt::Succeeded { attempts } => {
                    summary.succeeded_count += 1;
                    self.progress
                        .emit(ProgressEvent::InstructionSucceeded { line, attempts });

                    pc = match instr.loop_target_line {
                        Some(target) => match index_by_line.get(&target) {
                            Some(&target_index) => {
                                info!(
                                    line,
                                    "✓ Command succeeded. Looping to line {}. (New index: {})",
                                    target,
                                    target_index
                                );
                                summary.jumps_taken += 1;
                                self.progress.emit(ProgressEvent::Jump {
                                    from_line: line,
                                    to_line: target,
                                });
                                target_index
                            }
                            None => {
                                warn!(
                                    line,
                                    "✗ LOOP_IF_SUCCESS target line {} not found. Continuing to next command.",
                                    target
                                );
                                self.progress
                                    .emit(ProgressEvent::JumpTargetMissing { line, target });
                                pc + 1
                            }
                        },
                        None => pc + 1,
                    };
                }
                Attempt::Failed { attempts } => {
                    warn!(
                        line,
                        "✗ Command failed after {} attempts: {}", attempts, instr.command_text
                    );
                    self.progress.emit(ProgressEvent::InstructionFailed {
                        line,
                        command: instr.command_text.clone(),
                        attempts,
                    });

                    let mut recovered = false;
                    if let Some(alternative) = &instr.on_fail_alternative {
                        info!(line, "Trying alternative command: {}", alternative);
                        summary.alternatives_used += 1;
                        self.progress.emit(ProgressEvent::AlternativeStarted {
                            line,
                            command: alternative.clone(),
                        });

                        let outcome = match self.attempt(line, alternative).await {
                            Ok(outcome) => outcome,
                            Err(source) => return Err(self.fail(summary, line, alternative, source)),
                        };
                        match outcome {
                            Attempt::Succeeded { .. } => {
                                info!(line, "✓ Alternative command succeeded.");
                                summary.succeeded_count += 1;
                                recovered = true;
                                self.progress
                                    .emit(ProgressEvent::AlternativeSucceeded { line });
                            }
                            Attempt::Failed { .. } => {
                                warn!(line, "✗ Alternative command also failed.");
                                self.progress.emit(ProgressEvent::AlternativeFailed { line });
                            }
                            Attempt::Cancelled => {
                                summary.abort(AbortKind::Cancelled);
                                break;
                            }
                        }
                    }

                    if instr.stop_on_fail && !recovered {
                        warn!(line, "STOP_ON_FAIL directive encountered. Stopping execution.");
                        summary.abort(AbortKind::StopOnFail { line });
                        break;
                    }
                    pc += 1;
                }
            }
        }

        self.finish(&mut summary);
        Ok(summary)
    }

    /// Stamp the duration and emit the closing progress events
    fn finish(&self, summary: &mut RunSummary) {
        summary.duration_ms = (Utc::now() - summary.started_at).num_milliseconds();

        if let Some(reason) = &summary.abort_reason {
            warn!("Execution aborted: {}", reason);
            self.progress.emit(ProgressEvent::Aborted {
                reason: reason.clone(),
            });
        }
        info!(
            attempted = summary.attempted_count,
            succeeded = summary.succeeded_count,
            duration_ms = summary.duration_ms,
            "Execution complete: {}/{} commands succeeded (including alternatives).",
            summary.succeeded_count,
            summary.attempted_count
        );
        self.progress.emit(ProgressEvent::Finished {
            attempted: summary.attempted_count,
            succeeded: summary.succeeded_count,
        });
    }

    fn fail(
        &self,
        mut summary: RunSummary,
        line: usize,
        command: &str,
        source: ProviderError,
    ) -> RunError {
        summary.abort(AbortKind::ProviderFailure { line });
        self.finish(&mut summary);
        RunError::Provider {
            line,
            command: command.to_string(),
            source,
            summary: Box::new(summary),
        }
    }

    /// Attempt one command under the retry policy
    async fn attempt(&self, line: usize, command: &str) -> Result<Attempt, ProviderError> {
        let retry_count = self.policy.retry_count;
        let mut fatal: Option<ProviderError> = None;

        for attempt in 1..=retry_count {
            if self.cancellation.is_cancelled() {
                return Ok(Attempt::Cancelled);
            }

            match self.dispatcher.execute(command).await {
                Ok(true) => {
                    if attempt > 1 {
                        info!(line, "✓ Succeeded on retry attempt {}", attempt);
                    }
                    return Ok(Attempt::Succeeded { attempts: attempt });
                }
                Ok(false) => fatal = None,
                Err(e) => {
                    warn!(line, attempt, "Provider failure: {}", e);
                    fatal = Some(e);
                }
            }

            if self.cancellation.is_cancelled() {
                return Ok(Attempt::Cancelled);
            }
            self.progress.emit(ProgressEvent::AttemptFailed {
                line,
                attempt,
                retry_count,
            });

            if attempt < retry_count {
                let delay_secs = self.policy.retry_delay.as_secs_f64();
                info!(
                    line,
                    "Retrying in {}s... (attempt {}/{})",
                    delay_secs,
                    attempt + 1,
                    retry_count
                );
                self.progress.emit(ProgressEvent::Retrying {
                    line,
                    next_attempt: attempt + 1,
                    retry_count,
                    delay_secs,
                });
                if !sleep_or_cancel(self.policy.retry_delay, &self.cancellation).await {
                    return Ok(Attempt::Cancelled);
                }
            }
        }

        if let Some(source) = fatal {
            error!(line, "Provider failure persisted through all attempts: {}", source);
            return Err(source);
        }

        Ok(Attempt::Failed {
            attempts: retry_count,
        })
    }
}
