//! Repeated execution of one script

use crate::engine::{ExecutionEngine, RunSummary};
use crate::errors::RunError;
use crate::script::Instruction;
use crate::utils::sleep_or_cancel;
use serde::Serialize;
use std::time::Duration;
use tracing::info;

pub const DEFAULT_ITERATION_PAUSE: Duration = Duration::from_secs(1);

/// Summaries of every iteration that ran
#[derive(Debug, Clone, Serialize)]
pub struct BatchOutcome {
    pub requested: u32,
    pub iterations: Vec<RunSummary>,
    pub cancelled: bool,
}

impl BatchOutcome {
    pub fn total_attempted(&self) -> usize {
        self.iterations.iter().map(|s| s.attempted_count).sum()
    }

    pub fn total_succeeded(&self) -> usize {
        self.iterations.iter().map(|s| s.succeeded_count).sum()
    }
}

/// Run `instructions` up to `repeat` times with `pause` between iterations.
///
/// A `STOP_ON_FAIL` abort ends only its own iteration. Cancellation ends the
/// whole batch, including the pause between iterations.
pub async fn run_repeated(
    engine: &ExecutionEngine,
    instructions: &[Instruction],
    repeat: u32,
    pause: Duration,
) -> Result<BatchOutcome, RunError> {
    let repeat = repeat.max(1);
    let token = engine.cancellation_token();
    let mut outcome = BatchOutcome {
        requested: repeat,
        iterations: Vec::with_capacity(repeat as usize),
        cancelled: false,
    };

    for iteration in 1..=repeat {
        if token.is_cancelled() {
            outcome.cancelled = true;
            break;
        }
        if repeat > 1 {
            info!("=== ITERATION {} of {} ===", iteration, repeat);
        }

        let summary = engine.run(instructions).await?;
        let cancelled = summary.was_cancelled();
        outcome.iterations.push(summary);
        if cancelled {
            outcome.cancelled = true;
            break;
        }

        if iteration < repeat {
            info!("Waiting {}s before next iteration...", pause.as_secs_f64());
            if !sleep_or_cancel(pause, token).await {
                outcome.cancelled = true;
                break;
            }
        }
    }

    if outcome.cancelled {
        info!(
            "Batch cancelled after {} of {} iteration(s)",
            outcome.iterations.len(),
            repeat
        );
    } else if repeat > 1 {
        info!("All {} iterations completed", repeat);
    }

    Ok(outcome)
}
