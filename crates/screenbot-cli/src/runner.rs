use crate::cli::EngineOptions;
use crate::report;
use anyhow::Result;
use screenbot::{
    run_repeated, BatchOutcome, DesktopProvider, ExecutionEngine, Instruction, RetryPolicy,
};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

pub fn build_provider(options: &EngineOptions) -> Arc<DesktopProvider> {
    Arc::new(
        DesktopProvider::new()
            .with_region(options.region)
            .with_min_confidence(options.min_confidence),
    )
}

/// Drive `fut` to completion, cancelling `token` on the first Ctrl-C.
///
/// The future is still awaited after cancellation so the run can stop at its
/// next poll point and report what it did.
pub async fn with_interrupt<F: Future>(token: &CancellationToken, fut: F) -> F::Output {
    tokio::pin!(fut);
    tokio::select! {
        output = &mut fut => return output,
        signal = tokio::signal::ctrl_c() => {
            if signal.is_ok() {
                warn!("Interrupt received, stopping...");
                token.cancel();
            }
        }
    }
    fut.await
}

pub struct BatchRequest<'a> {
    pub source: &'a str,
    pub instructions: &'a [Instruction],
    pub policy: RetryPolicy,
    pub repeat: u32,
    pub pause: Duration,
    pub json: bool,
}

/// Run a script `repeat` times against `provider`, printing progress as it
/// goes (or only the final JSON report).
pub async fn run_batch(
    provider: Arc<DesktopProvider>,
    request: BatchRequest<'_>,
) -> Result<BatchOutcome> {
    let token = CancellationToken::new();
    let mut engine = ExecutionEngine::new(provider)
        .with_policy(request.policy)
        .with_cancellation(token.clone());

    let printer = if request.json {
        None
    } else {
        let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
        engine = engine.with_progress(tx);
        Some(tokio::spawn(async move {
            while let Some(event) = rx.recv().await {
                report::print_event(&event);
            }
        }))
    };

    info!(
        source = request.source,
        repeat = request.repeat,
        "Running {} instruction(s)",
        request.instructions.len()
    );
    let result = with_interrupt(
        &token,
        run_repeated(&engine, request.instructions, request.repeat, request.pause),
    )
    .await;

    // closes the progress channel
    drop(engine);
    if let Some(printer) = printer {
        let _ = printer.await;
    }

    let outcome = result?;
    report::print_outcome(request.source, &outcome, request.json)?;
    Ok(outcome)
}
