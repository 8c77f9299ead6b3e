use anyhow::Result;
use colored::Colorize;
use screenbot::{BatchOutcome, ProgressEvent, Script};
use serde::Serialize;

#[derive(Serialize)]
struct RunReport<'a> {
    source: &'a str,
    #[serde(flatten)]
    outcome: &'a BatchOutcome,
}

pub fn print_event(event: &ProgressEvent) {
    let line = event.to_string();
    match event {
        ProgressEvent::InstructionStarted { .. } => println!("{}", line.bold()),
        ProgressEvent::InstructionSucceeded { .. }
        | ProgressEvent::AlternativeSucceeded { .. }
        | ProgressEvent::Jump { .. } => println!("{}", line.green()),
        ProgressEvent::InstructionFailed { .. } | ProgressEvent::AlternativeFailed { .. } => {
            println!("{}", line.red())
        }
        ProgressEvent::AttemptFailed { .. }
        | ProgressEvent::Retrying { .. }
        | ProgressEvent::JumpTargetMissing { .. } => println!("{}", line.yellow()),
        ProgressEvent::AlternativeStarted { .. } => println!("{}", line.cyan()),
        ProgressEvent::Aborted { .. } => println!("{}", line.red().bold()),
        ProgressEvent::Finished { .. } => {
            println!("{}", "-".repeat(50).dimmed());
            println!("{}", line.bold());
        }
    }
}

/// Instructions and warnings, for `--dry-run`
pub fn print_script(source: &str, script: &Script, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(script)?);
        return Ok(());
    }

    println!("{} {}", "Script:".bold(), source);
    for instruction in &script.instructions {
        println!("  {instruction}");
    }
    if script.warnings.is_empty() {
        println!("{}", "No warnings".green());
    } else {
        for warning in &script.warnings {
            println!("  {} {}", "warning:".yellow().bold(), warning);
        }
    }
    Ok(())
}

pub fn print_outcome(source: &str, outcome: &BatchOutcome, json: bool) -> Result<()> {
    if json {
        let report = RunReport { source, outcome };
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    if outcome.iterations.len() > 1 || outcome.requested > 1 {
        println!(
            "{} {} of {} iteration(s), {}/{} commands succeeded",
            "Finished".bold(),
            outcome.iterations.len(),
            outcome.requested,
            outcome.total_succeeded(),
            outcome.total_attempted()
        );
    }
    if outcome.cancelled {
        println!("{}", "Cancelled".yellow().bold());
    }
    Ok(())
}
