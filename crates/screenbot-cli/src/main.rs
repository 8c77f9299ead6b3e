mod cli;
mod interactive;
mod logging;
mod presets;
mod report;
mod runner;

use anyhow::{Context, Result};
use clap::Parser;
use cli::{Cli, Commands, RunOptions};
use colored::Colorize;
use runner::BatchRequest;
use screenbot::Script;
use std::process::ExitCode;
use tracing::{error, info};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    if let Err(e) = logging::init_logging() {
        eprintln!("Failed to initialise logging: {e}");
    }

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e:#}");
            eprintln!("{} {e:#}", "Error:".red().bold());
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Run { file, options } => {
            let script = Script::from_file(&file)
                .with_context(|| format!("Could not load script {}", file.display()))?;
            execute(&file.display().to_string(), &script, &options).await
        }
        Commands::Exec { script, options } => {
            // allow "\n" typed literally on the command line
            let text = script.replace("\\n", "\n");
            execute("<exec>", &Script::parse(&text), &options).await
        }
        Commands::Preset { preset, options } => {
            execute(&preset.to_string(), &Script::parse(preset.script()), &options).await
        }
        Commands::Interactive { engine } => interactive::run_shell(engine).await,
    }
}

async fn execute(source: &str, script: &Script, options: &RunOptions) -> Result<()> {
    if options.dry_run {
        return report::print_script(source, script, options.json);
    }

    info!(source, "Executing script");
    runner::run_batch(
        runner::build_provider(&options.engine),
        BatchRequest {
            source,
            instructions: &script.instructions,
            policy: options.engine.retry_policy(),
            repeat: options.repeat,
            pause: options.iteration_pause(),
            json: options.json,
        },
    )
    .await
    .with_context(|| format!("Run of {source} failed"))?;
    Ok(())
}
