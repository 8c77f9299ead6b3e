//! Line-oriented shell

use crate::cli::EngineOptions;
use crate::presets::Preset;
use crate::runner::{self, BatchRequest};
use anyhow::{Context, Result};
use colored::Colorize;
use screenbot::{
    ActionDispatcher, DesktopProvider, ScreenRegion, Script, DEFAULT_ITERATION_PAUSE,
};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

const HELP: &str = "\
Available commands:
  help                        - Show this help message
  find text <text>            - Find text on screen
  find object <class>         - Find an object class on screen
  click text <text> [n]       - Click nth occurrence of text (default: first)
  click object <class> [n]    - Click nth occurrence of an object
  click <x> <y>               - Click at specific coordinates
  list objects                - List all detected objects on screen
  type <text>                 - Type text
  press <key>                 - Press a key (e.g. enter, space, esc)
  wait <seconds>              - Wait, e.g. 'wait 2' or 'wait 1.5'
  region set <x> <y> <w> <h>  - Only detect inside this area
  region clear                - Detect on the full screen
  region show                 - Show the current region
  horizontal [repeat]         - Run the built-in horizontal sequence
  vertical [repeat]           - Run the built-in vertical sequence
  runfile <file> [repeat]     - Run a script file
  exit | quit | q             - Leave the shell

Ctrl-C stops the running command or script and returns to the prompt.
Text and object commands (find, click text/object, list objects, presets)
need a recognizer supplied by the embedding application; this build has none.";

#[derive(Debug, Clone, PartialEq)]
pub enum ShellCommand {
    Empty,
    Help,
    Exit,
    RegionSet(ScreenRegion),
    RegionClear,
    RegionShow,
    RunFile { path: PathBuf, repeat: u32 },
    Preset { preset: Preset, repeat: u32 },
    Command(String),
    Invalid(String),
}

pub fn parse_shell_line(line: &str) -> ShellCommand {
    let line = line.trim();
    let parts: Vec<&str> = line.split_whitespace().collect();
    let Some(first) = parts.first() else {
        return ShellCommand::Empty;
    };
    let keyword = first.to_lowercase();

    match keyword.as_str() {
        "exit" | "quit" | "q" => ShellCommand::Exit,
        "help" => ShellCommand::Help,
        "region" => match parts.get(1).map(|s| s.to_lowercase()).as_deref() {
            Some("set") if parts.len() == 6 => match parts[2..].join(",").parse() {
                Ok(region) => ShellCommand::RegionSet(region),
                Err(e) => ShellCommand::Invalid(format!("Invalid region: {e}")),
            },
            Some("set") => {
                ShellCommand::Invalid("Usage: region set <x> <y> <width> <height>".to_string())
            }
            Some("clear") => ShellCommand::RegionClear,
            Some("show") => ShellCommand::RegionShow,
            Some(other) => ShellCommand::Invalid(format!("Unknown region command: {other}")),
            None => ShellCommand::Invalid("Usage: region <set|clear|show>".to_string()),
        },
        "runfile" => match parts.get(1) {
            Some(path) => match parse_repeat(parts.get(2).copied()) {
                Ok(repeat) => ShellCommand::RunFile {
                    path: PathBuf::from(path),
                    repeat,
                },
                Err(e) => ShellCommand::Invalid(e),
            },
            None => ShellCommand::Invalid("Usage: runfile <file> [repeat]".to_string()),
        },
        _ => match Preset::from_name(&keyword) {
            Some(preset) => match parse_repeat(parts.get(1).copied()) {
                Ok(repeat) => ShellCommand::Preset { preset, repeat },
                Err(e) => ShellCommand::Invalid(e),
            },
            None => ShellCommand::Command(line.to_string()),
        },
    }
}

fn parse_repeat(token: Option<&str>) -> Result<u32, String> {
    let Some(token) = token else {
        return Ok(1);
    };
    match token.parse::<u32>() {
        Ok(0) => Err("Repeat count must be at least 1".to_string()),
        Ok(n) => Ok(n),
        Err(_) => Err(format!("Invalid repeat count: {token}")),
    }
}

struct Shell {
    provider: Arc<DesktopProvider>,
    options: EngineOptions,
}

impl Shell {
    /// Returns `false` when the shell should exit
    async fn handle(&self, command: ShellCommand) -> bool {
        match command {
            ShellCommand::Empty => {}
            ShellCommand::Exit => return false,
            ShellCommand::Help => println!("{HELP}"),
            ShellCommand::Invalid(message) => println!("{}", message.yellow()),
            ShellCommand::RegionSet(region) => {
                self.provider.set_region(Some(region));
                println!("Current region: {region}");
            }
            ShellCommand::RegionClear => {
                self.provider.clear_region();
                println!("Region cleared - using full screen");
            }
            ShellCommand::RegionShow => match self.provider.region() {
                Some(region) => println!("Current region: {region}"),
                None => println!("No region set - using full screen"),
            },
            ShellCommand::RunFile { path, repeat } => {
                if let Err(e) = self.run_file(&path, repeat).await {
                    error!("{e:#}");
                    println!("{} {e:#}", "Error:".red().bold());
                }
            }
            ShellCommand::Preset { preset, repeat } => {
                println!("Executing built-in {preset} sequence");
                let script = Script::parse(preset.script());
                if let Err(e) = self.run_script(&preset.to_string(), &script, repeat).await {
                    println!("{} {e:#}", "Error:".red().bold());
                }
            }
            ShellCommand::Command(text) => self.run_single(&text).await,
        }
        true
    }

    async fn run_file(&self, path: &Path, repeat: u32) -> Result<()> {
        let script = Script::from_file(path)
            .with_context(|| format!("Could not load script {}", path.display()))?;
        self.run_script(&path.display().to_string(), &script, repeat)
            .await
    }

    async fn run_script(&self, source: &str, script: &Script, repeat: u32) -> Result<()> {
        runner::run_batch(
            self.provider.clone(),
            BatchRequest {
                source,
                instructions: &script.instructions,
                policy: self.options.retry_policy(),
                repeat,
                pause: DEFAULT_ITERATION_PAUSE,
                json: false,
            },
        )
        .await?;
        Ok(())
    }

    /// One attempt, no retries
    async fn run_single(&self, text: &str) {
        let token = CancellationToken::new();
        let dispatcher =
            ActionDispatcher::new(self.provider.clone()).with_cancellation(token.clone());

        match runner::with_interrupt(&token, dispatcher.execute(text)).await {
            Ok(true) => println!("{}", "✓ Done".green()),
            Ok(false) if token.is_cancelled() => println!("{}", "Interrupted".yellow()),
            Ok(false) => println!("{}", format!("✗ Failed: {text}").red()),
            Err(e) => {
                error!("{}", e);
                println!("{} {e}", "Error:".red().bold());
            }
        }
    }
}

pub async fn run_shell(options: EngineOptions) -> Result<()> {
    let provider = runner::build_provider(&options);
    let shell = Shell { provider, options };

    println!("{}", "screenbot interactive shell".bold());
    println!("Type 'help' for available commands\n");
    info!("Interactive shell started");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        print!("> ");
        std::io::stdout().flush().context("Failed to flush stdout")?;

        let next = tokio::select! {
            line = lines.next_line() => Some(line),
            _ = tokio::signal::ctrl_c() => None,
        };
        let Some(line) = next else {
            println!("\nInterrupted. Type 'exit' to quit or continue with commands.");
            continue;
        };

        // EOF
        let Some(line) = line.context("Failed to read from stdin")? else {
            println!();
            break;
        };

        if !shell.handle(parse_shell_line(&line)).await {
            break;
        }
    }

    println!("Goodbye");
    info!("Interactive shell closed");
    Ok(())
}
