use crate::presets::Preset;
use clap::{Args, Parser, Subcommand};
use screenbot::{RetryPolicy, ScreenRegion};
use std::path::PathBuf;
use std::time::Duration;

#[derive(Parser, Debug)]
#[command(
    name = "screenbot",
    author,
    version,
    about = "screenbot - script-driven screen automation"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run a script file
    Run {
        /// Path to the script
        file: PathBuf,
        #[command(flatten)]
        options: RunOptions,
    },
    /// Run a script given on the command line (use \n between lines)
    Exec {
        script: String,
        #[command(flatten)]
        options: RunOptions,
    },
    /// Run a built-in sequence
    ///
    /// The presets locate buttons by text, so they need a text recognizer
    /// installed by the embedding application. The stock binary ships none and
    /// stops at the first `click text` line; use --dry-run to inspect them.
    Preset {
        #[arg(value_enum)]
        preset: Preset,
        #[command(flatten)]
        options: RunOptions,
    },
    /// Line-oriented shell for single commands and scripts
    Interactive {
        #[command(flatten)]
        engine: EngineOptions,
    },
}

/// Settings shared by every way of executing commands
#[derive(Args, Debug, Clone)]
pub struct EngineOptions {
    /// Attempts per command
    #[arg(long, env = "SCREENBOT_RETRIES", default_value_t = 3)]
    pub retries: u32,

    /// Seconds between attempts
    #[arg(long, env = "SCREENBOT_RETRY_DELAY", default_value = "1.5", value_parser = parse_seconds)]
    pub retry_delay: Duration,

    /// Restrict detection to x,y,width,height
    #[arg(long, env = "SCREENBOT_REGION")]
    pub region: Option<ScreenRegion>,

    /// Drop object detections below this confidence
    #[arg(long, env = "SCREENBOT_MIN_CONFIDENCE", default_value_t = 0.5)]
    pub min_confidence: f32,
}

impl EngineOptions {
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(self.retries, self.retry_delay)
    }
}

#[derive(Args, Debug, Clone)]
pub struct RunOptions {
    #[command(flatten)]
    pub engine: EngineOptions,

    /// Run the whole script this many times
    #[arg(long, default_value_t = 1, value_parser = clap::value_parser!(u32).range(1..))]
    pub repeat: u32,

    /// Seconds to pause between repeats
    #[arg(long, default_value = "1", value_parser = parse_seconds)]
    pub iteration_pause: Duration,

    /// Parse and print the instructions without executing them. Useful for
    /// scripts with `find`/`click text`/`click object`/`list objects` lines,
    /// which need a recognizer this binary does not ship
    #[arg(long)]
    pub dry_run: bool,

    /// Print results as JSON
    #[arg(long)]
    pub json: bool,
}

impl RunOptions {
    pub fn iteration_pause(&self) -> Duration {
        self.iteration_pause
    }
}

fn parse_seconds(s: &str) -> Result<Duration, String> {
    let value: f64 = s.trim().parse().map_err(|_| format!("'{s}' is not a number"))?;
    if !value.is_finite() || value < 0.0 {
        return Err(format!("'{s}' must be a non-negative number of seconds"));
    }
    Duration::try_from_secs_f64(value).map_err(|_| format!("'{s}' seconds is too large"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_run_defaults() {
        let cli = Cli::try_parse_from(["screenbot", "run", "bot.txt"]).unwrap();
        let Commands::Run { file, options } = cli.command else {
            panic!("expected run");
        };
        assert_eq!(file, PathBuf::from("bot.txt"));
        assert_eq!(options.repeat, 1);
        assert!(!options.dry_run);
        assert_eq!(options.engine.retry_policy(), RetryPolicy::default());
        assert_eq!(options.iteration_pause(), Duration::from_secs(1));
    }

    #[test]
    fn test_flags() {
        let cli = Cli::try_parse_from([
            "screenbot",
            "preset",
            "vertical",
            "--repeat",
            "4",
            "--retries",
            "5",
            "--retry-delay",
            "0.25",
            "--region",
            "0,0,1000,1080",
            "--json",
        ])
        .unwrap();
        let Commands::Preset { preset, options } = cli.command else {
            panic!("expected preset");
        };
        assert_eq!(preset, Preset::Vertical);
        assert_eq!(options.repeat, 4);
        assert!(options.json);
        assert_eq!(
            options.engine.retry_policy(),
            RetryPolicy::new(5, Duration::from_millis(250))
        );
        assert_eq!(
            options.engine.region,
            Some(ScreenRegion::new(0, 0, 1000, 1080))
        );
    }

    #[test]
    fn test_help_mentions_missing_recognizer() {
        use clap::CommandFactory;

        let mut cmd = Cli::command();
        let preset = cmd
            .find_subcommand_mut("preset")
            .expect("preset subcommand");
        let help = preset.render_long_help().to_string();
        assert!(help.contains("text recognizer"));
        assert!(help.contains("recognizer this binary does not ship"));
    }

    #[test]
    fn test_rejects_bad_values() {
        assert!(Cli::try_parse_from(["screenbot", "run", "a.txt", "--repeat", "0"]).is_err());
        assert!(Cli::try_parse_from(["screenbot", "run", "a.txt", "--retry-delay", "-1"]).is_err());
        assert!(
            Cli::try_parse_from(["screenbot", "run", "a.txt", "--retry-delay", "1e20"]).is_err()
        );
        assert!(
            Cli::try_parse_from(["screenbot", "exec", "wait 1", "--iteration-pause", "1e20"])
                .is_err()
        );
        assert!(Cli::try_parse_from(["screenbot", "run", "a.txt", "--region", "1,2,3"]).is_err());
        assert!(Cli::try_parse_from(["screenbot", "preset", "diagonal"]).is_err());
    }
}
