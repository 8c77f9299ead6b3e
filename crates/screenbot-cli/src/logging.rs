use anyhow::Result;
use std::env;
use std::path::PathBuf;
use tracing::Level;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

fn level_from_env(default: Level) -> Level {
    env::var("LOG_LEVEL")
        .map(|level| match level.to_lowercase().as_str() {
            "error" => Level::ERROR,
            "warn" => Level::WARN,
            "info" => Level::INFO,
            "debug" => Level::DEBUG,
            "trace" => Level::TRACE,
            _ => default,
        })
        .unwrap_or(default)
}

pub fn log_dir() -> PathBuf {
    if let Ok(custom_dir) = env::var("SCREENBOT_LOG_DIR") {
        return PathBuf::from(custom_dir);
    }
    dirs::data_local_dir()
        .unwrap_or_else(env::temp_dir)
        .join("screenbot")
        .join("logs")
}

/// Install the global subscriber: stderr plus a daily rolling file.
///
/// Progress is printed to stdout separately, so the console layer only shows
/// warnings unless `LOG_LEVEL` asks for more. The file layer records info and
/// up by default.
pub fn init_logging() -> Result<()> {
    use tracing_appender::rolling;

    let console_level = level_from_env(Level::WARN);
    let file_level = level_from_env(Level::INFO);

    let log_dir = log_dir();
    let file_layer = match std::fs::create_dir_all(&log_dir) {
        Ok(()) => {
            let file_appender = rolling::daily(&log_dir, "screenbot.log");
            Some(
                tracing_subscriber::fmt::layer()
                    .with_writer(file_appender)
                    .with_ansi(false)
                    .with_target(true)
                    .with_thread_ids(true)
                    .with_file(true)
                    .with_line_number(true)
                    .with_filter(EnvFilter::from_default_env().add_directive(file_level.into())),
            )
        }
        Err(e) => {
            eprintln!("Failed to create log directory {}: {e}", log_dir.display());
            None
        }
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false)
                .with_filter(EnvFilter::from_default_env().add_directive(console_level.into())),
        )
        .with(file_layer)
        .try_init()?;

    Ok(())
}
