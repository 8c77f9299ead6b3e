use crate::engine::RunSummary;
use std::path::PathBuf;
use thiserror::Error;

/// Errors raised by a perception/actuation provider.
///
/// Fatal variants mean the provider cannot work at all (no capture device, no
/// recognizer); everything else is a single failed attempt that the engine
/// retries like any other failure.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ProviderError {
    #[error("Screen capture unavailable: {0}")]
    CaptureUnavailable(String),

    #[error("Recognizer unavailable: {0}")]
    RecognizerUnavailable(String),

    #[error("Recognition failed: {0}")]
    Recognition(String),

    #[error("Input simulation failed: {0}")]
    Input(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Unsupported operation: {0}")]
    UnsupportedOperation(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl ProviderError {
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            ProviderError::CaptureUnavailable(_) | ProviderError::RecognizerUnavailable(_)
        )
    }
}

/// A command line that does not match the command grammar.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CommandError {
    #[error("Empty command")]
    Empty,

    #[error("Unknown command: {0}")]
    Unknown(String),

    #[error("Invalid arguments for '{verb}': {reason}")]
    InvalidArguments { verb: String, reason: String },
}

impl CommandError {
    pub(crate) fn invalid(verb: &str, reason: impl Into<String>) -> Self {
        CommandError::InvalidArguments {
            verb: verb.to_string(),
            reason: reason.into(),
        }
    }
}

#[derive(Error, Debug)]
pub enum ScriptError {
    #[error("Failed to read script file {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Run-level failure, distinct from an instruction that merely failed.
#[derive(Error, Debug)]
pub enum RunError {
    #[error("Provider failure at line {line} ('{command}'): {source}")]
    Provider {
        line: usize,
        command: String,
        #[source]
        source: ProviderError,
        /// Progress up to the failing instruction
        summary: Box<RunSummary>,
    },
}
