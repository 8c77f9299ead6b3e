//! Script-driven screen automation
//!
//! A script is plain text: one command per line, with `#` comment lines that
//! may carry directives (`IF_FAIL_THEN`, `LOOP_IF_SUCCESS`, `STOP_ON_FAIL`)
//! for the command above them. [`Script::parse`] turns the text into
//! [`Instruction`]s, [`ExecutionEngine::run`] walks them with retries,
//! fallbacks and jumps, and every command is carried out by an
//! [`ActionDispatcher`] against a [`ScreenProvider`].

pub mod batch;
pub mod command;
pub mod desktop;
pub mod dispatcher;
pub mod engine;
pub mod errors;
pub mod progress;
pub mod provider;
pub mod script;
#[cfg(test)]
mod tests;
pub mod types;
pub mod utils;

pub use batch::{run_repeated, BatchOutcome, DEFAULT_ITERATION_PAUSE};
pub use command::{Command, Target};
pub use desktop::DesktopProvider;
pub use dispatcher::ActionDispatcher;
pub use engine::{AbortKind, ExecutionEngine, RetryPolicy, RunSummary};
pub use errors::{CommandError, ProviderError, RunError, ScriptError};
pub use progress::ProgressEvent;
pub use provider::ScreenProvider;
pub use script::{Instruction, ParseWarning, ParseWarningKind, Script};
pub use types::{BoundingBox, ObjectMatch, Point, ScreenRegion, TextMatch};
