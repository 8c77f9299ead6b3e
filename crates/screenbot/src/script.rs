//! Line-oriented script parsing
//!
//! A script is a list of command lines. Comment lines starting with `#` may
//! carry a directive that annotates the nearest preceding command:
//!
//! ```text
//! click text x20 2
//! # IF_FAIL_THEN click text x5o 2
//! click text cancel 1
//! # STOP_ON_FAIL
//! # LOOP_IF_SUCCESS 1
//! ```
//!
//! Every non-blank line gets a 1-based line number; a command keeps the
//! number of its own line, which is what `LOOP_IF_SUCCESS` refers to.

use crate::errors::ScriptError;
use serde::Serialize;
use std::collections::HashSet;
use std::fmt;
use std::path::Path;
use tracing::{debug, warn};

/// One executable step derived from one command line
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Instruction {
    pub line_number: usize,
    pub command_text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub on_fail_alternative: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub loop_target_line: Option<usize>,
    pub stop_on_fail: bool,
}

impl Instruction {
    fn new(line_number: usize, command_text: &str) -> Self {
        Self {
            line_number,
            command_text: command_text.to_string(),
            on_fail_alternative: None,
            loop_target_line: None,
            stop_on_fail: false,
        }
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.line_number, self.command_text)?;
        if let Some(alt) = &self.on_fail_alternative {
            write!(f, " | if fail: {alt}")?;
        }
        if let Some(target) = self.loop_target_line {
            write!(f, " | on success: goto {target}")?;
        }
        if self.stop_on_fail {
            write!(f, " | stop on fail")?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DirectiveKind {
    IfFailThen,
    LoopIfSuccess,
    StopOnFail,
}

impl DirectiveKind {
    fn from_name(name: &str) -> Option<Self> {
        match name.to_uppercase().as_str() {
            "IF_FAIL_THEN" => Some(DirectiveKind::IfFailThen),
            "LOOP_IF_SUCCESS" => Some(DirectiveKind::LoopIfSuccess),
            "STOP_ON_FAIL" => Some(DirectiveKind::StopOnFail),
            _ => None,
        }
    }
}

/// Non-fatal problems found while parsing
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ParseWarningKind {
    OrphanDirective { directive: String },
    UnknownDirective { name: String },
    InvalidLoopTarget { value: Option<String> },
    MissingAlternative,
    UnresolvedJumpTarget { target: usize },
    NoCommands,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ParseWarning {
    /// Line the warning refers to; 0 for whole-script warnings
    pub line: usize,
    #[serde(flatten)]
    pub kind: ParseWarningKind,
}

impl fmt::Display for ParseWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            ParseWarningKind::OrphanDirective { directive } => write!(
                f,
                "Directive '{directive}' on line {} has no preceding command",
                self.line
            ),
            ParseWarningKind::UnknownDirective { name } => {
                write!(f, "Unknown directive '{name}' on line {}", self.line)
            }
            ParseWarningKind::InvalidLoopTarget { value } => write!(
                f,
                "Invalid line number {:?} for LOOP_IF_SUCCESS on line {}",
                value.as_deref().unwrap_or(""),
                self.line
            ),
            ParseWarningKind::MissingAlternative => write!(
                f,
                "IF_FAIL_THEN on line {} has no alternative command",
                self.line
            ),
            ParseWarningKind::UnresolvedJumpTarget { target } => write!(
                f,
                "LOOP_IF_SUCCESS target line {target} (from line {}) is not a command line",
                self.line
            ),
            ParseWarningKind::NoCommands => write!(f, "No commands found in script"),
        }
    }
}

/// A parsed script: instructions in source order plus any warnings
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct Script {
    pub instructions: Vec<Instruction>,
    pub warnings: Vec<ParseWarning>,
}

impl Script {
    /// Parse script text. Never fails; malformed directives become warnings.
    pub fn parse(text: &str) -> Self {
        let mut instructions: Vec<Instruction> = Vec::new();
        let mut warnings = Vec::new();
        let mut line_number = 0usize;

        for raw_line in text.lines() {
            let line = raw_line.trim();
            if line.is_empty() {
                continue;
            }
            line_number += 1;

            let Some(comment) = line.strip_prefix('#') else {
                instructions.push(Instruction::new(line_number, line));
                continue;
            };

            let content = comment.trim();
            if content.is_empty() {
                continue;
            }

            let (name, value) = match content.split_once(' ') {
                Some((name, value)) => {
                    let value = value.trim();
                    (name, (!value.is_empty()).then_some(value))
                }
                None => (content, None),
            };

            let Some(current) = instructions.last_mut() else {
                warnings.push(ParseWarning {
                    line: line_number,
                    kind: ParseWarningKind::OrphanDirective {
                        directive: line.to_string(),
                    },
                });
                continue;
            };

            match DirectiveKind::from_name(name) {
                Some(DirectiveKind::IfFailThen) => match value {
                    Some(alt) => current.on_fail_alternative = Some(alt.to_string()),
                    None => warnings.push(ParseWarning {
                        line: line_number,
                        kind: ParseWarningKind::MissingAlternative,
                    }),
                },
                Some(DirectiveKind::LoopIfSuccess) => {
                    match value.and_then(|v| v.parse::<usize>().ok()) {
                        Some(target) => current.loop_target_line = Some(target),
                        None => warnings.push(ParseWarning {
                            line: line_number,
                            kind: ParseWarningKind::InvalidLoopTarget {
                                value: value.map(str::to_string),
                            },
                        }),
                    }
                }
                Some(DirectiveKind::StopOnFail) => current.stop_on_fail = true,
                None => warnings.push(ParseWarning {
                    line: line_number,
                    kind: ParseWarningKind::UnknownDirective {
                        name: name.to_uppercase(),
                    },
                }),
            }
        }

        let command_lines: HashSet<usize> = instructions.iter().map(|i| i.line_number).collect();
        for instruction in &instructions {
            if let Some(target) = instruction.loop_target_line {
                if !command_lines.contains(&target) {
                    warnings.push(ParseWarning {
                        line: instruction.line_number,
                        kind: ParseWarningKind::UnresolvedJumpTarget { target },
                    });
                }
            }
        }

        if instructions.is_empty() {
            warnings.push(ParseWarning {
                line: 0,
                kind: ParseWarningKind::NoCommands,
            });
        }

        for warning in &warnings {
            warn!("{}", warning);
        }
        debug!(
            instructions = instructions.len(),
            warnings = warnings.len(),
            "Parsed script"
        );

        Script {
            instructions,
            warnings,
        }
    }

    /// Read a UTF-8 script file and parse it
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ScriptError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ScriptError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(Self::parse(&text))
    }

    pub fn is_empty(&self) -> bool {
        self.instructions.is_empty()
    }

    pub fn len(&self) -> usize {
        self.instructions.len()
    }
}

/// Convenience for callers that only need the instructions
pub fn parse(text: &str) -> Vec<Instruction> {
    Script::parse(text).instructions
}
