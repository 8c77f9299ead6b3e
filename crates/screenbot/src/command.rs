//! Command grammar
//!
//! Verbs are case-insensitive and arguments are whitespace separated:
//!
//! | command                         | effect                              |
//! |---------------------------------|-------------------------------------|
//! | `find text <text…>`             | look for text on screen             |
//! | `find object <class…>`          | look for an object on screen        |
//! | `click <x> <y>`                 | click absolute coordinates          |
//! | `click text <text…> [index]`    | click the index-th text match       |
//! | `click object <class…> [index]` | click the index-th object match     |
//! | `type <text…>`                  | type text                           |
//! | `press <key>`                   | press a single key                  |
//! | `list objects`                  | report every detected object        |
//! | `wait <seconds>`                | pause                               |

use crate::errors::CommandError;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Target {
    Text,
    Object,
}

impl Target {
    fn parse(token: &str) -> Option<Self> {
        match token.to_lowercase().as_str() {
            "text" => Some(Target::Text),
            "object" => Some(Target::Object),
            _ => None,
        }
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Target::Text => write!(f, "text"),
            Target::Object => write!(f, "object"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Find {
        target: Target,
        query: String,
    },
    ClickAt {
        x: i32,
        y: i32,
    },
    ClickMatch {
        target: Target,
        query: String,
        index: usize,
    },
    Type(String),
    Press(String),
    ListObjects,
    Wait(Duration),
}

impl Command {
    pub fn parse(text: &str) -> Result<Self, CommandError> {
        let tokens: Vec<&str> = text.split_whitespace().collect();
        let Some((verb_token, args)) = tokens.split_first() else {
            return Err(CommandError::Empty);
        };
        let verb = verb_token.to_lowercase();

        match verb.as_str() {
            "find" => {
                let target = args.first().and_then(|t| Target::parse(t)).ok_or_else(|| {
                    CommandError::invalid(&verb, "expected 'text' or 'object'")
                })?;
                if args.len() < 2 {
                    return Err(CommandError::invalid(&verb, "missing search target"));
                }
                Ok(Command::Find {
                    target,
                    query: args[1..].join(" "),
                })
            }
            "click" => {
                if let Some(target) = args.first().and_then(|t| Target::parse(t)) {
                    let rest = &args[1..];
                    if rest.is_empty() {
                        return Err(CommandError::invalid(&verb, "missing search target"));
                    }
                    // A trailing integer is only an index when there is still a
                    // target left in front of it.
                    let explicit_index = if args.len() > 2 {
                        rest.last().and_then(|last| parse_index(last))
                    } else {
                        None
                    };
                    let (query, index) = match explicit_index {
                        Some(index) => (rest[..rest.len() - 1].join(" "), index),
                        None => (rest.join(" "), 0),
                    };
                    return Ok(Command::ClickMatch {
                        target,
                        query,
                        index,
                    });
                }

                if args.len() != 2 {
                    return Err(CommandError::invalid(
                        &verb,
                        "expected '<x> <y>', 'text <text> [index]' or 'object <class> [index]'",
                    ));
                }
                let x = args[0].parse::<i32>().map_err(|_| {
                    CommandError::invalid(&verb, format!("invalid coordinates: {} {}", args[0], args[1]))
                })?;
                let y = args[1].parse::<i32>().map_err(|_| {
                    CommandError::invalid(&verb, format!("invalid coordinates: {} {}", args[0], args[1]))
                })?;
                Ok(Command::ClickAt { x, y })
            }
            "type" => {
                if args.is_empty() {
                    return Err(CommandError::invalid(&verb, "missing text"));
                }
                Ok(Command::Type(args.join(" ")))
            }
            "press" => {
                let key = args
                    .first()
                    .ok_or_else(|| CommandError::invalid(&verb, "missing key"))?;
                Ok(Command::Press(key.to_lowercase()))
            }
            "list" => match args.first() {
                Some(what) if what.eq_ignore_ascii_case("objects") => Ok(Command::ListObjects),
                _ => Err(CommandError::invalid(&verb, "expected 'list objects'")),
            },
            "wait" => {
                let raw = args
                    .first()
                    .ok_or_else(|| CommandError::invalid(&verb, "missing duration"))?;
                let seconds = raw
                    .parse::<f64>()
                    .map_err(|_| CommandError::invalid(&verb, format!("invalid wait time: {raw}")))?;
                if !seconds.is_finite() || seconds < 0.0 {
                    return Err(CommandError::invalid(
                        &verb,
                        format!("wait time must be a non-negative number: {raw}"),
                    ));
                }
                let duration = Duration::try_from_secs_f64(seconds).map_err(|_| {
                    CommandError::invalid(&verb, format!("wait time too large: {raw}"))
                })?;
                Ok(Command::Wait(duration))
            }
            _ => Err(CommandError::Unknown(text.trim().to_string())),
        }
    }
}

impl FromStr for Command {
    type Err = CommandError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Command::parse(s)
    }
}

fn parse_index(token: &str) -> Option<usize> {
    if token.is_empty() || !token.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    token.parse::<usize>().ok()
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Command::Find { target, query } => write!(f, "find {target} {query}"),
            Command::ClickAt { x, y } => write!(f, "click {x} {y}"),
            Command::ClickMatch {
                target,
                query,
                index,
            } => write!(f, "click {target} {query} {index}"),
            Command::Type(text) => write!(f, "type {text}"),
            Command::Press(key) => write!(f, "press {key}"),
            Command::ListObjects => write!(f, "list objects"),
            Command::Wait(duration) => write!(f, "wait {}", duration.as_secs_f64()),
        }
    }
}
