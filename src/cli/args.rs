//! Command-line argument parsing for the sse-resume CLI.
//!
//! This module handles parsing command-line arguments and determining
//! which CLI command to execute.

use std::fmt;

/// Options of the `stream` command.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StreamArgs {
    /// Stream name, sent as the `id` query parameter
    pub id: Option<String>,
    /// Cursor to resume from on the first connection
    pub last_event_id: Option<String>,
    /// Keep reconnecting after failures
    pub reconnect: bool,
    /// Extra request headers (`--header Name:Value`)
    pub headers: Vec<(String, String)>,
    /// Extra query parameters (`--query key=value`)
    pub query: Vec<(String, String)>,
}

/// Parsed CLI command to execute.
#[derive(Debug, Clone, PartialEq)]
pub enum CliCommand {
    /// Show version information
    Version,
    /// Show usage
    Help,
    /// Print events of a stream as JSON lines
    Stream(StreamArgs),
    /// Ask the server to cancel a stream
    Cancel { id: String },
    /// Probe server health
    Health,
    /// Stream, cancel, then resume once from the last id
    Demo { id: Option<String>, events: usize },
}

/// Everything on the command line.
#[derive(Debug, Clone, PartialEq)]
pub struct CliArgs {
    /// Overrides `SSE_BASE_URL`
    pub base_url: Option<String>,
    pub command: CliCommand,
}

/// Default number of events the demo lets through before cancelling.
pub const DEFAULT_DEMO_EVENTS: usize = 2;

/// Invalid command line.
#[derive(Debug, Clone, PartialEq)]
pub enum ArgsError {
    MissingValue(String),
    InvalidValue { flag: String, value: String },
    UnknownArgument(String),
}

impl fmt::Display for ArgsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgsError::MissingValue(flag) => write!(f, "{} requires a value", flag),
            ArgsError::InvalidValue { flag, value } => {
                write!(f, "invalid value for {}: {}", flag, value)
            }
            ArgsError::UnknownArgument(arg) => write!(f, "unexpected argument: {}", arg),
        }
    }
}

impl std::error::Error for ArgsError {}

/// Usage text printed by `--help`.
pub const USAGE: &str = "\
Usage: sse-resume [--base-url URL] <COMMAND>

Commands:
  stream [--id ID] [--last-event-id ID] [--reconnect]
         [--header NAME:VALUE]... [--query KEY=VALUE]...
                      Print each event as a JSON line
  cancel <ID>         Ask the server to cancel stream ID
  health              Check that the server is up
  demo [--id ID] [--events N]
                      Stream, cancel after N events, resume once

Options:
  --base-url URL      Server origin (default: $SSE_BASE_URL or http://127.0.0.1:4390)
  -h, --help          Show this help
  -V, --version       Show version

Logging is controlled with RUST_LOG (default: sse_resume=info).";

/// Parse command-line arguments and return the command to execute.
///
/// # Arguments
///
/// * `args` - Iterator of command-line arguments (typically `std::env::args()`)
///
/// # Examples
///
/// ```
/// use sse_resume::cli::args::{parse_args, CliCommand};
///
/// let args = vec!["sse-resume".to_string(), "--version".to_string()];
/// assert_eq!(parse_args(args.into_iter()).unwrap().command, CliCommand::Version);
/// ```
pub fn parse_args<I>(args: I) -> Result<CliArgs, ArgsError>
where
    I: Iterator<Item = String>,
{
    // Skip the program name
    let mut args = args.skip(1);
    let mut base_url = None;
    let mut command = None;

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--version" | "-V" => {
                return Ok(CliArgs {
                    base_url,
                    command: CliCommand::Version,
                })
            }
            "--help" | "-h" => {
                return Ok(CliArgs {
                    base_url,
                    command: CliCommand::Help,
                })
            }
            "--base-url" => base_url = Some(value_of(&arg, args.next())?),
            "stream" if command.is_none() => command = Some(parse_stream(&mut args)?),
            "cancel" if command.is_none() => {
                let id = args
                    .next()
                    .ok_or_else(|| ArgsError::MissingValue("cancel".to_string()))?;
                command = Some(CliCommand::Cancel { id });
            }
            "health" if command.is_none() => command = Some(CliCommand::Health),
            "demo" if command.is_none() => command = Some(parse_demo(&mut args)?),
            _ => return Err(ArgsError::UnknownArgument(arg)),
        }
    }

    Ok(CliArgs {
        base_url,
        command: command.unwrap_or(CliCommand::Help),
    })
}

fn parse_stream<I>(args: &mut I) -> Result<CliCommand, ArgsError>
where
    I: Iterator<Item = String>,
{
    let mut stream = StreamArgs::default();
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--id" => stream.id = Some(value_of(&arg, args.next())?),
            "--last-event-id" => stream.last_event_id = Some(value_of(&arg, args.next())?),
            "--reconnect" => stream.reconnect = true,
            "--header" => {
                let value = value_of(&arg, args.next())?;
                stream.headers.push(split_pair(&arg, &value, ':')?);
            }
            "--query" => {
                let value = value_of(&arg, args.next())?;
                stream.query.push(split_pair(&arg, &value, '=')?);
            }
            _ => return Err(ArgsError::UnknownArgument(arg)),
        }
    }
    Ok(CliCommand::Stream(stream))
}

fn parse_demo<I>(args: &mut I) -> Result<CliCommand, ArgsError>
where
    I: Iterator<Item = String>,
{
    let mut id = None;
    let mut events = DEFAULT_DEMO_EVENTS;
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--id" => id = Some(value_of(&arg, args.next())?),
            "--events" => {
                let value = value_of(&arg, args.next())?;
                events = match value.parse::<usize>() {
                    Ok(n) if n > 0 => n,
                    _ => return Err(ArgsError::InvalidValue { flag: arg, value }),
                };
            }
            _ => return Err(ArgsError::UnknownArgument(arg)),
        }
    }
    Ok(CliCommand::Demo { id, events })
}

fn value_of(flag: &str, value: Option<String>) -> Result<String, ArgsError> {
    value.ok_or_else(|| ArgsError::MissingValue(flag.to_string()))
}

fn split_pair(flag: &str, value: &str, separator: char) -> Result<(String, String), ArgsError> {
    match value.split_once(separator) {
        Some((key, val)) if !key.trim().is_empty() => {
            Ok((key.trim().to_string(), val.trim().to_string()))
        }
        _ => Err(ArgsError::InvalidValue {
            flag: flag.to_string(),
            value: value.to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Result<CliArgs, ArgsError> {
        let mut full = vec!["sse-resume".to_string()];
        full.extend(args.iter().map(|arg| arg.to_string()));
        parse_args(full.into_iter())
    }

    #[test]
    fn test_parse_version_flag() {
        assert_eq!(parse(&["--version"]).unwrap().command, CliCommand::Version);
        assert_eq!(parse(&["-V"]).unwrap().command, CliCommand::Version);
    }

    #[test]
    fn test_parse_no_args_shows_help() {
        assert_eq!(parse(&[]).unwrap().command, CliCommand::Help);
        assert_eq!(parse(&["-h"]).unwrap().command, CliCommand::Help);
    }

    #[test]
    fn test_parse_stream_defaults() {
        let args = parse(&["stream"]).unwrap();
        assert_eq!(args.base_url, None);
        assert_eq!(args.command, CliCommand::Stream(StreamArgs::default()));
    }

    #[test]
    fn test_parse_stream_options() {
        let args = parse(&[
            "--base-url",
            "http://localhost:4390",
            "stream",
            "--id",
            "job-1",
            "--last-event-id",
            "3",
            "--reconnect",
            "--header",
            "Authorization: Bearer t",
            "--query",
            "sleepMs=15",
        ])
        .unwrap();

        assert_eq!(args.base_url.as_deref(), Some("http://localhost:4390"));
        assert_eq!(
            args.command,
            CliCommand::Stream(StreamArgs {
                id: Some("job-1".to_string()),
                last_event_id: Some("3".to_string()),
                reconnect: true,
                headers: vec![("Authorization".to_string(), "Bearer t".to_string())],
                query: vec![("sleepMs".to_string(), "15".to_string())],
            })
        );
    }

    #[test]
    fn test_parse_cancel() {
        assert_eq!(
            parse(&["cancel", "job-9"]).unwrap().command,
            CliCommand::Cancel {
                id: "job-9".to_string()
            }
        );
        assert_eq!(
            parse(&["cancel"]),
            Err(ArgsError::MissingValue("cancel".to_string()))
        );
    }

    #[test]
    fn test_parse_health() {
        assert_eq!(parse(&["health"]).unwrap().command, CliCommand::Health);
    }

    #[test]
    fn test_parse_demo() {
        assert_eq!(
            parse(&["demo"]).unwrap().command,
            CliCommand::Demo {
                id: None,
                events: DEFAULT_DEMO_EVENTS
            }
        );
        assert_eq!(
            parse(&["demo", "--id", "demo-1", "--events", "3"]).unwrap().command,
            CliCommand::Demo {
                id: Some("demo-1".to_string()),
                events: 3
            }
        );
    }

    #[test]
    fn test_parse_demo_rejects_zero_events() {
        assert!(matches!(
            parse(&["demo", "--events", "0"]),
            Err(ArgsError::InvalidValue { .. })
        ));
    }

    #[test]
    fn test_parse_missing_flag_value() {
        assert_eq!(
            parse(&["stream", "--id"]),
            Err(ArgsError::MissingValue("--id".to_string()))
        );
    }

    #[test]
    fn test_parse_bad_header() {
        assert!(matches!(
            parse(&["stream", "--header", "no-colon"]),
            Err(ArgsError::InvalidValue { .. })
        ));
    }

    #[test]
    fn test_parse_unknown_argument() {
        assert_eq!(
            parse(&["--unknown"]),
            Err(ArgsError::UnknownArgument("--unknown".to_string()))
        );
        assert!(parse(&["health", "stream"]).is_err());
    }

    #[test]
    fn test_error_display() {
        assert_eq!(
            ArgsError::MissingValue("--id".to_string()).to_string(),
            "--id requires a value"
        );
    }
}
