//! CLI module for sse-resume.
//!
//! This module provides command-line interface functionality including:
//! - Argument parsing
//! - Version display
//! - The `stream`, `cancel`, `health` and `demo` commands
//!
//! # Usage
//!
//! ```ignore
//! use sse_resume::cli::{parse_args, run_cli_command};
//!
//! let args = parse_args(std::env::args())?;
//! run_cli_command(args).await?;
//! ```

pub mod args;
pub mod demo;
pub mod version;

pub use args::{parse_args, ArgsError, CliArgs, CliCommand, StreamArgs, USAGE};
pub use demo::{run_demo, DemoSummary};
pub use version::{handle_version_command, VERSION};

use std::io::Write;

use color_eyre::eyre::{bail, eyre};
use color_eyre::Result;
use tracing::{info, warn};

use crate::client::StreamClient;
use crate::config::StreamConfig;
use crate::sse::{default_should_reconnect, CancelHandle, Event, StreamRequest, Termination};

/// Build the client configuration: environment first, then `--base-url`.
pub fn load_config(base_url: Option<&str>) -> Result<StreamConfig> {
    let config = StreamConfig::from_env()?;
    Ok(match base_url {
        Some(url) => config.with_base_url(url),
        None => config,
    })
}

/// Run a parsed command.
///
/// # Note
///
/// The `Version` command never returns as it calls `std::process::exit(0)`.
pub async fn run_cli_command(args: CliArgs) -> Result<()> {
    let CliArgs { base_url, command } = args;

    match command {
        CliCommand::Version => handle_version_command(),
        CliCommand::Help => {
            println!("{}", USAGE);
            Ok(())
        }
        CliCommand::Stream(stream_args) => {
            let client = StreamClient::from_config(load_config(base_url.as_deref())?)?;
            handle_stream_command(&client, stream_args).await
        }
        CliCommand::Cancel { id } => {
            let client = StreamClient::from_config(load_config(base_url.as_deref())?)?;
            client.cancel(&id).await?;
            println!("Cancel requested for {}", id);
            Ok(())
        }
        CliCommand::Health => {
            let client = StreamClient::from_config(load_config(base_url.as_deref())?)?;
            if !client.health_check().await? {
                bail!("{} is not healthy", client.config().health_url());
            }
            println!("{} is healthy", client.base_url());
            Ok(())
        }
        CliCommand::Demo { id, events } => {
            let client = StreamClient::from_config(load_config(base_url.as_deref())?)?;
            let id = id.unwrap_or_else(|| format!("demo-{}", uuid::Uuid::new_v4()));
            info!("Running demo on stream {}", id);
            run_demo(&client, &id, events, &mut std::io::stdout()).await?;
            Ok(())
        }
    }
}

/// Build the request described by `stream` against `client`'s endpoint.
pub fn build_request(client: &StreamClient, stream: &StreamArgs) -> StreamRequest {
    let mut request = client.request();
    if let Some(id) = &stream.id {
        request = request.with_stream_id(id);
    }
    for (key, value) in &stream.query {
        request = request.with_query(key, value);
    }
    for (name, value) in &stream.headers {
        request = request.with_header(name, value);
    }
    if let Some(last) = &stream.last_event_id {
        request = request.with_last_event_id(last);
    }
    request
}

async fn handle_stream_command(client: &StreamClient, stream: StreamArgs) -> Result<()> {
    let request = build_request(client, &stream);
    let print = |event: &Event| -> crate::error::HandlerResult {
        let line = serde_json::to_string(event)?;
        writeln!(std::io::stdout().lock(), "{}", line)?;
        Ok(())
    };

    let (termination, last_event_id) = if stream.reconnect {
        let controller = client.reconnecting();
        spawn_ctrl_c(controller.cancel_handle());
        let outcome = controller
            .run(&request, print, default_should_reconnect)
            .await;
        (outcome.termination, outcome.last_event_id)
    } else {
        let cancel = CancelHandle::new();
        spawn_ctrl_c(cancel.clone());
        let report = client.stream(&request, cancel, print).await;
        (report.termination, report.last_event_id)
    };

    if let Some(id) = &last_event_id {
        info!("Last event id: {} (pass --last-event-id {} to resume)", id, id);
    }

    match termination {
        Termination::Failed(err) => Err(eyre!("[{}] {}", err.error_code(), err.user_message())),
        Termination::Ended | Termination::Cancelled => Ok(()),
    }
}

/// Close the stream on Ctrl-C.
fn spawn_ctrl_c(cancel: CancelHandle) {
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                info!("Interrupted, closing stream");
                cancel.cancel();
            }
            Err(e) => warn!("Failed to listen for Ctrl-C: {}", e),
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::mock::MockHttpClient;
    use std::sync::Arc;

    #[test]
    fn test_build_request() {
        let client = StreamClient::with_http_client(
            StreamConfig::default().with_base_url("http://test"),
            Arc::new(MockHttpClient::new()),
        );
        let stream = StreamArgs {
            id: Some("job-1".to_string()),
            last_event_id: Some("4".to_string()),
            reconnect: false,
            headers: vec![("X-Trace".to_string(), "abc".to_string())],
            query: vec![("sleepMs".to_string(), "5".to_string())],
        };

        let request = build_request(&client, &stream);
        assert_eq!(request.url(), "http://test/stream?id=job-1&sleepMs=5");
        assert_eq!(request.last_event_id(), Some("4"));
        assert_eq!(
            request.headers(None).get("X-Trace").map(String::as_str),
            Some("abc")
        );
    }

    #[tokio::test]
    async fn test_help_succeeds() {
        let args = CliArgs {
            base_url: None,
            command: CliCommand::Help,
        };
        assert!(run_cli_command(args).await.is_ok());
    }
}
