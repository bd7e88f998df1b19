//! Cancel-and-resume walkthrough.
//!
//! 1. open the stream and let `events` events arrive
//! 2. close the connection and post a cancel for the stream
//! 3. reopen once with the last seen id as `Last-Event-ID`
//!
//! Every event of both connections is written as a JSON line tagged with the
//! connection it arrived on.

use std::io::Write;

use serde::Serialize;
use tracing::info;

use crate::client::StreamClient;
use crate::error::ClientError;
use crate::sse::{CancelHandle, Event, SessionReport, StreamRequest};

/// Per-event delay the demo asks the server for, so a cancel can land mid-stream.
pub const DEMO_SLEEP_MS: u64 = 15;

/// One printed line.
#[derive(Debug, Serialize)]
struct DemoLine<'a> {
    connection: u32,
    #[serde(flatten)]
    event: &'a Event,
}

/// What the two connections of a demo run saw.
#[derive(Debug, Clone)]
pub struct DemoSummary {
    pub first: SessionReport,
    pub resumed: Option<SessionReport>,
}

/// Run the demo for stream `stream_id`, writing events to `out`.
///
/// The resume step is skipped when the first connection saw no id.
pub async fn run_demo<W: Write>(
    client: &StreamClient,
    stream_id: &str,
    events: usize,
    out: &mut W,
) -> Result<DemoSummary, ClientError> {
    let request = client
        .request()
        .with_stream_id(stream_id)
        .with_query("sleepMs", DEMO_SLEEP_MS.to_string());

    let cancel = CancelHandle::new();
    let mut seen = 0;
    let first = client
        .stream(&request, cancel.clone(), |event: &Event| {
            seen += 1;
            if seen >= events {
                cancel.cancel();
            }
            print_line(out, 1, event)
        })
        .await;
    info!(
        "First connection stopped ({}) after {} events",
        first.termination.status(),
        first.events_delivered
    );

    client.cancel(stream_id).await?;

    let Some(last_id) = first.last_event_id.clone() else {
        info!("No event id seen, not resuming");
        return Ok(DemoSummary {
            first,
            resumed: None,
        });
    };

    let resume_request = StreamRequest::new(client.config().stream_url())
        .with_stream_id(stream_id)
        .with_last_event_id(last_id);
    let resumed = client
        .stream(&resume_request, CancelHandle::new(), |event: &Event| {
            print_line(out, 2, event)
        })
        .await;
    info!(
        "Resumed connection stopped ({}) after {} events",
        resumed.termination.status(),
        resumed.events_delivered
    );

    Ok(DemoSummary {
        first,
        resumed: Some(resumed),
    })
}

fn print_line<W: Write>(out: &mut W, connection: u32, event: &Event) -> crate::error::HandlerResult {
    let line = serde_json::to_string(&DemoLine { connection, event })?;
    writeln!(out, "{}", line)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::mock::{MockHttpClient, MockResponse};
    use crate::config::StreamConfig;
    use crate::sse::Termination;
    use crate::traits::Response;
    use bytes::Bytes;
    use std::sync::Arc;

    fn demo_client(mock: &MockHttpClient) -> StreamClient {
        StreamClient::with_http_client(
            StreamConfig::default().with_base_url("http://test"),
            Arc::new(mock.clone()),
        )
    }

    fn ok() -> MockResponse {
        MockResponse::Success(Response::new(200, Bytes::from(r#"{"ok":true}"#)))
    }

    #[tokio::test]
    async fn test_demo_cancels_and_resumes() {
        let mock = MockHttpClient::new();
        mock.push_response(
            "http://test/stream?",
            MockResponse::StreamThenHang(vec![Bytes::from(
                "id: 0\nevent: hello\ndata: {}\n\nid: 1\nevent: token\ndata: {\"text\":\"draft\"}\n\nid: 2\nevent: cost\ndata: {}\n\n",
            )]),
        );
        mock.push_response(
            "http://test/stream?",
            MockResponse::whole("id: 2\nevent: cancelled\ndata: {\"reason\":\"client\"}\n\n"),
        );
        mock.set_response("http://test/stream/cancel", ok());

        let client = demo_client(&mock);
        let mut out = Vec::new();
        let summary = run_demo(&client, "demo-1", 2, &mut out).await.unwrap();

        assert_eq!(summary.first.termination, Termination::Cancelled);
        assert_eq!(summary.first.events_delivered, 2);
        assert_eq!(summary.first.last_event_id.as_deref(), Some("1"));

        let resumed = summary.resumed.unwrap();
        assert_eq!(resumed.termination, Termination::Cancelled);

        let requests = mock.get_requests();
        assert_eq!(requests.len(), 3);
        assert_eq!(requests[0].url, "http://test/stream?id=demo-1&sleepMs=15");
        assert_eq!(requests[1].method, "POST");
        assert_eq!(requests[2].url, "http://test/stream?id=demo-1");
        assert_eq!(requests[2].header("Last-Event-ID"), Some("1"));

        let text = String::from_utf8(out).unwrap();
        let lines: Vec<serde_json::Value> = text
            .lines()
            .map(|line| serde_json::from_str(line).unwrap())
            .collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0]["connection"], 1);
        assert_eq!(lines[0]["name"], "hello");
        assert_eq!(lines[2]["connection"], 2);
        assert_eq!(lines[2]["name"], "cancelled");
    }

    #[tokio::test]
    async fn test_demo_without_ids_does_not_resume() {
        let mock = MockHttpClient::new();
        mock.push_response("http://test/stream?", MockResponse::whole("data: anonymous\n\n"));
        mock.set_response("http://test/stream/cancel", ok());

        let client = demo_client(&mock);
        let mut out = Vec::new();
        let summary = run_demo(&client, "demo-2", 5, &mut out).await.unwrap();

        assert!(summary.resumed.is_none());
        assert_eq!(summary.first.termination, Termination::Ended);
        assert_eq!(mock.get_requests().len(), 2);
    }
}
