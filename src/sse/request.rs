//! Parameters of a stream connection.

use crate::traits::Headers;

/// Header carrying the resume cursor.
pub const LAST_EVENT_ID_HEADER: &str = "Last-Event-ID";

/// Media type requested for event streams.
pub const EVENT_STREAM_MIME: &str = "text/event-stream";

/// What to connect to: URL, query parameters, extra headers and an optional
/// initial resume cursor.
///
/// # Example
///
/// ```
/// use sse_resume::sse::StreamRequest;
///
/// let request = StreamRequest::new("http://127.0.0.1:4390/stream")
///     .with_stream_id("job-42")
///     .with_query("sleepMs", "5");
/// assert_eq!(
///     request.url(),
///     "http://127.0.0.1:4390/stream?id=job-42&sleepMs=5"
/// );
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StreamRequest {
    url: String,
    query: Vec<(String, String)>,
    headers: Headers,
    last_event_id: Option<String>,
}

impl StreamRequest {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Default::default()
        }
    }

    /// Append a query parameter. Keys and values are percent-encoded.
    pub fn with_query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((key.into(), value.into()));
        self
    }

    /// Name the stream through the `id` query parameter.
    pub fn with_stream_id(self, id: impl Into<String>) -> Self {
        self.with_query("id", id)
    }

    /// Add a header sent with every connection attempt.
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    /// Resume from `id` on the very first connection.
    pub fn with_last_event_id(mut self, id: impl Into<String>) -> Self {
        self.last_event_id = Some(id.into());
        self
    }

    /// Cursor the first connection resumes from, if any.
    pub fn last_event_id(&self) -> Option<&str> {
        self.last_event_id.as_deref()
    }

    /// Value of the `id` query parameter, if set.
    pub fn stream_id(&self) -> Option<&str> {
        self.query
            .iter()
            .rev()
            .find(|(key, _)| key == "id")
            .map(|(_, value)| value.as_str())
    }

    /// Full request URL including the encoded query string.
    pub fn url(&self) -> String {
        if self.query.is_empty() {
            return self.url.clone();
        }

        let query = self
            .query
            .iter()
            .map(|(key, value)| {
                format!(
                    "{}={}",
                    urlencoding::encode(key),
                    urlencoding::encode(value)
                )
            })
            .collect::<Vec<_>>()
            .join("&");

        let separator = if self.url.contains('?') { '&' } else { '?' };
        format!("{}{}{}", self.url, separator, query)
    }

    /// Headers for one connection attempt.
    ///
    /// `Accept: text/event-stream` is added unless the caller supplied an
    /// `Accept` header. `Last-Event-ID` is present iff `resume_id` is, and
    /// always overrides a caller-supplied one.
    pub fn headers(&self, resume_id: Option<&str>) -> Headers {
        let mut headers: Headers = self
            .headers
            .iter()
            .filter(|(name, _)| !name.eq_ignore_ascii_case(LAST_EVENT_ID_HEADER))
            .map(|(name, value)| (name.clone(), value.clone()))
            .collect();

        if !headers.keys().any(|name| name.eq_ignore_ascii_case("accept")) {
            headers.insert("Accept".to_string(), EVENT_STREAM_MIME.to_string());
        }

        if let Some(id) = resume_id {
            headers.insert(LAST_EVENT_ID_HEADER.to_string(), id.to_string());
        }

        headers
    }
}
