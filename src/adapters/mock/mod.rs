//! Mock implementations for testing.
//!
//! Lets sessions and the reconnect controller be exercised without network
//! access, with full control over chunk boundaries and failure points.

pub mod http;

pub use http::{MockHttpClient, MockResponse, RecordedRequest};
