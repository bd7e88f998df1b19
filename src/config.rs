//! Client configuration.
//!
//! Both structs follow the builder pattern: start from `Default` (or
//! [`StreamConfig::from_env`]) and override with `with_*` setters.
//!
//! # Example
//!
//! ```ignore
//! use sse_resume::config::{ReconnectConfig, StreamConfig};
//! use std::time::Duration;
//!
//! let config = StreamConfig::default()
//!     .with_base_url("http://localhost:4390")
//!     .with_read_timeout(Duration::from_secs(60))
//!     .with_reconnect(ReconnectConfig::default().with_max_retries(None));
//! ```

use std::time::Duration;

use crate::error::ClientError;

pub const DEFAULT_BASE_URL: &str = "http://127.0.0.1:4390";
pub const DEFAULT_STREAM_PATH: &str = "/stream";
pub const DEFAULT_CANCEL_PATH: &str = "/stream/cancel";
pub const DEFAULT_HEALTH_PATH: &str = "/health";

pub const ENV_BASE_URL: &str = "SSE_BASE_URL";
pub const ENV_STREAM_PATH: &str = "SSE_STREAM_PATH";
pub const ENV_CANCEL_PATH: &str = "SSE_CANCEL_PATH";
pub const ENV_CONNECT_TIMEOUT_SECS: &str = "SSE_CONNECT_TIMEOUT_SECS";
pub const ENV_READ_TIMEOUT_SECS: &str = "SSE_READ_TIMEOUT_SECS";
pub const ENV_MAX_RETRIES: &str = "SSE_RECONNECT_MAX_RETRIES";
pub const ENV_MAX_BACKOFF_SECS: &str = "SSE_RECONNECT_MAX_BACKOFF_SECS";

/// Backoff policy between reconnect attempts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReconnectConfig {
    /// Delay before the first reconnect (default: 1s)
    pub initial_delay: Duration,
    /// Upper bound for any single delay (default: 30s)
    pub max_delay: Duration,
    /// Consecutive attempts allowed without a delivered event; `None` retries forever (default: 5)
    pub max_retries: Option<u32>,
}

impl Default for ReconnectConfig {
    fn default() -> Self {
        Self {
            initial_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(30),
            max_retries: Some(5),
        }
    }
}

impl ReconnectConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_initial_delay(mut self, delay: Duration) -> Self {
        self.initial_delay = delay;
        self
    }

    pub fn with_max_delay(mut self, delay: Duration) -> Self {
        self.max_delay = delay;
        self
    }

    /// Bound consecutive attempts. `None` means unlimited.
    pub fn with_max_retries(mut self, retries: Option<u32>) -> Self {
        self.max_retries = retries;
        self
    }

    /// Delay before reconnect number `attempt` (1-based).
    ///
    /// `initial_delay * 2^(attempt - 1)`, capped at `max_delay`.
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(31);
        self.initial_delay
            .checked_mul(1u32 << exponent)
            .unwrap_or(self.max_delay)
            .min(self.max_delay)
    }

    /// Whether reconnect number `attempt` is still allowed.
    pub fn allows(&self, attempt: u32) -> bool {
        self.max_retries.map_or(true, |max| attempt <= max)
    }
}

/// Where the stream server lives and how to talk to it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamConfig {
    /// Server origin, without a trailing slash (default: http://127.0.0.1:4390)
    pub base_url: String,
    /// Path of the event stream endpoint (default: /stream)
    pub stream_path: String,
    /// Path of the remote cancel endpoint (default: /stream/cancel)
    pub cancel_path: String,
    /// Path of the health probe (default: /health)
    pub health_path: String,
    /// Time allowed to establish the connection (default: 10s)
    pub connect_timeout: Duration,
    /// Longest silence tolerated between body chunks; `None` waits forever
    pub read_timeout: Option<Duration>,
    pub reconnect: ReconnectConfig,
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            stream_path: DEFAULT_STREAM_PATH.to_string(),
            cancel_path: DEFAULT_CANCEL_PATH.to_string(),
            health_path: DEFAULT_HEALTH_PATH.to_string(),
            connect_timeout: Duration::from_secs(10),
            read_timeout: None,
            reconnect: ReconnectConfig::default(),
        }
    }
}

impl StreamConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the server origin. A trailing slash is dropped.
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_stream_path(mut self, path: impl Into<String>) -> Self {
        self.stream_path = path.into();
        self
    }

    pub fn with_cancel_path(mut self, path: impl Into<String>) -> Self {
        self.cancel_path = path.into();
        self
    }

    pub fn with_health_path(mut self, path: impl Into<String>) -> Self {
        self.health_path = path.into();
        self
    }

    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    pub fn with_read_timeout(mut self, timeout: Duration) -> Self {
        self.read_timeout = Some(timeout);
        self
    }

    pub fn with_reconnect(mut self, reconnect: ReconnectConfig) -> Self {
        self.reconnect = reconnect;
        self
    }

    /// Defaults overridden by `SSE_*` environment variables.
    ///
    /// Unset or blank variables keep the default. `SSE_READ_TIMEOUT_SECS=0`
    /// disables the read timeout.
    pub fn from_env() -> Result<Self, ClientError> {
        let mut config = Self::default();

        if let Some(url) = env_string(ENV_BASE_URL) {
            config = config.with_base_url(url);
        }
        if let Some(path) = env_string(ENV_STREAM_PATH) {
            config.stream_path = path;
        }
        if let Some(path) = env_string(ENV_CANCEL_PATH) {
            config.cancel_path = path;
        }
        if let Some(secs) = env_u64(ENV_CONNECT_TIMEOUT_SECS)? {
            config.connect_timeout = Duration::from_secs(secs);
        }
        if let Some(secs) = env_u64(ENV_READ_TIMEOUT_SECS)? {
            config.read_timeout = (secs > 0).then(|| Duration::from_secs(secs));
        }
        if let Some(retries) = env_u64(ENV_MAX_RETRIES)? {
            let retries = u32::try_from(retries).map_err(|_| {
                ClientError::Config(format!("{} is out of range: {}", ENV_MAX_RETRIES, retries))
            })?;
            config.reconnect.max_retries = Some(retries);
        }
        if let Some(secs) = env_u64(ENV_MAX_BACKOFF_SECS)? {
            config.reconnect.max_delay = Duration::from_secs(secs);
        }

        Ok(config)
    }

    pub fn stream_url(&self) -> String {
        join_url(&self.base_url, &self.stream_path)
    }

    pub fn cancel_url(&self) -> String {
        join_url(&self.base_url, &self.cancel_path)
    }

    pub fn health_url(&self) -> String {
        join_url(&self.base_url, &self.health_path)
    }
}

fn join_url(base: &str, path: &str) -> String {
    format!(
        "{}/{}",
        base.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}

fn env_string(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

fn env_u64(name: &str) -> Result<Option<u64>, ClientError> {
    match env_string(name) {
        Some(value) => value
            .parse()
            .map(Some)
            .map_err(|_| ClientError::Config(format!("{} must be a whole number, got {:?}", name, value))),
        None => Ok(None),
    }
}
