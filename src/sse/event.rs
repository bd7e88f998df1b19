//! Event assembly from a single frame block.
//!
//! Field rules:
//! - `event: <name>` sets the event name, last occurrence wins
//! - `id: <id>` sets the event id, last occurrence wins
//! - `data: <line>` lines are joined with `\n` in arrival order
//! - a line without `:` is a field name with an empty value
//! - anything else (`retry`, `: comment`, unknown names, blank lines) is ignored

use serde::de::DeserializeOwned;
use serde::Serialize;

/// One delivered server-sent event.
///
/// Built from exactly one frame block and immutable afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct Event {
    name: Option<String>,
    id: Option<String>,
    data: String,
}

impl Event {
    /// Build an event directly from its parts.
    pub fn new(name: Option<String>, id: Option<String>, data: impl Into<String>) -> Self {
        Self {
            name,
            id,
            data: data.into(),
        }
    }

    /// Interpret one delimiter-stripped frame block.
    ///
    /// Never fails: malformed lines are normalized or ignored.
    pub fn assemble(block: &str) -> Self {
        let mut event = Event::default();
        let mut has_data = false;

        for line in block.split('\n') {
            let line = line.strip_suffix('\r').unwrap_or(line);
            if line.is_empty() {
                continue;
            }

            let (key, value) = split_field(line);
            match key {
                "event" => event.name = Some(value.to_string()),
                "id" => event.id = Some(value.to_string()),
                "data" => {
                    if has_data {
                        event.data.push('\n');
                    }
                    event.data.push_str(value);
                    has_data = true;
                }
                _ => {}
            }
        }

        event
    }

    /// Value of the last `event` field, if any.
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Value of the last `id` field, if any.
    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    /// All `data` lines joined by `\n`; empty when the frame had none.
    pub fn data(&self) -> &str {
        &self.data
    }

    /// Event name, or `"message"` when the frame set none.
    pub fn event_type(&self) -> &str {
        self.name.as_deref().unwrap_or("message")
    }

    /// Decode the data payload as JSON.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        serde_json::from_str(&self.data)
    }

    /// Decode the data payload as a JSON value, or `None` if it is not JSON.
    pub fn data_json(&self) -> Option<serde_json::Value> {
        self.json().ok()
    }
}

/// Split `key:value` on the first colon. The key is trimmed; the value loses
/// one leading space.
fn split_field(line: &str) -> (&str, &str) {
    match line.split_once(':') {
        Some((key, value)) => (key.trim(), value.strip_prefix(' ').unwrap_or(value)),
        None => (line.trim(), ""),
    }
}
