//! Server-Sent Events streaming.
//!
//! Wire format handled here:
//! - frames are separated by a blank line (`\n\n`)
//! - `event: <name>` names the event
//! - `id: <id>` sets the event id and advances the resume cursor
//! - `data: <line>` lines make up the payload
//! - anything else is ignored
//!
//! # Module structure
//! - `decoder` - byte chunks to frame blocks ([`FrameDecoder`])
//! - `event` - frame block to [`Event`]
//! - `request` - URL, query and headers of a connection ([`StreamRequest`])
//! - `cancel` - out-of-band close signal ([`CancelHandle`])
//! - `session` - one connection and its read loop ([`StreamSession`])
//! - `reconnect` - resume across connections ([`ReconnectController`])

mod cancel;
mod decoder;
mod event;
mod reconnect;
mod request;
mod session;

pub use cancel::CancelHandle;
pub use decoder::{FrameDecoder, FRAME_DELIMITER};
pub use event::Event;
pub use reconnect::{default_should_reconnect, ConnectionState, ReconnectController, RunOutcome};
pub use request::{StreamRequest, EVENT_STREAM_MIME, LAST_EVENT_ID_HEADER};
pub use session::{
    SessionReport, SessionStatus, StreamSession, Termination, SERVER_CANCEL_EVENT,
};
