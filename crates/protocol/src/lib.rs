//! Wire protocol for the hubstream streaming endpoint.
//!
//! Clients drive a transfer with JSON control messages on text frames
//! and raw chunk bytes on binary frames. The server answers with
//! advisory text notices; only the `Error: ` prefix is stable enough
//! for clients to match on.

mod control;
mod notice;

pub use control::{ControlMessage, StartFields, TransferRequest, parse_control};
pub use notice::Notice;

/// Maximum accepted WebSocket message size (50 MiB).
pub const WS_MAX_MESSAGE_SIZE: usize = 50 * 1024 * 1024;

/// Recoverable protocol-level failures.
///
/// These are reported to the client verbatim (behind the `Error: `
/// prefix) and leave the session usable.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    #[error("Invalid JSON - {0}")]
    InvalidJson(String),

    #[error("Missing metadata")]
    MissingMetadata,

    #[error("Invalid name: {0}")]
    InvalidName(String),
}
