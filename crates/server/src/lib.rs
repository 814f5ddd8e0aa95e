//! WebSocket streaming endpoint for the hubstream server.
//!
//! Accepts any number of client connections, each owning one
//! [`Session`]: a two-state machine (idle / receiving) that interprets
//! JSON control messages, appends binary chunks to the currently open
//! artifact, and persists files into the hub cache layout. Messages
//! for one session are processed strictly in arrival order by a single
//! connection task, so chunk writes and close handling are mutually
//! exclusive by construction.

mod connection;
mod server;
mod session;

pub use server::{ServerConfig, StreamServer};
pub use session::{Session, SessionConfig, SessionError};

/// Errors produced by the streaming server.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("WebSocket error: {0}")]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),
}
