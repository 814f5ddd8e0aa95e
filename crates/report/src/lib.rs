//! Cache inspection and frontend asset serving.
//!
//! Collaborators of the streaming core, not part of it: a wrapper
//! around the external `huggingface-cli scan-cache` inventory tool and
//! a minimal HTTP responder exposing it (plus the static frontend) on
//! a separate listener.

mod http;
mod scan;

pub use http::{ReportConfig, ReportServer};
pub use scan::{DEFAULT_SCAN_COMMAND, ScanReport, ScanReporter};

/// Errors produced by the report server.
#[derive(Debug, thiserror::Error)]
pub enum ReportError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
