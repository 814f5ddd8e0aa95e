//! Transfer session state machine.
//!
//! One [`Session`] exists per client connection. It is driven by the
//! connection task and never shared, so every transition is serialized.
//! The open artifact handle lives inside the state value itself and is
//! released on every transition out of `Receiving` — including
//! [`Session::shutdown`], which runs on all teardown paths.

use std::path::{Path, PathBuf};

use tokio::fs::{File, OpenOptions};
use tokio::io::AsyncWriteExt;

use hubstream_protocol::{ControlMessage, Notice, TransferRequest, parse_control};

/// Configuration handed to each session at construction.
///
/// Passed in explicitly; sessions never read ambient global state.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Root of the hub cache directory tree.
    pub cache_root: PathBuf,
}

enum State {
    Idle,
    Receiving {
        artifact: File,
        path: PathBuf,
        file_name: String,
    },
}

/// Fatal session failures. Anything recoverable (malformed control
/// messages, missing metadata) is reported as a [`Notice`] instead and
/// leaves the session usable.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("permission denied for {path}: {source}")]
    AccessDenied {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("I/O failure: {0}")]
    Io(#[from] std::io::Error),
}

impl SessionError {
    /// The single descriptive notice sent to the client before teardown.
    pub fn notice(&self) -> Notice {
        match self {
            SessionError::AccessDenied { .. } => Notice::Error("Permission denied".into()),
            SessionError::Io(e) => Notice::Error(e.to_string()),
        }
    }
}

/// Per-connection transfer session.
pub struct Session {
    cache_root: PathBuf,
    state: State,
    /// The `refs/main` pointer is written at most once per session,
    /// on the first successful start.
    ref_written: bool,
}

impl Session {
    pub fn new(config: SessionConfig) -> Self {
        Self {
            cache_root: config.cache_root,
            state: State::Idle,
            ref_written: false,
        }
    }

    /// Returns `true` while an artifact is open for writing.
    pub fn is_receiving(&self) -> bool {
        matches!(self.state, State::Receiving { .. })
    }

    /// Handles a text control frame.
    ///
    /// `Ok(Some(notice))` is sent to the client; `Ok(None)` means no
    /// reply (unknown action, or `end` with nothing open). `Err` is
    /// fatal and terminates the session.
    pub async fn on_control(&mut self, text: &str) -> Result<Option<Notice>, SessionError> {
        let msg = match parse_control(text) {
            Ok(m) => m,
            Err(e) => {
                tracing::warn!("unparseable control message: {e}");
                return Ok(Some(Notice::Error(e.to_string())));
            }
        };

        match msg {
            ControlMessage::Start(fields) => {
                let request = match TransferRequest::try_from(fields) {
                    Ok(r) => r,
                    Err(e) => {
                        tracing::warn!("rejected start request: {e}");
                        return Ok(Some(Notice::Error(e.to_string())));
                    }
                };
                self.start(request).await.map(Some)
            }
            ControlMessage::End => self.finish().await,
            ControlMessage::Unknown => {
                tracing::debug!("ignoring control message with unrecognized action");
                Ok(None)
            }
        }
    }

    /// Appends a binary chunk to the open artifact, verbatim and in
    /// arrival order. With no artifact open the chunk is silently
    /// dropped; callers must not rely on this for correctness.
    pub async fn on_chunk(&mut self, data: &[u8]) -> Result<(), SessionError> {
        match &mut self.state {
            State::Receiving { artifact, path, .. } => {
                tracing::trace!(len = data.len(), path = %path.display(), "writing chunk");
                artifact.write_all(data).await?;
                Ok(())
            }
            State::Idle => {
                tracing::debug!(len = data.len(), "dropping chunk with no open artifact");
                Ok(())
            }
        }
    }

    /// Releases the open artifact, if any. Runs on every exit path;
    /// bytes already written remain on disk (no rollback).
    pub async fn shutdown(&mut self) {
        if let State::Receiving { artifact, path, .. } =
            std::mem::replace(&mut self.state, State::Idle)
        {
            close_artifact(artifact, &path).await;
            tracing::warn!(path = %path.display(), "artifact closed on session teardown");
        }
    }

    async fn start(&mut self, request: TransferRequest) -> Result<Notice, SessionError> {
        // A start while still receiving closes the previous artifact;
        // whatever was written stays on disk.
        if let State::Receiving { artifact, path, .. } =
            std::mem::replace(&mut self.state, State::Idle)
        {
            tracing::warn!(path = %path.display(), "start received while receiving, closing previous artifact");
            close_artifact(artifact, &path).await;
        }

        let paths = hubstream_cache::resolve(
            &self.cache_root,
            &request.repo_name,
            &request.commit_hash,
            &request.file_name,
        );

        tokio::fs::create_dir_all(&paths.snapshot_dir).await?;

        let artifact = match OpenOptions::new()
            .create(true)
            .truncate(true)
            .write(true)
            .open(&paths.artifact_path)
            .await
        {
            Ok(f) => f,
            Err(e) if e.kind() == std::io::ErrorKind::PermissionDenied => {
                return Err(SessionError::AccessDenied {
                    path: paths.artifact_path,
                    source: e,
                });
            }
            Err(e) => return Err(e.into()),
        };

        if !self.ref_written {
            tokio::fs::create_dir_all(&paths.refs_dir).await?;
            tokio::fs::write(&paths.ref_path, request.commit_hash.as_bytes()).await?;
            self.ref_written = true;
            tracing::info!(path = %paths.ref_path.display(), "saved commit pointer");
        }

        tracing::info!(
            file = %request.file_name,
            path = %paths.artifact_path.display(),
            "started saving"
        );

        self.state = State::Receiving {
            artifact,
            path: paths.artifact_path,
            file_name: request.file_name.clone(),
        };
        Ok(Notice::Started(request.file_name))
    }

    async fn finish(&mut self) -> Result<Option<Notice>, SessionError> {
        match std::mem::replace(&mut self.state, State::Idle) {
            State::Receiving {
                mut artifact,
                path,
                file_name,
            } => {
                artifact.flush().await?;
                drop(artifact);
                tracing::info!(path = %path.display(), "closed artifact");
                Ok(Some(Notice::Finished(file_name)))
            }
            // `end` with nothing open is a no-op.
            State::Idle => Ok(None),
        }
    }
}

async fn close_artifact(mut artifact: File, path: &Path) {
    if let Err(e) = artifact.flush().await {
        tracing::error!(path = %path.display(), "flush on close failed: {e}");
    }
}
