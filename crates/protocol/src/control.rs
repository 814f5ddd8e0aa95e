use serde::Deserialize;

use crate::ProtocolError;

/// Control message sent by the client on a text frame.
///
/// Unknown actions deserialize to [`ControlMessage::Unknown`] and are
/// ignored by the session without any state change.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum ControlMessage {
    Start(StartFields),
    End,
    #[serde(other)]
    Unknown,
}

/// Raw fields of a `start` message before validation.
///
/// Fields default to empty so a missing field and an empty one are
/// rejected the same way.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct StartFields {
    #[serde(default)]
    pub repo_name: String,
    #[serde(default)]
    pub file_name: String,
    #[serde(default)]
    pub commit_hash: String,
}

/// A validated transfer request: all fields non-empty and path-safe.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferRequest {
    pub repo_name: String,
    pub file_name: String,
    pub commit_hash: String,
}

impl TryFrom<StartFields> for TransferRequest {
    type Error = ProtocolError;

    fn try_from(fields: StartFields) -> Result<Self, ProtocolError> {
        if fields.repo_name.is_empty()
            || fields.file_name.is_empty()
            || fields.commit_hash.is_empty()
        {
            return Err(ProtocolError::MissingMetadata);
        }

        // Repository names may contain `/` (namespace separator); every
        // segment must still be a plain component.
        for segment in fields.repo_name.split('/') {
            validate_component(segment, &fields.repo_name)?;
        }
        validate_component(&fields.file_name, &fields.file_name)?;
        validate_component(&fields.commit_hash, &fields.commit_hash)?;

        Ok(Self {
            repo_name: fields.repo_name,
            file_name: fields.file_name,
            commit_hash: fields.commit_hash,
        })
    }
}

/// Rejects names that could escape the cache root once joined into a
/// path: empty segments, `.`/`..`, and separator characters.
fn validate_component(segment: &str, original: &str) -> Result<(), ProtocolError> {
    if segment.is_empty()
        || segment == "."
        || segment == ".."
        || segment.contains('\\')
        || segment.contains('/')
    {
        return Err(ProtocolError::InvalidName(original.to_string()));
    }
    Ok(())
}

/// Parses a text frame into a [`ControlMessage`].
pub fn parse_control(text: &str) -> Result<ControlMessage, ProtocolError> {
    serde_json::from_str(text).map_err(|e| ProtocolError::InvalidJson(e.to_string()))
}
