use std::fmt;

/// Server -> client text notification.
///
/// Rendered with [`fmt::Display`] and sent as a plain text frame.
/// The wording is advisory; only the `Error: ` prefix is contractual.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    /// Acknowledges a transfer has started for the named file.
    Started(String),
    /// Acknowledges the named file was closed after an `end` message.
    Finished(String),
    /// Any failure reported to the client.
    Error(String),
}

impl Notice {
    pub fn is_error(&self) -> bool {
        matches!(self, Notice::Error(_))
    }
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Notice::Started(file) => write!(f, "Started saving {file}"),
            Notice::Finished(file) => write!(f, "Finished saving {file}"),
            Notice::Error(detail) => write!(f, "Error: {detail}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn started_wording() {
        assert_eq!(
            Notice::Started("model.bin".into()).to_string(),
            "Started saving model.bin"
        );
    }

    #[test]
    fn finished_wording() {
        assert_eq!(
            Notice::Finished("model.bin".into()).to_string(),
            "Finished saving model.bin"
        );
    }

    #[test]
    fn error_prefix_is_stable() {
        let n = Notice::Error("Missing metadata".into());
        assert!(n.to_string().starts_with("Error: "));
        assert!(n.is_error());
        assert_eq!(n.to_string(), "Error: Missing metadata");
    }
}
