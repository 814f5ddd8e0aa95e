//! External cache scan invocation.

use std::path::PathBuf;

use serde::Serialize;

/// Inventory tool invoked against the cache root.
pub const DEFAULT_SCAN_COMMAND: &str = "huggingface-cli";

/// Coarse outcome of a scan invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ScanStatus {
    Success,
    Error,
}

/// Result of one scan, serialized as the response body of the
/// cache-validation endpoint.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScanReport {
    pub status: ScanStatus,
    /// Tool stdout on success, stderr on a non-zero exit.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output: Option<String>,
    /// Set when the tool could not be invoked at all.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl ScanReport {
    fn success(output: String) -> Self {
        Self {
            status: ScanStatus::Success,
            output: Some(output),
            message: None,
        }
    }

    fn tool_error(stderr: String) -> Self {
        Self {
            status: ScanStatus::Error,
            output: Some(stderr),
            message: None,
        }
    }

    fn unavailable(message: String) -> Self {
        Self {
            status: ScanStatus::Error,
            output: None,
            message: Some(message),
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == ScanStatus::Success
    }
}

/// Invokes the external cache inventory tool.
///
/// One synchronous request/response per call, no retry: a failed
/// invocation is reported in the [`ScanReport`], never escalated.
#[derive(Debug, Clone)]
pub struct ScanReporter {
    command: String,
    cache_root: PathBuf,
}

impl ScanReporter {
    pub fn new(cache_root: impl Into<PathBuf>) -> Self {
        Self {
            command: DEFAULT_SCAN_COMMAND.into(),
            cache_root: cache_root.into(),
        }
    }

    /// Overrides the tool binary (used by tests).
    pub fn with_command(mut self, command: impl Into<String>) -> Self {
        self.command = command.into();
        self
    }

    /// Runs `scan-cache` against the configured cache root.
    pub async fn scan(&self) -> ScanReport {
        tracing::info!(cache_root = %self.cache_root.display(), "validating cache");

        let result = tokio::process::Command::new(&self.command)
            .arg("scan-cache")
            .env("HUGGINGFACE_HUB_CACHE", &self.cache_root)
            .output()
            .await;

        match result {
            Ok(output) if output.status.success() => {
                tracing::debug!("cache scan succeeded");
                ScanReport::success(String::from_utf8_lossy(&output.stdout).into_owned())
            }
            Ok(output) => {
                let stderr = String::from_utf8_lossy(&output.stderr).into_owned();
                tracing::error!("cache scan failed: {stderr}");
                ScanReport::tool_error(stderr)
            }
            Err(e) => {
                tracing::error!(command = %self.command, "could not invoke scan tool: {e}");
                ScanReport::unavailable(e.to_string())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn successful_invocation_captures_stdout() {
        let reporter = ScanReporter::new("/tmp").with_command("echo");
        let report = reporter.scan().await;
        assert!(report.is_success());
        assert_eq!(report.output.as_deref(), Some("scan-cache\n"));
        assert!(report.message.is_none());
    }

    #[tokio::test]
    async fn nonzero_exit_reports_error() {
        let reporter = ScanReporter::new("/tmp").with_command("false");
        let report = reporter.scan().await;
        assert!(!report.is_success());
        assert!(report.output.is_some());
        assert!(report.message.is_none());
    }

    #[tokio::test]
    async fn missing_tool_reports_message() {
        let reporter =
            ScanReporter::new("/tmp").with_command("definitely-not-a-real-binary-3141");
        let report = reporter.scan().await;
        assert!(!report.is_success());
        assert!(report.output.is_none());
        assert!(report.message.is_some());
    }

    #[test]
    fn success_json_shape() {
        let report = ScanReport::success("table".into());
        let value = serde_json::to_value(&report).unwrap();
        assert_eq!(value["status"], "success");
        assert_eq!(value["output"], "table");
        assert!(value.get("message").is_none());
    }

    #[test]
    fn unavailable_json_shape() {
        let report = ScanReport::unavailable("no such file".into());
        let value = serde_json::to_value(&report).unwrap();
        assert_eq!(value["status"], "error");
        assert_eq!(value["message"], "no such file");
        assert!(value.get("output").is_none());
    }
}
