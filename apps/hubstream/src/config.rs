//! Server configuration management.
//!
//! Configuration is stored as TOML:
//! - Linux/macOS: `~/.config/hubstream/server.toml`
//! - Windows: `%APPDATA%/hubstream/server.toml`
//!
//! The cache root honors `HF_HOME` at load time; nothing reads the
//! environment after startup.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Server configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Port for the WebSocket streaming endpoint.
    #[serde(default = "default_stream_port")]
    pub stream_port: u16,

    /// Port for the scan-cache / frontend asset endpoint.
    #[serde(default = "default_report_port")]
    pub report_port: u16,

    /// Root of the hub cache directory tree.
    #[serde(default = "default_cache_root")]
    pub cache_root: PathBuf,

    /// Directory of built frontend assets; unset disables asset serving.
    #[serde(default)]
    pub asset_dir: Option<PathBuf>,
}

fn default_stream_port() -> u16 {
    8000
}

fn default_report_port() -> u16 {
    8001
}

fn default_cache_root() -> PathBuf {
    if let Ok(hf_home) = std::env::var("HF_HOME") {
        return PathBuf::from(hf_home);
    }
    let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".into());
    PathBuf::from(home).join(".cache/huggingface/hub")
}

impl Default for Config {
    fn default() -> Self {
        Self {
            stream_port: default_stream_port(),
            report_port: default_report_port(),
            cache_root: default_cache_root(),
            asset_dir: None,
        }
    }
}

impl Config {
    /// Loads configuration from disk, or creates a default if not found.
    pub fn load() -> anyhow::Result<Self> {
        let path = config_path()?;

        if path.exists() {
            let content = std::fs::read_to_string(&path)?;
            let config: Config = toml::from_str(&content)?;
            Ok(config)
        } else {
            let config = Config::default();
            config.save()?;
            Ok(config)
        }
    }

    /// Saves the current configuration to disk.
    pub fn save(&self) -> anyhow::Result<()> {
        let path = config_path()?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        std::fs::write(&path, content)?;

        // Restrict permissions on Unix.
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o600))?;
        }

        tracing::debug!(path = %path.display(), "configuration saved");
        Ok(())
    }
}

/// Returns the platform-specific configuration file path.
fn config_path() -> anyhow::Result<PathBuf> {
    #[cfg(windows)]
    {
        let appdata = std::env::var("APPDATA")?;
        Ok(PathBuf::from(appdata).join("hubstream").join("server.toml"))
    }

    #[cfg(not(windows))]
    {
        let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".into());
        Ok(PathBuf::from(home)
            .join(".config")
            .join("hubstream")
            .join("server.toml"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_toml_uses_defaults() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.stream_port, 8000);
        assert_eq!(config.report_port, 8001);
        assert!(config.asset_dir.is_none());
    }

    #[test]
    fn partial_toml_keeps_remaining_defaults() {
        let config: Config = toml::from_str(
            r#"
            stream_port = 9000
            cache_root = "/data/hub"
            "#,
        )
        .unwrap();
        assert_eq!(config.stream_port, 9000);
        assert_eq!(config.report_port, 8001);
        assert_eq!(config.cache_root, PathBuf::from("/data/hub"));
    }

    #[test]
    fn toml_round_trip() {
        let config = Config {
            stream_port: 9000,
            report_port: 9001,
            cache_root: "/data/hub".into(),
            asset_dir: Some("/srv/frontend".into()),
        };
        let serialized = toml::to_string_pretty(&config).unwrap();
        let parsed: Config = toml::from_str(&serialized).unwrap();
        assert_eq!(parsed.stream_port, 9000);
        assert_eq!(parsed.asset_dir, Some(PathBuf::from("/srv/frontend")));
    }
}
