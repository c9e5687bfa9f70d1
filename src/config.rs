//! Configuration management for luxtray
//!
//! Handles loading and parsing of the YAML configuration file. Every field
//! has a serde default, so a missing or partial file yields a runnable
//! configuration. The process takes no command-line arguments; the config
//! path comes from the `LUXTRAY_CONFIG` environment variable and falls back
//! to `config.yaml`.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use tokio::fs;

/// Environment variable overriding the config file path
pub const CONFIG_PATH_ENV: &str = "LUXTRAY_CONFIG";

/// Default config file path, relative to the working directory
pub const DEFAULT_CONFIG_PATH: &str = "config.yaml";

/// Root configuration structure
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct AppConfig {
    #[serde(default)]
    pub sampling: SamplingConfig,
    #[serde(default)]
    pub tray: TrayConfig,
    #[serde(default)]
    pub log: LogConfig,
}

/// Auto-sampling loop configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SamplingConfig {
    /// Seconds-scale cadence of the capture → compute → apply cycle
    #[serde(default = "default_interval_ms")]
    pub interval_ms: u64,
    /// Bound on waiting for a background task to honor cancellation
    #[serde(default = "default_stop_timeout_ms")]
    pub stop_timeout_ms: u64,
    /// Capture device index handed to the sampler backend
    #[serde(default)]
    pub camera_index: u32,
    /// Enable auto mode immediately at startup
    #[serde(default = "default_true")]
    pub auto_on_start: bool,
}

/// System tray configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TrayConfig {
    /// Tooltip shown on the tray icon
    #[serde(default = "default_tooltip")]
    pub tooltip: String,
    /// How often the tray thread polls for menu events and stop requests
    #[serde(default = "default_tray_poll_ms")]
    pub poll_interval_ms: u64,
}

/// Logging configuration (overridden by `RUST_LOG` when set)
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LogConfig {
    /// Log level: error, warn, info, debug, trace
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl AppConfig {
    /// Load configuration from a YAML file.
    ///
    /// A missing file is not an error: built-in defaults are returned so the
    /// binary runs unconfigured.
    pub async fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            tracing::debug!("No config file at {}, using defaults", path.display());
            return Ok(AppConfig::default());
        }

        let raw = fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: AppConfig = serde_yaml::from_str(&raw)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    /// Resolve the config path from the environment
    pub fn resolve_path() -> String {
        std::env::var(CONFIG_PATH_ENV).unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string())
    }
}

impl SamplingConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }

    pub fn stop_timeout(&self) -> Duration {
        Duration::from_millis(self.stop_timeout_ms)
    }
}

impl Default for SamplingConfig {
    fn default() -> Self {
        Self {
            interval_ms: default_interval_ms(),
            stop_timeout_ms: default_stop_timeout_ms(),
            camera_index: 0,
            auto_on_start: true,
        }
    }
}

impl Default for TrayConfig {
    fn default() -> Self {
        Self {
            tooltip: default_tooltip(),
            poll_interval_ms: default_tray_poll_ms(),
        }
    }
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_interval_ms() -> u64 {
    1000
}

fn default_stop_timeout_ms() -> u64 {
    1000
}

fn default_tray_poll_ms() -> u64 {
    50
}

fn default_tooltip() -> String {
    "Brightness Control".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_true() -> bool {
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[tokio::test]
    async fn missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = AppConfig::load(dir.path().join("nope.yaml")).await.unwrap();
        assert_eq!(config.sampling.interval_ms, 1000);
        assert_eq!(config.sampling.stop_timeout_ms, 1000);
        assert!(config.sampling.auto_on_start);
        assert_eq!(config.tray.tooltip, "Brightness Control");
    }

    #[tokio::test]
    async fn partial_file_fills_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yaml");
        let mut f = std::fs::File::create(&path).unwrap();
        writeln!(f, "sampling:\n  interval_ms: 250\n  auto_on_start: false").unwrap();

        let config = AppConfig::load(&path).await.unwrap();
        assert_eq!(config.sampling.interval_ms, 250);
        assert!(!config.sampling.auto_on_start);
        // Untouched sections keep their defaults
        assert_eq!(config.sampling.stop_timeout_ms, 1000);
        assert_eq!(config.tray.poll_interval_ms, 50);
    }

    #[tokio::test]
    async fn malformed_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yaml");
        std::fs::write(&path, "sampling: [not, a, map]").unwrap();

        assert!(AppConfig::load(&path).await.is_err());
    }

    #[test]
    fn durations_come_from_millis() {
        let sampling = SamplingConfig::default();
        assert_eq!(sampling.interval(), Duration::from_secs(1));
        assert_eq!(sampling.stop_timeout(), Duration::from_secs(1));
    }
}
