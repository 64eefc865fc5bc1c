use std::env;
use std::fs;
use std::path::Path;
use std::time::Duration;

use anyhow::Result;
use serde::{Deserialize, Serialize};

/// Environment variable that replaces `server.base_url` when non-empty.
pub const SERVER_URL_ENV: &str = "OCCUVIEW_SERVER_URL";
/// Environment variable that replaces `monitor.poll_interval_ms` when it
/// parses to a positive integer.
pub const POLL_INTERVAL_ENV: &str = "OCCUVIEW_POLL_INTERVAL_MS";

// ── Server connection ─────────────────────────────────────────────────────────

/// Where the capacity device lives and how requests to it are shaped.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Origin every endpoint (`/current_config`, `/cmd`, `/capacity`) is
    /// resolved against.
    pub base_url: String,
    /// Per-request timeout in seconds.  `0` (the default) disables the
    /// timeout, so a hung request simply delays the next poll cycle.
    pub request_timeout_secs: u64,
    /// Send `Cache-Control: no-cache` and `Pragma: no-cache` on every request.
    pub no_cache: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:3080".to_string(),
            request_timeout_secs: 0,
            no_cache: true,
        }
    }
}

impl ServerConfig {
    pub fn request_timeout(&self) -> Option<Duration> {
        (self.request_timeout_secs > 0).then(|| Duration::from_secs(self.request_timeout_secs))
    }
}

// ── Capacity monitor ──────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MonitorConfig {
    /// Fixed delay between the end of one poll cycle and the start of the
    /// next.  The same delay applies after failures; there is no backoff.
    pub poll_interval_ms: u64,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: 1000,
        }
    }
}

impl MonitorConfig {
    /// Poll delay as a `Duration`, never shorter than one millisecond.
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms.max(1))
    }
}

// ── Telemetry ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TelemetryConfig {
    /// Default filter directive when `RUST_LOG` is not set.
    pub log_level: String,
    /// Optional file that receives a copy of every log line.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub log_file: Option<String>,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_file: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub monitor: MonitorConfig,
    pub telemetry: TelemetryConfig,
}

impl AppConfig {
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self> {
        let mut config = Self::default();
        if let Ok(raw) = fs::read_to_string(path) {
            config = toml::from_str(&raw)?;
        }

        config.apply_overrides(|key| env::var(key).ok());
        Ok(config)
    }

    /// Apply `OCCUVIEW_*` overrides using `lookup` to resolve variables.
    /// Empty or unparsable values are ignored.
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(url) = lookup(SERVER_URL_ENV) {
            let url = url.trim();
            if !url.is_empty() {
                self.server.base_url = url.to_string();
            }
        }

        if let Some(raw) = lookup(POLL_INTERVAL_ENV) {
            match raw.trim().parse::<u64>() {
                Ok(ms) if ms > 0 => self.monitor.poll_interval_ms = ms,
                _ => {}
            }
        }
    }

    pub fn save_to(&self, path: impl AsRef<Path>) -> Result<()> {
        if let Some(parent) = path.as_ref().parent() {
            fs::create_dir_all(parent)?;
        }

        let rendered = toml::to_string_pretty(self)?;
        fs::write(path, rendered)?;
        Ok(())
    }
}

// ── Tests ────────────────────────────────────────────────────────────────────
