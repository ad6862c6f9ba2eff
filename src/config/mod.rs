// SPDX-License-Identifier: MIT
//! Runtime configuration — `config.toml` under the data dir, all fields
//! optional with sensible defaults, overridable from the CLI.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::warn;

const DEFAULT_API_BASE_URL: &str = "http://127.0.0.1:8000/api";
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 10;
const DEFAULT_LIVE_FEED_INTERVAL_SECS: u64 = 30;

fn default_data_dir() -> PathBuf {
    dirs_home()
        .map(|home| home.join(".monty-insight"))
        .unwrap_or_else(|| PathBuf::from(".monty-insight"))
}

fn dirs_home() -> Option<PathBuf> {
    std::env::var_os("HOME").map(PathBuf::from)
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct InsightConfig {
    /// Backend base URL, e.g. `http://127.0.0.1:8000/api`.
    pub api_base_url: String,
    /// Per-request HTTP timeout in seconds.
    pub request_timeout_secs: u64,
    /// Live-feed polling interval in seconds.
    pub live_feed_interval_secs: u64,
    /// Directory for the session store and config file.
    pub data_dir: PathBuf,
    /// Log filter (trace, debug, info, warn, error).
    pub log: String,
}

impl Default for InsightConfig {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
            live_feed_interval_secs: DEFAULT_LIVE_FEED_INTERVAL_SECS,
            data_dir: default_data_dir(),
            log: "info".to_string(),
        }
    }
}

impl InsightConfig {
    /// Load `config.toml` from `data_dir`. Missing file → defaults; a file
    /// that fails to parse is warn-logged and ignored.
    pub fn load(data_dir: Option<PathBuf>) -> Self {
        let mut config = Self::default();
        if let Some(dir) = data_dir {
            config.data_dir = dir;
        }
        let path = config.data_dir.join("config.toml");
        if let Some(file_config) = Self::read_file(&path) {
            // data_dir itself is never taken from the file it was found in.
            let data_dir = config.data_dir.clone();
            config = file_config;
            config.data_dir = data_dir;
        }
        config
    }

    fn read_file(path: &Path) -> Option<Self> {
        let raw = std::fs::read_to_string(path).ok()?;
        match toml::from_str(&raw) {
            Ok(config) => Some(config),
            Err(e) => {
                warn!(path = %path.display(), "config.toml invalid, using defaults: {e}");
                None
            }
        }
    }

    pub fn request_timeout(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.request_timeout_secs)
    }

    pub fn live_feed_interval(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.live_feed_interval_secs)
    }

    /// Path of the session store file.
    pub fn session_store_path(&self) -> PathBuf {
        self.data_dir.join("session.json")
    }
}

// ─── Tests ────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let c = InsightConfig::default();
        assert_eq!(c.api_base_url, "http://127.0.0.1:8000/api");
        assert_eq!(c.live_feed_interval_secs, 30);
        assert_eq!(c.request_timeout_secs, 10);
    }

    #[test]
    fn load_reads_toml_and_keeps_data_dir() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("config.toml"),
            "api_base_url = \"http://backend:9000/api\"\nlive_feed_interval_secs = 5\n",
        )
        .unwrap();
        let c = InsightConfig::load(Some(dir.path().to_path_buf()));
        assert_eq!(c.api_base_url, "http://backend:9000/api");
        assert_eq!(c.live_feed_interval_secs, 5);
        assert_eq!(c.data_dir, dir.path());
    }

    #[test]
    fn invalid_toml_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("config.toml"), "api_base_url = [broken").unwrap();
        let c = InsightConfig::load(Some(dir.path().to_path_buf()));
        assert_eq!(c.api_base_url, "http://127.0.0.1:8000/api");
    }
}
