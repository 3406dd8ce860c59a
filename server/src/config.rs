use std::{env, net::SocketAddr, path::PathBuf, time::Duration};

use anyhow::Context;
use travel_log_data_management::{StorageConfig, DEFAULT_DATA_DIR};

use crate::tracking::TrackerConfig;

pub const DEFAULT_HTTP_ADDR: &str = "0.0.0.0:8080";
pub const DEFAULT_FEED_ADDR: &str = "0.0.0.0:3169";
pub const DEFAULT_LOG_DIR: &str = "log/";
pub const DEFAULT_STATIC_DIR: &str = "frontend/dist";

/// Server configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub http_addr: SocketAddr,
    pub feed_addr: SocketAddr,
    pub storage: StorageConfig,
    pub log_dir: PathBuf,
    pub static_dir: PathBuf,
    pub tracker: TrackerConfig,
    pub gemini_api_key: Option<String>,
}

impl ServerConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let var = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());

        let http_addr = var("TRAVEL_LOG_HTTP_ADDR", DEFAULT_HTTP_ADDR)
            .parse()
            .context("TRAVEL_LOG_HTTP_ADDR is not a socket address")?;
        let feed_addr = var("TRAVEL_LOG_FEED_ADDR", DEFAULT_FEED_ADDR)
            .parse()
            .context("TRAVEL_LOG_FEED_ADDR is not a socket address")?;

        let mut tracker = TrackerConfig::default();
        if let Some(tick_ms) = lookup("TRAVEL_LOG_TICK_MS") {
            let tick_ms: u64 = tick_ms.parse().context("TRAVEL_LOG_TICK_MS is not a number")?;
            anyhow::ensure!(tick_ms > 0, "TRAVEL_LOG_TICK_MS must be positive");
            tracker.tick_period = Duration::from_millis(tick_ms);
        }

        Ok(Self {
            http_addr,
            feed_addr,
            storage: StorageConfig::new(var("TRAVEL_LOG_DATA_DIR", DEFAULT_DATA_DIR)),
            log_dir: var("TRAVEL_LOG_LOG_DIR", DEFAULT_LOG_DIR).into(),
            static_dir: var("TRAVEL_LOG_STATIC_DIR", DEFAULT_STATIC_DIR).into(),
            tracker,
            gemini_api_key: lookup("GEMINI_API_KEY").filter(|key| !key.is_empty()),
        })
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn config(vars: &[(&str, &str)]) -> anyhow::Result<ServerConfig> {
        let vars: HashMap<String, String> = vars.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        ServerConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults() {
        let config = config(&[]).unwrap();
        assert_eq!(config.http_addr.port(), 8080);
        assert_eq!(config.feed_addr.port(), 3169);
        assert_eq!(config.storage.data_dir(), std::path::Path::new(DEFAULT_DATA_DIR));
        assert_eq!(config.tracker.tick_period, Duration::from_secs(1));
        assert!(config.gemini_api_key.is_none());
    }

    #[test]
    fn overrides() {
        let config = config(&[
            ("TRAVEL_LOG_HTTP_ADDR", "127.0.0.1:9000"),
            ("TRAVEL_LOG_TICK_MS", "250"),
            ("TRAVEL_LOG_DATA_DIR", "/tmp/travel"),
            ("GEMINI_API_KEY", "secret"),
        ])
        .unwrap();
        assert_eq!(config.http_addr, "127.0.0.1:9000".parse().unwrap());
        assert_eq!(config.tracker.tick_period, Duration::from_millis(250));
        assert_eq!(config.storage.database_path(), PathBuf::from("/tmp/travel/database.db"));
        assert_eq!(config.gemini_api_key.as_deref(), Some("secret"));
    }

    #[test]
    fn rejects_bad_values() {
        assert!(config(&[("TRAVEL_LOG_FEED_ADDR", "nowhere")]).is_err());
        assert!(config(&[("TRAVEL_LOG_TICK_MS", "0")]).is_err());
        assert!(config(&[("TRAVEL_LOG_TICK_MS", "soon")]).is_err());
    }
}
