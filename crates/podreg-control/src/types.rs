//! Configuration for the coordination service.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Configuration for the pod coordination service.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ControlConfig {
    /// Address the health server binds to.
    pub listen_addr: String,
    /// `RocksDB` data directory.
    pub data_dir: String,
    /// Sleep between convergence polls, in seconds.
    pub poll_period_secs: u64,
    /// Maximum convergence polls per operation. `None` polls until the pod
    /// converges or disappears.
    pub max_poll_attempts: Option<u32>,
    /// Port the node info endpoint listens on.
    pub info_port: u16,
    /// Timeout for a single node info request, in seconds.
    pub info_timeout_secs: u64,
    /// Interval between info cache refreshes, in seconds.
    pub cache_refresh_secs: u64,
    /// Fixed minion list. When unset, cluster nodes are used.
    pub minions: Option<Vec<String>>,
}

impl Default for ControlConfig {
    fn default() -> Self {
        Self {
            listen_addr: "0.0.0.0:8080".to_string(),
            data_dir: "/data".to_string(),
            poll_period_secs: 10,
            max_poll_attempts: Some(360),
            info_port: 10250,
            info_timeout_secs: 5,
            cache_refresh_secs: 30,
            minions: None,
        }
    }
}

impl ControlConfig {
    /// Load configuration from environment variables.
    ///
    /// Unset or unparsable variables keep their defaults.
    /// `POD_POLL_MAX_ATTEMPTS=0` disables the poll limit.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();

        if let Some(val) = lookup("LISTEN_ADDR") {
            config.listen_addr = val;
        }
        if let Some(val) = lookup("DATA_DIR") {
            config.data_dir = val;
        }
        if let Some(n) = lookup("POD_POLL_PERIOD_SECS").and_then(|v| v.parse().ok()) {
            config.poll_period_secs = n;
        }
        if let Some(n) = lookup("POD_POLL_MAX_ATTEMPTS").and_then(|v| v.parse::<u32>().ok()) {
            config.max_poll_attempts = (n > 0).then_some(n);
        }
        if let Some(n) = lookup("POD_INFO_PORT").and_then(|v| v.parse().ok()) {
            config.info_port = n;
        }
        if let Some(n) = lookup("POD_INFO_TIMEOUT_SECS").and_then(|v| v.parse().ok()) {
            config.info_timeout_secs = n;
        }
        if let Some(n) = lookup("POD_CACHE_REFRESH_SECS").and_then(|v| v.parse().ok()) {
            config.cache_refresh_secs = n;
        }
        if let Some(val) = lookup("MINIONS") {
            let minions: Vec<String> = val
                .split(',')
                .map(str::trim)
                .filter(|m| !m.is_empty())
                .map(String::from)
                .collect();
            config.minions = (!minions.is_empty()).then_some(minions);
        }

        config
    }

    /// Sleep between convergence polls.
    #[must_use]
    pub const fn poll_period(&self) -> Duration {
        Duration::from_secs(self.poll_period_secs)
    }

    /// Timeout for a single node info request.
    #[must_use]
    pub const fn info_timeout(&self) -> Duration {
        Duration::from_secs(self.info_timeout_secs)
    }

    /// Interval between info cache refreshes.
    #[must_use]
    pub const fn cache_refresh(&self) -> Duration {
        Duration::from_secs(self.cache_refresh_secs)
    }
}
