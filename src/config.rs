//! Collector configuration and tunables.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::{HarvestError, Result};

/// Tunable parameters for a collection run.
///
/// All knobs are supplied by the embedding application; the collector never
/// reads them from the environment itself. `validate` is called at startup
/// and is the only place in the crate that fails fast.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HarvestConfig {
    /// Minimum delay applied before each outgoing request.
    #[serde(default = "default_rate_limit_delay")]
    pub rate_limit_delay: Duration,
    /// Maximum retries for a single fetch (transient failures and 429s).
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    /// Per-request timeout for content fetches.
    #[serde(default = "default_request_timeout")]
    pub request_timeout: Duration,
    /// Per-probe timeout for proxy health checks.
    #[serde(default = "default_probe_timeout")]
    pub probe_timeout: Duration,
    /// Whether requests are routed through the proxy pool.
    #[serde(default)]
    pub proxy_enabled: bool,
    /// Manual proxy override (e.g. "http://10.0.0.1:8080"). Used instead of
    /// the pool when set.
    #[serde(default)]
    pub manual_proxy: Option<String>,
    /// Maximum number of concurrently running collection tasks.
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,
    /// Stop collecting once this many unique records have been produced.
    #[serde(default = "default_target_count")]
    pub target_count: usize,
    /// How long a validated proxy set is considered fresh.
    #[serde(default = "default_refresh_interval")]
    pub proxy_refresh_interval: Duration,
    /// Concurrency cap for proxy health probes.
    #[serde(default = "default_probe_concurrency")]
    pub probe_concurrency: usize,
}

fn default_rate_limit_delay() -> Duration {
    Duration::from_secs(2)
}

fn default_max_retries() -> u32 {
    3
}

fn default_request_timeout() -> Duration {
    Duration::from_secs(30)
}

fn default_probe_timeout() -> Duration {
    Duration::from_secs(5)
}

fn default_concurrency() -> usize {
    10
}

fn default_target_count() -> usize {
    1000
}

fn default_refresh_interval() -> Duration {
    Duration::from_secs(3600)
}

fn default_probe_concurrency() -> usize {
    20
}

impl Default for HarvestConfig {
    fn default() -> Self {
        Self {
            rate_limit_delay: default_rate_limit_delay(),
            max_retries: default_max_retries(),
            request_timeout: default_request_timeout(),
            probe_timeout: default_probe_timeout(),
            proxy_enabled: false,
            manual_proxy: None,
            concurrency: default_concurrency(),
            target_count: default_target_count(),
            proxy_refresh_interval: default_refresh_interval(),
            probe_concurrency: default_probe_concurrency(),
        }
    }
}

impl HarvestConfig {
    /// Creates a configuration with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the minimum inter-request delay.
    pub fn with_rate_limit_delay(mut self, delay: Duration) -> Self {
        self.rate_limit_delay = delay;
        self
    }

    /// Sets the retry budget for a single fetch.
    pub fn with_max_retries(mut self, retries: u32) -> Self {
        self.max_retries = retries;
        self
    }

    /// Sets the per-request timeout.
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Enables or disables proxy routing.
    pub fn with_proxy_enabled(mut self, enabled: bool) -> Self {
        self.proxy_enabled = enabled;
        self
    }

    /// Sets a manual proxy override.
    pub fn with_manual_proxy(mut self, url: impl Into<String>) -> Self {
        self.manual_proxy = Some(url.into());
        self
    }

    /// Sets the task concurrency cap.
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency;
        self
    }

    /// Sets the target record count for early termination.
    pub fn with_target_count(mut self, target: usize) -> Self {
        self.target_count = target;
        self
    }

    /// Sets the proxy pool refresh interval.
    pub fn with_proxy_refresh_interval(mut self, interval: Duration) -> Self {
        self.proxy_refresh_interval = interval;
        self
    }

    /// Checks numeric tunables. Fails fast on values that would make the
    /// collector spin or hang.
    pub fn validate(&self) -> Result<()> {
        if self.request_timeout.is_zero() {
            return Err(HarvestError::InvalidConfig(
                "request_timeout must be non-zero".to_string(),
            ));
        }
        if self.probe_timeout.is_zero() {
            return Err(HarvestError::InvalidConfig(
                "probe_timeout must be non-zero".to_string(),
            ));
        }
        if self.concurrency == 0 {
            return Err(HarvestError::InvalidConfig(
                "concurrency must be at least 1".to_string(),
            ));
        }
        if self.probe_concurrency == 0 {
            return Err(HarvestError::InvalidConfig(
                "probe_concurrency must be at least 1".to_string(),
            ));
        }
        if self.target_count == 0 {
            return Err(HarvestError::InvalidConfig(
                "target_count must be at least 1".to_string(),
            ));
        }
        if self.proxy_refresh_interval.is_zero() {
            return Err(HarvestError::InvalidConfig(
                "proxy_refresh_interval must be non-zero".to_string(),
            ));
        }
        Ok(())
    }
}
