//! Proxy candidate model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Health state of a proxy candidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthState {
    /// Discovered but not yet probed.
    #[default]
    Untested,
    /// Passed a reachability probe; eligible for real traffic.
    Working,
    /// Failed probing or real traffic.
    Failed,
}

/// A discovered intermediary endpoint of unknown reliability until probed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProxyCandidate {
    /// Proxy host (IP or domain).
    pub host: String,
    /// Proxy port.
    pub port: u16,
    /// Country reported by the list source, if any.
    pub country: Option<String>,
    /// Anonymity tier reported by the list source ("elite", "anonymous", ...).
    pub anonymity: Option<String>,
    /// Whether the source claims TLS support.
    pub supports_tls: bool,
    /// Name of the list source that produced this candidate.
    pub source: String,
    /// Current health state.
    pub health: HealthState,
    /// When the candidate was last handed out for real traffic.
    pub last_used: Option<DateTime<Utc>>,
}

impl ProxyCandidate {
    /// Creates an untested candidate from a list source.
    pub fn new(host: impl Into<String>, port: u16, source: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            port,
            country: None,
            anonymity: None,
            supports_tls: false,
            source: source.into(),
            health: HealthState::Untested,
            last_used: None,
        }
    }

    /// Sets the country.
    pub fn with_country(mut self, country: impl Into<String>) -> Self {
        self.country = Some(country.into());
        self
    }

    /// Sets the anonymity tier.
    pub fn with_anonymity(mut self, anonymity: impl Into<String>) -> Self {
        self.anonymity = Some(anonymity.into());
        self
    }

    /// Marks TLS support.
    pub fn with_tls(mut self, supports_tls: bool) -> Self {
        self.supports_tls = supports_tls;
        self
    }

    /// host:port identity used for deduplication and eviction.
    pub fn key(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Proxy URL in the scheme reqwest expects.
    pub fn url(&self) -> String {
        format!("http://{}:{}", self.host, self.port)
    }

    /// Whether the candidate has passed a probe.
    pub fn is_working(&self) -> bool {
        self.health == HealthState::Working
    }
}
