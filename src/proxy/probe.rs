//! Reachability probing for proxy candidates.

use std::time::Duration;

use futures::stream::{self, StreamExt};
use reqwest::{Client, Proxy as ReqwestProxy};
use tracing::debug;

use crate::proxy::{HealthState, ProxyCandidate};

const DEFAULT_PROBE_TIMEOUT_SECS: u64 = 5;
const DEFAULT_PROBE_CONCURRENCY: usize = 20;

/// Lightweight endpoints a proxy must reach to count as working. The first
/// successful response promotes the candidate.
const DEFAULT_ENDPOINTS: &[&str] = &["http://httpbin.org/ip", "https://api.ipify.org?format=json"];

/// Probes candidates against reachability endpoints with capped concurrency.
#[derive(Debug, Clone)]
pub struct Prober {
    timeout: Duration,
    concurrency: usize,
    endpoints: Vec<String>,
}

impl Default for Prober {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(DEFAULT_PROBE_TIMEOUT_SECS),
            concurrency: DEFAULT_PROBE_CONCURRENCY,
            endpoints: DEFAULT_ENDPOINTS.iter().map(|s| s.to_string()).collect(),
        }
    }
}

impl Prober {
    /// Creates a prober with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the per-probe timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Sets the probe concurrency cap.
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    /// Replaces the reachability endpoints.
    pub fn with_endpoints(mut self, endpoints: Vec<String>) -> Self {
        self.endpoints = endpoints;
        self
    }

    /// Probes one candidate. The first endpoint that answers with a success
    /// status marks it `Working`; otherwise it becomes `Failed`.
    pub async fn probe(&self, mut candidate: ProxyCandidate) -> ProxyCandidate {
        candidate.health = HealthState::Failed;

        let Ok(proxy) = ReqwestProxy::all(candidate.url()) else {
            return candidate;
        };
        let Ok(client) = Client::builder()
            .proxy(proxy)
            .timeout(self.timeout)
            .danger_accept_invalid_certs(true)
            .build()
        else {
            return candidate;
        };

        for endpoint in &self.endpoints {
            match client.get(endpoint).send().await {
                Ok(response) if response.status().is_success() => {
                    debug!(proxy = %candidate.key(), endpoint, "probe succeeded");
                    candidate.health = HealthState::Working;
                    return candidate;
                }
                _ => continue,
            }
        }

        candidate
    }

    /// Probes all candidates in parallel (capped) and returns only the
    /// working ones.
    pub async fn probe_all(&self, candidates: Vec<ProxyCandidate>) -> Vec<ProxyCandidate> {
        let total = candidates.len();

        let probed: Vec<ProxyCandidate> = stream::iter(candidates)
            .map(|candidate| self.probe(candidate))
            .buffer_unordered(self.concurrency)
            .collect()
            .await;

        let working: Vec<ProxyCandidate> =
            probed.into_iter().filter(|c| c.is_working()).collect();
        debug!(total, working = working.len(), "probe pass complete");
        working
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prober_defaults() {
        let prober = Prober::new();
        assert_eq!(prober.timeout, Duration::from_secs(5));
        assert_eq!(prober.concurrency, 20);
        assert_eq!(prober.endpoints.len(), 2);
    }

    #[test]
    fn test_prober_builder() {
        let prober = Prober::new()
            .with_timeout(Duration::from_secs(2))
            .with_concurrency(5)
            .with_endpoints(vec!["http://example.com".to_string()]);
        assert_eq!(prober.timeout, Duration::from_secs(2));
        assert_eq!(prober.concurrency, 5);
        assert_eq!(prober.endpoints, vec!["http://example.com".to_string()]);
    }

    #[test]
    fn test_prober_concurrency_floor() {
        let prober = Prober::new().with_concurrency(0);
        assert_eq!(prober.concurrency, 1);
    }

    #[tokio::test]
    async fn test_probe_unreachable_candidate_fails() {
        // TEST-NET-1 address with a tight timeout: the probe cannot succeed.
        let prober = Prober::new()
            .with_timeout(Duration::from_millis(100))
            .with_endpoints(vec!["http://192.0.2.1/".to_string()]);
        let candidate = ProxyCandidate::new("192.0.2.1", 9, "test");
        let probed = prober.probe(candidate).await;
        assert_eq!(probed.health, HealthState::Failed);
    }

    #[tokio::test]
    async fn test_probe_all_empty_input() {
        let prober = Prober::new();
        let working = prober.probe_all(vec![]).await;
        assert!(working.is_empty());
    }

    #[tokio::test]
    async fn test_probe_all_filters_failures() {
        let prober = Prober::new()
            .with_timeout(Duration::from_millis(100))
            .with_concurrency(4)
            .with_endpoints(vec!["http://192.0.2.1/".to_string()]);
        let candidates = vec![
            ProxyCandidate::new("192.0.2.1", 9, "test"),
            ProxyCandidate::new("192.0.2.2", 9, "test"),
        ];
        let working = prober.probe_all(candidates).await;
        assert!(working.is_empty());
    }
}
