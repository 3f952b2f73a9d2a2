//! Multi-backend search aggregation.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use rand::Rng;
use tracing::{debug, warn};

use crate::engines::{default_backends, SearchBackend};
use crate::fetch::{DelaySource, FetchClient, TokioDelay};
use crate::result::SearchResult;

/// Queries backends in priority order until enough results are gathered.
///
/// A failing backend contributes zero results and the next one is tried;
/// only when every backend fails does a query come back empty, and even
/// that is not an error. Duplicate URLs across backends are dropped,
/// first occurrence wins.
pub struct SearchAggregator {
    backends: Vec<Arc<dyn SearchBackend>>,
    client: Arc<FetchClient>,
    delay: Arc<dyn DelaySource>,
}

impl SearchAggregator {
    pub fn new(client: Arc<FetchClient>) -> Self {
        Self {
            backends: default_backends(),
            client,
            delay: Arc::new(TokioDelay),
        }
    }

    /// Replaces the backend list (tests, or a narrower deployment).
    pub fn with_backends(mut self, backends: Vec<Arc<dyn SearchBackend>>) -> Self {
        self.backends = backends;
        self
    }

    /// Replaces the inter-backend delay source (tests).
    pub fn with_delay_source(mut self, delay: Arc<dyn DelaySource>) -> Self {
        self.delay = delay;
        self
    }

    /// Searches for `query` on the given page, short-circuiting once
    /// `wanted` unique results are in hand.
    pub async fn search(&self, query: &str, page: usize, wanted: usize) -> Vec<SearchResult> {
        let mut collected: Vec<SearchResult> = Vec::new();
        let mut seen: HashSet<String> = HashSet::new();

        for (index, backend) in self.backends.iter().enumerate() {
            if collected.len() >= wanted {
                break;
            }
            if index > 0 {
                self.delay.sleep(inter_backend_delay()).await;
            }

            match backend.search(&self.client, query, page).await {
                Ok(results) => {
                    debug!(
                        backend = backend.name(),
                        query,
                        count = results.len(),
                        "backend returned results"
                    );
                    for result in results {
                        if seen.insert(result.normalized_url()) {
                            collected.push(result);
                        }
                    }
                }
                Err(e) => {
                    warn!(backend = backend.name(), query, error = %e, "backend failed");
                }
            }
        }

        if collected.is_empty() {
            warn!(query, "all backends returned nothing");
        }
        collected
    }
}

/// Random pause between backends so consecutive engines are not hit
/// back-to-back.
fn inter_backend_delay() -> Duration {
    Duration::from_millis(rand::thread_rng().gen_range(500..=1500))
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use crate::config::HarvestConfig;
    use crate::error::HarvestError;
    use crate::Result;

    struct StaticBackend {
        name: &'static str,
        results: Vec<SearchResult>,
        calls: AtomicUsize,
    }

    impl StaticBackend {
        fn new(name: &'static str, results: Vec<SearchResult>) -> Arc<Self> {
            Arc::new(Self {
                name,
                results,
                calls: AtomicUsize::new(0),
            })
        }
    }

    #[async_trait]
    impl SearchBackend for StaticBackend {
        fn name(&self) -> &str {
            self.name
        }

        async fn search(
            &self,
            _client: &FetchClient,
            _query: &str,
            _page: usize,
        ) -> Result<Vec<SearchResult>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.results.clone())
        }
    }

    struct FailingBackend {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl SearchBackend for FailingBackend {
        fn name(&self) -> &str {
            "failing"
        }

        async fn search(
            &self,
            _client: &FetchClient,
            _query: &str,
            _page: usize,
        ) -> Result<Vec<SearchResult>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Err(HarvestError::SourceUnavailable {
                provider: "failing".to_string(),
                reason: "down".to_string(),
            })
        }
    }

    struct NoopDelay;

    #[async_trait]
    impl DelaySource for NoopDelay {
        async fn sleep(&self, _duration: Duration) {}
    }

    fn result(url: &str) -> SearchResult {
        SearchResult::new(url, "title", "snippet")
    }

    fn aggregator(backends: Vec<Arc<dyn SearchBackend>>) -> SearchAggregator {
        let client = Arc::new(FetchClient::new(&HarvestConfig::new()).unwrap());
        SearchAggregator::new(client)
            .with_backends(backends)
            .with_delay_source(Arc::new(NoopDelay))
    }

    #[test]
    fn test_inter_backend_delay_bounds() {
        for _ in 0..50 {
            let d = inter_backend_delay();
            assert!(d >= Duration::from_millis(500));
            assert!(d <= Duration::from_millis(1500));
        }
    }

    #[tokio::test]
    async fn test_search_short_circuits_when_satisfied() {
        let first = StaticBackend::new(
            "first",
            vec![result("https://a.example/1"), result("https://a.example/2")],
        );
        let second = StaticBackend::new("second", vec![result("https://b.example/1")]);
        let agg = aggregator(vec![
            first.clone() as Arc<dyn SearchBackend>,
            second.clone(),
        ]);

        let results = agg.search("query", 0, 2).await;
        assert_eq!(results.len(), 2);
        assert_eq!(first.calls.load(Ordering::SeqCst), 1);
        assert_eq!(second.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_search_falls_through_on_failure() {
        let failing = Arc::new(FailingBackend {
            calls: AtomicUsize::new(0),
        });
        let fallback = StaticBackend::new("fallback", vec![result("https://b.example/1")]);
        let agg = aggregator(vec![
            failing.clone() as Arc<dyn SearchBackend>,
            fallback.clone(),
        ]);

        let results = agg.search("query", 0, 5).await;
        assert_eq!(results.len(), 1);
        assert_eq!(failing.calls.load(Ordering::SeqCst), 1);
        assert_eq!(fallback.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_search_dedups_across_backends() {
        // Same destination with cosmetic URL differences.
        let first = StaticBackend::new("first", vec![result("https://example.com/post/")]);
        let second = StaticBackend::new("second", vec![result("http://EXAMPLE.com/post")]);
        let agg = aggregator(vec![first as Arc<dyn SearchBackend>, second]);

        let results = agg.search("query", 0, 10).await;
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].url, "https://example.com/post/");
    }

    #[tokio::test]
    async fn test_search_all_backends_fail_is_empty_not_error() {
        let agg = aggregator(vec![
            Arc::new(FailingBackend {
                calls: AtomicUsize::new(0),
            }) as Arc<dyn SearchBackend>,
            Arc::new(FailingBackend {
                calls: AtomicUsize::new(0),
            }),
        ]);
        let results = agg.search("query", 0, 10).await;
        assert!(results.is_empty());
    }

    #[tokio::test]
    async fn test_search_accumulates_until_wanted() {
        let first = StaticBackend::new("first", vec![result("https://a.example/1")]);
        let second = StaticBackend::new("second", vec![result("https://b.example/1")]);
        let third = StaticBackend::new("third", vec![result("https://c.example/1")]);
        let agg = aggregator(vec![first as Arc<dyn SearchBackend>, second, third.clone()]);

        let results = agg.search("query", 0, 2).await;
        assert_eq!(results.len(), 2);
        assert_eq!(third.calls.load(Ordering::SeqCst), 0);
    }
}
