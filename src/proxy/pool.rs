//! Owned, synchronized pool of working proxies.

use std::time::{Duration, Instant};

use chrono::Utc;
use rand::Rng;
use reqwest::Client;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use std::sync::Arc;

use crate::proxy::sources::{default_sources, fetch_candidates, ProxyListSource};
use crate::proxy::store::ProxyStore;
use crate::proxy::{HealthState, Prober, ProxyCandidate};
use crate::{HarvestError, Result};

const SOURCE_FETCH_TIMEOUT_SECS: u64 = 10;
const SOURCE_FETCH_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0 Safari/537.36";

/// Proxy pool owning the working set.
///
/// All access goes through this one owner: reads (`get`) take a snapshot
/// under the lock, writes (`remove`, `refresh`) are serialized against both
/// readers and other writers. There is no ambient global state.
///
/// `get` never refreshes inline; an empty or stale pool simply yields `None`
/// and callers degrade to direct connections while the owner of the session
/// schedules a `refresh`.
pub struct ProxyPool {
    working: RwLock<Vec<ProxyCandidate>>,
    last_refresh: RwLock<Option<Instant>>,
    refresh_interval: Duration,
    sources: Vec<Box<dyn ProxyListSource>>,
    prober: Prober,
    store: Option<Arc<dyn ProxyStore>>,
    fetch_client: Client,
    enabled: bool,
}

impl ProxyPool {
    /// Creates an empty pool wired to the built-in proxy-list sources.
    pub fn new() -> Result<Self> {
        let fetch_client = Client::builder()
            .timeout(Duration::from_secs(SOURCE_FETCH_TIMEOUT_SECS))
            .user_agent(SOURCE_FETCH_USER_AGENT)
            .build()?;
        Ok(Self {
            working: RwLock::new(Vec::new()),
            last_refresh: RwLock::new(None),
            refresh_interval: Duration::from_secs(3600),
            sources: default_sources(),
            prober: Prober::new(),
            store: None,
            fetch_client,
            enabled: true,
        })
    }

    /// Creates a pool from pre-validated candidates. The candidates are
    /// marked working and the pool counts as freshly refreshed.
    pub fn with_candidates(candidates: Vec<ProxyCandidate>) -> Result<Self> {
        let mut pool = Self::new()?;
        let working: Vec<ProxyCandidate> = candidates
            .into_iter()
            .map(|mut c| {
                c.health = HealthState::Working;
                c
            })
            .collect();
        pool.enabled = !working.is_empty();
        pool.working = RwLock::new(working);
        pool.last_refresh = RwLock::new(Some(Instant::now()));
        Ok(pool)
    }

    /// Creates a single-proxy pool from a manual override URL
    /// (e.g. "http://10.0.0.1:8080").
    pub fn manual(proxy_url: &str) -> Result<Self> {
        let parsed = url::Url::parse(proxy_url)?;
        let host = parsed
            .host_str()
            .ok_or_else(|| HarvestError::InvalidConfig("manual proxy has no host".to_string()))?;
        let port = parsed
            .port()
            .ok_or_else(|| HarvestError::InvalidConfig("manual proxy has no port".to_string()))?;
        Self::with_candidates(vec![ProxyCandidate::new(host, port, "manual")])
    }

    /// Sets how long a refreshed working set stays fresh.
    pub fn with_refresh_interval(mut self, interval: Duration) -> Self {
        self.refresh_interval = interval;
        self
    }

    /// Replaces the proxy-list sources.
    pub fn with_sources(mut self, sources: Vec<Box<dyn ProxyListSource>>) -> Self {
        self.sources = sources;
        self
    }

    /// Replaces the prober.
    pub fn with_prober(mut self, prober: Prober) -> Self {
        self.prober = prober;
        self
    }

    /// Attaches a store; every refresh persists the new working set there.
    pub fn with_store(mut self, store: Arc<dyn ProxyStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// Enables or disables the pool.
    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    /// Whether the pool is enabled.
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Number of working candidates.
    pub async fn len(&self) -> usize {
        self.working.read().await.len()
    }

    /// Whether the working set is empty.
    pub async fn is_empty(&self) -> bool {
        self.working.read().await.is_empty()
    }

    /// Whether a refresh is due (never refreshed, or the interval elapsed).
    pub async fn is_stale(&self) -> bool {
        match *self.last_refresh.read().await {
            None => true,
            Some(at) => at.elapsed() > self.refresh_interval,
        }
    }

    /// Fetches candidates from every source, probes them, and replaces the
    /// working set. Expensive by design: several third-party round trips.
    ///
    /// Source exhaustion is not an error — an empty result leaves the pool
    /// empty and callers proceed proxy-less.
    pub async fn refresh(&self) -> usize {
        info!("refreshing proxy pool");
        let candidates = fetch_candidates(&self.fetch_client, &self.sources).await;
        debug!(candidates = candidates.len(), "probing candidates");
        let working = self.prober.probe_all(candidates).await;

        if working.is_empty() {
            warn!("proxy refresh produced no working candidates");
        } else {
            info!(working = working.len(), "proxy pool refreshed");
        }

        if let Some(store) = &self.store {
            // A failed save does not invalidate the in-memory set.
            if let Err(e) = store.save(&working) {
                warn!(error = %e, "failed to persist working set");
            }
        }

        let count = working.len();
        {
            let mut set = self.working.write().await;
            *set = working;
        }
        {
            let mut at = self.last_refresh.write().await;
            *at = Some(Instant::now());
        }
        count
    }

    /// Returns one random working candidate, stamping its last-used time.
    /// `None` when the pool is disabled or empty.
    pub async fn get(&self) -> Option<ProxyCandidate> {
        if !self.enabled {
            return None;
        }

        let mut set = self.working.write().await;
        if set.is_empty() {
            return None;
        }
        let index = rand::thread_rng().gen_range(0..set.len());
        set[index].last_used = Some(Utc::now());
        Some(set[index].clone())
    }

    /// Copy of the current working set.
    pub async fn snapshot(&self) -> Vec<ProxyCandidate> {
        self.working.read().await.clone()
    }

    /// Evicts a candidate observed failing during real traffic. Independent
    /// of periodic probing: a working proxy that breaks mid-session is
    /// removed immediately and not handed out again until a later refresh
    /// rediscovers it.
    pub async fn remove(&self, candidate: &ProxyCandidate) {
        let key = candidate.key();
        let mut set = self.working.write().await;
        let before = set.len();
        set.retain(|c| c.key() != key);
        if set.len() < before {
            debug!(proxy = %key, remaining = set.len(), "evicted failing proxy");
        }
    }
}
