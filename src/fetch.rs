//! Retrying fetch client with identity rotation, backoff, and proxy fallback.

use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use rand::Rng;
use reqwest::{Client, Proxy as ReqwestProxy};
use serde::Serialize;
use tracing::{debug, warn};

use crate::config::HarvestConfig;
use crate::proxy::{ProxyCandidate, ProxyPool};
use crate::Result;

/// Proxy swaps allowed within one fetch before falling back to a direct
/// connection. Swaps do not consume the transient retry budget, so a run of
/// bad proxies must not loop forever.
const MAX_PROXY_SWAPS: u32 = 5;

/// Rotated client identities.
const USER_AGENTS: &[&str] = &[
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/119.0.0.0 Safari/537.36",
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:121.0) Gecko/20100101 Firefox/121.0",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10.15; rv:121.0) Gecko/20100101 Firefox/121.0",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.1 Safari/605.1.15",
];

/// Picks a random browser identity.
pub fn random_user_agent() -> &'static str {
    let index = rand::thread_rng().gen_range(0..USER_AGENTS.len());
    USER_AGENTS[index]
}

/// Injectable delay so retry timing is testable without wall-clock waits.
#[async_trait]
pub trait DelaySource: Send + Sync {
    async fn sleep(&self, duration: Duration);
}

/// Real delays via the tokio timer.
pub struct TokioDelay;

#[async_trait]
impl DelaySource for TokioDelay {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

/// Pure backoff schedule. Transient failures back off exponentially,
/// rate limiting backs off linearly on a longer base.
#[derive(Debug, Clone)]
pub struct Backoff {
    transient_base: Duration,
    rate_limit_base: Duration,
    cap: Duration,
}

impl Default for Backoff {
    fn default() -> Self {
        Self {
            transient_base: Duration::from_secs(1),
            rate_limit_base: Duration::from_secs(5),
            cap: Duration::from_secs(60),
        }
    }
}

impl Backoff {
    /// Delay before retrying attempt `attempt` after a transient failure:
    /// base × 2^attempt, capped. Non-decreasing in `attempt`.
    pub fn transient(&self, attempt: u32) -> Duration {
        let factor = 2u32.saturating_pow(attempt.min(16));
        (self.transient_base * factor).min(self.cap)
    }

    /// Delay before retrying attempt `attempt` after a 429: linear in the
    /// attempt index rather than exponential.
    pub fn rate_limited(&self, attempt: u32) -> Duration {
        (self.rate_limit_base * (attempt + 1)).min(self.cap)
    }
}

/// One request/response exchange, stripped to what the retry loop needs.
#[derive(Debug, Clone)]
pub struct TransportResponse {
    pub status: u16,
    pub body: String,
}

/// Failure classes the retry loop distinguishes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    /// The request timed out.
    Timeout,
    /// Connection could not be established or was reset.
    Connect,
    /// Anything else.
    Other(String),
}

/// Seam between the retry loop and the wire. The default implementation
/// uses reqwest; tests script responses.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn execute(
        &self,
        url: &str,
        user_agent: &str,
        proxy: Option<&ProxyCandidate>,
        timeout: Duration,
    ) -> std::result::Result<TransportResponse, TransportError>;
}

/// reqwest-backed transport. Builds a fresh client per attempt so each one
/// carries its own identity and proxy assignment.
pub struct HttpTransport;

#[async_trait]
impl Transport for HttpTransport {
    async fn execute(
        &self,
        url: &str,
        user_agent: &str,
        proxy: Option<&ProxyCandidate>,
        timeout: Duration,
    ) -> std::result::Result<TransportResponse, TransportError> {
        let mut builder = Client::builder().user_agent(user_agent).timeout(timeout);

        if let Some(candidate) = proxy {
            let reqwest_proxy = ReqwestProxy::all(candidate.url())
                .map_err(|e| TransportError::Other(e.to_string()))?;
            // Free proxies routinely intercept TLS.
            builder = builder
                .proxy(reqwest_proxy)
                .danger_accept_invalid_certs(true);
        }

        let client = builder
            .build()
            .map_err(|e| TransportError::Other(e.to_string()))?;

        match client.get(url).send().await {
            Ok(response) => {
                let status = response.status().as_u16();
                let body = response.text().await.unwrap_or_default();
                Ok(TransportResponse { status, body })
            }
            Err(e) if e.is_timeout() => Err(TransportError::Timeout),
            Err(e) if e.is_connect() => Err(TransportError::Connect),
            Err(e) => Err(TransportError::Other(e.to_string())),
        }
    }
}

/// Outcome of a single attempt within a fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AttemptOutcome {
    Success,
    TransientFailure,
    ProxyFailure,
    RateLimited,
    Exhausted,
}

/// Record of one attempt, kept for observability and tests.
#[derive(Debug, Clone, Serialize)]
pub struct FetchAttempt {
    pub target: String,
    pub method: String,
    pub proxy: Option<String>,
    pub attempt: u32,
    pub elapsed_ms: u64,
    pub outcome: AttemptOutcome,
}

/// Fetch client.
///
/// Expected failure classes never surface as errors: after the retry budget
/// is spent the fetch resolves to `None` and the caller carries on with
/// fewer results. A mandatory pacing delay with jitter runs before every
/// attempt, independent of other concurrently running clients.
pub struct FetchClient {
    transport: Arc<dyn Transport>,
    delay: Arc<dyn DelaySource>,
    pool: Option<Arc<ProxyPool>>,
    backoff: Backoff,
    rate_limit_delay: Duration,
    max_retries: u32,
    timeout: Duration,
}

impl FetchClient {
    /// Creates a client from configuration. Fails only on invalid tunables.
    pub fn new(config: &HarvestConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            transport: Arc::new(HttpTransport),
            delay: Arc::new(TokioDelay),
            pool: None,
            backoff: Backoff::default(),
            rate_limit_delay: config.rate_limit_delay,
            max_retries: config.max_retries,
            timeout: config.request_timeout,
        })
    }

    /// Routes requests through a proxy pool.
    pub fn with_pool(mut self, pool: Arc<ProxyPool>) -> Self {
        self.pool = Some(pool);
        self
    }

    /// Replaces the transport (tests).
    pub fn with_transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport = transport;
        self
    }

    /// Replaces the delay source (tests).
    pub fn with_delay_source(mut self, delay: Arc<dyn DelaySource>) -> Self {
        self.delay = delay;
        self
    }

    /// Replaces the backoff schedule.
    pub fn with_backoff(mut self, backoff: Backoff) -> Self {
        self.backoff = backoff;
        self
    }

    /// Fetches the body at `url`. `None` after retry exhaustion.
    pub async fn fetch(&self, url: &str) -> Option<String> {
        self.fetch_traced(url).await.0
    }

    /// Like `fetch`, also returning the attempt trail.
    pub async fn fetch_traced(&self, url: &str) -> (Option<String>, Vec<FetchAttempt>) {
        let mut attempts = Vec::new();
        let mut attempt: u32 = 0;
        let mut proxy_swaps: u32 = 0;
        let mut proxy = match &self.pool {
            Some(pool) => pool.get().await,
            None => None,
        };

        loop {
            self.delay.sleep(self.pacing_delay()).await;

            let user_agent = random_user_agent();
            let started = Instant::now();
            let result = self
                .transport
                .execute(url, user_agent, proxy.as_ref(), self.timeout)
                .await;
            let elapsed_ms = started.elapsed().as_millis() as u64;

            let record = |outcome: AttemptOutcome| FetchAttempt {
                target: url.to_string(),
                method: "GET".to_string(),
                proxy: proxy.as_ref().map(|p| p.key()),
                attempt,
                elapsed_ms,
                outcome,
            };

            match result {
                Ok(response) if (200..300).contains(&response.status) => {
                    attempts.push(record(AttemptOutcome::Success));
                    return (Some(response.body), attempts);
                }
                Ok(response) if response.status == 429 => {
                    debug!(url, attempt, "rate limited");
                    if attempt >= self.max_retries {
                        attempts.push(record(AttemptOutcome::Exhausted));
                        warn!(url, "retries exhausted after rate limiting");
                        return (None, attempts);
                    }
                    attempts.push(record(AttemptOutcome::RateLimited));
                    self.delay.sleep(self.backoff.rate_limited(attempt)).await;
                    attempt += 1;
                }
                Ok(response) => {
                    debug!(url, status = response.status, attempt, "unexpected status");
                    if attempt >= self.max_retries {
                        attempts.push(record(AttemptOutcome::Exhausted));
                        warn!(url, "retries exhausted");
                        return (None, attempts);
                    }
                    attempts.push(record(AttemptOutcome::TransientFailure));
                    self.delay.sleep(self.backoff.transient(attempt)).await;
                    attempt += 1;
                }
                Err(TransportError::Timeout) | Err(TransportError::Connect)
                    if proxy.is_some() && proxy_swaps < MAX_PROXY_SWAPS =>
                {
                    // Proxy-class failure: evict and retry with a fresh proxy.
                    // Does not consume the transient retry budget, so one bad
                    // proxy cannot exhaust the caller's allowance.
                    attempts.push(record(AttemptOutcome::ProxyFailure));
                    if let Some(pool) = &self.pool {
                        if let Some(failed) = proxy.as_ref() {
                            debug!(url, proxy = %failed.key(), "evicting failed proxy");
                            pool.remove(failed).await;
                        }
                        proxy = pool.get().await;
                    } else {
                        proxy = None;
                    }
                    proxy_swaps += 1;
                }
                Err(e) => {
                    debug!(url, error = ?e, attempt, "transient failure");
                    if attempt >= self.max_retries {
                        attempts.push(record(AttemptOutcome::Exhausted));
                        warn!(url, "retries exhausted");
                        return (None, attempts);
                    }
                    attempts.push(record(AttemptOutcome::TransientFailure));
                    self.delay.sleep(self.backoff.transient(attempt)).await;
                    attempt += 1;
                }
            }
        }
    }

    /// Mandatory minimum delay plus random jitter before each attempt.
    /// A zero configured delay disables pacing entirely, jitter included,
    /// so timing-sensitive callers can opt out.
    fn pacing_delay(&self) -> Duration {
        if self.rate_limit_delay.is_zero() {
            return Duration::ZERO;
        }
        let jitter_ms = rand::thread_rng().gen_range(0..1000u64);
        self.rate_limit_delay + Duration::from_millis(jitter_ms)
    }
}
