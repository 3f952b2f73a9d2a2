//! Proxy-list sources.
//!
//! Each source knows how to turn one third-party proxy listing into
//! candidates. A source that errors or returns malformed data is skipped by
//! `fetch_candidates` without failing the overall call.

use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use reqwest::Client;
use scraper::{Html, Selector};
use serde::Deserialize;
use tracing::{debug, warn};

use crate::proxy::ProxyCandidate;
use crate::{HarvestError, Result};

/// Matches bare IP:PORT pairs embedded in arbitrary text.
static IP_PORT_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b(\d{1,3}\.\d{1,3}\.\d{1,3}\.\d{1,3}):(\d{1,5})\b").expect("invalid regex")
});

/// A third-party provider of proxy candidates.
#[async_trait]
pub trait ProxyListSource: Send + Sync {
    /// Source name, recorded on every candidate it produces.
    fn name(&self) -> &str;

    /// Fetches and parses the provider's current listing.
    async fn fetch(&self, client: &Client) -> Result<Vec<ProxyCandidate>>;
}

/// Queries all sources and merges their candidates, deduplicating by
/// host:port. Partial sources are acceptable: a failing source logs a
/// warning and contributes nothing.
pub async fn fetch_candidates(
    client: &Client,
    sources: &[Box<dyn ProxyListSource>],
) -> Vec<ProxyCandidate> {
    let mut merged: Vec<ProxyCandidate> = Vec::new();
    let mut seen = std::collections::HashSet::new();

    for source in sources {
        match source.fetch(client).await {
            Ok(candidates) => {
                debug!(
                    source = source.name(),
                    count = candidates.len(),
                    "fetched proxy candidates"
                );
                for candidate in candidates {
                    if seen.insert(candidate.key()) {
                        merged.push(candidate);
                    }
                }
            }
            Err(e) => {
                warn!(source = source.name(), error = %e, "proxy source unavailable, skipping");
            }
        }
    }

    merged
}

/// The built-in proxy-list sources, in the order they are queried.
pub fn default_sources() -> Vec<Box<dyn ProxyListSource>> {
    vec![
        Box::new(FreeProxyList),
        Box::new(ProxyScrape),
        Box::new(SslProxies),
    ]
}

/// Extracts candidates from plain IP:PORT text. Used as a fallback when a
/// provider changes its markup but still embeds addresses in the body.
pub fn extract_from_text(content: &str, source: &str) -> Vec<ProxyCandidate> {
    let mut candidates = Vec::new();
    let mut seen = std::collections::HashSet::new();

    for cap in IP_PORT_REGEX.captures_iter(content) {
        let host = &cap[1];
        let Ok(port) = cap[2].parse::<u16>() else {
            continue;
        };
        if port == 0 || !valid_ipv4(host) {
            continue;
        }
        let candidate = ProxyCandidate::new(host, port, source);
        if seen.insert(candidate.key()) {
            candidates.push(candidate);
        }
    }

    candidates
}

fn valid_ipv4(host: &str) -> bool {
    let parts: Vec<&str> = host.split('.').collect();
    parts.len() == 4 && parts.iter().all(|p| p.parse::<u8>().is_ok())
}

fn selector(css: &str) -> Result<Selector> {
    Selector::parse(css).map_err(|e| HarvestError::Parse(format!("bad selector: {:?}", e)))
}

/// free-proxy-list.net — HTML table listing.
pub struct FreeProxyList;

impl FreeProxyList {
    const URL: &'static str = "https://free-proxy-list.net/";
    const ROW_LIMIT: usize = 50;

    fn parse(html: &str) -> Result<Vec<ProxyCandidate>> {
        let candidates = parse_proxy_table(html, "free-proxy-list", Self::ROW_LIMIT, false)?;
        if candidates.is_empty() {
            return Ok(extract_from_text(html, "free-proxy-list"));
        }
        Ok(candidates)
    }
}

#[async_trait]
impl ProxyListSource for FreeProxyList {
    fn name(&self) -> &str {
        "free-proxy-list"
    }

    async fn fetch(&self, client: &Client) -> Result<Vec<ProxyCandidate>> {
        let html = client.get(Self::URL).send().await?.text().await?;
        Self::parse(&html)
    }
}

/// sslproxies.org — HTML table listing; everything it lists supports TLS.
pub struct SslProxies;

impl SslProxies {
    const URL: &'static str = "https://www.sslproxies.org/";
    const ROW_LIMIT: usize = 30;

    fn parse(html: &str) -> Result<Vec<ProxyCandidate>> {
        let candidates = parse_proxy_table(html, "sslproxies", Self::ROW_LIMIT, true)?;
        if candidates.is_empty() {
            return Ok(extract_from_text(html, "sslproxies"));
        }
        Ok(candidates)
    }
}

#[async_trait]
impl ProxyListSource for SslProxies {
    fn name(&self) -> &str {
        "sslproxies"
    }

    async fn fetch(&self, client: &Client) -> Result<Vec<ProxyCandidate>> {
        let html = client.get(Self::URL).send().await?.text().await?;
        Self::parse(&html)
    }
}

/// Shared parser for the table layout both HTML sources use:
/// ip, port, code, country, anonymity, google, https.
fn parse_proxy_table(
    html: &str,
    source: &str,
    limit: usize,
    force_tls: bool,
) -> Result<Vec<ProxyCandidate>> {
    let document = Html::parse_document(html);
    let row_sel = selector("table tbody tr")?;
    let cell_sel = selector("td")?;

    let mut candidates = Vec::new();
    for row in document.select(&row_sel) {
        if candidates.len() >= limit {
            break;
        }
        let cells: Vec<String> = row
            .select(&cell_sel)
            .map(|c| c.text().collect::<String>().trim().to_string())
            .collect();
        if cells.len() < 7 {
            continue;
        }
        let Ok(port) = cells[1].parse::<u16>() else {
            continue;
        };
        if cells[0].is_empty() || port == 0 {
            continue;
        }
        let supports_tls = force_tls || cells[6].eq_ignore_ascii_case("yes");
        candidates.push(
            ProxyCandidate::new(cells[0].clone(), port, source)
                .with_country(cells[3].clone())
                .with_anonymity(cells[4].clone())
                .with_tls(supports_tls),
        );
    }

    Ok(candidates)
}

/// api.proxyscrape.com — JSON API.
pub struct ProxyScrape;

#[derive(Debug, Deserialize)]
struct ProxyScrapeBody {
    #[serde(default)]
    proxies: Vec<ProxyScrapeEntry>,
}

#[derive(Debug, Deserialize)]
struct ProxyScrapeEntry {
    ip: String,
    port: u16,
    #[serde(default)]
    country: Option<String>,
    #[serde(default)]
    anonymity: Option<String>,
    #[serde(default)]
    ssl: bool,
}

impl ProxyScrape {
    const URL: &'static str = "https://api.proxyscrape.com/v2/?request=get&protocol=http&timeout=10000&country=all&ssl=all&anonymity=all&format=json";
    const ENTRY_LIMIT: usize = 50;

    fn parse(body: &str) -> Result<Vec<ProxyCandidate>> {
        let parsed: ProxyScrapeBody =
            serde_json::from_str(body).map_err(|e| HarvestError::Parse(e.to_string()))?;

        Ok(parsed
            .proxies
            .into_iter()
            .take(Self::ENTRY_LIMIT)
            .filter(|entry| !entry.ip.is_empty() && entry.port != 0)
            .map(|entry| {
                let mut candidate =
                    ProxyCandidate::new(entry.ip, entry.port, "proxyscrape").with_tls(entry.ssl);
                if let Some(country) = entry.country {
                    candidate = candidate.with_country(country);
                }
                if let Some(anonymity) = entry.anonymity {
                    candidate = candidate.with_anonymity(anonymity);
                }
                candidate
            })
            .collect())
    }
}

#[async_trait]
impl ProxyListSource for ProxyScrape {
    fn name(&self) -> &str {
        "proxyscrape"
    }

    async fn fetch(&self, client: &Client) -> Result<Vec<ProxyCandidate>> {
        let body = client.get(Self::URL).send().await?.text().await?;
        Self::parse(&body)
    }
}
