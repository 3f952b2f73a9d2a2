//! # social-harvest
//!
//! A best-effort content acquisition library for public social platforms.
//!
//! Content is discovered through site-restricted web searches fanned out
//! across multiple search backends, fetched through a self-healing proxy
//! pool, and normalized into deduplicated records:
//!
//! - Proxy pool with health probing and eviction on failure
//! - Retrying fetch client with backoff and identity rotation
//! - Bounded-concurrency collection with early termination
//! - Multi-backend search aggregation with fallback
//! - Record normalization, keyword tagging, and URL deduplication
//!
//! Partial results are the expected mode of operation: unreachable
//! backends, dead proxies, and exhausted retries reduce the harvest, they
//! never fail it.
//!
//! ## Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use social_harvest::{
//!     Collector, FetchClient, HarvestConfig, KeywordTaxonomy, MemorySink,
//!     SearchAggregator,
//! };
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = HarvestConfig::new().with_target_count(100);
//!     let client = Arc::new(FetchClient::new(&config)?);
//!     let aggregator = Arc::new(SearchAggregator::new(client));
//!     let taxonomy = KeywordTaxonomy::default_monitoring();
//!
//!     let collector = Collector::new(aggregator, taxonomy, &config)?;
//!     let sink = MemorySink::new();
//!     let report = collector.run(&sink).await?;
//!
//!     println!("collected {} records", report.records_collected);
//!     Ok(())
//! }
//! ```

mod config;
mod error;
mod fetch;
mod keywords;
mod record;
mod result;
mod search;
mod session;
mod sink;

pub mod engines;
pub mod platforms;
pub mod proxy;

pub use config::HarvestConfig;
pub use error::{HarvestError, Result};
pub use fetch::{
    AttemptOutcome, Backoff, DelaySource, FetchAttempt, FetchClient, HttpTransport, TokioDelay,
    Transport, TransportError, TransportResponse,
};
pub use keywords::KeywordTaxonomy;
pub use record::{Normalizer, ScrapedRecord};
pub use result::{normalize_url, SearchResult};
pub use search::SearchAggregator;
pub use session::{CollectTask, Collector, Report};
pub use sink::{MemorySink, RecordSink};
