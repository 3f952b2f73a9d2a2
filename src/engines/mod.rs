//! Search backend implementations.

mod bing;
mod duckduckgo;
mod startpage;

use std::sync::Arc;

use async_trait::async_trait;

pub use bing::Bing;
pub use duckduckgo::DuckDuckGo;
pub use startpage::Startpage;

use crate::fetch::FetchClient;
use crate::result::SearchResult;
use crate::Result;

/// A web search engine queried through the shared fetch client.
#[async_trait]
pub trait SearchBackend: Send + Sync {
    /// Backend name, used in logs and result provenance.
    fn name(&self) -> &str;

    /// Runs `query` and returns parsed results for the given page
    /// (zero-based). An unreachable or unparsable backend is an error;
    /// the aggregator decides whether to fall through to the next one.
    async fn search(
        &self,
        client: &FetchClient,
        query: &str,
        page: usize,
    ) -> Result<Vec<SearchResult>>;
}

/// Backends in priority order: most permissive first.
pub fn default_backends() -> Vec<Arc<dyn SearchBackend>> {
    vec![
        Arc::new(DuckDuckGo::new()),
        Arc::new(Bing::new()),
        Arc::new(Startpage::new()),
    ]
}
