//! Bing web search backend.

use async_trait::async_trait;
use scraper::{Html, Selector};
use tracing::debug;

use crate::error::HarvestError;
use crate::fetch::FetchClient;
use crate::result::SearchResult;
use crate::Result;

use super::SearchBackend;

/// Results per page; drives the `first` offset parameter.
const PAGE_SIZE: usize = 10;

/// Bing backend.
pub struct Bing;

impl Bing {
    pub fn new() -> Self {
        Self
    }

    fn page_url(&self, query: &str, page: usize) -> String {
        let mut url = format!(
            "https://www.bing.com/search?q={}",
            urlencoding::encode(query)
        );
        if page > 0 {
            // Offset is 1-based: page 1 starts at result 11.
            url.push_str(&format!("&first={}", page * PAGE_SIZE + 1));
        }
        url
    }

    fn parse_results(&self, html: &str) -> Result<Vec<SearchResult>> {
        let document = Html::parse_document(html);
        let result_selector = Selector::parse("li.b_algo")
            .map_err(|e| HarvestError::Parse(format!("bad selector: {:?}", e)))?;
        let title_selector = Selector::parse("h2 a")
            .map_err(|e| HarvestError::Parse(format!("bad selector: {:?}", e)))?;
        let snippet_selector = Selector::parse(".b_caption p")
            .map_err(|e| HarvestError::Parse(format!("bad selector: {:?}", e)))?;

        let mut results = Vec::new();

        for element in document.select(&result_selector) {
            let Some(title_elem) = element.select(&title_selector).next() else {
                continue;
            };

            let title = title_elem.text().collect::<String>().trim().to_string();
            let url = title_elem.value().attr("href").unwrap_or_default().to_string();

            let snippet = element
                .select(&snippet_selector)
                .next()
                .map(|e| e.text().collect::<String>().trim().to_string())
                .unwrap_or_default();

            if !url.is_empty() && !title.is_empty() {
                results.push(SearchResult::new(url, title, snippet));
            }
        }

        Ok(results)
    }
}

impl Default for Bing {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SearchBackend for Bing {
    fn name(&self) -> &str {
        "bing"
    }

    async fn search(
        &self,
        client: &FetchClient,
        query: &str,
        page: usize,
    ) -> Result<Vec<SearchResult>> {
        let url = self.page_url(query, page);
        debug!(query, page, "querying bing");

        let html = client
            .fetch(&url)
            .await
            .ok_or_else(|| HarvestError::SourceUnavailable {
                provider: "bing".to_string(),
                reason: "fetch exhausted retries".to_string(),
            })?;

        self.parse_results(&html)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_url_first_page() {
        let engine = Bing::new();
        let url = engine.page_url("rust async", 0);
        assert_eq!(url, "https://www.bing.com/search?q=rust%20async");
    }

    #[test]
    fn test_page_url_offset() {
        let engine = Bing::new();
        let url = engine.page_url("rust", 3);
        assert!(url.ends_with("&first=31"));
    }

    #[test]
    fn test_parse_results_empty_html() {
        let engine = Bing::new();
        let results = engine.parse_results("<html><body></body></html>").unwrap();
        assert!(results.is_empty());
    }

    #[test]
    fn test_parse_results_extracts_fields() {
        let engine = Bing::new();
        let html = r#"
            <html><body><ol id="b_results">
                <li class="b_algo">
                    <h2><a href="https://example.com/page">Example Page</a></h2>
                    <div class="b_caption"><p>A snippet about the page.</p></div>
                </li>
                <li class="b_algo">
                    <h2><a href="https://other.example/">Other</a></h2>
                </li>
            </ol></body></html>
        "#;
        let results = engine.parse_results(html).unwrap();
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].url, "https://example.com/page");
        assert_eq!(results[0].snippet, "A snippet about the page.");
        assert_eq!(results[1].snippet, "");
    }
}
