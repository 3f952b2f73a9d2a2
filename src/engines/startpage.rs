//! Startpage backend.

use async_trait::async_trait;
use scraper::{Html, Selector};
use tracing::debug;

use crate::error::HarvestError;
use crate::fetch::FetchClient;
use crate::result::SearchResult;
use crate::Result;

use super::SearchBackend;

/// Startpage backend. Google-proxied results, strictest rate limiting of
/// the three, so it sits last in the priority order.
pub struct Startpage;

impl Startpage {
    pub fn new() -> Self {
        Self
    }

    fn page_url(&self, query: &str, page: usize) -> String {
        let mut url = format!(
            "https://www.startpage.com/sp/search?query={}",
            urlencoding::encode(query)
        );
        if page > 0 {
            url.push_str(&format!("&page={}", page + 1));
        }
        url
    }

    fn parse_results(&self, html: &str) -> Result<Vec<SearchResult>> {
        let document = Html::parse_document(html);
        let result_selector = Selector::parse("div.w-gl__result")
            .map_err(|e| HarvestError::Parse(format!("bad selector: {:?}", e)))?;
        let title_selector = Selector::parse("a.w-gl__result-title")
            .map_err(|e| HarvestError::Parse(format!("bad selector: {:?}", e)))?;
        let snippet_selector = Selector::parse("p.w-gl__description")
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

impl Default for Startpage {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SearchBackend for Startpage {
    fn name(&self) -> &str {
        "startpage"
    }

    async fn search(
        &self,
        client: &FetchClient,
        query: &str,
        page: usize,
    ) -> Result<Vec<SearchResult>> {
        let url = self.page_url(query, page);
        debug!(query, page, "querying startpage");

        let html = client
            .fetch(&url)
            .await
            .ok_or_else(|| HarvestError::SourceUnavailable {
                provider: "startpage".to_string(),
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
        let engine = Startpage::new();
        let url = engine.page_url("rust", 0);
        assert_eq!(url, "https://www.startpage.com/sp/search?query=rust");
    }

    #[test]
    fn test_page_url_pages_are_one_based() {
        let engine = Startpage::new();
        let url = engine.page_url("rust", 1);
        assert!(url.ends_with("&page=2"));
    }

    #[test]
    fn test_parse_results_empty_html() {
        let engine = Startpage::new();
        let results = engine.parse_results("<html><body></body></html>").unwrap();
        assert!(results.is_empty());
    }

    #[test]
    fn test_parse_results_extracts_fields() {
        let engine = Startpage::new();
        let html = r#"
            <html><body>
                <div class="w-gl__result">
                    <a class="w-gl__result-title" href="https://example.com/a">Title A</a>
                    <p class="w-gl__description">Snippet A</p>
                </div>
                <div class="w-gl__result">
                    <span>no title anchor</span>
                </div>
            </body></html>
        "#;
        let results = engine.parse_results(html).unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].url, "https://example.com/a");
        assert_eq!(results[0].title, "Title A");
        assert_eq!(results[0].snippet, "Snippet A");
    }
}
