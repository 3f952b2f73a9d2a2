//! DuckDuckGo HTML endpoint backend.

use async_trait::async_trait;
use scraper::{Html, Selector};
use tracing::debug;

use crate::error::HarvestError;
use crate::fetch::FetchClient;
use crate::result::SearchResult;
use crate::Result;

use super::SearchBackend;

/// Results per page on the HTML endpoint.
const PAGE_SIZE: usize = 30;

/// DuckDuckGo backend. Queries the no-javascript HTML endpoint, which
/// paginates with an `s` offset parameter.
pub struct DuckDuckGo;

impl DuckDuckGo {
    pub fn new() -> Self {
        Self
    }

    fn page_url(&self, query: &str, page: usize) -> String {
        let mut url = format!(
            "https://html.duckduckgo.com/html/?q={}",
            urlencoding::encode(query)
        );
        if page > 0 {
            url.push_str(&format!("&s={}", page * PAGE_SIZE));
        }
        url
    }

    fn parse_results(&self, html: &str) -> Result<Vec<SearchResult>> {
        let document = Html::parse_document(html);
        let result_selector = Selector::parse(".result")
            .map_err(|e| HarvestError::Parse(format!("bad selector: {:?}", e)))?;
        let title_selector = Selector::parse(".result__title a")
            .map_err(|e| HarvestError::Parse(format!("bad selector: {:?}", e)))?;
        let snippet_selector = Selector::parse(".result__snippet")
            .map_err(|e| HarvestError::Parse(format!("bad selector: {:?}", e)))?;

        let mut results = Vec::new();

        for element in document.select(&result_selector) {
            let Some(title_elem) = element.select(&title_selector).next() else {
                continue;
            };

            let title = title_elem.text().collect::<String>().trim().to_string();
            let href = title_elem.value().attr("href").unwrap_or_default();

            let url = if href.contains("duckduckgo.com/l/") {
                extract_redirect_url(href).unwrap_or_else(|| href.to_string())
            } else {
                href.to_string()
            };

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

impl Default for DuckDuckGo {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SearchBackend for DuckDuckGo {
    fn name(&self) -> &str {
        "duckduckgo"
    }

    async fn search(
        &self,
        client: &FetchClient,
        query: &str,
        page: usize,
    ) -> Result<Vec<SearchResult>> {
        let url = self.page_url(query, page);
        debug!(query, page, "querying duckduckgo");

        let html = client
            .fetch(&url)
            .await
            .ok_or_else(|| HarvestError::SourceUnavailable {
                provider: "duckduckgo".to_string(),
                reason: "fetch exhausted retries".to_string(),
            })?;

        self.parse_results(&html)
    }
}

/// DuckDuckGo wraps destinations in a `/l/?uddg=` redirect.
fn extract_redirect_url(href: &str) -> Option<String> {
    let (_, rest) = href.split_once("uddg=")?;
    let decoded = urlencoding::decode(rest).ok()?;
    let end = decoded.find('&').unwrap_or(decoded.len());
    Some(decoded[..end].to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_url_first_page() {
        let engine = DuckDuckGo::new();
        let url = engine.page_url("rust async", 0);
        assert_eq!(url, "https://html.duckduckgo.com/html/?q=rust%20async");
    }

    #[test]
    fn test_page_url_offsets_by_thirty() {
        let engine = DuckDuckGo::new();
        let url = engine.page_url("rust", 2);
        assert!(url.ends_with("&s=60"));
    }

    #[test]
    fn test_extract_redirect_url() {
        let href = "//duckduckgo.com/l/?uddg=https%3A%2F%2Fexample.com%2Fpage&rut=abc";
        assert_eq!(
            extract_redirect_url(href),
            Some("https://example.com/page".to_string())
        );
    }

    #[test]
    fn test_extract_redirect_url_no_trailing_params() {
        let href = "//duckduckgo.com/l/?uddg=https%3A%2F%2Fexample.com";
        assert_eq!(
            extract_redirect_url(href),
            Some("https://example.com".to_string())
        );
    }

    #[test]
    fn test_parse_results_empty_html() {
        let engine = DuckDuckGo::new();
        let results = engine.parse_results("<html><body></body></html>").unwrap();
        assert!(results.is_empty());
    }

    #[test]
    fn test_parse_results_extracts_fields() {
        let engine = DuckDuckGo::new();
        let html = r#"
            <html><body>
                <div class="result">
                    <h2 class="result__title">
                        <a href="https://example.com/post">Example Title</a>
                    </h2>
                    <a class="result__snippet">Example snippet text</a>
                </div>
                <div class="result">
                    <h2 class="result__title">
                        <a href="">No URL</a>
                    </h2>
                </div>
            </body></html>
        "#;
        let results = engine.parse_results(html).unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].url, "https://example.com/post");
        assert_eq!(results[0].title, "Example Title");
        assert_eq!(results[0].snippet, "Example snippet text");
    }

    #[test]
    fn test_parse_results_unwraps_redirects() {
        let engine = DuckDuckGo::new();
        let html = r#"
            <div class="result">
                <h2 class="result__title">
                    <a href="//duckduckgo.com/l/?uddg=https%3A%2F%2Freal.example%2Fa&rut=x">Wrapped</a>
                </h2>
            </div>
        "#;
        let results = engine.parse_results(html).unwrap();
        assert_eq!(results[0].url, "https://real.example/a");
    }
}
