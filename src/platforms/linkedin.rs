//! LinkedIn adapter.

use crate::record::{extract_author_from_title, extract_date, ScrapedRecord};
use crate::result::SearchResult;

use super::ContentSource;

/// Harvests public LinkedIn posts, articles, and profile mentions through
/// site-restricted search.
pub struct LinkedIn;

impl ContentSource for LinkedIn {
    fn name(&self) -> &str {
        "linkedin"
    }

    fn queries(&self, term: &str) -> Vec<String> {
        vec![
            format!("site:linkedin.com/posts \"{}\"", term),
            format!("site:linkedin.com/pulse \"{}\"", term),
            format!("site:linkedin.com/in \"{}\" \"about\"", term),
        ]
    }

    fn classify(&self, result: &SearchResult) -> Option<ScrapedRecord> {
        if !result.url.contains("linkedin.com") {
            return None;
        }

        let content_type = if result.url.contains("/pulse/") {
            "article"
        } else if result.url.contains("/in/") {
            "profile"
        } else {
            "post"
        };

        let mut record = ScrapedRecord::new(self.name(), content_type, result);
        record.author = extract_author_from_title(&result.title);
        record.published = extract_date(&result.snippet);
        Some(record)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result(url: &str, title: &str, snippet: &str) -> SearchResult {
        SearchResult::new(url, title, snippet)
    }

    #[test]
    fn test_queries_are_site_restricted() {
        let queries = LinkedIn.queries("Agentforce");
        assert_eq!(queries.len(), 3);
        assert!(queries.iter().all(|q| q.contains("site:linkedin.com")));
        assert!(queries.iter().all(|q| q.contains("\"Agentforce\"")));
    }

    #[test]
    fn test_classify_rejects_off_platform() {
        let r = result("https://twitter.com/x/status/1", "title", "snippet");
        assert!(LinkedIn.classify(&r).is_none());
    }

    #[test]
    fn test_classify_post() {
        let r = result(
            "https://www.linkedin.com/posts/jane-doe_crm-activity-123",
            "Jane Doe on LinkedIn: the future of CRM",
            "posted 3 days ago about CRM platforms",
        );
        let record = LinkedIn.classify(&r).unwrap();
        assert_eq!(record.platform, "linkedin");
        assert_eq!(record.content_type, "post");
        assert_eq!(record.author, Some("Jane Doe".to_string()));
        assert!(record.published.is_some());
        assert!(!record.verified);
    }

    #[test]
    fn test_classify_article() {
        let r = result(
            "https://www.linkedin.com/pulse/agent-economy-john-smith",
            "The Agent Economy",
            "long-form analysis",
        );
        let record = LinkedIn.classify(&r).unwrap();
        assert_eq!(record.content_type, "article");
        assert_eq!(record.author, None);
    }

    #[test]
    fn test_classify_profile() {
        let r = result(
            "https://www.linkedin.com/in/jane-doe",
            "Jane Doe - VP Engineering",
            "about section mentions AI",
        );
        let record = LinkedIn.classify(&r).unwrap();
        assert_eq!(record.content_type, "profile");
    }
}
