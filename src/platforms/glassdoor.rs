//! Glassdoor adapter.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::record::{extract_date, extract_job_title, extract_rating, ScrapedRecord};
use crate::result::SearchResult;

use super::ContentSource;

/// Company slug in review URLs: /Reviews/Acme-Corp-Reviews-E12345.htm
static COMPANY_FROM_URL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"/Reviews/(.+?)-Reviews-E\d+").unwrap());

/// Harvests Glassdoor reviews, interviews, and salary pages through
/// site-restricted search.
pub struct Glassdoor;

impl ContentSource for Glassdoor {
    fn name(&self) -> &str {
        "glassdoor"
    }

    fn queries(&self, term: &str) -> Vec<String> {
        vec![
            format!("site:glassdoor.com/Reviews \"{}\" review employee", term),
            format!("site:glassdoor.com \"{}\" \"pros and cons\"", term),
            format!("site:glassdoor.com/Interview \"{}\"", term),
        ]
    }

    fn classify(&self, result: &SearchResult) -> Option<ScrapedRecord> {
        if !result.url.contains("glassdoor.com") {
            return None;
        }

        let content_type = if result.url.contains("/Reviews/") {
            "review"
        } else if result.url.contains("/Interview/") {
            "interview"
        } else if result.url.contains("/Salary/") {
            "salary"
        } else {
            "post"
        };

        let mut record = ScrapedRecord::new(self.name(), content_type, result);
        record.company = extract_company_from_url(&result.url);
        record.rating = extract_rating(&result.snippet);
        record.published = extract_date(&result.snippet);
        record.author_title = extract_job_title(&result.snippet);

        if content_type == "review" {
            // Reviews are anonymous but employer-verified.
            record.author = Some("Anonymous Employee".to_string());
            record.verified = true;
        }

        Some(record)
    }
}

fn extract_company_from_url(url: &str) -> Option<String> {
    COMPANY_FROM_URL
        .captures(url)
        .map(|captures| captures[1].replace('-', " "))
}
