//! Scraped content records and normalization.

use std::collections::HashSet;

use chrono::{DateTime, Duration as ChronoDuration, NaiveDate, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::keywords::KeywordTaxonomy;
use crate::result::{normalize_url, SearchResult};

/// A single piece of collected content, normalized across platforms.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScrapedRecord {
    pub platform: String,
    pub content_type: String,
    pub url: String,
    pub title: String,
    pub content: String,
    pub author: Option<String>,
    pub author_title: Option<String>,
    pub company: Option<String>,
    pub rating: Option<f32>,
    /// Engagement counters, available only when the source exposes them.
    pub likes: Option<u32>,
    pub comments: Option<u32>,
    pub shares: Option<u32>,
    pub published: Option<DateTime<Utc>>,
    /// Taxonomy keywords matched in the content, or the search term that
    /// surfaced it when nothing matched.
    pub keywords: Vec<String>,
    pub verified: bool,
    pub collected_at: DateTime<Utc>,
}

impl ScrapedRecord {
    pub fn new(
        platform: impl Into<String>,
        content_type: impl Into<String>,
        result: &SearchResult,
    ) -> Self {
        Self {
            platform: platform.into(),
            content_type: content_type.into(),
            url: result.url.clone(),
            title: result.title.clone(),
            content: result.snippet.clone(),
            author: None,
            author_title: None,
            company: None,
            rating: None,
            likes: None,
            comments: None,
            shares: None,
            published: None,
            keywords: Vec::new(),
            verified: false,
            collected_at: Utc::now(),
        }
    }
}

static RATING_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    vec![
        Regex::new(r"(?i)(\d+\.?\d*)\s*stars?").unwrap(),
        Regex::new(r"(?i)rating:\s*(\d+\.?\d*)").unwrap(),
        Regex::new(r"(\d+\.?\d*)/5").unwrap(),
    ]
});

static JOB_TITLE_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    vec![
        Regex::new(r"(?i)(?:current|former)\s+employee\s*-\s*([^,\n]+)").unwrap(),
        Regex::new(r"(?i)(?:i work|worked)\s+as\s+(?:a|an)\s+([^,\n]+)").unwrap(),
        Regex::new(r"(?i)position:\s*([^,\n]+)").unwrap(),
    ]
});

static AUTHOR_TITLE_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    vec![
        Regex::new(r"^(.+?) on LinkedIn:").unwrap(),
        Regex::new(r"^(.+?) posted on LinkedIn").unwrap(),
        Regex::new(r"^(.+?) shared").unwrap(),
        Regex::new(r"^Post by (.+?)$").unwrap(),
    ]
});

static ABSOLUTE_DATE: Lazy<Vec<(Regex, &'static str)>> = Lazy::new(|| {
    vec![
        (Regex::new(r"([A-Z][a-z]+\s+\d{1,2},\s+\d{4})").unwrap(), "%b %d, %Y"),
        (Regex::new(r"(\d{1,2}/\d{1,2}/\d{4})").unwrap(), "%m/%d/%Y"),
        (Regex::new(r"(\d{4}-\d{2}-\d{2})").unwrap(), "%Y-%m-%d"),
    ]
});

static RELATIVE_DATE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)(\d+)\s+(hour|day|week|month)s?\s+ago").unwrap());

/// Pulls a star rating out of review text. Values outside 0..=5 are noise
/// from unrelated numbers and are rejected.
pub fn extract_rating(text: &str) -> Option<f32> {
    for pattern in RATING_PATTERNS.iter() {
        if let Some(captures) = pattern.captures(text) {
            if let Ok(rating) = captures[1].parse::<f32>() {
                if (0.0..=5.0).contains(&rating) {
                    return Some(rating);
                }
            }
        }
    }
    None
}

/// Pulls a job title out of review text ("Current Employee - Engineer").
pub fn extract_job_title(text: &str) -> Option<String> {
    for pattern in JOB_TITLE_PATTERNS.iter() {
        if let Some(captures) = pattern.captures(text) {
            return Some(captures[1].trim().to_string());
        }
    }
    None
}

/// Pulls an author name out of a post title ("Jane Doe on LinkedIn: ...").
pub fn extract_author_from_title(title: &str) -> Option<String> {
    for pattern in AUTHOR_TITLE_PATTERNS.iter() {
        if let Some(captures) = pattern.captures(title) {
            return Some(captures[1].trim().to_string());
        }
    }
    None
}

/// Pulls a publication date out of snippet text. Handles absolute forms
/// ("Jan 3, 2024", "01/03/2024", "2024-01-03") and relative forms
/// ("2 weeks ago") against the current clock.
pub fn extract_date(text: &str) -> Option<DateTime<Utc>> {
    for (pattern, format) in ABSOLUTE_DATE.iter() {
        if let Some(captures) = pattern.captures(text) {
            let raw = &captures[1];
            if let Ok(date) = NaiveDate::parse_from_str(raw, format)
                .or_else(|_| NaiveDate::parse_from_str(raw, "%B %d, %Y"))
            {
                return date.and_hms_opt(0, 0, 0).map(|dt| dt.and_utc());
            }
        }
    }

    if let Some(captures) = RELATIVE_DATE.captures(text) {
        let amount: i64 = captures[1].parse().ok()?;
        let delta = match captures[2].to_lowercase().as_str() {
            "hour" => ChronoDuration::hours(amount),
            "day" => ChronoDuration::days(amount),
            "week" => ChronoDuration::weeks(amount),
            "month" => ChronoDuration::days(amount * 30),
            _ => return None,
        };
        return Some(Utc::now() - delta);
    }

    None
}

/// Deduplicates records by URL and tags them with taxonomy keywords.
///
/// One normalizer is scoped to one collection run; its seen-set is the
/// run's uniqueness guarantee. First occurrence of a URL wins regardless
/// of which platform or search term surfaced it.
pub struct Normalizer {
    taxonomy: KeywordTaxonomy,
    seen: HashSet<String>,
}

impl Normalizer {
    pub fn new(taxonomy: KeywordTaxonomy) -> Self {
        Self {
            taxonomy,
            seen: HashSet::new(),
        }
    }

    /// Admits `record` if its URL is new, tagging it with every taxonomy
    /// keyword found in title + content. A record matching no keyword is
    /// still kept and falls back to the search term that found it.
    pub fn normalize(&mut self, mut record: ScrapedRecord, context: &str) -> Option<ScrapedRecord> {
        if !self.seen.insert(normalize_url(&record.url)) {
            return None;
        }

        let haystack = format!("{} {}", record.title, record.content);
        let mut keywords = self.taxonomy.matches(&haystack);
        if keywords.is_empty() {
            keywords.push(context.to_string());
        }
        record.keywords = keywords;

        Some(record)
    }

    /// URLs admitted so far.
    pub fn seen_count(&self) -> usize {
        self.seen.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    fn taxonomy() -> KeywordTaxonomy {
        let mut categories = BTreeMap::new();
        categories.insert(
            "people".to_string(),
            vec!["Marc Benioff".to_string()],
        );
        categories.insert(
            "products".to_string(),
            vec!["Agentforce".to_string()],
        );
        KeywordTaxonomy::new(categories).unwrap()
    }

    fn record(url: &str, title: &str, content: &str) -> ScrapedRecord {
        ScrapedRecord::new(
            "linkedin",
            "post",
            &SearchResult::new(url, title, content),
        )
    }

    #[test]
    fn test_extract_rating_stars() {
        assert_eq!(extract_rating("Great place, 4.5 stars overall"), Some(4.5));
        assert_eq!(extract_rating("1 star experience"), Some(1.0));
    }

    #[test]
    fn test_extract_rating_prefix_and_fraction() {
        assert_eq!(extract_rating("Rating: 3.8 from employees"), Some(3.8));
        assert_eq!(extract_rating("scored 4/5 by reviewers"), Some(4.0));
    }

    #[test]
    fn test_extract_rating_out_of_range_rejected() {
        assert_eq!(extract_rating("earned 12 stars on the chart"), None);
        assert_eq!(extract_rating("no numbers here"), None);
    }

    #[test]
    fn test_extract_job_title() {
        assert_eq!(
            extract_job_title("Current Employee - Software Engineer, 3 years"),
            Some("Software Engineer".to_string())
        );
        assert_eq!(
            extract_job_title("I worked as a Sales Rep for two years"),
            Some("Sales Rep for two years".to_string())
        );
        assert_eq!(extract_job_title("nothing relevant"), None);
    }

    #[test]
    fn test_extract_author_from_title() {
        assert_eq!(
            extract_author_from_title("Jane Doe on LinkedIn: thoughts on CRM"),
            Some("Jane Doe".to_string())
        );
        assert_eq!(
            extract_author_from_title("Post by John Smith"),
            Some("John Smith".to_string())
        );
        assert_eq!(extract_author_from_title("Generic headline"), None);
    }

    #[test]
    fn test_extract_date_absolute() {
        let date = extract_date("Reviewed on Jan 3, 2024 by an employee").unwrap();
        assert_eq!(date.date_naive(), NaiveDate::from_ymd_opt(2024, 1, 3).unwrap());

        let date = extract_date("posted 2024-06-15").unwrap();
        assert_eq!(date.date_naive(), NaiveDate::from_ymd_opt(2024, 6, 15).unwrap());

        let date = extract_date("seen 03/07/2024").unwrap();
        assert_eq!(date.date_naive(), NaiveDate::from_ymd_opt(2024, 3, 7).unwrap());
    }

    #[test]
    fn test_extract_date_relative() {
        let date = extract_date("posted 2 weeks ago").unwrap();
        let delta = Utc::now() - date;
        assert!(delta.num_days() >= 13 && delta.num_days() <= 15);
    }

    #[test]
    fn test_extract_date_none() {
        assert_eq!(extract_date("no dates in sight"), None);
    }

    #[test]
    fn test_normalizer_tags_taxonomy_matches() {
        let mut normalizer = Normalizer::new(taxonomy());
        let record = record(
            "https://example.com/1",
            "Marc Benioff announces Agentforce",
            "keynote recap",
        );
        let normalized = normalizer.normalize(record, "salesforce").unwrap();
        assert_eq!(
            normalized.keywords,
            vec!["Marc Benioff".to_string(), "Agentforce".to_string()]
        );
    }

    #[test]
    fn test_normalizer_falls_back_to_context_term() {
        let mut normalizer = Normalizer::new(taxonomy());
        let record = record("https://example.com/2", "Quarterly roundup", "nothing on topic");
        let normalized = normalizer.normalize(record, "Acme Corp").unwrap();
        assert_eq!(normalized.keywords, vec!["Acme Corp".to_string()]);
    }

    #[test]
    fn test_normalizer_dedups_first_wins() {
        let mut normalizer = Normalizer::new(taxonomy());
        let first = record("https://example.com/post/", "First", "Agentforce");
        let second = record("http://EXAMPLE.com/post", "Second", "Agentforce");

        assert!(normalizer.normalize(first, "kw").is_some());
        assert!(normalizer.normalize(second, "kw").is_none());
        assert_eq!(normalizer.seen_count(), 1);
    }

    #[test]
    fn test_record_serializes() {
        let record = record("https://example.com/1", "Title", "content");
        let json = serde_json::to_string(&record).unwrap();
        assert!(json.contains("\"platform\":\"linkedin\""));
        assert!(json.contains("\"content_type\":\"post\""));
    }
}
