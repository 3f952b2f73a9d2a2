//! Static keyword taxonomy used to tag collected records.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::{HarvestError, Result};

/// Category → keyword list mapping, injected at construction and never
/// mutated by the collector.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KeywordTaxonomy {
    categories: BTreeMap<String, Vec<String>>,
}

impl KeywordTaxonomy {
    /// Builds a taxonomy from category → keywords pairs.
    ///
    /// Rejects an empty taxonomy: without any keywords every record would be
    /// tagged solely by its query context, which usually means the caller
    /// forgot to configure monitoring terms.
    pub fn new(categories: BTreeMap<String, Vec<String>>) -> Result<Self> {
        if categories.values().all(|kws| kws.is_empty()) {
            return Err(HarvestError::InvalidConfig(
                "keyword taxonomy must contain at least one keyword".to_string(),
            ));
        }
        Ok(Self { categories })
    }

    /// The monitoring taxonomy the collector ships with.
    pub fn default_monitoring() -> Self {
        let mut categories = BTreeMap::new();
        categories.insert(
            "people".to_string(),
            vec!["Marc Benioff".to_string(), "Bret Taylor".to_string()],
        );
        categories.insert(
            "products".to_string(),
            vec![
                "Agentforce".to_string(),
                "Sierra.AI".to_string(),
                "Sierra AI".to_string(),
            ],
        );
        categories.insert("companies".to_string(), vec!["Salesforce".to_string()]);
        categories.insert(
            "general".to_string(),
            vec![
                "AI".to_string(),
                "CRM agents".to_string(),
                "artificial intelligence".to_string(),
            ],
        );
        Self { categories }
    }

    /// Returns every taxonomy keyword found in `text` (case-insensitive
    /// substring match), without duplicates, in taxonomy order.
    pub fn matches(&self, text: &str) -> Vec<String> {
        let text_lower = text.to_lowercase();
        let mut found = Vec::new();
        for keywords in self.categories.values() {
            for keyword in keywords {
                if text_lower.contains(&keyword.to_lowercase())
                    && !found.contains(keyword)
                {
                    found.push(keyword.clone());
                }
            }
        }
        found
    }

    /// Returns the category a keyword belongs to, if any.
    pub fn category_of(&self, keyword: &str) -> Option<&str> {
        self.categories
            .iter()
            .find(|(_, kws)| kws.iter().any(|k| k == keyword))
            .map(|(cat, _)| cat.as_str())
    }

    /// All keywords across categories, in taxonomy order.
    pub fn all_keywords(&self) -> Vec<&str> {
        self.categories
            .values()
            .flat_map(|kws| kws.iter().map(String::as_str))
            .collect()
    }

    /// Number of keywords across all categories.
    pub fn len(&self) -> usize {
        self.categories.values().map(Vec::len).sum()
    }

    /// Whether the taxonomy holds no keywords.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
