//! Record persistence.

use std::collections::HashSet;
use std::sync::Mutex;

use async_trait::async_trait;
use tracing::debug;

use crate::record::ScrapedRecord;
use crate::Result;

/// Destination for collected records.
///
/// `save` must be idempotent on URL: feeding the same batch twice stores
/// each record once.
#[async_trait]
pub trait RecordSink: Send + Sync {
    /// Stores a batch, returning how many records were newly stored.
    async fn save(&self, records: &[ScrapedRecord]) -> Result<usize>;
}

/// In-memory sink.
#[derive(Default)]
pub struct MemorySink {
    records: Mutex<Vec<ScrapedRecord>>,
    urls: Mutex<HashSet<String>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Everything stored so far.
    pub fn records(&self) -> Vec<ScrapedRecord> {
        self.records.lock().unwrap().clone()
    }

    pub fn len(&self) -> usize {
        self.records.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.lock().unwrap().is_empty()
    }
}

#[async_trait]
impl RecordSink for MemorySink {
    async fn save(&self, records: &[ScrapedRecord]) -> Result<usize> {
        let mut urls = self.urls.lock().unwrap();
        let mut stored = self.records.lock().unwrap();

        let mut added = 0;
        for record in records {
            if urls.insert(record.url.clone()) {
                stored.push(record.clone());
                added += 1;
            }
        }

        debug!(batch = records.len(), added, "saved batch");
        Ok(added)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::result::SearchResult;

    fn record(url: &str) -> ScrapedRecord {
        ScrapedRecord::new("linkedin", "post", &SearchResult::new(url, "t", "s"))
    }

    #[tokio::test]
    async fn test_memory_sink_stores_batch() {
        let sink = MemorySink::new();
        let added = sink
            .save(&[record("https://a.example/1"), record("https://a.example/2")])
            .await
            .unwrap();
        assert_eq!(added, 2);
        assert_eq!(sink.len(), 2);
    }

    #[tokio::test]
    async fn test_memory_sink_save_is_idempotent_on_url() {
        let sink = MemorySink::new();
        let batch = vec![record("https://a.example/1")];
        assert_eq!(sink.save(&batch).await.unwrap(), 1);
        assert_eq!(sink.save(&batch).await.unwrap(), 0);
        assert_eq!(sink.len(), 1);
    }
}
