//! Collection sessions: planning, bounded-concurrency execution, early
//! termination.

use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

use crate::config::HarvestConfig;
use crate::keywords::KeywordTaxonomy;
use crate::platforms::{registry, ContentSource};
use crate::proxy::ProxyPool;
use crate::record::{Normalizer, ScrapedRecord};
use crate::search::SearchAggregator;
use crate::sink::RecordSink;
use crate::Result;

/// Results requested from the aggregator per task.
const WANTED_PER_TASK: usize = 30;

/// One unit of work: a single query page against one platform.
#[derive(Clone)]
pub struct CollectTask {
    pub platform: Arc<dyn ContentSource>,
    pub query: String,
    pub term: String,
    pub page: usize,
}

/// Outcome of a collection run.
#[derive(Debug, Clone)]
pub struct Report {
    pub records_collected: usize,
    pub records_stored: usize,
    pub tasks_completed: usize,
    pub tasks_cancelled: usize,
    pub elapsed: Duration,
}

/// Runs a collection session: fan out query tasks under a concurrency
/// cap, consume completions as they land, stop early once the target is
/// reached.
///
/// Stopping early aborts the remaining in-flight tasks rather than
/// letting them run to completion unobserved.
pub struct Collector {
    aggregator: Arc<SearchAggregator>,
    platforms: Vec<Arc<dyn ContentSource>>,
    taxonomy: KeywordTaxonomy,
    pool: Option<Arc<ProxyPool>>,
    concurrency: usize,
    target_count: usize,
    pages_per_query: usize,
}

impl Collector {
    pub fn new(
        aggregator: Arc<SearchAggregator>,
        taxonomy: KeywordTaxonomy,
        config: &HarvestConfig,
    ) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            aggregator,
            platforms: registry(),
            taxonomy,
            pool: None,
            concurrency: config.concurrency,
            target_count: config.target_count,
            pages_per_query: 1,
        })
    }

    /// Replaces the platform set (tests, or a narrower run).
    pub fn with_platforms(mut self, platforms: Vec<Arc<dyn ContentSource>>) -> Self {
        self.platforms = platforms;
        self
    }

    /// Attaches the proxy pool so a stale working set is refreshed once,
    /// up front, before tasks are scheduled. `get()` on the pool never
    /// refreshes inline; this is the only place a session waits on one.
    pub fn with_proxy_pool(mut self, pool: Arc<ProxyPool>) -> Self {
        self.pool = Some(pool);
        self
    }

    /// Pages fetched per query. More pages, more candidate results.
    pub fn with_pages_per_query(mut self, pages: usize) -> Self {
        self.pages_per_query = pages.max(1);
        self
    }

    /// Expands platforms × taxonomy terms × query templates × pages into
    /// the task list for one session.
    pub fn plan(&self) -> Vec<CollectTask> {
        let mut tasks = Vec::new();
        for platform in &self.platforms {
            for term in self.taxonomy.all_keywords() {
                for query in platform.queries(term) {
                    for page in 0..self.pages_per_query {
                        tasks.push(CollectTask {
                            platform: Arc::clone(platform),
                            query: query.clone(),
                            term: term.to_string(),
                            page,
                        });
                    }
                }
            }
        }
        tasks
    }

    /// Runs the session and stores everything collected in `sink`.
    pub async fn run(&self, sink: &dyn RecordSink) -> Result<Report> {
        let started = Instant::now();

        if let Some(pool) = &self.pool {
            if pool.is_enabled() && pool.is_stale().await {
                pool.refresh().await;
            }
        }

        let plan = self.plan();
        info!(
            tasks = plan.len(),
            concurrency = self.concurrency,
            target = self.target_count,
            "starting collection session"
        );

        let semaphore = Arc::new(Semaphore::new(self.concurrency));
        let mut tasks: JoinSet<(String, Vec<ScrapedRecord>)> = JoinSet::new();

        for task in plan {
            let aggregator = Arc::clone(&self.aggregator);
            let semaphore = Arc::clone(&semaphore);
            tasks.spawn(async move {
                let _permit = match semaphore.acquire_owned().await {
                    Ok(permit) => permit,
                    Err(_) => return (task.term, Vec::new()),
                };

                let results = aggregator
                    .search(&task.query, task.page, WANTED_PER_TASK)
                    .await;
                let records: Vec<ScrapedRecord> = results
                    .iter()
                    .filter_map(|result| task.platform.classify(result))
                    .collect();
                debug!(
                    platform = task.platform.name(),
                    query = %task.query,
                    page = task.page,
                    records = records.len(),
                    "task finished"
                );
                (task.term, records)
            });
        }

        let mut normalizer = Normalizer::new(self.taxonomy.clone());
        let mut collected: Vec<ScrapedRecord> = Vec::new();
        let mut tasks_completed = 0;
        let mut tasks_cancelled = 0;
        let mut target_reached = false;

        // Consume in completion order. Once the target is hit, abort the
        // rest and drain; late completions are dropped so one batch at
        // most overshoots the target.
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((term, records)) => {
                    tasks_completed += 1;
                    if target_reached {
                        continue;
                    }
                    for record in records {
                        if let Some(normalized) = normalizer.normalize(record, &term) {
                            collected.push(normalized);
                        }
                    }
                    if collected.len() >= self.target_count {
                        info!(collected = collected.len(), "target reached, aborting rest");
                        target_reached = true;
                        tasks.abort_all();
                    }
                }
                Err(e) if e.is_cancelled() => {
                    tasks_cancelled += 1;
                }
                Err(e) => {
                    warn!(error = %e, "collection task panicked");
                }
            }
        }

        let records_stored = sink.save(&collected).await?;
        let report = Report {
            records_collected: collected.len(),
            records_stored,
            tasks_completed,
            tasks_cancelled,
            elapsed: started.elapsed(),
        };
        info!(
            collected = report.records_collected,
            stored = report.records_stored,
            cancelled = report.tasks_cancelled,
            elapsed_ms = report.elapsed.as_millis() as u64,
            "collection session finished"
        );
        Ok(report)
    }
}
