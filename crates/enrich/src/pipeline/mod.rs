//! Parallel enrichment of search results.
//!
//! Each search result is one unit of work on a bounded worker pool. A
//! failing item (fetch error, model error, panic) is logged with its URL
//! and left out of the report; it never cancels its siblings.

pub mod metadata;
pub mod snippets;
pub mod summary;

pub use metadata::{EnrichedResult, MetadataEnricher};
pub use snippets::{EnhancedSnippet, SnippetEnhancer};
pub use summary::{ResultSummary, summarize};

use crate::store::ContentStore;
use lessonlens_client::canonicalize;
use lessonlens_core::{Error, SearchResult, truncate_chars};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::future::Future;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

/// Counters for one pipeline run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct BatchStats {
    /// Distinct search results dispatched.
    pub total: u32,
    pub succeeded: u32,
    pub failed: u32,
    /// Items that finished without anything to report.
    pub skipped: u32,
    /// Items classified from page text.
    pub page_text_hits: u32,
    /// Items classified from title and description.
    pub fallbacks: u32,
}

impl BatchStats {
    /// Share of finished items that had page text, 0.0 for an empty run.
    pub fn hit_ratio(&self) -> f64 {
        let finished = self.page_text_hits + self.fallbacks;
        if finished == 0 { 0.0 } else { f64::from(self.page_text_hits) / f64::from(finished) }
    }
}

/// Items produced by a pipeline run, in completion order.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct EnrichmentReport<T> {
    pub items: Vec<T>,
    pub stats: BatchStats,
}

/// What one worker produced.
pub(crate) struct ItemOutcome<T> {
    pub item: Option<T>,
    pub used_page_text: bool,
}

/// Reject empty URLs and collapse results naming the same page, first wins.
///
/// URLs are compared in canonical form; one that cannot be canonicalized is
/// compared verbatim and fails later in its worker.
pub(crate) fn prepare(results: Vec<SearchResult>) -> Result<Vec<SearchResult>, Error> {
    if let Some(position) = results.iter().position(|r| r.url.trim().is_empty()) {
        return Err(Error::InvalidInput(format!("search result {position} has an empty url")));
    }

    let mut seen = HashSet::new();
    Ok(results
        .into_iter()
        .filter(|r| {
            let key = canonicalize(&r.url).map_or_else(|_| r.url.trim().to_string(), |url| url.to_string());
            seen.insert(key)
        })
        .collect())
}

/// Page text of a result truncated to `char_limit`, or its title and
/// description when the page has no text.
///
/// The flag tells whether page text was used.
pub(crate) async fn load_content(
    store: &ContentStore, result: &SearchResult, char_limit: usize,
) -> Result<(String, bool), Error> {
    match store.fetch_text(&result.url).await? {
        Some(text) => Ok((truncate_chars(&text, char_limit).to_string(), true)),
        None => Ok((result.fallback_content(), false)),
    }
}

/// Run `work` over `results` with at most `worker_count` items in flight.
pub(crate) async fn run_batch<T, F, Fut>(
    results: Vec<SearchResult>, worker_count: usize, work: F,
) -> EnrichmentReport<T>
where
    T: Send + 'static,
    F: Fn(SearchResult) -> Fut,
    Fut: Future<Output = Result<ItemOutcome<T>, Error>> + Send + 'static,
{
    let semaphore = Arc::new(Semaphore::new(worker_count.max(1)));
    let mut join_set = JoinSet::new();
    let mut urls = HashMap::new();
    let mut stats = BatchStats { total: results.len() as u32, ..BatchStats::default() };

    for result in results {
        let url = result.url.clone();
        let task = work(result);
        let semaphore = semaphore.clone();

        let handle = join_set.spawn(async move {
            let _permit = semaphore.acquire_owned().await;
            task.await
        });
        urls.insert(handle.id(), url);
    }

    let mut items = Vec::new();
    while let Some(joined) = join_set.join_next_with_id().await {
        match joined {
            Ok((id, Ok(outcome))) => {
                if outcome.used_page_text {
                    stats.page_text_hits += 1;
                } else {
                    stats.fallbacks += 1;
                }
                match outcome.item {
                    Some(item) => {
                        stats.succeeded += 1;
                        items.push(item);
                    }
                    None => {
                        stats.skipped += 1;
                        tracing::debug!(url = ?urls.get(&id), "nothing to report");
                    }
                }
            }
            Ok((id, Err(e))) => {
                stats.failed += 1;
                tracing::warn!(url = ?urls.get(&id), "enrichment failed: {e}");
            }
            Err(e) => {
                stats.failed += 1;
                tracing::warn!(url = ?urls.get(&e.id()), "enrichment worker panicked: {e}");
            }
        }
    }

    tracing::info!(
        total = stats.total,
        succeeded = stats.succeeded,
        failed = stats.failed,
        skipped = stats.skipped,
        hit_ratio = stats.hit_ratio(),
        "enrichment batch finished"
    );

    EnrichmentReport { items, stats }
}
