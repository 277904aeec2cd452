//! Batched get-or-fetch over classification results.
//!
//! A batch is split into cached results and misses. Misses are fetched with
//! one call and every returned result is persisted on its own, so a batch
//! interrupted half-way leaves the finished items cached.

use std::collections::{HashMap, HashSet};
use std::future::Future;

use super::connection::CacheDb;
use super::stats::{CacheStats, StatsSnapshot};
use crate::Error;
use crate::types::{BatchItem, ClassificationResult};

/// Persisted mapping from (url, content type, facet) to a classification result.
#[derive(Debug)]
pub struct KeyedResultCache {
    db: CacheDb,
    stats: CacheStats,
}

impl KeyedResultCache {
    pub fn new(db: CacheDb) -> Self {
        Self { db, stats: CacheStats::new() }
    }

    pub fn stats(&self) -> StatsSnapshot {
        self.stats.snapshot()
    }

    /// Return one result per distinct request, calling `fetch` once for the misses.
    ///
    /// Duplicate requests (same key) are collapsed, first wins. A read error
    /// on one key counts as a miss. Results from `fetch` are kept only if
    /// they answer a requested key and carry a non-empty response; nothing
    /// is stored for requests `fetch` left unanswered. An error from `fetch`
    /// is returned as is and nothing is written.
    ///
    /// The output lists cached results first, then fetched ones.
    pub async fn get_or_fetch_batch<F, Fut>(
        &self, items: Vec<BatchItem>, fetch: F,
    ) -> Result<Vec<ClassificationResult>, Error>
    where
        F: FnOnce(Vec<BatchItem>) -> Fut,
        Fut: Future<Output = Result<Vec<ClassificationResult>, Error>>,
    {
        let mut seen = HashSet::new();
        let mut cached = Vec::new();
        let mut to_fetch = Vec::new();

        for item in items {
            let key = item.cache_key();
            if !seen.insert(key.clone()) {
                continue;
            }

            match self.db.get_result(&key).await {
                Ok(Some(result)) => {
                    tracing::debug!(url = %item.url, content_type = %item.content_type, "classification cache hit");
                    self.stats.record_hit();
                    cached.push(result);
                }
                Ok(None) => {
                    self.stats.record_miss();
                    to_fetch.push(item);
                }
                Err(e) => {
                    tracing::warn!(url = %item.url, "classification cache read failed, refetching: {e}");
                    self.stats.record_miss();
                    to_fetch.push(item);
                }
            }
        }

        if to_fetch.is_empty() {
            return Ok(cached);
        }

        let requested: HashMap<String, BatchItem> =
            to_fetch.iter().map(|item| (item.cache_key(), item.clone())).collect();
        tracing::debug!(misses = to_fetch.len(), hits = cached.len(), "fetching classification batch");

        let fetched = fetch(to_fetch).await?;

        let mut stored = HashSet::new();
        let mut results = cached;
        for result in fetched {
            let key = result.cache_key();
            if !requested.contains_key(&key) {
                tracing::warn!(url = %result.url, "dropping classification for a key that was not requested");
                continue;
            }
            if !result.is_cacheable() {
                tracing::debug!(url = %result.url, "not caching empty classification");
                continue;
            }
            if !stored.insert(key) {
                continue;
            }

            self.db.put_result(&result).await?;
            results.push(result);
        }

        for (key, item) in &requested {
            if !stored.contains(key) {
                tracing::debug!(url = %item.url, content_type = %item.content_type, "no classification returned");
            }
        }

        Ok(results)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn item(url: &str) -> BatchItem {
        BatchItem::new(url, "subject", "Atoms and molecules", None, 5_000)
    }

    fn answer(item: &BatchItem) -> ClassificationResult {
        ClassificationResult {
            url: item.url.clone(),
            content_type: item.content_type.clone(),
            facet: item.facet.clone(),
            response: json!(["chemistry"]),
        }
    }

    fn urls(results: &[ClassificationResult]) -> Vec<String> {
        let mut urls: Vec<String> = results.iter().map(|r| r.url.clone()).collect();
        urls.sort();
        urls
    }

    #[tokio::test]
    async fn test_all_misses_fetched_once() {
        let cache = KeyedResultCache::new(CacheDb::open_in_memory().await.unwrap());
        let calls = AtomicUsize::new(0);
        let counter = &calls;
        let items = vec![item("https://a.example"), item("https://b.example")];

        let results = cache
            .get_or_fetch_batch(items, |misses| async move {
                counter.fetch_add(1, Ordering::SeqCst);
                assert_eq!(misses.len(), 2);
                Ok(misses.iter().map(answer).collect())
            })
            .await
            .unwrap();

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(urls(&results), vec!["https://a.example", "https://b.example"]);
        assert_eq!(cache.stats().misses, 2);
    }

    #[tokio::test]
    async fn test_cached_batch_skips_fetch() {
        let cache = KeyedResultCache::new(CacheDb::open_in_memory().await.unwrap());
        let items = vec![item("https://a.example"), item("https://b.example")];

        cache
            .get_or_fetch_batch(items.clone(), |misses| async move { Ok(misses.iter().map(answer).collect()) })
            .await
            .unwrap();

        let results = cache
            .get_or_fetch_batch(items, |_| async { Err(Error::InvalidInput("fetch ran for a cached batch".into())) })
            .await
            .unwrap();

        assert_eq!(urls(&results), vec!["https://a.example", "https://b.example"]);
        assert_eq!(cache.stats().hits, 2);
    }

    #[tokio::test]
    async fn test_only_misses_are_fetched() {
        let cache = KeyedResultCache::new(CacheDb::open_in_memory().await.unwrap());
        cache
            .get_or_fetch_batch(vec![item("https://a.example")], |misses| async move {
                Ok(misses.iter().map(answer).collect())
            })
            .await
            .unwrap();

        let results = cache
            .get_or_fetch_batch(vec![item("https://a.example"), item("https://b.example")], |misses| async move {
                assert_eq!(misses.len(), 1);
                assert_eq!(misses[0].url, "https://b.example");
                Ok(misses.iter().map(answer).collect())
            })
            .await
            .unwrap();

        assert_eq!(results.len(), 2);
        assert_eq!(results[0].url, "https://a.example");
    }

    #[tokio::test]
    async fn test_duplicate_requests_collapse() {
        let cache = KeyedResultCache::new(CacheDb::open_in_memory().await.unwrap());
        let items = vec![item("https://a.example"), item("https://a.example"), item("https://b.example")];

        let results = cache
            .get_or_fetch_batch(items, |misses| async move {
                assert_eq!(misses.len(), 2);
                Ok(misses.iter().map(answer).collect())
            })
            .await
            .unwrap();

        assert_eq!(urls(&results), vec!["https://a.example", "https://b.example"]);
    }

    #[tokio::test]
    async fn test_empty_answers_are_not_cached() {
        let db = CacheDb::open_in_memory().await.unwrap();
        let cache = KeyedResultCache::new(db.clone());
        let a = item("https://a.example");
        let b = item("https://b.example");

        let results = cache
            .get_or_fetch_batch(vec![a.clone(), b.clone()], |misses| async move {
                let mut out: Vec<ClassificationResult> = misses.iter().map(answer).collect();
                out[1].response = serde_json::Value::Null;
                Ok(out)
            })
            .await
            .unwrap();

        assert_eq!(urls(&results), vec!["https://a.example"]);
        assert!(db.get_result(&a.cache_key()).await.unwrap().is_some());
        assert!(db.get_result(&b.cache_key()).await.unwrap().is_none());

        let calls = AtomicUsize::new(0);
        let counter = &calls;
        cache
            .get_or_fetch_batch(vec![a, b], |misses| async move {
                counter.fetch_add(1, Ordering::SeqCst);
                assert_eq!(misses.len(), 1);
                Ok(misses.iter().map(answer).collect())
            })
            .await
            .unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_short_answer_does_not_fabricate_entries() {
        let db = CacheDb::open_in_memory().await.unwrap();
        let cache = KeyedResultCache::new(db.clone());
        let a = item("https://a.example");
        let b = item("https://b.example");

        let results = cache
            .get_or_fetch_batch(vec![a.clone(), b.clone()], |misses| async move { Ok(vec![answer(&misses[0])]) })
            .await
            .unwrap();

        assert_eq!(results.len(), 1);
        assert!(db.get_result(&b.cache_key()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_unrequested_answers_are_dropped() {
        let db = CacheDb::open_in_memory().await.unwrap();
        let cache = KeyedResultCache::new(db.clone());
        let stray = item("https://stray.example");

        let results = cache
            .get_or_fetch_batch(vec![item("https://a.example")], |misses| {
                let stray = stray.clone();
                async move { Ok(vec![answer(&misses[0]), answer(&stray)]) }
            })
            .await
            .unwrap();

        assert_eq!(urls(&results), vec!["https://a.example"]);
        assert!(db.get_result(&stray.cache_key()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_fetch_error_writes_nothing() {
        let db = CacheDb::open_in_memory().await.unwrap();
        let cache = KeyedResultCache::new(db.clone());
        let a = item("https://a.example");

        let result = cache
            .get_or_fetch_batch(vec![a.clone()], |_| async {
                Err(Error::ClassificationParse("model returned prose".into()))
            })
            .await;

        assert!(matches!(result, Err(Error::ClassificationParse(_))));
        assert!(db.get_result(&a.cache_key()).await.unwrap().is_none());
    }
}
