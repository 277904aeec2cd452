//! Process-local hit/miss counters.
//!
//! Counters reset on restart and never influence cache behavior.

use super::connection::CacheDb;
use crate::Error;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};

/// Hit/miss counters for one cache layer.
#[derive(Debug, Default)]
pub struct CacheStats {
    hits: AtomicU64,
    misses: AtomicU64,
}

/// Point-in-time copy of a `CacheStats`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct StatsSnapshot {
    pub hits: u64,
    pub misses: u64,
    pub hit_ratio: f64,
}

impl CacheStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_hit(&self) {
        self.hits.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_miss(&self) {
        self.misses.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        let hits = self.hits.load(Ordering::Relaxed);
        let misses = self.misses.load(Ordering::Relaxed);
        let total = hits + misses;
        let hit_ratio = if total == 0 { 0.0 } else { hits as f64 / total as f64 };
        StatsSnapshot { hits, misses, hit_ratio }
    }
}

/// Number of rows per cache table.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct CacheCounts {
    pub pages: u64,
    pub texts: u64,
    pub results: u64,
    pub prompts: u64,
}

impl CacheDb {
    /// Count the entries of every cache table.
    pub async fn entry_counts(&self) -> Result<CacheCounts, Error> {
        self.conn
            .call(move |conn| -> Result<CacheCounts, Error> {
                let count = |table: &str| -> Result<u64, Error> {
                    let n: i64 = conn.query_row(&format!("SELECT COUNT(*) FROM {table}"), [], |row| row.get(0))?;
                    Ok(n as u64)
                };
                Ok(CacheCounts {
                    pages: count("page_content")?,
                    texts: count("page_text")?,
                    results: count("classification_results")?,
                    prompts: count("prompt_responses")?,
                })
            })
            .await
            .map_err(Error::from)
    }
}
