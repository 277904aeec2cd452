//! Fetched page content and extracted text, persisted per canonical URL.
//!
//! Raw bytes and extracted text are separate artifacts: text is derived
//! from the stored bytes on first request and stored on its own, so a
//! second request for either touches neither the network nor the extractor.

use lessonlens_client::fetch::{HttpFetcher, canonicalize};
use lessonlens_client::{ContentKind, Extraction, extract_text};
use lessonlens_core::cache::hash::url_key;
use lessonlens_core::{CacheDb, CacheStats, ContentRecord, Error, StatsSnapshot};
use std::sync::Arc;

/// Extractor name stored when extraction failed.
const FAILED_EXTRACTOR: &str = "failed";

pub struct ContentStore {
    db: CacheDb,
    fetcher: Arc<dyn HttpFetcher>,
    content_stats: CacheStats,
    text_stats: CacheStats,
}

impl ContentStore {
    pub fn new(db: CacheDb, fetcher: Arc<dyn HttpFetcher>) -> Self {
        Self { db, fetcher, content_stats: CacheStats::new(), text_stats: CacheStats::new() }
    }

    pub fn content_stats(&self) -> StatsSnapshot {
        self.content_stats.snapshot()
    }

    pub fn text_stats(&self) -> StatsSnapshot {
        self.text_stats.snapshot()
    }

    /// Raw content of `url`, from the store or the network.
    ///
    /// Fetch failures are returned as errors and leave nothing behind.
    pub async fn fetch_content(&self, url: &str) -> Result<ContentRecord, Error> {
        let canonical = canonicalize(url)?;
        let url_hash = url_key(canonical.as_str());

        match self.db.get_content(&url_hash).await {
            Ok(Some(record)) if record.raw_content.is_some() => {
                tracing::debug!(url = %canonical, "content cache hit");
                self.content_stats.record_hit();
                return Ok(record);
            }
            Ok(_) => {}
            Err(e) => tracing::warn!(url = %canonical, "content cache read failed, refetching: {e}"),
        }
        self.content_stats.record_miss();

        let head_type = self.fetcher.head(&canonical).await?;
        let response = self.fetcher.get(&canonical).await?;

        let record = ContentRecord {
            url_hash,
            url: canonical.to_string(),
            content_type: head_type.or(response.content_type),
            raw_content: Some(response.bytes.to_vec()),
            extracted_text: None,
            status_code: Some(i32::from(response.status.as_u16())),
            fetched_at: chrono::Utc::now().to_rfc3339(),
            fetch_ms: Some(response.fetch_ms as i64),
        };

        if let Err(e) = self.db.put_content(&record).await {
            tracing::warn!(url = %canonical, "failed to store content: {e}");
        }

        tracing::debug!(url = %canonical, bytes = response.bytes.len(), fetch_ms = response.fetch_ms, "content fetched");
        Ok(record)
    }

    /// Extracted text of `url`; None when the document yields no text.
    ///
    /// Extraction failures count as "no text" and are stored as such. Fetch
    /// failures are returned as errors.
    pub async fn fetch_text(&self, url: &str) -> Result<Option<String>, Error> {
        let canonical = canonicalize(url)?;
        let url_hash = url_key(canonical.as_str());

        match self.db.get_text(&url_hash).await {
            Ok(Some(text)) => {
                tracing::debug!(url = %canonical, "text cache hit");
                self.text_stats.record_hit();
                return Ok(non_empty(text));
            }
            Ok(None) => {}
            Err(e) => tracing::warn!(url = %canonical, "text cache read failed, re-extracting: {e}"),
        }
        self.text_stats.record_miss();

        let record = self.fetch_content(url).await?;
        let kind = ContentKind::detect(record.content_type.as_deref(), &canonical);
        let bytes = record.raw_content.unwrap_or_default();

        let extraction = match tokio::task::spawn_blocking(move || extract_text(kind, &bytes)).await {
            Ok(Ok(extraction)) => extraction,
            Ok(Err(e)) => {
                tracing::warn!(url = %canonical, ?kind, "extraction failed, storing empty text: {e}");
                Extraction { text: String::new(), extractor: FAILED_EXTRACTOR }
            }
            Err(e) => {
                tracing::warn!(url = %canonical, ?kind, "extractor panicked, storing empty text: {e}");
                Extraction { text: String::new(), extractor: FAILED_EXTRACTOR }
            }
        };

        if let Err(e) = self.db.put_text(&record.url_hash, &record.url, &extraction.text, extraction.extractor).await {
            tracing::warn!(url = %canonical, "failed to store text: {e}");
        }

        Ok(non_empty(extraction.text))
    }
}

fn non_empty(text: String) -> Option<String> {
    if text.trim().is_empty() { None } else { Some(text) }
}
