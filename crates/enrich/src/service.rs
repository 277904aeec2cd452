//! The enrichment service object.
//!
//! Built once at startup from explicit dependencies and shared behind an
//! `Arc` by every caller.

use crate::classify::{Classification, Classifier, ClassifierKind, Document};
use crate::pipeline::{
    EnhancedSnippet, EnrichedResult, EnrichmentReport, MetadataEnricher, ResultSummary, SnippetEnhancer,
};
use crate::prompt::PromptCache;
use crate::store::ContentStore;
use lessonlens_client::{CompletionClient, HttpFetcher};
use lessonlens_core::{AppConfig, CacheCounts, CacheDb, Error, SearchResult, StatsSnapshot};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Stored entries and hit/miss counters of every cache layer.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ServiceStats {
    pub entries: CacheCounts,
    pub content: StatsSnapshot,
    pub text: StatsSnapshot,
    pub results: StatsSnapshot,
    pub prompts: StatsSnapshot,
}

/// A set of cache entries to delete.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PurgeTarget {
    /// Pages and their text whose URL contains the pattern.
    Domain(String),
    /// Classification results of one kind.
    Results(ClassifierKind),
    /// Extracted text of every page; raw content stays.
    Text,
    /// Every stored model reply.
    Prompts,
}

pub struct EnrichmentService {
    db: CacheDb,
    store: Arc<ContentStore>,
    prompts: Arc<PromptCache>,
    classifier: Arc<Classifier>,
    metadata: MetadataEnricher,
    snippets: SnippetEnhancer,
}

impl EnrichmentService {
    pub fn new(
        db: CacheDb, fetcher: Arc<dyn HttpFetcher>, llm: Arc<dyn CompletionClient>, config: &AppConfig,
    ) -> Self {
        let store = Arc::new(ContentStore::new(db.clone(), fetcher));
        let prompts = Arc::new(PromptCache::new(db.clone(), llm, config.max_tokens));
        let classifier = Arc::new(Classifier::new(db.clone(), prompts.clone(), config.content_char_limit));
        let metadata =
            MetadataEnricher::new(store.clone(), classifier.clone(), config.content_char_limit, config.worker_count);
        let snippets =
            SnippetEnhancer::new(store.clone(), classifier.clone(), config.content_char_limit, config.worker_count);

        Self { db, store, prompts, classifier, metadata, snippets }
    }

    /// Extracted text of a page, `None` when the page has none.
    pub async fn fetch_text(&self, url: &str) -> Result<Option<String>, Error> {
        self.store.fetch_text(url).await
    }

    pub async fn classify(
        &self, kind: ClassifierKind, documents: &[Document], facet: Option<&str>,
    ) -> Result<Vec<Classification>, Error> {
        self.classifier.classify(kind, documents, facet).await
    }

    pub async fn enrich(&self, results: Vec<SearchResult>) -> Result<EnrichmentReport<EnrichedResult>, Error> {
        self.metadata.enrich(results).await
    }

    pub async fn enhance_snippets(
        &self, results: Vec<SearchResult>, facet: &str,
    ) -> Result<EnrichmentReport<EnhancedSnippet>, Error> {
        self.snippets.enhance(results, facet).await
    }

    /// Enrich `results` and summarize their labels.
    pub async fn summarize(&self, results: Vec<SearchResult>) -> Result<ResultSummary, Error> {
        let report = self.enrich(results).await?;
        Ok(crate::pipeline::summarize(&report.items))
    }

    pub async fn stats(&self) -> Result<ServiceStats, Error> {
        Ok(ServiceStats {
            entries: self.db.entry_counts().await?,
            content: self.store.content_stats(),
            text: self.store.text_stats(),
            results: self.classifier.result_stats(),
            prompts: self.prompts.stats(),
        })
    }

    /// Delete the entries named by `target`, returning how many went.
    pub async fn purge(&self, target: PurgeTarget) -> Result<u64, Error> {
        let deleted = match &target {
            PurgeTarget::Domain(pattern) => {
                if pattern.trim().is_empty() {
                    return Err(Error::InvalidInput("domain pattern cannot be empty".into()));
                }
                self.db.purge_content_by_domain(pattern).await?
            }
            PurgeTarget::Results(kind) => self.db.purge_results(kind.tag()).await?,
            PurgeTarget::Text => self.db.purge_all_text().await?,
            PurgeTarget::Prompts => self.db.purge_prompt_responses().await?,
        };

        tracing::info!(?target, deleted, "purged cache entries");
        Ok(deleted)
    }
}
