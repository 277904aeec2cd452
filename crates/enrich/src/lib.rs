//! Educational enrichment of search results.
//!
//! Pages are fetched and reduced to text by [`store::ContentStore`],
//! classified in batches by [`classify::Classifier`] and combined per
//! search result by the [`pipeline`] enrichers. [`service::EnrichmentService`]
//! wires them together over one cache database.

pub mod classify;
pub mod pipeline;
pub mod prompt;
pub mod service;
pub mod store;

#[cfg(test)]
mod testing;

pub use classify::{Classification, Classifier, ClassifierKind, Document, parse_json};
pub use pipeline::{
    BatchStats, EnhancedSnippet, EnrichedResult, EnrichmentReport, MetadataEnricher, ResultSummary, SnippetEnhancer,
    summarize,
};
pub use prompt::PromptCache;
pub use service::{EnrichmentService, PurgeTarget, ServiceStats};
pub use store::ContentStore;
