//! Search result snippets rewritten for an information need.

use super::{EnrichmentReport, ItemOutcome, load_content, prepare, run_batch};
use crate::classify::{Classifier, ClassifierKind, Document};
use crate::store::ContentStore;
use lessonlens_core::{Error, Label, SearchResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct EnhancedSnippet {
    pub url: String,
    pub title: String,
    pub description: String,
    /// Text the snippet was written from.
    pub content: String,
    pub enhanced_snippet: String,
}

pub struct SnippetEnhancer {
    store: Arc<ContentStore>,
    classifier: Arc<Classifier>,
    char_limit: usize,
    worker_count: usize,
}

fn snippet_text(label: Label) -> Option<String> {
    match label {
        Label::Single(text) => Some(text),
        Label::Multiple(parts) => Some(parts.join(". ")),
        Label::Unsure => None,
    }
}

impl SnippetEnhancer {
    pub fn new(store: Arc<ContentStore>, classifier: Arc<Classifier>, char_limit: usize, worker_count: usize) -> Self {
        Self { store, classifier, char_limit, worker_count }
    }

    /// Write a snippet for every result whose content addresses `facet`.
    ///
    /// Results the model is unsure about are skipped, failing ones excluded.
    pub async fn enhance(
        &self, results: Vec<SearchResult>, facet: &str,
    ) -> Result<EnrichmentReport<EnhancedSnippet>, Error> {
        if facet.trim().is_empty() {
            return Err(Error::InvalidInput("facet cannot be empty".into()));
        }
        let results = prepare(results)?;
        let char_limit = self.char_limit;
        let facet: Arc<str> = Arc::from(facet);

        let report = run_batch(results, self.worker_count, |result| {
            let store = self.store.clone();
            let classifier = self.classifier.clone();
            let facet = facet.clone();
            async move {
                let (content, used_page_text) = load_content(&store, &result, char_limit).await?;
                let document = Document { url: result.url.clone(), content };
                let label = classifier
                    .classify_one(ClassifierKind::Snippet, document.clone(), Some(&*facet))
                    .await?;

                let item = snippet_text(label).map(|enhanced_snippet| EnhancedSnippet {
                    url: result.url,
                    title: result.title,
                    description: result.description,
                    content: document.content,
                    enhanced_snippet,
                });
                Ok(ItemOutcome { item, used_page_text })
            }
        })
        .await;

        Ok(report)
    }
}
