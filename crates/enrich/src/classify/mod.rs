//! Batched document classification through the prompt and result caches.
//!
//! A call partitions its documents into cached answers and misses. All
//! misses go to the model in one aggregate prompt; the reply must be a JSON
//! object keyed by exactly the requested URLs.

pub mod kinds;
pub mod parse;

pub use kinds::ClassifierKind;
pub use parse::parse_json;

use crate::prompt::PromptCache;
use lessonlens_core::{BatchItem, CacheDb, ClassificationResult, Error, KeyedResultCache, Label, StatsSnapshot};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

/// A document to classify.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct Document {
    pub url: String,
    pub content: String,
}

/// Normalized answer for one document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct Classification {
    pub url: String,
    pub label: Label,
}

pub struct Classifier {
    results: KeyedResultCache,
    prompts: Arc<PromptCache>,
    char_limit: usize,
}

impl Classifier {
    pub fn new(db: CacheDb, prompts: Arc<PromptCache>, char_limit: usize) -> Self {
        Self { results: KeyedResultCache::new(db), prompts, char_limit }
    }

    pub fn result_stats(&self) -> StatsSnapshot {
        self.results.stats()
    }

    /// Classify `documents`, one answer per distinct URL in input order.
    ///
    /// URLs whose answer could not be stored (an empty response) come back
    /// as `Unsure` and are asked again next time. A reply that cannot be
    /// parsed, or that does not cover exactly the requested URLs, fails the
    /// whole call.
    pub async fn classify(
        &self, kind: ClassifierKind, documents: &[Document], facet: Option<&str>,
    ) -> Result<Vec<Classification>, Error> {
        let facet = match facet {
            Some(f) if f.trim().is_empty() => return Err(Error::InvalidInput("facet cannot be empty".into())),
            None if kind.requires_facet() => {
                return Err(Error::InvalidInput(format!("{kind} classification requires a facet")));
            }
            facet => facet,
        };

        if documents.iter().any(|d| d.url.trim().is_empty()) {
            return Err(Error::InvalidInput("document url cannot be empty".into()));
        }
        if documents.is_empty() {
            return Ok(Vec::new());
        }

        let items: Vec<BatchItem> = documents
            .iter()
            .map(|d| BatchItem::new(&d.url, kind.tag(), &d.content, facet, self.char_limit))
            .collect();

        let results = self
            .results
            .get_or_fetch_batch(items, |misses| self.ask_model(kind, facet, misses))
            .await?;

        let answers: HashMap<&str, &Value> = results.iter().map(|r| (r.url.as_str(), &r.response)).collect();
        let mut seen = HashSet::new();
        let classifications: Vec<Classification> = documents
            .iter()
            .filter(|d| seen.insert(d.url.as_str()))
            .map(|d| Classification {
                url: d.url.clone(),
                label: answers.get(d.url.as_str()).map_or(Label::Unsure, |value| kind.normalize(value)),
            })
            .collect();

        tracing::debug!(kind = kind.tag(), documents = classifications.len(), "classified batch");
        Ok(classifications)
    }

    /// Classify a single document.
    pub async fn classify_one(
        &self, kind: ClassifierKind, document: Document, facet: Option<&str>,
    ) -> Result<Label, Error> {
        let mut classifications = self.classify(kind, std::slice::from_ref(&document), facet).await?;
        Ok(classifications.pop().map_or(Label::Unsure, |c| c.label))
    }

    async fn ask_model(
        &self, kind: ClassifierKind, facet: Option<&str>, misses: Vec<BatchItem>,
    ) -> Result<Vec<ClassificationResult>, Error> {
        let prompt = kind.build_prompt(&misses, facet);
        let reply = self
            .prompts
            .ask(&prompt)
            .await
            .ok_or_else(|| Error::ClassificationParse(format!("no {kind} reply from the model")))?;

        let mut answers = match parse_json(&reply) {
            Value::Object(map) if !map.is_empty() => map,
            _ => {
                self.prompts.forget(&prompt).await;
                return Err(Error::ClassificationParse(format!("{kind} reply holds no JSON object")));
            }
        };

        let requested: HashSet<&str> = misses.iter().map(|item| item.url.as_str()).collect();
        let mut missing: Vec<String> =
            requested.iter().filter(|url| !answers.contains_key(**url)).map(|url| url.to_string()).collect();
        let mut unexpected: Vec<String> =
            answers.keys().filter(|key| !requested.contains(key.as_str())).cloned().collect();

        if !missing.is_empty() || !unexpected.is_empty() {
            missing.sort();
            unexpected.sort();
            tracing::warn!(kind = kind.tag(), ?missing, ?unexpected, "model reply does not match the requested URLs");
            self.prompts.forget(&prompt).await;
            return Err(Error::KeyMismatch { missing, unexpected });
        }

        let results: Vec<ClassificationResult> = misses
            .into_iter()
            .map(|item| ClassificationResult {
                response: answers.remove(&item.url).unwrap_or(Value::Null),
                url: item.url,
                content_type: item.content_type,
                facet: item.facet,
            })
            .collect();

        // An empty answer is not stored as a result, so the reply carrying it
        // must not be replayed from the prompt cache either.
        if results.iter().any(|r| !r.is_cacheable()) {
            tracing::debug!(kind = kind.tag(), "reply has empty answers, not keeping it");
            self.prompts.forget(&prompt).await;
        }

        Ok(results)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{ScriptedModel, prompt_urls};
    use serde_json::json;

    async fn classifier(model: Arc<ScriptedModel>) -> (Classifier, CacheDb) {
        let db = CacheDb::open_in_memory().await.unwrap();
        let prompts = Arc::new(PromptCache::new(db.clone(), model, 1024));
        (Classifier::new(db.clone(), prompts, 5_000), db)
    }

    fn doc(url: &str) -> Document {
        Document { url: url.to_string(), content: format!("Lesson material at {url}") }
    }

    #[tokio::test]
    async fn test_batch_is_one_model_call() {
        let model = Arc::new(ScriptedModel::labelling());
        let (classifier, _) = classifier(model.clone()).await;

        let out = classifier
            .classify(ClassifierKind::EducationalLevel, &[doc("https://a.example"), doc("https://b.example")], None)
            .await
            .unwrap();

        assert_eq!(model.calls(), 1);
        assert_eq!(out.len(), 2);
        assert_eq!(out[0].url, "https://a.example");
        assert_eq!(out[0].label, Label::Single("Sek. I".into()));
    }

    #[tokio::test]
    async fn test_cached_documents_skip_the_model() {
        let model = Arc::new(ScriptedModel::labelling());
        let (classifier, _) = classifier(model.clone()).await;

        classifier.classify(ClassifierKind::Subject, &[doc("https://a.example")], None).await.unwrap();
        let out = classifier
            .classify(ClassifierKind::Subject, &[doc("https://a.example"), doc("https://b.example")], None)
            .await
            .unwrap();

        assert_eq!(model.calls(), 2);
        assert_eq!(out.len(), 2);
        assert!(out.iter().all(|c| c.label == Label::Single("Chemistry".into())));

        classifier
            .classify(ClassifierKind::Subject, &[doc("https://b.example"), doc("https://a.example")], None)
            .await
            .unwrap();
        assert_eq!(model.calls(), 2);
        assert_eq!(classifier.result_stats().hits, 3);
    }

    #[tokio::test]
    async fn test_only_misses_are_in_the_prompt() {
        let model = Arc::new(ScriptedModel::replying(|prompt| {
            let urls = prompt_urls(prompt);
            assert_eq!(urls, vec!["https://b.example".to_string()]);
            Ok(json!({"https://b.example": ["quiz"]}).to_string())
        }));
        let (classifier, db) = classifier(model).await;
        db.put_result(&ClassificationResult {
            url: "https://a.example".into(),
            content_type: "resource_type".into(),
            facet: None,
            response: json!(["worksheet"]),
        })
        .await
        .unwrap();

        let out = classifier
            .classify(ClassifierKind::ResourceType, &[doc("https://a.example"), doc("https://b.example")], None)
            .await
            .unwrap();
        assert_eq!(out[0].label, Label::Single("worksheet".into()));
        assert_eq!(out[1].label, Label::Single("quiz".into()));
    }

    #[tokio::test]
    async fn test_key_mismatch_is_an_error() {
        let model = Arc::new(ScriptedModel::replying(|_| {
            Ok(json!({"https://a.example": ["quiz"], "https://stray.example": ["video"]}).to_string())
        }));
        let (classifier, db) = classifier(model.clone()).await;

        let err = classifier
            .classify(ClassifierKind::ResourceType, &[doc("https://a.example"), doc("https://b.example")], None)
            .await
            .unwrap_err();

        match err {
            Error::KeyMismatch { missing, unexpected } => {
                assert_eq!(missing, vec!["https://b.example".to_string()]);
                assert_eq!(unexpected, vec!["https://stray.example".to_string()]);
            }
            other => panic!("expected key mismatch, got {other}"),
        }

        let key = BatchItem::new("https://a.example", "resource_type", "", None, 10).cache_key();
        assert!(db.get_result(&key).await.unwrap().is_none());

        classifier
            .classify(ClassifierKind::ResourceType, &[doc("https://a.example"), doc("https://b.example")], None)
            .await
            .unwrap_err();
        assert_eq!(model.calls(), 2);
    }

    #[tokio::test]
    async fn test_unparseable_reply_is_an_error() {
        let model = Arc::new(ScriptedModel::replying(|_| Ok("I am not able to help with that.".into())));
        let (classifier, _) = classifier(model).await;

        let err = classifier.classify(ClassifierKind::Subject, &[doc("https://a.example")], None).await.unwrap_err();
        assert!(matches!(err, Error::ClassificationParse(_)));
    }

    #[tokio::test]
    async fn test_model_failure_is_a_parse_error() {
        let model = Arc::new(ScriptedModel::replying(|_| Err(lessonlens_client::LlmError::RateLimited)));
        let (classifier, _) = classifier(model).await;

        let err = classifier.classify(ClassifierKind::Subject, &[doc("https://a.example")], None).await.unwrap_err();
        assert!(matches!(err, Error::ClassificationParse(_)));
    }

    #[tokio::test]
    async fn test_empty_answer_is_unsure_and_retried() {
        let model = Arc::new(ScriptedModel::replying(|prompt| {
            let urls = prompt_urls(prompt);
            let mut reply = serde_json::Map::new();
            for url in urls {
                let answer = if url.ends_with('a') { json!([]) } else { json!(["Physics"]) };
                reply.insert(url, answer);
            }
            Ok(Value::Object(reply).to_string())
        }));
        let (classifier, _) = classifier(model.clone()).await;
        let docs = [doc("https://example.a"), doc("https://example.b")];

        let out = classifier.classify(ClassifierKind::Subject, &docs, None).await.unwrap();
        assert_eq!(out[0].label, Label::Unsure);
        assert_eq!(out[1].label, Label::Single("Physics".into()));

        classifier.classify(ClassifierKind::Subject, &docs, None).await.unwrap();
        assert_eq!(model.calls(), 2);
    }

    #[tokio::test]
    async fn test_single_document_empty_answer_is_asked_again() {
        let model = Arc::new(ScriptedModel::replying(|prompt| {
            let mut reply = serde_json::Map::new();
            for url in prompt_urls(prompt) {
                reply.insert(url, json!([]));
            }
            Ok(Value::Object(reply).to_string())
        }));
        let (classifier, db) = classifier(model.clone()).await;

        let first = classifier.classify_one(ClassifierKind::Subject, doc("https://a.example"), None).await.unwrap();
        assert_eq!(first, Label::Unsure);
        assert_eq!(db.entry_counts().await.unwrap().prompts, 0);

        let second = classifier.classify_one(ClassifierKind::Subject, doc("https://a.example"), None).await.unwrap();
        assert_eq!(second, Label::Unsure);
        assert_eq!(model.calls(), 2);
    }

    #[tokio::test]
    async fn test_snippet_requires_facet() {
        let model = Arc::new(ScriptedModel::labelling());
        let (classifier, _) = classifier(model.clone()).await;

        let err = classifier.classify(ClassifierKind::Snippet, &[doc("https://a.example")], None).await.unwrap_err();
        assert!(matches!(err, Error::InvalidInput(_)));

        let err = classifier
            .classify(ClassifierKind::Snippet, &[doc("https://a.example")], Some("  "))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::InvalidInput(_)));
        assert_eq!(model.calls(), 0);
    }

    #[tokio::test]
    async fn test_facet_scopes_snippets() {
        let model = Arc::new(ScriptedModel::labelling());
        let (classifier, _) = classifier(model.clone()).await;
        let docs = [doc("https://a.example")];

        let label = classifier
            .classify_one(ClassifierKind::Snippet, docs[0].clone(), Some("atom models for grade 8"))
            .await
            .unwrap();
        assert_eq!(label, Label::Single("A <b>short</b> overview of atoms.".into()));

        classifier.classify(ClassifierKind::Snippet, &docs, Some("atom models for grade 8")).await.unwrap();
        assert_eq!(model.calls(), 1);

        classifier.classify(ClassifierKind::Snippet, &docs, Some("ions for grade 9")).await.unwrap();
        assert_eq!(model.calls(), 2);
    }

    #[tokio::test]
    async fn test_duplicate_documents_collapse() {
        let model = Arc::new(ScriptedModel::labelling());
        let (classifier, _) = classifier(model).await;

        let out = classifier
            .classify(ClassifierKind::Subject, &[doc("https://a.example"), doc("https://a.example")], None)
            .await
            .unwrap();
        assert_eq!(out.len(), 1);
    }

    #[tokio::test]
    async fn test_empty_batch() {
        let model = Arc::new(ScriptedModel::labelling());
        let (classifier, _) = classifier(model.clone()).await;
        assert!(classifier.classify(ClassifierKind::Subject, &[], None).await.unwrap().is_empty());
        assert_eq!(model.calls(), 0);
    }
}
