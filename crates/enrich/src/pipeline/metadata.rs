//! Educational metadata for search results.

use super::{EnrichmentReport, ItemOutcome, load_content, prepare, run_batch};
use crate::classify::{Classifier, ClassifierKind, Document};
use crate::store::ContentStore;
use lessonlens_core::{Error, Label, SearchResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// A search result with its LRMI-style educational metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct EnrichedResult {
    pub url: String,
    pub title: String,
    pub description: String,
    pub educational_level: Label,
    pub resource_type: Label,
    pub subject: Label,
    pub educational_role: Label,
    pub educational_use: Label,
    /// What a learner is assessed on.
    pub assesses: Label,
    /// What a learner acquires.
    pub teaches: Label,
    /// Whether the labels were derived from page text rather than title and description.
    pub used_page_text: bool,
}

pub struct MetadataEnricher {
    store: Arc<ContentStore>,
    classifier: Arc<Classifier>,
    char_limit: usize,
    worker_count: usize,
}

impl MetadataEnricher {
    pub fn new(store: Arc<ContentStore>, classifier: Arc<Classifier>, char_limit: usize, worker_count: usize) -> Self {
        Self { store, classifier, char_limit, worker_count }
    }

    /// Enrich every search result that can be fetched and classified.
    ///
    /// All metadata kinds are classified concurrently for each result.
    /// Results that fail are left out of the report.
    pub async fn enrich(&self, results: Vec<SearchResult>) -> Result<EnrichmentReport<EnrichedResult>, Error> {
        let results = prepare(results)?;
        let char_limit = self.char_limit;

        let report = run_batch(results, self.worker_count, |result| {
            let store = self.store.clone();
            let classifier = self.classifier.clone();
            async move {
                let (content, used_page_text) = load_content(&store, &result, char_limit).await?;
                let document = Document { url: result.url.clone(), content };

                let (educational_level, resource_type, subject, educational_role, educational_use, assesses, teaches) =
                    tokio::try_join!(
                        classifier.classify_one(ClassifierKind::EducationalLevel, document.clone(), None),
                        classifier.classify_one(ClassifierKind::ResourceType, document.clone(), None),
                        classifier.classify_one(ClassifierKind::Subject, document.clone(), None),
                        classifier.classify_one(ClassifierKind::EducationalRole, document.clone(), None),
                        classifier.classify_one(ClassifierKind::EducationalUse, document.clone(), None),
                        classifier.classify_one(ClassifierKind::Assesses, document.clone(), None),
                        classifier.classify_one(ClassifierKind::Teaches, document, None),
                    )?;

                let item = EnrichedResult {
                    url: result.url,
                    title: result.title,
                    description: result.description,
                    educational_level,
                    resource_type,
                    subject,
                    educational_role,
                    educational_use,
                    assesses,
                    teaches,
                    used_page_text,
                };
                Ok(ItemOutcome { item: Some(item), used_page_text })
            }
        })
        .await;

        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prompt::PromptCache;
    use crate::testing::{ScriptedModel, StaticWeb};
    use lessonlens_core::CacheDb;

    struct Fixture {
        enricher: MetadataEnricher,
        web: Arc<StaticWeb>,
        model: Arc<ScriptedModel>,
    }

    async fn fixture(web: StaticWeb) -> Fixture {
        let db = CacheDb::open_in_memory().await.unwrap();
        let web = Arc::new(web);
        let model = Arc::new(ScriptedModel::labelling());
        let store = Arc::new(ContentStore::new(db.clone(), web.clone()));
        let prompts = Arc::new(PromptCache::new(db.clone(), model.clone(), 1024));
        let classifier = Arc::new(Classifier::new(db, prompts, 5_000));
        Fixture { enricher: MetadataEnricher::new(store, classifier, 5_000, 10), web, model }
    }

    fn result(url: &str) -> SearchResult {
        SearchResult { url: url.to_string(), title: "Atoms".into(), description: "Intro to atoms".into() }
    }

    #[tokio::test]
    async fn test_atoms_lesson_second_run_is_served_from_cache() {
        let lesson = "https://example.edu/lesson";
        let f = fixture(StaticWeb::new().page(lesson, "text/plain", "Atoms are the smallest units of matter.")).await;

        let first = f.enricher.enrich(vec![result(lesson)]).await.unwrap();
        assert_eq!(first.items.len(), 1);
        let item = &first.items[0];
        assert_eq!(item.educational_level, Label::Single("Sek. I".into()));
        assert_eq!(item.resource_type, Label::Multiple(vec!["lesson_plan".into(), "worksheet".into()]));
        assert_eq!(item.subject, Label::Single("Chemistry".into()));
        assert_eq!(item.educational_role, Label::Multiple(vec!["student".into(), "teacher".into()]));
        assert_eq!(item.educational_use, Label::Single("practice".into()));
        assert_eq!(item.assesses, Label::Single("Naming subatomic particles".into()));
        assert_eq!(item.teaches, Label::Single("Structure of the atom".into()));
        assert!(item.used_page_text);

        let (gets, calls) = (f.web.gets(), f.model.calls());
        assert_eq!(gets, 1);
        assert_eq!(calls, 7);

        let second = f.enricher.enrich(vec![result(lesson)]).await.unwrap();
        assert_eq!(second.items, first.items);
        assert_eq!(f.web.gets(), gets);
        assert_eq!(f.model.calls(), calls);
    }

    #[tokio::test]
    async fn test_failing_url_is_excluded() {
        let mut web = StaticWeb::new();
        for i in 1..=5 {
            let url = format!("https://example.edu/{i}");
            web = if i == 3 { web.failing(&url) } else { web.page(&url, "text/plain", format!("Page {i}")) };
        }
        let f = fixture(web).await;

        let results = (1..=5).map(|i| result(&format!("https://example.edu/{i}"))).collect();
        let report = f.enricher.enrich(results).await.unwrap();

        assert_eq!(report.items.len(), 4);
        assert!(report.items.iter().all(|item| item.url != "https://example.edu/3"));
        assert_eq!(report.stats.failed, 1);
        assert_eq!(report.stats.succeeded, 4);
    }

    #[tokio::test]
    async fn test_page_without_text_falls_back_to_title() {
        let url = "https://example.edu/empty";
        let f = fixture(StaticWeb::new().page(url, "text/plain", "   ")).await;

        let report = f.enricher.enrich(vec![result(url)]).await.unwrap();
        assert_eq!(report.items.len(), 1);
        assert!(!report.items[0].used_page_text);
        assert_eq!(report.stats.fallbacks, 1);
        assert_eq!(report.stats.hit_ratio(), 0.0);
    }

    #[tokio::test]
    async fn test_invalid_input_aborts_before_dispatch() {
        let f = fixture(StaticWeb::new()).await;
        let err = f.enricher.enrich(vec![result("")]).await.unwrap_err();
        assert!(matches!(err, Error::InvalidInput(_)));
        assert_eq!(f.web.heads(), 0);
    }

    #[test]
    fn test_enriched_result_json_shape() {
        let item = EnrichedResult {
            url: "https://example.edu/lesson".into(),
            title: "Atoms".into(),
            description: "Intro to atoms".into(),
            educational_level: Label::Single("Sek. I".into()),
            resource_type: Label::Unsure,
            subject: Label::Multiple(vec!["Chemistry".into(), "Physics".into()]),
            educational_role: Label::Single("teacher".into()),
            educational_use: Label::Unsure,
            assesses: Label::Unsure,
            teaches: Label::Single("Atomic structure".into()),
            used_page_text: true,
        };
        let json = serde_json::to_value(&item).unwrap();
        assert_eq!(json["educationalLevel"]["kind"], "single");
        assert_eq!(json["resourceType"]["kind"], "unsure");
        assert_eq!(json["subject"]["value"][1], "Physics");
        assert_eq!(json["educationalRole"]["value"], "teacher");
        assert_eq!(json["teaches"]["kind"], "single");
        assert_eq!(json["usedPageText"], true);
    }
}
