//! Network-free fetcher and model doubles with call counters.

use async_trait::async_trait;
use bytes::Bytes;
use lessonlens_client::fetch::{FetchResponse, HttpFetcher, StatusCode};
use lessonlens_client::{CompletionClient, LlmError};
use lessonlens_core::Error;
use serde_json::{Map, Value, json};
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use url::Url;

type Reply = Box<dyn Fn(&str) -> Result<String, LlmError> + Send + Sync>;

pub struct ScriptedModel {
    calls: AtomicUsize,
    reply: Reply,
}

impl ScriptedModel {
    pub fn replying(reply: impl Fn(&str) -> Result<String, LlmError> + Send + Sync + 'static) -> Self {
        Self { calls: AtomicUsize::new(0), reply: Box::new(reply) }
    }

    /// Answers every URL of a classification prompt with a fixed label per kind.
    pub fn labelling() -> Self {
        Self::replying(|prompt| {
            let answer = if prompt.contains("Grundschule") {
                json!(["Sek. I"])
            } else if prompt.contains("lesson_plan") {
                json!(["lesson_plan", "worksheet"])
            } else if prompt.contains("Religion and Ethics") {
                json!("Chemistry")
            } else if prompt.contains("instructional_designer") {
                json!(["student", "teacher"])
            } else if prompt.contains("flipped_learning") {
                json!(["practice"])
            } else if prompt.contains("is assessed on") {
                json!("Naming subatomic particles")
            } else if prompt.contains("acquires from it") {
                json!("Structure of the atom")
            } else {
                json!("A <b>short</b> overview of atoms.")
            };

            let mut object = Map::new();
            for url in prompt_urls(prompt) {
                object.insert(url, answer.clone());
            }
            Ok(format!("```json\n{}\n```", Value::Object(object)))
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

/// Document URLs listed in a classification prompt.
pub fn prompt_urls(prompt: &str) -> Vec<String> {
    prompt
        .lines()
        .filter_map(|line| line.strip_prefix("URL: "))
        .map(str::to_string)
        .collect()
}

#[async_trait]
impl CompletionClient for ScriptedModel {
    async fn complete(&self, prompt: &str, _max_tokens: u32) -> Result<String, LlmError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        (self.reply)(prompt)
    }
}

struct Page {
    content_type: Option<String>,
    head_content_type: bool,
    body: Vec<u8>,
}

/// In-memory web keyed by canonical URL.
#[derive(Default)]
pub struct StaticWeb {
    pages: HashMap<String, Page>,
    failing: HashSet<String>,
    heads: AtomicUsize,
    gets: AtomicUsize,
}

impl StaticWeb {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn page(mut self, url: &str, content_type: &str, body: impl Into<Vec<u8>>) -> Self {
        self.pages.insert(
            url.to_string(),
            Page { content_type: Some(content_type.to_string()), head_content_type: true, body: body.into() },
        );
        self
    }

    /// A page whose HEAD response carries no content type.
    pub fn page_without_head_type(mut self, url: &str, content_type: &str, body: impl Into<Vec<u8>>) -> Self {
        self.pages.insert(
            url.to_string(),
            Page { content_type: Some(content_type.to_string()), head_content_type: false, body: body.into() },
        );
        self
    }

    pub fn failing(mut self, url: &str) -> Self {
        self.failing.insert(url.to_string());
        self
    }

    pub fn gets(&self) -> usize {
        self.gets.load(Ordering::SeqCst)
    }

    pub fn heads(&self) -> usize {
        self.heads.load(Ordering::SeqCst)
    }

    fn lookup(&self, url: &Url) -> Result<&Page, Error> {
        if self.failing.contains(url.as_str()) {
            return Err(Error::HttpError(format!("network error for {url}: connection reset")));
        }
        self.pages
            .get(url.as_str())
            .ok_or_else(|| Error::HttpError(format!("GET {url}: status 404")))
    }
}

#[async_trait]
impl HttpFetcher for StaticWeb {
    async fn head(&self, url: &Url) -> Result<Option<String>, Error> {
        self.heads.fetch_add(1, Ordering::SeqCst);
        let page = self.lookup(url)?;
        Ok(page.content_type.clone().filter(|_| page.head_content_type))
    }

    async fn get(&self, url: &Url) -> Result<FetchResponse, Error> {
        self.gets.fetch_add(1, Ordering::SeqCst);
        let page = self.lookup(url)?;
        Ok(FetchResponse {
            url: url.clone(),
            final_url: url.clone(),
            status: StatusCode::OK,
            content_type: page.content_type.clone(),
            bytes: Bytes::from(page.body.clone()),
            fetch_ms: 1,
        })
    }
}
