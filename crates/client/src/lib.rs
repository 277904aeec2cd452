//! Client code for lessonlens.
//!
//! This crate provides the HTTP fetch pipeline, document text extraction and
//! the language model completion client used by the enrichment pipeline.

pub mod extract;
pub mod fetch;
pub mod llm;

pub use extract::{ContentKind, Extraction, Extractor, extract_text};
pub use fetch::{FetchClient, FetchConfig, FetchResponse, HttpFetcher, canonicalize};
pub use llm::{AnthropicClient, AnthropicConfig, CompletionClient, LlmError};
