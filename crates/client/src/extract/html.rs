//! HTML readable content extraction.
//!
//! Lectito's Readability-style pipeline picks the main article. Pages it
//! cannot score (short pages, app shells, fragments) fall back to the
//! visible text of the whole document.

use super::{Extractor, tidy_lines};
use lectito_core::{Document, ExtractConfig as LectitoConfig};
use lessonlens_core::Error;
use scraper::Html;

const SKIPPED_ELEMENTS: &[&str] = &["script", "style", "noscript", "template", "svg", "head"];

#[derive(Debug, Clone, Copy)]
pub struct HtmlExtractor {
    /// Minimum character count for an article candidate.
    pub char_threshold: usize,
}

impl HtmlExtractor {
    pub const DEFAULT: HtmlExtractor = HtmlExtractor { char_threshold: 200 };

    fn readable(&self, html: &str) -> Result<String, Error> {
        let doc = Document::parse(html).map_err(|e| Error::ExtractFailed(format!("failed to parse HTML: {}", e)))?;

        let mut cfg = LectitoConfig::default();
        cfg.char_threshold = self.char_threshold;
        let extracted = lectito_core::extract_content(&doc, &cfg)
            .map_err(|e| Error::ExtractFailed(format!("extraction failed: {}", e)))?;

        let metadata = doc.extract_metadata();
        lectito_core::convert_to_markdown(&extracted.content, &metadata, &Default::default())
            .map_err(|e| Error::ExtractFailed(format!("markdown conversion failed: {}", e)))
    }
}

impl Default for HtmlExtractor {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// Visible text of an HTML document, without scripts and styles.
pub fn strip_tags(html: &str) -> String {
    let document = Html::parse_document(html);
    let mut out = String::new();

    for node in document.root_element().descendants() {
        let Some(text) = node.value().as_text() else {
            continue;
        };
        let hidden = node.ancestors().any(|a| {
            a.value()
                .as_element()
                .is_some_and(|e| SKIPPED_ELEMENTS.contains(&e.name()))
        });
        if hidden {
            continue;
        }

        let words = text.split_whitespace().collect::<Vec<_>>().join(" ");
        if words.is_empty() {
            continue;
        }
        if !out.is_empty() {
            out.push('\n');
        }
        out.push_str(&words);
    }

    out
}

impl Extractor for HtmlExtractor {
    fn name(&self) -> &'static str {
        "html"
    }

    fn extract(&self, bytes: &[u8]) -> Result<String, Error> {
        let html = String::from_utf8_lossy(bytes);

        match self.readable(&html) {
            Ok(markdown) if !markdown.trim().is_empty() => Ok(tidy_lines(&markdown)),
            Ok(_) => Ok(strip_tags(&html)),
            Err(e) => {
                tracing::debug!("readable extraction failed, stripping tags: {e}");
                Ok(strip_tags(&html))
            }
        }
    }
}
