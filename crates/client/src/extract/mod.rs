//! Text extraction from fetched documents.
//!
//! The extractor is picked from the response content type, falling back to
//! the URL's file extension when the server sent none or a generic one.
//!
//! | kind | extractor |
//! |---|---|
//! | HTML | Lectito readable content, tag stripping fallback |
//! | PDF | `pdf-extract` page text |
//! | DOCX | paragraphs of `word/document.xml` |
//! | plain text | passthrough |
//!
//! Extractors are synchronous and may be slow on large files; callers run
//! them on the blocking pool.

pub mod docx;
pub mod html;
pub mod pdf;

pub use docx::DocxExtractor;
pub use html::HtmlExtractor;
pub use pdf::PdfExtractor;

use crate::fetch::path_extension;
use lessonlens_core::Error;
use url::Url;

/// Document format, as far as extraction is concerned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentKind {
    Html,
    Pdf,
    Docx,
    Text,
    Unsupported,
}

impl ContentKind {
    /// Detect the kind from a `Content-Type` header and the document URL.
    pub fn detect(content_type: Option<&str>, url: &Url) -> Self {
        let mime = content_type
            .and_then(|ct| ct.split(';').next())
            .map(|ct| ct.trim().to_ascii_lowercase())
            .unwrap_or_default();

        match mime.as_str() {
            "text/html" | "application/xhtml+xml" => return ContentKind::Html,
            "application/pdf" => return ContentKind::Pdf,
            "application/vnd.openxmlformats-officedocument.wordprocessingml.document" => return ContentKind::Docx,
            "text/plain" | "text/markdown" => return ContentKind::Text,
            _ => {}
        }

        match path_extension(url).as_deref() {
            Some("pdf") => ContentKind::Pdf,
            Some("docx") => ContentKind::Docx,
            Some("txt" | "md") => ContentKind::Text,
            Some("html" | "htm") => ContentKind::Html,
            _ if mime.is_empty() || mime == "application/octet-stream" => ContentKind::Html,
            _ if mime.starts_with("text/") => ContentKind::Text,
            _ => ContentKind::Unsupported,
        }
    }
}

/// Stable extractor trait, so engines can be swapped without touching the store.
pub trait Extractor: Send + Sync {
    /// Short name recorded next to the stored text.
    fn name(&self) -> &'static str;

    /// Extract plain text from raw document bytes.
    fn extract(&self, bytes: &[u8]) -> Result<String, Error>;
}

/// Text passthrough for `text/*` documents.
#[derive(Debug, Default, Clone, Copy)]
pub struct PlainTextExtractor;

impl Extractor for PlainTextExtractor {
    fn name(&self) -> &'static str {
        "text"
    }

    fn extract(&self, bytes: &[u8]) -> Result<String, Error> {
        Ok(String::from_utf8_lossy(bytes).trim().to_string())
    }
}

/// Extracted text and the extractor that produced it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Extraction {
    pub text: String,
    pub extractor: &'static str,
}

/// Extract text from `bytes` with the extractor for `kind`.
pub fn extract_text(kind: ContentKind, bytes: &[u8]) -> Result<Extraction, Error> {
    let extractor: &dyn Extractor = match kind {
        ContentKind::Html => &HtmlExtractor::DEFAULT,
        ContentKind::Pdf => &PdfExtractor,
        ContentKind::Docx => &DocxExtractor,
        ContentKind::Text => &PlainTextExtractor,
        ContentKind::Unsupported => {
            return Err(Error::ExtractFailed("unsupported content type".into()));
        }
    };

    let text = extractor.extract(bytes)?;
    Ok(Extraction { text, extractor: extractor.name() })
}

/// Collapse runs of blank lines and trailing spaces.
pub(crate) fn tidy_lines(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut blank = false;
    for line in text.lines().map(str::trim_end) {
        if line.trim().is_empty() {
            blank = !out.is_empty();
            continue;
        }
        if blank {
            out.push('\n');
            blank = false;
        }
        if !out.is_empty() {
            out.push('\n');
        }
        out.push_str(line);
    }
    out
}
