//! PDF page text via `pdf-extract`.

use super::{Extractor, tidy_lines};
use lessonlens_core::Error;

#[derive(Debug, Default, Clone, Copy)]
pub struct PdfExtractor;

impl Extractor for PdfExtractor {
    fn name(&self) -> &'static str {
        "pdf"
    }

    fn extract(&self, bytes: &[u8]) -> Result<String, Error> {
        if !bytes.starts_with(b"%PDF") {
            return Err(Error::ExtractFailed("missing PDF header".into()));
        }

        let text = pdf_extract::extract_text_from_mem(bytes)
            .map_err(|e| Error::ExtractFailed(format!("PDF extraction failed: {e}")))?;
        Ok(tidy_lines(&text))
    }
}
