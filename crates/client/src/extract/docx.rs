//! DOCX paragraph text.
//!
//! A DOCX file is a zip archive; the body lives in `word/document.xml` as
//! `<w:p>` paragraphs made of `<w:t>` runs.

use super::Extractor;
use lessonlens_core::Error;
use quick_xml::Reader;
use quick_xml::events::Event;
use std::io::{Cursor, Read};

const DOCUMENT_PART: &str = "word/document.xml";

#[derive(Debug, Default, Clone, Copy)]
pub struct DocxExtractor;

fn document_xml(bytes: &[u8]) -> Result<String, Error> {
    let mut archive = zip::ZipArchive::new(Cursor::new(bytes))
        .map_err(|e| Error::ExtractFailed(format!("not a DOCX archive: {e}")))?;
    let mut part = archive
        .by_name(DOCUMENT_PART)
        .map_err(|e| Error::ExtractFailed(format!("{DOCUMENT_PART}: {e}")))?;

    let mut xml = String::new();
    part.read_to_string(&mut xml)
        .map_err(|e| Error::ExtractFailed(format!("{DOCUMENT_PART}: {e}")))?;
    Ok(xml)
}

/// Paragraph text of a WordprocessingML body, one line per non-empty paragraph.
pub fn paragraphs(xml: &str) -> Result<String, Error> {
    let mut reader = Reader::from_str(xml);
    let mut lines: Vec<String> = Vec::new();
    let mut current = String::new();
    let mut in_text = false;

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) if e.name().as_ref() == b"w:t" => in_text = true,
            Ok(Event::End(e)) if e.name().as_ref() == b"w:t" => in_text = false,
            Ok(Event::Empty(e)) => match e.name().as_ref() {
                b"w:tab" => current.push('\t'),
                b"w:br" | b"w:cr" => current.push('\n'),
                _ => {}
            },
            Ok(Event::Text(t)) if in_text => {
                let text = t
                    .unescape()
                    .map_err(|e| Error::ExtractFailed(format!("bad text run: {e}")))?;
                current.push_str(&text);
            }
            Ok(Event::End(e)) if e.name().as_ref() == b"w:p" => {
                let line = current.trim();
                if !line.is_empty() {
                    lines.push(line.to_string());
                }
                current.clear();
            }
            Ok(Event::Eof) => break,
            Ok(_) => {}
            Err(e) => {
                return Err(Error::ExtractFailed(format!(
                    "malformed XML at {}: {e}",
                    reader.buffer_position()
                )));
            }
        }
    }

    let tail = current.trim();
    if !tail.is_empty() {
        lines.push(tail.to_string());
    }

    Ok(lines.join("\n"))
}

impl Extractor for DocxExtractor {
    fn name(&self) -> &'static str {
        "docx"
    }

    fn extract(&self, bytes: &[u8]) -> Result<String, Error> {
        paragraphs(&document_xml(bytes)?)
    }
}
