use std::panic;

use pdf_extract::{output_doc_page, Document, PlainTextOutput};

use super::{truncate_chars, DocumentMetadata, PDF_TEXT_MAX_CHARS};
use crate::classify::DocKind;
use crate::years::extract_years;

const FIRST_PAGE: u32 = 1;

/// Only the first page of PDFs no larger than `size_limit` is read. Oversized or
/// unreadable files are kept with no text and no years.
pub(super) fn parse(body: &[u8], size_limit: usize) -> DocumentMetadata {
    let mut meta = DocumentMetadata::empty(DocKind::Pdf);
    if body.len() > size_limit {
        log::debug!("Skipping PDF text extraction, {} bytes", body.len());
        return meta;
    }

    let text = match first_page_text(body) {
        Ok(text) => text,
        Err(e) => {
            log::debug!("Couldn't extract PDF text: {e}");
            return meta;
        }
    };

    meta.text_len = text.chars().count();
    meta.years = extract_years(&truncate_chars(&text, PDF_TEXT_MAX_CHARS));
    meta
}

// Later pages are never decoded
fn first_page_text(body: &[u8]) -> Result<String, String> {
    // pdf-extract panics on some malformed inputs
    panic::catch_unwind(|| {
        let mut doc = Document::load_mem(body).map_err(|e| e.to_string())?;
        if doc.is_encrypted() {
            doc.decrypt("").map_err(|e| format!("encrypted: {e}"))?;
        }
        let mut text = String::new();
        {
            let mut output = PlainTextOutput::new(&mut text);
            output_doc_page(&doc, &mut output, FIRST_PAGE).map_err(|e| format!("{e:?}"))?;
        }
        Ok(text)
    })
    .map_err(|_| String::from("extractor panicked"))?
}
