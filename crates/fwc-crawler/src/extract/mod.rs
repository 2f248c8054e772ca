//! Kind specific document parsers.
//!
//! Every arm turns a response body into the same [`DocumentMetadata`]. Only html
//! yields outbound links, csv/json/spreadsheet/other bodies are not parsed.

mod html;
mod pdf;
mod xml;

use serde::{Deserialize, Serialize};

use crate::classify::DocKind;
use crate::config::CrawlerConfig;
use crate::error::CrawlError;

pub const TITLE_MAX_CHARS: usize = 200;
pub const BODY_MAX_CHARS: usize = 8000;
pub const PDF_TEXT_MAX_CHARS: usize = 4000;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Link {
    pub href: String,
    pub anchor_text: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentMetadata {
    pub doc_kind: DocKind,
    pub title: String,
    pub text_len: usize,
    pub years: Vec<i32>,
    pub links: Vec<Link>,
}

impl DocumentMetadata {
    pub fn empty(doc_kind: DocKind) -> Self {
        Self {
            doc_kind,
            title: String::new(),
            text_len: 0,
            years: vec![],
            links: vec![],
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub enum Extractor {
    Html,
    Xml,
    Pdf { size_limit: usize },
    Opaque(DocKind),
}

impl Extractor {
    pub fn for_kind(kind: DocKind, config: &CrawlerConfig) -> Self {
        match kind {
            DocKind::Html => Self::Html,
            DocKind::Xml => Self::Xml,
            DocKind::Pdf => Self::Pdf {
                size_limit: config.pdf_size_limit,
            },
            kind => Self::Opaque(kind),
        }
    }

    pub fn kind(&self) -> DocKind {
        match self {
            Self::Html => DocKind::Html,
            Self::Xml => DocKind::Xml,
            Self::Pdf { .. } => DocKind::Pdf,
            Self::Opaque(kind) => *kind,
        }
    }

    /// [`Extractor::parse`] on the blocking thread pool, off the async workers.
    pub async fn parse_owned(self, body: Vec<u8>) -> Result<DocumentMetadata, CrawlError> {
        let kind = self.kind();
        tokio::task::spawn_blocking(move || self.parse(&body))
            .await
            .unwrap_or_else(|e| Err(CrawlError::parse(kind, e)))
    }

    pub fn parse(&self, body: &[u8]) -> Result<DocumentMetadata, CrawlError> {
        match self {
            Self::Html => html::parse(body),
            Self::Xml => xml::parse(body),
            Self::Pdf { size_limit } => Ok(pdf::parse(body, *size_limit)),
            Self::Opaque(kind) => Ok(DocumentMetadata::empty(*kind)),
        }
    }
}

// Strips every text piece and joins the non-empty ones with a space
fn join_text<I, S>(pieces: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut out = String::new();
    for piece in pieces {
        let piece = piece.as_ref().trim();
        if piece.is_empty() {
            continue;
        }
        if !out.is_empty() {
            out.push(' ');
        }
        out.push_str(piece);
    }
    out
}

fn truncate_chars(s: &str, max: usize) -> String {
    match s.char_indices().nth(max) {
        Some((i, _)) => s[..i].to_string(),
        None => s.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truncation_counts_chars() {
        assert_eq!(truncate_chars("発生予察情報", 4), "発生予察");
        assert_eq!(truncate_chars("abc", 10), "abc");
    }

    #[test]
    fn join_skips_blank_pieces() {
        assert_eq!(join_text([" a ", "", "\n", "b"]), "a b");
    }

    #[tokio::test]
    async fn owned_parse_matches_inline_parse() {
        let conf = CrawlerConfig::default();
        let page = "<html><head><title>令和6年度 予察</title></head><body><a href=\"/b\">b</a></body></html>";
        let extractor = Extractor::for_kind(DocKind::Html, &conf);

        let inline = extractor.parse(page.as_bytes()).unwrap();
        let owned = extractor.parse_owned(page.as_bytes().to_vec()).await.unwrap();
        assert_eq!(owned, inline);
        assert_eq!(owned.years, vec![2024]);
        assert_eq!(extractor.kind(), DocKind::Html);

        let err = Extractor::for_kind(DocKind::Xml, &conf)
            .parse_owned(b"<rss><channel>".to_vec())
            .await
            .unwrap_err();
        assert!(matches!(err, CrawlError::ParseFailed { kind: DocKind::Xml, .. }));
    }

    #[test]
    fn opaque_kinds_are_not_parsed() {
        let conf = CrawlerConfig::default();
        for kind in [DocKind::Csv, DocKind::Json, DocKind::Spreadsheet, DocKind::Other] {
            let meta = Extractor::for_kind(kind, &conf).parse(b"2024,2023").unwrap();
            assert_eq!(meta, DocumentMetadata::empty(kind));
        }
    }
}
