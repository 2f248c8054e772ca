use serde::{Deserialize, Serialize};
use url::Url;

use crate::classify::DocKind;

/// One independent crawl root.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Seed {
    pub label: String,
    pub start_url: String,
}

impl Seed {
    pub fn new(label: impl Into<String>, start_url: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            start_url: start_url.into(),
        }
    }
}

/// One line of a seed's page inventory, one per visited URL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CrawlRecord {
    pub url: String,
    pub depth: usize,
    pub parent_url: Option<String>,
    pub status: Option<u16>,
    pub content_type: Option<String>,
    pub doc_kind: DocKind,
    pub title: String,
    pub years: Vec<i32>,
    pub text_len: usize,
    pub section: String,
    pub error: Option<String>,
}

/// A same-domain PDF link seen on an html page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PdfLink {
    pub source_page: String,
    pub depth: usize,
    pub pdf_url: String,
    pub anchor_text: String,
    pub filename: String,
    /// Distinct, most recent first
    pub years: Vec<i32>,
}

/// First `levels` path segments, used to group pages by site section.
pub fn section_key(url: &str, levels: usize) -> String {
    let Ok(url) = Url::parse(url) else {
        return String::new();
    };
    url.path()
        .split('/')
        .filter(|s| !s.is_empty())
        .take(levels)
        .collect::<Vec<_>>()
        .join("/")
}

pub fn filename_of(url: &str) -> String {
    Url::parse(url)
        .ok()
        .and_then(|u| u.path().rsplit('/').next().map(str::to_string))
        .unwrap_or_default()
}
