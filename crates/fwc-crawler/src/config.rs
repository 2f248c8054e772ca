use std::time::Duration;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CrawlerConfig {
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    #[serde(default = "default_max_pages")]
    pub max_pages: usize,

    #[serde(default = "default_max_depth")]
    pub max_depth: usize,

    #[serde(default = "default_num_workers")]
    pub num_workers: usize,

    /// The delay in seconds between two requests of the same seed
    #[serde(default = "default_delay")]
    pub delay: f32,

    /// The request timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout: u64,

    /// PDFs larger than this many bytes are recorded without text extraction
    #[serde(default = "default_pdf_size_limit")]
    pub pdf_size_limit: usize,

    /// Hosts sharing one of these suffixes are considered the same domain
    #[serde(default = "default_shared_domain_suffixes")]
    pub shared_domain_suffixes: Vec<String>,

    #[serde(default)]
    pub vocabulary: ScoringVocabulary,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            user_agent: default_user_agent(),
            max_pages: default_max_pages(),
            max_depth: default_max_depth(),
            num_workers: default_num_workers(),
            delay: default_delay(),
            timeout: default_timeout(),
            pdf_size_limit: default_pdf_size_limit(),
            shared_domain_suffixes: default_shared_domain_suffixes(),
            vocabulary: ScoringVocabulary::default(),
        }
    }
}

impl CrawlerConfig {
    pub fn delay(&self) -> Duration {
        if self.delay.is_finite() && self.delay > 0. {
            Duration::from_secs_f32(self.delay)
        } else {
            Duration::ZERO
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout)
    }
}

fn default_user_agent() -> String {
    String::from("fwc/0.1")
}

fn default_max_pages() -> usize {
    60
}

fn default_max_depth() -> usize {
    2
}

fn default_num_workers() -> usize {
    4
}

fn default_delay() -> f32 {
    0.4
}

fn default_timeout() -> u64 {
    20
}

fn default_pdf_size_limit() -> usize {
    2_000_000
}

fn default_shared_domain_suffixes() -> Vec<String> {
    vec![String::from(".go.jp")]
}

/// Terms feeding the link priority score.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoringVocabulary {
    /// Topic keywords searched in anchor texts (+3 each)
    #[serde(default = "default_keywords")]
    pub keywords: Vec<String>,

    /// Transliterated topic terms searched in lower-cased URLs (+2 each)
    #[serde(default = "default_url_hints")]
    pub url_hints: Vec<String>,

    /// URL fragments signalling a back-catalog page
    #[serde(default = "default_archive_url_markers")]
    pub archive_url_markers: Vec<String>,

    /// Anchor fragments signalling a back-catalog page
    #[serde(default = "default_archive_anchor_markers")]
    pub archive_anchor_markers: Vec<String>,
}

impl Default for ScoringVocabulary {
    fn default() -> Self {
        Self {
            keywords: default_keywords(),
            url_hints: default_url_hints(),
            archive_url_markers: default_archive_url_markers(),
            archive_anchor_markers: default_archive_anchor_markers(),
        }
    }
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

fn default_keywords() -> Vec<String> {
    strings(&[
        "予察",
        "発生予察",
        "発生情報",
        "注意報",
        "警報",
        "バックナンバー",
        "年度",
        "病害虫",
        "害虫",
        "病害",
    ])
}

fn default_url_hints() -> Vec<String> {
    strings(&[
        "yosatsu",
        "yosatu",
        "yohou",
        "byogaichu",
        "gaicyu",
        "gaichu",
        "byogai",
        "yosan",
    ])
}

fn default_archive_url_markers() -> Vec<String> {
    strings(&["back"])
}

fn default_archive_anchor_markers() -> Vec<String> {
    strings(&["バックナンバー"])
}
