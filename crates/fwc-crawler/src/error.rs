use thiserror::Error;

use crate::classify::DocKind;

#[derive(Error, Debug)]
pub enum CrawlError {
    /// Refused by the host's robots rules, the URL is not requested
    #[error("Disallowed by robots rules: {url}")]
    RobotsDisallowed { url: String },
    /// Transport failure or non-200 status
    #[error("Couldn't fetch {url} got: {reason}")]
    FetchFailed { url: String, reason: String },
    /// Malformed content, the record falls back to empty metadata
    #[error("Couldn't parse {kind} document: {reason}")]
    ParseFailed { kind: DocKind, reason: String },
    /// A whole seed crawl was lost, sibling seeds are unaffected
    #[error("Worker for seed {label} failed: {reason}")]
    WorkerFailed { label: String, reason: String },
    #[error(transparent)]
    InvalidUrl(#[from] url::ParseError),
    #[error(transparent)]
    Http(#[from] reqwest::Error),
}

impl CrawlError {
    pub(crate) fn parse(kind: DocKind, reason: impl ToString) -> Self {
        Self::ParseFailed {
            kind,
            reason: reason.to_string(),
        }
    }
}
