use std::any::Any;
use std::sync::Arc;

use futures::{stream, StreamExt};
use serde::Serialize;
use tokio::task::JoinError;

use crate::aggregate::{summarize, SeedSummary};
use crate::classify::{classify, DocKind};
use crate::config::CrawlerConfig;
use crate::error::CrawlError;
use crate::extract::{DocumentMetadata, Extractor};
use crate::fetch::{Fetch, HttpFetcher, Method};
use crate::record::{CrawlRecord, PdfLink, Seed};
use crate::robots::{RobotsGate, ROBOTS_DISALLOW};
use crate::score::PriorityScorer;
use crate::worker::{CrawlWorker, SeedCrawl};

#[derive(Debug, Clone)]
pub struct SeedReport {
    pub seed: Seed,
    pub records: Vec<CrawlRecord>,
    pub pdf_links: Vec<PdfLink>,
    pub summary: SeedSummary,
}

impl From<SeedCrawl> for SeedReport {
    fn from(crawl: SeedCrawl) -> Self {
        let summary = summarize(&crawl.seed.label, &crawl.records);
        Self {
            seed: crawl.seed,
            records: crawl.records,
            pdf_links: crawl.pdf_links,
            summary,
        }
    }
}

/// A seed whose worker stopped early, it has no entry in [`CrawlReport::seeds`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkerFailure {
    pub label: String,
    pub reason: String,
}

impl From<WorkerFailure> for CrawlError {
    fn from(WorkerFailure { label, reason }: WorkerFailure) -> Self {
        Self::WorkerFailed { label, reason }
    }
}

#[derive(Debug, Clone, Default)]
pub struct CrawlReport {
    /// Sorted by seed label
    pub seeds: Vec<SeedReport>,
    pub failures: Vec<WorkerFailure>,
}

impl CrawlReport {
    pub fn summaries(&self) -> impl Iterator<Item = &SeedSummary> {
        self.seeds.iter().map(|s| &s.summary)
    }

    pub fn seed(&self, label: &str) -> Option<&SeedReport> {
        self.seeds.iter().find(|s| s.seed.label == label)
    }
}

/// Crawls every seed over HTTP, see [`crawl_seeds_with`].
pub async fn crawl_seeds(config: &CrawlerConfig, seeds: Vec<Seed>) -> Result<CrawlReport, CrawlError> {
    let fetcher = Arc::new(HttpFetcher::new(config)?);
    Ok(crawl_seeds_with(config, seeds, fetcher).await)
}

/// Runs one worker per seed, at most `num_workers` at a time.
///
/// Workers share the robots cache and the scorer, nothing else. A worker that
/// errors or panics is reported in [`CrawlReport::failures`] and the others
/// keep going.
pub async fn crawl_seeds_with(
    config: &CrawlerConfig,
    seeds: Vec<Seed>,
    fetcher: Arc<dyn Fetch>,
) -> CrawlReport {
    let config = Arc::new(config.clone());
    let robots = Arc::new(RobotsGate::new(fetcher.clone(), config.user_agent.clone()));
    let scorer = Arc::new(PriorityScorer::new(&config.vocabulary));
    let concurrency = config.num_workers.max(1);

    log::info!("Crawling {} seeds with {concurrency} workers", seeds.len());

    let outcomes = stream::iter(seeds)
        .map(|seed| {
            let label = seed.label.clone();
            let worker = CrawlWorker::new(
                seed,
                config.clone(),
                fetcher.clone(),
                robots.clone(),
                scorer.clone(),
            );
            async move { (label, tokio::spawn(worker.run()).await) }
        })
        .buffer_unordered(concurrency)
        .collect::<Vec<_>>()
        .await;

    let mut report = CrawlReport::default();
    for (label, outcome) in outcomes {
        let reason = match outcome {
            Ok(Ok(crawl)) => {
                report.seeds.push(crawl.into());
                continue;
            }
            Ok(Err(CrawlError::WorkerFailed { reason, .. })) => reason,
            Ok(Err(e)) => e.to_string(),
            Err(e) => join_reason(e),
        };
        let failure = WorkerFailure { label, reason };
        log::error!("{}", CrawlError::from(failure.clone()));
        report.failures.push(failure);
    }

    report.seeds.sort_by(|a, b| a.seed.label.cmp(&b.seed.label));
    report.failures.sort_by(|a, b| a.label.cmp(&b.label));
    log::info!(
        "Crawled {} seeds, {} failed",
        report.seeds.len(),
        report.failures.len()
    );
    report
}

fn join_reason(e: JoinError) -> String {
    if e.is_cancelled() {
        return String::from("cancelled");
    }
    panic_message(e.into_panic())
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        format!("panicked: {s}")
    } else if let Some(s) = payload.downcast_ref::<String>() {
        format!("panicked: {s}")
    } else {
        String::from("panicked")
    }
}

/// What a single URL looks like to the crawler, without following anything.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Probe {
    pub url: String,
    pub status: Option<u16>,
    pub content_type: Option<String>,
    pub error: Option<String>,
    pub robots_allowed: bool,
    pub metadata: DocumentMetadata,
}

/// Fetches and extracts one URL. With [`Method::Head`] only status, content type
/// and kind are filled in. A URL refused by the robots rules is not requested.
pub async fn probe(
    config: &CrawlerConfig,
    fetcher: Arc<dyn Fetch>,
    url: &str,
    method: Method,
) -> Probe {
    let robots = RobotsGate::new(fetcher.clone(), config.user_agent.clone());
    if !robots.allowed(url).await {
        log::warn!("{}", CrawlError::RobotsDisallowed { url: url.into() });
        return Probe {
            url: url.to_string(),
            status: None,
            content_type: None,
            error: Some(ROBOTS_DISALLOW.into()),
            robots_allowed: false,
            metadata: DocumentMetadata::empty(DocKind::Error),
        };
    }

    let mut res = fetcher.fetch(url, method).await;
    let metadata = if let Some(failure) = res.failure(url) {
        log::warn!("{failure}");
        DocumentMetadata::empty(DocKind::Error)
    } else {
        let kind = classify(res.content_type.as_deref(), url);
        match (method, res.body.take()) {
            (Method::Get, Some(body)) => Extractor::for_kind(kind, config)
                .parse_owned(body)
                .await
                .unwrap_or_else(|e| {
                    log::warn!("Skipping parse of {url} got: {e}");
                    DocumentMetadata::empty(kind)
                }),
            _ => DocumentMetadata::empty(kind),
        }
    };

    Probe {
        url: url.to_string(),
        status: res.status,
        content_type: res.content_type,
        error: res.error,
        robots_allowed: true,
        metadata,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn panic_payloads() {
        assert_eq!(panic_message(Box::new("boom")), "panicked: boom");
        assert_eq!(panic_message(Box::new(String::from("bang"))), "panicked: bang");
        assert_eq!(panic_message(Box::new(42_u8)), "panicked");
    }
}
