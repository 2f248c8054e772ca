use std::sync::Arc;

use url::Url;

use crate::classify::{classify, DocKind};
use crate::config::CrawlerConfig;
use crate::error::CrawlError;
use crate::extract::{DocumentMetadata, Extractor};
use crate::fetch::{Fetch, Method};
use crate::frontier::{Frontier, FrontierEntry};
use crate::record::{filename_of, section_key, CrawlRecord, PdfLink, Seed};
use crate::robots::{RobotsGate, ROBOTS_DISALLOW};
use crate::score::PriorityScorer;
use crate::years::{distinct_years_desc, extract_years};

const SEED_PRIORITY: u32 = 10;
const SECTION_LEVELS: usize = 2;

/// Everything a worker gathered for one seed.
#[derive(Debug, Clone)]
pub struct SeedCrawl {
    pub seed: Seed,
    pub records: Vec<CrawlRecord>,
    pub pdf_links: Vec<PdfLink>,
}

/// Drives one seed's frontier to completion, one request at a time.
pub struct CrawlWorker {
    seed: Seed,
    config: Arc<CrawlerConfig>,
    fetcher: Arc<dyn Fetch>,
    robots: Arc<RobotsGate>,
    scorer: Arc<PriorityScorer>,
}

impl CrawlWorker {
    pub fn new(
        seed: Seed,
        config: Arc<CrawlerConfig>,
        fetcher: Arc<dyn Fetch>,
        robots: Arc<RobotsGate>,
        scorer: Arc<PriorityScorer>,
    ) -> Self {
        Self {
            seed,
            config,
            fetcher,
            robots,
            scorer,
        }
    }

    pub async fn run(self) -> Result<SeedCrawl, CrawlError> {
        let label = self.seed.label.clone();
        let start = parse_seed(&self.seed)?;
        let max_pages = self.config.max_pages;
        let max_depth = self.config.max_depth;

        log::info!(
            "[{label}] START url={start} depth<={max_depth} pages<={max_pages}"
        );

        let mut frontier = Frontier::new();
        frontier.push(FrontierEntry {
            url: start.to_string(),
            depth: 0,
            parent_url: None,
            priority: SEED_PRIORITY,
        });

        let mut records = vec![];
        let mut pdf_links = vec![];

        while !frontier.is_empty() && frontier.visited_len() < max_pages {
            let Some(entry) = frontier.pop_unvisited() else {
                break;
            };
            log::info!(
                "[{label}] [{}/{}] GET depth={} url={}",
                frontier.visited_len(),
                frontier.visited_len() + frontier.pending(),
                entry.depth,
                entry.url
            );

            let delay = self.config.delay();
            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }

            let (record, meta) = self.visit(&entry).await;

            if meta.doc_kind == DocKind::Html {
                pdf_links.extend(self.pdf_links(&start, &entry, &meta));
            }
            if entry.depth < max_depth && meta.doc_kind.is_followable() {
                self.enqueue_links(&mut frontier, &start, &entry, &meta);
            }
            records.push(record);
        }

        log::info!(
            "[{label}] DONE pages={} pdfs={} visited={} queued={}",
            records.len(),
            pdf_links.len(),
            frontier.visited_len(),
            frontier.pending()
        );

        Ok(SeedCrawl {
            seed: self.seed,
            records,
            pdf_links,
        })
    }

    async fn visit(&self, entry: &FrontierEntry) -> (CrawlRecord, DocumentMetadata) {
        let url = entry.url.as_str();
        let label = &self.seed.label;

        if !self.robots.allowed(url).await {
            log::info!("[{label}] {}", CrawlError::RobotsDisallowed { url: url.into() });
            let record = self.record(entry, None, None, &DocumentMetadata::empty(DocKind::Error));
            return (
                CrawlRecord {
                    error: Some(ROBOTS_DISALLOW.into()),
                    ..record
                },
                DocumentMetadata::empty(DocKind::Error),
            );
        }

        let mut res = self.fetcher.fetch(url, Method::Get).await;
        log::info!(
            "[{label}]  -> status={} ct={} bytes={} err={}",
            res.status.map(|s| s.to_string()).unwrap_or_default(),
            res.content_type.as_deref().unwrap_or_default(),
            res.body_len(),
            res.error.as_deref().unwrap_or_default()
        );

        if let Some(failure) = res.failure(url) {
            log::warn!("[{label}] {failure}");
            let meta = DocumentMetadata::empty(DocKind::Error);
            let record = self.record(entry, res.status, res.content_type, &meta);
            let error = match failure {
                CrawlError::FetchFailed { reason, .. } => reason,
                e => e.to_string(),
            };
            return (
                CrawlRecord {
                    error: Some(error),
                    ..record
                },
                meta,
            );
        }

        let kind = classify(res.content_type.as_deref(), url);
        let body = res.body.take().unwrap_or_default();
        let meta = match Extractor::for_kind(kind, &self.config).parse_owned(body).await {
            Ok(meta) => meta,
            Err(e) => {
                log::warn!("[{label}] Skipping parse of {url} got: {e}");
                DocumentMetadata::empty(kind)
            }
        };
        log::debug!(
            "[{label}]  {kind}: title='{}' years={:?} links={}",
            meta.title.chars().take(60).collect::<String>(),
            meta.years,
            meta.links.len()
        );

        let record = self.record(entry, res.status, res.content_type, &meta);
        (record, meta)
    }

    fn record(
        &self,
        entry: &FrontierEntry,
        status: Option<u16>,
        content_type: Option<String>,
        meta: &DocumentMetadata,
    ) -> CrawlRecord {
        CrawlRecord {
            url: entry.url.clone(),
            depth: entry.depth,
            parent_url: entry.parent_url.clone(),
            status,
            content_type,
            doc_kind: meta.doc_kind,
            title: meta.title.clone(),
            years: meta.years.clone(),
            text_len: meta.text_len,
            section: section_key(&entry.url, SECTION_LEVELS),
            error: None,
        }
    }

    fn enqueue_links(
        &self,
        frontier: &mut Frontier,
        start: &Url,
        entry: &FrontierEntry,
        meta: &DocumentMetadata,
    ) {
        for (url, anchor_text) in self.crawlable_links(start, entry, meta) {
            if frontier.is_visited(&url) {
                continue;
            }
            let priority = self.scorer.score(anchor_text, &url);
            log::debug!(
                "[{}]    [link] -> depth={} prio={priority} {url}",
                self.seed.label,
                entry.depth + 1
            );
            frontier.push(FrontierEntry {
                url,
                depth: entry.depth + 1,
                parent_url: Some(entry.url.clone()),
                priority,
            });
        }
    }

    fn pdf_links(&self, start: &Url, entry: &FrontierEntry, meta: &DocumentMetadata) -> Vec<PdfLink> {
        self.crawlable_links(start, entry, meta)
            .filter(|(url, _)| url.to_lowercase().ends_with(".pdf"))
            .map(|(pdf_url, anchor_text)| {
                let years =
                    extract_years(&format!("{anchor_text} {} {pdf_url}", meta.title));
                PdfLink {
                    source_page: entry.url.clone(),
                    depth: entry.depth,
                    filename: filename_of(&pdf_url),
                    anchor_text: anchor_text.to_string(),
                    years: distinct_years_desc(&years),
                    pdf_url,
                }
            })
            .collect()
    }

    // Absolute http(s) same-domain links with their anchor text
    fn crawlable_links<'a>(
        &'a self,
        start: &'a Url,
        entry: &FrontierEntry,
        meta: &'a DocumentMetadata,
    ) -> impl Iterator<Item = (String, &'a str)> + 'a {
        let base = Url::parse(&entry.url).ok();
        meta.links.iter().filter_map(move |link| {
            let url = resolve(base.as_ref()?, &link.href)?;
            if !same_domain(start, &url, &self.config.shared_domain_suffixes) {
                return None;
            }
            Some((url.to_string(), link.anchor_text.as_str()))
        })
    }
}

fn parse_seed(seed: &Seed) -> Result<Url, CrawlError> {
    let failed = |reason: String| CrawlError::WorkerFailed {
        label: seed.label.clone(),
        reason,
    };
    let mut url = Url::parse(seed.start_url.trim())
        .map_err(|e| failed(format!("invalid start url {}: {e}", seed.start_url)))?;
    if !is_http(&url) {
        return Err(failed(format!("unsupported start url {}", seed.start_url)));
    }
    url.set_fragment(None);
    Ok(url)
}

/// Resolves `href` against `base`, keeping only http(s) URLs, fragment removed.
pub fn resolve(base: &Url, href: &str) -> Option<Url> {
    let mut url = base.join(href.trim()).ok()?;
    if !is_http(&url) {
        return None;
    }
    url.set_fragment(None);
    Some(url)
}

/// Same host, or both hosts under one of the shared suffixes. Ports are ignored.
pub fn same_domain(seed: &Url, link: &Url, shared_suffixes: &[String]) -> bool {
    match (seed.host_str(), link.host_str()) {
        (Some(a), Some(b)) => {
            a == b
                || shared_suffixes
                    .iter()
                    .filter(|s| !s.is_empty())
                    .any(|s| a.ends_with(s.as_str()) && b.ends_with(s.as_str()))
        }
        _ => false,
    }
}

fn is_http(url: &Url) -> bool {
    matches!(url.scheme(), "http" | "https")
}
