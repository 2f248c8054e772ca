mod aggregate;
mod classify;
mod config;
mod crawler;
mod error;
mod extract;
mod fetch;
mod frontier;
mod record;
mod robots;
mod score;
mod worker;
pub mod years;

pub use aggregate::{summarize, SeedSummary, PDF_TEXT_THRESHOLD};
pub use classify::{classify, DocKind};
pub use config::{CrawlerConfig, ScoringVocabulary};
pub use crawler::{
    crawl_seeds, crawl_seeds_with, probe, CrawlReport, Probe, SeedReport, WorkerFailure,
};
pub use error::CrawlError;
pub use extract::{DocumentMetadata, Extractor, Link};
pub use fetch::{Fetch, FetchResult, HttpFetcher, Method};
pub use frontier::{Frontier, FrontierEntry};
pub use record::{filename_of, section_key, CrawlRecord, PdfLink, Seed};
pub use robots::{RobotsGate, ROBOTS_DISALLOW};
pub use score::PriorityScorer;
pub use worker::{resolve, same_domain, CrawlWorker, SeedCrawl};
