use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::classify::DocKind;
use crate::record::CrawlRecord;

/// PDFs with more extracted characters than this count as text-bearing.
pub const PDF_TEXT_THRESHOLD: usize = 50;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeedSummary {
    pub seed_label: String,
    pub pages_scanned: usize,
    pub earliest_year: Option<i32>,
    pub latest_year: Option<i32>,
    pub coverage_years: i32,
    pub counts_by_kind: BTreeMap<DocKind, usize>,
    pub pdf_text_ratio: f64,
    pub machine_readable_hits: usize,
    pub sections: BTreeMap<String, usize>,
}

impl SeedSummary {
    pub fn count(&self, kind: DocKind) -> usize {
        self.counts_by_kind.get(&kind).copied().unwrap_or(0)
    }
}

pub fn summarize(seed_label: &str, records: &[CrawlRecord]) -> SeedSummary {
    let mut counts_by_kind = BTreeMap::new();
    let mut sections = BTreeMap::new();
    for r in records {
        *counts_by_kind.entry(r.doc_kind).or_insert(0) += 1;
        *sections.entry(r.section.clone()).or_insert(0) += 1;
    }

    let years = records.iter().flat_map(|r| r.years.iter().copied());
    let earliest_year = years.clone().min();
    let latest_year = years.max();
    let coverage_years = match (earliest_year, latest_year) {
        (Some(earliest), Some(latest)) => latest - earliest + 1,
        _ => 0,
    };

    let pdfs = records.iter().filter(|r| r.doc_kind == DocKind::Pdf);
    let pdf_total = pdfs.clone().count();
    let pdf_texty = pdfs.filter(|r| r.text_len > PDF_TEXT_THRESHOLD).count();
    let pdf_text_ratio = if pdf_total == 0 {
        0.0
    } else {
        round2(pdf_texty as f64 / pdf_total as f64)
    };

    let machine_readable_hits = counts_by_kind
        .iter()
        .filter(|(kind, _)| kind.is_machine_readable())
        .map(|(_, n)| n)
        .sum();

    SeedSummary {
        seed_label: seed_label.to_string(),
        pages_scanned: records.len(),
        earliest_year,
        latest_year,
        coverage_years,
        counts_by_kind,
        pdf_text_ratio,
        machine_readable_hits,
        sections,
    }
}

fn round2(x: f64) -> f64 {
    (x * 100.).round() / 100.
}
