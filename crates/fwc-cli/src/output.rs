use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Context;
use fwc_crawler::{CrawlRecord, DocKind, PdfLink, Seed, SeedReport, SeedSummary};
use serde::{Deserialize, Serialize};

/// One row of the seed file. Older files name the columns `prefecture,start_url`.
#[derive(Debug, Deserialize)]
struct SeedRow {
    #[serde(alias = "prefecture")]
    label: String,
    #[serde(alias = "start_url")]
    url: String,
}

pub fn read_seeds(path: &Path) -> anyhow::Result<Vec<Seed>> {
    let mut rdr = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .flexible(true)
        .from_path(path)
        .with_context(|| format!("Couldn't open seeds {}", path.display()))?;

    let mut seeds = vec![];
    for row in rdr.deserialize::<SeedRow>() {
        let row = row.with_context(|| format!("Couldn't read seeds {}", path.display()))?;
        if row.label.is_empty() || row.url.is_empty() {
            log::warn!("Skipping seed row with empty label or url: {row:?}");
            continue;
        }
        seeds.push(Seed::new(row.label, row.url));
    }
    Ok(seeds)
}

/// Replaces characters that are not allowed in file names.
pub fn safe_name(label: &str) -> String {
    label
        .chars()
        .map(|c| match c {
            '\\' | '/' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c => c,
        })
        .collect()
}

fn join_years(years: &[i32]) -> String {
    years
        .iter()
        .map(i32::to_string)
        .collect::<Vec<_>>()
        .join("|")
}

#[derive(Debug, Serialize)]
struct InventoryRow<'a> {
    seed_label: &'a str,
    url: &'a str,
    depth: usize,
    parent_url: Option<&'a str>,
    status: Option<u16>,
    content_type: Option<&'a str>,
    doc_kind: DocKind,
    title: &'a str,
    years: String,
    text_len: usize,
    section: &'a str,
    error: Option<&'a str>,
}

impl<'a> InventoryRow<'a> {
    fn new(seed_label: &'a str, r: &'a CrawlRecord) -> Self {
        Self {
            seed_label,
            url: &r.url,
            depth: r.depth,
            parent_url: r.parent_url.as_deref(),
            status: r.status,
            content_type: r.content_type.as_deref(),
            doc_kind: r.doc_kind,
            title: &r.title,
            years: join_years(&r.years),
            text_len: r.text_len,
            section: &r.section,
            error: r.error.as_deref(),
        }
    }
}

#[derive(Debug, Serialize)]
struct PdfRow<'a> {
    seed_label: &'a str,
    source_page: &'a str,
    depth: usize,
    pdf_url: &'a str,
    anchor_text: &'a str,
    filename: &'a str,
    years: String,
}

impl<'a> PdfRow<'a> {
    fn new(seed_label: &'a str, p: &'a PdfLink) -> Self {
        Self {
            seed_label,
            source_page: &p.source_page,
            depth: p.depth,
            pdf_url: &p.pdf_url,
            anchor_text: &p.anchor_text,
            filename: &p.filename,
            years: join_years(&p.years),
        }
    }
}

#[derive(Debug, Serialize)]
struct SectionRow<'a> {
    seed_label: &'a str,
    section: &'a str,
    pages: usize,
}

/// Writes the per seed tables, returns the written paths.
pub fn write_seed(dir: &Path, report: &SeedReport) -> anyhow::Result<Vec<PathBuf>> {
    let label = report.seed.label.as_str();
    let stem = safe_name(label);

    let inventory = dir.join(format!("{stem}.inventory.csv"));
    write_rows(
        &inventory,
        report.records.iter().map(|r| InventoryRow::new(label, r)),
    )?;

    let pdfs = dir.join(format!("{stem}.pdfs.csv"));
    write_rows(&pdfs, report.pdf_links.iter().map(|p| PdfRow::new(label, p)))?;

    let sections = dir.join(format!("{stem}.sections.csv"));
    write_rows(
        &sections,
        report
            .summary
            .sections
            .iter()
            .map(|(section, &pages)| SectionRow {
                seed_label: label,
                section,
                pages,
            }),
    )?;

    Ok(vec![inventory, pdfs, sections])
}

fn write_rows<I, T>(path: &Path, rows: I) -> anyhow::Result<()>
where
    I: IntoIterator<Item = T>,
    T: Serialize,
{
    let mut wtr = csv::Writer::from_path(path)
        .with_context(|| format!("Couldn't create {}", path.display()))?;
    for row in rows {
        wtr.serialize(row)?;
    }
    wtr.flush()?;
    Ok(())
}

const SUMMARY_COLUMNS: [&str; 7] = [
    "seed_label",
    "pages_scanned",
    "earliest_year",
    "latest_year",
    "coverage_years",
    "pdf_text_ratio",
    "machine_readable_hits",
];

/// One row per seed with a `count_<kind>` column for every kind.
pub fn write_summary<'a, I>(path: &Path, summaries: I) -> anyhow::Result<()>
where
    I: IntoIterator<Item = &'a SeedSummary>,
{
    let mut wtr = csv::Writer::from_path(path)
        .with_context(|| format!("Couldn't create {}", path.display()))?;

    let header = SUMMARY_COLUMNS
        .iter()
        .map(|c| c.to_string())
        .chain(DocKind::ALL.iter().map(|k| format!("count_{k}")));
    wtr.write_record(header)?;

    let opt = |y: Option<i32>| y.map(|y| y.to_string()).unwrap_or_default();
    for s in summaries {
        let row = [
            s.seed_label.clone(),
            s.pages_scanned.to_string(),
            opt(s.earliest_year),
            opt(s.latest_year),
            s.coverage_years.to_string(),
            format!("{:.2}", s.pdf_text_ratio),
            s.machine_readable_hits.to_string(),
        ]
        .into_iter()
        .chain(DocKind::ALL.iter().map(|&k| s.count(k).to_string()));
        wtr.write_record(row)?;
    }
    wtr.flush()?;
    Ok(())
}

pub fn create_dir(dir: &Path) -> anyhow::Result<()> {
    fs::create_dir_all(dir).with_context(|| format!("Couldn't create {}", dir.display()))
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use fwc_crawler::summarize;

    use super::*;

    fn record(url: &str, kind: DocKind, years: &[i32]) -> CrawlRecord {
        CrawlRecord {
            url: url.to_string(),
            depth: 1,
            parent_url: Some("http://x.example/".into()),
            status: Some(200),
            content_type: Some("text/html".into()),
            doc_kind: kind,
            title: "発生予察情報, 第1号".into(),
            years: years.to_vec(),
            text_len: 42,
            section: fwc_crawler::section_key(url, 2),
            error: None,
        }
    }

    #[test]
    fn file_safe_labels() {
        assert_eq!(safe_name("大阪/府:a*b?\"c\"<d>|e\\f"), "大阪_府_a_b__c__d__e_f");
        assert_eq!(safe_name("Tokyo"), "Tokyo");
    }

    #[test]
    fn seeds_accept_both_headers() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "prefecture,start_url,note").unwrap();
        writeln!(file, "大阪府, https://www.pref.osaka.lg.jp/ ,x").unwrap();
        writeln!(file, "empty,,").unwrap();
        let seeds = read_seeds(file.path()).unwrap();
        assert_eq!(
            seeds,
            vec![Seed::new("大阪府", "https://www.pref.osaka.lg.jp/")]
        );

        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "label,url").unwrap();
        writeln!(file, "X,http://x.example/a").unwrap();
        let seeds = read_seeds(file.path()).unwrap();
        assert_eq!(seeds, vec![Seed::new("X", "http://x.example/a")]);
    }

    #[test]
    fn seed_tables_are_written() {
        let dir = tempfile::tempdir().unwrap();
        let records = vec![
            record("http://x.example/r6/a/index.html", DocKind::Html, &[2024, 2023]),
            record("http://x.example/r6/a/b.csv", DocKind::Csv, &[]),
        ];
        let report = SeedReport {
            seed: Seed::new("X/Y", "http://x.example/"),
            summary: summarize("X/Y", &records),
            records,
            pdf_links: vec![],
        };

        let paths = write_seed(dir.path(), &report).unwrap();
        assert_eq!(paths[0], dir.path().join("X_Y.inventory.csv"));

        let inventory = fs::read_to_string(&paths[0]).unwrap();
        let mut lines = inventory.lines();
        assert_eq!(
            lines.next(),
            Some("seed_label,url,depth,parent_url,status,content_type,doc_kind,title,years,text_len,section,error")
        );
        assert_eq!(
            lines.next(),
            Some("X/Y,http://x.example/r6/a/index.html,1,http://x.example/,200,text/html,html,\"発生予察情報, 第1号\",2024|2023,42,r6/a,")
        );

        let sections = fs::read_to_string(&paths[2]).unwrap();
        assert_eq!(sections, "seed_label,section,pages\nX/Y,r6/a,2\n");
    }

    #[test]
    fn summary_has_a_column_per_kind() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("summary.csv");
        let summary = summarize("X", &[record("http://x.example/", DocKind::Html, &[2020])]);
        write_summary(&path, [&summary]).unwrap();

        let written = fs::read_to_string(&path).unwrap();
        let mut lines = written.lines();
        assert_eq!(
            lines.next(),
            Some("seed_label,pages_scanned,earliest_year,latest_year,coverage_years,pdf_text_ratio,machine_readable_hits,count_html,count_xml,count_pdf,count_csv,count_json,count_spreadsheet,count_other,count_error")
        );
        assert_eq!(lines.next(), Some("X,1,2020,2020,1,0.00,0,1,0,0,0,0,0,0,0"));
    }
}
