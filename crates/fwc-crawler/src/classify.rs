use std::fmt;

use serde::{Deserialize, Serialize};
use url::Url;

/// Coarse content classification driving the extraction strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocKind {
    Html,
    Xml,
    Pdf,
    Csv,
    Json,
    Spreadsheet,
    Other,
    /// Failed or refused fetch, never produced by [`classify`]
    Error,
}

impl DocKind {
    pub const ALL: [DocKind; 8] = [
        Self::Html,
        Self::Xml,
        Self::Pdf,
        Self::Csv,
        Self::Json,
        Self::Spreadsheet,
        Self::Other,
        Self::Error,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Html => "html",
            Self::Xml => "xml",
            Self::Pdf => "pdf",
            Self::Csv => "csv",
            Self::Json => "json",
            Self::Spreadsheet => "spreadsheet",
            Self::Other => "other",
            Self::Error => "error",
        }
    }

    /// Kinds whose outbound links feed the frontier.
    pub fn is_followable(&self) -> bool {
        matches!(self, Self::Html | Self::Xml)
    }

    /// Kinds counted as machine readable publications.
    pub fn is_machine_readable(&self) -> bool {
        matches!(self, Self::Xml | Self::Csv | Self::Json | Self::Spreadsheet)
    }
}

impl fmt::Display for DocKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

const SPREADSHEET_SUFFIXES: [&str; 3] = [".xlsx", ".xls", ".xlsm"];
const HTML_SUFFIXES: [&str; 3] = [".html", ".htm", "/"];

/// Maps a response content type and its URL to a [`DocKind`].
///
/// Checks run in a fixed order since a URL may satisfy several suffix rules:
/// pdf, xml, csv/json/spreadsheet (suffix only), html, then other.
pub fn classify(content_type: Option<&str>, url: &str) -> DocKind {
    let ct = content_type.unwrap_or_default().to_lowercase();
    let path = url_path(url);
    let path = path.as_str();

    if ct.contains("pdf") || path.ends_with(".pdf") {
        DocKind::Pdf
    } else if ct.contains("xml") || path.ends_with(".xml") {
        DocKind::Xml
    } else if path.ends_with(".csv") {
        DocKind::Csv
    } else if path.ends_with(".json") {
        DocKind::Json
    } else if SPREADSHEET_SUFFIXES.iter().any(|s| path.ends_with(s)) {
        DocKind::Spreadsheet
    } else if ct.contains("html") || HTML_SUFFIXES.iter().any(|s| path.ends_with(s)) {
        DocKind::Html
    } else {
        DocKind::Other
    }
}

// Lower-cased path, query and fragment don't take part in suffix rules
fn url_path(url: &str) -> String {
    match Url::parse(url) {
        Ok(parsed) => parsed.path().to_lowercase(),
        Err(_) => url.to_lowercase(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn content_type_wins() {
        assert_eq!(
            classify(Some("application/pdf"), "http://a.example/doc"),
            DocKind::Pdf
        );
        assert_eq!(
            classify(Some("text/html; charset=utf-8"), "http://a.example/doc"),
            DocKind::Html
        );
        assert_eq!(
            classify(Some("application/rss+xml"), "http://a.example/feed"),
            DocKind::Xml
        );
    }

    #[test]
    fn pdf_and_xml_take_precedence_over_html() {
        assert_eq!(
            classify(Some("text/html"), "http://a.example/r6/report.pdf"),
            DocKind::Pdf
        );
        assert_eq!(
            classify(Some("application/xhtml+xml"), "http://a.example/"),
            DocKind::Xml
        );
        assert_eq!(
            classify(Some("text/html"), "http://a.example/data.csv"),
            DocKind::Csv
        );
    }

    #[test]
    fn suffix_rules() {
        assert_eq!(classify(None, "http://a.example/x.JSON"), DocKind::Json);
        assert_eq!(classify(None, "http://a.example/x.xlsm"), DocKind::Spreadsheet);
        assert_eq!(classify(None, "http://a.example/x.xls"), DocKind::Spreadsheet);
        assert_eq!(classify(None, "http://a.example/index.htm"), DocKind::Html);
        assert_eq!(classify(None, "http://a.example/dir/"), DocKind::Html);
        assert_eq!(classify(None, "http://a.example"), DocKind::Html);
        assert_eq!(classify(None, "http://a.example/x.docx"), DocKind::Other);
        assert_eq!(classify(None, "http://a.example/x.pdf?dl=1"), DocKind::Pdf);
    }

    #[test]
    fn follow_and_machine_readable_sets() {
        let follow: Vec<_> = DocKind::ALL.iter().filter(|k| k.is_followable()).collect();
        assert_eq!(follow, vec![&DocKind::Html, &DocKind::Xml]);
        assert!(DocKind::Spreadsheet.is_machine_readable());
        assert!(!DocKind::Pdf.is_machine_readable());
        assert_eq!(DocKind::Spreadsheet.to_string(), "spreadsheet");
    }
}
