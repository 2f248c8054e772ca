use lazy_static::lazy_static;
use sxd_document::{dom, parser};
use sxd_xpath::{Context, Factory, Value};

use super::{join_text, truncate_chars, DocumentMetadata, BODY_MAX_CHARS, TITLE_MAX_CHARS};
use crate::classify::DocKind;
use crate::error::CrawlError;
use crate::years::extract_years;

lazy_static! {
    static ref XP_FACTORY: Factory = Factory::new();
}

// Feeds rarely carry navigation worth crawling, links are not collected
pub(super) fn parse(body: &[u8]) -> Result<DocumentMetadata, CrawlError> {
    let xml = String::from_utf8_lossy(body);
    let package = parser::parse(xml.trim_start_matches('\u{feff}'))
        .map_err(|e| CrawlError::parse(DocKind::Xml, e))?;
    let document = package.as_document();
    let root = document.root();

    let title = evaluate(root, "//*[local-name()='title']")?
        .first()
        .map(|t| truncate_chars(t.trim(), TITLE_MAX_CHARS))
        .unwrap_or_default();

    let text = join_text(evaluate(root, "//text()")?);
    let text = truncate_chars(&text, BODY_MAX_CHARS);

    let years = extract_years(&format!("{title} {text}"));

    Ok(DocumentMetadata {
        doc_kind: DocKind::Xml,
        title,
        text_len: text.chars().count(),
        years,
        links: vec![],
    })
}

// String values of the matched nodes, in document order
fn evaluate(root: dom::Root, xpath: &str) -> Result<Vec<String>, CrawlError> {
    let xpath = XP_FACTORY
        .build(xpath)
        .map_err(|e| CrawlError::parse(DocKind::Xml, e))?
        .ok_or_else(|| CrawlError::parse(DocKind::Xml, "Missing XPath"))?;

    let value = xpath
        .evaluate(&Context::new(), root)
        .map_err(|e| CrawlError::parse(DocKind::Xml, e))?;

    match value {
        Value::Nodeset(nodes) => Ok(nodes
            .document_order()
            .into_iter()
            .map(|node| node.string_value())
            .collect()),
        _ => Ok(vec![]),
    }
}
