use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime};
use lazy_static::lazy_static;
use regex::Regex;
use sws_scraper::{ElementRef, Html, Selector};

use super::{join_text, truncate_chars, DocumentMetadata, Link, BODY_MAX_CHARS, TITLE_MAX_CHARS};
use crate::classify::DocKind;
use crate::error::CrawlError;
use crate::years::{current_year, extract_years, MIN_YEAR};

lazy_static! {
    static ref LOOSE_YEAR: Regex = Regex::new(r"(?:19|20)[0-9]{2}").unwrap();
}

/// Where a page's publication year is looked up, in order. The first source
/// yielding something wins.
#[derive(Debug, Clone, Copy)]
enum DateSource {
    Attribute {
        css: &'static str,
        attr: &'static str,
    },
    TextHeuristic,
}

const DATE_SOURCES: [DateSource; 4] = [
    DateSource::Attribute {
        css: r#"meta[property="article:published_time"]"#,
        attr: "content",
    },
    DateSource::Attribute {
        css: r#"meta[property="og:updated_time"]"#,
        attr: "content",
    },
    DateSource::Attribute {
        css: "time[datetime]",
        attr: "datetime",
    },
    DateSource::TextHeuristic,
];

impl DateSource {
    fn resolve(&self, doc: &Html, text: &str) -> Result<Option<Vec<i32>>, CrawlError> {
        match self {
            Self::Attribute { css, attr } => {
                let value = doc
                    .select(selector(css)?)
                    .next()
                    .and_then(|elem| attr_of(&elem, attr));
                Ok(value.and_then(|v| meta_year(&v)).map(|y| vec![y]))
            }
            Self::TextHeuristic => Ok(Some(extract_years(text))),
        }
    }
}

pub(super) fn parse(body: &[u8]) -> Result<DocumentMetadata, CrawlError> {
    let page = String::from_utf8_lossy(body);
    let doc = Html::parse_document(&page);

    let title = doc
        .select(selector("title")?)
        .next()
        .map(|t| truncate_chars(&text_of(&t), TITLE_MAX_CHARS))
        .unwrap_or_default();

    let text = join_text(doc.select(selector("h1,h2,h3,p,li")?).map(|e| text_of(&e)));
    let text = truncate_chars(&text, BODY_MAX_CHARS);

    let heuristic_input = format!("{title} {text}");
    let mut years = None;
    for source in DATE_SOURCES {
        if let Some(found) = source.resolve(&doc, &heuristic_input)? {
            years = Some(found);
            break;
        }
    }

    let links = doc
        .select(selector("a[href]")?)
        .filter_map(|a| {
            attr_of(&a, "href").map(|href| Link {
                href,
                anchor_text: text_of(&a),
            })
        })
        .collect();

    Ok(DocumentMetadata {
        doc_kind: DocKind::Html,
        title,
        text_len: text.chars().count(),
        years: years.unwrap_or_default(),
        links,
    })
}

fn selector(css: &str) -> Result<Selector, CrawlError> {
    Selector::parse(css).map_err(|e| CrawlError::parse(DocKind::Html, format!("{css}: {e:?}")))
}

fn attr_of(elem: &ElementRef, attr: &str) -> Option<String> {
    elem.map_value(|v| v.attr(attr).map(str::to_string))
        .flatten()
        .filter(|v| !v.trim().is_empty())
}

fn text_of(elem: &ElementRef) -> String {
    join_text(elem.text())
}

fn meta_year(value: &str) -> Option<i32> {
    let value = value.trim();
    DateTime::parse_from_rfc3339(value)
        .map(|d| d.year())
        .or_else(|_| NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S").map(|d| d.year()))
        .or_else(|_| NaiveDate::parse_from_str(value, "%Y-%m-%d").map(|d| d.year()))
        .ok()
        .or_else(|| LOOSE_YEAR.find(value).and_then(|m| m.as_str().parse().ok()))
        .filter(|y| (MIN_YEAR..=current_year()).contains(y))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn title_body_and_links() {
        let page = r#"<html><head><title>  病害虫発生予察情報  </title></head>
            <body>
              <h1>令和5年度 発生予察</h1>
              <p>第3号 2022年 発表</p>
              <div>2021 ignored outside text elements</div>
              <a href="/r5/index.html">令和5年度 <b>予報</b></a>
              <a href="mailto:info@x.example">mail</a>
              <a name="anchor">no href</a>
            </body></html>"#;
        let meta = parse(page.as_bytes()).unwrap();

        assert_eq!(meta.doc_kind, DocKind::Html);
        assert_eq!(meta.title, "病害虫発生予察情報");
        assert_eq!(meta.years, vec![2023, 2022]);
        assert_eq!(
            meta.links,
            vec![
                Link {
                    href: "/r5/index.html".into(),
                    anchor_text: "令和5年度 予報".into()
                },
                Link {
                    href: "mailto:info@x.example".into(),
                    anchor_text: "mail".into()
                },
            ]
        );
        assert_eq!(
            meta.text_len,
            "令和5年度 発生予察 第3号 2022年 発表".chars().count()
        );
    }

    #[test]
    fn published_meta_short_circuits_text() {
        let page = r#"<html><head>
            <meta property="article:published_time" content="2021-04-01T09:00:00+09:00">
            <meta property="og:updated_time" content="2023-01-01">
            </head><body><p>令和5年 2022年</p></body></html>"#;
        assert_eq!(parse(page.as_bytes()).unwrap().years, vec![2021]);
    }

    #[test]
    fn later_sources_in_order() {
        let page = r#"<html><head><meta property="og:updated_time" content="2020-06-30">
            </head><body><time datetime="2019-01-01">x</time><p>2022</p></body></html>"#;
        assert_eq!(parse(page.as_bytes()).unwrap().years, vec![2020]);

        let page = r#"<html><body><time datetime="2019/01/01 10:00">x</time><p>2022</p></body></html>"#;
        assert_eq!(parse(page.as_bytes()).unwrap().years, vec![2019]);
    }

    #[test]
    fn unusable_meta_falls_back_to_heuristic() {
        let page = r#"<html><head><meta property="article:published_time" content="unknown">
            </head><body><p>2022年3月</p></body></html>"#;
        assert_eq!(parse(page.as_bytes()).unwrap().years, vec![2022]);
    }

    #[test]
    fn long_title_is_truncated() {
        let page = format!("<title>{}</title>", "あ".repeat(300));
        let meta = parse(page.as_bytes()).unwrap();
        assert_eq!(meta.title.chars().count(), TITLE_MAX_CHARS);
    }

    #[test]
    fn meta_year_formats() {
        assert_eq!(meta_year("2021-04-01T09:00:00+09:00"), Some(2021));
        assert_eq!(meta_year("2021-04-01T09:00:00"), Some(2021));
        assert_eq!(meta_year(" 2020-12-31 "), Some(2020));
        assert_eq!(meta_year("April 2, 2018"), Some(2018));
        assert_eq!(meta_year("1985-01-01"), None);
        assert_eq!(meta_year("3024-01-01"), None);
    }
}
