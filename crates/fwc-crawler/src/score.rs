use lazy_static::lazy_static;
use regex::Regex;

use crate::config::ScoringVocabulary;

lazy_static! {
    static ref YEAR_IN_URL: Regex = Regex::new(r"20[0-9]{2}").unwrap();
}

const KEYWORD_WEIGHT: u32 = 3;
const URL_HINT_WEIGHT: u32 = 2;
const URL_YEAR_WEIGHT: u32 = 1;
const ARCHIVE_WEIGHT: u32 = 2;

/// Ranks discovered links, higher scores are crawled first.
///
/// Scoring is deterministic for a given vocabulary: +3 per topic keyword occurrence
/// in the anchor text, +2 per URL hint occurrence in the lower-cased URL, +1 when
/// the URL carries a `20xx` token and +2 when either side points to a back-catalog.
#[derive(Debug, Clone)]
pub struct PriorityScorer {
    keywords: Option<Regex>,
    url_hints: Option<Regex>,
    archive_url_markers: Vec<String>,
    archive_anchor_markers: Vec<String>,
}

impl PriorityScorer {
    pub fn new(vocabulary: &ScoringVocabulary) -> Self {
        Self {
            keywords: occurrence_matcher(&vocabulary.keywords),
            url_hints: occurrence_matcher(
                &vocabulary
                    .url_hints
                    .iter()
                    .map(|h| h.to_lowercase())
                    .collect::<Vec<_>>(),
            ),
            archive_url_markers: vocabulary
                .archive_url_markers
                .iter()
                .filter(|m| !m.is_empty())
                .map(|m| m.to_lowercase())
                .collect(),
            archive_anchor_markers: vocabulary
                .archive_anchor_markers
                .iter()
                .filter(|m| !m.is_empty())
                .cloned()
                .collect(),
        }
    }

    pub fn score(&self, anchor_text: &str, url: &str) -> u32 {
        let url = url.to_lowercase();

        let mut score = KEYWORD_WEIGHT * occurrences(self.keywords.as_ref(), anchor_text);
        score += URL_HINT_WEIGHT * occurrences(self.url_hints.as_ref(), &url);
        if YEAR_IN_URL.is_match(&url) {
            score += URL_YEAR_WEIGHT;
        }
        if self.archive_url_markers.iter().any(|m| url.contains(m.as_str()))
            || self
                .archive_anchor_markers
                .iter()
                .any(|m| anchor_text.contains(m.as_str()))
        {
            score += ARCHIVE_WEIGHT;
        }
        score
    }
}

impl Default for PriorityScorer {
    fn default() -> Self {
        Self::new(&ScoringVocabulary::default())
    }
}

// Longest terms first so that overlapping terms count once per occurrence
fn occurrence_matcher(terms: &[String]) -> Option<Regex> {
    let mut terms: Vec<&str> = terms
        .iter()
        .map(String::as_str)
        .filter(|t| !t.is_empty())
        .collect();
    if terms.is_empty() {
        return None;
    }
    terms.sort_by(|a, b| b.chars().count().cmp(&a.chars().count()).then(a.cmp(b)));
    terms.dedup();
    let pattern = terms
        .into_iter()
        .map(regex::escape)
        .collect::<Vec<_>>()
        .join("|");
    Regex::new(&pattern)
        .map_err(|e| log::error!("Couldn't build matcher from vocabulary got: {e}"))
        .ok()
}

fn occurrences(matcher: Option<&Regex>, haystack: &str) -> u32 {
    matcher.map_or(0, |re| re.find_iter(haystack).count() as u32)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_keyword_anchor() {
        let scorer = PriorityScorer::default();
        assert_eq!(scorer.score("発生予察情報", "http://x.example/info.html"), 3);
        assert_eq!(scorer.score("お知らせ", "http://x.example/info.html"), 0);
    }

    #[test]
    fn repeated_keywords_count_per_occurrence() {
        let scorer = PriorityScorer::default();
        assert_eq!(scorer.score("注意報・警報", "http://x.example/a"), 6);
        assert_eq!(scorer.score("注意報 注意報", "http://x.example/a"), 6);
    }

    #[test]
    fn url_components() {
        let scorer = PriorityScorer::default();
        assert_eq!(scorer.score("", "http://x.example/Yosatsu/index.html"), 2);
        assert_eq!(scorer.score("", "http://x.example/r6/2024.html"), 1);
        assert_eq!(scorer.score("", "http://x.example/backnumber/"), 2);
        assert_eq!(
            scorer.score("", "http://x.example/byogaichu/yohou/2023/back.html"),
            2 + 2 + 1 + 2
        );
    }

    #[test]
    fn archive_anchor_adds_keyword_and_archive_bonus() {
        let scorer = PriorityScorer::default();
        assert_eq!(scorer.score("バックナンバー", "http://x.example/list"), 3 + 2);
    }

    #[test]
    fn empty_vocabulary() {
        let scorer = PriorityScorer::new(&ScoringVocabulary {
            keywords: vec![],
            url_hints: vec![String::new()],
            archive_url_markers: vec![],
            archive_anchor_markers: vec![],
        });
        assert_eq!(scorer.score("発生予察", "http://x.example/yosatsu/2024"), 1);
    }

    #[test]
    fn deterministic() {
        let scorer = PriorityScorer::default();
        let a = scorer.score("病害虫発生予察 令和6年", "http://x.example/gaichu/2024/");
        let b = scorer.score("病害虫発生予察 令和6年", "http://x.example/gaichu/2024/");
        assert_eq!(a, b);
    }
}
