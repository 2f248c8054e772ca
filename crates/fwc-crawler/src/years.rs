//! Publication year candidates from free text.
//!
//! Recognizes era-prefixed years (`令和5年`, `平成30年度`, `令和元年`) and western
//! `20xx` tokens. Candidates in the future, outside `[MIN_YEAR, current year]`,
//! or next to forward-looking wording (plans, budgets, calls for proposals) are
//! dropped.

use std::borrow::Cow;

use chrono::Datelike;
use lazy_static::lazy_static;
use regex::Regex;

pub const MIN_YEAR: i32 = 1990;

/// Number of characters inspected on each side of a match for guard words.
pub const GUARD_RADIUS: usize = 20;

pub const GUARD_WORDS: [&str; 7] = ["計画", "予定", "案", "募集", "予算", "方針", "公募"];

lazy_static! {
    static ref YEAR_RE: Regex =
        Regex::new(r"(?:(令和|平成)\s?([0-9]+|元)年度?)|(20[0-9]{2})(?:年度?)?").unwrap();
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Era {
    /// 令和, year 1 is 2019
    Reiwa,
    /// 平成, year 1 is 1989
    Heisei,
}

impl Era {
    pub fn from_prefix(prefix: &str) -> Option<Self> {
        match prefix {
            "令和" => Some(Self::Reiwa),
            "平成" => Some(Self::Heisei),
            _ => None,
        }
    }

    pub fn offset(&self) -> i32 {
        match self {
            Self::Reiwa => 2018,
            Self::Heisei => 1988,
        }
    }
}

pub fn era_to_western(era: Era, era_year: i32) -> i32 {
    era.offset() + era_year
}

pub fn current_year() -> i32 {
    chrono::Local::now().year()
}

/// Year candidates in match order, duplicates included.
pub fn extract_years(text: &str) -> Vec<i32> {
    extract_years_until(text, current_year())
}

pub fn extract_years_until(text: &str, current_year: i32) -> Vec<i32> {
    let text = normalize(text);
    let text = text.as_ref();

    let mut years = vec![];
    for caps in YEAR_RE.captures_iter(text) {
        let Some(m) = caps.get(0) else { continue };

        let year = match (caps.get(1), caps.get(2), caps.get(3)) {
            (Some(era), Some(n), _) => {
                let Some(era) = Era::from_prefix(era.as_str()) else {
                    continue;
                };
                let era_year = match n.as_str() {
                    "元" => 1,
                    n => match n.parse::<i32>() {
                        Ok(n) => n,
                        Err(_) => continue,
                    },
                };
                era.offset().checked_add(era_year)
            }
            (_, _, Some(western)) => western.as_str().parse::<i32>().ok(),
            _ => None,
        };
        let Some(year) = year else { continue };

        if year > current_year {
            continue;
        }
        let near = window(text, m.start(), m.end(), GUARD_RADIUS);
        if GUARD_WORDS.iter().any(|w| near.contains(w)) {
            continue;
        }
        if (MIN_YEAR..=current_year).contains(&year) {
            years.push(year);
        }
    }
    years
}

/// Deduplicated years, most recent first.
pub fn distinct_years_desc(years: &[i32]) -> Vec<i32> {
    let mut years = years.to_vec();
    years.sort_unstable_by(|a, b| b.cmp(a));
    years.dedup();
    years
}

// Full-width spaces and digits to ASCII, char count is preserved
fn normalize(text: &str) -> Cow<'_, str> {
    let is_wide = |c: char| c == '\u{3000}' || ('０'..='９').contains(&c);
    if !text.chars().any(is_wide) {
        return Cow::Borrowed(text);
    }
    Cow::Owned(
        text.chars()
            .map(|c| match c {
                '\u{3000}' => ' ',
                '０'..='９' => char::from(b'0' + (c as u32 - '０' as u32) as u8),
                c => c,
            })
            .collect(),
    )
}

// Up to `radius` chars before `start`, the match, and up to `radius` chars after `end`
fn window(text: &str, start: usize, end: usize, radius: usize) -> &str {
    let from = text[..start]
        .char_indices()
        .rev()
        .take(radius)
        .last()
        .map_or(start, |(i, _)| i);
    let to = text[end..]
        .char_indices()
        .nth(radius)
        .map_or(text.len(), |(i, _)| end + i);
    &text[from..to]
}

#[cfg(test)]
mod tests {
    use super::*;

    const NOW: i32 = 2025;

    #[test]
    fn era_boundaries() {
        assert_eq!(era_to_western(Era::Reiwa, 1), 2019);
        assert_eq!(era_to_western(Era::Heisei, 1), 1989);
        assert_eq!(era_to_western(Era::Reiwa, 5), 2023);
        assert_eq!(era_to_western(Era::Heisei, 15), 2003);
    }

    #[test]
    fn era_tokens() {
        assert_eq!(extract_years_until("令和元年度 発生予察", NOW), vec![2019]);
        assert_eq!(extract_years_until("令和1年", NOW), vec![2019]);
        assert_eq!(extract_years_until("令和 5年4月", NOW), vec![2023]);
        assert_eq!(extract_years_until("平成15年度", NOW), vec![2003]);
        assert_eq!(extract_years_until("平成2年", NOW), vec![1990]);
        // 1989 is outside the accepted range
        assert!(extract_years_until("平成元年", NOW).is_empty());
    }

    #[test]
    fn western_tokens_in_match_order() {
        assert_eq!(
            extract_years_until("2021年 2019 and again 2021", NOW),
            vec![2021, 2019, 2021]
        );
    }

    #[test]
    fn full_width_input() {
        assert_eq!(extract_years_until("令和\u{3000}５年", NOW), vec![2023]);
        assert_eq!(extract_years_until("２０２４年", NOW), vec![2024]);
    }

    #[test]
    fn future_years_are_dropped() {
        assert!(extract_years_until("2030年", NOW).is_empty());
        assert!(extract_years_until("令和9年", NOW).is_empty());
        assert_eq!(extract_years_until("2025", NOW), vec![2025]);
    }

    #[test]
    fn guard_words_within_radius() {
        assert!(extract_years_until("令和6年度 予算", NOW).is_empty());
        assert!(extract_years_until("事業計画 2024", NOW).is_empty());
        let far = format!("2024{}計画", "あ".repeat(GUARD_RADIUS));
        assert_eq!(extract_years_until(&far, NOW), vec![2024]);
        let near = format!("2024{}計画", "あ".repeat(GUARD_RADIUS - 2));
        assert!(extract_years_until(&near, NOW).is_empty());
    }

    #[test]
    fn current_year_bound() {
        let now = current_year();
        for y in extract_years(&format!("{} {} 平成10年", now, now + 1)) {
            assert!((MIN_YEAR..=now).contains(&y));
        }
    }

    #[test]
    fn distinct_desc() {
        assert_eq!(distinct_years_desc(&[2019, 2023, 2019, 2021]), vec![2023, 2021, 2019]);
        assert!(distinct_years_desc(&[]).is_empty());
    }
}
