//! Rank extraction from raw profile-page HTML.
//!
//! The profile site is scraped, not an API, so extraction is defensive by
//! contract: malformed or schema-shifted markup yields partial results
//! (empty string / 0), never an error. The extraction strategy is a trait so
//! the fetch layer does not care whether ranks come from regexes or a DOM
//! walk, and so strategies can be tested in isolation.

use regex::Regex;
use scraper::{Html, Selector};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::models::{RankSnapshot, UNRANKED};

/// A rank extraction strategy. Implementations must not panic on any input.
pub trait RankExtract: Send + Sync {
    /// Extract a snapshot from raw HTML. Missing markup degrades to the
    /// `Unranked` sentinel and empty fields, never an error.
    fn extract(&self, html: &str) -> RankSnapshot;
}

/// Which concrete strategy to use, from configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExtractorKind {
    #[default]
    Regex,
    Selector,
}

/// Build the configured extraction strategy.
pub fn build_extractor(kind: ExtractorKind) -> Arc<dyn RankExtract> {
    match kind {
        ExtractorKind::Regex => Arc::new(RegexRankExtractor::new()),
        ExtractorKind::Selector => Arc::new(SelectorRankExtractor::new()),
    }
}

/// Title-case a tier label per word: first letter uppercased, rest unchanged.
/// Tolerates the upstream site's inconsistent capitalization.
fn format_rank(tier: &str) -> String {
    tier.trim()
        .split_whitespace()
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Parse a digit group that may contain comma separators.
fn parse_points(raw: &str) -> u32 {
    raw.replace(',', "").parse().unwrap_or(0)
}

// ── Regex strategy (canonical) ──────────────────────────────────────────────

/// Regex-based extraction against the profile page's rendered markup.
pub struct RegexRankExtractor {
    ladder_re: Regex,
    rank_re: Regex,
}

impl RegexRankExtractor {
    pub fn new() -> Self {
        // "Ladder Rank <span ...>1,234</span>"
        let ladder_re = Regex::new(r"Ladder Rank\s*<span[^>]*>([\d,]+)</span>").unwrap();
        // A first-letter:uppercase styled tier label immediately followed by
        // the LP span (the site injects an HTML comment before the "LP" text).
        let rank_re = Regex::new(
            r"<strong[^>]*first-letter:uppercase[^>]*>([^<]+)</strong><span[^>]*>([\d,]+)<!--[^>]*-->\s*LP</span>",
        )
        .unwrap();

        Self { ladder_re, rank_re }
    }
}

impl Default for RegexRankExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl RankExtract for RegexRankExtractor {
    fn extract(&self, html: &str) -> RankSnapshot {
        let region_rank = self
            .ladder_re
            .captures(html)
            .and_then(|c| c.get(1))
            .map(|m| m.as_str().to_string())
            .unwrap_or_default();

        match self.rank_re.captures(html) {
            Some(caps) => RankSnapshot {
                rank: format_rank(&caps[1]),
                league_points: parse_points(&caps[2]),
                region_rank,
            },
            None => RankSnapshot {
                rank: UNRANKED.to_string(),
                league_points: 0,
                region_rank,
            },
        }
    }
}

// ── Selector strategy ───────────────────────────────────────────────────────

/// DOM-walk extraction via CSS selectors.
///
/// Kept as an alternative to the regex strategy: it survives attribute
/// reordering and whitespace changes the regexes are sensitive to, at the
/// cost of a full document parse per page.
pub struct SelectorRankExtractor {
    li_sel: Selector,
    strong_sel: Selector,
    span_sel: Selector,
    digits_re: Regex,
}

impl SelectorRankExtractor {
    pub fn new() -> Self {
        Self {
            li_sel: Selector::parse("li").unwrap(),
            strong_sel: Selector::parse(r#"strong[class*="first-letter:uppercase"]"#).unwrap(),
            span_sel: Selector::parse("span").unwrap(),
            digits_re: Regex::new(r"([\d,]+)").unwrap(),
        }
    }

    /// Ladder position: the numeric token inside the stat list item labeled
    /// "Ladder Rank".
    fn ladder_rank(&self, doc: &Html) -> String {
        for li in doc.select(&self.li_sel) {
            let text: String = li.text().collect();
            if !text.contains("Ladder Rank") {
                continue;
            }
            if let Some(caps) = self.digits_re.captures(&text) {
                return caps[1].to_string();
            }
        }
        String::new()
    }
}

impl Default for SelectorRankExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl RankExtract for SelectorRankExtractor {
    fn extract(&self, html: &str) -> RankSnapshot {
        let doc = Html::parse_document(html);
        let region_rank = self.ladder_rank(&doc);

        let Some(label) = doc.select(&self.strong_sel).next() else {
            return RankSnapshot {
                rank: UNRANKED.to_string(),
                league_points: 0,
                region_rank,
            };
        };

        let rank = format_rank(&label.text().collect::<String>());

        // The LP span is the label's next element sibling.
        let league_points = label
            .next_siblings()
            .filter_map(scraper::ElementRef::wrap)
            .next()
            .filter(|sib| self.span_sel.matches(sib))
            .and_then(|sib| {
                let text: String = sib.text().collect();
                self.digits_re
                    .captures(&text)
                    .map(|caps| parse_points(&caps[1]))
            })
            .unwrap_or(0);

        RankSnapshot {
            rank,
            league_points,
            region_rank,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const RANKED_PAGE: &str = concat!(
        r#"<div id="content-header"><ul><li><a><span>"#,
        r#"Ladder Rank <span class="text-gray-500">1,234</span></span></a></li></ul></div>"#,
        r#"<div><strong class="first-letter:uppercase text-xl">grandmaster</strong>"#,
        r#"<span class="text-sm">612<!-- -->  LP</span></div>"#,
    );

    const UNRANKED_PAGE: &str =
        r#"<html><body><div id="content-header"><p>Some profile</p></div></body></html>"#;

    #[test]
    fn test_regex_extracts_full_snapshot() {
        let extractor = RegexRankExtractor::new();
        let snap = extractor.extract(RANKED_PAGE);

        assert_eq!(snap.rank, "Grandmaster");
        assert_eq!(snap.league_points, 612);
        assert_eq!(snap.region_rank, "1,234");
    }

    #[test]
    fn test_regex_missing_rank_markup_is_unranked() {
        let extractor = RegexRankExtractor::new();
        let snap = extractor.extract(UNRANKED_PAGE);

        assert_eq!(snap.rank, UNRANKED);
        assert_eq!(snap.league_points, 0);
        assert_eq!(snap.region_rank, "");
    }

    #[test]
    fn test_regex_ladder_rank_without_rank_markup() {
        let html = r#"Ladder Rank <span>42</span> and nothing else"#;
        let extractor = RegexRankExtractor::new();
        let snap = extractor.extract(html);

        assert_eq!(snap.region_rank, "42");
        assert_eq!(snap.rank, UNRANKED);
    }

    #[test]
    fn test_regex_comma_separated_lp() {
        let html = concat!(
            r#"<strong class="first-letter:uppercase">challenger</strong>"#,
            r#"<span>1,014<!-- --> LP</span>"#,
        );
        let extractor = RegexRankExtractor::new();
        let snap = extractor.extract(html);

        assert_eq!(snap.league_points, 1014);
    }

    #[test]
    fn test_regex_never_panics_on_garbage() {
        let extractor = RegexRankExtractor::new();
        for garbage in ["", "<<<>>>", "Ladder Rank <span>", "\u{0000}\u{FFFD}"] {
            let snap = extractor.extract(garbage);
            assert_eq!(snap.rank, UNRANKED);
        }
    }

    #[test]
    fn test_format_rank_title_cases_words() {
        assert_eq!(format_rank("grandmaster"), "Grandmaster");
        assert_eq!(format_rank("gold 2"), "Gold 2");
        assert_eq!(format_rank("  iron IV  "), "Iron IV");
        assert_eq!(format_rank(""), "");
    }

    #[test]
    fn test_selector_extracts_full_snapshot() {
        let extractor = SelectorRankExtractor::new();
        let snap = extractor.extract(RANKED_PAGE);

        assert_eq!(snap.rank, "Grandmaster");
        assert_eq!(snap.league_points, 612);
        assert_eq!(snap.region_rank, "1,234");
    }

    #[test]
    fn test_selector_missing_rank_markup_is_unranked() {
        let extractor = SelectorRankExtractor::new();
        let snap = extractor.extract(UNRANKED_PAGE);

        assert_eq!(snap.rank, UNRANKED);
        assert_eq!(snap.league_points, 0);
        assert_eq!(snap.region_rank, "");
    }

    #[test]
    fn test_selector_never_panics_on_garbage() {
        let extractor = SelectorRankExtractor::new();
        for garbage in ["", "<li>Ladder Rank</li>", "<strong>?</strong>"] {
            let _ = extractor.extract(garbage);
        }
    }

    #[test]
    fn test_build_extractor_kinds() {
        let regex = build_extractor(ExtractorKind::Regex);
        let selector = build_extractor(ExtractorKind::Selector);

        assert_eq!(regex.extract(RANKED_PAGE), selector.extract(RANKED_PAGE));
    }

    #[test]
    fn test_extractor_kind_deserializes_lowercase() {
        let kind: ExtractorKind = serde_json::from_str("\"selector\"").unwrap();
        assert_eq!(kind, ExtractorKind::Selector);
        assert_eq!(ExtractorKind::default(), ExtractorKind::Regex);
    }
}
