//! Rank data scraped from profile pages.

use serde::{Deserialize, Serialize};

/// Sentinel rank label for accounts whose profile page carries no rank markup.
pub const UNRANKED: &str = "Unranked";

/// A normalized snapshot of one account's ranked standing.
///
/// Produced fresh on every scrape; never persisted beyond the cache TTL.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RankSnapshot {
    /// Tier/division label (e.g. "Challenger", "Gold 2"). Empty when the
    /// fetch itself failed.
    pub rank: String,

    /// League points within the tier.
    pub league_points: u32,

    /// Ladder position within the region, as displayed (may contain
    /// thousands separators, e.g. "1,234"). Empty when unknown.
    pub region_rank: String,
}

impl RankSnapshot {
    /// The snapshot returned when a profile fetch fails outright.
    pub fn empty() -> Self {
        Self::default()
    }

    /// True when the snapshot carries no data at all (failed fetch).
    ///
    /// A successfully scraped but unranked profile is NOT empty: it has the
    /// `Unranked` sentinel as its rank label.
    pub fn is_empty(&self) -> bool {
        self.rank.is_empty() && self.region_rank.is_empty() && self.league_points == 0
    }
}

/// Parse a displayed ladder position ("1,234") into its numeric value.
///
/// Unparsable or blank positions map to `None`, which [`ladder_sort_value`]
/// treats as worse than any real position. This is the explicit comparator
/// the best-account selection relies on: an account without a readable
/// ladder position must never beat one with a real value.
pub fn ladder_value(region_rank: &str) -> Option<u64> {
    let digits = region_rank.trim().replace(',', "");
    if digits.is_empty() {
        return None;
    }
    digits.parse().ok()
}

/// Sort key for best-account selection: lower is better, unknown is worst.
pub fn ladder_sort_value(region_rank: &str) -> u64 {
    ladder_value(region_rank).unwrap_or(u64::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_snapshot() {
        let snap = RankSnapshot::empty();
        assert!(snap.is_empty());
        assert_eq!(snap.rank, "");
        assert_eq!(snap.league_points, 0);
    }

    #[test]
    fn test_unranked_snapshot_is_not_empty() {
        let snap = RankSnapshot {
            rank: UNRANKED.to_string(),
            league_points: 0,
            region_rank: String::new(),
        };
        assert!(!snap.is_empty());
    }

    #[test]
    fn test_ladder_value_strips_separators() {
        assert_eq!(ladder_value("1,234"), Some(1234));
        assert_eq!(ladder_value("500"), Some(500));
        assert_eq!(ladder_value(" 42 "), Some(42));
    }

    #[test]
    fn test_ladder_value_unparsable() {
        assert_eq!(ladder_value(""), None);
        assert_eq!(ladder_value("   "), None);
        assert_eq!(ladder_value("n/a"), None);
    }

    #[test]
    fn test_ladder_sort_value_unknown_is_worst() {
        assert!(ladder_sort_value("999999") < ladder_sort_value(""));
        assert_eq!(ladder_sort_value("junk"), u64::MAX);
    }

    #[test]
    fn test_snapshot_serialization() {
        let snap = RankSnapshot {
            rank: "Grandmaster".to_string(),
            league_points: 612,
            region_rank: "1,234".to_string(),
        };

        let json = serde_json::to_string(&snap).unwrap();
        let parsed: RankSnapshot = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, snap);
    }
}
