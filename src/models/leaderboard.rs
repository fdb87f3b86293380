//! Assembled leaderboard entries.

use serde::{Deserialize, Serialize};

use super::RankSnapshot;

/// One row of the assembled leaderboard.
///
/// Created per assembly run, cached as part of the whole leaderboard, and
/// discarded on TTL expiry or process restart. Display names are unique
/// within one run (first-seen wins on upstream duplicates).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeaderboardEntry {
    /// Team label from the upstream leaderboard.
    pub team: String,

    /// Canonical player name (the upstream display name).
    pub player: String,

    /// 1-based position in first-seen upstream order.
    pub position: u32,

    /// Primary account handle. Enrichment may promote the player's
    /// best-ranked account here.
    pub game_name: String,

    /// Primary account discriminator tag.
    pub tag_line: String,

    /// Division label within the tier (e.g. "I").
    pub rank: String,

    /// Tier label (e.g. "CHALLENGER").
    pub tier: String,

    /// League points.
    pub league_points: u32,

    /// Ladder position within the region, as displayed. Empty until
    /// enrichment resolves it (and stays empty when it cannot).
    pub region_rank: String,

    /// Whether the player is currently in game.
    pub is_live: bool,
}

/// A snapshot selected by best-account aggregation, tagged with the
/// canonical player it belongs to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerRank {
    /// Canonical player name.
    pub player: String,

    /// Handle of the winning account.
    pub game_name: String,

    /// Tag of the winning account.
    pub tag_line: String,

    /// The winning account's scraped rank data.
    #[serde(flatten)]
    pub snapshot: RankSnapshot,
}
