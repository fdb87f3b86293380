//! Leaderboard assembly pipeline.
//!
//! Coordinates the aggregation pipeline:
//! 1. Fetch the authoritative listing from the upstream ranking API
//! 2. Deduplicate by display name (first-seen wins)
//! 3. Apply the optional privileged-account override
//! 4. Enrich entries with scraped ladder positions, concurrently
//!
//! Step 1 failing fails the whole assembly; steps 3 and 4 degrade
//! gracefully to less-complete data instead.

pub mod aggregate;
pub mod upstream;

pub use aggregate::AccountAggregator;
pub use upstream::{
    HttpLeaderboardClient, LeaderboardSource, LeagueEntry, PrivilegedConfig, UpstreamConfig,
    UpstreamError, UpstreamPlayer,
};

use std::collections::HashSet;
use std::sync::Arc;

use futures::future::join_all;
use thiserror::Error;
use tokio::task::JoinSet;
use tracing::{info, warn};

use crate::models::{LeaderboardEntry, PlayerRank, RiotAccount, Roster};

/// Errors that fail an assembly outright.
#[derive(Debug, Error)]
pub enum AssembleError {
    #[error("Upstream error: {0}")]
    Upstream(#[from] UpstreamError),
}

/// Configuration for the assembler.
#[derive(Debug, Clone)]
pub struct AssemblerConfig {
    /// Canonical player name targeted by the privileged override; empty
    /// disables the step.
    pub override_player: String,

    /// Display handle promoted onto the overridden entry, when set.
    pub override_handle: Option<String>,

    /// Region assumed for leaderboard entries with no roster accounts.
    pub default_region: String,
}

impl Default for AssemblerConfig {
    fn default() -> Self {
        Self {
            override_player: String::new(),
            override_handle: None,
            default_region: "EUW".to_string(),
        }
    }
}

/// Assembles the full ranked leaderboard.
pub struct LeaderboardAssembler {
    source: Arc<dyn LeaderboardSource>,
    aggregator: AccountAggregator,
    roster: Roster,
    config: AssemblerConfig,
}

impl LeaderboardAssembler {
    pub fn new(
        source: Arc<dyn LeaderboardSource>,
        aggregator: AccountAggregator,
        roster: Roster,
        config: AssemblerConfig,
    ) -> Self {
        Self {
            source,
            aggregator,
            roster,
            config,
        }
    }

    /// Run the full pipeline and return the ordered leaderboard.
    pub async fn assemble(&self) -> Result<Vec<LeaderboardEntry>, AssembleError> {
        let players = self.source.fetch_players().await?;

        let mut entries = dedup_by_display_name(players);
        info!("Created leaderboard with {} unique players", entries.len());

        self.apply_override(&mut entries).await;

        let start = std::time::Instant::now();
        info!("Fetching region ranks...");
        match self.enrich(entries.clone()).await {
            Ok(enriched) => {
                info!("Region ranks fetched in {:?}", start.elapsed());
                Ok(enriched)
            }
            Err(e) => {
                warn!(
                    "Region rank enrichment failed, returning base leaderboard: {}",
                    e
                );
                Ok(entries)
            }
        }
    }

    /// Build a leaderboard purely from the configured roster, omitting
    /// players with no resolvable rank data.
    pub async fn roster_leaderboard(&self) -> Vec<PlayerRank> {
        info!(
            "Aggregating roster leaderboard for {} players",
            self.roster.len()
        );

        let results = join_all(
            self.roster
                .players
                .iter()
                .map(|p| self.aggregator.best_account(&p.name, &p.accounts)),
        )
        .await;

        results.into_iter().flatten().collect()
    }

    /// Privileged-account override: replace the designated entry's points and
    /// tier when the privileged lookup reports strictly more league points.
    /// Failures here never fail the assembly.
    async fn apply_override(&self, entries: &mut [LeaderboardEntry]) {
        if self.config.override_player.is_empty() {
            return;
        }

        let entry = match self.source.fetch_privileged_entry().await {
            Ok(Some(entry)) => entry,
            Ok(None) => return,
            Err(e) => {
                warn!("Privileged override lookup failed: {}", e);
                return;
            }
        };

        let Some(target) = entries
            .iter_mut()
            .find(|e| e.player == self.config.override_player)
        else {
            warn!(
                "Override target {} is not on the leaderboard",
                self.config.override_player
            );
            return;
        };

        if entry.league_points <= target.league_points {
            return;
        }

        info!(
            "Overriding {}: {} LP -> {} LP",
            target.player, target.league_points, entry.league_points
        );
        target.league_points = entry.league_points;
        if !entry.tier.is_empty() {
            target.tier = entry.tier;
        }
        if !entry.rank.is_empty() {
            target.rank = entry.rank;
        }
        if let Some(handle) = &self.config.override_handle {
            target.game_name = handle.clone();
        }
    }

    /// Concurrent per-player enrichment. Each player's aggregation is its own
    /// task, so one player can never drop another's result; a task that dies
    /// surfaces as a join error and the caller falls back to the
    /// pre-enrichment leaderboard.
    async fn enrich(
        &self,
        entries: Vec<LeaderboardEntry>,
    ) -> Result<Vec<LeaderboardEntry>, tokio::task::JoinError> {
        let mut tasks = JoinSet::new();

        for (idx, entry) in entries.iter().enumerate() {
            let accounts: Vec<RiotAccount> = match self.roster.accounts_for(&entry.player) {
                Some(accounts) => accounts.to_vec(),
                None => vec![RiotAccount::new(
                    &entry.game_name,
                    &entry.tag_line,
                    &self.config.default_region,
                )],
            };

            let aggregator = self.aggregator.clone();
            let player = entry.player.clone();
            tasks.spawn(async move { (idx, aggregator.best_account(&player, &accounts).await) });
        }

        let mut enriched = entries;
        while let Some(joined) = tasks.join_next().await {
            let (idx, best) = joined?;
            if let Some(player_rank) = best {
                let entry = &mut enriched[idx];
                entry.region_rank = player_rank.snapshot.region_rank;
                entry.game_name = player_rank.game_name;
                entry.tag_line = player_rank.tag_line;
            }
        }

        Ok(enriched)
    }
}

/// Collapse upstream players into unique entries, first occurrence winning,
/// with 1-based positions assigned in first-seen order.
fn dedup_by_display_name(players: Vec<UpstreamPlayer>) -> Vec<LeaderboardEntry> {
    let mut seen: HashSet<String> = HashSet::new();
    let mut entries = Vec::new();

    for player in players {
        if !seen.insert(player.display_name.clone()) {
            continue;
        }
        let position = entries.len() as u32 + 1;
        entries.push(LeaderboardEntry {
            team: player.team,
            player: player.display_name,
            position,
            game_name: player.game_name,
            tag_line: player.tag_line,
            rank: player.rank.rank,
            tier: player.rank.tier,
            league_points: player.rank.league_points,
            region_rank: String::new(),
            is_live: player.is_live,
        });
    }

    entries
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetch::ScriptedFetcher;
    use crate::leaderboard::upstream::ScriptedSource;
    use crate::models::{RankSnapshot, RosterPlayer};
    use pretty_assertions::assert_eq;

    fn upstream_player(name: &str, game_name: &str, tier: &str, lp: u32) -> UpstreamPlayer {
        UpstreamPlayer {
            display_name: name.to_string(),
            team: "X".to_string(),
            game_name: game_name.to_string(),
            tag_line: "EUW".to_string(),
            rank: upstream::UpstreamRank {
                rank: "I".to_string(),
                tier: tier.to_string(),
                league_points: lp,
            },
            is_live: false,
        }
    }

    fn assembler_with(
        source: ScriptedSource,
        fetcher: ScriptedFetcher,
        roster: Roster,
        config: AssemblerConfig,
    ) -> LeaderboardAssembler {
        LeaderboardAssembler::new(
            Arc::new(source),
            AccountAggregator::new(Arc::new(fetcher)),
            roster,
            config,
        )
    }

    #[tokio::test]
    async fn test_dedup_keeps_first_seen_entry() {
        let source = ScriptedSource::listing(vec![
            upstream_player("A", "a1", "GOLD", 50),
            upstream_player("B", "b1", "SILVER", 20),
            upstream_player("A", "a2", "DIAMOND", 99),
        ]);
        let assembler = assembler_with(
            source,
            ScriptedFetcher::failing(),
            Roster::default(),
            AssemblerConfig::default(),
        );

        let entries = assembler.assemble().await.unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].player, "A");
        assert_eq!(entries[0].game_name, "a1");
        assert_eq!(entries[0].position, 1);
        assert_eq!(entries[1].player, "B");
        assert_eq!(entries[1].position, 2);
    }

    #[tokio::test]
    async fn test_listing_failure_fails_assembly() {
        let mut source = ScriptedSource::listing(vec![]);
        source.fail_listing = true;
        let assembler = assembler_with(
            source,
            ScriptedFetcher::failing(),
            Roster::default(),
            AssemblerConfig::default(),
        );

        assert!(assembler.assemble().await.is_err());
    }

    #[tokio::test]
    async fn test_all_profile_fetches_failing_keeps_base_entries() {
        // Upstream lists A at GOLD/50, every scrape times out, and the
        // final output still has A with an empty region rank.
        let source = ScriptedSource::listing(vec![upstream_player("A", "a1", "GOLD", 50)]);
        let assembler = assembler_with(
            source,
            ScriptedFetcher::failing(),
            Roster::default(),
            AssemblerConfig::default(),
        );

        let entries = assembler.assemble().await.unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].tier, "GOLD");
        assert_eq!(entries[0].league_points, 50);
        assert_eq!(entries[0].region_rank, "");
    }

    #[tokio::test]
    async fn test_enrichment_attaches_region_rank_and_promotes_best_account() {
        let source = ScriptedSource::listing(vec![upstream_player("A", "a main", "GOLD", 50)]);
        let roster = Roster {
            players: vec![RosterPlayer {
                name: "A".to_string(),
                accounts: vec![
                    RiotAccount::new("a main", "EUW", "EUW"),
                    RiotAccount::new("a smurf", "0001", "EUW"),
                ],
            }],
        };
        let fetcher = ScriptedFetcher::new(vec![
            (
                "a main#EUW",
                RankSnapshot {
                    rank: "Gold 1".to_string(),
                    league_points: 50,
                    region_rank: "40,000".to_string(),
                },
            ),
            (
                "a smurf#0001",
                RankSnapshot {
                    rank: "Master".to_string(),
                    league_points: 200,
                    region_rank: "1,500".to_string(),
                },
            ),
        ]);
        let assembler = assembler_with(source, fetcher, roster, AssemblerConfig::default());

        let entries = assembler.assemble().await.unwrap();
        assert_eq!(entries[0].region_rank, "1,500");
        assert_eq!(entries[0].game_name, "a smurf");
        assert_eq!(entries[0].tag_line, "0001");
        // Authoritative tier/LP stay untouched by enrichment.
        assert_eq!(entries[0].tier, "GOLD");
        assert_eq!(entries[0].league_points, 50);
    }

    #[tokio::test]
    async fn test_enrichment_falls_back_to_entry_account_without_roster() {
        let source = ScriptedSource::listing(vec![upstream_player("A", "a1", "GOLD", 50)]);
        let fetcher = ScriptedFetcher::new(vec![(
            "a1#EUW",
            RankSnapshot {
                rank: "Gold 1".to_string(),
                league_points: 50,
                region_rank: "88,123".to_string(),
            },
        )]);
        let assembler = assembler_with(
            source,
            fetcher,
            Roster::default(),
            AssemblerConfig::default(),
        );

        let entries = assembler.assemble().await.unwrap();
        assert_eq!(entries[0].region_rank, "88,123");
    }

    #[tokio::test]
    async fn test_override_applied_when_strictly_greater() {
        let mut source = ScriptedSource::listing(vec![upstream_player("A", "a1", "GOLD", 50)]);
        source.privileged = Some(LeagueEntry {
            rank: "I".to_string(),
            tier: "CHALLENGER".to_string(),
            league_points: 900,
        });
        let config = AssemblerConfig {
            override_player: "A".to_string(),
            override_handle: Some("A Alt".to_string()),
            ..Default::default()
        };
        let assembler =
            assembler_with(source, ScriptedFetcher::failing(), Roster::default(), config);

        let entries = assembler.assemble().await.unwrap();
        assert_eq!(entries[0].league_points, 900);
        assert_eq!(entries[0].tier, "CHALLENGER");
        assert_eq!(entries[0].game_name, "A Alt");
    }

    #[tokio::test]
    async fn test_override_skipped_when_not_greater() {
        let mut source = ScriptedSource::listing(vec![upstream_player("A", "a1", "GOLD", 50)]);
        source.privileged = Some(LeagueEntry {
            rank: "I".to_string(),
            tier: "SILVER".to_string(),
            league_points: 50,
        });
        let config = AssemblerConfig {
            override_player: "A".to_string(),
            ..Default::default()
        };
        let assembler =
            assembler_with(source, ScriptedFetcher::failing(), Roster::default(), config);

        let entries = assembler.assemble().await.unwrap();
        assert_eq!(entries[0].league_points, 50);
        assert_eq!(entries[0].tier, "GOLD");
    }

    #[tokio::test]
    async fn test_override_failure_does_not_fail_assembly() {
        let mut source = ScriptedSource::listing(vec![upstream_player("A", "a1", "GOLD", 50)]);
        source.fail_privileged = true;
        let config = AssemblerConfig {
            override_player: "A".to_string(),
            ..Default::default()
        };
        let assembler =
            assembler_with(source, ScriptedFetcher::failing(), Roster::default(), config);

        let entries = assembler.assemble().await.unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].league_points, 50);
    }

    #[tokio::test]
    async fn test_roster_leaderboard_omits_players_without_data() {
        let roster = Roster {
            players: vec![
                RosterPlayer {
                    name: "A".to_string(),
                    accounts: vec![RiotAccount::new("a1", "EUW", "EUW")],
                },
                RosterPlayer {
                    name: "B".to_string(),
                    accounts: vec![RiotAccount::new("b1", "EUW", "EUW")],
                },
            ],
        };
        let fetcher = ScriptedFetcher::new(vec![(
            "a1#EUW",
            RankSnapshot {
                rank: "Diamond 2".to_string(),
                league_points: 75,
                region_rank: "12,345".to_string(),
            },
        )]);
        let assembler = assembler_with(
            ScriptedSource::listing(vec![]),
            fetcher,
            roster,
            AssemblerConfig::default(),
        );

        let ranks = assembler.roster_leaderboard().await;
        assert_eq!(ranks.len(), 1);
        assert_eq!(ranks[0].player, "A");
        assert_eq!(ranks[0].snapshot.region_rank, "12,345");
    }
}
