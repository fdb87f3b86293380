//! Best-account aggregation.
//!
//! A player may own several game accounts. All of them are scraped
//! concurrently and the one with the best (numerically lowest) ladder
//! position wins. Accounts without a readable ladder position sort as
//! worst-possible and never beat an account with a real value.

use std::sync::Arc;

use futures::future::join_all;
use tracing::debug;

use crate::fetch::FetchProfile;
use crate::models::{ladder_sort_value, PlayerRank, RiotAccount};

/// Selects the best-ranked account per canonical player.
#[derive(Clone)]
pub struct AccountAggregator {
    fetcher: Arc<dyn FetchProfile>,
}

impl AccountAggregator {
    pub fn new(fetcher: Arc<dyn FetchProfile>) -> Self {
        Self { fetcher }
    }

    /// Fetch every account concurrently and return the best one, tagged with
    /// the canonical player name.
    ///
    /// Returns `None` when every account resolved empty (all fetches failed);
    /// such a player contributes nothing rather than a placeholder. Ties on
    /// ladder position keep the first account in declared order.
    pub async fn best_account(
        &self,
        player: &str,
        accounts: &[RiotAccount],
    ) -> Option<PlayerRank> {
        if accounts.is_empty() {
            return None;
        }

        let snapshots = join_all(
            accounts
                .iter()
                .map(|account| self.fetcher.fetch_snapshot(account)),
        )
        .await;

        let mut best: Option<(usize, u64)> = None;
        for (idx, snapshot) in snapshots.iter().enumerate() {
            if snapshot.is_empty() {
                continue;
            }
            let value = ladder_sort_value(&snapshot.region_rank);
            match best {
                Some((_, best_value)) if value >= best_value => {}
                _ => best = Some((idx, value)),
            }
        }

        let (idx, _) = best?;
        let winner = PlayerRank {
            player: player.to_string(),
            game_name: accounts[idx].game_name.clone(),
            tag_line: accounts[idx].tag_line.clone(),
            snapshot: snapshots[idx].clone(),
        };

        debug!(
            "{} best account: {}#{} (ladder {})",
            player,
            winner.game_name,
            winner.tag_line,
            if winner.snapshot.region_rank.is_empty() {
                "N/A"
            } else {
                winner.snapshot.region_rank.as_str()
            },
        );

        Some(winner)
    }
}
