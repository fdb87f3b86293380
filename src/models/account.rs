//! Game accounts and the static player roster.

use serde::{Deserialize, Serialize};

/// One external game account: display handle, discriminator tag, region.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RiotAccount {
    /// In-game display handle.
    pub game_name: String,

    /// Discriminator tag (the part after `#`).
    pub tag_line: String,

    /// Region code (e.g. "EUW"). Lowercased when building profile URLs.
    pub region: String,
}

impl RiotAccount {
    pub fn new(game_name: &str, tag_line: &str, region: &str) -> Self {
        Self {
            game_name: game_name.to_string(),
            tag_line: tag_line.to_string(),
            region: region.to_string(),
        }
    }

    /// Human-readable identity for logs: `handle#tag`.
    pub fn identity(&self) -> String {
        format!("{}#{}", self.game_name, self.tag_line)
    }
}

/// One roster member: a canonical player name owning one or more accounts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RosterPlayer {
    /// Canonical player name used to group accounts.
    pub name: String,

    /// Accounts in declared order; order breaks ties in best-account selection.
    pub accounts: Vec<RiotAccount>,
}

/// Static mapping from canonical player names to their accounts.
///
/// Read-only at runtime; sourced from configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Roster {
    #[serde(default)]
    pub players: Vec<RosterPlayer>,
}

impl Roster {
    /// Accounts for a canonical player name, if the roster knows them.
    pub fn accounts_for(&self, player: &str) -> Option<&[RiotAccount]> {
        self.players
            .iter()
            .find(|p| p.name == player)
            .map(|p| p.accounts.as_slice())
    }

    pub fn is_empty(&self) -> bool {
        self.players.is_empty()
    }

    pub fn len(&self) -> usize {
        self.players.len()
    }
}
