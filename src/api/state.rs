use std::sync::Arc;

use crate::cache::ResultCache;
use crate::leaderboard::LeaderboardAssembler;
use crate::store::OverlayStore;

#[derive(Clone)]
pub struct AppState {
    pub cache: Arc<ResultCache>,
    pub assembler: Arc<LeaderboardAssembler>,
    pub store: Arc<OverlayStore>,

    /// TTL applied to the cached leaderboard.
    pub leaderboard_ttl_minutes: u64,

    /// Default lifetime of newly created overlays.
    pub overlay_expiration_hours: i64,
}
