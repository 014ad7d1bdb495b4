use crate::cache::StandingsCache;
use crate::db::Db;

/// Shared by every handler.
pub struct AppState {
    pub db: Db,
    pub cache: StandingsCache,
}
