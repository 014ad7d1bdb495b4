use crate::error::AppError;
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CacheKey {
    BoulderStandings(i64),
    SpeedQualification(i64),
    SpeedBracket(i64),
}

impl CacheKey {
    fn competition_id(&self) -> i64 {
        match self {
            CacheKey::BoulderStandings(id)
            | CacheKey::SpeedQualification(id)
            | CacheKey::SpeedBracket(id) => *id,
        }
    }
}

#[derive(Debug)]
pub struct CachedBody {
    pub body: String,
    pub etag: String,
}

impl CachedBody {
    fn new(body: String) -> Self {
        let etag = format!("\"{:x}\"", Sha256::digest(body.as_bytes()));
        CachedBody { body, etag }
    }
}

#[derive(Default)]
struct Entries {
    bodies: HashMap<CacheKey, (Instant, Arc<CachedBody>)>,
    /// Bumped by `invalidate`; a build that started under an older
    /// generation is not stored.
    generations: HashMap<i64, u64>,
}

impl Entries {
    fn generation(&self, competition_id: i64) -> u64 {
        self.generations.get(&competition_id).copied().unwrap_or(0)
    }
}

enum Lookup {
    Hit(Arc<CachedBody>),
    /// Generation the caller's build starts under.
    Miss { generation: u64 },
}

/// Serialized standings per competition, dropped after `ttl` or on
/// `invalidate`.
pub struct StandingsCache {
    ttl: Duration,
    entries: Mutex<Entries>,
}

impl StandingsCache {
    pub fn new(ttl: Duration) -> Self {
        StandingsCache {
            ttl,
            entries: Mutex::new(Entries::default()),
        }
    }

    /// Returns the cached body or builds, stores and returns a fresh one.
    /// The lock is not held while `build` runs, so a body built across an
    /// `invalidate` is returned to this caller but never stored.
    pub fn get_or_build<F>(&self, key: CacheKey, build: F) -> Result<Arc<CachedBody>, AppError>
    where
        F: FnOnce() -> Result<String, AppError>,
    {
        let generation = match self.lookup(key)? {
            Lookup::Hit(body) => {
                debug!(?key, "standings cache hit");
                return Ok(body);
            }
            Lookup::Miss { generation } => generation,
        };

        let fresh = Arc::new(CachedBody::new(build()?));
        let mut entries = self.lock()?;
        if entries.generation(key.competition_id()) == generation {
            entries.bodies.insert(key, (Instant::now(), fresh.clone()));
        } else {
            debug!(?key, "standings invalidated during build, not cached");
        }
        Ok(fresh)
    }

    pub fn invalidate(&self, competition_id: i64) {
        if let Ok(mut entries) = self.entries.lock() {
            entries.bodies.retain(|key, _| key.competition_id() != competition_id);
            *entries.generations.entry(competition_id).or_default() += 1;
        }
    }

    fn lookup(&self, key: CacheKey) -> Result<Lookup, AppError> {
        let mut entries = self.lock()?;
        let expired = match entries.bodies.get(&key) {
            Some((stored_at, body)) => {
                if stored_at.elapsed() < self.ttl {
                    return Ok(Lookup::Hit(body.clone()));
                }
                true
            }
            None => false,
        };
        if expired {
            entries.bodies.remove(&key);
        }
        Ok(Lookup::Miss {
            generation: entries.generation(key.competition_id()),
        })
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Entries>, AppError> {
        self.entries
            .lock()
            .map_err(|_| AppError::Internal("standings cache lock poisoned".into()))
    }
}
