//! Persistent recent-search list.
//!
//! Backed by sled: one fixed key holding a JSON array, most recent first.
//! Recording an already-present symbol moves it to the front instead of
//! duplicating it, and the list never grows past [`MAX_RECENT`] entries.

use crate::error::CoreResult;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::debug;

/// Hard cap on stored entries; the oldest drop off the end.
pub const MAX_RECENT: usize = 10;

const RECENT_KEY: &[u8] = b"recent_searches";

/// One remembered search.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RecentEntry {
    pub symbol: String,
    pub name: String,
    /// Unix millis of the most recent visit.
    pub timestamp: i64,
}

/// Store for the recent-search list.
pub struct RecentSearches {
    db: sled::Db,
}

impl RecentSearches {
    /// Open (or create) the store at the given path.
    pub fn open(path: impl AsRef<Path>) -> CoreResult<Self> {
        let db = sled::open(path)?;
        Ok(Self { db })
    }

    /// Record a visit. The entry moves to the front; duplicates are matched by
    /// symbol so a renamed company does not leave a stale row behind.
    pub fn record(&self, symbol: &str, name: &str) -> CoreResult<()> {
        let symbol = symbol.trim().to_uppercase();
        let mut entries = self.list()?;
        entries.retain(|e| e.symbol != symbol);
        entries.insert(
            0,
            RecentEntry {
                symbol: symbol.clone(),
                name: name.trim().to_string(),
                timestamp: chrono::Utc::now().timestamp_millis(),
            },
        );
        entries.truncate(MAX_RECENT);
        self.db.insert(RECENT_KEY, serde_json::to_vec(&entries)?)?;
        self.db.flush()?;
        debug!("recorded recent search {}", symbol);
        Ok(())
    }

    /// All remembered searches, most recent first. A corrupt or missing value
    /// reads as empty.
    pub fn list(&self) -> CoreResult<Vec<RecentEntry>> {
        match self.db.get(RECENT_KEY)? {
            Some(raw) => Ok(serde_json::from_slice(&raw).unwrap_or_default()),
            None => Ok(Vec::new()),
        }
    }

    /// Forget everything.
    pub fn clear(&self) -> CoreResult<()> {
        self.db.remove(RECENT_KEY)?;
        self.db.flush()?;
        Ok(())
    }
}
