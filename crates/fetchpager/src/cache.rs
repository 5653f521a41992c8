//! Opt-in cache of normalized documents
//!
//! Paging through a long document re-fetches it on every call. With the cache
//! enabled, later windows of the same `(url, raw)` pair are served from
//! memory until the entry expires. Output is identical either way.

use crate::client::FetchedDocument;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use std::time::{Duration, Instant};

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct CacheKey {
    url: String,
    raw: bool,
}

#[derive(Debug)]
struct CacheEntry {
    document: Arc<FetchedDocument>,
    stored_at: Instant,
}

/// Cache statistics
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheStats {
    pub total: usize,
    pub expired: usize,
    pub max: usize,
}

/// TTL cache of normalized documents keyed by `(url, raw)`
#[derive(Debug)]
pub struct ContentCache {
    entries: RwLock<HashMap<CacheKey, CacheEntry>>,
    ttl: Duration,
    max_entries: usize,
}

impl ContentCache {
    /// Create a cache
    ///
    /// # Arguments
    /// * `ttl` - How long an entry stays valid
    /// * `max_entries` - Entries kept before the oldest is evicted
    pub fn new(ttl: Duration, max_entries: usize) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            ttl,
            max_entries: max_entries.max(1),
        }
    }

    /// Get a document if present and not expired
    pub fn get(&self, url: &str, raw: bool) -> Option<Arc<FetchedDocument>> {
        let entries = self.entries.read().ok()?;
        let entry = entries.get(&CacheKey {
            url: url.to_string(),
            raw,
        })?;

        if entry.stored_at.elapsed() > self.ttl {
            return None;
        }

        Some(entry.document.clone())
    }

    /// Store a document
    pub fn insert(&self, url: &str, raw: bool, document: Arc<FetchedDocument>) {
        let mut entries = match self.entries.write() {
            Ok(e) => e,
            Err(_) => return,
        };

        let key = CacheKey {
            url: url.to_string(),
            raw,
        };

        if !entries.contains_key(&key) && entries.len() >= self.max_entries {
            Self::evict_oldest(&mut entries);
        }

        entries.insert(
            key,
            CacheEntry {
                document,
                stored_at: Instant::now(),
            },
        );
    }

    /// Remove all entries
    pub fn clear(&self) {
        if let Ok(mut entries) = self.entries.write() {
            entries.clear();
        }
    }

    pub fn stats(&self) -> CacheStats {
        let (total, expired) = match self.entries.read() {
            Ok(entries) => (
                entries.len(),
                entries
                    .values()
                    .filter(|e| e.stored_at.elapsed() > self.ttl)
                    .count(),
            ),
            Err(_) => (0, 0),
        };
        CacheStats {
            total,
            expired,
            max: self.max_entries,
        }
    }

    fn evict_oldest(entries: &mut HashMap<CacheKey, CacheEntry>) {
        if let Some(oldest) = entries
            .iter()
            .min_by_key(|(_, e)| e.stored_at)
            .map(|(k, _)| k.clone())
        {
            entries.remove(&oldest);
        }
    }
}
