//! Time-bounded cache of fetched sheets.
//!
//! Entries are keyed by a short hash of the query (the export URL) and expire
//! after a fixed TTL. Callers pass `now` so expiry is deterministic in tests.

use std::collections::HashMap;

use chrono::{DateTime, Duration, Utc};
use sha2::{Digest, Sha256};
use tracing::debug;

use crate::table::Table;

#[derive(Debug, Clone)]
struct CacheEntry {
    fetched_at: DateTime<Utc>,
    table: Table,
}

/// Query key to table cache with a TTL.
#[derive(Debug, Clone)]
pub struct QueryCache {
    ttl: Duration,
    entries: HashMap<String, CacheEntry>,
}

impl QueryCache {
    pub fn new(ttl: std::time::Duration) -> Self {
        Self {
            ttl: Duration::from_std(ttl).unwrap_or_else(|_| Duration::weeks(52 * 100)),
            entries: HashMap::new(),
        }
    }

    /// Hash a query to a short key.
    pub fn key_for(query: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(query.as_bytes());
        let result = hasher.finalize();
        hex::encode(&result[..8])
    }

    /// A fresh entry for `query`, if any.
    pub fn get(&self, query: &str, now: DateTime<Utc>) -> Option<&Table> {
        let entry = self.entries.get(&Self::key_for(query))?;
        if now.signed_duration_since(entry.fetched_at) > self.ttl {
            debug!("Cache expired for {}", query);
            return None;
        }
        Some(&entry.table)
    }

    /// When `query` was last stored.
    pub fn fetched_at(&self, query: &str) -> Option<DateTime<Utc>> {
        self.entries.get(&Self::key_for(query)).map(|e| e.fetched_at)
    }

    pub fn insert(&mut self, query: &str, table: Table, now: DateTime<Utc>) {
        self.entries.insert(
            Self::key_for(query),
            CacheEntry {
                fetched_at: now,
                table,
            },
        );
    }

    pub fn invalidate(&mut self, query: &str) -> bool {
        self.entries.remove(&Self::key_for(query)).is_some()
    }

    /// Drop every expired entry, returning how many were removed.
    pub fn purge_expired(&mut self, now: DateTime<Utc>) -> usize {
        let before = self.entries.len();
        let ttl = self.ttl;
        self.entries
            .retain(|_, e| now.signed_duration_since(e.fetched_at) <= ttl);
        before - self.entries.len()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
