//! Read-through memoization of table reads.
//!
//! The cache is an injected dependency with an explicit TTL and an
//! injected clock — not a process-wide singleton — so tests can drive
//! expiry deterministically. Writes never go through it; they invalidate
//! by table-name pattern instead.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use club_ledger::rows::{ColSpan, Table};
use serde::Serialize;
use tracing::debug;

use crate::errors::Result;
use crate::store::RowStore;

/// Time source for expiry checks.
pub trait Clock: Send + Sync {
    fn now(&self) -> Instant;
}

pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

struct Entry {
    stored_at: Instant,
    rows: Vec<Vec<String>>,
}

/// One cache entry as reported by the inspection endpoint.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheEntryInfo {
    pub key: String,
    pub age_secs: u64,
    pub remaining_secs: i64,
}

/// TTL-bounded map of table reads.
pub struct TtlCache {
    ttl: Duration,
    clock: Arc<dyn Clock>,
    entries: RwLock<HashMap<String, Entry>>,
}

impl TtlCache {
    pub fn new(ttl: Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            ttl,
            clock,
            entries: RwLock::new(HashMap::new()),
        }
    }

    pub fn get(&self, key: &str) -> Option<Vec<Vec<String>>> {
        let now = self.clock.now();
        {
            let entries = self.entries.read().unwrap();
            match entries.get(key) {
                Some(entry) if now.duration_since(entry.stored_at) <= self.ttl => {
                    return Some(entry.rows.clone());
                }
                Some(_) => {}
                None => return None,
            }
        }
        // Expired: drop the entry on the way out.
        self.entries.write().unwrap().remove(key);
        None
    }

    pub fn set(&self, key: &str, rows: Vec<Vec<String>>) {
        let entry = Entry {
            stored_at: self.clock.now(),
            rows,
        };
        self.entries.write().unwrap().insert(key.to_string(), entry);
    }

    /// Drop every entry whose key contains `pattern`.
    pub fn invalidate(&self, pattern: &str) {
        let mut entries = self.entries.write().unwrap();
        let before = entries.len();
        entries.retain(|key, _| !key.contains(pattern));
        let dropped = before - entries.len();
        if dropped > 0 {
            debug!("Invalidated {dropped} cache entries matching {pattern:?}");
        }
    }

    pub fn clear(&self) {
        self.entries.write().unwrap().clear();
    }

    pub fn entries(&self) -> Vec<CacheEntryInfo> {
        let now = self.clock.now();
        let ttl_secs = self.ttl.as_secs() as i64;
        self.entries
            .read()
            .unwrap()
            .iter()
            .map(|(key, entry)| {
                let age = now.duration_since(entry.stored_at).as_secs();
                CacheEntryInfo {
                    key: key.clone(),
                    age_secs: age,
                    remaining_secs: ttl_secs - age as i64,
                }
            })
            .collect()
    }
}

/// Read-through wrapper: memoizes `get_all` per table, pushes writes
/// through and invalidates the table's entries afterwards.
#[derive(Clone)]
pub struct CachedStore {
    inner: Arc<dyn RowStore>,
    cache: Arc<TtlCache>,
}

impl CachedStore {
    pub fn new(inner: Arc<dyn RowStore>, cache: Arc<TtlCache>) -> Self {
        Self { inner, cache }
    }

    fn key(table: Table) -> String {
        format!("rows:{}", table.name())
    }
}

#[async_trait]
impl RowStore for CachedStore {
    async fn get_all(&self, table: Table) -> Result<Vec<Vec<String>>> {
        let key = Self::key(table);
        if let Some(rows) = self.cache.get(&key) {
            return Ok(rows);
        }
        let rows = self.inner.get_all(table).await?;
        self.cache.set(&key, rows.clone());
        Ok(rows)
    }

    async fn append(&self, table: Table, rows: Vec<Vec<String>>) -> Result<()> {
        self.inner.append(table, rows).await?;
        self.cache.invalidate(table.name());
        Ok(())
    }

    async fn update_range(
        &self,
        table: Table,
        row_index: usize,
        span: ColSpan,
        values: Vec<String>,
    ) -> Result<()> {
        self.inner.update_range(table, row_index, span, values).await?;
        self.cache.invalidate(table.name());
        Ok(())
    }
}
