use crate::database::HistoryOperations;
use crate::error::IndexError;
use crate::types::IndexEntry;
use sqlx::PgPool;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{Mutex, RwLock};

struct CacheRecord {
    entries: Vec<IndexEntry>,
    cached_at: Instant,
}

/// Short-TTL snapshot cache in front of the history store. Constructed
/// once at startup and injected into the serve layer; the scheduler
/// overwrites the snapshot after every successful aggregation cycle, so
/// reads between cycles never hit the store.
pub struct SeriesCache {
    ttl: Duration,
    records: RwLock<HashMap<String, CacheRecord>>,
    refresh_locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl SeriesCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            records: RwLock::new(HashMap::new()),
            refresh_locks: Mutex::new(HashMap::new()),
        }
    }

    /// Snapshot for the index, only while fresh.
    pub async fn get(&self, index_name: &str) -> Option<Vec<IndexEntry>> {
        let records = self.records.read().await;
        records
            .get(index_name)
            .filter(|record| record.cached_at.elapsed() < self.ttl)
            .map(|record| record.entries.clone())
    }

    /// Overwrites the snapshot and restarts its TTL window.
    pub async fn put(&self, index_name: &str, entries: Vec<IndexEntry>) {
        let mut records = self.records.write().await;
        records.insert(
            index_name.to_string(),
            CacheRecord {
                entries,
                cached_at: Instant::now(),
            },
        );
    }

    /// Fresh snapshot, or one store read shared by all concurrent
    /// requesters of the same expired series.
    pub async fn read_through(
        &self,
        pool: &PgPool,
        index_name: &str,
    ) -> Result<Vec<IndexEntry>, IndexError> {
        if let Some(entries) = self.get(index_name).await {
            return Ok(entries);
        }

        let lock = self.refresh_lock(index_name).await;
        let _guard = lock.lock().await;

        // The winning flight may have repopulated while we waited.
        if let Some(entries) = self.get(index_name).await {
            return Ok(entries);
        }

        let series = HistoryOperations::load_series(pool, index_name).await?;
        self.put(index_name, series.clone()).await;
        Ok(series)
    }

    async fn refresh_lock(&self, index_name: &str) -> Arc<Mutex<()>> {
        let mut locks = self.refresh_locks.lock().await;
        locks
            .entry(index_name.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }
}
