//! Time-to-live cache for slow-changing resources (tournament, teams).
//!
//! The backing store is pluggable: [`MemoryStore`] for a single process,
//! [`FileStore`] to keep entries across runs. Entries carry the time they were
//! written and are served until they are older than the cache TTL.

use crate::client::{ApiError, ApiResult};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use log::{debug, warn};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::future::Future;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;

pub const DEFAULT_TTL: Duration = Duration::from_secs(6 * 60 * 60);

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheEntry {
    /// Epoch milliseconds at write time.
    pub timestamp: i64,
    pub payload: Value,
}

/// Async key-value store holding cache entries.
#[async_trait]
pub trait CacheStore: Send + Sync {
    async fn get(&self, key: &str) -> Option<CacheEntry>;
    async fn set(&self, key: &str, entry: CacheEntry) -> ApiResult<()>;
}

// ---------------------------------------------------------------------------
// Stores
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, CacheEntry>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CacheStore for MemoryStore {
    async fn get(&self, key: &str) -> Option<CacheEntry> {
        self.entries.lock().await.get(key).cloned()
    }

    async fn set(&self, key: &str, entry: CacheEntry) -> ApiResult<()> {
        self.entries.lock().await.insert(key.to_owned(), entry);
        Ok(())
    }
}

/// All entries in one JSON file. A missing or corrupt file reads as empty.
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    lock: Mutex<()>,
}

impl FileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    async fn read_all(&self) -> HashMap<String, CacheEntry> {
        match tokio::fs::read_to_string(&self.path).await {
            Ok(raw) => serde_json::from_str(&raw).unwrap_or_default(),
            Err(_) => HashMap::new(),
        }
    }
}

#[async_trait]
impl CacheStore for FileStore {
    async fn get(&self, key: &str) -> Option<CacheEntry> {
        let _guard = self.lock.lock().await;
        self.read_all().await.remove(key)
    }

    async fn set(&self, key: &str, entry: CacheEntry) -> ApiResult<()> {
        let _guard = self.lock.lock().await;
        let mut entries = self.read_all().await;
        entries.insert(key.to_owned(), entry);

        if let Some(dir) = self.path.parent()
            && !dir.as_os_str().is_empty()
        {
            tokio::fs::create_dir_all(dir)
                .await
                .map_err(|e| ApiError::Cache(format!("could not create {}: {e}", dir.display())))?;
        }
        let raw = serde_json::to_string(&entries).map_err(|e| ApiError::Cache(e.to_string()))?;
        tokio::fs::write(&self.path, raw)
            .await
            .map_err(|e| ApiError::Cache(format!("could not write {}: {e}", self.path.display())))
    }
}

// ---------------------------------------------------------------------------
// TTL wrapper
// ---------------------------------------------------------------------------

#[derive(Clone)]
pub struct TtlCache {
    store: Arc<dyn CacheStore>,
    ttl: Duration,
}

impl TtlCache {
    pub fn new(store: impl CacheStore + 'static, ttl: Duration) -> Self {
        Self {
            store: Arc::new(store),
            ttl,
        }
    }

    pub fn in_memory(ttl: Duration) -> Self {
        Self::new(MemoryStore::new(), ttl)
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Return the cached payload for `key` if it is younger than the TTL,
    /// otherwise run `loader`, store its result and return it. Loader errors
    /// propagate and leave the store untouched.
    pub async fn get_or_load<T, F, Fut>(&self, key: &str, loader: F) -> ApiResult<T>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = ApiResult<T>>,
    {
        self.get_or_load_at(key, Utc::now(), loader).await
    }

    pub async fn get_or_load_at<T, F, Fut>(&self, key: &str, now: DateTime<Utc>, loader: F) -> ApiResult<T>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = ApiResult<T>>,
    {
        let now_ms = now.timestamp_millis();

        if let Some(entry) = self.store.get(key).await
            && self.is_fresh(&entry, now_ms)
        {
            match serde_json::from_value::<T>(entry.payload) {
                Ok(data) => {
                    debug!("cache hit for {key}");
                    return Ok(data);
                }
                Err(e) => debug!("cached {key} no longer decodes ({e}); reloading"),
            }
        }

        let data = loader().await?;
        match serde_json::to_value(&data) {
            Ok(payload) => {
                let entry = CacheEntry { timestamp: now_ms, payload };
                if let Err(e) = self.store.set(key, entry).await {
                    warn!("{e}");
                }
            }
            Err(e) => warn!("could not cache {key}: {e}"),
        }
        Ok(data)
    }

    fn is_fresh(&self, entry: &CacheEntry, now_ms: i64) -> bool {
        let ttl_ms = i64::try_from(self.ttl.as_millis()).unwrap_or(i64::MAX);
        now_ms.saturating_sub(entry.timestamp) < ttl_ms
    }
}

impl std::fmt::Debug for TtlCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TtlCache").field("ttl", &self.ttl).finish_non_exhaustive()
    }
}
