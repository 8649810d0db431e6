//! Local async cache with TTL support.
//!
//! Backs the login lookup cache. Entries live in a `DashMap`, expire lazily on
//! read and are swept by a background task. Clones share storage, the sweeper
//! and the invalidation generation.

use crate::error::Result;
use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::task::JoinHandle;

/// A cache entry with optional expiration time.
#[derive(Debug, Clone)]
struct CacheEntry<V> {
    value: V,
    /// None means no expiration
    expires_at: Option<DateTime<Utc>>,
}

impl<V> CacheEntry<V> {
    fn new(value: V, ttl_seconds: Option<u64>) -> Self {
        Self {
            value,
            expires_at: ttl_seconds.map(|ttl| Utc::now() + Duration::seconds(ttl as i64)),
        }
    }

    fn is_expired(&self) -> bool {
        self.expires_at
            .map(|exp| exp < Utc::now())
            .unwrap_or(false)
    }
}

/// Cache configuration options.
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// Background cleanup interval in seconds (default: 60)
    pub cleanup_interval_seconds: u64,
    /// Default TTL in seconds for `set` (None means no expiration)
    pub default_ttl_seconds: Option<u64>,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            cleanup_interval_seconds: 60,
            default_ttl_seconds: None,
        }
    }
}

/// Aborts the sweeper once the last handle sharing it is dropped.
#[derive(Debug)]
struct CleanupTask(JoinHandle<()>);

impl Drop for CleanupTask {
    fn drop(&mut self) {
        self.0.abort();
    }
}

/// Local backend implementation using DashMap.
#[derive(Debug)]
pub struct LocalBackend<V> {
    storage: Arc<DashMap<String, CacheEntry<V>>>,
    cleanup_task: Arc<CleanupTask>,
    /// Bumped on every invalidation. Guarded inserts and invalidations hold
    /// the lock for their whole critical section.
    generation: Arc<Mutex<u64>>,
    config: CacheConfig,
}

impl<V> LocalBackend<V>
where
    V: Send + Sync + Clone + 'static,
{
    fn new(config: CacheConfig) -> Self {
        let storage = Arc::new(DashMap::new());
        let cleanup_task = Arc::new(CleanupTask(Self::spawn_cleanup_task(
            Arc::clone(&storage),
            config.cleanup_interval_seconds,
        )));

        Self {
            storage,
            cleanup_task,
            generation: Arc::new(Mutex::new(0)),
            config,
        }
    }

    fn spawn_cleanup_task(
        storage: Arc<DashMap<String, CacheEntry<V>>>,
        interval_seconds: u64,
    ) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut interval =
                tokio::time::interval(tokio::time::Duration::from_secs(interval_seconds.max(1)));
            loop {
                interval.tick().await;
                let before = storage.len();
                storage.retain(|_, entry| !entry.is_expired());
                let removed = before.saturating_sub(storage.len());
                if removed > 0 {
                    tracing::debug!(removed, "Swept expired cache entries");
                }
            }
        })
    }

    /// A poisoned lock still holds a valid counter.
    fn lock_generation(&self) -> MutexGuard<'_, u64> {
        self.generation
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn get(&self, key: &str) -> Option<V> {
        self.storage
            .get(key)
            .filter(|entry| !entry.is_expired())
            .map(|entry| entry.value.clone())
    }

    fn insert(&self, key: &str, value: V) {
        self.storage.insert(
            key.to_string(),
            CacheEntry::new(value, self.config.default_ttl_seconds),
        );
    }

    fn insert_if_generation(&self, entries: Vec<(String, V)>, seen: u64) -> bool {
        let current = self.lock_generation();
        if *current != seen {
            return false;
        }
        for (key, value) in entries {
            self.insert(&key, value);
        }
        true
    }

    fn invalidate(&self, keys: &[String]) {
        let mut current = self.lock_generation();
        *current += 1;
        for key in keys {
            self.storage.remove(key);
        }
    }
}

/// Cache handle shared through `AppState`.
///
/// Reads that fill the cache from the store should capture [`Cache::generation`]
/// before reading and write back with [`Cache::set_if_generation`], so a
/// concurrent [`Cache::invalidate`] cannot be undone by a stale value.
///
/// # Example
/// ```rust,no_run
/// use shiftdesk::cache::{Cache, CacheConfig};
///
/// # async fn run() -> shiftdesk::error::Result<()> {
/// let cache: Cache<String> = Cache::new_local(CacheConfig::default());
/// let seen = cache.generation().await?;
/// let id = "65f0c0ffee0000000000beef".to_string();
/// cache
///     .set_if_generation(vec![("user:email:kate@example.com".to_string(), id)], seen)
///     .await?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub enum Cache<V>
where
    V: Send + Sync + 'static,
{
    /// Local in-memory cache using DashMap
    LocalCache(LocalBackend<V>),
}

impl<V> Cache<V>
where
    V: Send + Sync + Clone + 'static,
{
    /// Create a new local cache. Must be called inside a tokio runtime.
    pub fn new_local(config: CacheConfig) -> Self {
        Self::LocalCache(LocalBackend::new(config))
    }

    /// Get a value by key. Expired entries read as `None`.
    pub async fn get(&self, key: &str) -> Result<Option<V>> {
        match self {
            Self::LocalCache(backend) => Ok(backend.get(key)),
        }
    }

    /// Set a value with the configured default TTL, unconditionally.
    pub async fn set(&self, key: &str, value: V) -> Result<()> {
        match self {
            Self::LocalCache(backend) => {
                backend.insert(key, value);
                Ok(())
            }
        }
    }

    /// Current invalidation generation.
    pub async fn generation(&self) -> Result<u64> {
        match self {
            Self::LocalCache(backend) => Ok(*backend.lock_generation()),
        }
    }

    /// Insert all entries, but only if no invalidation happened since `seen`
    /// was read. Returns whether the entries were stored.
    pub async fn set_if_generation(&self, entries: Vec<(String, V)>, seen: u64) -> Result<bool> {
        match self {
            Self::LocalCache(backend) => Ok(backend.insert_if_generation(entries, seen)),
        }
    }

    /// Remove the keys and advance the generation.
    pub async fn invalidate(&self, keys: &[String]) -> Result<()> {
        match self {
            Self::LocalCache(backend) => {
                backend.invalidate(keys);
                Ok(())
            }
        }
    }
}

impl<V> Clone for Cache<V>
where
    V: Send + Sync + 'static,
{
    fn clone(&self) -> Self {
        match self {
            Self::LocalCache(backend) => Self::LocalCache(LocalBackend {
                storage: Arc::clone(&backend.storage),
                cleanup_task: Arc::clone(&backend.cleanup_task),
                generation: Arc::clone(&backend.generation),
                config: backend.config.clone(),
            }),
        }
    }
}

#[cfg(test)]
impl<V> Cache<V>
where
    V: Send + Sync + 'static,
{
    /// Raw entry count, expired entries included.
    pub(crate) fn stored_entries(&self) -> usize {
        match self {
            Self::LocalCache(backend) => backend.storage.len(),
        }
    }
}
