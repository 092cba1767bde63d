//! Standings cache: standings are derived data, so the table is cached as
//! serialized bytes with a short TTL and invalidated whenever a result
//! changes.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;
use tokio::time::Instant;

/// How long a computed standings table stays fresh
pub const DEFAULT_STANDINGS_TTL: Duration = Duration::from_secs(60);

/// Byte-level cache for computed standings tables.
#[async_trait]
pub trait StandingsCache: Send + Sync {
    /// A fresh cached value for `key`, if any
    async fn get(&self, key: &str) -> Option<Vec<u8>>;

    /// Store `value` under `key` for `ttl`
    async fn set(&self, key: &str, value: Vec<u8>, ttl: Duration);

    /// Drop every entry whose key starts with `key_prefix`. Group-filtered
    /// tables share a tournament prefix, so one result change clears them
    /// all.
    async fn invalidate(&self, key_prefix: &str);
}

/// In-memory TTL cache
#[derive(Default)]
pub struct MemoryCache {
    entries: Mutex<HashMap<String, (Instant, Vec<u8>)>>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl StandingsCache for MemoryCache {
    async fn get(&self, key: &str) -> Option<Vec<u8>> {
        let mut entries = self.entries.lock().unwrap();
        match entries.get(key) {
            Some((expires_at, value)) if *expires_at > Instant::now() => Some(value.clone()),
            Some(_) => {
                entries.remove(key);
                None
            }
            None => None,
        }
    }

    async fn set(&self, key: &str, value: Vec<u8>, ttl: Duration) {
        self.entries
            .lock()
            .unwrap()
            .insert(key.to_string(), (Instant::now() + ttl, value));
    }

    async fn invalidate(&self, key_prefix: &str) {
        self.entries
            .lock()
            .unwrap()
            .retain(|key, _| !key.starts_with(key_prefix));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_set_then_get() {
        let cache = MemoryCache::new();
        cache
            .set("standings:t1", b"table".to_vec(), Duration::from_secs(60))
            .await;
        assert_eq!(cache.get("standings:t1").await, Some(b"table".to_vec()));
        assert_eq!(cache.get("standings:t2").await, None);
    }

    #[tokio::test]
    async fn test_entries_expire() {
        let cache = MemoryCache::new();
        cache
            .set("standings:t1", b"table".to_vec(), Duration::from_millis(20))
            .await;
        tokio::time::sleep(Duration::from_millis(40)).await;
        assert_eq!(cache.get("standings:t1").await, None);
    }

    #[tokio::test]
    async fn test_invalidate_clears_by_prefix() {
        let cache = MemoryCache::new();
        let ttl = Duration::from_secs(60);
        cache.set("standings:t1", b"all".to_vec(), ttl).await;
        cache.set("standings:t1:group:0", b"g0".to_vec(), ttl).await;
        cache.set("standings:t2", b"other".to_vec(), ttl).await;

        cache.invalidate("standings:t1").await;

        assert_eq!(cache.get("standings:t1").await, None);
        assert_eq!(cache.get("standings:t1:group:0").await, None);
        assert_eq!(
            cache.get("standings:t2").await,
            Some(b"other".to_vec()),
            "other tournaments keep their entries"
        );
    }
}
