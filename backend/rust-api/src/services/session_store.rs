use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use redis::aio::ConnectionManager;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::RwLock;

use crate::metrics::track_store_operation;

/// Key/value storage for serialized visitor sessions.
#[async_trait]
pub trait SessionStore: Send + Sync {
    fn backend(&self) -> &'static str;

    async fn load(&self, session_id: &str) -> Result<Option<String>>;

    async fn save(&self, session_id: &str, payload: String, ttl_seconds: u64) -> Result<()>;

    /// Cheap liveness probe used by `/health`.
    async fn ping(&self) -> Result<()>;
}

/// Saves between full sweeps of expired records in the memory store.
const SWEEP_EVERY_SAVES: u64 = 256;

struct MemoryEntry {
    payload: String,
    expires_at: DateTime<Utc>,
}

/// Process-local store. Records vanish on restart.
///
/// Expired records are dropped when read, and a full sweep runs once every
/// [`SWEEP_EVERY_SAVES`] saves to catch visitors that never come back.
#[derive(Default)]
pub struct MemorySessionStore {
    entries: RwLock<HashMap<String, MemoryEntry>>,
    saves: AtomicU64,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    fn backend(&self) -> &'static str {
        "memory"
    }

    async fn load(&self, session_id: &str) -> Result<Option<String>> {
        track_store_operation(self.backend(), "get", async {
            let now = Utc::now();
            {
                let entries = self.entries.read().await;
                match entries.get(session_id) {
                    None => return Ok(None),
                    Some(entry) if entry.expires_at > now => {
                        return Ok(Some(entry.payload.clone()))
                    }
                    Some(_) => {}
                }
            }

            // Expired: re-check under the write lock in case a save raced us.
            let mut entries = self.entries.write().await;
            if entries
                .get(session_id)
                .is_some_and(|entry| entry.expires_at <= now)
            {
                entries.remove(session_id);
                tracing::debug!("Dropped expired session {}", session_id);
            }
            Ok(None)
        })
        .await
    }

    async fn save(&self, session_id: &str, payload: String, ttl_seconds: u64) -> Result<()> {
        track_store_operation(self.backend(), "set", async {
            let now = Utc::now();
            let ttl = Duration::seconds(ttl_seconds.min(i32::MAX as u64) as i64);
            let mut entries = self.entries.write().await;

            let saves = self.saves.fetch_add(1, Ordering::Relaxed) + 1;
            if saves % SWEEP_EVERY_SAVES == 0 {
                let before = entries.len();
                entries.retain(|_, entry| entry.expires_at > now);
                tracing::debug!("Swept {} expired sessions", before - entries.len());
            }
            entries.insert(
                session_id.to_string(),
                MemoryEntry {
                    payload,
                    expires_at: now + ttl,
                },
            );
            Ok(())
        })
        .await
    }

    async fn ping(&self) -> Result<()> {
        Ok(())
    }
}

/// Stores each record under `session:{id}` with a TTL refreshed on every save.
pub struct RedisSessionStore {
    redis: ConnectionManager,
}

impl RedisSessionStore {
    pub async fn connect(redis_uri: &str) -> Result<Self> {
        let client = redis::Client::open(redis_uri).context("Invalid Redis URI")?;

        tracing::info!("Attempting to connect to Redis...");

        let redis = tokio::time::timeout(
            std::time::Duration::from_secs(30),
            ConnectionManager::new(client),
        )
        .await
        .map_err(|_| anyhow::anyhow!("Redis connection timeout after 30s"))??;

        let store = Self { redis };

        tokio::time::timeout(std::time::Duration::from_secs(5), store.ping())
            .await
            .map_err(|_| anyhow::anyhow!("Redis PING timeout after 5s"))??;

        tracing::info!("Redis connection established successfully");

        Ok(store)
    }

    fn key(session_id: &str) -> String {
        format!("session:{}", session_id)
    }
}

#[async_trait]
impl SessionStore for RedisSessionStore {
    fn backend(&self) -> &'static str {
        "redis"
    }

    async fn load(&self, session_id: &str) -> Result<Option<String>> {
        let mut conn = self.redis.clone();
        let key = Self::key(session_id);

        track_store_operation(self.backend(), "get", async {
            redis::cmd("GET")
                .arg(&key)
                .query_async::<Option<String>>(&mut conn)
                .await
                .context("Failed to read session from Redis")
        })
        .await
    }

    async fn save(&self, session_id: &str, payload: String, ttl_seconds: u64) -> Result<()> {
        let mut conn = self.redis.clone();
        let key = Self::key(session_id);

        track_store_operation(self.backend(), "setex", async {
            redis::cmd("SETEX")
                .arg(&key)
                .arg(ttl_seconds)
                .arg(payload)
                .query_async::<()>(&mut conn)
                .await
                .context("Failed to save session to Redis")
        })
        .await
    }

    async fn ping(&self) -> Result<()> {
        let mut conn = self.redis.clone();
        redis::cmd("PING")
            .query_async::<String>(&mut conn)
            .await
            .context("Redis PING failed")?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn memory_store_round_trips_payload() {
        let store = MemorySessionStore::new();
        assert!(store.load("abc").await.unwrap().is_none());

        store.save("abc", "{}".to_string(), 60).await.unwrap();
        assert_eq!(store.load("abc").await.unwrap().as_deref(), Some("{}"));

        store.save("abc", "{\"a\":1}".to_string(), 60).await.unwrap();
        assert_eq!(store.len().await, 1);
        assert_eq!(
            store.load("abc").await.unwrap().as_deref(),
            Some("{\"a\":1}")
        );
    }

    #[tokio::test]
    async fn memory_store_drops_expired_entry_on_read() {
        let store = MemorySessionStore::new();
        store.save("old", "x".to_string(), 0).await.unwrap();
        assert_eq!(store.len().await, 1);

        assert!(store.load("old").await.unwrap().is_none());
        assert!(store.is_empty().await);
        assert!(store.ping().await.is_ok());
    }

    #[tokio::test]
    async fn memory_store_sweeps_periodically_on_save() {
        let store = MemorySessionStore::new();
        store.save("stale", "x".to_string(), 0).await.unwrap();

        for i in 1..SWEEP_EVERY_SAVES - 1 {
            store.save("live", format!("{i}"), 60).await.unwrap();
        }
        // Not swept yet, and never read.
        assert_eq!(store.len().await, 2);

        store.save("live", "last".to_string(), 60).await.unwrap();
        assert_eq!(store.len().await, 1);
        assert_eq!(store.load("live").await.unwrap().as_deref(), Some("last"));
    }
}
