//! In-memory session store
//!
//! A bounded LRU cache; suitable for development, tests and single-instance
//! deployments that can afford to lose sessions on restart.

use std::num::NonZeroUsize;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use lru::LruCache;
use parking_lot::Mutex;
use tracing::trace;

use super::SessionStore;
use crate::error::{Result, SessionError};

/// A stored payload with its absolute expiry
#[derive(Debug, Clone)]
pub struct StoreEntry {
    /// Expiry as unix milliseconds
    pub expires_at_ms: i64,
    /// Encoded session record
    pub payload: Vec<u8>,
}

impl StoreEntry {
    fn new(payload: Vec<u8>, ttl_secs: i64) -> Self {
        Self {
            expires_at_ms: now_ms().saturating_add(ttl_secs.saturating_mul(1000)),
            payload,
        }
    }

    /// An entry whose expiry is not in the future is logically absent
    pub fn is_expired(&self) -> bool {
        self.expires_at_ms <= now_ms()
    }
}

fn now_ms() -> i64 {
    Utc::now().timestamp_millis()
}

/// In-memory session store
///
/// Holds at most `capacity` sessions; the least recently used one is evicted
/// when a new id is stored into a full cache. Clones share the same cache.
#[derive(Clone)]
pub struct MemoryStore {
    cache: Option<Arc<Mutex<LruCache<String, StoreEntry>>>>,
}

impl MemoryStore {
    /// Create a memory store holding up to `capacity` sessions
    pub fn new(capacity: usize) -> Result<Self> {
        let cap = NonZeroUsize::new(capacity).ok_or(SessionError::InvalidCapacity)?;
        Ok(Self {
            cache: Some(Arc::new(Mutex::new(LruCache::new(cap)))),
        })
    }

    /// A store without backing cache; every operation fails with
    /// [`SessionError::NotInitialized`].
    pub fn detached() -> Self {
        Self { cache: None }
    }

    fn cache(&self) -> Result<&Mutex<LruCache<String, StoreEntry>>> {
        self.cache.as_deref().ok_or(SessionError::NotInitialized)
    }

    /// Number of entries held, expired ones included
    pub fn len(&self) -> Result<usize> {
        Ok(self.cache()?.lock().len())
    }

    /// Whether the store holds no entries
    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }
}

impl std::fmt::Debug for MemoryStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut s = f.debug_struct("MemoryStore");
        match &self.cache {
            Some(cache) => {
                let cache = cache.lock();
                let (len, cap) = (cache.len(), cache.cap());
                s.field("len", &len).field("cap", &cap);
            }
            None => {
                s.field("cache", &"detached");
            }
        }
        s.finish()
    }
}

#[async_trait]
impl SessionStore for MemoryStore {
    async fn get(&self, id: &str) -> Result<Vec<u8>> {
        let mut cache = self.cache()?.lock();

        let expired = match cache.get(id) {
            Some(entry) if !entry.is_expired() => return Ok(entry.payload.clone()),
            Some(_) => true,
            None => false,
        };
        if expired {
            trace!(session_id = %id, "Purging expired session");
            cache.pop(id);
        }
        Ok(Vec::new())
    }

    async fn set(&self, id: &str, payload: &[u8], ttl_secs: i64) -> Result<()> {
        let entry = StoreEntry::new(payload.to_vec(), ttl_secs);
        let mut cache = self.cache()?.lock();
        if let Some((evicted, _)) = cache.push(id.to_string(), entry) {
            if evicted != id {
                trace!(session_id = %evicted, "Evicted least recently used session");
            }
        }
        Ok(())
    }

    async fn destroy(&self, id: &str) -> Result<()> {
        self.cache()?.lock().pop(id);
        Ok(())
    }
}
