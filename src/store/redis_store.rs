//! Redis session store
//!
//! - Key: the session identifier, verbatim
//! - Value: the encoded session record
//! - TTL: `EX` seconds from the commit's max age

use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::{AsyncCommands, ConnectionInfo, IntoConnectionInfo};
use tracing::trace;

use super::SessionStore;
use crate::error::Result;

/// Redis session store
///
/// Concurrency is whatever the shared [`ConnectionManager`] gives; clones
/// multiplex over the same connection.
///
/// # Example
///
/// ```rust,ignore
/// use salvo_session_store::RedisStore;
///
/// let store = RedisStore::from_url("redis://127.0.0.1/").await?;
/// ```
#[derive(Clone)]
pub struct RedisStore {
    conn: ConnectionManager,
}

enum Backend {
    Client(redis::Client),
    Manager(ConnectionManager),
}

/// Builder for [`RedisStore`]
///
/// Takes either a ready client or connection options. When both are given
/// the client wins; when neither is given [`RedisStoreBuilder::build`] panics.
#[derive(Default)]
pub struct RedisStoreBuilder {
    backend: Option<Backend>,
    options: Option<ConnectionInfo>,
}

impl RedisStoreBuilder {
    /// Use an existing Redis client
    pub fn client(mut self, client: redis::Client) -> Self {
        self.backend = Some(Backend::Client(client));
        self
    }

    /// Use an existing connection manager
    pub fn connection_manager(mut self, conn: ConnectionManager) -> Self {
        self.backend = Some(Backend::Manager(conn));
        self
    }

    /// Connect with these options when no client is given
    pub fn options(mut self, options: ConnectionInfo) -> Self {
        self.options = Some(options);
        self
    }

    /// Connect and build the store.
    ///
    /// # Panics
    ///
    /// Panics when neither a client nor connection options were supplied.
    pub async fn build(self) -> Result<RedisStore> {
        let conn = match (self.backend, self.options) {
            (Some(Backend::Manager(conn)), _) => conn,
            (Some(Backend::Client(client)), _) => ConnectionManager::new(client).await?,
            (None, Some(options)) => ConnectionManager::new(redis::Client::open(options)?).await?,
            (None, None) => panic!("redis store needs either a client or connection options"),
        };
        Ok(RedisStore { conn })
    }
}

impl RedisStore {
    /// Start building a store
    pub fn builder() -> RedisStoreBuilder {
        RedisStoreBuilder::default()
    }

    /// Create a store from an existing client
    pub async fn new(client: redis::Client) -> Result<Self> {
        Self::builder().client(client).build().await
    }

    /// Create a store from a connection string
    pub async fn from_url(url: &str) -> Result<Self> {
        Self::builder()
            .options(url.into_connection_info()?)
            .build()
            .await
    }

    /// Create a store from an existing connection manager
    pub fn from_connection_manager(conn: ConnectionManager) -> Self {
        Self { conn }
    }
}

#[async_trait]
impl SessionStore for RedisStore {
    async fn get(&self, id: &str) -> Result<Vec<u8>> {
        let mut conn = self.conn.clone();
        let data: Option<Vec<u8>> = conn.get(id).await?;
        Ok(data.unwrap_or_default())
    }

    async fn set(&self, id: &str, payload: &[u8], ttl_secs: i64) -> Result<()> {
        let mut conn = self.conn.clone();

        if ttl_secs > 0 {
            conn.set_ex::<_, _, ()>(id, payload, ttl_secs as u64).await?;
        } else {
            // Redis rejects EX 0; a non-positive TTL means the payload is born expired
            trace!(session_id = %id, ttl_secs, "Non-positive TTL, deleting session");
            conn.del::<_, ()>(id).await?;
        }

        Ok(())
    }

    async fn destroy(&self, id: &str) -> Result<()> {
        let mut conn = self.conn.clone();
        conn.del::<_, ()>(id).await?;
        Ok(())
    }
}
