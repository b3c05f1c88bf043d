//! Session store trait

use async_trait::async_trait;

use crate::error::Result;

/// Trait for session storage backends
///
/// Payloads are opaque bytes (the encoded session record) stored under the
/// session identifier. Absence is never an error: `get` on a missing,
/// expired or destroyed key returns an empty payload, and `destroy` on a
/// missing key succeeds. Errors are reserved for backend failures.
#[async_trait]
pub trait SessionStore: Send + Sync + 'static {
    /// Get the payload stored under `id`, empty when there is none
    async fn get(&self, id: &str) -> Result<Vec<u8>>;

    /// Store `payload` under `id` for `ttl_secs` seconds from now.
    ///
    /// A TTL of zero or less stores nothing readable.
    async fn set(&self, id: &str, payload: &[u8], ttl_secs: i64) -> Result<()>;

    /// Remove the payload stored under `id`
    async fn destroy(&self, id: &str) -> Result<()>;
}
