//! # salvo-session-store
//!
//! Cookie-keyed, server-side sessions for the Salvo web framework.
//!
//! Each request gets a [`Session`] whose identifier travels in a cookie
//! (optionally HMAC-signed with a companion `.sig` cookie) and whose record is
//! kept in a pluggable [`SessionStore`].
//!
//! ## Features
//!
//! - **Lazy sessions**: nothing is read until a handler calls `fetch`, nothing
//!   is written unless the record was modified
//! - **At-most-once commit**: a request writes its session once; a failed
//!   write can be retried
//! - **Pluggable storage backends**: an LRU memory store, Redis, or custom stores
//! - **Signed cookies** with key rotation
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use salvo::prelude::*;
//! use salvo_session_store::{MemoryStore, SessionConfig, SessionDepotExt, SessionHandler};
//!
//! #[tokio::main]
//! async fn main() {
//!     let store = MemoryStore::new(10_000).unwrap();
//!     let session_config = SessionConfig::with_keys(["your-secret-key"])
//!         .with_key("sess")
//!         .with_max_age(86400);
//!
//!     let session_handler = SessionHandler::new(store, session_config);
//!
//!     let router = Router::new()
//!         .hoop(session_handler)
//!         .get(index);
//!
//!     let acceptor = TcpListener::new("127.0.0.1:5800").bind().await;
//!     Server::new(acceptor).serve(router).await;
//! }
//!
//! #[handler]
//! async fn index(depot: &mut Depot) -> String {
//!     let session = depot.session_mut().unwrap();
//!     session.fetch().await.unwrap();
//!     let views = session.get_int("views") + 1;
//!     session.set("views", views).unwrap();
//!     format!("views: {}", views)
//! }
//! ```

mod cast;
pub mod codec;
pub mod config;
pub mod cookie_signature;
pub mod cookies;
pub mod error;
pub mod handler;
pub mod id;
pub mod session;
pub mod store;

pub use codec::{JsonCodec, SerdeJsonCodec};
pub use config::SessionConfig;
pub use cookies::{CookieOptions, Cookies, SameSite};
pub use error::{Result, SessionError};
pub use handler::SessionHandler;
pub use id::{IdGenerator, IdStrategy};
pub use session::{Lifecycle, MockSession, Record, Session, CREATED_AT, UPDATED_AT};
pub use store::{MemoryStore, SessionStore, StoreEntry};

#[cfg(feature = "redis-store")]
pub use store::{RedisStore, RedisStoreBuilder};

/// Extension trait for Depot to easily access session
pub mod depot_ext;
pub use depot_ext::SessionDepotExt;
