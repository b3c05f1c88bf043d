//! Per-request session handle
//!
//! A [`Session`] lazily loads its record from the store the first time
//! [`Session::fetch`] is called, tracks mutations, and writes the record back
//! at most once per request through [`Session::commit`].
//!
//! ```rust,ignore
//! let mut session = Session::new(store, Cookies::from_request(req, options), config);
//! session.fetch().await?;
//! session.set("views", session.get_int("views") + 1)?;
//! session.commit().await?;
//! ```

use std::sync::Arc;

use chrono::{SecondsFormat, Utc};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};
use tracing::{debug, trace};

use crate::cast;
use crate::config::SessionConfig;
use crate::cookies::Cookies;
use crate::error::{Result, SessionError};
use crate::store::{MemoryStore, SessionStore};

/// Key holding the RFC3339 creation time of a record
pub const CREATED_AT: &str = "_createdAt";
/// Key holding the RFC3339 time of the last mutation
pub const UPDATED_AT: &str = "_updatedAt";

/// Session payload: a JSON object
pub type Record = Map<String, Value>;

/// Where a session is in its per-request lifecycle
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Lifecycle {
    /// Nothing read yet
    Unfetched,
    /// Record loaded (or initialized), no mutation
    Fetched,
    /// Record mutated since fetch, not yet written
    Dirty,
    /// Record written to the store; later commits are no-ops
    Committed,
}

enum State {
    Unfetched,
    Fetched(Record),
    Dirty(Record),
    Committed(Record),
}

impl State {
    fn lifecycle(&self) -> Lifecycle {
        match self {
            State::Unfetched => Lifecycle::Unfetched,
            State::Fetched(_) => Lifecycle::Fetched,
            State::Dirty(_) => Lifecycle::Dirty,
            State::Committed(_) => Lifecycle::Committed,
        }
    }

    fn record(&self) -> Option<&Record> {
        match self {
            State::Unfetched => None,
            State::Fetched(r) | State::Dirty(r) | State::Committed(r) => Some(r),
        }
    }

    fn record_mut(&mut self) -> Option<&mut Record> {
        match self {
            State::Unfetched => None,
            State::Fetched(r) | State::Dirty(r) | State::Committed(r) => Some(r),
        }
    }

    fn into_dirty(self) -> Self {
        match self {
            State::Fetched(r) => State::Dirty(r),
            other => other,
        }
    }

    fn into_committed(self) -> Self {
        match self {
            State::Dirty(r) => State::Committed(r),
            other => other,
        }
    }
}

fn now_rfc3339() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true)
}

fn fresh_record() -> Record {
    let mut record = Record::new();
    record.insert(CREATED_AT.to_string(), Value::String(now_rfc3339()));
    record
}

fn is_reserved(key: &str) -> bool {
    key == CREATED_AT || key == UPDATED_AT
}

/// Null deletes, anything else overwrites. Empty and reserved keys are skipped.
fn apply(record: &mut Record, key: String, value: Value) {
    if key.is_empty() || is_reserved(&key) {
        trace!(key = %key, "Ignoring write to empty or reserved session key");
        return;
    }
    if value.is_null() {
        record.remove(&key);
    } else {
        record.insert(key, value);
    }
}

/// Session wrapper that tracks modifications
///
/// Owned by a single request; not meant to be shared between tasks.
pub struct Session {
    id: String,
    state: State,
    store: Arc<dyn SessionStore>,
    cookies: Cookies,
    config: Arc<SessionConfig>,
}

/// Named fields for [`Session::mock`]
#[derive(Debug, Clone, Default)]
pub struct MockSession {
    /// Identifier the session already carries
    pub id: String,
    /// Loaded record; required when `modified` or `committed` is set
    pub record: Option<Record>,
    /// Record mutated since fetch
    pub modified: bool,
    /// Record already written
    pub committed: bool,
    /// Sign cookies written by the session
    pub signed: bool,
}

const MOCK_STORE_CAPACITY: usize = 128;
const MOCK_SIGNING_KEY: &str = "mock-session-key";

impl Session {
    /// Create a session for one request
    pub fn new(store: Arc<dyn SessionStore>, cookies: Cookies, config: Arc<SessionConfig>) -> Self {
        Self {
            id: String::new(),
            state: State::Unfetched,
            store,
            cookies,
            config,
        }
    }

    /// Build a session in a given state, for tests.
    ///
    /// The session gets its own in-memory store and an empty cookie jar.
    /// Fails with [`SessionError::InvalidState`] when the flags and record
    /// describe a state a real session cannot reach.
    pub fn mock(mock: MockSession) -> Result<Self> {
        let state = match (mock.record, mock.modified, mock.committed) {
            (None, false, false) => State::Unfetched,
            (Some(r), false, false) => State::Fetched(r),
            (Some(r), true, false) => State::Dirty(r),
            (Some(r), true, true) => State::Committed(r),
            (None, _, _) => {
                return Err(SessionError::InvalidState(
                    "modified or committed session needs a record".to_string(),
                ))
            }
            (Some(_), false, true) => {
                return Err(SessionError::InvalidState(
                    "committed session must be modified".to_string(),
                ))
            }
        };

        let mut config = SessionConfig::new();
        if mock.signed {
            config.cookie.keys = vec![MOCK_SIGNING_KEY.to_string()];
        }
        let store = MemoryStore::new(MOCK_STORE_CAPACITY)?;

        Ok(Self {
            id: mock.id,
            state,
            store: Arc::new(store),
            cookies: Cookies::empty(config.cookie.clone()),
            config: Arc::new(config),
        })
    }

    /// The session identifier; empty until read from a cookie or minted
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Current lifecycle state
    pub fn lifecycle(&self) -> Lifecycle {
        self.state.lifecycle()
    }

    /// Whether session cookies are signed
    pub fn is_signed(&self) -> bool {
        self.cookies.is_signed()
    }

    /// The backing store
    pub fn store(&self) -> &Arc<dyn SessionStore> {
        &self.store
    }

    /// The cookie adapter, with any cookies queued for the response
    pub fn cookies(&self) -> &Cookies {
        &self.cookies
    }

    /// Give up the session, keeping the cookies queued for the response
    pub fn into_cookies(self) -> Cookies {
        self.cookies
    }

    fn cookie_value(&self) -> Option<String> {
        self.cookies
            .get(&self.config.key, self.is_signed())
            .filter(|v| !v.is_empty())
    }

    /// Load the record. Memoized: only the first call reads the cookie and
    /// the store.
    ///
    /// A missing cookie, a bad signature or an empty payload all yield a
    /// fresh record holding only `_createdAt`. Store failures are returned.
    pub async fn fetch(&mut self) -> Result<&Record> {
        if let State::Unfetched = self.state {
            let record = self.load().await?;
            self.state = State::Fetched(record);
        }
        self.state.record().ok_or(SessionError::NotFetched)
    }

    async fn load(&mut self) -> Result<Record> {
        let mut payload = Vec::new();
        if let Some(id) = self.cookie_value() {
            self.id = id;
            payload = self.store.get(&self.id).await?;
        }

        if payload.is_empty() {
            debug!(session_id = %self.id, "No stored session, starting fresh");
            return Ok(fresh_record());
        }
        trace!(session_id = %self.id, bytes = payload.len(), "Session loaded");
        self.config.codec.unmarshal(&payload)
    }

    /// The record, `None` before fetch
    pub fn data(&self) -> Option<&Record> {
        self.state.record()
    }

    /// Raw value of `key`.
    ///
    /// This and the typed getters below never fail: before [`Session::fetch`]
    /// or on a missing key they return nothing or the zero value, which can
    /// hide a forgotten `fetch`. Check `fetch`'s result instead.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.state.record()?.get(key)
    }

    /// Deserialize `key` into `T`, `None` when absent or of another shape
    pub fn get_as<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        self.get(key)
            .and_then(|v| serde_json::from_value(v.clone()).ok())
    }

    /// `key` as bool, `false` when absent or not convertible
    pub fn get_bool(&self, key: &str) -> bool {
        cast::to_bool(self.get(key))
    }

    /// `key` as string, empty when absent or not convertible
    pub fn get_string(&self, key: &str) -> String {
        cast::to_string(self.get(key))
    }

    /// `key` as integer, `0` when absent or not convertible
    pub fn get_int(&self, key: &str) -> i64 {
        cast::to_int(self.get(key))
    }

    /// `key` as float, `0.0` when absent or not convertible
    pub fn get_float64(&self, key: &str) -> f64 {
        cast::to_float64(self.get(key))
    }

    /// `key` as list of strings, empty when absent or not convertible
    pub fn get_string_slice(&self, key: &str) -> Vec<String> {
        cast::to_string_slice(self.get(key))
    }

    /// Creation time, empty before fetch
    pub fn created_at(&self) -> String {
        self.get_string(CREATED_AT)
    }

    /// Last mutation time, empty before fetch or until the first mutation
    pub fn updated_at(&self) -> String {
        self.get_string(UPDATED_AT)
    }

    fn touch(&mut self) {
        if let Some(record) = self.state.record_mut() {
            record.insert(UPDATED_AT.to_string(), Value::String(now_rfc3339()));
        }
        let state = std::mem::replace(&mut self.state, State::Unfetched);
        self.state = state.into_dirty();
    }

    /// Set `key` to `value`; a value serializing to `null` removes the key.
    ///
    /// An empty key is ignored. Always stamps `_updatedAt` and marks the
    /// session modified, even when nothing actually changed.
    pub fn set<V: Serialize>(&mut self, key: &str, value: V) -> Result<()> {
        if key.is_empty() {
            return Ok(());
        }
        let record = self.state.record_mut().ok_or(SessionError::NotFetched)?;
        apply(record, key.to_string(), serde_json::to_value(value)?);
        self.touch();
        Ok(())
    }

    /// Remove `key`; same as setting it to `null`
    pub fn remove(&mut self, key: &str) -> Result<()> {
        self.set(key, Value::Null)
    }

    /// Apply several values at once, with the same rules as [`Session::set`].
    /// `None` does nothing.
    pub fn set_map(&mut self, values: Option<Record>) -> Result<()> {
        let Some(values) = values else {
            return Ok(());
        };
        let record = self.state.record_mut().ok_or(SessionError::NotFetched)?;
        for (key, value) in values {
            apply(record, key, value);
        }
        self.touch();
        Ok(())
    }

    /// Stamp `_updatedAt` and re-issue the session cookie to extend its
    /// client-side lifetime. Does not touch the store.
    pub fn refresh(&mut self) -> Result<()> {
        if self.state.record().is_none() {
            return Err(SessionError::NotFetched);
        }
        self.touch();
        if !self.id.is_empty() {
            let id = self.id.clone();
            self.add_session_cookie(id);
        }
        Ok(())
    }

    /// Delete the stored record of the request's session cookie and reset
    /// the in-memory record. The cookie itself is left alone.
    pub async fn destroy(&mut self) -> Result<()> {
        let Some(id) = self.cookie_value() else {
            return Ok(());
        };
        self.store.destroy(&id).await?;
        debug!(session_id = %id, "Session destroyed");

        if let Some(record) = self.state.record_mut() {
            *record = fresh_record();
        }
        Ok(())
    }

    /// Write a modified record to the store with the configured max age.
    ///
    /// Mints an identifier and its cookie on the first write of a new
    /// session. Only a successful write marks the session committed, so a
    /// failed commit can be retried by calling this again.
    pub async fn commit(&mut self) -> Result<()> {
        if self.lifecycle() != Lifecycle::Dirty {
            return Ok(());
        }
        if self.id.is_empty() {
            self.regenerate_cookie();
        }

        let payload = match self.state.record() {
            Some(record) => self.config.codec.marshal(record)?,
            None => return Ok(()),
        };
        self.store
            .set(&self.id, &payload, self.config.max_age)
            .await?;
        debug!(session_id = %self.id, bytes = payload.len(), "Session committed");

        let state = std::mem::replace(&mut self.state, State::Unfetched);
        self.state = state.into_committed();
        Ok(())
    }

    /// Mint a new identifier and queue its cookie. No-op once committed.
    pub fn regenerate_cookie(&mut self) {
        if self.lifecycle() == Lifecycle::Committed {
            return;
        }
        let id = self.config.id_generator.generate();
        self.add_session_cookie(id);
    }

    fn add_session_cookie(&mut self, id: String) {
        let cookie = self.cookies.create_cookie(&self.config.key, &id);
        let signed = self.is_signed();
        self.cookies.set(cookie, signed);
        self.id = id;
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("id", &self.id)
            .field("lifecycle", &self.lifecycle())
            .field("data", &self.state.record())
            .finish()
    }
}
