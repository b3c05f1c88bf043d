//! Session configuration

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};

use crate::codec::{JsonCodec, SerdeJsonCodec};
use crate::cookies::{CookieOptions, SameSite};
use crate::id::IdGenerator;

/// Default session cookie name
pub const DEFAULT_COOKIE_NAME: &str = "sess";

/// Default max age (one day), used for both cookie and store TTL
pub const DEFAULT_MAX_AGE: i64 = 86400;

/// Configuration shared by every session of a handler
#[derive(Clone)]
pub struct SessionConfig {
    /// Name of the session cookie (default: "sess")
    pub key: String,

    /// Max age in seconds. This is the store TTL on commit; the cookie
    /// max-age mirrors it unless overridden with [`SessionConfig::with_cookie_max_age`].
    pub max_age: i64,

    /// Attributes and signing keys for the session cookie
    pub cookie: CookieOptions,

    /// Identifier strategy for new sessions
    pub id_generator: IdGenerator,

    /// Record encoding
    pub codec: Arc<dyn JsonCodec>,
}

impl fmt::Debug for SessionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionConfig")
            .field("key", &self.key)
            .field("max_age", &self.max_age)
            .field("cookie", &self.cookie)
            .field("id_generator", &self.id_generator)
            .finish_non_exhaustive()
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            key: DEFAULT_COOKIE_NAME.to_string(),
            max_age: DEFAULT_MAX_AGE,
            cookie: CookieOptions {
                max_age: Some(DEFAULT_MAX_AGE),
                ..Default::default()
            },
            id_generator: IdGenerator::default(),
            codec: Arc::new(SerdeJsonCodec),
        }
    }
}

impl SessionConfig {
    /// Create a configuration with defaults and no signing
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a configuration that signs cookies with the given keys.
    /// The first key signs; all keys are tried when verifying.
    pub fn with_keys<I, S>(keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut config = Self::default();
        config.cookie.keys = keys.into_iter().map(Into::into).collect();
        config
    }

    /// Set the cookie name (default: "sess")
    pub fn with_key<S: Into<String>>(mut self, key: S) -> Self {
        self.key = key.into();
        self
    }

    /// Set max age in seconds for the store TTL and the cookie
    pub fn with_max_age(mut self, max_age: i64) -> Self {
        self.max_age = max_age;
        self.cookie.max_age = Some(max_age);
        self
    }

    /// Set max age from Duration
    pub fn with_max_age_duration(self, duration: Duration) -> Self {
        self.with_max_age(i64::try_from(duration.as_secs()).unwrap_or(i64::MAX))
    }

    /// Override the cookie max-age only. `None` gives a browser-session cookie.
    pub fn with_cookie_max_age(mut self, max_age: impl Into<Option<i64>>) -> Self {
        self.cookie.max_age = max_age.into();
        self
    }

    /// Set the cookie path (default: "/")
    pub fn with_cookie_path<S: Into<String>>(mut self, path: S) -> Self {
        self.cookie.path = path.into();
        self
    }

    /// Set the cookie domain
    pub fn with_cookie_domain<S: Into<String>>(mut self, domain: S) -> Self {
        self.cookie.domain = Some(domain.into());
        self
    }

    /// Set an absolute cookie expiry
    pub fn with_cookie_expires(mut self, expires: DateTime<Utc>) -> Self {
        self.cookie.expires = Some(expires);
        self
    }

    /// Set the HttpOnly flag (default: true)
    pub fn with_http_only(mut self, http_only: bool) -> Self {
        self.cookie.http_only = http_only;
        self
    }

    /// Set the Secure flag (default: false)
    pub fn with_secure(mut self, secure: bool) -> Self {
        self.cookie.secure = secure;
        self
    }

    /// Set the SameSite attribute
    pub fn with_same_site(mut self, same_site: SameSite) -> Self {
        self.cookie.same_site = Some(same_site);
        self
    }

    /// Replace all cookie attributes at once, e.g. from deserialized app config.
    /// Signing keys are taken from `options.keys`.
    pub fn with_cookie_options(mut self, options: CookieOptions) -> Self {
        self.cookie = options;
        self
    }

    /// Set the identifier generator
    pub fn with_id_generator(mut self, id_generator: IdGenerator) -> Self {
        self.id_generator = id_generator;
        self
    }

    /// Set the record codec
    pub fn with_codec(mut self, codec: Arc<dyn JsonCodec>) -> Self {
        self.codec = codec;
        self
    }

    /// Get max age as Duration (zero when negative)
    pub fn max_age_duration(&self) -> Duration {
        Duration::from_secs(self.max_age.max(0) as u64)
    }

    /// Whether cookies are signed
    pub fn is_signed(&self) -> bool {
        !self.cookie.keys.is_empty()
    }
}
