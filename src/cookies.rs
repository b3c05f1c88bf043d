//! Cookie adapter
//!
//! [`Cookies`] owns a snapshot of the request's cookie jar and collects the
//! cookies a session wants to send back, signing them when keys are
//! configured. The middleware writes the collected cookies to the response
//! once the session has been committed.

use chrono::{DateTime, Utc};
use salvo_core::http::cookie::time::{Duration as CookieDuration, OffsetDateTime};
use salvo_core::http::cookie::{self, Cookie, CookieJar};
use salvo_core::http::{Request, Response};
use serde::{Deserialize, Serialize};

use crate::cookie_signature::{signature_name, signed_payload, Keygrip};

/// SameSite cookie attribute
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SameSite {
    /// Strict - cookie only sent for same-site requests
    Strict,
    /// Lax - cookie sent for same-site requests and top-level navigations
    Lax,
    /// None - cookie sent for all requests (requires Secure)
    None,
}

impl From<SameSite> for cookie::SameSite {
    fn from(value: SameSite) -> Self {
        match value {
            SameSite::Strict => cookie::SameSite::Strict,
            SameSite::Lax => cookie::SameSite::Lax,
            SameSite::None => cookie::SameSite::None,
        }
    }
}

/// Attributes applied to every cookie the adapter writes
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CookieOptions {
    /// Cookie path (default: "/")
    pub path: String,
    /// Cookie domain (default: None - current domain only)
    pub domain: Option<String>,
    /// Absolute expiry
    pub expires: Option<DateTime<Utc>>,
    /// Max age in seconds
    pub max_age: Option<i64>,
    /// Secure flag (default: false)
    pub secure: bool,
    /// HttpOnly flag (default: true)
    pub http_only: bool,
    /// SameSite attribute
    pub same_site: Option<SameSite>,
    /// Signing keys; signing is enabled when this is non-empty
    pub keys: Vec<String>,
}

impl Default for CookieOptions {
    fn default() -> Self {
        Self {
            path: "/".to_string(),
            domain: None,
            expires: None,
            max_age: None,
            secure: false,
            http_only: true,
            same_site: None,
            keys: Vec::new(),
        }
    }
}

/// Read/write access to request and response cookies
#[derive(Debug, Clone)]
pub struct Cookies {
    incoming: CookieJar,
    outgoing: Vec<Cookie<'static>>,
    options: CookieOptions,
    keygrip: Option<Keygrip>,
}

impl Cookies {
    /// Create an adapter over an existing jar
    pub fn new(incoming: CookieJar, options: CookieOptions) -> Self {
        let keygrip = Keygrip::new(options.keys.iter().cloned());
        Self {
            incoming,
            outgoing: Vec::new(),
            options,
            keygrip,
        }
    }

    /// Snapshot the cookies of a Salvo request
    pub fn from_request(req: &Request, options: CookieOptions) -> Self {
        Self::new(req.cookies().clone(), options)
    }

    /// Parse a raw `Cookie` header value (`a=1; b=2`), percent-decoding
    /// values the same way Salvo does for request cookies
    pub fn from_header(header: &str, options: CookieOptions) -> Self {
        let mut jar = CookieJar::new();
        for parsed in Cookie::split_parse_encoded(header.to_owned()) {
            match parsed {
                Ok(c) => jar.add_original(c),
                Err(e) => tracing::trace!(error = %e, "Skipping malformed cookie"),
            }
        }
        Self::new(jar, options)
    }

    /// An adapter with no incoming cookies
    pub fn empty(options: CookieOptions) -> Self {
        Self::new(CookieJar::new(), options)
    }

    /// Whether signing keys are configured
    pub fn is_signed(&self) -> bool {
        self.keygrip.is_some()
    }

    /// Read a request cookie.
    ///
    /// With `signed`, the value is only returned when the companion `.sig`
    /// cookie verifies under one of the configured keys. Values come back
    /// exactly as the jar decoded them.
    pub fn get(&self, name: &str, signed: bool) -> Option<String> {
        let value = self.incoming.get(name)?.value();
        if !signed {
            return Some(value.to_string());
        }

        let keygrip = self.keygrip.as_ref()?;
        let signature = self.incoming.get(&signature_name(name))?.value();
        if keygrip.verify(&signed_payload(name, value), signature) {
            Some(value.to_string())
        } else {
            tracing::debug!(cookie = %name, "Cookie signature mismatch");
            None
        }
    }

    /// Build a cookie carrying the configured attributes
    pub fn create_cookie(&self, name: &str, value: &str) -> Cookie<'static> {
        let opts = &self.options;
        let mut builder = Cookie::build((name.to_string(), value.to_string()))
            .path(opts.path.clone())
            .http_only(opts.http_only)
            .secure(opts.secure);

        if let Some(domain) = &opts.domain {
            builder = builder.domain(domain.clone());
        }
        if let Some(max_age) = opts.max_age {
            builder = builder.max_age(CookieDuration::seconds(max_age));
        }
        if let Some(expires) = opts.expires {
            if let Ok(at) = OffsetDateTime::from_unix_timestamp(expires.timestamp()) {
                builder = builder.expires(at);
            }
        }
        if let Some(same_site) = opts.same_site {
            builder = builder.same_site(same_site.into());
        }

        builder.build()
    }

    /// Queue a cookie for the response; with `signed` its `.sig` companion is
    /// queued right after it.
    pub fn set(&mut self, cookie: Cookie<'static>, signed: bool) {
        let signature = match (&self.keygrip, signed) {
            (Some(keygrip), true) => {
                let sig = keygrip.sign(&signed_payload(cookie.name(), cookie.value()));
                Some(self.create_cookie(&signature_name(cookie.name()), &sig))
            }
            _ => None,
        };
        self.outgoing.push(cookie);
        self.outgoing.extend(signature);
    }

    /// Cookies queued for the response, in write order
    pub fn outgoing(&self) -> &[Cookie<'static>] {
        &self.outgoing
    }

    /// Write the queued cookies to a Salvo response
    pub fn apply(self, res: &mut Response) {
        for cookie in self.outgoing {
            res.add_cookie(cookie);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn signed_options() -> CookieOptions {
        CookieOptions {
            keys: vec!["tree.xie".to_string(), "vicanso".to_string()],
            ..Default::default()
        }
    }

    #[test]
    fn test_get_unsigned() {
        let cookies = Cookies::from_header("sess=abc; other=1", CookieOptions::default());
        assert_eq!(cookies.get("sess", false), Some("abc".to_string()));
        assert_eq!(cookies.get("missing", false), None);
    }

    #[test]
    fn test_set_signed_writes_two_cookies() {
        let mut cookies = Cookies::empty(signed_options());
        let cookie = cookies.create_cookie("sess", "abc");
        cookies.set(cookie, true);

        let out = cookies.outgoing();
        assert_eq!(out.len(), 2);
        assert_eq!(out[0].name(), "sess");
        assert_eq!(out[1].name(), "sess.sig");
        assert_eq!(out[1].path(), Some("/"));
    }

    #[test]
    fn test_signed_round_trip() {
        let mut writer = Cookies::empty(signed_options());
        let cookie = writer.create_cookie("sess", "abc");
        writer.set(cookie, true);
        let header = writer
            .outgoing()
            .iter()
            .map(|c| format!("{}={}", c.name(), c.value()))
            .collect::<Vec<_>>()
            .join("; ");

        let reader = Cookies::from_header(&header, signed_options());
        assert_eq!(reader.get("sess", true), Some("abc".to_string()));
    }

    #[test]
    fn test_percent_encoded_values_decode_once() {
        let mut writer = Cookies::empty(signed_options());
        let cookie = writer.create_cookie("sess", "a%41b");
        writer.set(cookie, true);
        let header = writer
            .outgoing()
            .iter()
            .map(|c| c.encoded().stripped().to_string())
            .collect::<Vec<_>>()
            .join("; ");
        assert!(header.contains("sess=a%2541b"));

        let reader = Cookies::from_header(&header, signed_options());
        assert_eq!(reader.get("sess", true), Some("a%41b".to_string()));
        assert_eq!(reader.get("sess", false), Some("a%41b".to_string()));
    }

    #[test]
    fn test_tampered_signature() {
        let cookies = Cookies::from_header("sess=abc; sess.sig=abcd", signed_options());
        assert_eq!(cookies.get("sess", true), None);

        let unsigned = Cookies::from_header("sess=abc", signed_options());
        assert_eq!(unsigned.get("sess", true), None);
    }

    #[test]
    fn test_cookie_attributes() {
        let options = CookieOptions {
            domain: Some("aslant.site".to_string()),
            max_age: Some(60),
            secure: true,
            same_site: Some(SameSite::Strict),
            ..Default::default()
        };
        let cookies = Cookies::empty(options);
        let cookie = cookies.create_cookie("sess", "abc");

        assert_eq!(cookie.domain(), Some("aslant.site"));
        assert_eq!(cookie.max_age(), Some(CookieDuration::seconds(60)));
        assert_eq!(cookie.secure(), Some(true));
        assert_eq!(cookie.http_only(), Some(true));
        assert_eq!(cookie.same_site(), Some(cookie::SameSite::Strict));
    }
}
