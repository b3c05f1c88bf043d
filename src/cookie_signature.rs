//! Keygrip-style cookie signatures
//!
//! A signed cookie travels with a companion `<name>.sig` cookie whose value is
//! `base64url(hmac_sha256(key, "<name>=<value>"))` without padding. The first
//! key signs; every key is tried when verifying, so keys can be rotated by
//! prepending a new one.

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// Suffix appended to a cookie name to form its signature cookie name
pub const SIGNATURE_SUFFIX: &str = ".sig";

/// Ordered list of signing keys
#[derive(Clone, PartialEq, Eq)]
pub struct Keygrip {
    keys: Vec<String>,
}

impl std::fmt::Debug for Keygrip {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Keygrip")
            .field("keys", &self.keys.len())
            .finish()
    }
}

impl Keygrip {
    /// Create a keygrip from a key list. Returns `None` when the list is empty,
    /// since nothing could be signed with it.
    pub fn new<I, S>(keys: I) -> Option<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let keys: Vec<String> = keys.into_iter().map(Into::into).collect();
        if keys.is_empty() {
            None
        } else {
            Some(Self { keys })
        }
    }

    /// Sign `data` with the first key
    pub fn sign(&self, data: &str) -> String {
        create_signature(data, &self.keys[0])
    }

    /// Index of the key that produced `signature`, if any
    pub fn index(&self, data: &str, signature: &str) -> Option<usize> {
        let expected = URL_SAFE_NO_PAD.decode(signature).ok()?;
        self.keys.iter().position(|key| {
            // verify_slice compares in constant time
            mac_for(data, key).verify_slice(&expected).is_ok()
        })
    }

    /// Whether any key produced `signature`
    pub fn verify(&self, data: &str, signature: &str) -> bool {
        self.index(data, signature).is_some()
    }
}

/// Signature cookie name for `name`
pub fn signature_name(name: &str) -> String {
    format!("{}{}", name, SIGNATURE_SUFFIX)
}

/// The string that is signed for a cookie pair
pub fn signed_payload(name: &str, value: &str) -> String {
    format!("{}={}", name, value)
}

fn mac_for(data: &str, key: &str) -> HmacSha256 {
    let mut mac =
        HmacSha256::new_from_slice(key.as_bytes()).expect("HMAC can take key of any size");
    mac.update(data.as_bytes());
    mac
}

fn create_signature(data: &str, key: &str) -> String {
    URL_SAFE_NO_PAD.encode(mac_for(data, key).finalize().into_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sign_and_verify() {
        let keygrip = Keygrip::new(["tree.xie"]).unwrap();
        let data = signed_payload("sess", "abc");

        let signature = keygrip.sign(&data);
        assert!(!signature.contains('='));
        assert!(keygrip.verify(&data, &signature));
        assert!(!keygrip.verify("sess=abd", &signature));
    }

    #[test]
    fn test_wrong_key() {
        let signer = Keygrip::new(["right"]).unwrap();
        let verifier = Keygrip::new(["wrong"]).unwrap();
        let signature = signer.sign("sess=abc");

        assert!(!verifier.verify("sess=abc", &signature));
        assert!(!verifier.verify("sess=abc", "abcd"));
    }

    #[test]
    fn test_malformed_signature() {
        let keygrip = Keygrip::new(["tree.xie"]).unwrap();
        let signature = keygrip.sign("sess=abc");

        // Padded, truncated and non-base64 signatures never verify
        assert!(!keygrip.verify("sess=abc", &format!("{}=", signature)));
        assert!(!keygrip.verify("sess=abc", &signature[..signature.len() - 2]));
        assert!(!keygrip.verify("sess=abc", "not base64!"));
        assert!(!keygrip.verify("sess=abc", ""));
    }

    #[test]
    fn test_key_rotation() {
        let old = Keygrip::new(["old-key"]).unwrap();
        let signature = old.sign("sess=abc");

        let rotated = Keygrip::new(["new-key", "old-key"]).unwrap();
        assert_eq!(rotated.index("sess=abc", &signature), Some(1));
        assert_ne!(rotated.sign("sess=abc"), signature);
    }

    #[test]
    fn test_empty_keys() {
        assert!(Keygrip::new(Vec::<String>::new()).is_none());
    }

    #[test]
    fn test_signature_name() {
        assert_eq!(signature_name("sess"), "sess.sig");
    }
}
