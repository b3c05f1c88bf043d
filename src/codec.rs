//! Pluggable JSON encoding of session records

use crate::error::Result;
use crate::session::Record;

/// Encodes records for the store and decodes them back
pub trait JsonCodec: Send + Sync + 'static {
    /// Encode a record into store bytes
    fn marshal(&self, record: &Record) -> Result<Vec<u8>>;

    /// Decode store bytes into a record
    fn unmarshal(&self, bytes: &[u8]) -> Result<Record>;
}

/// `serde_json` backed codec, used unless another one is configured
#[derive(Debug, Clone, Copy, Default)]
pub struct SerdeJsonCodec;

impl JsonCodec for SerdeJsonCodec {
    fn marshal(&self, record: &Record) -> Result<Vec<u8>> {
        Ok(serde_json::to_vec(record)?)
    }

    fn unmarshal(&self, bytes: &[u8]) -> Result<Record> {
        Ok(serde_json::from_slice(bytes)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SessionError;
    use serde_json::json;

    #[test]
    fn test_rejects_non_object() {
        let err = SerdeJsonCodec.unmarshal(b"[1,2]").unwrap_err();
        assert!(matches!(err, SessionError::SerializationError(_)));
    }

    #[test]
    fn test_decodes_object() {
        let record = SerdeJsonCodec.unmarshal(br#"{"name":"tree.xie"}"#).unwrap();
        assert_eq!(record.get("name"), Some(&json!("tree.xie")));
    }
}
