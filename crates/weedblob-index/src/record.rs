//! Record codec: the value stored under each caller key.
//!
//! On-disk format:
//! ```text
//! [1 byte: format version]
//! [8 bytes: size (little-endian u64)]
//! [8 bytes: file id length (little-endian u64)]
//! [N bytes: file id (UTF-8)]
//! ```
//!
//! Everything after the version byte is the bincode serialization of
//! `(size, file_id)`, so the file id is length-prefixed and may contain any
//! character, including the empty string.

use serde::{Deserialize, Serialize};

use crate::error::{DecodeError, EncodeError};

/// Current record format version.
pub const RECORD_VERSION: u8 = 1;

/// Smallest possible encoded record: version byte, size, empty file id.
const MIN_RECORD_LEN: usize = 1 + 8 + 8;

/// The `(size, file_id)` pair persisted in the local index.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct IndexRecord {
    /// Identifier issued by the remote store at upload time.
    pub file_id: String,
    /// Declared content length in bytes, as supplied by the caller.
    pub size: u64,
}

impl IndexRecord {
    /// Create a record for the given file id and size.
    pub fn new(file_id: impl Into<String>, size: u64) -> Self {
        Self {
            file_id: file_id.into(),
            size,
        }
    }

    /// Encode this record into its stored byte form.
    pub fn encode(&self) -> Result<Vec<u8>, EncodeError> {
        let body = bincode::serialize(&(self.size, self.file_id.as_str()))
            .map_err(|e| EncodeError(e.to_string()))?;
        let mut buf = Vec::with_capacity(1 + body.len());
        buf.push(RECORD_VERSION);
        buf.extend_from_slice(&body);
        Ok(buf)
    }

    /// Decode a record previously produced by [`IndexRecord::encode`].
    ///
    /// Truncated, over-long, or foreign-version values are rejected; a
    /// failure here means the stored value is damaged, not absent.
    pub fn decode(value: &[u8]) -> Result<Self, DecodeError> {
        let (&version, body) = value
            .split_first()
            .ok_or_else(|| DecodeError::Truncated("empty value".into()))?;
        if version != RECORD_VERSION {
            return Err(DecodeError::UnsupportedVersion(version));
        }
        if value.len() < MIN_RECORD_LEN {
            return Err(DecodeError::Truncated(format!(
                "have {} bytes, need at least {MIN_RECORD_LEN}",
                value.len()
            )));
        }

        let (size, file_id): (u64, String) =
            bincode::deserialize(body).map_err(|e| match *e {
                bincode::ErrorKind::Io(ref io)
                    if io.kind() == std::io::ErrorKind::UnexpectedEof =>
                {
                    DecodeError::Truncated(e.to_string())
                }
                _ => DecodeError::Malformed(e.to_string()),
            })?;

        let consumed = bincode::serialized_size(&(size, file_id.as_str()))
            .map_err(|e| DecodeError::Malformed(e.to_string()))? as usize;
        if consumed != body.len() {
            return Err(DecodeError::TrailingBytes(body.len() - consumed));
        }

        Ok(Self { file_id, size })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn roundtrip_simple() {
        let record = IndexRecord::new("3,01637037d6", 1024);
        let bytes = record.encode().unwrap();
        assert_eq!(IndexRecord::decode(&bytes).unwrap(), record);
    }

    #[test]
    fn empty_file_id_roundtrips() {
        let record = IndexRecord::new("", 0);
        let bytes = record.encode().unwrap();
        assert_eq!(bytes.len(), MIN_RECORD_LEN);
        assert_eq!(IndexRecord::decode(&bytes).unwrap(), record);
    }

    #[test]
    fn size_is_encoded_before_file_id() {
        let bytes = IndexRecord::new("fid", 7).encode().unwrap();
        assert_eq!(bytes[0], RECORD_VERSION);
        assert_eq!(&bytes[1..9], &7u64.to_le_bytes());
        assert_eq!(&bytes[9..17], &3u64.to_le_bytes());
        assert_eq!(&bytes[17..], b"fid");
    }

    #[test]
    fn separator_like_bytes_do_not_confuse_decoding() {
        let record = IndexRecord::new("a\0b,c\n\u{1}\u{ff}", u64::MAX);
        let bytes = record.encode().unwrap();
        assert_eq!(IndexRecord::decode(&bytes).unwrap(), record);
    }

    #[test]
    fn decode_empty_value_is_truncated() {
        let err = IndexRecord::decode(&[]).unwrap_err();
        assert!(matches!(err, DecodeError::Truncated(_)));
    }

    #[test]
    fn decode_short_value_is_truncated() {
        let bytes = IndexRecord::new("abcdef", 10).encode().unwrap();
        let err = IndexRecord::decode(&bytes[..5]).unwrap_err();
        assert!(matches!(err, DecodeError::Truncated(_)));
    }

    #[test]
    fn decode_missing_file_id_bytes_is_truncated() {
        let bytes = IndexRecord::new("abcdef", 10).encode().unwrap();
        let err = IndexRecord::decode(&bytes[..bytes.len() - 2]).unwrap_err();
        assert!(matches!(err, DecodeError::Truncated(_)));
    }

    #[test]
    fn decode_unknown_version() {
        let mut bytes = IndexRecord::new("x", 1).encode().unwrap();
        bytes[0] = 9;
        let err = IndexRecord::decode(&bytes).unwrap_err();
        assert_eq!(err, DecodeError::UnsupportedVersion(9));
    }

    #[test]
    fn decode_rejects_trailing_bytes() {
        let mut bytes = IndexRecord::new("x", 1).encode().unwrap();
        bytes.extend_from_slice(b"junk");
        let err = IndexRecord::decode(&bytes).unwrap_err();
        assert_eq!(err, DecodeError::TrailingBytes(4));
    }

    #[test]
    fn decode_rejects_invalid_utf8_file_id() {
        let mut bytes = vec![RECORD_VERSION];
        bytes.extend_from_slice(&5u64.to_le_bytes());
        bytes.extend_from_slice(&2u64.to_le_bytes());
        bytes.extend_from_slice(&[0xff, 0xfe]);
        let err = IndexRecord::decode(&bytes).unwrap_err();
        assert!(matches!(err, DecodeError::Malformed(_)));
    }

    proptest! {
        #[test]
        fn encode_decode_is_identity(file_id in any::<String>(), size in any::<u64>()) {
            let record = IndexRecord::new(file_id, size);
            let bytes = record.encode().unwrap();
            prop_assert_eq!(IndexRecord::decode(&bytes).unwrap(), record);
        }
    }
}
