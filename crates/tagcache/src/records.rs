// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! The three record kinds persisted in the store, and their JSON encoding.

use std::{collections::BTreeSet, time::SystemTime};

use serde::{Deserialize, Serialize, de::DeserializeOwned};
use tagcache_store::{Error, ErrorKind, Result};

/// Value record. `P` is the payload, borrowed when writing and owned when reading.
#[derive(Debug, Serialize, Deserialize)]
pub(crate) struct ValueRecord<P> {
    pub key: String,
    pub payload: P,
    pub expires_at: Option<SystemTime>,
}

/// Bookkeeping stored next to every value.
///
/// Returned by [`TaggingCache::metadata`](crate::TaggingCache::metadata).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Metadata {
    key: String,
    last_modified: SystemTime,
    expires_at: Option<SystemTime>,
    tags: Vec<String>,
}

impl Metadata {
    pub(crate) fn new(key: &str, last_modified: SystemTime, expires_at: Option<SystemTime>, tags: Vec<String>) -> Self {
        Self {
            key: key.to_owned(),
            last_modified,
            expires_at,
            tags,
        }
    }

    /// The logical key this metadata belongs to.
    #[must_use]
    pub fn key(&self) -> &str {
        &self.key
    }

    /// When the value was last written.
    #[must_use]
    pub fn last_modified(&self) -> SystemTime {
        self.last_modified
    }

    /// When the value expires, or `None` if it never does.
    #[must_use]
    pub fn expires_at(&self) -> Option<SystemTime> {
        self.expires_at
    }

    /// The tags the value was written with, in first-seen order.
    #[must_use]
    pub fn tags(&self) -> &[String] {
        &self.tags
    }

    pub(crate) fn into_tags(self) -> Vec<String> {
        self.tags
    }

    pub(crate) fn is_expired_at(&self, now: SystemTime) -> bool {
        is_expired(self.expires_at, now)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct TagRecord {
    pub tag: String,
    pub keys: BTreeSet<String>,
}

impl TagRecord {
    pub(crate) fn empty(tag: &str) -> Self {
        Self {
            tag: tag.to_owned(),
            keys: BTreeSet::new(),
        }
    }
}

pub(crate) fn is_expired(expires_at: Option<SystemTime>, now: SystemTime) -> bool {
    expires_at.is_some_and(|at| at <= now)
}

pub(crate) fn encode<T: Serialize>(record: &T) -> Result<Vec<u8>> {
    serde_json::to_vec(record).map_err(|e| Error::from_source(ErrorKind::Codec, e))
}

/// Decodes the record stored under `key`.
///
/// Bytes that do not decode are reported and treated as if nothing was stored.
pub(crate) fn decode<T: DeserializeOwned>(key: &str, bytes: &[u8]) -> Option<T> {
    match serde_json::from_slice(bytes) {
        Ok(record) => Some(record),
        Err(error) => {
            tracing::warn!(key, %error, "ignoring undecodable record");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    #[test]
    fn value_record_written_borrowed_reads_back_owned() {
        let payload = vec![1_u32, 2, 3];
        let bytes = encode(&ValueRecord {
            key: "k".to_owned(),
            payload: &payload,
            expires_at: None,
        })
        .expect("encode failed");

        let record: ValueRecord<Vec<u32>> = decode("k", &bytes).expect("decode failed");
        assert_eq!(record.payload, payload);
        assert_eq!(record.key, "k");
    }

    #[test]
    fn garbage_decodes_to_none() {
        assert!(decode::<TagRecord>("t", b"not json").is_none());
        assert!(decode::<Metadata>("m", br#"{"key":"k"}"#).is_none());
    }

    #[test]
    fn tag_record_keeps_keys_sorted_and_unique() {
        let mut record = TagRecord::empty("t");
        record.keys.insert("b".to_owned());
        record.keys.insert("a".to_owned());
        record.keys.insert("b".to_owned());

        let bytes = encode(&record).expect("encode failed");
        assert_eq!(bytes, br#"{"tag":"t","keys":["a","b"]}"#);
    }

    #[test]
    fn expiry_boundary_is_inclusive() {
        let now = SystemTime::UNIX_EPOCH + Duration::from_secs(100);
        assert!(!is_expired(None, now));
        assert!(is_expired(Some(now), now));
        assert!(!is_expired(Some(now + Duration::from_secs(1)), now));
    }
}
