// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::time::SystemTime;

/// Opaque version stamp of a stored value, used by [`Store::cas`](crate::Store::cas).
///
/// A store hands out a new token every time a key is written. Two tokens are
/// only meaningful when compared for the same key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CasToken(u64);

impl CasToken {
    /// Creates a token from the store's raw version number.
    #[must_use]
    pub fn new(raw: u64) -> Self {
        Self(raw)
    }

    /// Returns the raw version number.
    #[must_use]
    pub fn get(self) -> u64 {
        self.0
    }
}

/// When a stored key stops being visible.
///
/// # Examples
///
/// ```
/// use std::time::{Duration, SystemTime};
///
/// use tagcache_store::Expiry;
///
/// let now = SystemTime::UNIX_EPOCH + Duration::from_secs(100);
/// assert!(!Expiry::Never.is_expired_at(now));
/// assert!(Expiry::At(now).is_expired_at(now));
/// assert!(!Expiry::At(now + Duration::from_secs(1)).is_expired_at(now));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Expiry {
    /// The key never expires on its own.
    #[default]
    Never,
    /// The key expires at the given instant.
    At(SystemTime),
}

impl Expiry {
    /// Returns `true` if a key with this expiry is no longer visible at `now`.
    #[must_use]
    pub fn is_expired_at(&self, now: SystemTime) -> bool {
        match self {
            Self::Never => false,
            Self::At(at) => *at <= now,
        }
    }

    /// Returns the expiry instant, or `None` for [`Expiry::Never`].
    #[must_use]
    pub fn as_system_time(&self) -> Option<SystemTime> {
        match self {
            Self::Never => None,
            Self::At(at) => Some(*at),
        }
    }
}

impl From<Option<SystemTime>> for Expiry {
    fn from(value: Option<SystemTime>) -> Self {
        value.map_or(Self::Never, Self::At)
    }
}

/// A value read from a store together with its CAS token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Item {
    value: Vec<u8>,
    cas: CasToken,
}

impl Item {
    /// Creates an item from raw bytes and the token of the write that produced them.
    #[must_use]
    pub fn new(value: Vec<u8>, cas: CasToken) -> Self {
        Self { value, cas }
    }

    /// Returns the stored bytes.
    #[must_use]
    pub fn value(&self) -> &[u8] {
        &self.value
    }

    /// Consumes the item and returns the stored bytes.
    #[must_use]
    pub fn into_value(self) -> Vec<u8> {
        self.value
    }

    /// Returns the token to pass to [`Store::cas`](crate::Store::cas).
    #[must_use]
    pub fn cas(&self) -> CasToken {
        self.cas
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    #[test]
    fn expiry_from_option() {
        let at = SystemTime::UNIX_EPOCH + Duration::from_secs(5);
        assert_eq!(Expiry::from(None), Expiry::Never);
        assert_eq!(Expiry::from(Some(at)), Expiry::At(at));
        assert_eq!(Expiry::At(at).as_system_time(), Some(at));
        assert_eq!(Expiry::Never.as_system_time(), None);
    }

    #[test]
    fn item_accessors() {
        let item = Item::new(b"abc".to_vec(), CasToken::new(7));
        assert_eq!(item.value(), b"abc");
        assert_eq!(item.cas().get(), 7);
        assert_eq!(item.into_value(), b"abc".to_vec());
    }
}
