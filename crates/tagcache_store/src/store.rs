// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! The core trait for key-value store backends.
//!
//! [`Store`] mirrors what a memcached-style server offers: single-key reads and
//! writes with a per-key expiry, a batched read, and the `add`/`replace`/`cas`
//! conditional writes. Nothing here spans more than one key atomically.

use std::collections::HashMap;

use crate::{CasToken, Error, Expiry, Item};

/// Result of a [`Store::cas`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CasOutcome {
    /// The value was written.
    Stored,
    /// The key was written by someone else since the token was issued.
    Exists,
    /// The key no longer exists.
    NotFound,
}

/// Trait for key-value store backends.
///
/// All writes take an [`Expiry`]; [`Expiry::Never`] is always accepted.
/// Reads never report an absent key as an error.
pub trait Store: Send + Sync {
    /// Reads a key, returning `None` if it is absent or expired.
    fn get(&self, key: &str) -> impl Future<Output = Result<Option<Item>, Error>> + Send;

    /// Reads several keys at once, returning only the keys that are present.
    ///
    /// The default implementation issues one [`get`](Self::get) per key. Backends
    /// with a native multi-get should override it.
    fn get_multi(&self, keys: &[String]) -> impl Future<Output = Result<HashMap<String, Item>, Error>> + Send {
        async move {
            let mut found = HashMap::with_capacity(keys.len());
            for key in keys {
                if let Some(item) = self.get(key).await? {
                    found.insert(key.clone(), item);
                }
            }
            Ok(found)
        }
    }

    /// Writes a key unconditionally.
    fn set(&self, key: &str, value: Vec<u8>, expiry: Expiry) -> impl Future<Output = Result<(), Error>> + Send;

    /// Writes a key only if it is absent. Returns `false` if it already existed.
    fn add(&self, key: &str, value: Vec<u8>, expiry: Expiry) -> impl Future<Output = Result<bool, Error>> + Send;

    /// Writes a key only if it exists. Returns `false` if it was absent.
    fn replace(&self, key: &str, value: Vec<u8>, expiry: Expiry) -> impl Future<Output = Result<bool, Error>> + Send;

    /// Writes a key only if it was not modified since `token` was read.
    fn cas(&self, key: &str, value: Vec<u8>, expiry: Expiry, token: CasToken) -> impl Future<Output = Result<CasOutcome, Error>> + Send;

    /// Deletes a key. Returns `false` if it was already absent.
    fn delete(&self, key: &str) -> impl Future<Output = Result<bool, Error>> + Send;

    /// Deletes every key in the store, including keys written by other namespaces.
    fn flush_all(&self) -> impl Future<Output = Result<bool, Error>> + Send;
}
