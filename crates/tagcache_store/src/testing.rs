// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Mock store implementation for testing.
//!
//! This module provides `MockStore`, an in-memory store that records every
//! operation and supports failure injection for testing error paths.

use std::{collections::HashMap, sync::Arc};

use parking_lot::Mutex;

use crate::{CasOutcome, CasToken, Error, Expiry, Item, Store};

/// Recorded store operation with full context.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreOp {
    /// A get of the given key.
    Get(String),
    /// A batched get of the given keys.
    GetMulti(Vec<String>),
    /// An unconditional write.
    Set {
        /// The key written.
        key: String,
        /// The expiry requested.
        expiry: Expiry,
    },
    /// A write-if-absent.
    Add {
        /// The key written.
        key: String,
        /// The expiry requested.
        expiry: Expiry,
    },
    /// A write-if-present.
    Replace {
        /// The key written.
        key: String,
        /// The expiry requested.
        expiry: Expiry,
    },
    /// A compare-and-swap.
    Cas {
        /// The key written.
        key: String,
        /// The expiry requested.
        expiry: Expiry,
        /// The token presented.
        token: CasToken,
    },
    /// A delete of the given key.
    Delete(String),
    /// A flush of the whole store.
    FlushAll,
}

impl StoreOp {
    /// Returns the key this operation touched, if it touched exactly one.
    #[must_use]
    pub fn key(&self) -> Option<&str> {
        match self {
            Self::Get(key) | Self::Delete(key) => Some(key),
            Self::Set { key, .. } | Self::Add { key, .. } | Self::Replace { key, .. } | Self::Cas { key, .. } => Some(key),
            Self::GetMulti(_) | Self::FlushAll => None,
        }
    }

    /// Returns `true` for operations that may modify the store.
    #[must_use]
    pub fn is_write(&self) -> bool {
        !matches!(self, Self::Get(_) | Self::GetMulti(_))
    }
}

type FailPredicate = Box<dyn Fn(&StoreOp) -> bool + Send + Sync>;

#[derive(Debug, Default)]
struct State {
    data: HashMap<String, (Vec<u8>, CasToken, Expiry)>,
    next_cas: u64,
}

impl State {
    fn write(&mut self, key: &str, value: Vec<u8>, expiry: Expiry) {
        self.next_cas += 1;
        self.data.insert(key.to_owned(), (value, CasToken::new(self.next_cas), expiry));
    }
}

/// A configurable mock store for testing.
///
/// Values live in a map and never expire on their own; the requested [`Expiry`]
/// is recorded so tests can assert on it. Every call is recorded, and calls can
/// be made to fail on demand.
///
/// # Examples
///
/// ```
/// use tagcache_store::{Expiry, Store, testing::{MockStore, StoreOp}};
///
/// # futures::executor::block_on(async {
/// let store = MockStore::new();
/// store.set("k", b"v".to_vec(), Expiry::Never).await.unwrap();
///
/// // Fail every delete from now on
/// store.fail_when(|op| matches!(op, StoreOp::Delete(_)));
/// assert!(store.delete("k").await.is_err());
/// assert!(store.contains_key("k"));
/// # });
/// ```
pub struct MockStore {
    state: Arc<Mutex<State>>,
    operations: Arc<Mutex<Vec<StoreOp>>>,
    fail_when: Arc<Mutex<Option<FailPredicate>>>,
}

impl std::fmt::Debug for MockStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockStore")
            .field("state", &self.state)
            .field("operations", &self.operations)
            .field("fail_when", &self.fail_when.lock().is_some())
            .finish()
    }
}

impl Clone for MockStore {
    fn clone(&self) -> Self {
        Self {
            state: Arc::clone(&self.state),
            operations: Arc::clone(&self.operations),
            fail_when: Arc::clone(&self.fail_when),
        }
    }
}

impl Default for MockStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MockStore {
    /// Creates a new empty mock store.
    #[must_use]
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(State::default())),
            operations: Arc::new(Mutex::new(Vec::new())),
            fail_when: Arc::new(Mutex::new(None)),
        }
    }

    /// Sets a predicate that decides which operations fail.
    ///
    /// A failing operation is still recorded but leaves the data untouched.
    pub fn fail_when<F>(&self, predicate: F)
    where
        F: Fn(&StoreOp) -> bool + Send + Sync + 'static,
    {
        *self.fail_when.lock() = Some(Box::new(predicate));
    }

    /// Clears the failure predicate, allowing all operations to succeed.
    pub fn clear_failures(&self) {
        *self.fail_when.lock() = None;
    }

    /// Returns a clone of all recorded operations.
    #[must_use]
    pub fn operations(&self) -> Vec<StoreOp> {
        self.operations.lock().clone()
    }

    /// Clears all recorded operations.
    pub fn clear_operations(&self) {
        self.operations.lock().clear();
    }

    /// Returns the number of keys held.
    #[must_use]
    pub fn entry_count(&self) -> usize {
        self.state.lock().data.len()
    }

    /// Returns true if the store holds the given key.
    #[must_use]
    pub fn contains_key(&self, key: &str) -> bool {
        self.state.lock().data.contains_key(key)
    }

    /// Returns the raw bytes stored under `key`.
    #[must_use]
    pub fn raw(&self, key: &str) -> Option<Vec<u8>> {
        self.state.lock().data.get(key).map(|(value, _, _)| value.clone())
    }

    /// Returns the expiry recorded for `key`.
    #[must_use]
    pub fn expiry(&self, key: &str) -> Option<Expiry> {
        self.state.lock().data.get(key).map(|(_, _, expiry)| *expiry)
    }

    /// Writes `key` behind the caller's back, as another client would.
    ///
    /// The write is not recorded and bumps the key's CAS token.
    pub fn put(&self, key: &str, value: Vec<u8>) {
        self.state.lock().write(key, value, Expiry::Never);
    }

    /// Removes `key` behind the caller's back, as a store-side eviction would.
    pub fn evict(&self, key: &str) {
        self.state.lock().data.remove(key);
    }

    /// Returns the sorted list of keys held.
    #[must_use]
    pub fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.state.lock().data.keys().cloned().collect();
        keys.sort();
        keys
    }

    fn check(&self, op: StoreOp) -> Result<(), Error> {
        let fail = self.fail_when.lock().as_ref().is_some_and(|predicate| predicate(&op));
        self.operations.lock().push(op);
        if fail {
            return Err(Error::store("mock: operation failed"));
        }
        Ok(())
    }
}

impl Store for MockStore {
    async fn get(&self, key: &str) -> Result<Option<Item>, Error> {
        self.check(StoreOp::Get(key.to_owned()))?;
        Ok(self
            .state
            .lock()
            .data
            .get(key)
            .map(|(value, cas, _)| Item::new(value.clone(), *cas)))
    }

    async fn get_multi(&self, keys: &[String]) -> Result<HashMap<String, Item>, Error> {
        self.check(StoreOp::GetMulti(keys.to_vec()))?;
        let state = self.state.lock();
        Ok(keys
            .iter()
            .filter_map(|key| {
                state
                    .data
                    .get(key)
                    .map(|(value, cas, _)| (key.clone(), Item::new(value.clone(), *cas)))
            })
            .collect())
    }

    async fn set(&self, key: &str, value: Vec<u8>, expiry: Expiry) -> Result<(), Error> {
        self.check(StoreOp::Set {
            key: key.to_owned(),
            expiry,
        })?;
        self.state.lock().write(key, value, expiry);
        Ok(())
    }

    async fn add(&self, key: &str, value: Vec<u8>, expiry: Expiry) -> Result<bool, Error> {
        self.check(StoreOp::Add {
            key: key.to_owned(),
            expiry,
        })?;
        let mut state = self.state.lock();
        if state.data.contains_key(key) {
            return Ok(false);
        }
        state.write(key, value, expiry);
        Ok(true)
    }

    async fn replace(&self, key: &str, value: Vec<u8>, expiry: Expiry) -> Result<bool, Error> {
        self.check(StoreOp::Replace {
            key: key.to_owned(),
            expiry,
        })?;
        let mut state = self.state.lock();
        if !state.data.contains_key(key) {
            return Ok(false);
        }
        state.write(key, value, expiry);
        Ok(true)
    }

    async fn cas(&self, key: &str, value: Vec<u8>, expiry: Expiry, token: CasToken) -> Result<CasOutcome, Error> {
        self.check(StoreOp::Cas {
            key: key.to_owned(),
            expiry,
            token,
        })?;
        let mut state = self.state.lock();
        match state.data.get(key).map(|(_, cas, _)| *cas) {
            None => Ok(CasOutcome::NotFound),
            Some(current) if current != token => Ok(CasOutcome::Exists),
            Some(_) => {
                state.write(key, value, expiry);
                Ok(CasOutcome::Stored)
            }
        }
    }

    async fn delete(&self, key: &str) -> Result<bool, Error> {
        self.check(StoreOp::Delete(key.to_owned()))?;
        Ok(self.state.lock().data.remove(key).is_some())
    }

    async fn flush_all(&self) -> Result<bool, Error> {
        self.check(StoreOp::FlushAll)?;
        self.state.lock().data.clear();
        Ok(true)
    }
}
