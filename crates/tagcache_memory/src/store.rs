// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! In-memory store implementation using moka.

use std::{
    collections::HashMap,
    fmt,
    sync::{
        Arc,
        atomic::{AtomicU64, Ordering},
    },
    time::SystemTime,
};

use moka::{
    future::Cache,
    ops::compute::{CompResult, Op},
};
use tagcache_store::{CasOutcome, CasToken, Error, Expiry, Item, Store};
use tick::Clock;

use crate::builder::MemoryStoreBuilder;

#[derive(Debug, Clone)]
struct Slot {
    value: Arc<[u8]>,
    cas: CasToken,
    expiry: Expiry,
}

impl Slot {
    fn is_live(&self, now: SystemTime) -> bool {
        !self.expiry.is_expired_at(now)
    }

    fn to_item(&self) -> Item {
        Item::new(self.value.to_vec(), self.cas)
    }
}

/// A key-value store held in process memory.
///
/// Expired keys are invisible to every operation as soon as the clock passes
/// their expiry; moka reclaims the space later. Conditional writes run through
/// moka's per-key compute, so `add`, `replace` and `cas` are atomic per key.
///
/// Clones share the same data.
///
/// # Examples
///
/// ```
/// use tagcache_memory::MemoryStore;
/// use tagcache_store::{CasOutcome, Expiry, Store};
/// use tick::Clock;
///
/// # futures::executor::block_on(async {
/// let store = MemoryStore::new(Clock::new_frozen());
///
/// store.set("k", b"1".to_vec(), Expiry::Never).await?;
/// let token = store.get("k").await?.expect("present").cas();
///
/// assert_eq!(store.cas("k", b"2".to_vec(), Expiry::Never, token).await?, CasOutcome::Stored);
/// assert_eq!(store.cas("k", b"3".to_vec(), Expiry::Never, token).await?, CasOutcome::Exists);
/// # Ok::<(), tagcache_store::Error>(())
/// # });
/// ```
#[derive(Clone)]
pub struct MemoryStore {
    inner: Cache<String, Slot>,
    clock: Clock,
    next_cas: Arc<AtomicU64>,
}

impl fmt::Debug for MemoryStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemoryStore")
            .field("entry_count", &self.inner.entry_count())
            .finish_non_exhaustive()
    }
}

impl MemoryStore {
    /// Creates an unbounded store judging expiry by `clock`.
    #[must_use]
    pub fn new(clock: Clock) -> Self {
        Self::builder(clock).build()
    }

    /// Creates a builder for configuring a store.
    #[must_use]
    pub fn builder(clock: Clock) -> MemoryStoreBuilder {
        MemoryStoreBuilder::new(clock)
    }

    pub(crate) fn from_builder(builder: MemoryStoreBuilder) -> Self {
        let mut moka_builder = Cache::builder();

        if let Some(capacity) = builder.max_capacity {
            moka_builder = moka_builder.max_capacity(capacity);
        }

        if let Some(capacity) = builder.initial_capacity {
            moka_builder = moka_builder.initial_capacity(capacity);
        }

        if let Some(name) = builder.name.as_deref() {
            moka_builder = moka_builder.name(name);
        }

        Self {
            inner: moka_builder.build(),
            clock: builder.clock,
            next_cas: Arc::new(AtomicU64::new(1)),
        }
    }

    /// Returns the approximate number of keys held, expired ones included.
    #[must_use]
    pub fn entry_count(&self) -> u64 {
        self.inner.entry_count()
    }

    fn slot(&self, value: Vec<u8>, expiry: Expiry) -> Slot {
        Slot {
            value: value.into(),
            cas: CasToken::new(self.next_cas.fetch_add(1, Ordering::Relaxed)),
            expiry,
        }
    }
}

impl Store for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<Item>, Error> {
        let now = self.clock.system_time();
        Ok(self
            .inner
            .get(key)
            .await
            .filter(|slot| slot.is_live(now))
            .map(|slot| slot.to_item()))
    }

    async fn get_multi(&self, keys: &[String]) -> Result<HashMap<String, Item>, Error> {
        let now = self.clock.system_time();
        let mut found = HashMap::with_capacity(keys.len());
        for key in keys {
            if let Some(slot) = self.inner.get(key).await.filter(|slot| slot.is_live(now)) {
                found.insert(key.clone(), slot.to_item());
            }
        }
        Ok(found)
    }

    async fn set(&self, key: &str, value: Vec<u8>, expiry: Expiry) -> Result<(), Error> {
        let slot = self.slot(value, expiry);
        self.inner.insert(key.to_owned(), slot).await;
        Ok(())
    }

    async fn add(&self, key: &str, value: Vec<u8>, expiry: Expiry) -> Result<bool, Error> {
        let now = self.clock.system_time();
        let slot = self.slot(value, expiry);
        let result = self
            .inner
            .entry(key.to_owned())
            .and_compute_with(move |current| {
                let op = match current {
                    Some(entry) if entry.value().is_live(now) => Op::Nop,
                    _ => Op::Put(slot),
                };
                std::future::ready(op)
            })
            .await;
        Ok(matches!(result, CompResult::Inserted(_) | CompResult::ReplacedWith(_)))
    }

    async fn replace(&self, key: &str, value: Vec<u8>, expiry: Expiry) -> Result<bool, Error> {
        let now = self.clock.system_time();
        let slot = self.slot(value, expiry);
        let result = self
            .inner
            .entry(key.to_owned())
            .and_compute_with(move |current| {
                let op = match current {
                    Some(entry) if entry.value().is_live(now) => Op::Put(slot),
                    Some(_) => Op::Remove,
                    None => Op::Nop,
                };
                std::future::ready(op)
            })
            .await;
        Ok(matches!(result, CompResult::ReplacedWith(_)))
    }

    async fn cas(&self, key: &str, value: Vec<u8>, expiry: Expiry, token: CasToken) -> Result<CasOutcome, Error> {
        let now = self.clock.system_time();
        let slot = self.slot(value, expiry);
        let result = self
            .inner
            .entry(key.to_owned())
            .and_compute_with(move |current| {
                let op = match current {
                    Some(entry) if !entry.value().is_live(now) => Op::Remove,
                    Some(entry) if entry.value().cas == token => Op::Put(slot),
                    _ => Op::Nop,
                };
                std::future::ready(op)
            })
            .await;
        Ok(match result {
            CompResult::ReplacedWith(_) => CasOutcome::Stored,
            CompResult::Unchanged(_) => CasOutcome::Exists,
            CompResult::Inserted(_) | CompResult::Removed(_) | CompResult::StillNone(_) => CasOutcome::NotFound,
        })
    }

    async fn delete(&self, key: &str) -> Result<bool, Error> {
        let now = self.clock.system_time();
        Ok(self.inner.remove(key).await.is_some_and(|slot| slot.is_live(now)))
    }

    async fn flush_all(&self) -> Result<bool, Error> {
        self.inner.invalidate_all();
        Ok(true)
    }
}
