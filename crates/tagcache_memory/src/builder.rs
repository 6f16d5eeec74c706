// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Builder for configuring in-memory stores.
//!
//! The builder keeps moka's configuration types out of the public API and
//! doubles as the [`Connect`] implementation used by `tagcache`.

use tagcache_store::{Connect, Error, Result, ServerConfig};
use tick::Clock;

use crate::store::MemoryStore;

/// Builder for configuring a [`MemoryStore`].
///
/// # Examples
///
/// ```
/// use tagcache_memory::MemoryStore;
/// use tick::Clock;
///
/// let store = MemoryStore::builder(Clock::new_frozen())
///     .max_capacity(1000)
///     .initial_capacity(100)
///     .name("sessions")
///     .build();
/// ```
#[derive(Debug)]
pub struct MemoryStoreBuilder {
    pub(crate) clock: Clock,
    pub(crate) max_capacity: Option<u64>,
    pub(crate) initial_capacity: Option<usize>,
    pub(crate) name: Option<String>,
}

impl MemoryStoreBuilder {
    /// Creates a builder for an unbounded store judging expiry by `clock`.
    #[must_use]
    pub fn new(clock: Clock) -> Self {
        Self {
            clock,
            max_capacity: None,
            initial_capacity: None,
            name: None,
        }
    }

    /// Sets the maximum number of keys held.
    ///
    /// Past this size moka evicts keys on its own, the same way a memcached
    /// node under memory pressure drops items before they expire.
    #[must_use]
    pub fn max_capacity(mut self, capacity: u64) -> Self {
        self.max_capacity = Some(capacity);
        self
    }

    /// Sets the pre-allocation hint.
    #[must_use]
    pub fn initial_capacity(mut self, capacity: usize) -> Self {
        self.initial_capacity = Some(capacity);
        self
    }

    /// Sets a name that shows up in moka's debugging output.
    #[must_use]
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Builds the configured store.
    #[must_use]
    pub fn build(self) -> MemoryStore {
        MemoryStore::from_builder(self)
    }
}

impl Connect for MemoryStoreBuilder {
    type Store = MemoryStore;

    /// Validates the endpoint list and builds the store.
    ///
    /// The store lives in this process, so endpoints are only checked for being
    /// usable; at least one is required.
    fn connect(self, servers: &[ServerConfig]) -> Result<MemoryStore> {
        if servers.is_empty() {
            return Err(Error::connection("no store endpoint configured"));
        }
        for server in servers {
            server.validate()?;
        }
        Ok(self.build())
    }
}
