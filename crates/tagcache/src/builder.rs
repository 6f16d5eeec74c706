// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Builder for constructing a [`TaggingCache`].

use std::time::Duration;

#[cfg(any(feature = "metrics", test))]
use opentelemetry::metrics::MeterProvider;
use tagcache_store::{Connect, Connected, Result, ServerConfig, Store};
use tick::Clock;

#[cfg(feature = "memory")]
use tagcache_memory::MemoryStoreBuilder;

use crate::{
    CacheConfig, TaggingCache,
    cache::CacheName,
    config::{DEFAULT_LIFETIME, DEFAULT_MAX_CAS_RETRIES},
    keys::KeyNamer,
    telemetry::CacheTelemetry,
};

const DEFAULT_NAME: CacheName = "tagcache";

/// Builder for a [`TaggingCache`].
///
/// Created by [`TaggingCache::builder`]. Pick a store with [`memory`](Self::memory),
/// [`storage`](Self::storage) or [`connector`](Self::connector), adjust the
/// settings, then call [`build`](Self::build).
///
/// Unless configured otherwise the cache uses a lifetime of one hour, a
/// namespace derived from the install location and a single endpoint at
/// `localhost:11211`.
///
/// # Examples
///
/// ```
/// use std::time::Duration;
///
/// use tagcache::{ServerConfig, TaggingCache};
/// use tick::Clock;
///
/// let cache = TaggingCache::builder(Clock::new_frozen())
///     .memory()
///     .server(ServerConfig::new("cache-1", 11211))
///     .server(ServerConfig::new("cache-2", 11211).weight(2))
///     .lifetime(Duration::from_secs(300))
///     .max_cas_retries(16)
///     .build()
///     .expect("valid configuration");
///
/// assert_eq!(cache.default_lifetime(), Some(Duration::from_secs(300)));
/// ```
#[derive(Debug)]
pub struct TaggingCacheBuilder<C = ()> {
    name: CacheName,
    connector: C,
    clock: Clock,
    lifetime: Option<Duration>,
    namespace: Option<String>,
    servers: Vec<ServerConfig>,
    max_cas_retries: u32,
    telemetry: CacheTelemetry,
}

impl TaggingCacheBuilder<()> {
    pub(crate) fn new(clock: Clock) -> Self {
        Self {
            name: DEFAULT_NAME,
            connector: (),
            clock,
            lifetime: Some(DEFAULT_LIFETIME),
            namespace: None,
            servers: Vec::new(),
            max_cas_retries: DEFAULT_MAX_CAS_RETRIES,
            telemetry: CacheTelemetry::default(),
        }
    }

    /// Uses an in-process [`MemoryStore`](tagcache_memory::MemoryStore) driven by the cache's clock.
    #[cfg(feature = "memory")]
    #[must_use]
    pub fn memory(self) -> TaggingCacheBuilder<MemoryStoreBuilder> {
        let store = MemoryStoreBuilder::new(self.clock.clone());
        self.connector(store)
    }

    /// Uses a store that is already connected. The endpoint list is not consulted.
    ///
    /// # Examples
    ///
    /// ```
    /// # #[cfg(feature = "test-util")]
    /// # fn main() {
    /// use tagcache::TaggingCache;
    /// use tagcache_store::testing::MockStore;
    /// use tick::Clock;
    ///
    /// let cache = TaggingCache::builder(Clock::new_frozen())
    ///     .storage(MockStore::new())
    ///     .build()
    ///     .expect("valid configuration");
    /// # }
    /// # #[cfg(not(feature = "test-util"))]
    /// # fn main() {}
    /// ```
    #[must_use]
    pub fn storage<S: Store>(self, store: S) -> TaggingCacheBuilder<Connected<S>> {
        self.connector(Connected(store))
    }

    /// Uses `connector` to reach the configured endpoints at build time.
    #[must_use]
    pub fn connector<C: Connect>(self, connector: C) -> TaggingCacheBuilder<C> {
        TaggingCacheBuilder {
            name: self.name,
            connector,
            clock: self.clock,
            lifetime: self.lifetime,
            namespace: self.namespace,
            servers: self.servers,
            max_cas_retries: self.max_cas_retries,
            telemetry: self.telemetry,
        }
    }
}

impl<C> TaggingCacheBuilder<C> {
    /// Sets the lifetime of values written without an explicit one.
    ///
    /// A zero duration means values never expire.
    #[must_use]
    pub fn lifetime(mut self, lifetime: Duration) -> Self {
        self.lifetime = (!lifetime.is_zero()).then_some(lifetime);
        self
    }

    /// Makes values written without an explicit lifetime never expire.
    #[must_use]
    pub fn no_expiry(mut self) -> Self {
        self.lifetime = None;
        self
    }

    /// Sets the prefix for every store key. Checked by [`build`](TaggingCacheBuilder::build).
    #[must_use]
    pub fn namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = Some(namespace.into());
        self
    }

    /// Replaces the endpoint list.
    #[must_use]
    pub fn servers(mut self, servers: impl IntoIterator<Item = ServerConfig>) -> Self {
        self.servers = servers.into_iter().collect();
        self
    }

    /// Appends one endpoint.
    #[must_use]
    pub fn server(mut self, server: ServerConfig) -> Self {
        self.servers.push(server);
        self
    }

    /// Sets how many times a tag record update is retried after a conflicting write.
    #[must_use]
    pub fn max_cas_retries(mut self, retries: u32) -> Self {
        self.max_cas_retries = retries;
        self
    }

    /// Applies every setting present in `config`.
    #[must_use]
    pub fn config(mut self, config: CacheConfig) -> Self {
        if let Some(lifetime) = config.default_lifetime() {
            self.lifetime = lifetime;
        }
        if let Some(retries) = config.max_cas_retries {
            self.max_cas_retries = retries;
        }
        if !config.servers.is_empty() {
            self.servers = config.servers;
        }
        if config.namespace.is_some() {
            self.namespace = config.namespace;
        }
        self
    }

    /// Sets the name reported in telemetry.
    #[must_use]
    pub fn name(mut self, name: CacheName) -> Self {
        self.name = name;
        self
    }

    /// Emits a structured `tracing` event for every operation.
    #[cfg(any(feature = "logs", test))]
    #[must_use]
    pub fn logs(mut self) -> Self {
        self.telemetry = self.telemetry.with_logs();
        self
    }

    /// Records operation counts and durations with `provider`.
    #[cfg(any(feature = "metrics", test))]
    #[must_use]
    pub fn metrics(mut self, provider: &dyn MeterProvider) -> Self {
        let meter = crate::telemetry::metrics::create_meter(provider);
        self.telemetry = self.telemetry.with_meter(&meter);
        self
    }
}

impl<C: Connect> TaggingCacheBuilder<C> {
    /// Validates the settings, connects and returns the cache.
    ///
    /// # Errors
    ///
    /// Returns a [`Config`](tagcache_store::ErrorKind::Config) error for an
    /// invalid namespace, or whatever the connector reports, typically a
    /// [`Connection`](tagcache_store::ErrorKind::Connection) error.
    pub fn build(self) -> Result<TaggingCache<C::Store>> {
        let namer = match self.namespace {
            Some(namespace) => KeyNamer::new(namespace)?,
            None => KeyNamer::default(),
        };

        let servers = if self.servers.is_empty() {
            vec![ServerConfig::default()]
        } else {
            self.servers
        };
        let store = self.connector.connect(&servers)?;

        tracing::debug!(
            cache.name = self.name,
            namespace = namer.namespace(),
            servers = servers.len(),
            "tagging cache ready"
        );

        Ok(TaggingCache::new(
            self.name,
            store,
            namer,
            self.lifetime,
            self.max_cas_retries,
            self.clock,
            self.telemetry,
        ))
    }
}
