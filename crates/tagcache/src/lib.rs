// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

#![cfg_attr(coverage_nightly, feature(coverage_attribute))]
#![cfg_attr(docsrs, feature(doc_cfg))]

//! Tag-based grouping and invalidation for memcached-style key-value stores.
//!
//! A memcached-style store maps keys to values and forgets each key on its own
//! schedule. [`TaggingCache`] layers tags on top: every value can carry any
//! number of tags, and all values sharing a tag can be fetched or deleted
//! together.
//!
//! The store offers no transactions, so the cache keeps three kinds of records
//! in step on a best-effort basis:
//!
//! - a value record per key;
//! - a metadata record per key, holding the key's tags, last write time and expiry;
//! - a tag record per tag, holding the set of keys carrying it.
//!
//! Tag records are changed with compare-and-swap and retried on conflict, so
//! concurrent writers never drop each other's keys from a tag. Tag records do
//! not expire and may name keys whose values are already gone; reads through a
//! tag skip those keys.
//!
//! # Examples
//!
//! ```
//! use tagcache::TaggingCache;
//! use tick::Clock;
//! # futures::executor::block_on(async {
//!
//! let cache = TaggingCache::builder(Clock::new_frozen()).memory().build()?;
//!
//! cache.set("key1", "value_1", &["1", "2", "3"]).await?;
//! cache.set("key2", "value_2", &["2", "3", "4"]).await?;
//!
//! cache.delete_by_tag("2").await?;
//!
//! assert_eq!(cache.get::<String>("key1").await?, None);
//! assert_eq!(cache.get::<String>("key2").await?, None);
//! assert!(cache.get_by_tag::<String>("4").await?.is_empty());
//! # Ok::<(), tagcache::Error>(())
//! # });
//! ```
//!
//! # Features
//!
//! - `memory` (default): [`TaggingCacheBuilder::memory`] backed by `tagcache_memory`.
//! - `logs`: a `tracing` event per operation.
//! - `metrics`: OpenTelemetry counters and duration histograms.
//! - `test-util`: the mock store from `tagcache_store::testing`.

pub mod builder;
pub mod cache;
mod config;
mod entry;
mod keys;
mod lifetime;
mod records;
mod tag_index;
mod telemetry;

#[doc(inline)]
pub use builder::TaggingCacheBuilder;
#[doc(inline)]
pub use cache::{CacheName, TaggingCache};
#[doc(inline)]
pub use config::{CacheConfig, DEFAULT_LIFETIME, DEFAULT_MAX_CAS_RETRIES};
#[doc(inline)]
pub use lifetime::Lifetime;
#[doc(inline)]
pub use records::Metadata;
#[cfg(feature = "memory")]
#[doc(inline)]
pub use tagcache_memory::MemoryStore;
#[doc(inline)]
pub use tagcache_store::{CasOutcome, CasToken, Connect, Connected, Error, ErrorKind, Expiry, Item, Result, ServerConfig, Store};

#[cfg(any(feature = "test-util", test))]
#[doc(inline)]
pub use tagcache_store::testing::{MockStore, StoreOp};
