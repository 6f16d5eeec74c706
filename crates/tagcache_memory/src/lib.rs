// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

#![cfg_attr(coverage_nightly, feature(coverage_attribute))]
#![cfg_attr(docsrs, feature(doc_cfg))]

//! In-process key-value store backed by moka.
//!
//! This crate provides [`MemoryStore`], a concurrent [`Store`](tagcache_store::Store)
//! that behaves like a single memcached node: per-key expiry, `add`/`replace`/`cas`
//! conditional writes and a store-wide flush. Expiry is judged against an injected
//! [`tick::Clock`], so tests can move time forward deterministically.
//!
//! # Quick Start
//!
//! ```
//! use std::time::Duration;
//!
//! use tagcache_memory::MemoryStore;
//! use tagcache_store::{Expiry, Store};
//! use tick::Clock;
//!
//! # futures::executor::block_on(async {
//! let clock = Clock::new_frozen();
//! let store = MemoryStore::builder(clock.clone()).max_capacity(10_000).build();
//!
//! let expires = Expiry::At(clock.system_time() + Duration::from_secs(60));
//! store.set("greeting", b"hello".to_vec(), expires).await?;
//! let item = store.get("greeting").await?.expect("present");
//! assert_eq!(item.value(), b"hello");
//! # Ok::<(), tagcache_store::Error>(())
//! # });
//! ```

pub mod builder;
pub mod store;

#[doc(inline)]
pub use builder::MemoryStoreBuilder;
#[doc(inline)]
pub use store::MemoryStore;
