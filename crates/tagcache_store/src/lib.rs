// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

#![cfg_attr(coverage_nightly, feature(coverage_attribute))]
#![cfg_attr(docsrs, feature(doc_cfg))]

//! The key-value store contract underneath `tagcache`.
//!
//! This crate defines the [`Store`] trait that every backend must satisfy, the
//! [`Item`] and [`Expiry`] types exchanged with it, the [`ServerConfig`] endpoint
//! description and the [`Connect`] trait that turns endpoints into a live store,
//! and the shared [`Error`] type.
//!
//! # Store Model
//!
//! A store is a flat map from string keys to byte values with a per-key expiry.
//! It serializes single-key operations and nothing else: there are no multi-key
//! transactions and no locks. The only conditional primitives are [`Store::add`]
//! (write if absent), [`Store::replace`] (write if present) and [`Store::cas`]
//! (write if the value is unchanged since it was read).
//!
//! # Implementing a Store
//!
//! ```
//! use std::collections::HashMap;
//! use std::sync::Mutex;
//!
//! use tagcache_store::{CasOutcome, CasToken, Error, Expiry, Item, Store};
//!
//! #[derive(Default)]
//! struct MapStore(Mutex<(u64, HashMap<String, Item>)>);
//!
//! impl MapStore {
//!     fn write(&self, key: &str, value: Vec<u8>) {
//!         let mut guard = self.0.lock().unwrap();
//!         guard.0 += 1;
//!         let cas = CasToken::new(guard.0);
//!         guard.1.insert(key.to_owned(), Item::new(value, cas));
//!     }
//! }
//!
//! impl Store for MapStore {
//!     async fn get(&self, key: &str) -> Result<Option<Item>, Error> {
//!         Ok(self.0.lock().unwrap().1.get(key).cloned())
//!     }
//!
//!     async fn set(&self, key: &str, value: Vec<u8>, _expiry: Expiry) -> Result<(), Error> {
//!         self.write(key, value);
//!         Ok(())
//!     }
//!
//!     async fn add(&self, key: &str, value: Vec<u8>, _expiry: Expiry) -> Result<bool, Error> {
//!         if self.0.lock().unwrap().1.contains_key(key) {
//!             return Ok(false);
//!         }
//!         self.write(key, value);
//!         Ok(true)
//!     }
//!
//!     async fn replace(&self, key: &str, value: Vec<u8>, _expiry: Expiry) -> Result<bool, Error> {
//!         if !self.0.lock().unwrap().1.contains_key(key) {
//!             return Ok(false);
//!         }
//!         self.write(key, value);
//!         Ok(true)
//!     }
//!
//!     async fn cas(&self, key: &str, value: Vec<u8>, _expiry: Expiry, token: CasToken) -> Result<CasOutcome, Error> {
//!         let current = self.0.lock().unwrap().1.get(key).map(Item::cas);
//!         match current {
//!             None => Ok(CasOutcome::NotFound),
//!             Some(cas) if cas != token => Ok(CasOutcome::Exists),
//!             Some(_) => {
//!                 self.write(key, value);
//!                 Ok(CasOutcome::Stored)
//!             }
//!         }
//!     }
//!
//!     async fn delete(&self, key: &str) -> Result<bool, Error> {
//!         Ok(self.0.lock().unwrap().1.remove(key).is_some())
//!     }
//!
//!     async fn flush_all(&self) -> Result<bool, Error> {
//!         self.0.lock().unwrap().1.clear();
//!         Ok(true)
//!     }
//! }
//! ```

pub mod error;
mod item;
mod server;
pub(crate) mod store;
#[cfg(any(feature = "test-util", test))]
pub mod testing;

#[doc(inline)]
pub use error::{Error, ErrorKind, Result};
#[doc(inline)]
pub use item::{CasToken, Expiry, Item};
#[doc(inline)]
pub use server::{Connect, Connected, DEFAULT_HOST, DEFAULT_PORT, ServerConfig};
#[doc(inline)]
pub use store::{CasOutcome, Store};
