// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Per-tag key sets.
//!
//! A tag index record is read, changed and written back with `cas`, or with
//! `add` when the record does not exist yet. A conflicting write by another
//! client makes the conditional write fail, and the whole cycle is retried on
//! fresh data. Records are written without expiry.

use std::{collections::BTreeSet, sync::Arc};

use tagcache_store::{CasOutcome, Error, ErrorKind, Expiry, Result, Store};

use crate::{
    keys::KeyNamer,
    records::{TagRecord, decode, encode},
};

#[derive(Debug)]
pub(crate) struct TagIndex<S> {
    store: Arc<S>,
    namer: KeyNamer,
    max_retries: u32,
}

impl<S: Store> TagIndex<S> {
    pub(crate) fn new(store: Arc<S>, namer: KeyNamer, max_retries: u32) -> Self {
        Self {
            store,
            namer,
            max_retries,
        }
    }

    /// Returns the keys recorded for `tag`; empty when the tag is unknown.
    pub(crate) async fn resolve(&self, tag: &str) -> Result<BTreeSet<String>> {
        let physical = self.namer.tag_key(tag);
        Ok(self
            .store
            .get(&physical)
            .await?
            .and_then(|item| decode::<TagRecord>(&physical, item.value()))
            .map(|record| record.keys)
            .unwrap_or_default())
    }

    pub(crate) async fn add_key(&self, tag: &str, key: &str) -> Result<()> {
        self.update(tag, |keys| keys.insert(key.to_owned())).await
    }

    pub(crate) async fn remove_key(&self, tag: &str, key: &str) -> Result<()> {
        self.update(tag, |keys| keys.remove(key)).await
    }

    pub(crate) async fn delete_tag(&self, tag: &str) -> Result<()> {
        self.store.delete(&self.namer.tag_key(tag)).await?;
        Ok(())
    }

    /// Applies `mutate` until a conditional write lands.
    ///
    /// `mutate` returns `false` when it changed nothing, in which case nothing is written.
    async fn update<F>(&self, tag: &str, mutate: F) -> Result<()>
    where
        F: Fn(&mut BTreeSet<String>) -> bool + Send,
    {
        let physical = self.namer.tag_key(tag);

        for attempt in 0..=self.max_retries {
            let current = self.store.get(&physical).await?;
            let token = current.as_ref().map(tagcache_store::Item::cas);
            let mut record = current
                .and_then(|item| decode::<TagRecord>(&physical, item.value()))
                .unwrap_or_else(|| TagRecord::empty(tag));

            if !mutate(&mut record.keys) {
                return Ok(());
            }

            let bytes = encode(&record)?;
            let stored = match token {
                Some(token) => self.store.cas(&physical, bytes, Expiry::Never, token).await? == CasOutcome::Stored,
                None => self.store.add(&physical, bytes, Expiry::Never).await?,
            };
            if stored {
                return Ok(());
            }

            tracing::debug!(tag, attempt, "tag index changed concurrently, retrying");
        }

        Err(Error::from_message(
            ErrorKind::Contention,
            format!("tag `{tag}` kept changing over {} attempts", u64::from(self.max_retries) + 1),
        ))
    }
}
