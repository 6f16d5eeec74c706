// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! The tagging cache facade.

use std::{
    collections::{BTreeSet, HashMap},
    sync::Arc,
    time::{Duration, SystemTime},
};

use serde::{Serialize, de::DeserializeOwned};
use tagcache_store::{Result, Store};
use tick::Clock;

use crate::{
    Lifetime, Metadata,
    builder::TaggingCacheBuilder,
    entry::EntryManager,
    keys::KeyNamer,
    tag_index::TagIndex,
    telemetry::{
        CacheActivity, CacheOperation, CacheTelemetry,
        ext::{ClockExt, TimedResult},
    },
};

/// Type alias for cache names used in telemetry.
pub type CacheName = &'static str;

/// A cache whose entries can be grouped by tags and invalidated per tag.
///
/// Each entry is kept as two store records, the value and its metadata, and
/// each tag as one record listing its keys. The store offers no transactions,
/// so the records are kept in step on a best-effort basis:
///
/// - `set` writes the metadata, then the value, then adds the key to each tag;
/// - `delete` reads the key's tags first, removes both records, then takes the
///   key out of each tag;
/// - tag records never expire, so they may name keys whose values are gone.
///   Lookups through a tag always re-check the values.
///
/// Tag records are updated with compare-and-swap, so concurrent writers never
/// lose each other's keys.
///
/// # Examples
///
/// ```
/// use tagcache::TaggingCache;
/// use tick::Clock;
/// # futures::executor::block_on(async {
///
/// let cache = TaggingCache::builder(Clock::new_frozen()).memory().build()?;
///
/// cache.set("user:1", "Ada", &["users", "admins"]).await?;
/// cache.set("user:2", "Linus", &["users"]).await?;
///
/// let users = cache.get_by_tag::<String>("users").await?;
/// assert_eq!(users.len(), 2);
///
/// cache.delete_by_tag("admins").await?;
/// assert_eq!(cache.get::<String>("user:1").await?, None);
/// assert_eq!(cache.get::<String>("user:2").await?.as_deref(), Some("Linus"));
/// # Ok::<(), tagcache::Error>(())
/// # });
/// ```
#[derive(Debug)]
pub struct TaggingCache<S> {
    name: CacheName,
    store: Arc<S>,
    entries: EntryManager<S>,
    tags: TagIndex<S>,
    namer: KeyNamer,
    lifetime: Option<Duration>,
    clock: Clock,
    telemetry: CacheTelemetry,
}

impl TaggingCache<()> {
    /// Creates a new cache builder.
    ///
    /// # Examples
    ///
    /// ```
    /// use std::time::Duration;
    ///
    /// use tagcache::TaggingCache;
    /// use tick::Clock;
    ///
    /// let cache = TaggingCache::builder(Clock::new_frozen())
    ///     .memory()
    ///     .namespace("app")
    ///     .lifetime(Duration::from_secs(600))
    ///     .build()
    ///     .expect("valid configuration");
    /// assert_eq!(cache.namespace(), "app");
    /// ```
    #[must_use]
    pub fn builder(clock: Clock) -> TaggingCacheBuilder {
        TaggingCacheBuilder::new(clock)
    }
}

impl<S> TaggingCache<S> {
    /// Returns the name of this cache for telemetry identification.
    #[must_use]
    pub fn name(&self) -> CacheName {
        self.name
    }

    /// Returns the prefix shared by every store key of this cache.
    #[must_use]
    pub fn namespace(&self) -> &str {
        self.namer.namespace()
    }

    /// Returns the lifetime applied by [`set`](Self::set); `None` means no expiry.
    #[must_use]
    pub fn default_lifetime(&self) -> Option<Duration> {
        self.lifetime
    }

    /// Returns a reference to the cache's clock.
    #[must_use]
    pub fn clock(&self) -> &Clock {
        &self.clock
    }

    /// Returns the underlying store.
    #[must_use]
    pub fn store(&self) -> &S {
        &self.store
    }
}

impl<S: Store> TaggingCache<S> {
    pub(crate) fn new(
        name: CacheName,
        store: S,
        namer: KeyNamer,
        lifetime: Option<Duration>,
        max_cas_retries: u32,
        clock: Clock,
        telemetry: CacheTelemetry,
    ) -> Self {
        let store = Arc::new(store);
        Self {
            name,
            entries: EntryManager::new(Arc::clone(&store), namer.clone(), clock.clone()),
            tags: TagIndex::new(Arc::clone(&store), namer.clone(), max_cas_retries),
            store,
            namer,
            lifetime,
            clock,
            telemetry,
        }
    }

    /// Stores `value` under `key` with the default lifetime and attaches `tags`.
    ///
    /// An existing entry is overwritten. Tags are added to, never taken from:
    /// tags of the previous entry that are missing from `tags` keep listing the key.
    ///
    /// # Errors
    ///
    /// Returns an error when a store write fails or a tag record stays contended
    /// past the retry limit. Writes done before the failure are kept.
    pub async fn set<V>(&self, key: &str, value: &V, tags: &[&str]) -> Result<()>
    where
        V: Serialize + Sync + ?Sized,
    {
        self.set_with_lifetime(key, value, tags, Lifetime::Default).await
    }

    /// Like [`set`](Self::set), with an explicit lifetime.
    ///
    /// # Errors
    ///
    /// Same as [`set`](Self::set).
    pub async fn set_with_lifetime<V>(&self, key: &str, value: &V, tags: &[&str], lifetime: Lifetime) -> Result<()>
    where
        V: Serialize + Sync + ?Sized,
    {
        let timed = self
            .clock
            .timed_async(async {
                let tags = unique(tags);
                self.entries.put(key, value, &tags, lifetime.resolve(self.lifetime)).await?;
                for tag in tags {
                    self.tags.add_key(tag, key).await?;
                }
                Ok(())
            })
            .await;
        self.record(CacheOperation::Set, &timed, |()| CacheActivity::Stored);
        timed.result
    }

    /// Returns the value stored under `key`, if any.
    ///
    /// Values that expired, or that do not decode as `V`, read as `None`.
    ///
    /// # Errors
    ///
    /// Returns an error when the store cannot be read.
    pub async fn get<V: DeserializeOwned + Send>(&self, key: &str) -> Result<Option<V>> {
        let timed = self.clock.timed_async(self.entries.get(key)).await;
        self.record(CacheOperation::Get, &timed, |value: &Option<V>| hit_or_miss(value.is_some()));
        timed.result
    }

    /// Returns the value stored under `key`, or `default`.
    ///
    /// # Errors
    ///
    /// Returns an error when the store cannot be read.
    pub async fn get_or<V: DeserializeOwned + Send>(&self, key: &str, default: V) -> Result<V> {
        Ok(self.get(key).await?.unwrap_or(default))
    }

    /// Returns the values of every key in `keys` that resolves, in one store round trip.
    ///
    /// # Errors
    ///
    /// Returns an error when the store cannot be read.
    pub async fn get_many<V, K>(&self, keys: &[K]) -> Result<HashMap<String, V>>
    where
        V: DeserializeOwned + Send,
        K: AsRef<str> + Sync,
    {
        let timed = self.clock.timed_async(self.entries.get_many(keys)).await;
        self.record(CacheOperation::GetMany, &timed, |_| CacheActivity::Ok);
        timed.result
    }

    /// Returns the tags `key` was last written with; empty if the key is unknown.
    ///
    /// # Errors
    ///
    /// Returns an error when the store cannot be read.
    pub async fn get_tags(&self, key: &str) -> Result<Vec<String>> {
        let timed = self.clock.timed_async(self.entries.tags(key)).await;
        self.record(CacheOperation::GetTags, &timed, |_| CacheActivity::Ok);
        timed.result
    }

    /// Returns every live value tagged with `tag`, keyed by logical key.
    ///
    /// Keys still listed under the tag whose values expired are left out.
    ///
    /// # Errors
    ///
    /// Returns an error when the store cannot be read.
    pub async fn get_by_tag<V: DeserializeOwned + Send>(&self, tag: &str) -> Result<HashMap<String, V>> {
        let timed = self
            .clock
            .timed_async(async {
                let keys = self.tags.resolve(tag).await?;
                self.entries.get_many(&keys).await
            })
            .await;
        self.record(CacheOperation::GetByTag, &timed, |_| CacheActivity::Ok);
        timed.result
    }

    /// Returns the keys currently listed under `tag`, live or not.
    ///
    /// # Errors
    ///
    /// Returns an error when the store cannot be read.
    pub async fn tag_members(&self, tag: &str) -> Result<BTreeSet<String>> {
        let timed = self.clock.timed_async(self.tags.resolve(tag)).await;
        self.record(CacheOperation::TagMembers, &timed, |_| CacheActivity::Ok);
        timed.result
    }

    /// Returns whether a live value is stored under `key`.
    ///
    /// # Errors
    ///
    /// Returns an error when the store cannot be read.
    pub async fn has(&self, key: &str) -> Result<bool> {
        let timed = self.clock.timed_async(self.entries.contains(key)).await;
        self.record(CacheOperation::Has, &timed, |found| hit_or_miss(*found));
        timed.result
    }

    /// Returns the metadata stored next to `key`'s value.
    ///
    /// # Errors
    ///
    /// Returns an error when the store cannot be read.
    pub async fn metadata(&self, key: &str) -> Result<Option<Metadata>> {
        let timed = self.clock.timed_async(self.entries.metadata(key)).await;
        self.record(CacheOperation::Metadata, &timed, |metadata| hit_or_miss(metadata.is_some()));
        timed.result
    }

    /// Returns when `key` was last written.
    ///
    /// # Errors
    ///
    /// Returns an error when the store cannot be read.
    pub async fn get_last_modified(&self, key: &str) -> Result<Option<SystemTime>> {
        Ok(self.metadata(key).await?.map(|metadata| metadata.last_modified()))
    }

    /// Returns when `key` expires; `None` if it is unknown or never expires.
    ///
    /// # Errors
    ///
    /// Returns an error when the store cannot be read.
    pub async fn get_timeout(&self, key: &str) -> Result<Option<SystemTime>> {
        Ok(self.metadata(key).await?.and_then(|metadata| metadata.expires_at()))
    }

    /// Removes `key` and takes it out of every tag it was written with.
    ///
    /// Deleting a missing key is not an error.
    ///
    /// # Errors
    ///
    /// Returns an error when a store call fails. Every tag is still attempted;
    /// the first failure is returned.
    pub async fn delete(&self, key: &str) -> Result<()> {
        let timed = self.clock.timed_async(self.delete_entry(key, None)).await;
        self.record(CacheOperation::Delete, &timed, |()| CacheActivity::Deleted);
        timed.result
    }

    /// Deletes every key listed under `tag`, as [`delete`](Self::delete) would.
    ///
    /// The keys are taken from a snapshot of the tag; keys tagged afterwards
    /// are not visited. The tag's own record stays, emptied of every key in
    /// the snapshot, including keys whose metadata no longer lists the tag.
    ///
    /// # Errors
    ///
    /// Returns an error when a store call fails. Every key is still attempted;
    /// the first failure is returned.
    pub async fn delete_by_tag(&self, tag: &str) -> Result<()> {
        let timed = self.clock.timed_async(self.delete_tagged(tag)).await;
        self.record(CacheOperation::DeleteByTag, &timed, |()| CacheActivity::Deleted);
        timed.result
    }

    /// Runs [`delete_by_tag`](Self::delete_by_tag) for each of `tags` in turn.
    ///
    /// # Errors
    ///
    /// Returns the first failure after every tag was attempted.
    pub async fn delete_by_tags(&self, tags: &[&str]) -> Result<()> {
        let mut first_error = None;
        for tag in unique(tags) {
            if let Err(error) = self.delete_by_tag(tag).await {
                first_error.get_or_insert(error);
            }
        }
        first_error.map_or(Ok(()), Err)
    }

    /// Deletes the record of `tag` itself, leaving its entries alone.
    ///
    /// # Errors
    ///
    /// Returns an error when the store delete fails.
    pub async fn drop_tag(&self, tag: &str) -> Result<()> {
        let timed = self.clock.timed_async(self.tags.delete_tag(tag)).await;
        self.record(CacheOperation::DropTag, &timed, |()| CacheActivity::Deleted);
        timed.result
    }

    /// Flushes the whole store.
    ///
    /// This clears every namespace sharing the store, not only this cache's.
    ///
    /// # Errors
    ///
    /// Returns an error when the store flush fails.
    pub async fn flush(&self) -> Result<bool> {
        let timed = self.clock.timed_async(self.store.flush_all()).await;
        self.record(CacheOperation::Flush, &timed, |_| CacheActivity::Flushed);
        timed.result
    }

    /// Removes `key` and takes it out of its recorded tags plus `listed_under`.
    ///
    /// `listed_under` covers a tag naming the key even though the key's
    /// metadata no longer does, because it expired or was rewritten with other tags.
    async fn delete_entry(&self, key: &str, listed_under: Option<&str>) -> Result<()> {
        // Tags must be read before the metadata goes away.
        let mut tags = self.entries.tags(key).await?;
        if let Some(tag) = listed_under
            && !tags.iter().any(|known| known == tag)
        {
            tags.push(tag.to_owned());
        }
        self.entries.remove(key).await?;

        let mut first_error = None;
        for tag in &tags {
            if let Err(error) = self.tags.remove_key(tag, key).await {
                tracing::warn!(key, tag, %error, "key left behind in tag index");
                first_error.get_or_insert(error);
            }
        }
        first_error.map_or(Ok(()), Err)
    }

    async fn delete_tagged(&self, tag: &str) -> Result<()> {
        let keys = self.tags.resolve(tag).await?;

        let mut first_error = None;
        for key in &keys {
            if let Err(error) = self.delete_entry(key, Some(tag)).await {
                first_error.get_or_insert(error);
            }
        }
        first_error.map_or(Ok(()), Err)
    }

    fn record<T>(&self, operation: CacheOperation, timed: &TimedResult<Result<T>>, activity: impl FnOnce(&T) -> CacheActivity) {
        let activity = match &timed.result {
            Ok(value) => activity(value),
            Err(_) => CacheActivity::Error,
        };
        self.telemetry.record(self.name, operation, activity, timed.duration);
    }
}

fn hit_or_miss(found: bool) -> CacheActivity {
    if found { CacheActivity::Hit } else { CacheActivity::Miss }
}

/// Drops repeated tags, keeping first-seen order.
fn unique<'a>(tags: &[&'a str]) -> Vec<&'a str> {
    let mut seen = BTreeSet::new();
    tags.iter().copied().filter(|tag| seen.insert(*tag)).collect()
}
