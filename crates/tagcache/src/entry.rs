// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Value and metadata records of a logical key.

use std::{collections::HashMap, sync::Arc, time::Duration};

use serde::{Serialize, de::DeserializeOwned, de::IgnoredAny};
use tagcache_store::{Expiry, Result, Store};
use tick::Clock;

use crate::{
    keys::KeyNamer,
    lifetime::expires_at,
    records::{Metadata, ValueRecord, decode, encode, is_expired},
};

#[derive(Debug)]
pub(crate) struct EntryManager<S> {
    store: Arc<S>,
    namer: KeyNamer,
    clock: Clock,
}

impl<S: Store> EntryManager<S> {
    pub(crate) fn new(store: Arc<S>, namer: KeyNamer, clock: Clock) -> Self {
        Self { store, namer, clock }
    }

    /// Writes metadata, then the value.
    ///
    /// The two writes are independent. If the value write fails the metadata
    /// stays behind, which still lets a later delete find the key's tags.
    pub(crate) async fn put<V>(&self, key: &str, payload: &V, tags: &[&str], lifetime: Option<Duration>) -> Result<()>
    where
        V: Serialize + ?Sized,
    {
        let now = self.clock.system_time();
        let expires_at = expires_at(now, lifetime);
        let expiry = Expiry::from(expires_at);

        let metadata = Metadata::new(key, now, expires_at, tags.iter().map(|tag| (*tag).to_owned()).collect());
        self.replace_or_set(&self.namer.meta_key(key), encode(&metadata)?, expiry).await?;

        let value = ValueRecord {
            key: key.to_owned(),
            payload,
            expires_at,
        };
        self.replace_or_set(&self.namer.value_key(key), encode(&value)?, expiry).await
    }

    async fn replace_or_set(&self, physical: &str, bytes: Vec<u8>, expiry: Expiry) -> Result<()> {
        if self.store.replace(physical, bytes.clone(), expiry).await? {
            return Ok(());
        }
        self.store.set(physical, bytes, expiry).await
    }

    pub(crate) async fn get<V: DeserializeOwned>(&self, key: &str) -> Result<Option<V>> {
        Ok(self.value_record::<V>(key).await?.map(|record| record.payload))
    }

    pub(crate) async fn contains(&self, key: &str) -> Result<bool> {
        Ok(self.value_record::<IgnoredAny>(key).await?.is_some())
    }

    async fn value_record<V: DeserializeOwned>(&self, key: &str) -> Result<Option<ValueRecord<V>>> {
        let physical = self.namer.value_key(key);
        let Some(item) = self.store.get(&physical).await? else {
            return Ok(None);
        };
        let now = self.clock.system_time();
        Ok(decode::<ValueRecord<V>>(&physical, item.value()).filter(|record| !is_expired(record.expires_at, now)))
    }

    /// Reads many values in one round trip. Keys that did not resolve are left out.
    pub(crate) async fn get_many<V, K>(&self, keys: impl IntoIterator<Item = K>) -> Result<HashMap<String, V>>
    where
        V: DeserializeOwned,
        K: AsRef<str>,
    {
        let physical: Vec<String> = keys.into_iter().map(|key| self.namer.value_key(key.as_ref())).collect();
        if physical.is_empty() {
            return Ok(HashMap::new());
        }

        let items = self.store.get_multi(&physical).await?;
        let now = self.clock.system_time();

        Ok(items
            .into_iter()
            .filter_map(|(physical, item)| {
                let key = self.namer.logical_value_key(&physical)?.to_owned();
                let record = decode::<ValueRecord<V>>(&physical, item.value())?;
                (!is_expired(record.expires_at, now)).then_some((key, record.payload))
            })
            .collect())
    }

    pub(crate) async fn metadata(&self, key: &str) -> Result<Option<Metadata>> {
        let physical = self.namer.meta_key(key);
        let Some(item) = self.store.get(&physical).await? else {
            return Ok(None);
        };
        let now = self.clock.system_time();
        Ok(decode::<Metadata>(&physical, item.value()).filter(|metadata| !metadata.is_expired_at(now)))
    }

    pub(crate) async fn tags(&self, key: &str) -> Result<Vec<String>> {
        Ok(self.metadata(key).await?.map(Metadata::into_tags).unwrap_or_default())
    }

    /// Deletes the value, then the metadata. Missing records are fine.
    pub(crate) async fn remove(&self, key: &str) -> Result<()> {
        self.store.delete(&self.namer.value_key(key)).await?;
        self.store.delete(&self.namer.meta_key(key)).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use tagcache_store::testing::{MockStore, StoreOp};
    use tick::ClockControl;

    use super::*;

    fn block_on<F: std::future::Future>(f: F) -> F::Output {
        futures::executor::block_on(f)
    }

    fn manager(store: &MockStore, clock: Clock) -> EntryManager<MockStore> {
        EntryManager::new(Arc::new(store.clone()), KeyNamer::new("ns").expect("valid namespace"), clock)
    }

    #[test]
    fn put_writes_metadata_before_value() {
        block_on(async {
            let store = MockStore::new();
            let entries = manager(&store, Clock::new_frozen());

            entries.put("k", "v", &["t"], None).await.expect("put failed");

            let sets: Vec<_> = store
                .operations()
                .into_iter()
                .filter(|op| matches!(op, StoreOp::Set { .. }))
                .collect();
            assert_eq!(
                sets,
                vec![
                    StoreOp::Set {
                        key: "ns:m:k".to_owned(),
                        expiry: Expiry::Never
                    },
                    StoreOp::Set {
                        key: "ns:v:k".to_owned(),
                        expiry: Expiry::Never
                    },
                ]
            );
        });
    }

    #[test]
    fn overwrite_uses_replace() {
        block_on(async {
            let store = MockStore::new();
            let entries = manager(&store, Clock::new_frozen());

            entries.put("k", "v1", &[], None).await.expect("put failed");
            store.clear_operations();
            entries.put("k", "v2", &[], None).await.expect("put failed");

            assert!(
                store
                    .operations()
                    .iter()
                    .all(|op| matches!(op, StoreOp::Replace { .. }))
            );
            assert_eq!(entries.get::<String>("k").await.expect("get failed").as_deref(), Some("v2"));
        });
    }

    #[test]
    fn lifetime_becomes_store_expiry() {
        block_on(async {
            let control = ClockControl::new();
            let clock = control.to_clock();
            let store = MockStore::new();
            let entries = manager(&store, clock.clone());

            entries
                .put("k", &1, &[], Some(Duration::from_secs(30)))
                .await
                .expect("put failed");

            let expected = Expiry::At(clock.system_time() + Duration::from_secs(30));
            assert_eq!(store.expiry("ns:v:k"), Some(expected));
            assert_eq!(store.expiry("ns:m:k"), Some(expected));
        });
    }

    #[test]
    fn expired_records_read_as_absent_even_if_store_keeps_them() {
        block_on(async {
            let control = ClockControl::new();
            let store = MockStore::new();
            let entries = manager(&store, control.to_clock());

            entries
                .put("k", &1, &["t"], Some(Duration::from_secs(30)))
                .await
                .expect("put failed");
            control.advance(Duration::from_secs(30));

            assert!(store.contains_key("ns:v:k"));
            assert_eq!(entries.get::<i32>("k").await.expect("get failed"), None);
            assert!(!entries.contains("k").await.expect("contains failed"));
            assert!(entries.tags("k").await.expect("tags failed").is_empty());
            assert!(entries.get_many::<i32, _>(["k"]).await.expect("get_many failed").is_empty());
        });
    }

    #[test]
    fn undecodable_value_is_absent() {
        block_on(async {
            let store = MockStore::new();
            let entries = manager(&store, Clock::new_frozen());
            store.put("ns:v:k", b"{broken".to_vec());

            assert_eq!(entries.get::<String>("k").await.expect("get failed"), None);
        });
    }

    #[test]
    fn value_of_wrong_type_is_absent() {
        block_on(async {
            let store = MockStore::new();
            let entries = manager(&store, Clock::new_frozen());
            entries.put("k", "text", &[], None).await.expect("put failed");

            assert_eq!(entries.get::<u64>("k").await.expect("get failed"), None);
            assert!(entries.contains("k").await.expect("contains failed"));
        });
    }

    #[test]
    fn get_many_uses_one_round_trip() {
        block_on(async {
            let store = MockStore::new();
            let entries = manager(&store, Clock::new_frozen());
            entries.put("a", &1, &[], None).await.expect("put failed");
            entries.put("b", &2, &[], None).await.expect("put failed");
            store.clear_operations();

            let found: HashMap<String, i32> = entries.get_many(["a", "b", "c"]).await.expect("get_many failed");

            assert_eq!(found.len(), 2);
            assert_eq!(found["a"], 1);
            assert_eq!(found["b"], 2);
            assert_eq!(store.operations().len(), 1);
        });
    }

    #[test]
    fn get_many_with_no_keys_skips_the_store() {
        block_on(async {
            let store = MockStore::new();
            let entries = manager(&store, Clock::new_frozen());

            let found: HashMap<String, i32> = entries.get_many(Vec::<String>::new()).await.expect("get_many failed");
            assert!(found.is_empty());
            assert!(store.operations().is_empty());
        });
    }

    #[test]
    fn remove_is_idempotent() {
        block_on(async {
            let store = MockStore::new();
            let entries = manager(&store, Clock::new_frozen());
            entries.put("k", &1, &["t"], None).await.expect("put failed");

            entries.remove("k").await.expect("first remove failed");
            entries.remove("k").await.expect("second remove failed");
            assert_eq!(store.entry_count(), 0);
        });
    }
}
