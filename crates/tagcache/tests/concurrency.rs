// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

#![cfg(feature = "memory")]

//! Concurrent writers sharing tag records.

use std::{collections::BTreeSet, sync::Arc};

use tagcache::{Error, MemoryStore, TaggingCache};
use tick::Clock;

type TestResult = Result<(), Error>;

const WRITERS: usize = 32;

fn shared_cache() -> Arc<TaggingCache<MemoryStore>> {
    Arc::new(
        TaggingCache::builder(Clock::new_tokio())
            .memory()
            .namespace("concurrency")
            .build()
            .expect("build failed"),
    )
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_sets_keep_every_member() -> TestResult {
    let cache = shared_cache();

    let handles: Vec<_> = (0..WRITERS)
        .map(|i| {
            let cache = Arc::clone(&cache);
            tokio::spawn(async move { cache.set(&format!("key{i}"), &i, &["shared", "other"]).await })
        })
        .collect();
    for handle in handles {
        handle.await.expect("task panicked")?;
    }

    let expected: BTreeSet<String> = (0..WRITERS).map(|i| format!("key{i}")).collect();
    assert_eq!(cache.tag_members("shared").await?, expected);
    assert_eq!(cache.tag_members("other").await?, expected);
    assert_eq!(cache.get_by_tag::<usize>("shared").await?.len(), WRITERS);
    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_sets_and_deletes_leave_exact_membership() -> TestResult {
    let cache = shared_cache();
    for i in 0..WRITERS {
        cache.set(&format!("old{i}"), &i, &["shared"]).await?;
    }

    let mut handles = Vec::new();
    for i in 0..WRITERS {
        let deleter = Arc::clone(&cache);
        handles.push(tokio::spawn(async move { deleter.delete(&format!("old{i}")).await }));
        let writer = Arc::clone(&cache);
        handles.push(tokio::spawn(async move { writer.set(&format!("new{i}"), &i, &["shared"]).await }));
    }
    for handle in handles {
        handle.await.expect("task panicked")?;
    }

    let expected: BTreeSet<String> = (0..WRITERS).map(|i| format!("new{i}")).collect();
    assert_eq!(cache.tag_members("shared").await?, expected);
    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_writers_through_separate_instances() -> TestResult {
    let store = MemoryStore::new(Clock::new_tokio());
    let caches: Vec<_> = (0..4)
        .map(|_| {
            Arc::new(
                TaggingCache::builder(Clock::new_tokio())
                    .storage(store.clone())
                    .namespace("shared-store")
                    .build()
                    .expect("build failed"),
            )
        })
        .collect();

    let handles: Vec<_> = (0..WRITERS)
        .map(|i| {
            let cache = Arc::clone(&caches[i % caches.len()]);
            tokio::spawn(async move { cache.set(&format!("key{i}"), "v", &["t"]).await })
        })
        .collect();
    for handle in handles {
        handle.await.expect("task panicked")?;
    }

    assert_eq!(caches[0].tag_members("t").await?.len(), WRITERS);
    Ok(())
}
