// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Simple Tagging Cache Example
//!
//! Stores tagged values, reads them back by key and by tag, then invalidates a tag.

use std::time::Duration;

use tagcache::{Error, Lifetime, TaggingCache};
use tick::Clock;

#[tokio::main]
async fn main() -> Result<(), Error> {
    let clock = Clock::new_tokio();

    // In-memory store, values live for ten minutes unless told otherwise
    let cache = TaggingCache::builder(clock)
        .memory()
        .namespace("simple")
        .lifetime(Duration::from_secs(600))
        .build()?;

    cache.set("key1", "value_1", &["1", "2", "3"]).await?;
    cache.set("key2", "value_2", &["2", "3", "4"]).await?;
    cache
        .set_with_lifetime("session", "short-lived", &["1"], Lifetime::For(Duration::from_secs(5)))
        .await?;

    let value: Option<String> = cache.get("key1").await?;
    println!("key1 = {value:?}");
    println!("key1 tags = {:?}", cache.get_tags("key1").await?);
    println!("key1 expires at {:?}", cache.get_timeout("key1").await?);

    let tagged = cache.get_by_tag::<String>("3").await?;
    println!("tag 3 holds {} values", tagged.len());

    // Deleting by tag 2 removes both keys and clears them from tags 1, 3 and 4
    cache.delete_by_tag("2").await?;
    println!("key2 after delete_by_tag = {:?}", cache.get::<String>("key2").await?);
    println!("tag 4 members = {:?}", cache.tag_members("4").await?);

    Ok(())
}
