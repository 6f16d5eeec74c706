// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Tag Invalidation Example
//!
//! Groups product pages by category and invalidates a whole category when its
//! prices change. Every cache operation is logged through `tracing`.

use serde::{Deserialize, Serialize};
use tagcache::{Error, TaggingCache};
use tick::Clock;
use tracing_subscriber::{fmt, prelude::*};

#[derive(Debug, Serialize, Deserialize)]
struct Product {
    name: String,
    price_cents: u64,
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    tracing_subscriber::registry().with(fmt::layer()).init();

    let cache = TaggingCache::builder(Clock::new_tokio())
        .memory()
        .name("products")
        .namespace("shop")
        .logs()
        .build()?;

    let products = [
        ("product:1", "Kettle", 2_999, ["kitchen", "sale"]),
        ("product:2", "Toaster", 3_499, ["kitchen", "new"]),
        ("product:3", "Lamp", 1_999, ["living", "sale"]),
    ];
    for (key, name, price_cents, tags) in products {
        let product = Product {
            name: name.to_owned(),
            price_cents,
        };
        cache.set(key, &product, &tags).await?;
    }

    // The sale ends, so everything tagged with it must be rebuilt
    cache.delete_by_tag("sale").await?;

    let kitchen = cache.get_by_tag::<Product>("kitchen").await?;
    for (key, product) in &kitchen {
        println!("{key}: {} at {} cents", product.name, product.price_cents);
    }

    // Stop tracking a tag without touching its entries
    cache.drop_tag("new").await?;
    println!("product:2 still cached: {}", cache.has("product:2").await?);

    Ok(())
}
