// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

#[cfg(any(feature = "metrics", test))]
pub(crate) const CACHE_NAME: &str = "tagcache.name";

#[cfg(any(feature = "metrics", test))]
pub(crate) const CACHE_OPERATION_NAME: &str = "tagcache.operation";

#[cfg(any(feature = "metrics", test))]
pub(crate) const CACHE_ACTIVITY_NAME: &str = "tagcache.activity";

#[cfg(test)]
pub(crate) const CACHE_DURATION_NAME: &str = "tagcache.duration_ns";

#[cfg(test)]
pub(crate) const CACHE_EVENT_NAME: &str = "tagcache.event";
