// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::time::{Duration, SystemTime};

/// How long a value written by [`TaggingCache::set_with_lifetime`](crate::TaggingCache::set_with_lifetime) lives.
///
/// A zero duration means the value never expires, matching the memcached
/// convention for an expiry of `0`. This is not `now + 0`: a zero lifetime
/// does not expire the value on write.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Lifetime {
    /// Use the lifetime the cache was built with.
    #[default]
    Default,
    /// Never expire.
    Never,
    /// Expire this long after the write.
    For(Duration),
}

impl Lifetime {
    /// Resolves against the cache-wide default; `None` means no expiry.
    pub(crate) fn resolve(self, default: Option<Duration>) -> Option<Duration> {
        match self {
            Self::Default => default,
            Self::Never => None,
            Self::For(duration) if duration.is_zero() => None,
            Self::For(duration) => Some(duration),
        }
    }
}

impl From<Duration> for Lifetime {
    fn from(duration: Duration) -> Self {
        Self::For(duration)
    }
}

impl From<Option<Duration>> for Lifetime {
    fn from(duration: Option<Duration>) -> Self {
        duration.map_or(Self::Never, Self::For)
    }
}

/// Absolute expiry for a write at `now`. Saturates to "never" past the end of time.
pub(crate) fn expires_at(now: SystemTime, lifetime: Option<Duration>) -> Option<SystemTime> {
    lifetime.and_then(|duration| now.checked_add(duration))
}
