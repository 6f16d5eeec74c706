// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Serializable cache configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tagcache_store::{Error, Result, ServerConfig};

/// Lifetime of values written without an explicit one.
pub const DEFAULT_LIFETIME: Duration = Duration::from_secs(3600);

/// Conditional-write retries per tag record update.
pub const DEFAULT_MAX_CAS_RETRIES: u32 = 64;

/// Cache settings as they appear in a configuration file.
///
/// Every field is optional; missing ones keep the builder's defaults.
///
/// # Examples
///
/// ```
/// use tagcache::CacheConfig;
///
/// let config = CacheConfig::from_json(
///     r#"{
///         "lifetime": 600,
///         "namespace": "shop",
///         "servers": [{ "host": "cache-1", "port": 11211 }]
///     }"#,
/// )?;
///
/// assert_eq!(config.lifetime, Some(600));
/// assert_eq!(config.servers[0].host, "cache-1");
/// assert!(config.servers[0].persistent);
/// # Ok::<(), tagcache::Error>(())
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
#[non_exhaustive]
pub struct CacheConfig {
    /// Default lifetime in seconds; `0` means values never expire.
    pub lifetime: Option<u64>,
    /// Prefix for every store key; must be non-empty and free of `:`.
    pub namespace: Option<String>,
    /// Store endpoints.
    pub servers: Vec<ServerConfig>,
    /// Conditional-write retries per tag record update.
    pub max_cas_retries: Option<u32>,
}

impl CacheConfig {
    /// Parses a JSON configuration document.
    ///
    /// # Errors
    ///
    /// Returns a [`Config`](tagcache_store::ErrorKind::Config) error when the
    /// document is not valid JSON or has unknown fields.
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(Error::config)
    }

    /// The default lifetime this configuration asks for, if any.
    ///
    /// `Some(None)` means values never expire.
    pub(crate) fn default_lifetime(&self) -> Option<Option<Duration>> {
        self.lifetime.map(|secs| (secs != 0).then_some(Duration::from_secs(secs)))
    }
}
