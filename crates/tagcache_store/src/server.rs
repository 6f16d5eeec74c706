// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::fmt;

use crate::{Error, Result, Store};

/// Host used when an endpoint does not name one.
pub const DEFAULT_HOST: &str = "localhost";

/// Port used when an endpoint does not name one.
pub const DEFAULT_PORT: u16 = 11211;

/// One backend endpoint of a store.
///
/// Every field has a default, so a configuration file may list only the parts
/// that differ from `localhost:11211`, persistent, weight 1.
///
/// # Examples
///
/// ```
/// use tagcache_store::ServerConfig;
///
/// let server = ServerConfig::new("cache-1.internal", 11212).weight(2);
/// assert_eq!(server.to_string(), "cache-1.internal:11212");
/// assert!(server.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct ServerConfig {
    /// Host name or address.
    pub host: String,
    /// TCP port.
    pub port: u16,
    /// Whether the connection is kept open between requests.
    pub persistent: bool,
    /// Relative share of keys routed to this endpoint.
    pub weight: u32,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_owned(),
            port: DEFAULT_PORT,
            persistent: true,
            weight: 1,
        }
    }
}

impl ServerConfig {
    /// Creates a persistent endpoint with weight 1.
    #[must_use]
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
            ..Self::default()
        }
    }

    /// Sets whether the connection is persistent.
    #[must_use]
    pub fn persistent(mut self, persistent: bool) -> Self {
        self.persistent = persistent;
        self
    }

    /// Sets the routing weight.
    #[must_use]
    pub fn weight(mut self, weight: u32) -> Self {
        self.weight = weight;
        self
    }

    /// Checks that the endpoint can be connected to at all.
    ///
    /// # Errors
    ///
    /// Returns an [`ErrorKind::Connection`](crate::ErrorKind::Connection) error for
    /// an empty host, port 0 or weight 0.
    pub fn validate(&self) -> Result<()> {
        if self.host.trim().is_empty() {
            return Err(Error::connection("server host is empty"));
        }
        if self.port == 0 {
            return Err(Error::connection(format!("can't connect to server ({self}): port 0")));
        }
        if self.weight == 0 {
            return Err(Error::connection(format!("can't connect to server ({self}): weight 0")));
        }
        Ok(())
    }
}

impl fmt::Display for ServerConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.host, self.port)
    }
}

/// Turns a list of endpoints into a connected [`Store`].
///
/// Connecting happens once, while a cache is built. A failure here is the only
/// error a cache reports at construction time.
pub trait Connect {
    /// The store produced by a successful connection.
    type Store: Store;

    /// Connects to the given endpoints.
    ///
    /// # Errors
    ///
    /// Returns an [`ErrorKind::Connection`](crate::ErrorKind::Connection) error when
    /// no endpoint is usable.
    fn connect(self, servers: &[ServerConfig]) -> Result<Self::Store>;
}

/// A store that is already connected; [`Connect`] hands it back unchanged.
#[derive(Debug, Clone)]
pub struct Connected<S>(pub S);

impl<S: Store> Connect for Connected<S> {
    type Store = S;

    fn connect(self, _servers: &[ServerConfig]) -> Result<S> {
        Ok(self.0)
    }
}
