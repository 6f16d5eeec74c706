// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Error types for store and tagging operations.

use std::fmt;

/// What went wrong, in the coarse categories callers branch on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum ErrorKind {
    /// No store endpoint could be reached while connecting.
    Connection,
    /// The supplied configuration is invalid.
    Config,
    /// A store operation failed.
    Store,
    /// A record could not be encoded for the store.
    Codec,
    /// A conditional write kept losing to concurrent writers.
    Contention,
}

impl ErrorKind {
    /// Returns a stable, lower-case name for this kind.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Connection => "connection",
            Self::Config => "config",
            Self::Store => "store",
            Self::Codec => "codec",
            Self::Contention => "contention",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An error from a store or tagging operation.
///
/// The error carries an [`ErrorKind`] and, usually, the underlying cause. Use
/// [`std::error::Error::source()`] or [`ohno::ErrorExt::find_source`] to reach
/// the cause.
///
/// # Example
///
/// ```
/// use tagcache_store::{Error, ErrorKind};
///
/// let error = Error::from_message(ErrorKind::Store, "connection reset");
/// assert_eq!(error.kind(), ErrorKind::Store);
/// ```
#[ohno::error]
#[display("{kind} error")]
pub struct Error {
    kind: ErrorKind,
}

impl Error {
    /// Creates an error of the given kind caused by `cause`.
    pub fn from_message(kind: ErrorKind, cause: impl Into<Box<dyn std::error::Error + Send + Sync>>) -> Self {
        Self::caused_by(kind, cause)
    }

    /// Creates an error of the given kind wrapping another error value.
    pub fn from_source<E>(kind: ErrorKind, source: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::caused_by(kind, source)
    }

    /// Shorthand for an [`ErrorKind::Store`] error.
    pub fn store(cause: impl Into<Box<dyn std::error::Error + Send + Sync>>) -> Self {
        Self::caused_by(ErrorKind::Store, cause)
    }

    /// Shorthand for an [`ErrorKind::Connection`] error.
    pub fn connection(cause: impl Into<Box<dyn std::error::Error + Send + Sync>>) -> Self {
        Self::caused_by(ErrorKind::Connection, cause)
    }

    /// Shorthand for an [`ErrorKind::Config`] error.
    pub fn config(cause: impl Into<Box<dyn std::error::Error + Send + Sync>>) -> Self {
        Self::caused_by(ErrorKind::Config, cause)
    }

    /// Returns the category of this error.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        self.kind
    }
}

/// A specialized [`Result`] type for store operations.
pub type Result<T> = std::result::Result<T, Error>;
