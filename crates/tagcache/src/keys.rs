// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Physical key derivation.
//!
//! Every logical key maps to two store keys (value and metadata) and every tag
//! to one, all prefixed with the cache namespace:
//!
//! ```text
//! <namespace>:v:<key>   value record
//! <namespace>:m:<key>   metadata record
//! <namespace>:t:<tag>   tag index record
//! ```

use tagcache_store::{Error, Result};
use xxhash_rust::xxh3::xxh3_64;

const SEPARATOR: char = ':';
const VALUE: &str = "v";
const META: &str = "m";
const TAG: &str = "t";

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct KeyNamer {
    namespace: String,
    value_prefix: String,
    meta_prefix: String,
    tag_prefix: String,
}

impl KeyNamer {
    /// Creates a namer for `namespace`.
    ///
    /// The namespace must be non-empty and free of `:`, otherwise the kind
    /// indicator could not be told apart from the namespace.
    pub(crate) fn new(namespace: impl Into<String>) -> Result<Self> {
        let namespace = namespace.into();
        if namespace.is_empty() {
            return Err(Error::config("namespace must not be empty"));
        }
        if namespace.contains(SEPARATOR) {
            return Err(Error::config(format!("namespace `{namespace}` must not contain `{SEPARATOR}`")));
        }
        Ok(Self::from_valid(namespace))
    }

    fn from_valid(namespace: String) -> Self {
        Self {
            value_prefix: format!("{namespace}{SEPARATOR}{VALUE}{SEPARATOR}"),
            meta_prefix: format!("{namespace}{SEPARATOR}{META}{SEPARATOR}"),
            tag_prefix: format!("{namespace}{SEPARATOR}{TAG}{SEPARATOR}"),
            namespace,
        }
    }

    pub(crate) fn namespace(&self) -> &str {
        &self.namespace
    }

    pub(crate) fn value_key(&self, key: &str) -> String {
        format!("{}{key}", self.value_prefix)
    }

    pub(crate) fn meta_key(&self, key: &str) -> String {
        format!("{}{key}", self.meta_prefix)
    }

    pub(crate) fn tag_key(&self, tag: &str) -> String {
        format!("{}{tag}", self.tag_prefix)
    }

    /// Maps a physical value key back to its logical key.
    pub(crate) fn logical_value_key<'a>(&self, physical: &'a str) -> Option<&'a str> {
        physical.strip_prefix(self.value_prefix.as_str())
    }
}

impl Default for KeyNamer {
    /// Namespaces by the install location of this crate, so every cache built
    /// from the same location shares keys.
    fn default() -> Self {
        Self::from_valid(default_namespace())
    }
}

pub(crate) fn default_namespace() -> String {
    format!("{:016x}", xxh3_64(env!("CARGO_MANIFEST_DIR").as_bytes()))
}

#[cfg(test)]
mod tests {
    use tagcache_store::ErrorKind;

    use super::*;

    #[test]
    fn derives_distinct_keys_per_kind() {
        let namer = KeyNamer::new("app").expect("valid namespace");
        assert_eq!(namer.value_key("user"), "app:v:user");
        assert_eq!(namer.meta_key("user"), "app:m:user");
        assert_eq!(namer.tag_key("user"), "app:t:user");
    }

    #[test]
    fn logical_key_round_trips_only_for_value_keys() {
        let namer = KeyNamer::new("app").expect("valid namespace");
        assert_eq!(namer.logical_value_key("app:v:a:b"), Some("a:b"));
        assert_eq!(namer.logical_value_key("app:m:a"), None);
        assert_eq!(namer.logical_value_key("other:v:a"), None);
    }

    #[test]
    fn rejects_bad_namespaces() {
        assert_eq!(KeyNamer::new("").expect_err("empty").kind(), ErrorKind::Config);
        assert_eq!(KeyNamer::new("a:b").expect_err("separator").kind(), ErrorKind::Config);
    }

    #[test]
    fn default_namespace_is_stable_hex() {
        let first = KeyNamer::default();
        let second = KeyNamer::default();
        assert_eq!(first, second);
        assert_eq!(first.namespace().len(), 16);
        assert!(first.namespace().chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn namespaces_never_collide() {
        let a = KeyNamer::new("a").expect("valid namespace");
        let b = KeyNamer::new("b").expect("valid namespace");
        assert_ne!(a.value_key("k"), b.value_key("k"));
        assert_ne!(a.tag_key("t"), b.tag_key("t"));
    }
}
