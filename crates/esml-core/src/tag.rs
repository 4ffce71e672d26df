//! # Type Tags
//!
//! An event's `type` is either `name` or `name@version`. The name is one or
//! more characters without `@`; everything after the *first* `@` is the
//! version, further `@` characters included. Versions are arbitrary strings
//! and may be empty: `Foo@` has version `""`, which is a different tag from
//! plain `Foo`.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::ErrorKind;

/// Identity key of a schema in the registry.
///
/// Ordering is by name, then version with the unversioned tag first.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TypeTag {
    name: String,
    version: Option<String>,
}

impl TypeTag {
    /// Parse `name` or `name@version`.
    ///
    /// # Errors
    ///
    /// Returns [`ErrorKind::InvalidTag`] if the name part is empty, which
    /// covers the empty string and any tag starting with `@`.
    pub fn parse(tag: &str) -> Result<Self, ErrorKind> {
        let (name, version) = match tag.split_once('@') {
            Some((name, version)) => (name, Some(version.to_string())),
            None => (tag, None),
        };
        if name.is_empty() {
            return Err(ErrorKind::InvalidTag {
                tag: tag.to_string(),
            });
        }
        Ok(Self {
            name: name.to_string(),
            version,
        })
    }

    /// A tag without a version. The caller guarantees `name` is non-empty
    /// and free of `@`.
    pub fn unversioned(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: None,
        }
    }

    /// The name part.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The version part, if the tag had an `@`.
    pub fn version(&self) -> Option<&str> {
        self.version.as_deref()
    }
}

impl fmt::Display for TypeTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.version {
            Some(version) => write!(f, "{}@{}", self.name, version),
            None => f.write_str(&self.name),
        }
    }
}

impl FromStr for TypeTag {
    type Err = ErrorKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl Serialize for TypeTag {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for TypeTag {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Self::parse(&raw).map_err(serde::de::Error::custom)
    }
}
