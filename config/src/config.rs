//! # Config Value
//!
//! Read-only view over a merged configuration tree with dotted-path
//! accessors and provenance lookups.

use std::ops::Index;
use std::sync::LazyLock;

use serde::de::DeserializeOwned;
use serde::{Serialize, Serializer};
use serde_json::Value;
use serde_json::ser::PrettyFormatter;

use crate::value::{Mapping, Provenance, SourceInfo};

static EMPTY_CONFIG: LazyLock<Config> = LazyLock::new(Config::default);

/// Merged configuration plus the provenance of every scalar leaf.
///
/// Instances are immutable once built. Accessors hand out borrows or
/// independent clones, never mutable access to the tree.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Config {
    data: Mapping,
    meta: Provenance
}

impl Config {
    pub fn new(data: Mapping, meta: Provenance) -> Self {
        Self { data, meta }
    }

    /// Canonical empty configuration returned when no layer contributed data.
    pub fn empty() -> &'static Config {
        &EMPTY_CONFIG
    }

    /// Value at a dotted path, or `default` when any segment is missing.
    ///
    /// # M-CANONICAL-DOCS
    ///
    /// ## Purpose
    /// Walks the tree one segment at a time. Stops with `default` as soon as
    /// a segment is absent or a non-mapping value sits in the middle of the
    /// path. Never fails.
    ///
    /// ## Usage
    /// ```rust
    /// use config::Config;
    /// use serde_json::json;
    ///
    /// let config = Config::default();
    /// assert_eq!(config.get("any.path", "fallback"), json!("fallback"));
    /// ```
    pub fn get(&self, path: &str, default: impl Into<Value>) -> Value {
        self.get_value(path)
            .cloned()
            .unwrap_or_else(|| default.into())
    }

    /// Borrowing form of [`Config::get`].
    pub fn get_value(&self, path: &str) -> Option<&Value> {
        let mut segments = path.split('.');
        let first = segments.next()?;
        let mut current = self.data.get(first)?;
        for segment in segments {
            current = current.as_object()?.get(segment)?;
        }
        Some(current)
    }

    /// Deserialize the value at `path` into `T`. `None` when the path is
    /// missing or the value has a different shape.
    pub fn get_as<T: DeserializeOwned>(&self, path: &str) -> Option<T> {
        let value = self.get_value(path)?;
        T::deserialize(value).ok()
    }

    /// Provenance entry for an exact dotted path.
    pub fn origin(&self, path: &str) -> Option<&SourceInfo> {
        self.meta.get(path)
    }

    pub fn provenance(&self) -> &Provenance {
        &self.meta
    }

    /// Independent deep copy of the tree. Mutating it never affects `self`.
    pub fn as_dict(&self) -> Mapping {
        self.data.clone()
    }

    /// Serialize the tree as JSON in insertion order.
    ///
    /// `None` produces the compact form (`{"a":1}`); `Some(n)` indents nested
    /// levels by `n` spaces.
    pub fn to_json(&self, indent: Option<usize>) -> String {
        let rendered = match indent {
            None => serde_json::to_vec(&self.data),
            Some(width) => {
                let indent = vec![b' '; width];
                let mut buffer = Vec::new();
                let mut serializer = serde_json::Serializer::with_formatter(
                    &mut buffer,
                    PrettyFormatter::with_indent(&indent)
                );
                self.data.serialize(&mut serializer).map(|()| buffer)
            }
        };
        // A string-keyed JSON tree written to memory cannot fail to serialize.
        rendered
            .ok()
            .and_then(|bytes| String::from_utf8(bytes).ok())
            .unwrap_or_default()
    }

    /// New configuration with top-level keys replaced by `overrides`.
    ///
    /// Replacement is shallow and provenance is carried over untouched, so
    /// `origin` keeps reporting the pre-override source for replaced keys.
    #[must_use]
    pub fn with_overrides(&self, overrides: Mapping) -> Self {
        let mut data = self.data.clone();
        for (key, value) in overrides {
            data.insert(key, value);
        }
        Self {
            data,
            meta: self.meta.clone()
        }
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.data.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.data.keys().map(String::as_str)
    }

    pub fn iter(&self) -> serde_json::map::Iter<'_> {
        self.data.iter()
    }
}

impl Index<&str> for Config {
    type Output = Value;

    /// Missing keys index to `Value::Null`, as `serde_json::Value` does.
    fn index(&self, key: &str) -> &Value {
        static NULL: Value = Value::Null;
        self.data.get(key).unwrap_or(&NULL)
    }
}

impl<'a> IntoIterator for &'a Config {
    type Item = (&'a String, &'a Value);
    type IntoIter = serde_json::map::Iter<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.data.iter()
    }
}

impl Serialize for Config {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.data.serialize(serializer)
    }
}
