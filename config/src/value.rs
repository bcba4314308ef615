//! # Layer Value Model
//!
//! Shared vocabulary for the merge engine, the adapters and the composition
//! root: layer names, provenance entries, layer payloads and the ordered
//! nested mapping they carry.

use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use strum::{AsRefStr, Display, EnumString, IntoStaticStr};

/// Ordered nested mapping. Insertion order is preserved (`preserve_order`).
pub type Mapping = serde_json::Map<String, serde_json::Value>;

/// Provenance index keyed by dotted path.
pub type Provenance = BTreeMap<String, SourceInfo>;

/// One precedence tier of configuration, lowest to highest.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
    IntoStaticStr
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum LayerName {
    App,
    Host,
    User,
    Dotenv,
    Env
}

impl LayerName {
    /// All layers in precedence order (lowest first).
    pub const ALL: [LayerName; 5] = [
        LayerName::App,
        LayerName::Host,
        LayerName::User,
        LayerName::Dotenv,
        LayerName::Env
    ];

    /// Layers backed by structured files discovered by the path resolver.
    pub const FILE_LAYERS: [LayerName; 3] = [LayerName::App, LayerName::Host, LayerName::User];

    pub fn as_str(self) -> &'static str {
        self.into()
    }
}

/// Where a resolved configuration key came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceInfo {
    pub layer: LayerName,
    pub path: Option<PathBuf>,
    pub key: String
}

impl SourceInfo {
    pub fn new(layer: LayerName, path: Option<PathBuf>, key: impl Into<String>) -> Self {
        Self {
            layer,
            path,
            key: key.into()
        }
    }
}

/// A single layer's contribution to the merge.
#[derive(Debug, Clone, PartialEq)]
pub struct LayerPayload {
    pub layer: LayerName,
    pub data: Mapping,
    pub source_path: Option<PathBuf>
}

impl LayerPayload {
    pub fn new(layer: LayerName, data: Mapping, source_path: Option<PathBuf>) -> Self {
        Self {
            layer,
            data,
            source_path
        }
    }

    /// Payload without a backing file (environment, in-memory sources).
    pub fn in_memory(layer: LayerName, data: Mapping) -> Self {
        Self::new(layer, data, None)
    }
}

/// Find an existing key matching `key` case-insensitively, or produce the
/// lowercase form for a new entry.
///
/// Linear scan per lookup; mappings at configuration scale are small and the
/// first-seen casing must win, which a lowercase-keyed hash cannot express.
pub fn resolve_key(mapping: &Mapping, key: &str) -> String {
    let lower = key.to_lowercase();
    mapping
        .keys()
        .find(|existing| existing.to_lowercase() == lower)
        .cloned()
        .unwrap_or(lower)
}

/// Assign `value` at a `__`-delimited key, folding each segment through
/// [`resolve_key`] and creating intermediate mappings on demand.
///
/// Returns the offending segment when an existing scalar blocks nesting.
pub fn assign_nested(target: &mut Mapping, key: &str, value: Value) -> Result<(), String> {
    let parts: Vec<&str> = key.split("__").collect();
    let Some((last, parents)) = parts.split_last() else {
        return Ok(());
    };

    let mut cursor = target;
    for part in parents {
        let resolved = resolve_key(cursor, part);
        let child = cursor
            .entry(resolved)
            .or_insert_with(|| Value::Object(Mapping::new()));
        cursor = match child {
            Value::Object(map) => map,
            _ => return Err(format!("cannot override scalar with mapping for key {part}"))
        };
    }

    let final_key = resolve_key(cursor, last);
    cursor.insert(final_key, value);
    Ok(())
}

/// Join path segments with `.`. Literal dots inside keys are not escaped.
pub fn dotted_key(segments: &[String], key: &str) -> String {
    if segments.is_empty() {
        return key.to_string();
    }
    let mut dotted = segments.join(".");
    dotted.push('.');
    dotted.push_str(key);
    dotted
}
