//! # Configuration Precedence
//!
//! Folds layer payloads into one merged tree while recording, per scalar
//! leaf, which layer and file last set it.
//!
//! # Precedence Order
//! 1. Environment variables (highest priority)
//! 2. `.env` file
//! 3. User configuration files
//! 4. Host configuration file
//! 5. Application defaults (lowest priority)
//!
//! The fold is a pure function of its input: no filesystem access, no shared
//! mutable state, and every incoming value is cloned into a freshly built
//! accumulator so callers' payloads are never aliased.

use std::ops::Bound;
use std::path::Path;

use serde_json::Value;
use tracing::trace;

use crate::value::{LayerName, LayerPayload, Mapping, Provenance, SourceInfo, dotted_key};

/// Result of a merge: the merged tree plus its provenance index.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MergedLayers {
    pub data: Mapping,
    pub provenance: Provenance
}

impl MergedLayers {
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Re-flatten the merged tree into a single payload so it can take part
    /// in a later merge (pre-aggregated layers).
    pub fn into_payload(self, layer: LayerName) -> LayerPayload {
        LayerPayload::in_memory(layer, self.data)
    }

    pub fn into_parts(self) -> (Mapping, Provenance) {
        (self.data, self.provenance)
    }
}

/// Merge layer payloads honouring precedence and provenance.
///
/// # M-CANONICAL-DOCS
///
/// ## Purpose
/// Combines payloads ordered from lowest to highest precedence into one
/// tree. Later payloads override earlier ones leaf by leaf.
///
/// ## Usage
/// ```rust
/// use config::{LayerName, LayerPayload, merge_layers};
/// use serde_json::json;
///
/// let app = json!({"service": {"timeout": 5}});
/// let env = json!({"service": {"timeout": 10}});
/// let merged = merge_layers(&[
///     LayerPayload::in_memory(LayerName::App, app.as_object().unwrap().clone()),
///     LayerPayload::in_memory(LayerName::Env, env.as_object().unwrap().clone()),
/// ]);
///
/// assert_eq!(merged.data["service"]["timeout"], 10);
/// assert_eq!(merged.provenance["service.timeout"].layer, LayerName::Env);
/// ```
///
/// ## Merge Rules
/// - Mapping onto mapping: merged recursively.
/// - Mapping onto scalar or absent key: previous provenance under the key is
///   dropped and a fresh mapping is built.
/// - Empty mapping: always resets the branch to `{}` and drops every
///   provenance entry under it.
/// - Scalar or list: replaces whatever was there; provenance at the key and
///   below is dropped and a new entry is recorded for the key.
pub fn merge_layers(layers: &[LayerPayload]) -> MergedLayers {
    let mut provenance = Provenance::new();
    let mut data = Mapping::new();

    for payload in layers {
        trace!(
            layer = payload.layer.as_str(),
            keys = payload.data.len(),
            "merging layer"
        );
        let origin = Origin {
            layer: payload.layer,
            path: payload.source_path.as_deref()
        };
        let mut segments = Vec::new();
        data = merge_mapping(data, &payload.data, &origin, &mut segments, &mut provenance);
    }

    MergedLayers { data, provenance }
}

struct Origin<'a> {
    layer: LayerName,
    path: Option<&'a Path>
}

impl Origin<'_> {
    fn source_info(&self, dotted: String) -> SourceInfo {
        SourceInfo::new(self.layer, self.path.map(Path::to_path_buf), dotted)
    }
}

fn merge_mapping(
    mut target: Mapping,
    incoming: &Mapping,
    origin: &Origin<'_>,
    segments: &mut Vec<String>,
    provenance: &mut Provenance
) -> Mapping {
    for (key, value) in incoming {
        let dotted = dotted_key(segments, key);
        let merged = match value {
            Value::Object(child) => {
                // Taking the value in place keeps the key's position in the
                // ordered map when it is written back.
                let existing = target.get_mut(key).map(Value::take);
                Value::Object(merge_branch(
                    existing, child, key, dotted, origin, segments, provenance
                ))
            }
            scalar => {
                clear_branch(provenance, &dotted);
                provenance.insert(dotted.clone(), origin.source_info(dotted));
                scalar.clone()
            }
        };
        target.insert(key.clone(), merged);
    }
    target
}

fn merge_branch(
    existing: Option<Value>,
    incoming: &Mapping,
    key: &str,
    dotted: String,
    origin: &Origin<'_>,
    segments: &mut Vec<String>,
    provenance: &mut Provenance
) -> Mapping {
    if incoming.is_empty() {
        clear_branch(provenance, &dotted);
        return Mapping::new();
    }

    let container = match existing {
        Some(Value::Object(current)) => current,
        _ => {
            clear_branch(provenance, &dotted);
            Mapping::new()
        }
    };

    segments.push(key.to_string());
    let merged = merge_mapping(container, incoming, origin, segments, provenance);
    segments.pop();
    merged
}

/// Drop provenance for `prefix` and every key nested below it.
fn clear_branch(provenance: &mut Provenance, prefix: &str) {
    let nested = format!("{prefix}.");
    let stale: Vec<String> = provenance
        .range::<str, _>((Bound::Included(prefix), Bound::Unbounded))
        .map(|(key, _)| key)
        .take_while(|key| key.starts_with(prefix))
        .filter(|key| key.as_str() == prefix || key.starts_with(&nested))
        .cloned()
        .collect();

    for key in stale {
        provenance.remove(&key);
    }
}
