//! # Environment Variable Loader
//!
//! Loads the highest-precedence layer from prefixed environment variables.
//!
//! # Naming Convention
//! `<PREFIX>_<SEGMENT>__<SEGMENT>...`, for example `DEMO_SERVICE__TIMEOUT=20`
//! becomes `{"service": {"timeout": 20}}`. The prefix is derived from the
//! slug with [`default_env_prefix`].

use std::collections::BTreeMap;
use std::env;
use std::path::PathBuf;

use errors::{ConfigError, ConfigResult};
use serde_json::{Number, Value};
use tracing::debug;

use crate::ports::EnvLoader;
use crate::value::{Mapping, assign_nested};

/// Canonical environment prefix for a slug: dashes become underscores and
/// the result is upper-cased (`my-app` → `MY_APP`).
pub fn default_env_prefix(slug: &str) -> String {
    slug.replace('-', "_").to_uppercase()
}

/// Environment loader over a snapshot of variables.
///
/// The snapshot is taken once, so a loader gives the same answer for its
/// whole lifetime regardless of later changes to the process environment.
#[derive(Debug, Clone, Default)]
pub struct DefaultEnvLoader {
    environ: BTreeMap<String, String>
}

impl DefaultEnvLoader {
    /// Snapshot the current process environment. Variables whose name or
    /// value is not valid Unicode are ignored.
    pub fn from_process() -> Self {
        Self::with_environ(
            env::vars_os().filter_map(|(key, value)| Some((key.into_string().ok()?, value.into_string().ok()?)))
        )
    }

    pub fn with_environ<I, K, V>(vars: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>
    {
        Self {
            environ: vars
                .into_iter()
                .map(|(key, value)| (key.into(), value.into()))
                .collect()
        }
    }
}

impl EnvLoader for DefaultEnvLoader {
    /// Load variables starting with `prefix` (an `_` is appended when
    /// missing), matched case-insensitively and processed in sorted name
    /// order.
    ///
    /// # M-CANONICAL-DOCS
    ///
    /// ## Purpose
    /// Produces the `env` layer payload with the same nesting rules as `.env`
    /// files plus scalar coercion.
    ///
    /// ## Usage
    /// ```rust
    /// use config::{DefaultEnvLoader, EnvLoader};
    ///
    /// let loader = DefaultEnvLoader::with_environ([
    ///     ("DEMO_SERVICE__ENABLED", "true"),
    ///     ("DEMO_SERVICE__RETRIES", "3"),
    ///     ("OTHER_VALUE", "ignored"),
    /// ]);
    /// let data = loader.load("DEMO").unwrap();
    ///
    /// assert_eq!(data["service"]["enabled"], true);
    /// assert_eq!(data["service"]["retries"], 3);
    /// assert!(!data.contains_key("other_value"));
    /// ```
    ///
    /// ## Coercion
    /// - `true` / `false` (any case): boolean
    /// - `null` / `none` (any case): null
    /// - optional `-` followed by digits: integer
    /// - anything else that parses as a finite float: float
    /// - otherwise the original string
    fn load(&self, prefix: &str) -> ConfigResult<Mapping> {
        let prefix = normalize_prefix(prefix);
        let mut collected = Mapping::new();

        for (name, value) in &self.environ {
            let Some(stripped) = strip_prefix_ignore_case(name, &prefix) else {
                continue;
            };
            if stripped.is_empty() {
                continue;
            }
            assign_nested(&mut collected, stripped, coerce(value)).map_err(|reason| {
                ConfigError::invalid_format(PathBuf::from(name), "environment variable", reason)
            })?;
        }

        debug!(
            keys = ?collected.keys().collect::<Vec<_>>(),
            "env_variables_loaded"
        );
        Ok(collected)
    }
}

fn normalize_prefix(prefix: &str) -> String {
    if prefix.is_empty() || prefix.ends_with('_') {
        prefix.to_string()
    } else {
        format!("{prefix}_")
    }
}

fn strip_prefix_ignore_case<'a>(name: &'a str, prefix: &str) -> Option<&'a str> {
    let head = name.get(..prefix.len())?;
    head.eq_ignore_ascii_case(prefix)
        .then(|| &name[prefix.len()..])
}

/// Convert a textual value into the closest JSON scalar.
pub(crate) fn coerce(value: &str) -> Value {
    let lowered = value.to_lowercase();
    match lowered.as_str() {
        "true" => return Value::Bool(true),
        "false" => return Value::Bool(false),
        "null" | "none" => return Value::Null,
        _ => {}
    }

    if looks_like_int(value) {
        if let Ok(i) = value.parse::<i64>() {
            return Value::from(i);
        }
        if let Ok(u) = value.parse::<u64>() {
            return Value::from(u);
        }
    }

    value
        .parse::<f64>()
        .ok()
        .and_then(Number::from_f64)
        .map_or_else(|| Value::String(value.to_string()), Value::Number)
}

fn looks_like_int(value: &str) -> bool {
    let digits = value.strip_prefix('-').unwrap_or(value);
    !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit())
}
