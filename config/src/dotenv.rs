//! # Dotenv Loader
//!
//! Discovers the first `.env` file from a start directory upwards (then any
//! platform fallback locations) and parses it into a nested mapping using
//! the same `__` nesting as environment variables. Values stay strings.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use errors::{ConfigError, ConfigResult};
use serde_json::Value;
use tracing::{debug, error};

use crate::ports::{DotEnvLoader, DotenvFile};
use crate::value::{Mapping, assign_nested};

const DOTENV_FILE: &str = ".env";

/// Dotenv loader with optional resolver-supplied fallback candidates.
#[derive(Debug, Clone, Default)]
pub struct DefaultDotEnvLoader {
    extras: Vec<PathBuf>
}

impl DefaultDotEnvLoader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Candidates checked after the upward walk, usually from
    /// `PathResolver::dotenv`.
    #[must_use]
    pub fn with_extras(mut self, extras: impl IntoIterator<Item = PathBuf>) -> Self {
        self.extras.extend(extras);
        self
    }

    fn candidates(&self, start_dir: Option<&Path>) -> Vec<PathBuf> {
        let base = start_dir
            .map(Path::to_path_buf)
            .or_else(|| env::current_dir().ok());
        let mut candidates: Vec<PathBuf> = base
            .iter()
            .flat_map(|base| base.ancestors())
            .map(|dir| dir.join(DOTENV_FILE))
            .collect();
        candidates.extend(self.extras.iter().cloned());
        candidates
    }
}

impl DotEnvLoader for DefaultDotEnvLoader {
    fn load(&self, start_dir: Option<&Path>) -> ConfigResult<Option<DotenvFile>> {
        let Some(path) = self
            .candidates(start_dir)
            .into_iter()
            .find(|candidate| candidate.is_file())
        else {
            debug!("dotenv_not_found");
            return Ok(None);
        };

        let data = parse_dotenv_file(&path)?;
        debug!(
            path = %path.display(),
            keys = ?data.keys().collect::<Vec<_>>(),
            "dotenv_loaded"
        );
        Ok(Some(DotenvFile { path, data }))
    }
}

/// Parse a `.env` file from disk.
pub fn parse_dotenv_file(path: &Path) -> ConfigResult<Mapping> {
    let content = fs::read_to_string(path).map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound => ConfigError::not_found(path),
        std::io::ErrorKind::InvalidData => ConfigError::invalid_format(path, "dotenv", e),
        _ => ConfigError::io(path, e)
    })?;
    parse_dotenv(path, &content)
}

/// Parse `.env` content. `path` is only used in error messages.
///
/// - Blank lines and lines starting with `#` are skipped.
/// - Every other line must contain `=`; the first one splits key from value.
/// - Matching surrounding quotes are removed; otherwise ` #` starts an
///   inline comment and a value starting with `#` is empty.
pub fn parse_dotenv(path: &Path, content: &str) -> ConfigResult<Mapping> {
    let mut result = Mapping::new();

    for (index, raw_line) in content.lines().enumerate() {
        let line_number = index + 1;
        let line = raw_line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let line = line.strip_prefix("export ").map_or(line, str::trim_start);
        let Some((key, value)) = line.split_once('=') else {
            error!(path = %path.display(), line = line_number, "dotenv_invalid_line");
            return Err(ConfigError::invalid_format(
                path,
                "dotenv",
                format!("malformed line {line_number}")
            ));
        };

        let value = strip_quotes(value.trim());
        assign_nested(&mut result, key.trim(), Value::String(value.to_string()))
            .map_err(|reason| ConfigError::invalid_format(path, "dotenv", reason))?;
    }

    Ok(result)
}

fn strip_quotes(value: &str) -> &str {
    let bytes = value.as_bytes();
    if bytes.len() >= 2 && bytes[0] == bytes[bytes.len() - 1] && matches!(bytes[0], b'"' | b'\'') {
        return &value[1..value.len() - 1];
    }
    if value.starts_with('#') {
        return "";
    }
    match value.split_once(" #") {
        Some((before, _)) => before.trim(),
        None => value
    }
}
