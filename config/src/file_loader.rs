//! # Configuration File Loading
//!
//! Loads structured configuration files (TOML, JSON, YAML) into ordered
//! mappings.
//!
//! Format is selected from the file extension through [`FileFormat`]; each
//! format also has a standalone [`FileLoader`] implementor.

use std::fs;
use std::path::Path;

use errors::{ConfigError, ConfigResult};
use serde_json::{Number, Value};
use strum::{AsRefStr, Display};
use tracing::{debug, error};

use crate::ports::FileLoader;
use crate::value::Mapping;

/// Structured formats understood by the file layers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, AsRefStr)]
#[strum(serialize_all = "UPPERCASE")]
pub enum FileFormat {
    Toml,
    Json,
    Yaml
}

impl FileFormat {
    /// Format for a path's extension (`.toml`, `.json`, `.yaml`, `.yml`),
    /// compared case-insensitively.
    pub fn from_path(path: &Path) -> Option<Self> {
        let extension = path.extension()?.to_str()?;
        Self::from_extension(extension)
    }

    pub fn from_extension(extension: &str) -> Option<Self> {
        match extension.trim_start_matches('.').to_ascii_lowercase().as_str() {
            "toml" => Some(Self::Toml),
            "json" => Some(Self::Json),
            "yaml" | "yml" => Some(Self::Yaml),
            _ => None
        }
    }

    fn parse(self, path: &Path, bytes: &[u8]) -> ConfigResult<Mapping> {
        match self {
            Self::Toml => parse_toml(path, bytes),
            Self::Json => parse_json(path, bytes),
            Self::Yaml => parse_yaml(path, bytes)
        }
    }
}

impl FileLoader for FileFormat {
    fn load(&self, path: &Path) -> ConfigResult<Mapping> {
        let bytes = read_file(path)?;
        let data = self.parse(path, &bytes)?;
        debug!(path = %path.display(), format = self.as_ref(), "config_file_loaded");
        Ok(data)
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct TomlFileLoader;

#[derive(Debug, Clone, Copy, Default)]
pub struct JsonFileLoader;

#[derive(Debug, Clone, Copy, Default)]
pub struct YamlFileLoader;

impl FileLoader for TomlFileLoader {
    fn load(&self, path: &Path) -> ConfigResult<Mapping> {
        FileFormat::Toml.load(path)
    }
}

impl FileLoader for JsonFileLoader {
    fn load(&self, path: &Path) -> ConfigResult<Mapping> {
        FileFormat::Json.load(path)
    }
}

impl FileLoader for YamlFileLoader {
    fn load(&self, path: &Path) -> ConfigResult<Mapping> {
        FileFormat::Yaml.load(path)
    }
}

fn read_file(path: &Path) -> ConfigResult<Vec<u8>> {
    if !path.is_file() {
        return Err(ConfigError::not_found(path));
    }
    let bytes = fs::read(path).map_err(|e| ConfigError::io(path, e))?;
    debug!(path = %path.display(), size = bytes.len(), "config_file_read");
    Ok(bytes)
}

fn invalid(path: &Path, format: FileFormat, reason: impl ToString) -> ConfigError {
    let reason = reason.to_string();
    error!(path = %path.display(), format = format.as_ref(), error = %reason, "config_file_invalid");
    ConfigError::invalid_format(path, format.to_string(), reason)
}

fn not_a_mapping(path: &Path, format: FileFormat) -> ConfigError {
    invalid(path, format, "top-level value is not a mapping")
}

fn parse_toml(path: &Path, bytes: &[u8]) -> ConfigResult<Mapping> {
    let text = std::str::from_utf8(bytes).map_err(|e| invalid(path, FileFormat::Toml, e))?;
    let table: toml::Table = toml::from_str(text).map_err(|e| invalid(path, FileFormat::Toml, e))?;
    Ok(table
        .into_iter()
        .map(|(key, value)| (key, toml_to_json(value)))
        .collect())
}

fn parse_json(path: &Path, bytes: &[u8]) -> ConfigResult<Mapping> {
    match serde_json::from_slice(bytes).map_err(|e| invalid(path, FileFormat::Json, e))? {
        Value::Object(map) => Ok(map),
        _ => Err(not_a_mapping(path, FileFormat::Json))
    }
}

fn parse_yaml(path: &Path, bytes: &[u8]) -> ConfigResult<Mapping> {
    if is_blank_yaml(bytes) {
        return Ok(Mapping::new());
    }
    let parsed: serde_yaml::Value =
        serde_yaml::from_slice(bytes).map_err(|e| invalid(path, FileFormat::Yaml, e))?;
    match yaml_to_json(parsed).map_err(|reason| invalid(path, FileFormat::Yaml, reason))? {
        Value::Object(map) => Ok(map),
        Value::Null => Ok(Mapping::new()),
        _ => Err(not_a_mapping(path, FileFormat::Yaml))
    }
}

/// A document holding only whitespace, comments or markers has no data.
fn is_blank_yaml(bytes: &[u8]) -> bool {
    String::from_utf8_lossy(bytes).lines().all(|line| {
        let line = line.trim();
        line.is_empty() || line.starts_with('#') || line == "---" || line == "..."
    })
}

fn float_to_json(value: f64) -> Value {
    Number::from_f64(value).map_or_else(|| Value::String(value.to_string()), Value::Number)
}

fn toml_to_json(value: toml::Value) -> Value {
    match value {
        toml::Value::String(s) => Value::String(s),
        toml::Value::Integer(i) => Value::from(i),
        toml::Value::Float(f) => float_to_json(f),
        toml::Value::Boolean(b) => Value::Bool(b),
        toml::Value::Datetime(dt) => Value::String(dt.to_string()),
        toml::Value::Array(items) => Value::Array(items.into_iter().map(toml_to_json).collect()),
        toml::Value::Table(table) => Value::Object(
            table
                .into_iter()
                .map(|(key, value)| (key, toml_to_json(value)))
                .collect()
        )
    }
}

fn yaml_to_json(value: serde_yaml::Value) -> Result<Value, String> {
    Ok(match value {
        serde_yaml::Value::Null => Value::Null,
        serde_yaml::Value::Bool(b) => Value::Bool(b),
        serde_yaml::Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                Value::from(i)
            } else if let Some(u) = n.as_u64() {
                Value::from(u)
            } else {
                float_to_json(n.as_f64().unwrap_or(f64::NAN))
            }
        }
        serde_yaml::Value::String(s) => Value::String(s),
        serde_yaml::Value::Sequence(items) => Value::Array(
            items
                .into_iter()
                .map(yaml_to_json)
                .collect::<Result<_, _>>()?
        ),
        serde_yaml::Value::Mapping(map) => {
            let mut object = Mapping::new();
            for (key, value) in map {
                object.insert(yaml_key(key)?, yaml_to_json(value)?);
            }
            Value::Object(object)
        }
        serde_yaml::Value::Tagged(tagged) => yaml_to_json(tagged.value)?
    })
}

fn yaml_key(key: serde_yaml::Value) -> Result<String, String> {
    match key {
        serde_yaml::Value::String(s) => Ok(s),
        serde_yaml::Value::Bool(b) => Ok(b.to_string()),
        serde_yaml::Value::Number(n) => Ok(n.to_string()),
        serde_yaml::Value::Null => Ok("null".to_string()),
        serde_yaml::Value::Tagged(tagged) => yaml_key(tagged.value),
        other => Err(format!("unsupported mapping key {other:?}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::fs;
    use tempfile::TempDir;

    fn write(dir: &TempDir, name: &str, content: &str) -> std::path::PathBuf {
        let path = dir.path().join(name);
        fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn test_load_from_toml() {
        let dir = TempDir::new().unwrap();
        let path = write(
            &dir,
            "config.toml",
            r#"
[service]
endpoint = "https://api"
timeout = 5
ratio = 0.5
tags = ["a", "b"]

[service.limits]
burst = 10
"#
        );

        let data = TomlFileLoader.load(&path).unwrap();
        assert_eq!(data["service"]["endpoint"], "https://api");
        assert_eq!(data["service"]["timeout"], 5);
        assert_eq!(data["service"]["ratio"], 0.5);
        assert_eq!(data["service"]["tags"], json!(["a", "b"]));
        assert_eq!(data["service"]["limits"]["burst"], 10);
    }

    #[test]
    fn test_toml_datetime_and_non_finite_become_strings() {
        let dir = TempDir::new().unwrap();
        let path = write(
            &dir,
            "config.toml",
            "released = 1979-05-27T07:32:00Z\nlimit = inf\n"
        );

        let data = TomlFileLoader.load(&path).unwrap();
        assert_eq!(data["released"], "1979-05-27T07:32:00Z");
        assert_eq!(data["limit"], "inf");
    }

    #[test]
    fn test_toml_preserves_key_order() {
        let dir = TempDir::new().unwrap();
        let path = write(&dir, "config.toml", "zeta = 1\nalpha = 2\nmid = 3\n");

        let data = TomlFileLoader.load(&path).unwrap();
        let keys: Vec<&str> = data.keys().map(String::as_str).collect();
        assert_eq!(keys, ["zeta", "alpha", "mid"]);
    }

    #[test]
    fn test_load_from_json() {
        let dir = TempDir::new().unwrap();
        let path = write(&dir, "config.json", r#"{"flag": true, "nested": {"n": null}}"#);

        let data = JsonFileLoader.load(&path).unwrap();
        assert_eq!(data["flag"], true);
        assert_eq!(data["nested"]["n"], Value::Null);
    }

    #[test]
    fn test_load_from_yaml() {
        let dir = TempDir::new().unwrap();
        let path = write(
            &dir,
            "config.yaml",
            "service:\n  timeout: 5\n  hosts:\n    - a\n    - b\n1: numeric-key\n"
        );

        let data = YamlFileLoader.load(&path).unwrap();
        assert_eq!(data["service"]["timeout"], 5);
        assert_eq!(data["service"]["hosts"], json!(["a", "b"]));
        assert_eq!(data["1"], "numeric-key");
    }

    #[test]
    fn test_empty_yaml_is_empty_mapping() {
        let dir = TempDir::new().unwrap();
        let blank = write(&dir, "blank.yml", "");
        let comments = write(&dir, "comments.yml", "# nothing here\n---\n");

        assert!(YamlFileLoader.load(&blank).unwrap().is_empty());
        assert!(YamlFileLoader.load(&comments).unwrap().is_empty());
    }

    #[test]
    fn test_invalid_toml() {
        let dir = TempDir::new().unwrap();
        let path = write(&dir, "config.toml", "[invalid\n");

        let err = TomlFileLoader.load(&path).unwrap_err();
        assert!(err.is_invalid_format());
        assert!(err.to_string().starts_with("Invalid TOML in"));
        assert!(err.to_string().contains("config.toml"));
    }

    #[test]
    fn test_invalid_json_names_path() {
        let dir = TempDir::new().unwrap();
        let path = write(&dir, "config.json", "{not json");

        let err = JsonFileLoader.load(&path).unwrap_err();
        assert!(err.is_invalid_format());
        assert!(err.to_string().contains(&path.display().to_string()));
    }

    #[test]
    fn test_invalid_yaml() {
        let dir = TempDir::new().unwrap();
        let path = write(&dir, "config.yaml", "invalid: [unmatched\n");

        assert!(YamlFileLoader.load(&path).unwrap_err().is_invalid_format());
    }

    #[test]
    fn test_non_mapping_top_level() {
        let dir = TempDir::new().unwrap();
        let json_path = write(&dir, "list.json", "[1, 2, 3]");
        let yaml_path = write(&dir, "scalar.yaml", "just a string\n");

        assert!(JsonFileLoader.load(&json_path).unwrap_err().is_invalid_format());
        assert!(YamlFileLoader.load(&yaml_path).unwrap_err().is_invalid_format());
    }

    #[test]
    fn test_non_utf8_toml_is_invalid() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, [0xff, 0xfe, 0x00]).unwrap();

        assert!(TomlFileLoader.load(&path).unwrap_err().is_invalid_format());
    }

    #[test]
    fn test_missing_file_is_not_found() {
        let err = TomlFileLoader
            .load(Path::new("/nonexistent/path/config.toml"))
            .unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn test_directory_is_not_found() {
        let dir = TempDir::new().unwrap();
        assert!(JsonFileLoader.load(dir.path()).unwrap_err().is_not_found());
    }

    #[test]
    fn test_format_from_path() {
        assert_eq!(FileFormat::from_path(Path::new("a.toml")), Some(FileFormat::Toml));
        assert_eq!(FileFormat::from_path(Path::new("a.JSON")), Some(FileFormat::Json));
        assert_eq!(FileFormat::from_path(Path::new("a.yml")), Some(FileFormat::Yaml));
        assert_eq!(FileFormat::from_path(Path::new("a.yaml")), Some(FileFormat::Yaml));
        assert_eq!(FileFormat::from_path(Path::new("a.ini")), None);
        assert_eq!(FileFormat::from_path(Path::new("Makefile")), None);
        assert_eq!(FileFormat::from_extension(".toml"), Some(FileFormat::Toml));
    }

    #[test]
    fn test_format_dispatch_loads() {
        let dir = TempDir::new().unwrap();
        let path = write(&dir, "x.yml", "key: 1\n");

        let format = FileFormat::from_path(&path).unwrap();
        assert_eq!(format.load(&path).unwrap()["key"], 1);
    }
}
