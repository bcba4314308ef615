//! # Adapter Capabilities
//!
//! Traits implemented by the adapters the composition root wires together.
//! Each capability has one default implementation in this crate; tests and
//! embedders can supply their own.

use std::path::{Path, PathBuf};

use errors::ConfigResult;

use crate::value::Mapping;

/// Parses one structured configuration file into a mapping.
pub trait FileLoader {
    /// # Errors
    /// `NotFound` when `path` is not a file, `InvalidFormat` when the content
    /// is not a mapping in the loader's format.
    fn load(&self, path: &Path) -> ConfigResult<Mapping>;
}

/// Turns prefixed environment variables into a nested mapping.
pub trait EnvLoader {
    /// # Errors
    /// `InvalidFormat` when a scalar blocks a nested key.
    fn load(&self, prefix: &str) -> ConfigResult<Mapping>;
}

/// A parsed `.env` file and where it was found.
#[derive(Debug, Clone, PartialEq)]
pub struct DotenvFile {
    pub path: PathBuf,
    pub data: Mapping
}

/// Locates and parses the first `.env` file in the search order.
pub trait DotEnvLoader {
    /// Returns `Ok(None)` when no candidate exists.
    ///
    /// # Errors
    /// `InvalidFormat` for malformed lines or nesting conflicts.
    fn load(&self, start_dir: Option<&Path>) -> ConfigResult<Option<DotenvFile>>;
}

/// Enumerates candidate files per layer.
///
/// Absence never fails; only genuine I/O errors (a `config.d` that cannot be
/// listed) are reported.
pub trait PathResolver {
    fn app(&self) -> ConfigResult<Vec<PathBuf>>;
    fn host(&self) -> ConfigResult<Vec<PathBuf>>;
    fn user(&self) -> ConfigResult<Vec<PathBuf>>;
    fn dotenv(&self) -> ConfigResult<Vec<PathBuf>>;
}
